//! Bounding box types: corner-keyed input and fixed-order output.

use serde::{Deserialize, Serialize};

/// A `box2d` block as it appears in the det_20 annotation files.
///
/// Every corner is optional at parse time so that a missing key is reported
/// by the normalizer with the sample and label it belongs to, rather than as
/// an opaque parse error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Box2d {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

impl Box2d {
    /// Creates a fully populated corner box.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: Some(x1),
            y1: Some(y1),
            x2: Some(x2),
            y2: Some(y2),
        }
    }

    /// Converts to `[x1, y1, x2, y2]`.
    ///
    /// Returns the name of the first absent corner key on failure.
    pub fn to_xyxy(&self) -> Result<BoxXyxy, &'static str> {
        let x1 = self.x1.ok_or("x1")?;
        let y1 = self.y1.ok_or("y1")?;
        let x2 = self.x2.ok_or("x2")?;
        let y2 = self.y2.ok_or("y2")?;
        Ok(BoxXyxy::new(x1, y1, x2, y2))
    }
}

/// An axis-aligned box stored as `[x1, y1, x2, y2]` in pixel space.
///
/// Serialized as a plain four-element array. Like the annotation files it is
/// read from, this type does NOT enforce `x1 < x2` or `y1 < y2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxXyxy(pub [f64; 4]);

impl BoxXyxy {
    #[inline]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self([x1, y1, x2, y2])
    }

    #[inline]
    pub fn x1(&self) -> f64 {
        self.0[0]
    }

    #[inline]
    pub fn y1(&self) -> f64 {
        self.0[1]
    }

    #[inline]
    pub fn x2(&self) -> f64 {
        self.0[2]
    }

    #[inline]
    pub fn y2(&self) -> f64 {
        self.0[3]
    }

    /// Returns the width of the box.
    ///
    /// May be negative if the box is malformed (x2 < x1).
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2() - self.x1()
    }

    /// Returns the height of the box.
    ///
    /// May be negative if the box is malformed (y2 < y1).
    #[inline]
    pub fn height(&self) -> f64 {
        self.y2() - self.y1()
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Returns true if the box is properly ordered (x1 <= x2 and y1 <= y2).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.x1() <= self.x2() && self.y1() <= self.y2()
    }

    #[inline]
    pub fn as_array(&self) -> &[f64; 4] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box2d_keeps_corner_order() {
        let bbox = Box2d::new(819.46, 280.08, 889.23, 312.74)
            .to_xyxy()
            .expect("complete box");
        assert_eq!(bbox.as_array(), &[819.46, 280.08, 889.23, 312.74]);
    }

    #[test]
    fn test_box2d_reports_first_missing_key() {
        let partial = Box2d {
            x2: None,
            y2: None,
            ..Box2d::new(1.0, 2.0, 3.0, 4.0)
        };
        assert_eq!(partial.to_xyxy(), Err("x2"));
        assert_eq!(Box2d::default().to_xyxy(), Err("x1"));
    }

    #[test]
    fn test_box_dimensions() {
        let bbox = BoxXyxy::new(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.width(), 90.0);
        assert_eq!(bbox.height(), 60.0);
        assert_eq!(bbox.area(), 5400.0);
    }

    #[test]
    fn test_box_ordering() {
        assert!(BoxXyxy::new(10.0, 20.0, 100.0, 80.0).is_ordered());
        assert!(!BoxXyxy::new(100.0, 80.0, 10.0, 20.0).is_ordered());
    }

    #[test]
    fn test_box_serializes_as_array() {
        let json = serde_json::to_string(&BoxXyxy::new(1.0, 2.0, 3.0, 4.5)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.5]");
    }

    #[test]
    fn test_box2d_parses_partial_block() {
        let parsed: Box2d = serde_json::from_str(r#"{"x1": 1, "y1": 2, "y2": 4}"#).unwrap();
        assert_eq!(parsed.x1, Some(1.0));
        assert_eq!(parsed.x2, None);
    }
}

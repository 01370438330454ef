//! BDD100K det_20 annotation schema and JSON reader.
//!
//! A det_20 label file is a JSON array with one record per image:
//!
//! ```json
//! [{
//!   "name": "b1c81faa-3df17267.jpg",
//!   "attributes": {"weather": "clear", "timeofday": "night", "scene": "highway"},
//!   "timestamp": 10000,
//!   "labels": [{
//!     "id": "34",
//!     "category": "car",
//!     "attributes": {"occluded": false, "truncated": false, "trafficLightColor": "NA"},
//!     "box2d": {"x1": 819.46, "y1": 280.08, "x2": 889.23, "y2": 312.74}
//!   }]
//! }]
//! ```
//!
//! `name`, `attributes` and `labels` on a sample and `id`, `category` and
//! `attributes` on a label are required; a missing one fails the whole read. Unknown keys (`poly2d`, `manualShape`, ...) are
//! ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bbox::Box2d;
use crate::error::ArmitageError;

/// One annotated image as loaded from the det_20 file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Image file basename, e.g. `b1c81faa-3df17267.jpg`.
    pub name: String,

    /// Scene-level attributes: weather, timeofday, scene.
    pub attributes: BTreeMap<String, String>,

    /// Frame timestamp within the source video. Always 10000 for 100k images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Instance labels, in file order.
    pub labels: Vec<RawLabel>,
}

/// One instance label on a [`RawSample`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    /// String-encoded integer, unique within the sample.
    pub id: String,

    pub category: String,

    /// Instance attributes: occluded, truncated, trafficLightColor.
    pub attributes: BTreeMap<String, AttributeValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box2d: Option<Box2d>,
}

/// An instance attribute value.
///
/// The common scalar forms get their own variants; anything else (arrays,
/// objects) is carried through unchanged as [`AttributeValue::Json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => f.write_str(v),
            AttributeValue::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl RawSample {
    /// Creates a sample with no attributes and no labels.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            timestamp: None,
            labels: Vec::new(),
        }
    }

    /// Adds a scene attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends a label.
    pub fn with_label(mut self, label: RawLabel) -> Self {
        self.labels.push(label);
        self
    }
}

impl RawLabel {
    /// Creates a label with a complete box and no attributes.
    pub fn new(id: impl Into<String>, category: impl Into<String>, box2d: Box2d) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            attributes: BTreeMap::new(),
            box2d: Some(box2d),
        }
    }

    /// Adds an instance attribute.
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Reads the raw records of a det_20 label file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not a valid det_20
/// document.
pub fn read_det20_json(path: &Path) -> Result<Vec<RawSample>, ArmitageError> {
    let file = File::open(path).map_err(ArmitageError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| ArmitageError::Det20JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads raw det_20 records from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_det20_str(json: &str) -> Result<Vec<RawSample>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads raw det_20 records from a byte slice.
pub fn from_det20_slice(bytes: &[u8]) -> Result<Vec<RawSample>, serde_json::Error> {
    serde_json::from_slice(bytes)
}

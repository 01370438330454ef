//! Flattening of raw det_20 records into decode-ready samples.
//!
//! Each [`RawSample`] maps to exactly one [`NormalizedSample`] and each
//! [`RawLabel`] to exactly one [`NormalizedLabel`], in input order. The pass
//! is "light": it resolves the image path, lifts nested attribute maps to the
//! top level of each record and turns `box2d` into a fixed-order array. It
//! does not sort, filter, deduplicate or validate categories or coordinates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use super::bbox::BoxXyxy;
use super::raw::{AttributeValue, RawLabel, RawSample};
use crate::error::ArmitageError;

/// Frame height of every BDD100K 100k image.
pub const BDD100K_HEIGHT: u32 = 720;

/// Frame width of every BDD100K 100k image.
pub const BDD100K_WIDTH: u32 = 1280;

/// Field names a scene attribute may not take.
pub const RESERVED_SAMPLE_FIELDS: &[&str] = &[
    "image_file_name",
    "image_file_path",
    "height",
    "width",
    "labels",
    "image",
];

/// Field names an instance attribute may not take.
pub const RESERVED_LABEL_FIELDS: &[&str] = &["id", "category", "box"];

/// A flattened, decode-ready image record.
///
/// Serializes with scene attributes lifted to the top level next to the
/// fixed fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedSample {
    pub image_file_name: String,

    /// `images_root + "/" + name`. Not checked for existence.
    pub image_file_path: String,

    pub height: u32,
    pub width: u32,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,

    pub labels: Vec<NormalizedLabel>,
}

/// A flattened instance label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedLabel {
    pub id: String,
    pub category: String,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,

    #[serde(rename = "box")]
    pub bbox: BoxXyxy,
}

/// Where the recorded `height`/`width` of each sample come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageDimensions {
    /// Record the same size for every image without touching the filesystem.
    Fixed { height: u32, width: u32 },
    /// Read each image header to record its real size.
    ProbeHeader,
}

impl Default for ImageDimensions {
    fn default() -> Self {
        ImageDimensions::Fixed {
            height: BDD100K_HEIGHT,
            width: BDD100K_WIDTH,
        }
    }
}

/// Options for [`normalize_with`].
#[derive(Clone, Debug, Default)]
pub struct NormalizeOptions {
    pub dimensions: ImageDimensions,
}

/// Normalizes raw det_20 records with the default options.
///
/// # Errors
/// Fails on empty input, a missing `box2d` key, or an attribute that
/// collides with a reserved field. No partial output is produced.
pub fn normalize(
    raw: &[RawSample],
    images_root: &str,
) -> Result<Vec<NormalizedSample>, ArmitageError> {
    normalize_with(raw, images_root, &NormalizeOptions::default())
}

/// Normalizes raw det_20 records.
///
/// See [`normalize`] for the error conditions. With
/// [`ImageDimensions::ProbeHeader`] an unreadable image header is an error too.
pub fn normalize_with(
    raw: &[RawSample],
    images_root: &str,
    opts: &NormalizeOptions,
) -> Result<Vec<NormalizedSample>, ArmitageError> {
    if raw.is_empty() {
        return Err(ArmitageError::EmptyAnnotations);
    }

    let samples = raw
        .iter()
        .map(|sample| normalize_sample(sample, images_root, opts))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        samples = samples.len(),
        labels = samples.iter().map(|s| s.labels.len()).sum::<usize>(),
        images_root,
        "normalized det_20 records"
    );

    Ok(samples)
}

fn normalize_sample(
    sample: &RawSample,
    images_root: &str,
    opts: &NormalizeOptions,
) -> Result<NormalizedSample, ArmitageError> {
    let image_file_path = format!("{}/{}", images_root, sample.name);

    if let Some(key) = first_reserved(sample.attributes.keys(), RESERVED_SAMPLE_FIELDS) {
        return Err(ArmitageError::ReservedAttribute {
            record: format!("sample '{}'", sample.name),
            key: key.to_string(),
        });
    }

    let (height, width) = match opts.dimensions {
        ImageDimensions::Fixed { height, width } => (height, width),
        ImageDimensions::ProbeHeader => probe_dimensions(Path::new(&image_file_path))?,
    };

    let labels = sample
        .labels
        .iter()
        .map(|label| normalize_label(label, &sample.name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedSample {
        image_file_name: sample.name.clone(),
        image_file_path,
        height,
        width,
        attributes: sample.attributes.clone(),
        labels,
    })
}

fn normalize_label(label: &RawLabel, sample_name: &str) -> Result<NormalizedLabel, ArmitageError> {
    if let Some(key) = first_reserved(label.attributes.keys(), RESERVED_LABEL_FIELDS) {
        return Err(ArmitageError::ReservedAttribute {
            record: format!("label {} of sample '{}'", label.id, sample_name),
            key: key.to_string(),
        });
    }

    let missing = |key: &'static str| ArmitageError::MissingKey {
        sample: sample_name.to_string(),
        label: label.id.clone(),
        key,
    };
    let box2d = label.box2d.ok_or_else(|| missing("box2d"))?;
    let bbox = box2d.to_xyxy().map_err(missing)?;

    Ok(NormalizedLabel {
        id: label.id.clone(),
        category: label.category.clone(),
        attributes: label.attributes.clone(),
        bbox,
    })
}

fn first_reserved<'a>(
    mut keys: impl Iterator<Item = &'a String>,
    reserved: &[&str],
) -> Option<&'a String> {
    keys.find(|key| reserved.contains(&key.as_str()))
}

/// Reads `(height, width)` from an image header.
fn probe_dimensions(path: &Path) -> Result<(u32, u32), ArmitageError> {
    let size = imagesize::size(path).map_err(|source| ArmitageError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    // Header sizes beyond u32 are not real images; saturate rather than wrap.
    let height = u32::try_from(size.height).unwrap_or(u32::MAX);
    let width = u32::try_from(size.width).unwrap_or(u32::MAX);
    Ok((height, width))
}

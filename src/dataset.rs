//! Indexable datasets over normalized samples.
//!
//! A [`DetectionDataset`] holds its normalized records for its whole
//! lifetime and decodes image pixels only when an item is requested. Nothing
//! is cached: asking for the same index twice decodes the file twice.

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::bdd100k::{
    from_det20_str, normalize_with, read_det20_json, NormalizeOptions, NormalizedSample,
    RawSample,
};
use crate::error::ArmitageError;

/// A normalized sample with its decoded pixels.
#[derive(Clone, Debug)]
pub struct LoadedSample<'a> {
    pub sample: &'a NormalizedSample,
    /// RGB pixels, `height x width x 3`.
    pub image: RgbImage,
}

impl LoadedSample<'_> {
    /// Decoded `(height, width)`.
    pub fn decoded_dimensions(&self) -> (u32, u32) {
        (self.image.height(), self.image.width())
    }

    /// True when the decoded size matches the recorded `height`/`width`.
    pub fn dimensions_match(&self) -> bool {
        self.decoded_dimensions() == (self.sample.height, self.sample.width)
    }
}

/// The length/indexed-get capability a training or inference loop consumes.
pub trait DetectionDataset: fmt::Debug + Send + Sync {
    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the normalized record at `index` without decoding its image.
    fn sample(&self, index: usize) -> Result<&NormalizedSample, ArmitageError>;

    /// Returns the record at `index` with its image decoded from disk.
    fn get(&self, index: usize) -> Result<LoadedSample<'_>, ArmitageError> {
        let sample = self.sample(index)?;
        let image = decode_rgb(Path::new(&sample.image_file_path))?;

        let loaded = LoadedSample { sample, image };
        if !loaded.dimensions_match() {
            let (height, width) = loaded.decoded_dimensions();
            tracing::warn!(
                path = %sample.image_file_path,
                recorded_height = sample.height,
                recorded_width = sample.width,
                height,
                width,
                "decoded image size differs from recorded size"
            );
        }
        Ok(loaded)
    }
}

/// Decodes an image file into RGB8.
pub fn decode_rgb(path: &Path) -> Result<RgbImage, ArmitageError> {
    let image = image::open(path).map_err(|source| ArmitageError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// The BDD100K det_20 detection dataset.
///
/// Built once from a det_20 label file; the normalized list is immutable
/// afterwards.
#[derive(Clone, Debug)]
pub struct Bdd100kDataset {
    images_root: String,
    labels_path: Option<PathBuf>,
    samples: Vec<NormalizedSample>,
}

impl Bdd100kDataset {
    /// Name under which the dataset is registered.
    pub const TYPE_NAME: &'static str = "BDD100KDataset";

    /// Loads and normalizes the det_20 file at `labels_path`.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed, if it holds no records,
    /// or if normalization fails.
    pub fn open(images_path: &Path, labels_path: &Path) -> Result<Self, ArmitageError> {
        Self::open_with(images_path, labels_path, &NormalizeOptions::default())
    }

    pub fn open_with(
        images_path: &Path,
        labels_path: &Path,
        opts: &NormalizeOptions,
    ) -> Result<Self, ArmitageError> {
        let raw = read_det20_json(labels_path)?;
        let mut dataset = Self::from_samples_with(&images_path.to_string_lossy(), &raw, opts)?;
        dataset.labels_path = Some(labels_path.to_path_buf());

        tracing::info!(
            labels = %labels_path.display(),
            samples = dataset.len(),
            "loaded BDD100K det_20 dataset"
        );
        Ok(dataset)
    }

    /// Builds a dataset from det_20 JSON already in memory.
    pub fn from_json_str(json: &str, images_root: &str) -> Result<Self, ArmitageError> {
        let raw = from_det20_str(json).map_err(|source| ArmitageError::Det20JsonParse {
            path: PathBuf::from("<memory>"),
            source,
        })?;
        Self::from_samples(images_root, &raw)
    }

    /// Builds a dataset from raw records with the default options.
    pub fn from_samples(images_root: &str, raw: &[RawSample]) -> Result<Self, ArmitageError> {
        Self::from_samples_with(images_root, raw, &NormalizeOptions::default())
    }

    pub fn from_samples_with(
        images_root: &str,
        raw: &[RawSample],
        opts: &NormalizeOptions,
    ) -> Result<Self, ArmitageError> {
        let samples = normalize_with(raw, images_root, opts)?;
        Ok(Self {
            images_root: images_root.to_string(),
            labels_path: None,
            samples,
        })
    }

    pub fn images_root(&self) -> &str {
        &self.images_root
    }

    /// The label file this dataset was read from, if any.
    pub fn labels_path(&self) -> Option<&Path> {
        self.labels_path.as_deref()
    }

    pub fn samples(&self) -> &[NormalizedSample] {
        &self.samples
    }
}

impl DetectionDataset for Bdd100kDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, index: usize) -> Result<&NormalizedSample, ArmitageError> {
        self.samples
            .get(index)
            .ok_or(ArmitageError::IndexOutOfRange {
                index,
                len: self.samples.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd100k::{Box2d, RawLabel};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, image::Rgb([200, 10, 30]))
            .save(dir.join(name))
            .unwrap();
    }

    fn two_image_dataset(root: &str) -> Bdd100kDataset {
        let raw = vec![
            RawSample::new("a.png")
                .with_label(RawLabel::new("1", "car", Box2d::new(0.0, 0.0, 4.0, 4.0))),
            RawSample::new("b.png"),
        ];
        Bdd100kDataset::from_samples(root, &raw).unwrap()
    }

    #[test]
    fn test_len_matches_records() {
        let dataset = two_image_dataset("/data");
        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());
        assert_eq!(dataset.sample(1).unwrap().image_file_path, "/data/b.png");
    }

    #[test]
    fn test_get_decodes_image() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 8, 6);
        let dataset = two_image_dataset(&dir.path().to_string_lossy());

        let loaded = dataset.get(0).expect("decode failed");
        assert_eq!(loaded.decoded_dimensions(), (6, 8));
        assert_eq!(loaded.image.get_pixel(0, 0), &image::Rgb([200, 10, 30]));
        assert_eq!(loaded.sample.labels.len(), 1);
        // Recorded size is the fixed 720x1280 fast path.
        assert!(!loaded.dimensions_match());
    }

    #[test]
    fn test_get_out_of_range() {
        let dataset = two_image_dataset("/data");
        let err = dataset.get(2).unwrap_err();
        assert!(matches!(
            err,
            ArmitageError::IndexOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn test_get_missing_file_surfaces_at_read_time() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = two_image_dataset(&dir.path().to_string_lossy());

        let err = dataset.get(1).unwrap_err();
        assert!(matches!(err, ArmitageError::ImageDecode { .. }));
        assert!(err.to_string().contains("b.png"));
    }

    #[test]
    fn test_get_does_not_mutate_record() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 2, 2);
        let dataset = two_image_dataset(&dir.path().to_string_lossy());
        let before = dataset.sample(0).unwrap().clone();

        dataset.get(0).unwrap();
        dataset.get(0).unwrap();
        assert_eq!(dataset.sample(0).unwrap(), &before);
    }

    #[test]
    fn test_open_reads_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("det_val.json");
        std::fs::write(
            &labels,
            r#"[{"name": "a.png", "attributes": {"weather": "rainy"}, "labels": []}]"#,
        )
        .unwrap();

        let dataset = Bdd100kDataset::open(Path::new("/images"), &labels).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.labels_path(), Some(labels.as_path()));
        assert_eq!(dataset.images_root(), "/images");
        assert_eq!(
            dataset.samples()[0].attributes.get("weather"),
            Some(&"rainy".to_string())
        );
    }

    #[test]
    fn test_open_rejects_empty_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("det_val.json");
        std::fs::write(&labels, "[]").unwrap();

        let err = Bdd100kDataset::open(Path::new("/images"), &labels).unwrap_err();
        assert!(matches!(err, ArmitageError::EmptyAnnotations));
    }

    #[test]
    fn test_from_json_str_missing_name_fails() {
        let err = Bdd100kDataset::from_json_str(r#"[{"attributes": {}, "labels": []}]"#, "/d")
            .unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }
}

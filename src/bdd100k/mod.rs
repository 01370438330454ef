//! BDD100K dataset support.
//!
//! BDD100K ships 100k driving videos (40s each, 720p at 30hz) plus frame
//! subsets with per-task labels. Only the image frames are handled here; the
//! videos are not read. The det_20 detection labels are expected in the
//! published layout:
//!
//! ```text
//! bdd100k/
//! ├── images/
//! │   └── 100k/
//! │       ├── test/
//! │       ├── train/
//! │       └── val/
//! └── labels/
//!     └── det_20/
//!         ├── det_train.json
//!         └── det_val.json
//! ```
//!
//! # Modules
//!
//! - [`raw`]: the det_20 JSON schema and reader
//! - [`normalize`]: flattening of raw records into [`NormalizedSample`]s
//! - [`bbox`]: corner-keyed input boxes and fixed-order output boxes

pub mod bbox;
pub mod normalize;
pub mod raw;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArmitageError;

pub use bbox::{Box2d, BoxXyxy};
pub use normalize::{
    normalize, normalize_with, ImageDimensions, NormalizeOptions, NormalizedLabel,
    NormalizedSample, BDD100K_HEIGHT, BDD100K_WIDTH,
};
pub use raw::{
    from_det20_slice, from_det20_str, read_det20_json, AttributeValue, RawLabel, RawSample,
};

/// The annotation products BDD100K publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSet {
    /// Instance segmentation (10k subset).
    InsSeg,
    /// Panoptic segmentation (10k subset).
    PanSeg,
    /// Semantic segmentation (10k subset).
    SemSeg,
    /// Object detection, 2020 release (100k subset).
    #[serde(rename = "det_20")]
    Det20,
    /// Drivable area (100k subset).
    Drivable,
    /// Lane marking (100k subset).
    Lane,
    /// Pose estimation, 2021 release (100k subset).
    #[serde(rename = "pose_21")]
    Pose21,
}

/// Which image subset a label set annotates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSubset {
    TenK,
    HundredK,
}

impl ImageSubset {
    /// Directory name under `images/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ImageSubset::TenK => "10k",
            ImageSubset::HundredK => "100k",
        }
    }
}

impl LabelSet {
    pub const ALL: [LabelSet; 7] = [
        LabelSet::InsSeg,
        LabelSet::PanSeg,
        LabelSet::SemSeg,
        LabelSet::Det20,
        LabelSet::Drivable,
        LabelSet::Lane,
        LabelSet::Pose21,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelSet::InsSeg => "ins_seg",
            LabelSet::PanSeg => "pan_seg",
            LabelSet::SemSeg => "sem_seg",
            LabelSet::Det20 => "det_20",
            LabelSet::Drivable => "drivable",
            LabelSet::Lane => "lane",
            LabelSet::Pose21 => "pose_21",
        }
    }

    pub fn image_subset(&self) -> ImageSubset {
        match self {
            LabelSet::InsSeg | LabelSet::PanSeg | LabelSet::SemSeg => ImageSubset::TenK,
            LabelSet::Det20 | LabelSet::Drivable | LabelSet::Lane | LabelSet::Pose21 => {
                ImageSubset::HundredK
            }
        }
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelSet {
    type Err = ArmitageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelSet::ALL
            .into_iter()
            .find(|set| set.as_str() == s)
            .ok_or_else(|| ArmitageError::UnsupportedLabelSet(s.to_string()))
    }
}

/// A dataset split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths inside an extracted `bdd100k/` directory.
#[derive(Clone, Debug)]
pub struct Bdd100kLayout {
    root: PathBuf,
}

impl Bdd100kLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `images/100k/<split>`.
    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root
            .join("images")
            .join(LabelSet::Det20.image_subset().dir_name())
            .join(split.as_str())
    }

    /// `labels/det_20/det_<split>.json`.
    ///
    /// # Errors
    /// The test split is published without labels.
    pub fn det20_labels(&self, split: Split) -> Result<PathBuf, ArmitageError> {
        if split == Split::Test {
            return Err(ArmitageError::MissingSplitLabels {
                split: split.to_string(),
            });
        }
        Ok(self
            .root
            .join("labels")
            .join(LabelSet::Det20.as_str())
            .join(format!("det_{}.json", split)))
    }
}

//! Declarative experiment configuration.
//!
//! Components are described by a `type` name plus free-form parameters:
//!
//! ```yaml
//! default_scope: armitage
//! train_dataloader:
//!   batch_size: 8
//!   dataset:
//!     type: BDD100KDataset
//!     images_path: data/bdd100k/images/100k/train
//!     labels_path: data/bdd100k/labels/det_20/det_train.json
//! ```
//!
//! Only the dataloader sections are consumed here; other keys (model,
//! optimizer, hooks, ...) belong to the training framework and are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bdd100k::{ImageDimensions, LabelSet, NormalizeOptions};
use crate::dataset::{Bdd100kDataset, DetectionDataset};
use crate::error::ArmitageError;
use crate::registry::{DatasetFactory, Registry};

/// A registered component reference with its constructor parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Registry key, `Name` or `scope.Name`.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ComponentConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// One dataloader section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataloaderConfig {
    pub dataset: ComponentConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_workers: Option<usize>,
}

/// The parts of an experiment config this crate reads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Scope that unscoped type names resolve from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_dataloader: Option<DataloaderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_dataloader: Option<DataloaderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dataloader: Option<DataloaderConfig>,
}

impl ExperimentConfig {
    /// Configured dataloaders as `(section name, config)`, in train/val/test order.
    pub fn dataloaders(&self) -> Vec<(&'static str, &DataloaderConfig)> {
        [
            ("train_dataloader", &self.train_dataloader),
            ("val_dataloader", &self.val_dataloader),
            ("test_dataloader", &self.test_dataloader),
        ]
        .into_iter()
        .filter_map(|(section, cfg)| cfg.as_ref().map(|cfg| (section, cfg)))
        .collect()
    }
}

/// Reads an experiment config; `.yaml`/`.yml` files are parsed as YAML,
/// anything else as JSON.
pub fn load_experiment(path: &Path) -> Result<ExperimentConfig, ArmitageError> {
    let text = fs::read_to_string(path)?;

    if is_yaml(path) {
        serde_yaml::from_str(&text).map_err(|source| ArmitageError::ConfigYamlParse {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&text).map_err(|source| ArmitageError::ConfigJsonParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Resolves `config.type_name` and builds the dataset.
///
/// With a `default_scope`, unscoped names resolve starting from the table in
/// the chain that owns that scope.
pub fn build_dataset(
    registry: &Registry<DatasetFactory>,
    config: &ComponentConfig,
    default_scope: Option<&str>,
) -> Result<Box<dyn DetectionDataset>, ArmitageError> {
    let start = match default_scope {
        Some(scope) => registry
            .scoped(scope)
            .ok_or_else(|| ArmitageError::UnknownScope {
                registry: registry.name().to_string(),
                scope: scope.to_string(),
            })?,
        None => registry,
    };

    let factory = start.resolve(&config.type_name)?;
    tracing::debug!(type_name = %config.type_name, "building dataset from config");
    factory(&Value::Object(config.params.clone()))
}

/// Constructor parameters of [`Bdd100kDataset`].
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bdd100kParams {
    pub images_path: PathBuf,
    pub labels_path: PathBuf,
    #[serde(default = "default_label_set")]
    pub label_set: String,
    /// Read real image sizes from file headers instead of assuming 720x1280.
    #[serde(default)]
    pub probe_dimensions: bool,
}

fn default_label_set() -> String {
    LabelSet::Det20.as_str().to_string()
}

/// The registered factory for [`Bdd100kDataset`].
pub fn build_bdd100k(params: &Value) -> Result<Box<dyn DetectionDataset>, ArmitageError> {
    let params = Bdd100kParams::deserialize(params).map_err(|source| {
        ArmitageError::InvalidComponentConfig {
            type_name: Bdd100kDataset::TYPE_NAME.to_string(),
            source,
        }
    })?;

    let label_set: LabelSet = params.label_set.parse()?;
    if label_set != LabelSet::Det20 {
        return Err(ArmitageError::UnsupportedLabelSet(label_set.to_string()));
    }

    let opts = NormalizeOptions {
        dimensions: if params.probe_dimensions {
            ImageDimensions::ProbeHeader
        } else {
            ImageDimensions::default()
        },
    };
    let dataset = Bdd100kDataset::open_with(&params.images_path, &params.labels_path, &opts)?;
    Ok(Box::new(dataset))
}

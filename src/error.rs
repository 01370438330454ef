use std::path::PathBuf;
use thiserror::Error;

/// The main error type for armitage operations.
#[derive(Debug, Error)]
pub enum ArmitageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse BDD100K det_20 JSON from {path}: {source}")]
    Det20JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write normalized JSON to {path}: {source}")]
    NormalizedJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize report as JSON: {source}")]
    ReportSerialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("No annotation records to normalize")]
    EmptyAnnotations,

    #[error("Missing key '{key}' on label {label} of sample '{sample}'")]
    MissingKey {
        sample: String,
        label: String,
        key: &'static str,
    },

    #[error("Attribute '{key}' on {record} collides with a reserved field")]
    ReservedAttribute { record: String, key: String },

    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("'{name}' is already registered in the {registry} registry")]
    AlreadyRegistered { registry: String, name: String },

    #[error("'{name}' is not registered in the {registry} registry or its parents")]
    NotRegistered { registry: String, name: String },

    #[error("No {registry} registry with scope '{scope}' in the lookup chain")]
    UnknownScope { registry: String, scope: String },

    #[error("Failed to parse YAML config from {path}: {source}")]
    ConfigYamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON config from {path}: {source}")]
    ConfigJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid parameters for component '{type_name}': {source}")]
    InvalidComponentConfig {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported BDD100K label set: {0}")]
    UnsupportedLabelSet(String),

    #[error("BDD100K split '{split}' has no published labels")]
    MissingSplitLabels { split: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}


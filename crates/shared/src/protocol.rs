//! Wire payloads of the classifier service.
//!
//! Fields the client can live without are decoded leniently: a field with an
//! unexpected shape reads as absent instead of failing the whole payload.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::TaskId;

pub mod routes {
    pub const STATUS: &str = "/status";
    pub const VISUALIZATIONS: &str = "/visualizations";
    pub const PREDICT: &str = "/predict";
    pub const RETRAIN_UPLOAD: &str = "/retrain/upload";
    pub const RETRAIN_TRIGGER: &str = "/retrain/trigger";
}

pub mod fields {
    pub const PREDICT_FILE: &str = "file";
    pub const UPLOAD_CLASS_NAME: &str = "class_name";
    pub const UPLOAD_FILES: &str = "files";
}

/// Keys of `class_distribution` that describe the payload rather than a class.
pub const DISTRIBUTION_METADATA_KEYS: &[&str] = &["message"];

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model_info: Option<ModelInfoPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfoPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub classes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationPayload {
    /// Label to image count, in the order the service listed them. Kept raw
    /// because it may carry non-numeric metadata entries.
    #[serde(default)]
    pub class_distribution: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub new_data_size: Option<DatasetSizePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSizePayload {
    #[serde(default, deserialize_with = "lenient")]
    pub total_images: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ready_to_train: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub predicted_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadAck {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTriggerPayload {
    pub task_id: TaskId,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}

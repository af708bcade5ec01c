use chrono::{DateTime, Utc};
use shared::domain::{ServiceState, TaskId};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSnapshot {
    pub service_state: ServiceState,
    /// Raw status text as the service reported it.
    pub status_text: Option<String>,
    pub model_name: Option<String>,
    pub model_info: Option<ModelInfo>,
}

impl StatusSnapshot {
    pub fn status_label(&self) -> &str {
        self.status_text.as_deref().unwrap_or("Unknown")
    }

    pub fn class_count_label(&self) -> String {
        self.model_info
            .as_ref()
            .map(|info| info.class_labels.len().to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn accuracy_label(&self) -> String {
        self.model_info
            .as_ref()
            .and_then(|info| info.accuracy)
            .map(|accuracy| format!("{:.1}%", accuracy * 100.0))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelInfo {
    pub class_labels: Vec<String>,
    /// Fraction in `[0, 1]`.
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCount {
    pub label: String,
    pub count: u64,
}

impl ClassCount {
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub total_images: u64,
    pub ready_to_train: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutcome {
    Classified(String),
    /// The service answered but without a usable class label.
    Unrecognized,
    Failed(String),
}

impl PredictionOutcome {
    pub fn predicted_class(&self) -> Option<&str> {
        match self {
            Self::Classified(label) => Some(label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTaskState {
    Pending,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingJobHandle {
    pub task_id: TaskId,
    pub triggered_at: DateTime<Utc>,
}

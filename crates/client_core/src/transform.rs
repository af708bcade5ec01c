//! Pure mappings from service payloads to the shapes the view layer renders.

use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::{
    domain::ServiceState,
    protocol::{
        PredictionPayload, StatusPayload, TrainingTriggerPayload, VisualizationPayload,
        DISTRIBUTION_METADATA_KEYS,
    },
};

use crate::types::{
    ClassCount, DatasetSummary, ModelInfo, PredictionOutcome, StatusSnapshot, TrainingJobHandle,
};

pub fn to_status_snapshot(payload: &StatusPayload) -> StatusSnapshot {
    let status_text = non_blank(payload.status.as_deref());
    let model_info = payload.model_info.as_ref().and_then(|info| {
        // An empty `model_info` means no model is loaded: unknown, not zero classes.
        let class_labels = info.classes.clone()?;
        let accuracy = info
            .accuracy
            .filter(|value| value.is_finite() && (0.0..=1.0).contains(value));
        Some(ModelInfo {
            class_labels,
            accuracy,
        })
    });

    StatusSnapshot {
        service_state: ServiceState::from_status_text(status_text.as_deref()),
        status_text,
        model_name: non_blank(payload.model_name.as_deref()),
        model_info,
    }
}

pub fn to_class_distribution_series(payload: &VisualizationPayload) -> Vec<ClassCount> {
    let Some(Value::Object(distribution)) = payload.class_distribution.as_ref() else {
        return Vec::new();
    };

    distribution
        .iter()
        .filter(|(key, _)| !DISTRIBUTION_METADATA_KEYS.contains(&key.as_str()))
        .map(|(key, value)| ClassCount::new(key.clone(), count_from(value)))
        .collect()
}

pub fn to_dataset_summary(payload: &VisualizationPayload) -> Option<DatasetSummary> {
    let size = payload.new_data_size.as_ref()?;
    let ready_to_train = size
        .ready_to_train
        .as_deref()
        .is_some_and(|flag| flag.trim_start().to_ascii_lowercase().starts_with("yes"));
    Some(DatasetSummary {
        total_images: size.total_images.unwrap_or_default(),
        ready_to_train,
        message: non_blank(size.message.as_deref()),
    })
}

pub fn to_prediction_result(payload: &PredictionPayload) -> PredictionOutcome {
    match non_blank(payload.predicted_class.as_deref()) {
        Some(label) => PredictionOutcome::Classified(label),
        None => PredictionOutcome::Unrecognized,
    }
}

pub fn to_training_job(
    payload: &TrainingTriggerPayload,
    triggered_at: DateTime<Utc>,
) -> TrainingJobHandle {
    TrainingJobHandle {
        task_id: payload.task_id.clone(),
        triggered_at,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn count_from(value: &Value) -> u64 {
    match value {
        Value::Number(number) => {
            if let Some(count) = number.as_u64() {
                count
            } else if let Some(float) = number.as_f64().filter(|f| f.is_finite() && *f > 0.0) {
                float.trunc() as u64
            } else {
                0
            }
        }
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

#[cfg(test)]
#[path = "tests/transform_tests.rs"]
mod tests;

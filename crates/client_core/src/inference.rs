use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::ValidationError,
    media::ImageFile,
    remote::RemoteService,
    state::{InferenceSlice, NoticeKind},
    transform::to_prediction_result,
    types::PredictionOutcome,
};

/// Runs one classification at a time against the service.
#[derive(Clone)]
pub struct InferenceController {
    remote: Arc<dyn RemoteService>,
    slice: InferenceSlice,
}

impl InferenceController {
    pub fn new(remote: Arc<dyn RemoteService>, slice: InferenceSlice) -> Self {
        Self { remote, slice }
    }

    /// Classifies `image`. Rejected without side effects when the image is
    /// unusable or another classification is still running; otherwise the
    /// outcome (including a service failure) is written to the store.
    pub async fn classify(&self, image: &ImageFile) -> Result<PredictionOutcome, ValidationError> {
        image.validate()?;
        let Some(ticket) = self.slice.try_begin() else {
            return Err(ValidationError::PredictionInFlight);
        };

        let outcome = match self.remote.predict(image).await {
            Ok(payload) => {
                let outcome = to_prediction_result(&payload);
                match &outcome {
                    PredictionOutcome::Classified(label) => {
                        info!(filename = %image.filename, label = %label, "image classified")
                    }
                    _ => warn!(
                        filename = %image.filename,
                        "prediction response carried no class label"
                    ),
                }
                outcome
            }
            Err(err) => {
                warn!(filename = %image.filename, "prediction failed: {err}");
                self.slice.notify(
                    NoticeKind::Interrupting,
                    format!("Prediction failed: {err}"),
                );
                PredictionOutcome::Failed(err.to_string())
            }
        };

        ticket.settle(outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/inference_tests.rs"]
mod tests;

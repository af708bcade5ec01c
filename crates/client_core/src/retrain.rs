use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::{ServiceFailure, ValidationError},
    media::{DatasetSelection, ImageFile},
    remote::RemoteService,
    state::{lock, NoticeKind, RetrainSlice, Workflow},
    status_sync::{RefreshReport, StatusSyncController},
    transform::to_training_job,
    types::TrainingJobHandle,
};

#[derive(Debug)]
pub enum UploadOutcome {
    /// The service accepted the images. `refresh` is the dashboard refresh
    /// started in the background; awaiting it is optional.
    Uploaded { refresh: JoinHandle<RefreshReport> },
    Failed(ServiceFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingOutcome {
    Started(TrainingJobHandle),
    Failed(ServiceFailure),
}

/// Dataset uploads and retraining triggers.
#[derive(Clone)]
pub struct RetrainController {
    remote: Arc<dyn RemoteService>,
    slice: RetrainSlice,
    status: StatusSyncController,
    upload_status_window: Duration,
    clear_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RetrainController {
    pub fn new(
        remote: Arc<dyn RemoteService>,
        slice: RetrainSlice,
        status: StatusSyncController,
        upload_status_window: Duration,
    ) -> Self {
        Self {
            remote,
            slice,
            status,
            upload_status_window,
            clear_task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn stage_selection(&self, class_label: impl Into<String>, images: Vec<ImageFile>) {
        self.slice.stage_selection(DatasetSelection::new(class_label, images));
    }

    /// Uploads whatever selection is currently staged in the store.
    pub async fn upload_staged(&self) -> Result<UploadOutcome, ValidationError> {
        let selection = self
            .slice
            .pending_selection()
            .ok_or(ValidationError::NothingStaged)?;
        self.upload(selection).await
    }

    pub async fn upload_dataset(
        &self,
        class_label: &str,
        images: Vec<ImageFile>,
    ) -> Result<UploadOutcome, ValidationError> {
        self.upload(DatasetSelection::new(class_label, images)).await
    }

    async fn upload(&self, selection: DatasetSelection) -> Result<UploadOutcome, ValidationError> {
        let class_label = selection.validate()?;
        let ticket = self
            .slice
            .try_begin_upload()
            .ok_or(ValidationError::UploadInFlight)?;
        self.cancel_pending_clear();
        let generation = ticket.generation();

        match self
            .remote
            .upload_dataset(class_label, &selection.images)
            .await
        {
            Ok(_) => {
                info!(
                    class_label,
                    files = selection.images.len(),
                    "dataset upload succeeded"
                );
                ticket.succeed();
                let status = self.status.clone();
                let refresh = tokio::spawn(async move { status.refresh().await });
                self.schedule_clear(generation);
                Ok(UploadOutcome::Uploaded { refresh })
            }
            Err(err) => {
                warn!(class_label, "dataset upload failed: {err}");
                ticket.fail();
                self.slice.notify(
                    Workflow::Upload,
                    NoticeKind::Inline,
                    format!("Upload failed: {err}"),
                );
                Ok(UploadOutcome::Failed(err))
            }
        }
    }

    /// Clears a finished upload status before its window runs out.
    pub fn dismiss_upload_status(&self) {
        self.cancel_pending_clear();
        self.slice.dismiss_upload_status();
    }

    /// Asks the service to start retraining. The returned handle replaces
    /// any earlier one; the job itself is not followed any further.
    pub async fn trigger_training(&self) -> TrainingOutcome {
        match self.remote.trigger_retrain().await {
            Ok(payload) => {
                let handle = to_training_job(&payload, Utc::now());
                info!(
                    task_id = %handle.task_id,
                    remote_status = payload.status.as_deref().unwrap_or("unknown"),
                    "retraining triggered"
                );
                self.slice.set_training_job(handle.clone());
                TrainingOutcome::Started(handle)
            }
            Err(err) => {
                warn!("failed to trigger retraining: {err}");
                self.slice.notify(
                    Workflow::Training,
                    NoticeKind::Interrupting,
                    format!("Failed to trigger training: {err}"),
                );
                TrainingOutcome::Failed(err)
            }
        }
    }

    fn schedule_clear(&self, generation: u64) {
        let slice = self.slice.clone();
        let window = self.upload_status_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if slice.clear_upload_status(generation) {
                debug!(generation, "upload status cleared");
            }
        });
        if let Some(previous) = lock(&self.clear_task).replace(handle) {
            previous.abort();
        }
    }

    fn cancel_pending_clear(&self) {
        if let Some(pending) = lock(&self.clear_task).take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/retrain_tests.rs"]
mod tests;

//! Orchestration core of the classifier operator client.
//!
//! [`ClassifierClient`] wires one [`AppStateStore`] to the three workflow
//! controllers. Each controller only gets the store slice it is allowed to
//! write; the view layer observes the store through [`AppStateStore::subscribe`]
//! and [`AppStateStore::subscribe_notices`].

use std::{sync::Arc, time::Duration};

use shared::domain::ActiveTab;

pub mod config;
pub mod error;
pub mod inference;
pub mod media;
pub mod remote;
pub mod retrain;
pub mod state;
pub mod status_sync;
pub mod transform;
pub mod types;

pub use config::{load_settings, ClientSettings};
pub use error::{ConfigError, ServiceFailure, ValidationError};
pub use inference::InferenceController;
pub use media::{DatasetSelection, ImageFile};
pub use remote::{HttpRemoteService, RemoteService};
pub use retrain::{RetrainController, TrainingOutcome, UploadOutcome};
pub use state::{AppState, AppStateStore, Notice, NoticeKind, Workflow, WorkflowFlags};
pub use status_sync::{FieldOutcome, RefreshReport, StatusSyncController};
pub use types::{
    ClassCount, DatasetSummary, ModelInfo, PredictionOutcome, StatusSnapshot, TrainingJobHandle,
    UploadTaskState,
};

#[derive(Clone)]
pub struct ClassifierClient {
    store: AppStateStore,
    status: StatusSyncController,
    inference: InferenceController,
    retrain: RetrainController,
    navigation: state::NavigationSlice,
}

impl ClassifierClient {
    pub fn new(settings: &ClientSettings) -> Self {
        Self::with_remote(
            Arc::new(HttpRemoteService::new(settings)),
            settings.upload_status_window,
        )
    }

    pub fn with_remote(remote: Arc<dyn RemoteService>, upload_status_window: Duration) -> Self {
        let store = AppStateStore::new();
        let status = StatusSyncController::new(Arc::clone(&remote), store.status_slice());
        let inference = InferenceController::new(Arc::clone(&remote), store.inference_slice());
        let retrain = RetrainController::new(
            remote,
            store.retrain_slice(),
            status.clone(),
            upload_status_window,
        );
        let navigation = store.navigation_slice();
        Self {
            store,
            status,
            inference,
            retrain,
            navigation,
        }
    }

    pub fn store(&self) -> &AppStateStore {
        &self.store
    }

    pub fn state(&self) -> AppState {
        self.store.snapshot()
    }

    pub fn status(&self) -> &StatusSyncController {
        &self.status
    }

    pub fn inference(&self) -> &InferenceController {
        &self.inference
    }

    pub fn retrain(&self) -> &RetrainController {
        &self.retrain
    }

    pub fn select_tab(&self, tab: ActiveTab) {
        self.navigation.select_tab(tab);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

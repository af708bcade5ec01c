//! Process-wide application state and the narrow write handles controllers use.
//!
//! The store owns one [`AppState`] behind a `watch` channel. Observers get a
//! receiver; writers get a slice that can only touch its own field group.
//! Every slice method applies its mutation in a single `send_modify` /
//! `send_if_modified` step, so no other write can interleave inside it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::ActiveTab;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::{
    media::DatasetSelection,
    types::{
        ClassCount, DatasetSummary, PredictionOutcome, StatusSnapshot, TrainingJobHandle,
        UploadTaskState,
    },
};

const NOTICE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowFlags {
    pub loading: bool,
    pub uploading: bool,
    pub predicting: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub status: StatusSnapshot,
    pub class_distribution: Vec<ClassCount>,
    pub dataset_summary: Option<DatasetSummary>,
    pub flags: WorkflowFlags,
    pub prediction: Option<PredictionOutcome>,
    pub upload_task: Option<UploadTaskState>,
    pub pending_selection: Option<DatasetSelection>,
    pub training_job: Option<TrainingJobHandle>,
    pub active_tab: ActiveTab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Status,
    Inference,
    Upload,
    Training,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Needs the operator's attention before they continue.
    Interrupting,
    /// Shown next to the action that caused it.
    Inline,
}

/// A user-visible failure signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub workflow: Workflow,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone)]
pub struct AppStateStore {
    state: Arc<watch::Sender<AppState>>,
    notices: broadcast::Sender<Notice>,
    sync_marks: Arc<Mutex<SyncMarks>>,
    upload_generation: Arc<Mutex<u64>>,
}

impl Default for AppStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStateStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AppState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            state: Arc::new(state),
            notices,
            sync_marks: Arc::new(Mutex::new(SyncMarks::default())),
            upload_generation: Arc::new(Mutex::new(0)),
        }
    }

    pub fn snapshot(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn status_slice(&self) -> StatusSlice {
        StatusSlice {
            state: Arc::clone(&self.state),
            marks: Arc::clone(&self.sync_marks),
        }
    }

    pub fn inference_slice(&self) -> InferenceSlice {
        InferenceSlice {
            state: Arc::clone(&self.state),
            notices: self.notices.clone(),
        }
    }

    pub fn retrain_slice(&self) -> RetrainSlice {
        RetrainSlice {
            state: Arc::clone(&self.state),
            notices: self.notices.clone(),
            upload_generation: Arc::clone(&self.upload_generation),
        }
    }

    pub fn navigation_slice(&self) -> NavigationSlice {
        NavigationSlice {
            state: Arc::clone(&self.state),
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn publish(notices: &broadcast::Sender<Notice>, notice: Notice) {
    debug!(workflow = ?notice.workflow, kind = ?notice.kind, "notice: {}", notice.message);
    // Nobody listening is fine; the state itself still carries the outcome.
    let _ = notices.send(notice);
}

#[derive(Debug, Default)]
struct SyncMarks {
    issued: u64,
    in_flight: usize,
    status_applied: u64,
    visualizations_applied: u64,
}

/// Write access to the status snapshot, distribution series and `loading`.
#[derive(Clone)]
pub struct StatusSlice {
    state: Arc<watch::Sender<AppState>>,
    marks: Arc<Mutex<SyncMarks>>,
}

impl StatusSlice {
    /// Marks a refresh as started. `loading` stays true until every ticket
    /// handed out here has been dropped.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut marks = lock(&self.marks);
        marks.issued += 1;
        marks.in_flight += 1;
        self.state.send_if_modified(|state| {
            let changed = !state.flags.loading;
            state.flags.loading = true;
            changed
        });
        RefreshTicket {
            slice: self.clone(),
            sequence: marks.issued,
        }
    }

    /// Returns `false` when a newer refresh already applied its status.
    pub fn apply_status(&self, sequence: u64, snapshot: StatusSnapshot) -> bool {
        let mut marks = lock(&self.marks);
        if sequence < marks.status_applied {
            return false;
        }
        marks.status_applied = sequence;
        self.state.send_if_modified(|state| {
            if state.status == snapshot {
                return false;
            }
            state.status = snapshot;
            true
        });
        true
    }

    /// Returns `false` when a newer refresh already applied its series.
    pub fn apply_visualizations(
        &self,
        sequence: u64,
        series: Vec<ClassCount>,
        summary: Option<DatasetSummary>,
    ) -> bool {
        let mut marks = lock(&self.marks);
        if sequence < marks.visualizations_applied {
            return false;
        }
        marks.visualizations_applied = sequence;
        self.state.send_if_modified(|state| {
            if state.class_distribution == series && state.dataset_summary == summary {
                return false;
            }
            state.class_distribution = series;
            state.dataset_summary = summary;
            true
        });
        true
    }

    fn finish_refresh(&self) {
        let mut marks = lock(&self.marks);
        marks.in_flight = marks.in_flight.saturating_sub(1);
        if marks.in_flight == 0 {
            self.state.send_modify(|state| state.flags.loading = false);
        }
    }
}

/// Held for the lifetime of one refresh; dropping it settles `loading`.
pub struct RefreshTicket {
    slice: StatusSlice,
    sequence: u64,
}

impl RefreshTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        self.slice.finish_refresh();
    }
}

/// Write access to `predicting` and the prediction result.
#[derive(Clone)]
pub struct InferenceSlice {
    state: Arc<watch::Sender<AppState>>,
    notices: broadcast::Sender<Notice>,
}

impl InferenceSlice {
    /// Starts a prediction unless one is already running. Starting clears
    /// the previous result.
    pub fn try_begin(&self) -> Option<PredictionTicket> {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.flags.predicting {
                return false;
            }
            state.flags.predicting = true;
            state.prediction = None;
            started = true;
            true
        });
        started.then(|| PredictionTicket {
            slice: self.clone(),
            settled: false,
        })
    }

    pub fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        publish(
            &self.notices,
            Notice {
                workflow: Workflow::Inference,
                kind,
                message: message.into(),
            },
        );
    }
}

/// Proof that this caller owns the in-flight prediction. `predicting` is
/// cleared when the ticket is settled or dropped, whichever comes first.
pub struct PredictionTicket {
    slice: InferenceSlice,
    settled: bool,
}

impl PredictionTicket {
    pub fn settle(mut self, outcome: PredictionOutcome) {
        self.settled = true;
        self.slice.state.send_modify(|state| {
            state.prediction = Some(outcome);
            state.flags.predicting = false;
        });
    }
}

impl Drop for PredictionTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.slice
                .state
                .send_modify(|state| state.flags.predicting = false);
        }
    }
}

/// Write access to the upload status, staged selection and training handle.
#[derive(Clone)]
pub struct RetrainSlice {
    state: Arc<watch::Sender<AppState>>,
    notices: broadcast::Sender<Notice>,
    upload_generation: Arc<Mutex<u64>>,
}

impl RetrainSlice {
    pub fn stage_selection(&self, selection: DatasetSelection) {
        self.state
            .send_modify(|state| state.pending_selection = Some(selection));
    }

    pub fn pending_selection(&self) -> Option<DatasetSelection> {
        self.state.borrow().pending_selection.clone()
    }

    /// Starts an upload unless one is already pending. Returns the upload's
    /// generation, used to match later settle and clear steps.
    pub fn try_begin_upload(&self) -> Option<UploadTicket> {
        let mut generation = lock(&self.upload_generation);
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.upload_task == Some(UploadTaskState::Pending) {
                return false;
            }
            state.upload_task = Some(UploadTaskState::Pending);
            state.flags.uploading = true;
            started = true;
            true
        });
        if !started {
            return None;
        }
        *generation += 1;
        Some(UploadTicket {
            slice: self.clone(),
            generation: *generation,
            settled: false,
        })
    }

    /// Resets the upload status to "no task" if `generation` is still the
    /// latest upload and it has finished.
    pub fn clear_upload_status(&self, generation: u64) -> bool {
        let current = lock(&self.upload_generation);
        if *current != generation {
            return false;
        }
        self.state.send_if_modified(|state| match state.upload_task {
            Some(UploadTaskState::Success | UploadTaskState::Failure) => {
                state.upload_task = None;
                true
            }
            _ => false,
        })
    }

    pub fn dismiss_upload_status(&self) -> bool {
        self.state.send_if_modified(|state| match state.upload_task {
            Some(UploadTaskState::Success | UploadTaskState::Failure) => {
                state.upload_task = None;
                true
            }
            _ => false,
        })
    }

    pub fn set_training_job(&self, handle: TrainingJobHandle) {
        self.state
            .send_modify(|state| state.training_job = Some(handle));
    }

    pub fn notify(&self, workflow: Workflow, kind: NoticeKind, message: impl Into<String>) {
        publish(
            &self.notices,
            Notice {
                workflow,
                kind,
                message: message.into(),
            },
        );
    }
}

pub struct UploadTicket {
    slice: RetrainSlice,
    generation: u64,
    settled: bool,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.slice.state.send_modify(|state| {
            state.upload_task = Some(UploadTaskState::Success);
            state.flags.uploading = false;
            state.pending_selection = None;
        });
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.slice.state.send_modify(|state| {
            state.upload_task = Some(UploadTaskState::Failure);
            state.flags.uploading = false;
        });
    }
}

impl Drop for UploadTicket {
    fn drop(&mut self) {
        if !self.settled {
            self.slice.state.send_modify(|state| {
                if state.upload_task == Some(UploadTaskState::Pending) {
                    state.upload_task = None;
                }
                state.flags.uploading = false;
            });
        }
    }
}

/// Write access to the selected tab.
#[derive(Clone)]
pub struct NavigationSlice {
    state: Arc<watch::Sender<AppState>>,
}

impl NavigationSlice {
    pub fn select_tab(&self, tab: ActiveTab) {
        self.state.send_if_modified(|state| {
            if state.active_tab == tab {
                return false;
            }
            state.active_tab = tab;
            true
        });
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;

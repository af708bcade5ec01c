use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::ServiceFailure,
    remote::RemoteService,
    state::StatusSlice,
    transform::{to_class_distribution_series, to_dataset_summary, to_status_snapshot},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Applied,
    /// A newer refresh had already written this field group.
    Superseded,
    /// The previous value was kept.
    Failed(ServiceFailure),
}

impl FieldOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub sequence: u64,
    pub status: FieldOutcome,
    pub visualizations: FieldOutcome,
}

/// Keeps the dashboard snapshot in sync with the service.
#[derive(Clone)]
pub struct StatusSyncController {
    remote: Arc<dyn RemoteService>,
    slice: StatusSlice,
}

impl StatusSyncController {
    pub fn new(remote: Arc<dyn RemoteService>, slice: StatusSlice) -> Self {
        Self { remote, slice }
    }

    /// Fetches status and visualizations concurrently and applies each one
    /// as soon as it lands. A failed fetch leaves its fields untouched.
    pub async fn refresh(&self) -> RefreshReport {
        let ticket = self.slice.begin_refresh();
        let sequence = ticket.sequence();
        debug!(sequence, "refreshing service overview");

        let status = async {
            match self.remote.fetch_status().await {
                Ok(payload) => {
                    let snapshot = to_status_snapshot(&payload);
                    applied_or_superseded(self.slice.apply_status(sequence, snapshot))
                }
                Err(err) => {
                    warn!(sequence, "status fetch failed, keeping previous snapshot: {err}");
                    FieldOutcome::Failed(err)
                }
            }
        };

        let visualizations = async {
            match self.remote.fetch_visualizations().await {
                Ok(payload) => {
                    let series = to_class_distribution_series(&payload);
                    let summary = to_dataset_summary(&payload);
                    applied_or_superseded(
                        self.slice.apply_visualizations(sequence, series, summary),
                    )
                }
                Err(err) => {
                    warn!(sequence, "visualizations fetch failed, keeping previous series: {err}");
                    FieldOutcome::Failed(err)
                }
            }
        };

        let (status, visualizations) = futures::join!(status, visualizations);
        drop(ticket);

        if status == FieldOutcome::Superseded || visualizations == FieldOutcome::Superseded {
            debug!(sequence, "refresh overtaken by a newer one");
        }
        RefreshReport {
            sequence,
            status,
            visualizations,
        }
    }
}

fn applied_or_superseded(applied: bool) -> FieldOutcome {
    if applied {
        FieldOutcome::Applied
    } else {
        FieldOutcome::Superseded
    }
}

#[cfg(test)]
#[path = "tests/status_sync_tests.rs"]
mod tests;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::TaskId,
    protocol::{
        ModelInfoPayload, PredictionPayload, StatusPayload, TrainingTriggerPayload, UploadAck,
        VisualizationPayload,
    },
};
use tokio::sync::oneshot;

use crate::{error::ServiceFailure, media::ImageFile, remote::RemoteService};

struct Scripted<T> {
    result: Result<T, ServiceFailure>,
    gate: Option<oneshot::Receiver<()>>,
}

type Queue<T> = Mutex<VecDeque<Scripted<T>>>;

/// Remote service that answers from per-operation queues. A gated answer is
/// held back until its sender fires (or is dropped).
#[derive(Default)]
pub(crate) struct FakeRemote {
    status: Queue<StatusPayload>,
    visualizations: Queue<VisualizationPayload>,
    predictions: Queue<PredictionPayload>,
    uploads: Queue<UploadAck>,
    triggers: Queue<TrainingTriggerPayload>,
    uploaded: Mutex<Vec<(String, Vec<String>)>>,
    predicted: Mutex<Vec<String>>,
}

fn push<T>(queue: &Queue<T>, result: Result<T, ServiceFailure>) {
    queue.lock().unwrap().push_back(Scripted { result, gate: None });
}

fn push_gated<T>(queue: &Queue<T>, result: Result<T, ServiceFailure>) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    queue.lock().unwrap().push_back(Scripted {
        result,
        gate: Some(rx),
    });
    tx
}

async fn next<T>(queue: &Queue<T>, op: &str) -> Result<T, ServiceFailure> {
    let scripted = queue.lock().unwrap().pop_front();
    let Some(scripted) = scripted else {
        return Err(ServiceFailure::Network(format!("no scripted {op} response")));
    };
    if let Some(gate) = scripted.gate {
        let _ = gate.await;
    }
    scripted.result
}

impl FakeRemote {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_status(&self, result: Result<StatusPayload, ServiceFailure>) {
        push(&self.status, result);
    }

    pub(crate) fn push_status_gated(
        &self,
        result: Result<StatusPayload, ServiceFailure>,
    ) -> oneshot::Sender<()> {
        push_gated(&self.status, result)
    }

    pub(crate) fn push_visualizations(&self, result: Result<VisualizationPayload, ServiceFailure>) {
        push(&self.visualizations, result);
    }

    pub(crate) fn push_visualizations_gated(
        &self,
        result: Result<VisualizationPayload, ServiceFailure>,
    ) -> oneshot::Sender<()> {
        push_gated(&self.visualizations, result)
    }

    pub(crate) fn push_prediction(&self, result: Result<PredictionPayload, ServiceFailure>) {
        push(&self.predictions, result);
    }

    pub(crate) fn push_prediction_gated(
        &self,
        result: Result<PredictionPayload, ServiceFailure>,
    ) -> oneshot::Sender<()> {
        push_gated(&self.predictions, result)
    }

    pub(crate) fn push_upload(&self, result: Result<UploadAck, ServiceFailure>) {
        push(&self.uploads, result);
    }

    pub(crate) fn push_upload_gated(
        &self,
        result: Result<UploadAck, ServiceFailure>,
    ) -> oneshot::Sender<()> {
        push_gated(&self.uploads, result)
    }

    pub(crate) fn push_trigger(&self, result: Result<TrainingTriggerPayload, ServiceFailure>) {
        push(&self.triggers, result);
    }

    pub(crate) fn uploaded(&self) -> Vec<(String, Vec<String>)> {
        self.uploaded.lock().unwrap().clone()
    }

    pub(crate) fn predicted(&self) -> Vec<String> {
        self.predicted.lock().unwrap().clone()
    }

    pub(crate) fn pending_status_answers(&self) -> usize {
        self.status.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn fetch_status(&self) -> Result<StatusPayload, ServiceFailure> {
        next(&self.status, "status").await
    }

    async fn fetch_visualizations(&self) -> Result<VisualizationPayload, ServiceFailure> {
        next(&self.visualizations, "visualizations").await
    }

    async fn predict(&self, image: &ImageFile) -> Result<PredictionPayload, ServiceFailure> {
        self.predicted.lock().unwrap().push(image.filename.clone());
        next(&self.predictions, "predict").await
    }

    async fn upload_dataset(
        &self,
        class_label: &str,
        images: &[ImageFile],
    ) -> Result<UploadAck, ServiceFailure> {
        self.uploaded.lock().unwrap().push((
            class_label.to_string(),
            images.iter().map(|image| image.filename.clone()).collect(),
        ));
        next(&self.uploads, "upload").await
    }

    async fn trigger_retrain(&self) -> Result<TrainingTriggerPayload, ServiceFailure> {
        next(&self.triggers, "trigger").await
    }
}

pub(crate) fn online_status() -> StatusPayload {
    StatusPayload {
        status: Some("Online".into()),
        model_name: Some("resnet18".into()),
        model_info: Some(ModelInfoPayload {
            classes: Some(vec!["cat".into(), "dog".into()]),
            accuracy: Some(0.93),
        }),
    }
}

pub(crate) fn distribution(raw: serde_json::Value) -> VisualizationPayload {
    serde_json::from_value(serde_json::json!({ "class_distribution": raw }))
        .expect("visualization payload")
}

pub(crate) fn trigger_payload(task_id: &str) -> TrainingTriggerPayload {
    TrainingTriggerPayload {
        task_id: TaskId::parse(task_id).expect("task id"),
        message: Some("Retraining task initiated.".into()),
        status: Some("Processing".into()),
    }
}

pub(crate) fn image(name: &str) -> ImageFile {
    ImageFile::new(name, vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub(crate) fn network_failure() -> ServiceFailure {
    ServiceFailure::Network("connection refused".into())
}

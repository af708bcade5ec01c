//! Typed boundary over the classifier service's HTTP API.
//!
//! Every operation is a single attempt. Failures of any kind come back as a
//! [`ServiceFailure`]; nothing here retries or touches application state.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    error::ServiceErrorBody,
    protocol::{
        fields, routes, PredictionPayload, StatusPayload, TrainingTriggerPayload, UploadAck,
        VisualizationPayload,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{config::ClientSettings, error::ServiceFailure, media::ImageFile};

#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn fetch_status(&self) -> Result<StatusPayload, ServiceFailure>;
    async fn fetch_visualizations(&self) -> Result<VisualizationPayload, ServiceFailure>;
    async fn predict(&self, image: &ImageFile) -> Result<PredictionPayload, ServiceFailure>;
    async fn upload_dataset(
        &self,
        class_label: &str,
        images: &[ImageFile],
    ) -> Result<UploadAck, ServiceFailure>;
    async fn trigger_retrain(&self) -> Result<TrainingTriggerPayload, ServiceFailure>;
}

#[derive(Debug, Clone)]
pub struct HttpRemoteService {
    http: Client,
    base_url: Url,
}

impl HttpRemoteService {
    pub fn new(settings: &ClientSettings) -> Self {
        Self::with_client(Client::new(), settings.base_url.clone())
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url.as_str().trim_end_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, ServiceFailure> {
        debug!(route, "GET");
        let response = self.http.get(self.endpoint(route)).send().await?;
        read_json(response).await
    }
}

fn image_part(image: &ImageFile) -> Result<Part, ServiceFailure> {
    Part::bytes(image.bytes.clone())
        .file_name(image.filename.clone())
        .mime_str(image.mime_type().essence_str())
        .map_err(ServiceFailure::from_reqwest)
}

async fn ensure_success(response: Response) -> Result<Response, ServiceFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServiceErrorBody>(&body)
        .ok()
        .and_then(|body| body.message())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unexpected status".to_string());
    Err(ServiceFailure::Response {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceFailure> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ServiceFailure::MalformedPayload(err.to_string()))
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn fetch_status(&self) -> Result<StatusPayload, ServiceFailure> {
        self.get_json(routes::STATUS).await
    }

    async fn fetch_visualizations(&self) -> Result<VisualizationPayload, ServiceFailure> {
        self.get_json(routes::VISUALIZATIONS).await
    }

    async fn predict(&self, image: &ImageFile) -> Result<PredictionPayload, ServiceFailure> {
        debug!(
            route = routes::PREDICT,
            filename = %image.filename,
            bytes = image.bytes.len(),
            "POST"
        );
        let form = Form::new().part(fields::PREDICT_FILE, image_part(image)?);
        let response = self
            .http
            .post(self.endpoint(routes::PREDICT))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }

    async fn upload_dataset(
        &self,
        class_label: &str,
        images: &[ImageFile],
    ) -> Result<UploadAck, ServiceFailure> {
        debug!(
            route = routes::RETRAIN_UPLOAD,
            class_label,
            files = images.len(),
            "POST"
        );
        let mut form = Form::new().text(fields::UPLOAD_CLASS_NAME, class_label.to_string());
        for image in images {
            form = form.part(fields::UPLOAD_FILES, image_part(image)?);
        }
        let response = self
            .http
            .post(self.endpoint(routes::RETRAIN_UPLOAD))
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        // Only the status code matters; an unreadable body still counts as an ack.
        let ack: UploadAck = match response.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => UploadAck::default(),
        };
        if let Some(message) = &ack.message {
            info!(class_label, "dataset upload acknowledged: {message}");
        }
        Ok(ack)
    }

    async fn trigger_retrain(&self) -> Result<TrainingTriggerPayload, ServiceFailure> {
        debug!(route = routes::RETRAIN_TRIGGER, "POST");
        let response = self
            .http
            .post(self.endpoint(routes::RETRAIN_TRIGGER))
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;

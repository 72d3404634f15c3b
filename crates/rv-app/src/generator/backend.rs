mod schemas;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Response, StatusCode};
use rv_core::client::{ClientError, GenerationClient, SubmitPayload};
use rv_core::credentials::Credential;
use rv_core::job::GenerationJob;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::generator::backend::schemas::{ErrorEnvelope, Operation, PredictRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Veo over the Generative Language REST API
pub struct GenBackend {
    http: reqwest::Client,
    api_base: String,
    model: String,
}

impl GenBackend {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::BackendError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }

    fn submit_url(&self) -> String {
        format!("{}/models/{}:predictLongRunning", self.api_base, self.model)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.api_base, name.trim_start_matches('/'))
    }

    async fn read_operation(response: Response) -> Result<Operation, ClientError> {
        let response = api_error_for_status(response).await?;
        response
            .json::<Operation>()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse operation: {}", e)))
    }
}

#[async_trait]
impl GenerationClient for GenBackend {
    async fn submit(&self, payload: &SubmitPayload, credential: &Credential) -> Result<GenerationJob, ClientError> {
        let url = self.submit_url();
        info!("Submitting video job to {} ({}, {})", url, payload.aspect_ratio.id(), payload.resolution.id());

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, credential.expose())
            .json(&PredictRequest::from(payload))
            .send()
            .await
            .map_err(transport)?;

        let operation = Self::read_operation(response).await?;
        operation.into_job(None)
    }

    async fn poll(&self, job: &GenerationJob, credential: &Credential) -> Result<GenerationJob, ClientError> {
        let response = self
            .http
            .get(self.operation_url(&job.name))
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await
            .map_err(transport)?;

        let operation = Self::read_operation(response).await?;
        if operation.done && operation.video_uri().is_none() {
            for reason in operation.filtered_reasons() {
                info!("Video withheld by safety filter: {}", reason);
            }
        }

        operation.into_job(Some(job))
    }

    async fn fetch_asset(&self, uri: &str, credential: &Credential) -> Result<Vec<u8>, ClientError> {
        debug!("Downloading video from {}", uri);

        let response = self
            .http
            .get(uri)
            .query(&[("key", credential.expose())])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to read video: {}", e)))?;

        info!("Downloaded {} bytes of video", bytes.len());
        Ok(bytes.to_vec())
    }
}

fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.to_string())
}

/// Turn a non-success API response into the structured error it carries,
/// falling back to the bare status.
async fn api_error_for_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.into(),
        Err(_) => status_error(status, body),
    })
}

fn status_error(status: StatusCode, body: String) -> ClientError {
    ClientError::Status {
        code: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown status").to_string(),
        body,
    }
}

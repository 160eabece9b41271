//! Classification API Client
//!
//! HTTP client for the classification service. One request per cycle and
//! no retries: a failed call skips the cycle and the next cycle tries again.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::features::Batch;
use crate::verdict::Verdict;

/// Classification service configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

// Request/Response types

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub features: &'a Batch,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub intrusion: i64,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Anything that can turn a batch into a verdict
pub trait Classify {
    fn classify(&self, batch: &Batch) -> impl Future<Output = Result<Verdict, ClientError>>;
}

/// Classification API client
pub struct ClassifierClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ClassifierClient {
    /// Create new client
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self { config, http_client })
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict/", self.config.server_url)
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.config.server_url);

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if response.status().is_success() {
            response.json().await
                .map_err(|e| ClientError::Parse(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Status { status, body })
        }
    }
}

impl Classify for ClassifierClient {
    async fn classify(&self, batch: &Batch) -> Result<Verdict, ClientError> {
        let url = self.predict_url();

        log::debug!("Submitting {} feature rows to {}", batch.len(), url);

        let response = self.http_client
            .post(&url)
            .json(&PredictRequest { features: batch })
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status { status: status.as_u16(), body });
        }

        let parsed: PredictResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("{} (body: {})", e, body)))?;

        Verdict::from_flag(parsed.intrusion)
            .ok_or_else(|| ClientError::Parse(format!("unexpected intrusion flag {}", parsed.intrusion)))
    }
}

/// Client errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Transport(String),

    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    Parse(String),
}

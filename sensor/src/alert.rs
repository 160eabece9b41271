//! Alert Sinks
//!
//! Surface each cycle's verdict to the operator. A sink never fails the
//! pipeline: delivery problems are logged and dropped.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;

use crate::verdict::Verdict;

pub trait AlertSink {
    fn notify(&self, verdict: Verdict) -> impl Future<Output = ()>;
}

// ============================================================================
// LOG SINK
// ============================================================================

/// Writes every verdict to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AlertSink for LogSink {
    async fn notify(&self, verdict: Verdict) {
        match verdict {
            Verdict::Intrusion => log::warn!("🚨 {}", verdict.headline()),
            Verdict::Clean => log::info!("✅ {}", verdict.headline()),
        }
    }
}

// ============================================================================
// WEBHOOK SINK
// ============================================================================

/// Generic webhook body
#[derive(Debug, Clone, Serialize)]
pub struct AlertPayload {
    pub title: String,
    pub message: String,
    pub intrusion: u8,
    pub hostname: Option<String>,
    pub timestamp: String,
}

impl AlertPayload {
    pub fn for_verdict(verdict: Verdict) -> Self {
        let hostname = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string());

        Self {
            title: verdict.headline().to_string(),
            message: "Anomalous traffic observed in the latest capture window".to_string(),
            intrusion: u8::from(verdict.is_intrusion()),
            hostname,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// POSTs intrusion verdicts to a webhook; clean verdicts are not sent
pub struct WebhookSink {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { url, http_client })
    }

    async fn send(&self, payload: &AlertPayload) -> Result<(), String> {
        let response = self.http_client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("webhook responded {}", response.status()))
        }
    }
}

impl AlertSink for WebhookSink {
    async fn notify(&self, verdict: Verdict) {
        if !verdict.is_intrusion() {
            return;
        }

        let payload = AlertPayload::for_verdict(verdict);
        match self.send(&payload).await {
            Ok(()) => log::info!("Alert sent to webhook {}", self.url),
            Err(e) => log::error!("Failed to send alert to {}: {}", self.url, e),
        }
    }
}

// ============================================================================
// OPERATOR ALERTS
// ============================================================================

/// Log sink plus an optional webhook, delivered in that order
pub struct OperatorAlerts {
    log: LogSink,
    webhook: Option<WebhookSink>,
}

impl OperatorAlerts {
    pub fn new(webhook: Option<WebhookSink>) -> Self {
        Self { log: LogSink, webhook }
    }
}

impl AlertSink for OperatorAlerts {
    async fn notify(&self, verdict: Verdict) {
        self.log.notify(verdict).await;
        if let Some(webhook) = &self.webhook {
            webhook.notify(verdict).await;
        }
    }
}

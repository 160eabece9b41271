//! Packet Intrusion Watch - Capture Sensor
//!
//! Captures traffic in bounded windows, extracts per-packet features and
//! asks the classification service for a verdict on each window.
//!
//! ```text
//! capture ──▶ extract ──▶ batch ──▶ POST /predict/ ──▶ verdict ──▶ alert
//!    ▲                                                               │
//!    └──────────────────────── sleep ◀───────────────────────────────┘
//! ```

mod alert;
mod capture;
mod client;
mod config;
mod constants;
mod features;
mod monitor;
mod verdict;

use tokio::sync::watch;

use alert::{OperatorAlerts, WebhookSink};
use client::{ClassifierClient, ClientConfig};
use config::SensorConfig;
use monitor::{CycleSettings, Monitor};

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG can come from it
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = SensorConfig::from_env();

    log::info!("Starting {} sensor v{}...", constants::APP_NAME, constants::APP_VERSION);

    if let Err(e) = run(config).await {
        log::error!("Sensor failed to start: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: SensorConfig) -> anyhow::Result<()> {
    let source = capture::open_source(&config);
    log::info!("Capture source: {}", source.describe());

    let client = ClassifierClient::new(ClientConfig {
        server_url: config.classifier_url.clone(),
        request_timeout: config.request_timeout,
        connect_timeout: std::time::Duration::from_secs(constants::DEFAULT_CONNECT_TIMEOUT_SECS)
            .min(config.request_timeout),
    })?;

    log::info!("Classification service: {}", client.predict_url());
    match client.health_check().await {
        Ok(health) => log::info!("Classification service {}: v{}", health.status, health.version),
        Err(e) => log::warn!("Classification service not reachable yet: {}", e),
    }

    let webhook = match &config.alert_webhook_url {
        Some(url) => {
            log::info!("Intrusion alerts will also be sent to {}", url);
            Some(WebhookSink::new(url.clone(), config.request_timeout)?)
        }
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown signal received, finishing current cycle...");
            let _ = shutdown_tx.send(true);
        }
    });

    let monitor = Monitor::new(
        source,
        client,
        OperatorAlerts::new(webhook),
        CycleSettings {
            max_packets: config.max_packets,
            capture_timeout: config.capture_timeout,
            poll_interval: config.poll_interval,
        },
    );

    monitor.run(shutdown_rx).await;
    Ok(())
}

//! Packet Intrusion Watch - Classification Service
//!
//! Scores capture windows posted by sensors with a pre-trained model.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CLASSIFICATION SERVICE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Scaler   │  │  Classifier             │ │
//! │  │  (Axum)   │─▶│  (JSON)   │─▶│  (ONNX Runtime)         │ │
//! │  └─────┬─────┘  └───────────┘  └────────────┬────────────┘ │
//! │        │                                    │ OR over rows │
//! │        ▼                                    ▼              │
//! │  ┌───────────┐                      ┌──────────────┐       │
//! │  │  /ws      │◀─────────────────────│  verdict     │       │
//! │  │  stream   │      broadcast       │  {0 | 1}     │       │
//! │  └───────────┘                      └──────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod model;
mod models;
mod service;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::sync::{broadcast, watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::{CorsLayer, Any},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use models::PredictResponse;
use service::ClassificationService;

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG can come from it
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "intrusion_classifier=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env();

    if let Err(e) = run(config).await {
        tracing::error!("Classification service failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    tracing::info!("Classification service starting...");

    // Artifacts must be in place before the listener binds
    let (scaler, classifier) = model::load_artifacts(&config)?;
    let service = ClassificationService::new(scaler, classifier);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(service, config.verdict_channel_capacity, shutdown_rx);

    let app = create_router(state, Duration::from_secs(config.request_timeout_secs));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    tracing::info!("Classification service stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClassificationService>,
    pub verdicts: broadcast::Sender<PredictResponse>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(service: ClassificationService, capacity: usize, shutdown: watch::Receiver<bool>) -> Self {
        let (verdicts, _) = broadcast::channel(capacity.max(1));
        Self {
            service: Arc::new(service),
            verdicts,
            shutdown,
        }
    }
}

/// Create the router
fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict/", post(handlers::predict::predict))
        .route("/predict", post(handlers::predict::predict))
        .route("/ws", get(handlers::stream::ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(request_timeout))
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

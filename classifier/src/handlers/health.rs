//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model: String,
    feature_count: usize,
    predictions: u64,
    intrusions: u64,
    avg_latency_ms: f32,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.service.stats();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model: state.service.model_name().to_string(),
        feature_count: state.service.feature_count(),
        predictions: stats.predictions,
        intrusions: stats.intrusions,
        avg_latency_ms: state.service.avg_latency_ms(),
    })
}

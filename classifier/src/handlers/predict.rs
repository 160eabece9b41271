//! Prediction handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::{PredictRequest, PredictResponse};
use crate::{AppError, AppResult, AppState};

/// Classify one capture window
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let rows = req.features.len();
    let service = Arc::clone(&state.service);

    // Inference is CPU-bound; keep it off the async workers
    let verdict = tokio::task::spawn_blocking(move || service.handle(&req))
        .await
        .map_err(|e| AppError::Internal(format!("prediction task failed: {}", e)))??;

    let response = PredictResponse::from(verdict);
    tracing::info!("Classified {} rows: intrusion={}", rows, response.intrusion);

    // No subscribers is fine
    let _ = state.verdicts.send(response);

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::app_state;
    use crate::service::NO_FEATURES;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    fn state() -> AppState {
        app_state(16).0
    }

    fn app(state: AppState) -> Router {
        crate::create_router(state, std::time::Duration::from_secs(5))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_benign_window() {
        let (status, body) = post_json(app(state()), "/predict/", r#"{"features": [[64, 12.5, 64, 0, 20]]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "intrusion": 0 }));
    }

    #[tokio::test]
    async fn test_mixed_window_is_intrusion() {
        let (status, body) = post_json(
            app(state()),
            "/predict/",
            r#"{"features": [[64, 12.5, 64, 0, 20], [1500, 45.0, 255, 65535, 1400]]}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "intrusion": 1 }));
    }

    #[tokio::test]
    async fn test_empty_window_rejected() {
        let (status, body) = post_json(app(state()), "/predict/", r#"{"features": []}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], NO_FEATURES);
    }

    #[tokio::test]
    async fn test_route_without_trailing_slash() {
        let (status, _) = post_json(app(state()), "/predict", r#"{"features": [[64, 12.5, 64, 0, 20]]}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_client_error() {
        let (status, _) = post_json(app(state()), "/predict/", r#"{"features": "all of them"}"#).await;
        assert!(status.is_client_error());

        let (status, _) = post_json(app(state()), "/predict/", "{").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_verdicts_are_broadcast() {
        let state = state();
        let mut rx = state.verdicts.subscribe();

        post_json(app(state.clone()), "/predict/", r#"{"features": [[1500, 45.0, 255, 65535, 1400]]}"#).await;
        post_json(app(state.clone()), "/predict/", r#"{"features": []}"#).await;
        post_json(app(state), "/predict/", r#"{"features": [[64, 12.5, 64, 0, 20]]}"#).await;

        assert_eq!(rx.recv().await.unwrap(), PredictResponse { intrusion: 1 });
        assert_eq!(rx.recv().await.unwrap(), PredictResponse { intrusion: 0 });
    }

    #[tokio::test]
    async fn test_health_reports_counters() {
        let state = state();
        post_json(app(state.clone()), "/predict/", r#"{"features": [[1500, 45.0, 255, 65535, 1400]]}"#).await;

        let response = app(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["feature_count"], 5);
        assert_eq!(body["predictions"], 1);
        assert_eq!(body["intrusions"], 1);
    }
}

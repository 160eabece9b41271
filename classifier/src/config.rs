//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Trained classifier (ONNX)
    pub model_path: PathBuf,

    /// Fitted scaler parameters (JSON)
    pub scaler_path: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Buffered verdicts per stream subscriber
    pub verdict_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// `MODEL_PATH` / `SCALER_PATH` override the files under `MODEL_DIR`.
    pub fn from_env() -> Self {
        let model_dir = PathBuf::from(env::var("MODEL_DIR").unwrap_or_else(|_| "model".to_string()));

        Self {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| model_dir.join("intrusion_model.onnx")),

            scaler_path: env::var("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| model_dir.join("scaler.json")),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s| *s > 0)
                .unwrap_or(30),

            verdict_channel_capacity: env::var("VERDICT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(64),
        }
    }
}

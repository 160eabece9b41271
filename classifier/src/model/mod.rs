//! Model Module - scaling transform and classifier
//!
//! Both artifacts are loaded once, before the listener binds, and are
//! read-only afterwards. A missing or unreadable artifact is fatal.

pub mod onnx;
pub mod scaler;

pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;

use std::sync::Arc;

use ndarray::ArrayView2;

use crate::config::Config;
use crate::error::StartupError;

// ============================================================================
// TRAITS
// ============================================================================

/// Pre-fitted, deterministic feature normalization
pub trait Scaler: Send + Sync {
    /// Number of features per row the transform was fitted on
    fn dimension(&self) -> usize;

    /// Scale one row; `row.len()` must equal `dimension()`
    fn transform(&self, row: &[f64]) -> Vec<f32>;
}

/// Pre-fitted binary classifier over scaled rows
pub trait Classifier: Send + Sync {
    /// One label per row, `true` = anomalous
    fn predict(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<bool>, InferenceError>;

    fn name(&self) -> &str;

    /// Average inference latency in milliseconds
    fn avg_latency_ms(&self) -> f32 {
        0.0
    }
}

#[derive(Debug, thiserror::Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

// ============================================================================
// LOADING
// ============================================================================

/// Load the scaler and classifier from their configured locations
pub fn load_artifacts(config: &Config) -> Result<(Arc<dyn Scaler>, Arc<dyn Classifier>), StartupError> {
    let scaler = StandardScaler::load(&config.scaler_path)?;
    tracing::info!(
        "Scaler loaded from {} ({} features)",
        config.scaler_path.display(),
        scaler.dimension()
    );

    let classifier = OnnxClassifier::load(&config.model_path)?;
    tracing::info!("Classifier loaded from {}", config.model_path.display());

    Ok((Arc::new(scaler), Arc::new(classifier)))
}

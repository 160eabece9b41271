//! Inference Engine - ONNX Runtime Integration
//!
//! The classifier is exported to ONNX with a single `[n, features]` f32
//! input. The first output is read as integer labels; models that emit a
//! score instead are thresholded at 0.5.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::ArrayView2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::{Classifier, InferenceError};
use crate::error::StartupError;

const SCORE_THRESHOLD: f32 = 0.5;

pub struct OnnxClassifier {
    // `Session::run` needs `&mut`; the lock only serializes runs, the model never changes
    session: Mutex<Session>,
    output_name: String,
    name: String,
    latency_sum_us: AtomicU64,
    inference_count: AtomicU64,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path) -> Result<Self, StartupError> {
        tracing::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(StartupError::MissingArtifact { kind: "Model", path: model_path.to_path_buf() });
        }

        let failed = |reason: String| StartupError::ModelLoad { path: PathBuf::from(model_path), reason };

        let session = Session::builder()
            .map_err(|e| failed(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| failed(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| failed(format!("Failed to load model: {}", e)))?;

        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| failed("No output defined".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            name: model_path.display().to_string(),
            latency_sum_us: AtomicU64::new(0),
            inference_count: AtomicU64::new(0),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<bool>, InferenceError> {
        let start_time = std::time::Instant::now();

        let input_tensor = Value::from_array(rows.to_owned())
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();

        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| InferenceError("No output".to_string()))?;

        let labels: Vec<bool> = match output.try_extract_tensor::<i64>() {
            Ok((_, data)) => data.iter().map(|label| *label > 0).collect(),
            Err(_) => {
                let (_, data) = output.try_extract_tensor::<f32>()
                    .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;
                data.iter().map(|score| *score >= SCORE_THRESHOLD).collect()
            }
        };

        self.latency_sum_us.fetch_add(start_time.elapsed().as_micros() as u64, Ordering::Relaxed);
        self.inference_count.fetch_add(1, Ordering::Relaxed);

        Ok(labels)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.inference_count.load(Ordering::Relaxed);
        if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let err = OnnxClassifier::load(Path::new("/nonexistent/intrusion_model.onnx")).err().unwrap();
        assert!(matches!(err, StartupError::MissingArtifact { kind: "Model", .. }));
    }
}

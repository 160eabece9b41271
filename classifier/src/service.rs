//! Classification Service
//!
//! validate → scale → predict per row → OR-aggregate to one verdict.
//!
//! The verdict has batch granularity: one anomalous row flags the whole
//! window, and which row triggered it is not reported.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use crate::error::{AppError, AppResult};
use crate::model::{Classifier, Scaler};
use crate::models::{PredictRequest, Verdict};

pub const NO_FEATURES: &str = "Invalid input: No features provided.";

pub struct ClassificationService {
    scaler: Arc<dyn Scaler>,
    classifier: Arc<dyn Classifier>,
    predictions: AtomicU64,
    intrusions: AtomicU64,
}

/// Served request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub predictions: u64,
    pub intrusions: u64,
}

impl ClassificationService {
    pub fn new(scaler: Arc<dyn Scaler>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            scaler,
            classifier,
            predictions: AtomicU64::new(0),
            intrusions: AtomicU64::new(0),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.scaler.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn avg_latency_ms(&self) -> f32 {
        self.classifier.avg_latency_ms()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            predictions: self.predictions.load(Ordering::Relaxed),
            intrusions: self.intrusions.load(Ordering::Relaxed),
        }
    }

    /// Classify one batch
    pub fn handle(&self, request: &PredictRequest) -> AppResult<Verdict> {
        let width = self.scaler.dimension();
        validate(&request.features, width)?;

        let rows = request.features.len();
        let mut scaled = Vec::with_capacity(rows * width);
        for row in &request.features {
            scaled.extend(self.scaler.transform(row));
        }
        let scaled = Array2::from_shape_vec((rows, width), scaled)
            .map_err(|e| AppError::Internal(format!("Array error: {}", e)))?;

        let labels = self.classifier.predict(scaled.view())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if labels.len() != rows {
            return Err(AppError::Internal(format!(
                "classifier returned {} labels for {} rows",
                labels.len(),
                rows
            )));
        }

        let verdict = Verdict::from_labels(&labels);

        self.predictions.fetch_add(1, Ordering::Relaxed);
        if verdict == Verdict::Intrusion {
            self.intrusions.fetch_add(1, Ordering::Relaxed);
        }

        Ok(verdict)
    }
}

/// Reject batches that carry no features, or rows the scaler cannot take
pub fn validate(features: &[Vec<f64>], width: usize) -> AppResult<()> {
    if features.iter().all(|row| row.is_empty()) {
        return Err(AppError::Validation(NO_FEATURES.to_string()));
    }

    if let Some((index, row)) = features.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(AppError::Validation(format!(
            "Invalid input: row {} has {} features, expected {}.",
            index,
            row.len(),
            width
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{InferenceError, StandardScaler};
    use ndarray::ArrayView2;
    use std::sync::atomic::AtomicUsize;

    /// Flags a row when any scaled feature is more than 2 deviations out
    #[derive(Default)]
    pub(crate) struct DeviationClassifier {
        pub calls: AtomicUsize,
    }

    impl Classifier for DeviationClassifier {
        fn predict(&self, rows: ArrayView2<'_, f32>) -> Result<Vec<bool>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(rows.rows().into_iter().map(|row| row.iter().any(|v| *v > 2.0)).collect())
        }

        fn name(&self) -> &str {
            "deviation"
        }
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn predict(&self, _rows: ArrayView2<'_, f32>) -> Result<Vec<bool>, InferenceError> {
            Err(InferenceError("session poisoned".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    pub(crate) fn traffic_scaler() -> StandardScaler {
        StandardScaler::new(
            vec![500.0, 30.0, 128.0, 16384.0, 300.0],
            vec![400.0, 17.0, 64.0, 16000.0, 400.0],
        )
        .unwrap()
    }

    fn service_with(classifier: Arc<DeviationClassifier>) -> ClassificationService {
        ClassificationService::new(Arc::new(traffic_scaler()), classifier)
    }

    fn request(rows: Vec<Vec<f64>>) -> PredictRequest {
        PredictRequest { features: rows }
    }

    const BENIGN: [f64; 5] = [64.0, 12.5, 64.0, 0.0, 20.0];
    const HOSTILE: [f64; 5] = [1500.0, 45.0, 255.0, 65535.0, 1400.0];

    #[test]
    fn test_single_benign_row_is_clean() {
        let service = service_with(Arc::default());
        let verdict = service.handle(&request(vec![BENIGN.to_vec()])).unwrap();
        assert_eq!(verdict, Verdict::Clean);
    }

    #[test]
    fn test_one_positive_row_flags_batch() {
        let service = service_with(Arc::default());
        let verdict = service.handle(&request(vec![BENIGN.to_vec(), HOSTILE.to_vec()])).unwrap();
        assert_eq!(verdict, Verdict::Intrusion);
        assert_eq!(service.stats(), ServiceStats { predictions: 1, intrusions: 1 });
    }

    #[test]
    fn test_empty_batch_rejected_without_prediction() {
        let classifier = Arc::new(DeviationClassifier::default());
        let service = service_with(classifier.clone());

        let err = service.handle(&request(vec![])).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == NO_FEATURES));

        let err = service.handle(&request(vec![vec![], vec![]])).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == NO_FEATURES));

        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.stats(), ServiceStats::default());
    }

    #[test]
    fn test_wrong_width_rejected() {
        let service = service_with(Arc::default());

        let err = service.handle(&request(vec![vec![1.0, 2.0, 3.0]])).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("expected 5")));

        let err = service.handle(&request(vec![BENIGN.to_vec(), vec![]])).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("row 1")));
    }

    #[test]
    fn test_same_batch_same_verdict() {
        let service = service_with(Arc::default());
        let batch = request(vec![BENIGN.to_vec(), HOSTILE.to_vec(), BENIGN.to_vec()]);

        let first = service.handle(&batch).unwrap();
        let second = service.handle(&batch).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_all_negative_rows_are_clean() {
        let service = service_with(Arc::default());
        let rows = (0..20).map(|i| vec![60.0 + i as f64, i as f64, 64.0, 1024.0, 0.0]).collect();
        assert_eq!(service.handle(&request(rows)).unwrap(), Verdict::Clean);
    }

    #[test]
    fn test_inference_failure_is_internal() {
        let service = ClassificationService::new(Arc::new(traffic_scaler()), Arc::new(BrokenClassifier));
        let err = service.handle(&request(vec![BENIGN.to_vec()])).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}

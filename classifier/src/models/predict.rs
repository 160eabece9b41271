//! Prediction request/response model

use serde::{Deserialize, Serialize};

/// `POST /predict/` body: one feature row per packet
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<Vec<f64>>,
}

/// `{"intrusion": 0|1}`, also broadcast on the verdict stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub intrusion: u8,
}

/// Batch-level outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Intrusion,
}

impl Verdict {
    /// Intrusion if any row was labelled positive
    pub fn from_labels(labels: &[bool]) -> Self {
        if labels.iter().any(|positive| *positive) {
            Verdict::Intrusion
        } else {
            Verdict::Clean
        }
    }
}

impl From<Verdict> for PredictResponse {
    fn from(verdict: Verdict) -> Self {
        PredictResponse {
            intrusion: match verdict {
                Verdict::Clean => 0,
                Verdict::Intrusion => 1,
            },
        }
    }
}

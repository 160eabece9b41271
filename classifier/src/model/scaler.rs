//! Standard scaler
//!
//! Fitted parameters are stored as JSON: `{"mean": [...], "scale": [...]}`.
//! Extra keys such as `var` are ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::Scaler;
use crate::error::StartupError;

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, String> {
        let scaler = Self { mean, scale };
        scaler.check()?;
        Ok(scaler)
    }

    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            return Err(StartupError::MissingArtifact { kind: "Scaler", path: path.to_path_buf() });
        }

        let invalid = |reason: String| StartupError::InvalidScaler { path: path.to_path_buf(), reason };

        let json_str = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let parsed: StandardScaler = serde_json::from_str(&json_str).map_err(|e| invalid(e.to_string()))?;
        Self::new(parsed.mean, parsed.scale).map_err(invalid)
    }

    fn check(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no features".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("non-finite parameter".to_string());
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / scale`; a zero scale (constant feature) divides by 1
    fn transform(&self, row: &[f64]) -> Vec<f32> {
        row.iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((&x, &m), &s)| {
                let s = if s == 0.0 { 1.0 } else { s };
                ((x - m) / s) as f32
            })
            .collect()
    }
}

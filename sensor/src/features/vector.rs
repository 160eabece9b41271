//! Feature Vector - the classifier's input row
//!
//! **The layout is fixed.** The classification service's scaler and model
//! were fitted on exactly these columns in exactly this order; changing
//! either breaks every deployed model.

use serde::{Serialize, Serializer};

/// Total number of features
pub const FEATURE_COUNT: usize = 5;

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// One packet's features
///
/// Serializes as a plain 5-element JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    /// Total on-wire length in bytes
    pub size: f64,
    /// Capture time (epoch seconds) modulo 60
    pub timestamp_mod_60: f64,
    /// IPv4 TTL / IPv6 hop limit, 0 if absent
    pub ttl: f64,
    /// TCP window size, 0 if absent
    pub window: f64,
    /// TCP/UDP payload length, 0 if absent
    pub payload_len: f64,
}

impl FeatureVector {
    /// Values in wire order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [self.size, self.timestamp_mod_60, self.ttl, self.window, self.payload_len]
    }

    #[cfg(test)]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [size, timestamp_mod_60, ttl, window, payload_len] = values;
        Self { size, timestamp_mod_60, ttl, window, payload_len }
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_array() {
        let fv = FeatureVector::from_array([64.0, 12.5, 64.0, 0.0, 20.0]);
        let json = serde_json::to_string(&fv).unwrap();
        assert_eq!(json, "[64.0,12.5,64.0,0.0,20.0]");
    }
}

//! Configuration module

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{self, env_parse, env_string};

/// Sensor configuration
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Classification service base URL
    pub classifier_url: String,

    /// Live capture device (library default when unset)
    pub interface: Option<String>,

    /// Replay this pcap file instead of capturing live
    pub capture_file: Option<PathBuf>,

    /// Optional BPF filter expression
    pub capture_filter: Option<String>,

    /// Maximum packets per cycle
    pub max_packets: usize,

    /// Capture window length
    pub capture_timeout: Duration,

    /// Sleep between cycles
    pub poll_interval: Duration,

    /// Classification request timeout
    pub request_timeout: Duration,

    /// Webhook that receives intrusion alerts
    pub alert_webhook_url: Option<String>,
}

impl SensorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            classifier_url: env_string("CLASSIFIER_URL")
                .unwrap_or_else(|| constants::DEFAULT_CLASSIFIER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),

            interface: env_string("CAPTURE_INTERFACE"),

            capture_file: env_string("CAPTURE_FILE").map(PathBuf::from),

            capture_filter: env_string("CAPTURE_FILTER"),

            max_packets: env_parse("CAPTURE_MAX_PACKETS", constants::DEFAULT_CAPTURE_MAX_PACKETS)
                .max(1),

            capture_timeout: Duration::from_secs(
                env_parse("CAPTURE_TIMEOUT_SECS", constants::DEFAULT_CAPTURE_TIMEOUT_SECS),
            ),

            poll_interval: Duration::from_secs(
                env_parse("POLL_INTERVAL_SECS", constants::DEFAULT_POLL_INTERVAL_SECS),
            ),

            request_timeout: Duration::from_secs(
                env_parse("REQUEST_TIMEOUT_SECS", constants::DEFAULT_REQUEST_TIMEOUT_SECS).max(1),
            ),

            alert_webhook_url: env_string("ALERT_WEBHOOK_URL"),
        }
    }
}

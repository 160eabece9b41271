//! Central Configuration Constants
//!
//! Single source of truth for all sensor defaults.
//! Every value can be overridden from the environment (see `config.rs`).

/// Default classification service base URL
///
/// The client posts batches to `<url>/predict/` and checks `<url>/health`.
pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8000";

/// Default number of packets captured per cycle
pub const DEFAULT_CAPTURE_MAX_PACKETS: usize = 10;

/// Default capture window (seconds)
pub const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 5;

/// Default sleep between cycles (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default HTTP request timeout for the classification call (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Connect timeout is kept well under the request timeout
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Per-read pcap timeout (ms); bounds how late the capture deadline is noticed
pub const CAPTURE_POLL_MS: i32 = 100;

/// Snapshot length for live capture
pub const CAPTURE_SNAPLEN: i32 = 65535;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Packet Intrusion Watch";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read a string variable, treating empty values as unset
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read and parse a variable, falling back to `default` when unset or invalid
pub fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring invalid value for {}: {:?}", key, raw);
                default
            }
        },
        None => default,
    }
}

//! Capture Module - Packet Sources
//!
//! A packet source hands the monitor one bounded window of raw frames per
//! cycle. The window ends at `max_count` packets or after `timeout`,
//! whichever comes first. Capture problems never stop the sensor; they
//! come back as the window's error and the next cycle tries again.
//!
//! Sources:
//! - `LiveCapture`: a network device through libpcap
//! - `PcapFileSource`: replay of a saved capture

pub mod file;
pub mod live;

pub use file::PcapFileSource;
pub use live::LiveCapture;

use std::time::{Duration, Instant};

use crate::config::SensorConfig;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Link layer of a captured frame, from the capture's datalink type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    RawIp,
    LinuxSll,
    Other(i32),
}

impl LinkLayer {
    pub fn from_linktype(linktype: pcap::Linktype) -> Self {
        match linktype.0 {
            1 => LinkLayer::Ethernet,
            // LINKTYPE_RAW plus the platform DLT_RAW values, then IPv4/IPv6
            12 | 14 | 101 | 228 | 229 => LinkLayer::RawIp,
            113 => LinkLayer::LinuxSll,
            other => LinkLayer::Other(other),
        }
    }
}

/// One captured frame, owned for the duration of a single cycle
#[derive(Debug, Clone)]
pub struct RawPacket {
    /// Captured bytes (may be shorter than `wire_len`)
    pub data: Vec<u8>,
    /// Original length on the wire
    pub wire_len: u32,
    /// Capture time, seconds since the Unix epoch
    pub timestamp: f64,
    pub link: LinkLayer,
}

impl RawPacket {
    fn from_pcap(packet: &pcap::Packet<'_>, link: LinkLayer) -> Self {
        let ts = packet.header.ts;
        Self {
            data: packet.data.to_vec(),
            wire_len: packet.header.len,
            timestamp: ts.tv_sec as f64 + ts.tv_usec as f64 / 1_000_000.0,
            link,
        }
    }
}

/// Result of one capture window
///
/// A window that hit an error still carries the packets captured before it.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    pub packets: Vec<RawPacket>,
    pub error: Option<CaptureError>,
}

impl CaptureOutcome {
    #[cfg(test)]
    pub fn packets(packets: Vec<RawPacket>) -> Self {
        Self { packets, error: None }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to open capture on {target}: {reason}")]
    Open { target: String, reason: String },

    #[error("invalid capture filter {filter:?}: {reason}")]
    Filter { filter: String, reason: String },

    #[error("no capture device available")]
    NoDevice,

    #[error("capture read failed: {0}")]
    Read(String),
}

// ============================================================================
// PACKET SOURCE TRAIT
// ============================================================================

/// A restartable, blocking source of packet windows
pub trait PacketSource: Send {
    /// Capture up to `max_count` packets, for at most `timeout`
    fn capture(&mut self, max_count: usize, timeout: Duration) -> CaptureOutcome;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

impl<S: PacketSource + ?Sized> PacketSource for Box<S> {
    fn capture(&mut self, max_count: usize, timeout: Duration) -> CaptureOutcome {
        (**self).capture(max_count, timeout)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the source selected by configuration
///
/// A replay file takes precedence over a live device. Neither is opened
/// here: a source that cannot be opened reports it as the window's error
/// and tries again on the next cycle.
pub fn open_source(config: &SensorConfig) -> Box<dyn PacketSource> {
    match &config.capture_file {
        Some(path) => Box::new(PcapFileSource::new(path, config.capture_filter.as_deref())),
        None => Box::new(LiveCapture::new(
            config.interface.as_deref(),
            config.capture_filter.as_deref(),
        )),
    }
}

// ============================================================================
// REOPENING HANDLE
// ============================================================================

/// A capture handle that is opened on demand and discarded after a read failure
///
/// A handle that failed a read (interface went down, device removed) is
/// never read again; the next window opens a fresh one.
pub(crate) struct Reopening<H> {
    handle: Option<H>,
}

impl<H> Reopening<H> {
    pub(crate) fn new() -> Self {
        Self { handle: None }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Run one window on the handle, opening it first if needed
    pub(crate) fn window<O, D>(&mut self, open: O, drain: D) -> CaptureOutcome
    where
        O: FnOnce() -> Result<H, CaptureError>,
        D: FnOnce(&mut H) -> CaptureOutcome,
    {
        if self.handle.is_none() {
            match open() {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => return CaptureOutcome { packets: Vec::new(), error: Some(e) },
            }
        }

        let Some(handle) = self.handle.as_mut() else {
            return CaptureOutcome::default();
        };

        let outcome = drain(handle);
        if matches!(outcome.error, Some(CaptureError::Read(_))) {
            self.handle = None;
        }
        outcome
    }
}

// ============================================================================
// WINDOW DRAIN
// ============================================================================

/// Read packets from an activated capture until the window closes
///
/// `NoMorePackets` ends the window quietly (end of a replay file);
/// `TimeoutExpired` only means the per-read timeout elapsed. Packets stamped
/// before `not_before` were buffered while the sensor slept and are dropped
/// without counting toward `max_count`.
pub(crate) fn drain_window<T: pcap::Activated + ?Sized>(
    cap: &mut pcap::Capture<T>,
    link: LinkLayer,
    max_count: usize,
    timeout: Duration,
    not_before: Option<f64>,
) -> (CaptureOutcome, bool) {
    let deadline = Instant::now() + timeout;
    let mut outcome = CaptureOutcome::default();
    let mut exhausted = false;
    let mut stale = 0usize;

    while outcome.packets.len() < max_count && Instant::now() < deadline {
        match cap.next_packet() {
            Ok(packet) => {
                let raw = RawPacket::from_pcap(&packet, link);
                if not_before.is_some_and(|start| raw.timestamp < start) {
                    stale += 1;
                    continue;
                }
                outcome.packets.push(raw);
            }
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => {
                exhausted = true;
                break;
            }
            Err(e) => {
                outcome.error = Some(CaptureError::Read(e.to_string()));
                break;
            }
        }
    }

    if stale > 0 {
        log::debug!("Dropped {} packets buffered before the window opened", stale);
    }

    (outcome, exhausted)
}

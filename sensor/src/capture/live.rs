//! Live Packet Capture
//!
//! Captures frames from a network device through libpcap. The device is
//! opened lazily and reopened after a failed read, so an interface that
//! bounces or appears late is picked up on a later cycle.

use std::time::Duration;

use pcap::{Active, Capture, Device};

use super::{drain_window, CaptureError, CaptureOutcome, LinkLayer, PacketSource, Reopening};
use crate::constants::{CAPTURE_POLL_MS, CAPTURE_SNAPLEN};

struct OpenDevice {
    cap: Capture<Active>,
    link: LinkLayer,
}

/// Live capture on one device
pub struct LiveCapture {
    interface: Option<String>,
    filter: Option<String>,
    handle: Reopening<OpenDevice>,
}

impl LiveCapture {
    /// Capture on `interface`, or the library's default device when `None`
    ///
    /// An open failure here is only logged; every window retries it.
    pub fn new(interface: Option<&str>, filter: Option<&str>) -> Self {
        let mut live = Self {
            interface: interface.map(str::to_string),
            filter: filter.map(str::to_string),
            handle: Reopening::new(),
        };

        let first = live.handle.window(
            || open_device(interface, filter),
            |_| CaptureOutcome::default(),
        );
        if let Some(e) = first.error {
            log::warn!("⚠ {} (retrying every cycle)", e);
        }

        live
    }
}

fn open_device(interface: Option<&str>, filter: Option<&str>) -> Result<OpenDevice, CaptureError> {
    let device = match interface {
        Some(name) => Device::from(name),
        None => Device::lookup()
            .map_err(|e| CaptureError::Open { target: "default device".to_string(), reason: e.to_string() })?
            .ok_or(CaptureError::NoDevice)?,
    };
    let name = device.name.clone();

    let mut cap = Capture::from_device(device)
        .map_err(|e| CaptureError::Open { target: name.clone(), reason: e.to_string() })?
        .promisc(true)
        .snaplen(CAPTURE_SNAPLEN)
        .timeout(CAPTURE_POLL_MS)
        .immediate_mode(true)
        .open()
        .map_err(|e| CaptureError::Open { target: name.clone(), reason: e.to_string() })?;

    if let Some(expr) = filter {
        cap.filter(expr, true)
            .map_err(|e| CaptureError::Filter { filter: expr.to_string(), reason: e.to_string() })?;
    }

    let link = LinkLayer::from_linktype(cap.get_datalink());
    log::info!("Live capture opened on {} ({:?})", name, link);

    Ok(OpenDevice { cap, link })
}

impl PacketSource for LiveCapture {
    fn capture(&mut self, max_count: usize, timeout: Duration) -> CaptureOutcome {
        let interface = self.interface.as_deref();
        let filter = self.filter.as_deref();
        let window_start = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        self.handle.window(
            || open_device(interface, filter),
            |device| {
                let (outcome, _) = drain_window(
                    &mut device.cap,
                    device.link,
                    max_count,
                    timeout,
                    Some(window_start),
                );
                outcome
            },
        )
    }

    fn describe(&self) -> String {
        match &self.interface {
            Some(name) => format!("device {}", name),
            None => "default device".to_string(),
        }
    }
}

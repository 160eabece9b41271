//! Packet Feature Extraction
//!
//! `extract` never panics on malformed frames. Fields a frame simply does
//! not have (no IP layer, no TCP header) default to 0; a frame that cannot
//! be decoded at all is dropped with a warning.

use etherparse::{NetSlice, SlicedPacket, TransportSlice};

use super::vector::FeatureVector;
use crate::capture::{LinkLayer, RawPacket};

#[derive(Debug, thiserror::Error)]
enum ExtractError {
    #[error("empty frame")]
    Empty,

    #[error("unusable capture timestamp {0}")]
    Timestamp(f64),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Map one captured frame to its feature vector
///
/// Returns `None` (and logs a warning) when the frame is unusable.
pub fn extract(packet: &RawPacket) -> Option<FeatureVector> {
    match try_extract(packet) {
        Ok(fv) => Some(fv),
        Err(e) => {
            log::warn!("Skipping packet ({} bytes): {}", packet.wire_len, e);
            None
        }
    }
}

fn try_extract(packet: &RawPacket) -> Result<FeatureVector, ExtractError> {
    if packet.wire_len == 0 || packet.data.is_empty() {
        return Err(ExtractError::Empty);
    }
    if !packet.timestamp.is_finite() || packet.timestamp < 0.0 {
        return Err(ExtractError::Timestamp(packet.timestamp));
    }

    let mut fv = FeatureVector {
        size: packet.wire_len as f64,
        timestamp_mod_60: packet.timestamp % 60.0,
        ..Default::default()
    };

    let decoded = match packet.link {
        LinkLayer::Ethernet => SlicedPacket::from_ethernet(&packet.data).map_err(|e| e.to_string()),
        LinkLayer::RawIp => SlicedPacket::from_ip(&packet.data).map_err(|e| e.to_string()),
        LinkLayer::LinuxSll => SlicedPacket::from_linux_sll(&packet.data).map_err(|e| e.to_string()),
        // Nothing to decode: optional fields stay 0
        LinkLayer::Other(linktype) => {
            log::trace!("No decoder for link type {}, keeping metadata only", linktype);
            return Ok(fv);
        }
    };
    let sliced = decoded.map_err(ExtractError::Decode)?;

    fv.ttl = match &sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => ipv4.header().ttl() as f64,
        Some(NetSlice::Ipv6(ipv6)) => ipv6.header().hop_limit() as f64,
        _ => 0.0,
    };

    let (window, payload_len) = match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => (tcp.window_size() as f64, tcp.payload().len() as f64),
        Some(TransportSlice::Udp(udp)) => (0.0, udp.payload().len() as f64),
        _ => (0.0, 0.0),
    };
    fv.window = window;
    fv.payload_len = payload_len;

    Ok(fv)
}

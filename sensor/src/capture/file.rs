//! PCAP File Replay
//!
//! Replays a saved capture in cycle-sized windows. Once the file is
//! exhausted every later window is empty.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pcap::{Capture, Offline};

use super::{drain_window, CaptureError, CaptureOutcome, LinkLayer, PacketSource};

struct OpenFile {
    cap: Capture<Offline>,
    link: LinkLayer,
}

pub struct PcapFileSource {
    path: PathBuf,
    filter: Option<String>,
    file: Option<OpenFile>,
    exhausted: bool,
}

impl PcapFileSource {
    /// Replay `path`; the file is opened on the first window
    pub fn new(path: &Path, filter: Option<&str>) -> Self {
        Self {
            path: path.to_path_buf(),
            filter: filter.map(str::to_string),
            file: None,
            exhausted: false,
        }
    }

    fn open(&self) -> Result<OpenFile, CaptureError> {
        let target = self.path.display().to_string();

        let mut cap = Capture::from_file(&self.path)
            .map_err(|e| CaptureError::Open { target: target.clone(), reason: e.to_string() })?;

        if let Some(expr) = &self.filter {
            cap.filter(expr, true)
                .map_err(|e| CaptureError::Filter { filter: expr.clone(), reason: e.to_string() })?;
        }

        let link = LinkLayer::from_linktype(cap.get_datalink());
        log::info!("Replaying capture file {} ({:?})", target, link);

        Ok(OpenFile { cap, link })
    }
}

impl PacketSource for PcapFileSource {
    fn capture(&mut self, max_count: usize, timeout: Duration) -> CaptureOutcome {
        if self.exhausted {
            return CaptureOutcome::default();
        }

        if self.file.is_none() {
            match self.open() {
                Ok(file) => self.file = Some(file),
                Err(e) => return CaptureOutcome { packets: Vec::new(), error: Some(e) },
            }
        }
        let Some(file) = self.file.as_mut() else {
            return CaptureOutcome::default();
        };

        let (outcome, exhausted) = drain_window(&mut file.cap, file.link, max_count, timeout, None);

        // Reopening would replay from the start, so a failed read ends the replay too
        if exhausted || outcome.error.is_some() {
            log::info!("Capture file {} exhausted", self.path.display());
            self.exhausted = true;
            self.file = None;
        }
        outcome
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

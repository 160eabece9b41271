//! Monitor Loop
//!
//! capture → extract → batch → classify → alert → sleep, one cycle at a
//! time. Cycle N's alert is always emitted before cycle N+1 starts
//! capturing.
//!
//! Shutdown is checked after capture, after classification and during the
//! sleep. A capture or HTTP call already in flight runs to completion (or
//! its own timeout); it is never aborted.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::alert::AlertSink;
use crate::capture::{CaptureOutcome, PacketSource};
use crate::client::Classify;
use crate::features::{self, Batch};
use crate::verdict::Verdict;

/// Window and pacing for the loop
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub max_packets: usize,
    pub capture_timeout: Duration,
    pub poll_interval: Duration,
}

/// What happened in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing usable was captured; no request was made
    NoPackets,
    /// The service answered and the verdict was alerted
    Classified(Verdict),
    /// The classification call failed; nothing was alerted
    Skipped,
    /// Shutdown was requested before the batch was submitted
    Interrupted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub cycles: u64,
    pub verdicts: u64,
    pub intrusions: u64,
    pub skipped: u64,
    pub empty: u64,
}

impl MonitorStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        match outcome {
            CycleOutcome::NoPackets => self.empty += 1,
            CycleOutcome::Classified(verdict) => {
                self.verdicts += 1;
                if verdict.is_intrusion() {
                    self.intrusions += 1;
                }
            }
            CycleOutcome::Skipped => self.skipped += 1,
            CycleOutcome::Interrupted => {}
        }
    }
}

pub struct Monitor<S, C, A> {
    source: Arc<Mutex<S>>,
    classifier: C,
    sink: A,
    settings: CycleSettings,
}

impl<S, C, A> Monitor<S, C, A>
where
    S: PacketSource + 'static,
    C: Classify,
    A: AlertSink,
{
    pub fn new(source: S, classifier: C, sink: A, settings: CycleSettings) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            classifier,
            sink,
            settings,
        }
    }

    /// Run cycles until `shutdown` flips to `true`
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> MonitorStats {
        let mut stats = MonitorStats::default();
        log::info!(
            "⏳ Monitoring network traffic ({} packets / {:?} per window)...",
            self.settings.max_packets,
            self.settings.capture_timeout
        );

        while !*shutdown.borrow() {
            let outcome = self.run_cycle(&shutdown).await;
            stats.record(&outcome);

            if outcome == CycleOutcome::Interrupted || *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    // A dropped sender can never request shutdown; keep sleeping
                    if changed.is_err() {
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                }
            }
        }

        log::info!(
            "Monitor stopped after {} cycles ({} verdicts, {} intrusions, {} skipped)",
            stats.cycles,
            stats.verdicts,
            stats.intrusions,
            stats.skipped
        );
        stats
    }

    /// One capture → alert cycle
    pub async fn run_cycle(&self, shutdown: &watch::Receiver<bool>) -> CycleOutcome {
        let outcome = self.capture().await;

        if let Some(e) = &outcome.error {
            log::warn!("⚠ Capture error: {} (continuing with {} packets)", e, outcome.packets.len());
        }

        if *shutdown.borrow() {
            log::info!("Shutdown requested, dropping {} captured packets", outcome.packets.len());
            return CycleOutcome::Interrupted;
        }

        let Some(batch) = Batch::from_extracted(outcome.packets.iter().map(features::extract)) else {
            log::warn!("⚠ No valid packets captured, skipping API call.");
            return CycleOutcome::NoPackets;
        };

        match self.classifier.classify(&batch).await {
            Ok(verdict) => {
                log::debug!("Batch of {} rows classified: {:?}", batch.len(), verdict);
                self.sink.notify(verdict).await;
                CycleOutcome::Classified(verdict)
            }
            Err(e) => {
                log::warn!("⚠ {}", e);
                CycleOutcome::Skipped
            }
        }
    }

    /// Run the blocking capture off the async workers
    async fn capture(&self) -> CaptureOutcome {
        let source = Arc::clone(&self.source);
        let max_packets = self.settings.max_packets;
        let timeout = self.settings.capture_timeout;

        match tokio::task::spawn_blocking(move || source.lock().capture(max_packets, timeout)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Capture task failed: {}", e);
                CaptureOutcome::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureError, LinkLayer, RawPacket};
    use crate::client::ClientError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ---- test doubles ----

    struct ScriptedSource {
        windows: VecDeque<CaptureOutcome>,
        stop_after: Option<(usize, watch::Sender<bool>)>,
        calls: usize,
    }

    impl ScriptedSource {
        fn new(windows: Vec<CaptureOutcome>) -> Self {
            Self { windows: windows.into(), stop_after: None, calls: 0 }
        }
    }

    impl PacketSource for ScriptedSource {
        fn capture(&mut self, _max_count: usize, _timeout: Duration) -> CaptureOutcome {
            self.calls += 1;
            if let Some((n, tx)) = &self.stop_after {
                if self.calls >= *n {
                    let _ = tx.send(true);
                }
            }
            self.windows.pop_front().unwrap_or_default()
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    /// Flags any batch containing a packet bigger than 1000 bytes
    #[derive(Default)]
    struct SizeClassifier {
        calls: AtomicUsize,
    }

    impl Classify for SizeClassifier {
        async fn classify(&self, batch: &Batch) -> Result<Verdict, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if batch.rows().iter().any(|fv| fv.size > 1000.0) {
                Ok(Verdict::Intrusion)
            } else {
                Ok(Verdict::Clean)
            }
        }
    }

    struct FailingClassifier;

    impl Classify for FailingClassifier {
        async fn classify(&self, _batch: &Batch) -> Result<Verdict, ClientError> {
            Err(ClientError::Transport("operation timed out".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        seen: Mutex<Vec<Verdict>>,
    }

    impl AlertSink for RecordingSink {
        async fn notify(&self, verdict: Verdict) {
            self.seen.lock().push(verdict);
        }
    }

    // ---- helpers ----

    fn settings() -> CycleSettings {
        CycleSettings {
            max_packets: 10,
            capture_timeout: Duration::from_millis(10),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn packet(size: u32) -> RawPacket {
        RawPacket {
            data: vec![0u8; size as usize],
            wire_len: size,
            timestamp: 12.5,
            link: LinkLayer::Other(0),
        }
    }

    fn garbage() -> RawPacket {
        RawPacket {
            data: vec![1, 2, 3],
            wire_len: 3,
            timestamp: 1.0,
            link: LinkLayer::Ethernet,
        }
    }

    fn idle() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    // ---- tests ----

    #[tokio::test]
    async fn test_clean_window_alerts_clean() {
        let source = ScriptedSource::new(vec![CaptureOutcome::packets(vec![packet(64)])]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        let outcome = monitor.run_cycle(&rx).await;

        assert_eq!(outcome, CycleOutcome::Classified(Verdict::Clean));
        assert_eq!(*monitor.sink.seen.lock(), vec![Verdict::Clean]);
    }

    #[tokio::test]
    async fn test_one_large_packet_flags_window() {
        let source = ScriptedSource::new(vec![CaptureOutcome::packets(vec![packet(64), packet(1500)])]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::Classified(Verdict::Intrusion));
        assert_eq!(*monitor.sink.seen.lock(), vec![Verdict::Intrusion]);
    }

    #[tokio::test]
    async fn test_all_packets_unusable_makes_no_request() {
        let source = ScriptedSource::new(vec![
            CaptureOutcome::packets(vec![garbage(), garbage()]),
            CaptureOutcome::default(),
        ]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::NoPackets);
        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::NoPackets);
        assert_eq!(monitor.classifier.calls.load(Ordering::SeqCst), 0);
        assert!(monitor.sink.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_bad_packet_does_not_abort_cycle() {
        let source = ScriptedSource::new(vec![CaptureOutcome::packets(vec![garbage(), packet(80)])]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::Classified(Verdict::Clean));
    }

    #[tokio::test]
    async fn test_capture_error_keeps_partial_window() {
        let source = ScriptedSource::new(vec![CaptureOutcome {
            packets: vec![packet(2000)],
            error: Some(CaptureError::Read("interface went down".to_string())),
        }]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::Classified(Verdict::Intrusion));
    }

    #[tokio::test]
    async fn test_timeout_skips_cycle_without_alert() {
        let source = ScriptedSource::new(vec![
            CaptureOutcome::packets(vec![packet(64)]),
            CaptureOutcome::packets(vec![packet(64)]),
        ]);
        let monitor = Monitor::new(source, FailingClassifier, RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::Skipped);
        assert_eq!(monitor.run_cycle(&rx).await, CycleOutcome::Skipped);
        assert!(monitor.sink.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_alerts_follow_cycle_order() {
        let source = ScriptedSource::new(vec![
            CaptureOutcome::packets(vec![packet(64)]),
            CaptureOutcome::packets(vec![packet(1500)]),
            CaptureOutcome::packets(vec![packet(70)]),
        ]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = idle();

        for _ in 0..3 {
            monitor.run_cycle(&rx).await;
        }

        assert_eq!(
            *monitor.sink.seen.lock(),
            vec![Verdict::Clean, Verdict::Intrusion, Verdict::Clean]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_already_shut_down() {
        let source = ScriptedSource::new(vec![CaptureOutcome::packets(vec![packet(64)])]);
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());
        let (_tx, rx) = watch::channel(true);

        let stats = monitor.run(rx).await;
        assert_eq!(stats, MonitorStats::default());
    }

    #[tokio::test]
    async fn test_shutdown_during_capture_skips_classification() {
        let (tx, rx) = watch::channel(false);
        let mut source = ScriptedSource::new(vec![
            CaptureOutcome::packets(vec![packet(64)]),
            CaptureOutcome::packets(vec![packet(1500)]),
        ]);
        source.stop_after = Some((2, tx));
        let monitor = Monitor::new(source, SizeClassifier::default(), RecordingSink::default(), settings());

        let stats = monitor.run(rx).await;

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.verdicts, 1);
        assert_eq!(monitor.classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*monitor.sink.seen.lock(), vec![Verdict::Clean]);
    }

    #[tokio::test]
    async fn test_empty_and_failed_cycles_keep_looping() {
        let (tx, rx) = watch::channel(false);
        let mut source = ScriptedSource::new(vec![
            CaptureOutcome::default(),
            CaptureOutcome::packets(vec![packet(64)]),
        ]);
        source.stop_after = Some((3, tx));
        let monitor = Monitor::new(source, FailingClassifier, RecordingSink::default(), settings());

        let stats = monitor.run(rx).await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.empty, 1);
        assert_eq!(stats.skipped, 1);
        assert!(monitor.sink.seen.lock().is_empty());
    }
}

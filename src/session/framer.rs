//! Fixed-size framing of captured audio and the capture worker thread.

use crate::audio::frame::AudioFrame;
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::transport::session::TransportHandle;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Cuts a continuous sample stream into exact fixed-size frames.
///
/// Samples that do not yet fill a frame stay pending until the next push.
#[derive(Debug)]
pub struct FrameAssembler {
    frame_samples: usize,
    pending: Vec<f32>,
    sequence: u64,
}

impl FrameAssembler {
    /// Creates an assembler emitting frames of `frame_samples` samples.
    pub fn new(frame_samples: usize) -> Self {
        Self {
            frame_samples: frame_samples.max(1),
            pending: Vec::new(),
            sequence: 0,
        }
    }

    /// Appends samples and returns every complete frame they produce.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioFrame> {
        self.pending.extend_from_slice(samples);

        let mut frames = Vec::new();
        while self.pending.len() >= self.frame_samples {
            let rest = self.pending.split_off(self.frame_samples);
            let full = std::mem::replace(&mut self.pending, rest);
            frames.push(AudioFrame::new(self.sequence, full));
            self.sequence += 1;
        }
        frames
    }

    /// Drops the partial tail. Sequence numbering continues.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of samples waiting for the next frame boundary.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Handle to the capture worker thread.
///
/// The worker polls the audio source at ~60Hz, frames the samples, and
/// emits frames to the transport. While the mute flag is set it keeps the
/// device open but discards everything, so unmuting resumes emission
/// without reacquiring the microphone.
pub struct CaptureWorker {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

const MAX_CONSECUTIVE_ERRORS: u32 = 10;

impl CaptureWorker {
    /// Spawns the worker. The source must already be started.
    pub fn spawn(
        mut source: Box<dyn AudioSource>,
        transport: TransportHandle,
        muted: Arc<AtomicBool>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));

        let worker_running = running.clone();
        let thread = thread::spawn(move || {
            let poll_interval = Duration::from_millis(defaults::CAPTURE_POLL_MS);
            let mut assembler = FrameAssembler::new(defaults::FRAME_SAMPLES);
            let mut consecutive_errors: u32 = 0;

            while worker_running.load(Ordering::SeqCst) {
                let samples = match source.read_samples() {
                    Ok(samples) => {
                        consecutive_errors = 0;
                        samples
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "voxline: capture failed {consecutive_errors} times in a row: {e}"
                            );
                            eprintln!("voxline: check your microphone connection and reconnect");
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if muted.load(Ordering::SeqCst) {
                    // Device stays open; stale audio must not leak out on unmute.
                    assembler.clear();
                } else {
                    for frame in assembler.push(&samples) {
                        transport.send(&frame);
                    }
                }

                thread::sleep(poll_interval);
            }

            if let Err(e) = source.stop() {
                eprintln!("voxline: failed to stop capture: {e}");
            }
        });

        Self {
            running,
            thread: Some(thread),
        }
    }

    /// Returns true while the worker is polling.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops the worker and waits briefly for the thread to finish.
    ///
    /// After the deadline the thread is detached — it dies with the process.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);

        let Some(handle) = self.thread.take() else {
            return;
        };

        let deadline = Instant::now() + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(10);
        loop {
            if handle.is_finished() {
                if let Err(panic_info) = handle.join() {
                    let msg = panic_info
                        .downcast_ref::<&str>()
                        .copied()
                        .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                        .unwrap_or("unknown panic");
                    eprintln!("voxline: capture thread panicked: {msg}");
                }
                return;
            }
            if Instant::now() >= deadline {
                eprintln!("voxline: capture shutdown timeout, detaching thread");
                return;
            }
            thread::sleep(poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::source::MockAudioSource;
    use crate::config::LiveConfig;
    use crate::transport::session::{MockTransport, Transport};

    #[test]
    fn assembler_emits_exact_frames() {
        let mut assembler = FrameAssembler::new(4);

        assert!(assembler.push(&[0.1, 0.2]).is_empty());
        assert_eq!(assembler.pending_len(), 2);

        let frames = assembler.push(&[0.3, 0.4, 0.5]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].sequence, 0);
        assert_eq!(frames[0].samples, vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(assembler.pending_len(), 1);
    }

    #[test]
    fn assembler_emits_multiple_frames_per_push() {
        let mut assembler = FrameAssembler::new(2);
        let frames = assembler.push(&[0.0; 7]);

        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(assembler.pending_len(), 1);
    }

    #[test]
    fn assembler_clear_drops_tail_but_keeps_sequence() {
        let mut assembler = FrameAssembler::new(2);
        assert_eq!(assembler.push(&[0.0; 3]).len(), 1);

        assembler.clear();
        assert_eq!(assembler.pending_len(), 0);

        let frames = assembler.push(&[0.0; 2]);
        assert_eq!(frames[0].sequence, 1);
    }

    async fn open_mock() -> (MockTransport, TransportHandle) {
        let transport = MockTransport::new();
        let (handle, _events) = transport
            .open(&LiveConfig::new("k"))
            .await
            .expect("mock open");
        (transport, handle)
    }

    #[tokio::test]
    async fn worker_frames_reach_transport() {
        let (transport, handle) = open_mock().await;
        let source =
            MockAudioSource::new().with_repeating(vec![0.1; defaults::FRAME_SAMPLES]);
        let stopped = source.stopped_handle();

        let muted = Arc::new(AtomicBool::new(false));
        let worker = CaptureWorker::spawn(Box::new(source), handle, muted);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(transport.sent_count() > 0);

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .expect("join");
        assert!(stopped.load(Ordering::SeqCst), "source must be released");
    }

    #[tokio::test]
    async fn muted_worker_sends_nothing_until_unmuted() {
        let (transport, handle) = open_mock().await;
        let source =
            MockAudioSource::new().with_repeating(vec![0.1; defaults::FRAME_SAMPLES]);

        let muted = Arc::new(AtomicBool::new(true));
        let worker = CaptureWorker::spawn(Box::new(source), handle, muted.clone());

        // At least three frames' worth of reads happen while muted.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(transport.sent_count(), 0);

        muted.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(transport.sent_count() > 0);

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .expect("join");
    }

    #[tokio::test]
    async fn worker_gives_up_after_persistent_read_errors() {
        let (transport, handle) = open_mock().await;
        let source = MockAudioSource::new().with_read_failure();
        let stopped = source.stopped_handle();

        let muted = Arc::new(AtomicBool::new(false));
        let worker = CaptureWorker::spawn(Box::new(source), handle, muted);

        // 10 errors at ~16ms each, with margin.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(transport.sent_count(), 0);
        assert!(stopped.load(Ordering::SeqCst), "source stopped on give-up");

        tokio::task::spawn_blocking(move || worker.stop())
            .await
            .expect("join");
    }
}

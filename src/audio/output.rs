//! Playback sinks and the output clock.
//!
//! The scheduler computes absolute start times on the output timeline; a
//! `PlaybackSink` realizes them and an `OutputClock` reports how far the
//! timeline has advanced. Time zero is when the output was opened.

use crate::audio::codec::AudioBuffer;
use crate::error::Result;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Clock for the playback timeline.
pub trait OutputClock: Send + Sync {
    /// Returns the current position on the output timeline.
    fn now(&self) -> Duration;
}

/// Wall-clock based output clock for sinks without a hardware sample counter.
#[derive(Debug, Clone)]
pub struct StreamClock {
    origin: Instant,
}

impl StreamClock {
    /// Creates a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StreamClock {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputClock for StreamClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic testing.
#[derive(Debug, Default)]
pub struct MockClock {
    current: Mutex<Duration>,
}

impl MockClock {
    /// Creates a mock clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the mock clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let mut current = lock_unpoisoned(&self.current);
        *current += duration;
    }

    /// Sets the mock clock to an absolute position.
    pub fn set(&self, position: Duration) {
        *lock_unpoisoned(&self.current) = position;
    }
}

impl OutputClock for MockClock {
    fn now(&self) -> Duration {
        *lock_unpoisoned(&self.current)
    }
}

/// Accepts decoded buffers with absolute start times on the output timeline.
pub trait PlaybackSink: Send {
    /// Queue a buffer to begin playing at `start`.
    ///
    /// The scheduler guarantees `start` is never before audio already
    /// queued, so implementations may realize this as pad-then-append.
    fn play_at(&mut self, buffer: &AudioBuffer, start: Duration) -> Result<()>;

    /// Stop everything scheduled and flush queued audio. Idempotent.
    fn stop_all(&mut self);
}

/// Recording sink for tests: captures `(start, duration)` of every play call.
pub struct MockSink {
    played: Arc<Mutex<Vec<(Duration, Duration)>>>,
    stop_count: Arc<Mutex<usize>>,
}

impl MockSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self {
            played: Arc::new(Mutex::new(Vec::new())),
            stop_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared view of recorded `(start, duration)` pairs.
    pub fn played_handle(&self) -> Arc<Mutex<Vec<(Duration, Duration)>>> {
        self.played.clone()
    }

    /// Shared count of `stop_all` invocations.
    pub fn stop_count_handle(&self) -> Arc<Mutex<usize>> {
        self.stop_count.clone()
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for MockSink {
    fn play_at(&mut self, buffer: &AudioBuffer, start: Duration) -> Result<()> {
        lock_unpoisoned(&self.played).push((start, buffer.duration()));
        Ok(())
    }

    fn stop_all(&mut self) {
        *lock_unpoisoned(&self.stop_count) += 1;
    }
}

/// Locks a mutex, recovering the data from a poisoned lock.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(feature = "cpal-audio")]
pub use device::{CpalPlaybackSink, SampleClock};

#[cfg(feature = "cpal-audio")]
mod device {
    use super::*;
    use crate::audio::SendableStream;
    use crate::defaults;
    use crate::error::VoxlineError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Output clock driven by the device callback's sample counter.
    ///
    /// Advances only as frames are actually handed to the device, so it
    /// tracks the hardware timeline rather than the wall clock.
    pub struct SampleClock {
        frames_played: Arc<AtomicU64>,
        sample_rate: u32,
    }

    impl OutputClock for SampleClock {
        fn now(&self) -> Duration {
            let frames = self.frames_played.load(Ordering::Relaxed);
            Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
        }
    }

    /// Real playback sink using CPAL.
    ///
    /// Keeps a shared mono sample queue drained by the output callback;
    /// the callback plays silence when the queue is empty, so the timeline
    /// keeps advancing between chunks. `play_at` pads leading silence when
    /// a start time lies beyond the current queue tail.
    pub struct CpalPlaybackSink {
        queue: Arc<Mutex<VecDeque<f32>>>,
        frames_played: Arc<AtomicU64>,
        sample_rate: u32,
        _stream: SendableStream,
    }

    impl CpalPlaybackSink {
        /// Opens the default output device at the session playback rate.
        pub fn open() -> Result<Self> {
            let host = cpal::default_host();
            let device =
                host.default_output_device()
                    .ok_or_else(|| VoxlineError::DeviceAccess {
                        message: "no output device available".to_string(),
                    })?;

            let sample_rate = defaults::OUTPUT_SAMPLE_RATE;
            let config = cpal::StreamConfig {
                channels: 1,
                sample_rate: sample_rate,
                buffer_size: cpal::BufferSize::Default,
            };

            let queue: Arc<Mutex<VecDeque<f32>>> = Arc::new(Mutex::new(VecDeque::new()));
            let frames_played = Arc::new(AtomicU64::new(0));

            let cb_queue = Arc::clone(&queue);
            let cb_frames = Arc::clone(&frames_played);
            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut queue = lock_unpoisoned(&cb_queue);
                        for sample in data.iter_mut() {
                            *sample = queue.pop_front().unwrap_or(0.0);
                        }
                        cb_frames.fetch_add(data.len() as u64, Ordering::Relaxed);
                    },
                    |err| eprintln!("voxline: output stream error: {}", err),
                    None,
                )
                .map_err(|e| VoxlineError::DeviceAccess {
                    message: format!("failed to open output stream: {}", e),
                })?;

            stream.play().map_err(|e| VoxlineError::DeviceAccess {
                message: format!("failed to start output stream: {}", e),
            })?;

            Ok(Self {
                queue,
                frames_played,
                sample_rate,
                _stream: SendableStream(stream),
            })
        }

        /// Clock tied to this sink's sample counter.
        pub fn clock(&self) -> Arc<SampleClock> {
            Arc::new(SampleClock {
                frames_played: Arc::clone(&self.frames_played),
                sample_rate: self.sample_rate,
            })
        }
    }

    impl PlaybackSink for CpalPlaybackSink {
        fn play_at(&mut self, buffer: &AudioBuffer, start: Duration) -> Result<()> {
            let mut queue = lock_unpoisoned(&self.queue);
            let tail_frames =
                self.frames_played.load(Ordering::Relaxed) + queue.len() as u64;
            let start_frames =
                (start.as_secs_f64() * self.sample_rate as f64).round() as u64;

            // Pad silence up to the requested start; the scheduler never asks
            // for a start before the queue tail.
            for _ in tail_frames..start_frames {
                queue.push_back(0.0);
            }
            queue.extend(buffer.samples.iter().copied());
            Ok(())
        }

        fn stop_all(&mut self) {
            lock_unpoisoned(&self.queue).clear();
        }
    }
}

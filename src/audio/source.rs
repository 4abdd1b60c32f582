use crate::error::{Result, VoxlineError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for audio capture devices.
///
/// Implementations deliver mono f32 samples in [-1, 1] at the session input
/// rate. This trait allows swapping implementations (real microphone vs mock).
pub trait AudioSource: Send + std::fmt::Debug {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio and release the device.
    fn stop(&mut self) -> Result<()>;

    /// Drain whatever has been captured since the last read.
    ///
    /// An empty vector is normal while the device warms up.
    fn read_samples(&mut self) -> Result<Vec<f32>>;
}

/// Mock audio source for testing.
///
/// Serves a scripted queue of reads, optionally followed by a repeating
/// block. The started/stopped flags are shared so tests can observe the
/// source's lifecycle after it has moved into a capture worker.
#[derive(Debug)]
pub struct MockAudioSource {
    reads: VecDeque<Vec<f32>>,
    repeating: Option<Vec<f32>>,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl MockAudioSource {
    /// Create a new mock audio source with no scripted reads.
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            repeating: None,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
            started: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue a block of samples for one read.
    pub fn with_read(mut self, samples: Vec<f32>) -> Self {
        self.reads.push_back(samples);
        self
    }

    /// Serve the given samples on every read once the queue is exhausted.
    pub fn with_repeating(mut self, samples: Vec<f32>) -> Self {
        self.repeating = Some(samples);
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Shared flag set once `start` succeeds.
    pub fn started_handle(&self) -> Arc<AtomicBool> {
        self.started.clone()
    }

    /// Shared flag set once `stop` is called.
    pub fn stopped_handle(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(VoxlineError::DeviceAccess {
                message: self.error_message.clone(),
            });
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.should_fail_read {
            return Err(VoxlineError::DeviceAccess {
                message: self.error_message.clone(),
            });
        }
        if let Some(samples) = self.reads.pop_front() {
            return Ok(samples);
        }
        Ok(self.repeating.clone().unwrap_or_default())
    }
}

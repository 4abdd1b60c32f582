//! Audio engine: opens the devices one live session needs.
//!
//! The session controller owns the opened devices for the lifetime of a
//! connection and drops them as one unit on disconnect.

use crate::audio::output::{MockClock, MockSink, OutputClock, PlaybackSink};
use crate::audio::source::{AudioSource, MockAudioSource};
use crate::error::{Result, VoxlineError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A freshly opened playback path: the sink plus the clock that tracks it.
pub type PlaybackOutput = (Box<dyn PlaybackSink>, Arc<dyn OutputClock>);

/// Opens capture and playback devices for a session.
///
/// A new input and output are opened per connection, so implementations
/// must hand out fresh handles on every call.
pub trait AudioEngine: Send + Sync {
    /// Open the capture device. Fails with `DeviceAccess` when the
    /// microphone is denied or unavailable.
    fn open_input(&self) -> Result<Box<dyn AudioSource>>;

    /// Open the playback path.
    fn open_output(&self) -> Result<PlaybackOutput>;
}

/// Test engine serving scripted sources and sinks.
///
/// Hands out queued mocks in order, falling back to fresh defaults once the
/// queues are exhausted.
pub struct MockEngine {
    inputs: Mutex<VecDeque<Box<dyn AudioSource>>>,
    sinks: Mutex<VecDeque<Box<dyn PlaybackSink>>>,
    clock: Arc<dyn OutputClock>,
    fail_input: bool,
}

impl MockEngine {
    /// Creates an engine that serves default mocks.
    pub fn new() -> Self {
        Self {
            inputs: Mutex::new(VecDeque::new()),
            sinks: Mutex::new(VecDeque::new()),
            clock: Arc::new(MockClock::new()),
            fail_input: false,
        }
    }

    /// Queue a source for the next `open_input` call.
    pub fn with_input(self, source: Box<dyn AudioSource>) -> Self {
        self.inputs.lock().unwrap_or_else(|p| p.into_inner()).push_back(source);
        self
    }

    /// Queue a sink for the next `open_output` call.
    pub fn with_sink(self, sink: Box<dyn PlaybackSink>) -> Self {
        self.sinks.lock().unwrap_or_else(|p| p.into_inner()).push_back(sink);
        self
    }

    /// Use the given clock for every opened output.
    pub fn with_clock(mut self, clock: Arc<dyn OutputClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Make `open_input` fail with `DeviceAccess`.
    pub fn with_input_failure(mut self) -> Self {
        self.fail_input = true;
        self
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for MockEngine {
    fn open_input(&self) -> Result<Box<dyn AudioSource>> {
        if self.fail_input {
            return Err(VoxlineError::DeviceAccess {
                message: "mock microphone denied".to_string(),
            });
        }
        let mut inputs = self.inputs.lock().unwrap_or_else(|p| p.into_inner());
        Ok(inputs
            .pop_front()
            .unwrap_or_else(|| Box::new(MockAudioSource::new())))
    }

    fn open_output(&self) -> Result<PlaybackOutput> {
        let mut sinks = self.sinks.lock().unwrap_or_else(|p| p.into_inner());
        let sink = sinks
            .pop_front()
            .unwrap_or_else(|| Box::new(MockSink::new()));
        Ok((sink, self.clock.clone()))
    }
}

#[cfg(feature = "cpal-audio")]
pub use device::CpalEngine;

#[cfg(feature = "cpal-audio")]
mod device {
    use super::*;
    use crate::audio::capture::CpalAudioSource;
    use crate::audio::output::CpalPlaybackSink;

    /// Real audio engine backed by CPAL devices.
    pub struct CpalEngine {
        input_device: Option<String>,
    }

    impl CpalEngine {
        /// Creates an engine using the given input device, or the best
        /// default when `None`.
        pub fn new(input_device: Option<String>) -> Self {
            Self { input_device }
        }
    }

    impl AudioEngine for CpalEngine {
        fn open_input(&self) -> Result<Box<dyn AudioSource>> {
            let source = CpalAudioSource::new(self.input_device.as_deref())?;
            Ok(Box::new(source))
        }

        fn open_output(&self) -> Result<PlaybackOutput> {
            let sink = CpalPlaybackSink::open()?;
            let clock = sink.clock();
            Ok((Box::new(sink), clock))
        }
    }
}

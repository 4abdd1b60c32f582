//! Audio device access, PCM codec, and frame types.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod codec;
pub mod engine;
pub mod frame;
pub mod output;
pub mod source;

pub use codec::{AudioBuffer, decode_audio_data, decode_frame, encode_frame};
#[cfg(feature = "cpal-audio")]
pub use engine::CpalEngine;
pub use engine::{AudioEngine, MockEngine, PlaybackOutput};
pub use frame::AudioFrame;
#[cfg(feature = "cpal-audio")]
pub use output::CpalPlaybackSink;
pub use output::{MockClock, MockSink, OutputClock, PlaybackSink, StreamClock};
pub use source::{AudioSource, MockAudioSource};

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is owned by exactly one component at a time and its
/// methods are only invoked from that owner; it never crosses thread
/// boundaries concurrently.
#[cfg(feature = "cpal-audio")]
pub(crate) struct SendableStream(pub(crate) cpal::Stream);

#[cfg(feature = "cpal-audio")]
unsafe impl Send for SendableStream {}

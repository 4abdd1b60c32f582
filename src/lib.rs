//! voxline - Real-time voice sessions with a generative-AI live endpoint
//!
//! Microphone in, synthesized speech and turn transcripts out, over one
//! persistent bidirectional streaming connection.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod session;
pub mod transport;

// Core traits (capture → transport → playback)
pub use audio::engine::{AudioEngine, MockEngine};
pub use audio::source::{AudioSource, MockAudioSource};
pub use transport::session::{MockTransport, Transport, TransportHandle};

// Session orchestration
pub use session::controller::{ConnectionStatus, ControllerEvent, SessionController};
pub use session::playback::PlaybackScheduler;
pub use session::transcript::{Speaker, TranscriptAggregator, TranscriptEntry};

// Codec and frame types
pub use audio::codec::{AudioBuffer, decode_audio_data, decode_frame, encode_frame};
pub use audio::frame::AudioFrame;

// Transport wire types
pub use transport::protocol::{ServerMessage, SessionEvent};
pub use transport::websocket::WsTransport;

// Real devices
#[cfg(feature = "cpal-audio")]
pub use audio::engine::CpalEngine;

// Error handling
pub use error::{Result, VoxlineError};

// Config
pub use config::{Config, LiveConfig};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}

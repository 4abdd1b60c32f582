//! Default configuration constants for voxline.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Microphone capture sample rate in Hz.
///
/// The live endpoint accepts input PCM at 16kHz, the standard rate for
/// speech models.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Playback sample rate in Hz.
///
/// Synthesized audio arrives from the live endpoint as 24kHz mono PCM.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// Number of samples per captured audio frame.
///
/// One frame is 4096 samples (256ms at 16kHz) and travels as a single
/// transport message.
pub const FRAME_SAMPLES: usize = 4096;

/// MIME type attached to outbound audio frames.
pub const INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Default live model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

/// Default prebuilt voice for synthesized replies.
pub const DEFAULT_VOICE: &str = "Zephyr";

/// Websocket endpoint for bidirectional live sessions.
pub const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Capture poll interval in milliseconds (~60Hz).
pub const CAPTURE_POLL_MS: u64 = 16;

/// Outbound frame queue capacity.
///
/// Frames beyond this are dropped rather than buffered; a live stream has
/// no use for stale audio.
pub const FRAME_QUEUE: usize = 32;

/// Inbound event queue capacity.
pub const EVENT_QUEUE: usize = 256;

/// Seconds to wait for the remote handshake acknowledgment before giving up.
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 10;

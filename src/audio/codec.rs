//! PCM codec for the live transport.
//!
//! The wire carries 16-bit little-endian PCM wrapped in base64 text. Capture
//! produces f32 samples in [-1, 1]; playback consumes the same.

use crate::error::{Result, VoxlineError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;

/// Decoded audio ready for playback scheduling.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved f32 samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (mono = 1).
    pub channels: u16,
}

impl AudioBuffer {
    /// Playback duration of this buffer.
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as u64 / self.channels.max(1) as u64;
        Duration::from_secs_f64(frames as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Quantizes f32 samples to int16 little-endian and wraps them in base64.
///
/// Each sample is `round(sample * 32768)` saturated to the int16 range, so
/// out-of-range input clips rather than wraps. Pure and deterministic.
pub fn encode_frame(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let quantized = (sample * 32768.0)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        bytes.extend_from_slice(&quantized.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Unwraps a base64 payload into raw bytes. No resampling, no PCM checks.
pub fn decode_frame(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| VoxlineError::Decode {
        message: format!("invalid base64 payload: {}", e),
    })
}

/// Interprets raw bytes as int16 little-endian PCM at the given rate and
/// channel count, producing a playable buffer of f32 samples in [-1, 1].
///
/// # Errors
/// Returns `VoxlineError::Decode` when the byte length is not a multiple of
/// `2 * channels`, or when rate/channels are zero.
pub fn decode_audio_data(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if sample_rate == 0 || channels == 0 {
        return Err(VoxlineError::Decode {
            message: format!(
                "invalid format: {} Hz, {} channel(s)",
                sample_rate, channels
            ),
        });
    }
    let frame_bytes = 2 * channels as usize;
    if bytes.len() % frame_bytes != 0 {
        return Err(VoxlineError::Decode {
            message: format!(
                "byte length {} is not a multiple of {}",
                bytes.len(),
                frame_bytes
            ),
        });
    }

    let mut samples = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        samples.push(i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0);
    }

    Ok(AudioBuffer {
        samples,
        sample_rate,
        channels,
    })
}

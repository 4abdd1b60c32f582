//! Frame types for the capture pipeline.

/// A fixed-size block of mono PCM samples captured from the microphone.
///
/// Ephemeral: produced by the capture worker, consumed by the transport,
/// never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Sequence number for ordering frames.
    pub sequence: u64,
    /// Mono f32 samples in [-1, 1] at the session input rate.
    pub samples: Vec<f32>,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(sequence: u64, samples: Vec<f32>) -> Self {
        Self { sequence, samples }
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u32 * 1000) / sample_rate.max(1)
    }
}

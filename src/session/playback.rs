//! Gapless playback scheduling of decoded audio chunks.

use crate::audio::codec::AudioBuffer;
use crate::audio::output::{OutputClock, PlaybackSink};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// A chunk currently scheduled on the output timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledChunk {
    /// Monotonic id, assigned at enqueue time.
    pub id: u64,
    /// Absolute start time on the output timeline.
    pub start: Duration,
    /// Absolute end time on the output timeline.
    pub end: Duration,
}

/// Schedules decoded chunks back-to-back against the output clock.
///
/// Chunks arrive in real-time order; each is scheduled to start exactly when
/// the previous one ends, floored at the current clock so a late arrival
/// plays immediately (with an audible gap, which is not an error) instead of
/// overlapping. The next start time never moves backwards.
pub struct PlaybackScheduler {
    clock: Arc<dyn OutputClock>,
    sink: Box<dyn PlaybackSink>,
    next_start: Duration,
    active: Vec<ScheduledChunk>,
    next_id: u64,
}

impl PlaybackScheduler {
    /// Creates a scheduler over the given sink and its clock.
    pub fn new(clock: Arc<dyn OutputClock>, sink: Box<dyn PlaybackSink>) -> Self {
        Self {
            clock,
            sink,
            next_start: Duration::ZERO,
            active: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedules a chunk and returns its start time.
    ///
    /// Completed chunks (end at or before the current clock) leave the
    /// active set here, since completion is observed through the clock.
    pub fn enqueue(&mut self, buffer: AudioBuffer) -> Result<Duration> {
        let now = self.clock.now();
        self.active.retain(|chunk| chunk.end > now);

        let start = self.next_start.max(now);
        self.sink.play_at(&buffer, start)?;

        let end = start + buffer.duration();
        self.active.push(ScheduledChunk {
            id: self.next_id,
            start,
            end,
        });
        self.next_id += 1;
        self.next_start = end;
        Ok(start)
    }

    /// Force-stops every scheduled chunk, clears the active set, and resets
    /// the timeline cursor to zero.
    pub fn stop(&mut self) {
        self.sink.stop_all();
        self.active.clear();
        self.next_start = Duration::ZERO;
    }

    /// Number of chunks currently scheduled or playing.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Where the next chunk will start, absent a clock overrun.
    pub fn next_start(&self) -> Duration {
        self.next_start
    }
}

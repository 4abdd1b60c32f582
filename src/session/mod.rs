//! Live session orchestration.
//!
//! The controller owns one connection at a time and wires the capture
//! worker, the transport, the playback scheduler, and the transcript
//! aggregator together around a single event dispatch loop.

pub mod controller;
pub mod framer;
pub mod playback;
pub mod transcript;

pub use controller::{ConnectionStatus, ControllerEvent, SessionController};
pub use framer::{CaptureWorker, FrameAssembler};
pub use playback::{PlaybackScheduler, ScheduledChunk};
pub use transcript::{Speaker, TranscriptAggregator, TranscriptEntry};

//! Session controller: owns the connection state machine and wires capture,
//! transport, playback, and transcripts together.
//!
//! Exactly one session is active at a time. The microphone, the playback
//! path, and the transport handle live in one resource arena that is
//! dropped as a unit on teardown, so nothing outlives a disconnect.

use crate::audio::codec::{decode_audio_data, decode_frame};
use crate::audio::engine::AudioEngine;
use crate::audio::output::lock_unpoisoned;
use crate::audio::source::AudioSource;
use crate::config::LiveConfig;
use crate::defaults;
use crate::error::{Result, VoxlineError};
use crate::session::framer::CaptureWorker;
use crate::session::playback::PlaybackScheduler;
use crate::session::transcript::{Speaker, TranscriptAggregator, TranscriptEntry};
use crate::transport::protocol::{ServerMessage, SessionEvent};
use crate::transport::session::{Transport, TransportHandle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Connection lifecycle states surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events surfaced to the embedding UI.
///
/// Delivered non-blocking over an optional crossbeam channel so a slow
/// consumer can never stall the dispatch loop.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The connection status changed.
    Status(ConnectionStatus),
    /// A turn completed and these entries were appended to the history.
    Turn(Vec<TranscriptEntry>),
}

/// Everything owned for the lifetime of one connection.
struct SessionResources {
    capture: CaptureWorker,
    transport: TransportHandle,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
}

struct Inner {
    config: LiveConfig,
    transport: Box<dyn Transport>,
    audio: Box<dyn AudioEngine>,
    status: Mutex<ConnectionStatus>,
    history: Mutex<Vec<TranscriptEntry>>,
    muted: Arc<AtomicBool>,
    /// Bumped by every teardown; in-flight connect continuations compare
    /// against their snapshot before wiring anything up.
    generation: AtomicU64,
    resources: tokio::sync::Mutex<Option<SessionResources>>,
    events: Option<crossbeam_channel::Sender<ControllerEvent>>,
}

impl Inner {
    fn canceled(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = {
            let mut current = lock_unpoisoned(&self.status);
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        };
        if changed {
            self.emit(ControllerEvent::Status(status));
        }
    }

    fn emit(&self, event: ControllerEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    /// Drops the resource arena and lands on `final_status`.
    ///
    /// Safe from any state: with no active resources only the status moves.
    async fn teardown(&self, final_status: ConnectionStatus) {
        let resources = self.resources.lock().await.take();
        if let Some(SessionResources {
            capture,
            transport,
            scheduler,
        }) = resources
        {
            // Joining the capture thread blocks briefly; keep it off the
            // async workers.
            let _ = tokio::task::spawn_blocking(move || capture.stop()).await;
            transport.close().await;
            lock_unpoisoned(&scheduler).stop();
        }
        self.set_status(final_status);
    }
}

/// Drives one live voice session at a time.
///
/// Cheap to clone; clones share the same session state, so a UI can hold
/// one clone for `connect` and another for `disconnect`.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Creates a controller.
    ///
    /// The API key travels inside `config`; construction is the only place
    /// credentials enter the session layer.
    pub fn new(
        config: LiveConfig,
        transport: Box<dyn Transport>,
        audio: Box<dyn AudioEngine>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                audio,
                status: Mutex::new(ConnectionStatus::Disconnected),
                history: Mutex::new(Vec::new()),
                muted: Arc::new(AtomicBool::new(false)),
                generation: AtomicU64::new(0),
                resources: tokio::sync::Mutex::new(None),
                events: None,
            }),
        }
    }

    /// Attaches a UI event feed. Must be called before the first connect.
    pub fn with_events(mut self, events: crossbeam_channel::Sender<ControllerEvent>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.events = Some(events),
            None => eprintln!("voxline: with_events ignored on a shared controller"),
        }
        self
    }

    /// Opens a session: microphone, playback path, transport, dispatch loop.
    ///
    /// No-op when already connecting or connected. On failure the status
    /// lands on `Error` and every acquired resource is released; the caller
    /// reconnects explicitly; there are no retries.
    pub async fn connect(&self) -> Result<()> {
        let generation = {
            let mut status = lock_unpoisoned(&self.inner.status);
            if matches!(
                *status,
                ConnectionStatus::Connecting | ConnectionStatus::Connected
            ) {
                return Ok(());
            }
            *status = ConnectionStatus::Connecting;
            self.inner.generation.load(Ordering::SeqCst)
        };
        self.inner.emit(ControllerEvent::Status(ConnectionStatus::Connecting));
        lock_unpoisoned(&self.inner.history).clear();

        self.establish(generation).await
    }

    async fn establish(&self, generation: u64) -> Result<()> {
        let inner = &self.inner;

        // Microphone first: a denied device must fail before any network I/O.
        let mut source = match inner.audio.open_input() {
            Ok(source) => source,
            Err(e) => return self.fail(e),
        };
        if let Err(e) = source.start() {
            return self.fail(e);
        }
        if inner.canceled(generation) {
            stop_source(&mut source);
            return Ok(());
        }

        let (sink, clock) = match inner.audio.open_output() {
            Ok(output) => output,
            Err(e) => {
                stop_source(&mut source);
                return self.fail(e);
            }
        };
        let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new(clock, sink)));

        // Handshake is a suspension point: a concurrent disconnect may win.
        let (handle, events) = match inner.transport.open(&inner.config).await {
            Ok(session) => session,
            Err(e) => {
                stop_source(&mut source);
                return self.fail(e);
            }
        };
        if inner.canceled(generation) {
            handle.close().await;
            stop_source(&mut source);
            return Ok(());
        }

        let capture = CaptureWorker::spawn(source, handle.clone(), inner.muted.clone());
        {
            let mut resources = inner.resources.lock().await;
            if inner.canceled(generation) {
                drop(resources);
                let _ = tokio::task::spawn_blocking(move || capture.stop()).await;
                handle.close().await;
                return Ok(());
            }
            *resources = Some(SessionResources {
                capture,
                transport: handle,
                scheduler: scheduler.clone(),
            });
        }

        inner.set_status(ConnectionStatus::Connected);

        let dispatch_inner = self.inner.clone();
        tokio::spawn(dispatch_loop(dispatch_inner, events, scheduler, generation));

        Ok(())
    }

    fn fail(&self, error: VoxlineError) -> Result<()> {
        self.inner.set_status(ConnectionStatus::Error);
        Err(error)
    }

    /// Ends the session and releases every resource.
    ///
    /// Idempotent and safe from any state, including while a `connect` is
    /// still in flight and from within error handling.
    pub async fn disconnect(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.teardown(ConnectionStatus::Disconnected).await;
    }

    /// Suspends or resumes frame emission. The device stream and the
    /// session stay open, so unmuting never reconnects.
    pub fn set_muted(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::SeqCst);
    }

    /// Current mute flag.
    pub fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::SeqCst)
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *lock_unpoisoned(&self.inner.status)
    }

    /// Snapshot of the committed transcript history.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        lock_unpoisoned(&self.inner.history).clone()
    }
}

fn stop_source(source: &mut Box<dyn AudioSource>) {
    if let Err(e) = source.stop() {
        eprintln!("voxline: failed to stop capture source: {e}");
    }
}

/// Consumes the tagged event stream for one session.
///
/// Events are processed to completion in arrival order; all session state
/// mutation happens here or behind short-lived locks, so no further
/// synchronization is needed.
async fn dispatch_loop(
    inner: Arc<Inner>,
    mut events: mpsc::Receiver<SessionEvent>,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    generation: u64,
) {
    let mut aggregator = TranscriptAggregator::new();

    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Opened => {}
            SessionEvent::Message(message) => {
                if inner.canceled(generation) {
                    return;
                }
                handle_message(&inner, &mut aggregator, &scheduler, message);
            }
            SessionEvent::Errored(error) => {
                if inner.canceled(generation) {
                    return;
                }
                eprintln!("voxline: live session error: {error}");
                inner.generation.fetch_add(1, Ordering::SeqCst);
                inner.teardown(ConnectionStatus::Error).await;
                return;
            }
            SessionEvent::Closed => {
                if inner.canceled(generation) {
                    return;
                }
                inner.generation.fetch_add(1, Ordering::SeqCst);
                inner.teardown(ConnectionStatus::Disconnected).await;
                return;
            }
        }
    }
}

fn handle_message(
    inner: &Inner,
    aggregator: &mut TranscriptAggregator,
    scheduler: &Mutex<PlaybackScheduler>,
    message: ServerMessage,
) {
    let Some(content) = message.server_content else {
        return;
    };

    if let Some(delta) = &content.input_transcription {
        aggregator.append(Speaker::User, &delta.text);
    }
    if let Some(delta) = &content.output_transcription {
        aggregator.append(Speaker::Model, &delta.text);
    }

    if content.turn_complete {
        let entries = aggregator.commit_turn();
        if !entries.is_empty() {
            lock_unpoisoned(&inner.history).extend(entries.iter().cloned());
            inner.emit(ControllerEvent::Turn(entries));
        }
    }

    let inline = content
        .model_turn
        .as_ref()
        .and_then(|turn| turn.parts.first())
        .and_then(|part| part.inline_data.as_ref());
    if let Some(inline) = inline {
        let decoded = decode_frame(&inline.data)
            .and_then(|bytes| decode_audio_data(&bytes, defaults::OUTPUT_SAMPLE_RATE, 1));
        match decoded {
            Ok(buffer) => {
                if let Err(e) = lock_unpoisoned(scheduler).enqueue(buffer) {
                    eprintln!("voxline: failed to schedule playback chunk: {e}");
                }
            }
            // Malformed chunks are dropped; the session continues.
            Err(e) => eprintln!("voxline: dropping malformed audio chunk: {e}"),
        }
    }
}

//! Live session transport abstraction.
//!
//! A `Transport` opens one persistent bidirectional session per call and
//! hands back a `TransportHandle` for outbound frames plus a receiver of
//! inbound `SessionEvent`s. The handle is the only way to talk to the
//! session; dropping every clone of it tears the outbound path down.

use crate::audio::codec::encode_frame;
use crate::audio::frame::AudioFrame;
use crate::config::LiveConfig;
use crate::error::Result;
use crate::transport::protocol::{RealtimeInputMessage, SessionEvent};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{Notify, mpsc};

/// Opens live sessions.
///
/// Each `open` call creates a fresh session; the previous one (if any) is
/// unaffected. Implementations must resolve only after the remote
/// handshake completes, and reject with `VoxlineError::Connection` on
/// handshake failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        config: &LiveConfig,
    ) -> Result<(TransportHandle, mpsc::Receiver<SessionEvent>)>;
}

/// Handle to an open live session. Cheap to clone; clones share the session.
#[derive(Clone, Debug)]
pub struct TransportHandle {
    outbound: mpsc::Sender<String>,
    open: Arc<AtomicBool>,
    closed: Arc<Notify>,
}

impl TransportHandle {
    /// Assembles a handle from its parts. Used by transport implementations.
    pub(crate) fn new(
        outbound: mpsc::Sender<String>,
        open: Arc<AtomicBool>,
        closed: Arc<Notify>,
    ) -> Self {
        Self {
            outbound,
            open,
            closed,
        }
    }

    /// Sends one audio frame, fire-and-forget.
    ///
    /// The frame is encoded into a realtime media message. It is dropped
    /// silently when the session is not open or the outbound queue is full;
    /// live audio is never buffered beyond the bounded queue.
    pub fn send(&self, frame: &AudioFrame) {
        if !self.open.load(Ordering::SeqCst) {
            return;
        }
        let message = RealtimeInputMessage::media(encode_frame(&frame.samples));
        match message.to_json() {
            Ok(text) => {
                let _ = self.outbound.try_send(text);
            }
            Err(e) => eprintln!("voxline: failed to encode outbound frame: {}", e),
        }
    }

    /// True while the session accepts frames.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Closes the session. Idempotent; safe on an already-closed session.
    pub async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.closed.notify_one();
        }
    }

    /// Marks the session closed without signalling the writer. Used by
    /// transport internals when the remote side is already gone.
    pub(crate) fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Shared close-signal listener for transport internals.
    pub(crate) fn close_signal(&self) -> Arc<Notify> {
        self.closed.clone()
    }
}

/// Scriptable transport for tests.
///
/// Clones share state, so a test keeps one clone and hands the other to a
/// controller: sent frames are observable, inbound events injectable, and
/// the handshake can be delayed or made to fail.
#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Option<mpsc::Sender<SessionEvent>>>>,
    fail_open: Arc<AtomicBool>,
    open_delay_ms: Arc<AtomicUsize>,
    open_count: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Creates a transport whose handshake succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `open` call fail with a connection error.
    pub fn with_open_failure(self) -> Self {
        self.fail_open.store(true, Ordering::SeqCst);
        self
    }

    /// Delay the handshake by the given number of milliseconds.
    pub fn with_open_delay_ms(self, delay: usize) -> Self {
        self.open_delay_ms.store(delay, Ordering::SeqCst);
        self
    }

    /// Number of raw outbound payloads recorded so far.
    pub fn sent_count(&self) -> usize {
        self.lock_sent().len()
    }

    /// Copies of the raw outbound payloads.
    pub fn sent(&self) -> Vec<String> {
        self.lock_sent().clone()
    }

    /// Times `open` resolved successfully.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Injects an inbound event into the most recently opened session.
    ///
    /// Returns false when no session is open or the event queue is gone.
    pub fn inject(&self, event: SessionEvent) -> bool {
        let guard = match self.events.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        };
        match guard.as_ref() {
            Some(tx) => tx.try_send(event).is_ok(),
            None => false,
        }
    }

    fn lock_sent(&self) -> MutexGuard<'_, Vec<String>> {
        match self.sent.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &self,
        _config: &LiveConfig,
    ) -> Result<(TransportHandle, mpsc::Receiver<SessionEvent>)> {
        let delay = self.open_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay as u64)).await;
        }
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(crate::error::VoxlineError::Connection {
                message: "mock handshake rejected".to_string(),
            });
        }

        let (event_tx, event_rx) = mpsc::channel(64);
        let (out_tx, mut out_rx) = mpsc::channel(64);

        {
            let mut guard = match self.events.lock() {
                Ok(g) => g,
                Err(p) => p.into_inner(),
            };
            *guard = Some(event_tx);
        }

        let sent = self.sent.clone();
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match sent.lock() {
                    Ok(mut g) => g.push(message),
                    Err(p) => p.into_inner().push(message),
                }
            }
        });

        self.open_count.fetch_add(1, Ordering::SeqCst);
        Ok((
            TransportHandle::new(out_tx, Arc::new(AtomicBool::new(true)), Arc::new(Notify::new())),
            event_rx,
        ))
    }
}

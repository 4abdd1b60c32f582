//! Websocket transport for the live endpoint.
//!
//! One `open` call performs the connect + setup handshake, then splits the
//! socket into a writer task (outbound frame queue → socket) and a reader
//! task (socket → tagged event stream).

use crate::config::LiveConfig;
use crate::defaults;
use crate::error::{Result, VoxlineError};
use crate::transport::protocol::{ServerMessage, SessionEvent, SetupMessage};
use crate::transport::session::{Transport, TransportHandle};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Transport speaking the bidirectional live protocol over a websocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates the transport. Sessions are parameterized per `open` call.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(
        &self,
        config: &LiveConfig,
    ) -> Result<(TransportHandle, mpsc::Receiver<SessionEvent>)> {
        let url = format!("{}?key={}", config.endpoint, config.api_key);
        let (socket, _response) =
            connect_async(url.as_str())
                .await
                .map_err(|e| VoxlineError::Connection {
                    message: format!("websocket connect failed: {}", e),
                })?;
        let (mut ws_tx, mut ws_rx) = socket.split();

        let setup = SetupMessage::from_config(config)
            .to_json()
            .map_err(|e| VoxlineError::Connection {
                message: format!("failed to encode setup message: {}", e),
            })?;
        ws_tx
            .send(Message::Text(setup.into()))
            .await
            .map_err(|e| VoxlineError::Connection {
                message: format!("handshake send failed: {}", e),
            })?;

        // Wait for the acknowledgment. Content arriving before the ack is
        // replayed to the dispatch loop once the event stream is wired.
        let mut pending = Vec::new();
        let deadline = Duration::from_secs(defaults::HANDSHAKE_TIMEOUT_SECS);
        loop {
            let next = tokio::time::timeout(deadline, ws_rx.next())
                .await
                .map_err(|_| VoxlineError::Connection {
                    message: "handshake timed out".to_string(),
                })?;
            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    return Err(VoxlineError::Connection {
                        message: format!("handshake failed: {}", e),
                    });
                }
                None => {
                    return Err(VoxlineError::Connection {
                        message: "connection closed during handshake".to_string(),
                    });
                }
            };
            if matches!(message, Message::Close(_)) {
                return Err(VoxlineError::Connection {
                    message: "connection closed during handshake".to_string(),
                });
            }
            match parse_server_message(&message) {
                Some(Ok(msg)) if msg.setup_complete.is_some() => break,
                Some(Ok(msg)) => pending.push(msg),
                Some(Err(e)) => {
                    eprintln!("voxline: ignoring unparseable handshake message: {}", e);
                }
                None => {} // control frame, keep waiting
            }
        }

        let (event_tx, event_rx) = mpsc::channel(defaults::EVENT_QUEUE);
        let (out_tx, mut out_rx) = mpsc::channel::<String>(defaults::FRAME_QUEUE);
        let handle = TransportHandle::new(
            out_tx,
            Arc::new(AtomicBool::new(true)),
            Arc::new(Notify::new()),
        );

        // Writer: outbound queue → socket, until close is requested or every
        // sender is gone.
        let closed = handle.close_signal();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = closed.notified() => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                    message = out_rx.recv() => match message {
                        Some(text) => {
                            // Send failures surface on the reader side.
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
            }
        });

        // Reader: socket → tagged event stream, exactly one terminal event.
        let reader_handle = handle.clone();
        tokio::spawn(async move {
            let _ = event_tx.send(SessionEvent::Opened).await;
            for msg in pending {
                if event_tx.send(SessionEvent::Message(msg)).await.is_err() {
                    return;
                }
            }
            loop {
                let Some(result) = ws_rx.next().await else {
                    reader_handle.mark_closed();
                    let _ = event_tx.send(SessionEvent::Closed).await;
                    return;
                };
                let message = match result {
                    Ok(message) => message,
                    Err(e) => {
                        reader_handle.mark_closed();
                        let _ = event_tx.send(SessionEvent::Errored(e.to_string())).await;
                        return;
                    }
                };
                if matches!(message, Message::Close(_)) {
                    reader_handle.mark_closed();
                    let _ = event_tx.send(SessionEvent::Closed).await;
                    return;
                }
                match parse_server_message(&message) {
                    Some(Ok(msg)) => {
                        if event_tx.send(SessionEvent::Message(msg)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        eprintln!("voxline: ignoring unparseable server message: {}", e);
                    }
                    None => {} // control frame
                }
            }
        });

        Ok((handle, event_rx))
    }
}

/// Extracts a server message from a websocket frame.
///
/// Returns `None` for control frames. The endpoint delivers JSON in text
/// frames and, depending on the route, in binary frames as well.
fn parse_server_message(
    message: &Message,
) -> Option<std::result::Result<ServerMessage, serde_json::Error>> {
    match message {
        Message::Text(text) => Some(ServerMessage::from_json(text.as_str())),
        Message::Binary(data) => match std::str::from_utf8(data) {
            Ok(text) => Some(ServerMessage::from_json(text)),
            Err(_) => {
                eprintln!("voxline: ignoring non-UTF8 binary frame");
                None
            }
        },
        _ => None,
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The production [`ExternalSink`]: a WebSocket broadcast server. Every
//! translated event is fanned out over a `tokio::sync::broadcast` channel;
//! each accepted connection gets its own forwarding task so one slow or
//! disconnected client never backs up another.

use crate::subscriber::ExternalSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite::Message;

/// Publishes translated wire messages onto a broadcast channel read by
/// every connected WebSocket client. Cheap to clone.
#[derive(Clone)]
pub struct WebSocketSink {
    tx: broadcast::Sender<String>,
}

impl WebSocketSink {
    /// `capacity` bounds how many unsent messages a lagging client may fall
    /// behind by before it starts missing some (broadcast channels drop the
    /// oldest, never block the sender).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl ExternalSink for WebSocketSink {
    fn send(&self, message: serde_json::Value) {
        // No subscribers is not an error: nobody is listening yet.
        let _ = self.tx.send(message.to_string());
    }
}

/// Accept connections on `listener` and stream every broadcast message to
/// each one as a text frame, until `shutdown` reports `true`.
pub async fn serve(listener: TcpListener, sink: WebSocketSink, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        let rx = sink.subscribe();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, rx, shutdown).await {
                                tracing::debug!(%addr, error = %err, "websocket connection closed");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "websocket accept failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    mut rx: broadcast::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Ok(text) => write.send(Message::Text(text.into())).await?,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "websocket_tests.rs"]
mod tests;

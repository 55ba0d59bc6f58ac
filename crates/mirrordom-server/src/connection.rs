//! WebSocket connection management.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use mirrordom_core::handle_message;
use mirrordom_protocols::{ChannelError, Transport};

use crate::ServerState;

/// One WebSocket connection to a browser.
///
/// Outbound commands go through an unbounded queue drained by the
/// connection task, so emission never blocks the mutating caller and
/// per-connection ordering is preserved.
pub struct WsConnection {
    id: String,
    tx: mpsc::UnboundedSender<String>,
    open: AtomicBool,
}

impl WsConnection {
    /// Create the connection and spawn its handler task.
    pub fn spawn(id: String, socket: WebSocket, state: Arc<ServerState>) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let conn = Arc::new(Self {
            id: id.clone(),
            tx,
            open: AtomicBool::new(true),
        });

        tokio::spawn(run_connection(id, socket, rx, state, conn.clone()));

        conn
    }

    /// Mark the connection closed; the handler task winds down on its own.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl Transport for WsConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, message: &str) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.tx
            .send(message.to_string())
            .map_err(|err| ChannelError::SendFailed(err.to_string()))
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Drive one WebSocket until either side goes away.
async fn run_connection(
    conn_id: String,
    socket: WebSocket,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    state: Arc<ServerState>,
    conn: Arc<WsConnection>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!("WebSocket connection established: {}", conn_id);

    loop {
        tokio::select! {
            // Outbound commands (host -> browser)
            Some(text) = outbound_rx.recv() => {
                if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                    warn!("failed to send to {}: {}", conn_id, err);
                    break;
                }
            }

            // Inbound messages (browser -> host)
            result = ws_rx.next() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        handle_message(state.context(), &text);
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("received close from {}", conn_id);
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary, ping, pong: nothing to route.
                    }
                    Some(Err(err)) => {
                        error!("WebSocket error from {}: {}", conn_id, err);
                        break;
                    }
                    None => {
                        info!("WebSocket connection closed: {}", conn_id);
                        break;
                    }
                }
            }
        }
    }

    conn.close();
    state.document.remove_connection(&conn_id);
    state.connections.remove(&conn_id);
    debug!("WebSocket connection removed: {}", conn_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_connection_rejects_sends() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            id: "c1".to_string(),
            tx,
            open: AtomicBool::new(true),
        };
        assert!(conn.is_open());
        assert!(conn.send("{}").is_ok());
        conn.close();
        assert!(matches!(conn.send("{}"), Err(ChannelError::Closed)));
    }
}

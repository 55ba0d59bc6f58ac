//! # MirrorDom Server
//!
//! Hosts a mirrored [`Document`] over HTTP/WebSocket:
//!
//! - Serves the rendered page at `/` and the browser client at
//!   `/mirrordom.js`.
//! - Accepts WebSocket connections at `/ws`; each becomes a transport the
//!   document fans mutation commands out to, and a source of inbound
//!   events and query responses.
//!
//! ## Usage
//!
//! ```ignore
//! use mirrordom_server::{WebServer, WebServerConfig};
//!
//! let server = WebServer::new(WebServerConfig::default())?;
//! let body = server.document().body().clone();
//! server.start().await?;
//! ```

mod connection;
mod server;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mirrordom_core::{Document, SyncContext};
use mirrordom_protocols::{ChannelError, DomError};

pub use connection::WsConnection;
pub use server::create_router;

/// Path the browser client script is served from and referenced as.
pub const CLIENT_SCRIPT_PATH: &str = "/mirrordom.js";

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebServerConfig {
    /// Host to bind to (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Initial document title (default: "MirrorDom").
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_title() -> String {
    "MirrorDom".to_string()
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            title: default_title(),
        }
    }
}

/// Server state shared across handlers.
pub struct ServerState {
    /// The document every connection mirrors.
    pub document: Document,
    /// Active WebSocket connections by id.
    pub connections: DashMap<String, Arc<WsConnection>>,
    /// Server started flag.
    pub started: AtomicBool,
}

impl ServerState {
    pub fn new(title: &str) -> Result<Self, DomError> {
        let document = Document::new(SyncContext::new(), title)?;
        document.add_script(CLIENT_SCRIPT_PATH)?;
        Ok(Self {
            document,
            connections: DashMap::new(),
            started: AtomicBool::new(false),
        })
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        self.document.context()
    }
}

/// HTTP/WebSocket server hosting one mirrored document.
pub struct WebServer {
    config: WebServerConfig,
    state: Arc<ServerState>,
}

impl WebServer {
    pub fn new(config: WebServerConfig) -> Result<Self, DomError> {
        let state = Arc::new(ServerState::new(&config.title)?);
        Ok(Self { config, state })
    }

    /// The listen address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    pub fn state(&self) -> Arc<ServerState> {
        self.state.clone()
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn is_started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.len()
    }

    /// Bind and start serving in a background task.
    pub async fn start(&self) -> Result<(), ChannelError> {
        if self.is_started() {
            return Ok(());
        }

        let addr = self.address();
        let router = create_router(self.state.clone());

        let listener_addr: std::net::SocketAddr =
            addr.parse().map_err(|err| ChannelError::Bind {
                addr: addr.clone(),
                reason: format!("invalid address: {err}"),
            })?;
        let listener = tokio::net::TcpListener::bind(listener_addr)
            .await
            .map_err(|err| ChannelError::Bind {
                addr: addr.clone(),
                reason: err.to_string(),
            })?;

        info!("serving at http://{}", addr);
        self.state.started.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                tracing::error!("server error: {}", err);
            }
        });

        Ok(())
    }

    /// Stop accepting work and drop every connection.
    pub async fn stop(&self) {
        if !self.is_started() {
            return;
        }
        self.state.started.store(false, Ordering::SeqCst);

        for entry in self.state.connections.iter() {
            entry.value().close();
            self.state.document.remove_connection(entry.key());
        }
        self.state.connections.clear();
        debug!("server stopped");
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

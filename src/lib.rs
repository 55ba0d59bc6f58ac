//! # MirrorDom
//!
//! Server-side DOM mirroring: a host-authoritative document tree whose
//! mutations are pushed, live, to every connected browser, with DOM events
//! routed back to host-side listeners.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`protocols`] - wire messages, transport trait, error types.
//! - [`core`] - the node tree and the synchronization layer.
//! - [`server`] - the HTTP/WebSocket server hosting a document.
//!
//! ## Quick start
//!
//! ```ignore
//! use mirrordom::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = WebServer::new(WebServerConfig::default())?;
//!     let doc = server.document();
//!
//!     let button = doc.context().create_element("button");
//!     button.set_text_content("Click me")?;
//!     button.add_event_listener("click", std::sync::Arc::new(|event| {
//!         println!("clicked: {:?}", event);
//!     }));
//!     doc.body().append_child(&button)?;
//!
//!     server.start().await?;
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub use mirrordom_core as core;
pub use mirrordom_protocols as protocols;
pub use mirrordom_server as server;

/// The common imports for building a mirrored application.
pub mod prelude {
    pub use mirrordom_core::{
        Document, DomEvent, ListenerId, Node, QueryHandle, SyncContext, WebNode, strip_sync_ids,
    };
    pub use mirrordom_protocols::{ChannelError, DomError, NodeId, Transport};
    pub use mirrordom_server::{WebServer, WebServerConfig};
}

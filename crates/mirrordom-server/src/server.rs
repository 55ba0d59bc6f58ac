//! HTTP server and routing.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tracing::debug;

use crate::{ServerState, WsConnection};

/// The browser-side client, embedded in the binary.
const CLIENT_JS: &str = include_str!("static/mirrordom.js");

/// Create the Axum router for the mirrored document.
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/mirrordom.js", get(serve_client))
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        .with_state(state)
}

/// Serve the current document rendering.
///
/// The markup carries the identity attributes the client uses to address
/// nodes, so a freshly loaded page and the host tree already agree.
async fn serve_index(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Html(state.document.render())
}

/// Serve the browser client script.
async fn serve_client() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], CLIENT_JS)
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a new WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    debug!("new WebSocket connection: {}", conn_id);

    let conn = WsConnection::spawn(conn_id.clone(), socket, state.clone());
    state.document.add_connection(conn.clone());
    state.connections.insert(conn_id, conn);
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let status = if state.started.load(std::sync::atomic::Ordering::SeqCst) {
        "ok"
    } else {
        "starting"
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({
            "status": status,
            "connections": state.connections.len(),
        })
        .to_string(),
    )
}

//! MCP over HTTP: JSON-RPC requests as `POST` bodies.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::McpServer;

pub fn router(server: McpServer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/mcp", post(mcp_handler))
        .route("/", post(mcp_handler).get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(server: McpServer, host: &str, port: u16) -> std::io::Result<()> {
    let listener = bind(host, port).await?;
    tracing::info!("MCP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(server)).await
}

/// Listen on `host:port`. `host` may be a name (`localhost`) or an address.
pub async fn bind(host: &str, port: u16) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port)).await
}

async fn health_check() -> &'static str {
    "OK"
}

async fn root_handler() -> &'static str {
    "kb-mcp server - use POST for JSON-RPC requests"
}

async fn mcp_handler(State(server): State<McpServer>, body: String) -> Response {
    match server.handle_str(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

//! Streamable-HTTP style transport: one JSON-RPC message per `POST /mcp`.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tracing::{error, info};

use super::server::McpServer;
use crate::transport::Transport;

pub fn router<T>(server: Arc<McpServer<T>>) -> Router
where
    T: Transport + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/mcp", post(handle_post::<T>))
        .with_state(server)
}

/// Serves MCP over HTTP until the process is killed. Tool calls block, so
/// each request is handed to the blocking pool.
pub fn serve<T>(server: McpServer<T>, host: &str, port: u16) -> anyhow::Result<()>
where
    T: Transport + Clone + Send + Sync + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // The blocking HTTP client must be dropped outside the runtime.
    let server = Arc::new(server);
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind((host, port)).await?;
        info!("MCP server listening on http://{}/mcp", listener.local_addr()?);
        axum::serve(listener, router(Arc::clone(&server))).await?;
        Ok(())
    })
}

async fn handle_post<T>(State(server): State<Arc<McpServer<T>>>, body: String) -> Response
where
    T: Transport + Clone + Send + Sync + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || server.handle_message(&body)).await;

    match outcome {
        Ok(Ok(reply)) if reply.is_empty() => StatusCode::ACCEPTED.into_response(),
        Ok(Ok(reply)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            reply,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to handle MCP request");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "MCP request task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

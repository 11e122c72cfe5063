//! HTTP transport for MCP server.
//!
//! This module provides a plain JSON-RPC-over-HTTP transport for the MCP
//! server, allowing remote agents and API integrations to connect.

use crate::error::McpError;
use crate::protocol::{
    INTERNAL_ERROR, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, PARSE_ERROR,
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// A request handed to the MCP server, with the slot for its reply.
///
/// The reply is `None` for notifications.
pub type RequestEnvelope = (JsonRpcRequest, oneshot::Sender<Option<JsonRpcResponse>>);

/// HTTP transport handler state.
pub struct HttpTransportState {
    /// Channel for sending requests to the MCP server.
    request_tx: mpsc::Sender<RequestEnvelope>,
}

impl HttpTransportState {
    /// Create a new HTTP transport state.
    pub fn new(request_tx: mpsc::Sender<RequestEnvelope>) -> Self {
        Self { request_tx }
    }
}

/// Create the HTTP router for MCP.
pub fn create_router(state: Arc<HttpTransportState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(
    State(state): State<Arc<HttpTransportState>>,
    body: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected MCP HTTP request body");
            // Well-formed JSON that is not a request object is an invalid request
            let code = match &rejection {
                JsonRejection::JsonDataError(_) => INVALID_REQUEST,
                _ => PARSE_ERROR,
            };
            let message = format!("Parse error: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(None, code, message)),
            )
                .into_response();
        }
    };

    let (response_tx, response_rx) = oneshot::channel();

    // Send request to MCP server
    if state.request_tx.send((request, response_tx)).await.is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JsonRpcResponse::error(
                None,
                INTERNAL_ERROR,
                "MCP server unavailable",
            )),
        )
            .into_response();
    }

    // Wait for response
    match response_rx.await {
        Ok(Some(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(JsonRpcResponse::error(
                None,
                INTERNAL_ERROR,
                "No response from MCP server",
            )),
        )
            .into_response(),
    }
}

/// Handle health check requests.
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "userdesk-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    bind_addr: String,
    state: Arc<HttpTransportState>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(bind_addr: impl Into<String>, request_tx: mpsc::Sender<RequestEnvelope>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            state: Arc::new(HttpTransportState::new(request_tx)),
        }
    }

    /// Run the HTTP server.
    pub async fn run(self) -> Result<(), McpError> {
        let app = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| {
                McpError::StartupFailed(format!("Failed to bind to {}: {}", self.bind_addr, e))
            })?;

        tracing::info!(addr = %self.bind_addr, "MCP HTTP server listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Router whose "server" echoes the method name, or stays silent for notifications.
    fn echo_router() -> Router {
        let (tx, mut rx) = mpsc::channel::<RequestEnvelope>(4);
        tokio::spawn(async move {
            while let Some((request, reply)) = rx.recv().await {
                let response = (!request.is_notification()).then(|| {
                    JsonRpcResponse::success(request.id.clone(), json!({"echo": request.method}))
                });
                let _ = reply.send(response);
            }
        });
        create_router(Arc::new(HttpTransportState::new(tx)))
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (tx, _rx) = mpsc::channel(1);
        let state = Arc::new(HttpTransportState::new(tx));
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_forwards_request() {
        let response = echo_router()
            .oneshot(post_json(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["echo"], "ping");
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let response = echo_router()
            .oneshot(post_json(
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_rpc_parse_error() {
        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from("{\"jsonrpc\": \"2.0\", \"id\": 1,"))
            .unwrap();

        let response = echo_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_server_gone_is_internal_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let app = create_router(Arc::new(HttpTransportState::new(tx)));

        let response = app
            .oneshot(post_json(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

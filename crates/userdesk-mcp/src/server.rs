//! MCP server implementation.
//!
//! This module provides the main MCP server that dispatches JSON-RPC requests
//! to the resource provider and the tool executor, and drives the stdio and
//! HTTP transports.

use crate::error::{McpError, ResourceError};
use crate::executor::ToolExecutor;
use crate::http_transport::{HttpServer, RequestEnvelope};
use crate::protocol::*;
use crate::resources::ResourceProvider;
use crate::tools::ToolRegistry;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use userdesk_core::config::{McpConfig, Transport};
use userdesk_core::UserStore;
use userdesk_llm::CompletionClient;

/// The MCP server.
#[derive(Clone)]
pub struct McpServer {
    config: McpConfig,
    tools: ToolRegistry,
    resources: ResourceProvider,
    executor: ToolExecutor,
}

impl McpServer {
    /// Create a new MCP server over the given store and completion client.
    pub fn new(
        config: McpConfig,
        store: Arc<dyn UserStore>,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config,
            tools: ToolRegistry::with_builtin_tools(),
            resources: ResourceProvider::new(store.clone()),
            executor: ToolExecutor::new(store, completion),
        }
    }

    /// Set the model `create-random-users` uses when the caller does not pick one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.executor = self.executor.with_default_model(model);
        self
    }

    /// Get a reference to the tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Start the MCP server.
    pub async fn run(&self) -> Result<(), McpError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => self.run_http().await,
        }
    }

    /// Run the server with stdio transport.
    async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!("Starting MCP server with stdio transport");
        self.serve_lines(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing replies to `writer`.
    ///
    /// Returns when `reader` reaches EOF.
    pub async fn serve_lines<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim()).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Received a line that is not UTF-8");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let mut response_json = serde_json::to_string(&response)?;
                response_json.push('\n');
                writer.write_all(response_json.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        tracing::info!("stdin closed, stopping MCP server");
        Ok(())
    }

    /// Run the server with HTTP transport.
    pub async fn run_http(&self) -> Result<(), McpError> {
        tracing::info!(
            addr = %self.config.bind_addr(),
            "Starting MCP server with HTTP transport"
        );

        // Create channel for request handling
        let (request_tx, mut request_rx) = mpsc::channel::<RequestEnvelope>(100);

        // Requests are handled one at a time by a single task
        let server = self.clone();
        tokio::spawn(async move {
            while let Some((request, response_tx)) = request_rx.recv().await {
                let response = server.handle_message(request).await;
                let _ = response_tx.send(response);
            }
        });

        // Start HTTP server
        let http_server = HttpServer::new(self.config.bind_addr(), request_tx);
        http_server.run().await
    }

    /// Handle one raw line from a stream transport.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Received invalid JSON");
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        // Replies from the client to server-initiated requests; we never send any
        if value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some())
        {
            tracing::debug!("Ignoring JSON-RPC response from client");
            return None;
        }

        let id = value.get("id").cloned();
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_message(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {}", e),
            )),
        }
    }

    /// Handle a request or notification. Notifications produce no response.
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }
        Some(self.handle_request(request).await)
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        tracing::debug!(method = %request.method, "Handling request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "resources/list" => self.handle_list_resources(id).await,
            "resources/templates/list" => self.handle_list_resource_templates(id),
            "resources/read" => self.handle_read_resource(id, request.params).await,
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "userdesk",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "resources": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let response = ListToolsResponse {
            tools: self.tools.list().into_iter().cloned().collect(),
        };
        to_success(id, &response)
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match parse_params(params) {
            Ok(params) => params,
            Err(message) => return JsonRpcResponse::error(id, INVALID_PARAMS, message),
        };

        // Check if tool exists
        let Some(tool) = self.tools.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Tool not found: {}", params.name),
            );
        };

        tracing::info!(tool = %tool.name, "Calling tool");
        let result = self.executor.execute(tool, params.arguments).await;
        to_success(id, &CallToolResponse::from(result))
    }

    async fn handle_list_resources(&self, id: Option<Value>) -> JsonRpcResponse {
        match self.resources.list().await {
            Ok(resources) => to_success(id, &ListResourcesResponse { resources }),
            Err(e) => resource_error(id, e),
        }
    }

    fn handle_list_resource_templates(&self, id: Option<Value>) -> JsonRpcResponse {
        let response = ListResourceTemplatesResponse {
            resource_templates: self.resources.templates(),
        };
        to_success(id, &response)
    }

    async fn handle_read_resource(
        &self,
        id: Option<Value>,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let params: ReadResourceParams = match parse_params(params) {
            Ok(params) => params,
            Err(message) => return JsonRpcResponse::error(id, INVALID_PARAMS, message),
        };

        match self.resources.read(&params.uri).await {
            Ok(contents) => to_success(id, &ReadResourceResponse { contents }),
            Err(e) => resource_error(id, e),
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, json!(null))
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    match params {
        Some(p) => serde_json::from_value(p).map_err(|e| format!("Invalid params: {}", e)),
        None => Err("Missing params".to_string()),
    }
}

fn to_success<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
    }
}

fn resource_error(id: Option<Value>, error: ResourceError) -> JsonRpcResponse {
    if error.code() == INTERNAL_ERROR {
        tracing::error!(error = %error, "Resource request failed");
    }
    JsonRpcResponse::error(id, error.code(), error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::GENERATION_FAILED_MESSAGE;
    use crate::test_support::{MemoryUserStore, ScriptedCompletion};

    fn server_with(completion: ScriptedCompletion) -> (McpServer, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::with_users(&[
            ("Ann", "a@x.com", "1 Rd"),
            ("Bo", "b@x.com", "2 Rd"),
        ]));
        let server = McpServer::new(McpConfig::default(), store.clone(), Arc::new(completion));
        (server, store)
    }

    fn server() -> McpServer {
        server_with(ScriptedCompletion::replying("")).0
    }

    async fn call(server: &McpServer, method: &str, params: Option<Value>) -> JsonRpcResponse {
        server
            .handle_request(JsonRpcRequest::new(1, method, params))
            .await
    }

    fn error_code(response: &JsonRpcResponse) -> i32 {
        response.error.as_ref().expect("expected an error").code
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(&server(), "initialize", None).await;
        let result = response.result.unwrap();

        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "userdesk");
        assert!(result["capabilities"]["resources"].is_object());
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = call(&server(), "tools/list", None).await;
        let tools = response.result.unwrap()["tools"].clone();

        let names: Vec<_> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["create-random-users", "getUser"]);
        assert_eq!(tools[0]["annotations"]["title"], "Create User");
        assert!(tools[1]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_call_get_user() {
        let response = call(
            &server(),
            "tools/call",
            Some(json!({"name": "getUser"})),
        )
        .await;
        let result = response.result.unwrap();

        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "Fetched 2 users from the database.");
    }

    #[tokio::test]
    async fn test_call_create_random_users() {
        let (server, store) = server_with(ScriptedCompletion::replying(
            "```json\n{\"name\":\"Cy\",\"email\":\"c@x.com\",\"address\":\"3 Rd\"}\n```",
        ));

        let response = call(
            &server,
            "tools/call",
            Some(json!({"name": "create-random-users", "arguments": {}})),
        )
        .await;
        let result = response.result.unwrap();

        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "Successfully created user with ID: 3");
        assert_eq!(store.get_user(3).await.unwrap().name, "Cy");
    }

    #[tokio::test]
    async fn test_call_create_random_users_failure_is_content() {
        let (server, store) = server_with(ScriptedCompletion::failing(500));

        let response = call(
            &server,
            "tools/call",
            Some(json!({"name": "create-random-users"})),
        )
        .await;

        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], GENERATION_FAILED_MESSAGE);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_call_nonexistent_tool() {
        let response = call(
            &server(),
            "tools/call",
            Some(json!({
                "name": "nonexistent",
                "arguments": {}
            })),
        )
        .await;

        assert_eq!(error_code(&response), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_call_tool_without_params() {
        let response = call(&server(), "tools/call", None).await;
        assert_eq!(error_code(&response), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_list_resources() {
        let response = call(&server(), "resources/list", None).await;
        let resources = response.result.unwrap()["resources"].clone();

        assert_eq!(resources[0]["uri"], "user://list");
        assert_eq!(resources[1]["uri"], "user://1/profile");
        assert_eq!(resources[1]["name"], "User 1 - Ann");
        assert_eq!(resources[2]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_list_resource_templates() {
        let response = call(&server(), "resources/templates/list", None).await;
        let templates = response.result.unwrap()["resourceTemplates"].clone();

        assert_eq!(templates[0]["uriTemplate"], "user://{userId}/profile");
        assert_eq!(templates[0]["name"], "user-details");
    }

    #[tokio::test]
    async fn test_read_user_list() {
        let response = call(
            &server(),
            "resources/read",
            Some(json!({"uri": "user://list"})),
        )
        .await;
        let contents = response.result.unwrap()["contents"].clone();

        assert_eq!(contents[0]["mimeType"], "application/json");
        let users: Value = serde_json::from_str(contents[0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(users[0]["name"], "Ann");
        assert_eq!(users[1]["name"], "Bo");
    }

    #[tokio::test]
    async fn test_read_missing_profile() {
        let response = call(
            &server(),
            "resources/read",
            Some(json!({"uri": "user://3/profile"})),
        )
        .await;

        assert_eq!(error_code(&response), RESOURCE_NOT_FOUND);
        assert_eq!(response.error.unwrap().message, "User 3 not found");
    }

    #[tokio::test]
    async fn test_read_invalid_profile_id() {
        let response = call(
            &server(),
            "resources/read",
            Some(json!({"uri": "user://abc/profile"})),
        )
        .await;

        assert_eq!(error_code(&response), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&server(), "prompts/list", None).await;
        assert_eq!(error_code(&response), METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let request: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();

        assert!(server().handle_message(request).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_lines() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "\n",
            "this is not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n",
        );
        let mut output = Vec::new();

        server()
            .serve_lines(input.as_bytes(), &mut output)
            .await
            .unwrap();

        let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, Some(json!(1)));
        assert_eq!(responses[1].error.as_ref().unwrap().code, PARSE_ERROR);
        assert_eq!(responses[1].id, None);
        assert_eq!(responses[2].id, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_serve_lines_survives_invalid_utf8() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}");
        let mut output = Vec::new();

        server()
            .serve_lines(input.as_slice(), &mut output)
            .await
            .unwrap();

        let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, Some(json!(1)));
        assert_eq!(responses[1].id, None);
        assert_eq!(responses[1].error.as_ref().unwrap().code, PARSE_ERROR);
        assert_eq!(responses[2].id, Some(json!(2)));
        assert!(responses[2].error.is_none());
    }

    #[tokio::test]
    async fn test_read_user_list_store_failure() {
        let store = Arc::new(MemoryUserStore::default().failing_reads());
        let server = McpServer::new(
            McpConfig::default(),
            store,
            Arc::new(ScriptedCompletion::replying("")),
        );

        let response = call(
            &server,
            "resources/read",
            Some(json!({"uri": crate::resources::USER_LIST_URI})),
        )
        .await;
        assert_eq!(error_code(&response), INTERNAL_ERROR);

        let response = call(
            &server,
            "resources/read",
            Some(json!({"uri": "user://1/profile"})),
        )
        .await;
        assert_eq!(error_code(&response), INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_id() {
        let response = server()
            .handle_line("{\"jsonrpc\":\"2.0\",\"id\":9,\"params\":{}}")
            .await
            .unwrap();

        assert_eq!(response.id, Some(json!(9)));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }
}

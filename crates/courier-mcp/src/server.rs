//! MCP server implementation
//!
//! This module provides the tool dispatcher for a Courier adapter process:
//! a static name-to-handler registry behind the MCP `tools/list` and
//! `tools/call` methods.
//!
//! The one cross-cutting guarantee lives here: every handler failure,
//! including errors raised deep inside credential refresh or job polling,
//! is caught at [`McpServer::call_tool`] and converted into the uniform
//! `{success:false, error}` envelope. The host process always receives a
//! well-formed JSON response.

use crate::poll::PollError;
use crate::types::*;
use async_trait::async_trait;
use courier_auth::{AuthError, CredentialStore};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Dispatch error types.
///
/// These never cross the stdio boundary directly; `call_tool` flattens them
/// into the failure envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler registered under the requested name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's input schema
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Credential lookup or refresh failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Vendor API returned a non-2xx response
    #[error("Vendor error ({status}): {message}")]
    Vendor {
        /// HTTP status code.
        status: u16,
        /// Message taken from the provider body.
        message: String,
    },

    /// Async vendor job failed or timed out
    #[error(transparent)]
    Job(#[from] PollError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for tool handlers.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope>;
}

/// Context for tool execution.
///
/// Carries the per-request correlation ID and an optional shared credential
/// store for handlers that talk to an authenticated vendor. The store is an
/// explicitly owned instance; there is no process-global credential state.
#[derive(Clone)]
pub struct ToolContext {
    /// Request correlation ID
    pub correlation_id: String,

    /// Shared credential store, when the adapter is authenticated
    pub store: Option<Arc<CredentialStore>>,
}

impl ToolContext {
    /// Create an empty context with a fresh correlation ID.
    pub fn empty() -> Self {
        Self {
            correlation_id: uuid::Uuid::now_v7().to_string(),
            store: None,
        }
    }

    /// Attach a credential store.
    pub fn with_store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }
}

/// MCP server for one adapter process.
///
/// Tools are registered at startup and enumerated once per session; calls
/// arrive strictly sequentially off the stdio queue.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,

    /// Credential store injected into each call's context
    store: Option<Arc<CredentialStore>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities { list_changed: false }),
                experimental: HashMap::new(),
            },
            tools: Arc::new(RwLock::new(HashMap::new())),
            store: None,
        }
    }

    /// Create with default Courier configuration.
    pub fn courier() -> Self {
        Self::new("courier-mcp", env!("CARGO_PKG_VERSION"))
    }

    /// Attach the adapter's credential store.
    pub fn with_store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a tool.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        let mut tools = self.tools.write().await;
        tools.insert(name, tool);
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools.values().map(|t| t.definition()).collect()
    }

    /// Get tools by vendor.
    pub async fn list_tools_by_vendor(&self, vendor: Vendor) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        tools
            .values()
            .map(|t| t.definition())
            .filter(|d| d.vendor == Some(vendor))
            .collect()
    }

    /// Execute a tool, wrapping every failure into the uniform envelope.
    ///
    /// This never returns an error: unknown names, invalid arguments, auth
    /// failures, vendor errors, and job failures all come back as
    /// `ToolResult { isError: true }` carrying `{success:false, error}`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> ToolResult {
        let envelope = match self.dispatch(name, arguments, context).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool call failed");
                ToolEnvelope::err(e.to_string())
            }
        };
        ToolResult::from_envelope(&envelope)
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let tools = self.tools.read().await;
        let tool = tools
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;

        debug!(tool = name, correlation_id = %context.correlation_id, "Dispatching tool call");
        tool.execute(arguments, context).await
    }

    /// Handle an MCP request.
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id).await,
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => McpResponse::error(request.id, McpError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&self, id: RequestId) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let mut context = ToolContext::empty();
        if let Some(ref store) = self.store {
            context = context.with_store(store.clone());
        }

        let result = self.call_tool(&call.name, call.arguments, &context).await;
        match serde_json::to_value(&result) {
            Ok(value) => McpResponse::success(id, value),
            Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}

//! # Courier MCP
//!
//! This crate provides the MCP (Model Context Protocol) server toolkit for
//! Courier SaaS adapters: tool dispatch over a line-delimited JSON-RPC stdio
//! protocol, a fixed-interval poller for asynchronous vendor jobs, and the
//! vendor HTTP clients the bundled tools are built on.
//!
//! ## Overview
//!
//! The courier-mcp crate handles:
//! - **Protocol**: JSON-RPC request/response types and the stdio loop
//! - **Dispatch**: tool registration, lookup, and the uniform error envelope
//! - **Polling**: start-job-then-poll for vendor export/upload jobs
//! - **Clients**: HTTP clients for the mail and design vendor APIs
//!
//! ## Protocol
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! Every `tools/call` result carries a JSON envelope `{success, data|error}`
//! as its text content. Handler failures never cross the stdio boundary as
//! exceptions: the dispatcher converts them into `{success:false, error}`
//! so the host always receives a well-formed response.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use courier_mcp::{McpServer, Tool, ToolContext, ToolDefinition, ToolEnvelope, Vendor};
//! use courier_mcp::server::DispatchResult;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct MyTool;
//!
//! #[async_trait]
//! impl Tool for MyTool {
//!     fn definition(&self) -> ToolDefinition {
//!         ToolDefinition::new("my_tool", "Does something useful")
//!             .with_vendor(Vendor::Gmail)
//!     }
//!
//!     async fn execute(
//!         &self,
//!         args: serde_json::Value,
//!         context: &ToolContext,
//!     ) -> DispatchResult<ToolEnvelope> {
//!         Ok(ToolEnvelope::ok(serde_json::json!({"done": true})))
//!     }
//! }
//!
//! async fn setup() {
//!     let server = McpServer::courier();
//!     server.register_tool(Arc::new(MyTool)).await;
//!
//!     let tools = server.list_tools().await;
//!     println!("Registered {} tools", tools.len());
//! }
//! ```

pub mod clients;
pub mod datetime;
pub mod poll;
pub mod server;
pub mod stdio;
pub mod tools;
pub mod types;

// Re-export main types
pub use datetime::{parse_relative_datetime, ParseError};
pub use poll::{await_completion, JobHandle, JobState, JobStatus, PollConfig, PollError};
pub use server::{DispatchError, DispatchResult, McpServer, Tool, ToolContext};
pub use stdio::{handle_line, serve};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolEnvelope, ToolResult, Vendor,
};

// Re-export tool collections
pub use tools::all_tools;

// Re-export vendor clients
pub use clients::{AdapterConfig, DesignClient, MailClient, VendorEndpoint};

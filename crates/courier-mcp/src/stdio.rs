//! Newline-delimited JSON-RPC transport over stdin/stdout
//!
//! Each request arrives as a single line of JSON and each response leaves as
//! a single line. Diagnostics go to stderr via tracing so stdout stays a
//! clean protocol channel.

use crate::server::McpServer;
use crate::types::{McpError, McpResponse, RequestId};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

/// Handle a single line of input, returning the serialized response.
///
/// Blank lines are skipped (returns `None`). Malformed JSON produces a
/// parse error response addressed to a null ID, since the request ID could
/// not be recovered.
pub async fn handle_line(server: &McpServer, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let response = match serde_json::from_str(line) {
        Ok(request) => server.handle_request(request).await,
        Err(e) => {
            error!("Failed to parse request: {}", e);
            McpResponse::error(RequestId::Null, McpError::parse_error())
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            // A response that cannot serialize is an internal bug; answer
            // with a minimal error rather than dropping the request.
            error!("Failed to serialize response: {}", e);
            let fallback =
                McpResponse::error(RequestId::Null, McpError::internal_error(e.to_string()));
            serde_json::to_string(&fallback).ok()
        }
    }
}

/// Run the server over stdin/stdout until stdin closes.
pub async fn serve(server: McpServer) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    debug!("stdio transport listening");

    while let Some(line) = lines.next_line().await? {
        if let Some(response) = handle_line(&server, &line).await {
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    debug!("stdin closed, shutting down");
    Ok(())
}

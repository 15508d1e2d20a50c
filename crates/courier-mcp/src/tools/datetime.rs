//! Datetime parsing tool

use crate::datetime::parse_relative_datetime;
use crate::server::{DispatchError, DispatchResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolEnvelope};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

/// Tool to resolve a human-friendly datetime expression to RFC 3339.
pub struct ParseDatetimeTool;

#[derive(Debug, Deserialize)]
struct ParseDatetimeArgs {
    input: String,
}

#[async_trait]
impl Tool for ParseDatetimeTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "parse_datetime",
            "Resolve expressions like 'tomorrow 3pm' to an RFC 3339 timestamp",
        )
        .with_category("utility")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "Datetime expression ('today', 'tomorrow 3pm', or RFC 3339)"
                }
            },
            "required": ["input"]
        }))
    }

    #[instrument(skip(self, _context), fields(tool = "parse_datetime"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let params: ParseDatetimeArgs = serde_json::from_value(args)
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        let resolved = parse_relative_datetime(&params.input, Utc::now())
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        Ok(ToolEnvelope::ok(serde_json::json!({
            "input": params.input,
            "resolved": resolved.to_rfc3339(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ToolContext;

    #[tokio::test]
    async fn test_parse_datetime_tool_resolves_rfc3339_input() {
        let tool = ParseDatetimeTool;
        let envelope = tool
            .execute(
                serde_json::json!({ "input": "2025-06-01T09:30:00Z" }),
                &ToolContext::empty(),
            )
            .await
            .unwrap();

        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data["resolved"], "2025-06-01T09:30:00+00:00");
    }

    #[tokio::test]
    async fn test_parse_datetime_tool_rejects_garbage() {
        let tool = ParseDatetimeTool;
        let result = tool
            .execute(
                serde_json::json!({ "input": "sometime soonish" }),
                &ToolContext::empty(),
            )
            .await;

        assert!(matches!(result, Err(DispatchError::InvalidParams(_))));
    }
}

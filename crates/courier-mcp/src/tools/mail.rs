//! Mail adapter tools
//!
//! Tools for listing and sending messages through the mail vendor API.
//! Each invocation fetches a valid access token from the credential store
//! first; a 401 from the vendor invalidates the cached token so the next
//! call forces a refresh.

use crate::clients::{MailClient, MailError};
use crate::clients::mail::ListMessagesParams as ClientListParams;
use crate::server::{DispatchError, DispatchResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolEnvelope, Vendor};
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use courier_auth::CredentialStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Map a mail client error into a dispatch error.
///
/// A 401 means the vendor rejected our token even though the store considered
/// it valid, so the cached credential is dropped before reporting the error.
async fn map_mail_error(store: &CredentialStore, err: MailError) -> DispatchError {
    match err {
        MailError::AuthenticationFailed => {
            warn!("Vendor rejected access token, invalidating cached credential");
            store.invalidate().await;
            DispatchError::Vendor {
                status: 401,
                message: "access token rejected by mail API".to_string(),
            }
        }
        MailError::ApiError { status, message } => DispatchError::Vendor { status, message },
        other => DispatchError::Internal(other.to_string()),
    }
}

/// Tool to list messages matching a search query.
pub struct ListMessagesTool {
    client: MailClient,
    store: Arc<CredentialStore>,
}

impl ListMessagesTool {
    pub fn new(client: MailClient, store: Arc<CredentialStore>) -> Self {
        Self { client, store }
    }
}

#[derive(Debug, Deserialize)]
struct ListMessagesArgs {
    #[serde(default)]
    query: String,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

#[async_trait]
impl Tool for ListMessagesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("mail_list_messages", "List mail messages matching a query")
            .with_vendor(Vendor::Gmail)
            .with_category("mail")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (e.g. 'is:unread from:boss@example.com')"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of messages to return",
                        "default": 10
                    }
                }
            }))
    }

    #[instrument(skip(self, _context), fields(tool = "mail_list_messages"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let params: ListMessagesArgs = serde_json::from_value(args)
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        let token = self.store.get_valid_token().await?;

        debug!(query = %params.query, "Listing messages");

        let response = self
            .client
            .list_messages(
                &token.access_token,
                ClientListParams {
                    query: params.query,
                    max_results: params.max_results,
                },
            )
            .await;

        match response {
            Ok(list) => Ok(ToolEnvelope::ok(serde_json::json!({
                "messages": list.messages,
                "result_size_estimate": list.result_size_estimate,
            }))),
            Err(e) => Err(map_mail_error(&self.store, e).await),
        }
    }
}

/// Tool to send a message.
///
/// Assembles an RFC 2822 message from the structured arguments, then base64
/// url-encodes it the way the vendor's send endpoint expects.
pub struct SendMessageTool {
    client: MailClient,
    store: Arc<CredentialStore>,
}

impl SendMessageTool {
    pub fn new(client: MailClient, store: Arc<CredentialStore>) -> Self {
        Self { client, store }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    to: String,
    subject: String,
    body: String,
}

/// Build the raw RFC 2822 message and encode it for the send endpoint.
fn encode_raw_message(to: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{body}"
    );
    URL_SAFE_NO_PAD.encode(message.as_bytes())
}

#[async_trait]
impl Tool for SendMessageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("mail_send_message", "Send a plain-text mail message")
            .with_vendor(Vendor::Gmail)
            .with_category("mail")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "to": {
                        "type": "string",
                        "description": "Recipient address"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Message subject"
                    },
                    "body": {
                        "type": "string",
                        "description": "Plain-text message body"
                    }
                },
                "required": ["to", "subject", "body"]
            }))
    }

    #[instrument(skip(self, _context), fields(tool = "mail_send_message"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let params: SendMessageArgs = serde_json::from_value(args)
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        let token = self.store.get_valid_token().await?;

        debug!(to = %params.to, "Sending message");

        let raw = encode_raw_message(&params.to, &params.subject, &params.body);

        match self.client.send_message(&token.access_token, &raw).await {
            Ok(sent) => Ok(ToolEnvelope::ok(serde_json::json!({
                "id": sent.id,
                "thread_id": sent.thread_id,
            }))),
            Err(e) => Err(map_mail_error(&self.store, e).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_raw_message_is_url_safe() {
        let raw = encode_raw_message("a@example.com", "Hi there?", "body & more");
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
        assert!(!raw.contains('='));

        let decoded = URL_SAFE_NO_PAD.decode(&raw).unwrap();
        let text = String::from_utf8(decoded).unwrap();
        assert!(text.starts_with("To: a@example.com\r\n"));
        assert!(text.contains("Subject: Hi there?\r\n"));
        assert!(text.ends_with("\r\n\r\nbody & more"));
    }

    #[test]
    fn test_list_args_defaults() {
        let args: ListMessagesArgs = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(args.query, "");
        assert_eq!(args.max_results, 10);
    }
}

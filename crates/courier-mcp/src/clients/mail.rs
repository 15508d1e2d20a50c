//! Mail service client.
//!
//! HTTP client for the Gmail v1 REST surface. Each method performs a single
//! request with the caller's bearer token; the token itself comes from the
//! credential store, so a 401 here means the store's cache needs
//! invalidating.

use super::config::VendorEndpoint;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Mail client errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The access token was rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// Mail service client.
#[derive(Clone)]
pub struct MailClient {
    /// HTTP client instance.
    client: Client,

    /// Vendor endpoint configuration.
    endpoint: VendorEndpoint,
}

impl MailClient {
    /// Create a new mail client.
    pub fn new(endpoint: VendorEndpoint, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, endpoint }
    }

    /// List message IDs matching a query.
    #[instrument(skip(self, token), fields(query = %params.query))]
    pub async fn list_messages(
        &self,
        token: &str,
        params: ListMessagesParams,
    ) -> Result<ListMessagesResponse, MailError> {
        debug!("Listing messages");

        let url = self.endpoint.url("/gmail/v1/users/me/messages");
        let max_results = params.max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", params.query.as_str()),
                ("maxResults", max_results.as_str()),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a single message with its metadata.
    #[instrument(skip(self, token), fields(message_id = %message_id))]
    pub async fn get_message(&self, token: &str, message_id: &str) -> Result<Message, MailError> {
        debug!("Fetching message");

        let url = self
            .endpoint
            .url(&format!("/gmail/v1/users/me/messages/{}", message_id));
        let response = self
            .client
            .get(&url)
            .query(&[("format", "metadata")])
            .bearer_auth(token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Send a raw RFC 2822 message (base64url-encoded).
    #[instrument(skip(self, token, raw))]
    pub async fn send_message(
        &self,
        token: &str,
        raw: &str,
    ) -> Result<SendMessageResponse, MailError> {
        debug!("Sending message");

        let url = self.endpoint.url("/gmail/v1/users/me/messages/send");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, MailError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Mail API rejected the access token");
            return Err(MailError::AuthenticationFailed);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Mail API error ({}): {}", status.as_u16(), message);
            return Err(MailError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))
    }
}

/// Parameters for listing messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesParams {
    /// Gmail search query (e.g. "is:unread from:boss@example.com").
    #[serde(default)]
    pub query: String,

    /// Maximum results.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

/// Response from the list messages request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    /// Matching message references.
    #[serde(default)]
    pub messages: Vec<MessageRef>,

    /// Estimated total result count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_size_estimate: Option<u32>,
}

/// A message reference (ID pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message ID.
    pub id: String,

    /// Thread ID.
    pub thread_id: String,
}

/// A message with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID.
    pub id: String,

    /// Thread ID.
    pub thread_id: String,

    /// Snippet of the body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Label IDs applied to the message.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

/// Response from the send message request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Message ID of the sent message.
    pub id: String,

    /// Thread ID.
    pub thread_id: String,

    /// Label IDs applied to the message.
    #[serde(default)]
    pub label_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .and(query_param("q", "is:unread"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [{"id": "m1", "threadId": "t1"}],
                "resultSizeEstimate": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MailClient::new(VendorEndpoint::new(server.uri()), Duration::from_secs(5));
        let resp = client
            .list_messages(
                "tok",
                ListMessagesParams {
                    query: "is:unread".to_string(),
                    max_results: 10,
                },
            )
            .await
            .unwrap();

        assert_eq!(resp.messages.len(), 1);
        assert_eq!(resp.messages[0].id, "m1");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gmail/v1/users/me/messages"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = MailClient::new(VendorEndpoint::new(server.uri()), Duration::from_secs(5));
        let err = client
            .list_messages("expired", ListMessagesParams {
                query: String::new(),
                max_results: 10,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MailError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn test_api_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .respond_with(
                ResponseTemplate::new(429).set_body_string("rate limit exceeded"),
            )
            .mount(&server)
            .await;

        let client = MailClient::new(VendorEndpoint::new(server.uri()), Duration::from_secs(5));
        let err = client.send_message("tok", "cmF3").await.unwrap_err();

        match err {
            MailError::ApiError { status, message } => {
                assert_eq!(status, 429);
                assert!(message.contains("rate limit"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }
}

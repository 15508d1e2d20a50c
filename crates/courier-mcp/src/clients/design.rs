//! Design export client.
//!
//! HTTP client for the design vendor's export API (Canva REST v1 shape).
//! Exports are asynchronous server-side jobs: `create_export` starts one and
//! returns a handle, `get_export` fetches its current state for the poll
//! loop in the export tool.

use super::config::VendorEndpoint;
use crate::poll::JobState;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Design client errors.
#[derive(Debug, Error)]
pub enum DesignError {
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

/// Design export client.
#[derive(Clone)]
pub struct DesignClient {
    /// HTTP client instance.
    client: Client,

    /// Vendor endpoint configuration.
    endpoint: VendorEndpoint,
}

impl DesignClient {
    /// Create a new design client.
    pub fn new(endpoint: VendorEndpoint, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, endpoint }
    }

    /// Start an export job for a design.
    #[instrument(skip(self, token), fields(design_id = %params.design_id, format = %params.format))]
    pub async fn create_export(
        &self,
        token: &str,
        params: CreateExportParams,
    ) -> Result<ExportJob, DesignError> {
        debug!("Starting export job");

        let url = self.endpoint.url("/rest/v1/exports");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&params)
            .send()
            .await?;

        let wrapper: ExportJobResponse = self.handle_response(response).await?;
        Ok(wrapper.job)
    }

    /// Fetch the current state of an export job.
    #[instrument(skip(self, token), fields(job_id = %job_id))]
    pub async fn get_export(&self, token: &str, job_id: &str) -> Result<ExportJob, DesignError> {
        let url = self.endpoint.url(&format!("/rest/v1/exports/{}", job_id));
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let wrapper: ExportJobResponse = self.handle_response(response).await?;
        Ok(wrapper.job)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<T, DesignError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Design API rejected the access token");
            return Err(DesignError::AuthenticationFailed);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("Design API error ({}): {}", status.as_u16(), message);
            return Err(DesignError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DesignError::InvalidResponse(e.to_string()))
    }
}

/// Parameters for starting an export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExportParams {
    /// Design ID to export.
    pub design_id: String,

    /// Export format ("png", "pdf", "mp4").
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "png".to_string()
}

/// An export job as reported by the vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Job ID used for status polling.
    #[serde(rename = "id")]
    pub job_id: String,

    /// Status string: "in_progress", "success", or "failed".
    pub status: String,

    /// Download URLs, present once the job has succeeded.
    #[serde(default)]
    pub urls: Vec<String>,

    /// Failure reason, if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportJob {
    /// Map the vendor status into a poll state, consuming the job.
    pub fn into_state(self) -> JobState<ExportJob> {
        if self.status == "success" || self.status == "completed" {
            JobState::Success(self)
        } else if self.status == "failed" || self.status == "error" {
            let reason = self
                .error
                .unwrap_or_else(|| "export failed without a reason".to_string());
            JobState::Failed(reason)
        } else {
            JobState::Pending
        }
    }
}

/// Wire wrapper around an export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportJobResponse {
    job: ExportJob,
}

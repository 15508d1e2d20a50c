//! Design adapter tools
//!
//! The export tool starts a job on the design vendor and polls it to
//! completion before answering; the status tool reports a single snapshot of
//! a job that is already running.

use crate::clients::design::CreateExportParams;
use crate::clients::{DesignClient, DesignError, ExportJob};
use crate::poll::{await_completion, PollConfig, PollError};
use crate::server::{DispatchError, DispatchResult, Tool, ToolContext};
use crate::types::{ToolDefinition, ToolEnvelope, Vendor};
use async_trait::async_trait;
use courier_auth::CredentialStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Map a design client error into a dispatch error, invalidating the cached
/// credential when the vendor rejects the token.
async fn map_design_error(store: &CredentialStore, err: DesignError) -> DispatchError {
    match err {
        DesignError::AuthenticationFailed => {
            warn!("Vendor rejected access token, invalidating cached credential");
            store.invalidate().await;
            DispatchError::Vendor {
                status: 401,
                message: "access token rejected by design API".to_string(),
            }
        }
        DesignError::ApiError { status, message } => DispatchError::Vendor { status, message },
        other => DispatchError::Internal(other.to_string()),
    }
}

fn job_payload(job: &ExportJob) -> serde_json::Value {
    serde_json::json!({
        "job_id": job.job_id,
        "status": job.status,
        "urls": job.urls,
    })
}

/// Tool to export a design and wait for the result.
///
/// The vendor processes exports asynchronously, so this starts the job and
/// polls its status at a fixed interval until it reaches a terminal state or
/// the deadline passes.
pub struct ExportDesignTool {
    client: DesignClient,
    store: Arc<CredentialStore>,
    poll: PollConfig,
}

impl ExportDesignTool {
    pub fn new(client: DesignClient, store: Arc<CredentialStore>, poll: PollConfig) -> Self {
        Self {
            client,
            store,
            poll,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportDesignArgs {
    design_id: String,
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "png".to_string()
}

#[async_trait]
impl Tool for ExportDesignTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "design_export",
            "Export a design and wait for the download URLs",
        )
        .with_vendor(Vendor::Design)
        .with_category("design")
        .with_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "design_id": {
                    "type": "string",
                    "description": "The design ID to export"
                },
                "format": {
                    "type": "string",
                    "description": "Export format ('png', 'pdf', 'mp4')",
                    "default": "png"
                }
            },
            "required": ["design_id"]
        }))
    }

    #[instrument(skip(self, _context), fields(tool = "design_export"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let params: ExportDesignArgs = serde_json::from_value(args)
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        let token = self.store.get_valid_token().await?;

        debug!(design_id = %params.design_id, "Starting export job");

        let job = self
            .client
            .create_export(
                &token.access_token,
                CreateExportParams {
                    design_id: params.design_id,
                    format: params.format,
                },
            )
            .await;

        let job = match job {
            Ok(job) => job,
            Err(e) => return Err(map_design_error(&self.store, e).await),
        };

        let client = self.client.clone();
        let access = token.access_token.clone();
        let job_id = job.job_id.clone();

        let finished = await_completion(&self.poll, move || {
            let client = client.clone();
            let access = access.clone();
            let job_id = job_id.clone();
            async move {
                let job = client
                    .get_export(&access, &job_id)
                    .await
                    .map_err(|e| PollError::Fetch(e.to_string()))?;
                Ok(job.into_state())
            }
        })
        .await?;

        Ok(ToolEnvelope::ok(job_payload(&finished)))
    }
}

/// Tool to check on an export job without waiting.
pub struct ExportStatusTool {
    client: DesignClient,
    store: Arc<CredentialStore>,
}

impl ExportStatusTool {
    pub fn new(client: DesignClient, store: Arc<CredentialStore>) -> Self {
        Self { client, store }
    }
}

#[derive(Debug, Deserialize)]
struct ExportStatusArgs {
    job_id: String,
}

#[async_trait]
impl Tool for ExportStatusTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("design_export_status", "Check the status of an export job")
            .with_vendor(Vendor::Design)
            .with_category("design")
            .with_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "job_id": {
                        "type": "string",
                        "description": "The export job ID to check"
                    }
                },
                "required": ["job_id"]
            }))
    }

    #[instrument(skip(self, _context), fields(tool = "design_export_status"))]
    async fn execute(
        &self,
        args: serde_json::Value,
        _context: &ToolContext,
    ) -> DispatchResult<ToolEnvelope> {
        let params: ExportStatusArgs = serde_json::from_value(args)
            .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;

        let token = self.store.get_valid_token().await?;

        match self
            .client
            .get_export(&token.access_token, &params.job_id)
            .await
        {
            Ok(job) => {
                let mut payload = job_payload(&job);
                if let Some(error) = &job.error {
                    payload["error"] = serde_json::Value::String(error.clone());
                }
                Ok(ToolEnvelope::ok(payload))
            }
            Err(e) => Err(map_design_error(&self.store, e).await),
        }
    }
}

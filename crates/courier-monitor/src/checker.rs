//! Site probing
//!
//! One GET per site with the site's own timeout. A probe never errors out of
//! the checker: unexpected status, connection refusal, DNS failure, and
//! timeout all collapse into `CheckResult { success: false }` so the monitor
//! loop treats every failure mode the same way.

use crate::config::SiteConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Outcome of a single probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the site responded with an expected status in time.
    pub success: bool,

    /// HTTP status, when a response arrived at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Failure description, when the probe failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock probe duration in milliseconds.
    pub response_time_ms: u64,
}

/// Probes sites over HTTP.
pub struct HealthChecker {
    client: Client,
}

impl HealthChecker {
    /// Create a checker.
    ///
    /// The client carries no global timeout; each probe applies its site's
    /// configured timeout instead.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Probe one site.
    #[instrument(skip(self, site), fields(site = %site.name, url = %site.url))]
    pub async fn check(&self, site: &SiteConfig) -> CheckResult {
        let start = Instant::now();

        let response = self
            .client
            .get(&site.url)
            .timeout(site.timeout())
            .send()
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                if site.status_ok(status) {
                    debug!(status, elapsed_ms, "Probe succeeded");
                    CheckResult {
                        success: true,
                        status_code: Some(status),
                        error: None,
                        response_time_ms: elapsed_ms,
                    }
                } else {
                    warn!(status, elapsed_ms, "Probe returned unexpected status");
                    CheckResult {
                        success: false,
                        status_code: Some(status),
                        error: Some(format!("unexpected status {}", status)),
                        response_time_ms: elapsed_ms,
                    }
                }
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    format!("timed out after {}ms", site.timeout)
                } else {
                    e.to_string()
                };
                warn!(error = %reason, elapsed_ms, "Probe failed");
                CheckResult {
                    success: false,
                    status_code: None,
                    error: Some(reason),
                    response_time_ms: elapsed_ms,
                }
            }
        }
    }
}

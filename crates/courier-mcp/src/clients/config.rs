//! Adapter configuration.
//!
//! Centralized configuration for vendor endpoints, timeouts, and the poll
//! loop. Loaded from environment variables with defaults pointing at the
//! real vendor APIs; tests override the base URLs to hit mock servers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one adapter process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Mail API endpoint (Gmail v1 shape).
    pub mail: VendorEndpoint,

    /// Design export API endpoint.
    pub design: VendorEndpoint,

    /// Default request timeout in seconds.
    pub default_timeout_secs: u64,

    /// Poll interval for async vendor jobs, in milliseconds.
    pub poll_interval_ms: u64,

    /// Poll deadline for async vendor jobs, in milliseconds.
    pub poll_deadline_ms: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mail: VendorEndpoint {
                base_url: "https://gmail.googleapis.com".to_string(),
            },
            design: VendorEndpoint {
                base_url: "https://api.canva.com".to_string(),
            },
            default_timeout_secs: 30,
            poll_interval_ms: 2_000,
            poll_deadline_ms: 120_000,
        }
    }
}

impl AdapterConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GMAIL_API_URL`: mail API base URL (default: https://gmail.googleapis.com)
    /// - `DESIGN_API_URL`: design API base URL (default: https://api.canva.com)
    /// - `COURIER_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `COURIER_POLL_INTERVAL_MS`: job poll interval (default: 2000)
    /// - `COURIER_POLL_DEADLINE_MS`: job poll deadline (default: 120000)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            mail: VendorEndpoint {
                base_url: std::env::var("GMAIL_API_URL").unwrap_or(default.mail.base_url),
            },
            design: VendorEndpoint {
                base_url: std::env::var("DESIGN_API_URL").unwrap_or(default.design.base_url),
            },
            default_timeout_secs: std::env::var("COURIER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_timeout_secs),
            poll_interval_ms: std::env::var("COURIER_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_interval_ms),
            poll_deadline_ms: std::env::var("COURIER_POLL_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.poll_deadline_ms),
        }
    }

    /// Get the default request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

/// Configuration for a single vendor endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorEndpoint {
    /// Base URL for the vendor API.
    pub base_url: String,
}

impl VendorEndpoint {
    /// Create an endpoint for a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }
}

//! Monitor configuration
//!
//! Loaded from a JSON file once at startup. The wire format is camelCase
//! with all durations in milliseconds.

use crate::monitor::MonitorError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default interval between check cycles (60 seconds).
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60_000;

/// Default per-site alert cooldown (5 minutes).
pub const DEFAULT_ALERT_COOLDOWN_MS: u64 = 300_000;

/// Default per-site probe timeout (10 seconds).
pub const DEFAULT_SITE_TIMEOUT_MS: u64 = 10_000;

/// Top-level monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Sites to probe each cycle.
    pub sites: Vec<SiteConfig>,

    /// Milliseconds between check cycles.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Minimum milliseconds between down-alerts for the same site.
    #[serde(default = "default_alert_cooldown")]
    pub alert_cooldown: u64,

    /// Notification delivery settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Path of the persisted state file.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_MS
}

fn default_alert_cooldown() -> u64 {
    DEFAULT_ALERT_COOLDOWN_MS
}

fn default_state_file() -> String {
    "monitor-state.json".to_string()
}

impl MonitorConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: MonitorConfig = serde_json::from_str(&raw).map_err(|e| {
            MonitorError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;

        if config.sites.is_empty() {
            return Err(MonitorError::Config("no sites configured".to_string()));
        }

        Ok(config)
    }

    /// Interval between check cycles.
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval)
    }

    /// Per-site alert cooldown.
    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_millis(self.alert_cooldown)
    }
}

/// One monitored site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Display name, also the state-file key.
    pub name: String,

    /// URL probed with a GET request.
    pub url: String,

    /// HTTP statuses counted as up.
    #[serde(default = "default_expected_status")]
    pub expected_status: Vec<u16>,

    /// Probe timeout in milliseconds.
    #[serde(default = "default_site_timeout")]
    pub timeout: u64,

    /// Priority label carried into alerts ("critical", "high", ...).
    #[serde(default)]
    pub priority: Option<String>,

    /// Disaster-recovery note carried into down-alerts.
    #[serde(default)]
    pub dr_plan: Option<String>,
}

fn default_expected_status() -> Vec<u16> {
    vec![200]
}

fn default_site_timeout() -> u64 {
    DEFAULT_SITE_TIMEOUT_MS
}

impl SiteConfig {
    /// Probe timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Whether `status` counts as up for this site.
    pub fn status_ok(&self, status: u16) -> bool {
        self.expected_status.contains(&status)
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationConfig {
    /// Emit alerts to the log.
    #[serde(default = "default_true")]
    pub log: bool,

    /// Command spawned with the rendered alert message as its argument.
    #[serde(default)]
    pub command: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            log: true,
            command: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let raw = r#"{
            "sites": [
                { "name": "api", "url": "https://api.example.com/health" }
            ]
        }"#;
        let config: MonitorConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.check_interval, DEFAULT_CHECK_INTERVAL_MS);
        assert_eq!(config.alert_cooldown, DEFAULT_ALERT_COOLDOWN_MS);
        assert_eq!(config.sites[0].expected_status, vec![200]);
        assert_eq!(config.sites[0].timeout, DEFAULT_SITE_TIMEOUT_MS);
        assert!(config.sites[0].priority.is_none());
        assert!(config.notifications.command.is_none());
    }

    #[test]
    fn test_config_camel_case_fields() {
        let raw = r#"{
            "sites": [
                {
                    "name": "dashboard",
                    "url": "https://dash.example.com",
                    "expectedStatus": [200, 302],
                    "timeout": 5000,
                    "priority": "critical",
                    "drPlan": "failover to dash-2"
                }
            ],
            "checkInterval": 30000,
            "alertCooldown": 120000
        }"#;
        let config: MonitorConfig = serde_json::from_str(raw).unwrap();

        let site = &config.sites[0];
        assert!(site.status_ok(302));
        assert!(!site.status_ok(500));
        assert_eq!(site.dr_plan.as_deref(), Some("failover to dash-2"));
        assert_eq!(config.check_interval(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = MonitorConfig::load("/nonexistent/monitor.json");
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_empty_sites_rejected() {
        let path = std::env::temp_dir().join(format!(
            "courier-monitor-cfg-{}.json",
            uuid::Uuid::now_v7()
        ));
        std::fs::write(&path, r#"{ "sites": [] }"#).unwrap();

        let result = MonitorConfig::load(&path);
        assert!(matches!(result, Err(MonitorError::Config(_))));

        std::fs::remove_file(&path).ok();
    }
}

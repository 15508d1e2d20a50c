//! Monitor loop
//!
//! Drives probe cycles on a fixed interval, applies the up/down transition
//! rules, and persists state after each cycle. Sites are checked
//! sequentially in one task; a slow site delays the cycle but there is no
//! shared mutable state to corrupt.

use crate::checker::{CheckResult, HealthChecker};
use crate::config::{MonitorConfig, SiteConfig};
use crate::notify::{AlertEvent, Notifier};
use crate::state::{SiteState, StateFile};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

/// Monitor startup errors.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// State file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The uptime monitor.
pub struct Monitor {
    config: MonitorConfig,
    checker: HealthChecker,
    notifier: Arc<dyn Notifier>,
    state: StateFile,
}

impl Monitor {
    /// Build a monitor, loading persisted state from the configured file.
    pub async fn new(
        config: MonitorConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        let checker = HealthChecker::new()?;
        let state = StateFile::load(&config.state_file).await;

        Ok(Self {
            config,
            checker,
            notifier,
            state,
        })
    }

    /// Probe every configured site once, raising alerts for transitions.
    ///
    /// State is persisted after the full cycle; a failed save is logged and
    /// retried implicitly on the next cycle.
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) {
        let cooldown = Duration::milliseconds(self.config.alert_cooldown as i64);

        for site in &self.config.sites {
            let result = self.checker.check(site).await;
            let state = self.state.entry(&site.name);

            if let Some(event) = apply_transition(state, site, &result, Utc::now(), cooldown) {
                if let Err(e) = self.notifier.notify(&event).await {
                    warn!(site = %site.name, error = %e, "Alert delivery failed");
                }
            }
        }

        if let Err(e) = self.state.save().await {
            error!(error = %e, "Failed to persist monitor state");
        }
    }

    /// Run check cycles forever on the configured interval.
    pub async fn run(mut self) {
        info!(
            sites = self.config.sites.len(),
            interval_ms = self.config.check_interval,
            "Monitor starting"
        );

        let mut interval = tokio::time::interval(self.config.check_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.run_cycle().await;
        }
    }

    /// Read-only view of a site's state, for tests and status reporting.
    pub fn site_state(&self, name: &str) -> Option<&SiteState> {
        self.state.get(name)
    }
}

/// Apply one probe result to a site's state, returning the alert to send.
///
/// Rules:
/// - a failed probe marks the site down; the down-alert is suppressed while
///   the previous alert is younger than `cooldown`, and re-sent once the
///   cooldown has expired;
/// - a successful probe after a failure emits exactly one recovery event and
///   clears `last_alert_at`, so the next outage alerts immediately.
fn apply_transition(
    state: &mut SiteState,
    site: &SiteConfig,
    result: &CheckResult,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> Option<AlertEvent> {
    if result.success {
        let event = if !state.last_known_up {
            let downtime = state.last_up_at.map(|t| now - t);
            state.last_alert_at = None;
            Some(AlertEvent::SiteRecovered {
                name: state.name.clone(),
                downtime,
            })
        } else {
            None
        };

        state.last_known_up = true;
        state.last_up_at = Some(now);
        return event;
    }

    state.last_known_up = false;

    let suppressed = matches!(state.last_alert_at, Some(at) if now - at < cooldown);
    if suppressed {
        return None;
    }

    state.last_alert_at = Some(now);
    Some(AlertEvent::SiteDown {
        name: state.name.clone(),
        reason: result
            .error
            .clone()
            .unwrap_or_else(|| "probe failed".to_string()),
        priority: site.priority.clone(),
        dr_plan: site.dr_plan.clone(),
    })
}

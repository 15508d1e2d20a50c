//! Alert delivery
//!
//! The monitor core only knows the [`Notifier`] trait; where alerts actually
//! go (log lines, a spawned command, several channels at once) is wired up
//! at startup. A notifier that fails is logged and skipped, never allowed to
//! break the check cycle.

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Spawning or running the notification command failed.
    #[error("Notification command failed: {0}")]
    CommandFailed(String),
}

/// An alert raised by the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    /// A site stopped responding (or resumed failing after the cooldown).
    SiteDown {
        /// Site name.
        name: String,
        /// Probe failure description.
        reason: String,
        /// Priority label from the site config.
        priority: Option<String>,
        /// Disaster-recovery note from the site config.
        dr_plan: Option<String>,
    },

    /// A previously-down site is responding again.
    SiteRecovered {
        /// Site name.
        name: String,
        /// How long the site was down, when known.
        downtime: Option<Duration>,
    },
}

impl AlertEvent {
    /// Render the event as a one-line human-readable message.
    pub fn render(&self) -> String {
        match self {
            AlertEvent::SiteDown {
                name,
                reason,
                priority,
                dr_plan,
            } => {
                let mut message = match priority {
                    Some(p) => format!("[{}] {} is DOWN: {}", p.to_uppercase(), name, reason),
                    None => format!("{} is DOWN: {}", name, reason),
                };
                if let Some(plan) = dr_plan {
                    message.push_str(&format!(" (DR: {})", plan));
                }
                message
            }
            AlertEvent::SiteRecovered { name, downtime } => match downtime {
                Some(d) => format!("{} RECOVERED after {}s down", name, d.num_seconds()),
                None => format!("{} RECOVERED", name),
            },
        }
    }
}

/// Delivers alerts somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event.
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError>;
}

/// Notifier that writes alerts to the tracing log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        match event {
            AlertEvent::SiteDown { .. } => error!("{}", event.render()),
            AlertEvent::SiteRecovered { .. } => info!("{}", event.render()),
        }
        Ok(())
    }
}

/// Notifier that spawns a command with the rendered message as its argument.
///
/// This is the escape hatch for sounds, desktop toasts, pagers, or mail:
/// point it at any script that takes the message as `$1`.
pub struct ProcessNotifier {
    command: String,
}

impl ProcessNotifier {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Notifier for ProcessNotifier {
    #[instrument(skip(self, event), fields(command = %self.command))]
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        let status = tokio::process::Command::new(&self.command)
            .arg(event.render())
            .status()
            .await
            .map_err(|e| NotifyError::CommandFailed(e.to_string()))?;

        if !status.success() {
            return Err(NotifyError::CommandFailed(format!(
                "exited with {}",
                status
            )));
        }
        Ok(())
    }
}

/// Notifier that delivers to every configured notifier in turn.
///
/// Individual failures are logged and do not stop delivery to the rest.
pub struct FanoutNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event).await {
                warn!(error = %e, "Notifier failed, continuing");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_render_down_with_priority_and_dr_plan() {
        let event = AlertEvent::SiteDown {
            name: "api".to_string(),
            reason: "unexpected status 503".to_string(),
            priority: Some("critical".to_string()),
            dr_plan: Some("failover to api-2".to_string()),
        };
        assert_eq!(
            event.render(),
            "[CRITICAL] api is DOWN: unexpected status 503 (DR: failover to api-2)"
        );
    }

    #[test]
    fn test_render_recovery_with_downtime() {
        let event = AlertEvent::SiteRecovered {
            name: "api".to_string(),
            downtime: Some(Duration::seconds(90)),
        };
        assert_eq!(event.render(), "api RECOVERED after 90s down");
    }

    struct CountingNotifier(AtomicU32);

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
            Err(NotifyError::CommandFailed("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_fanout_survives_failing_notifier() {
        let counter = Arc::new(CountingNotifier(AtomicU32::new(0)));
        let notifiers: Vec<Arc<dyn Notifier>> =
            vec![Arc::new(FailingNotifier), counter.clone()];
        let fanout = FanoutNotifier::new(notifiers);

        let event = AlertEvent::SiteRecovered {
            name: "api".to_string(),
            downtime: None,
        };
        fanout.notify(&event).await.unwrap();

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}

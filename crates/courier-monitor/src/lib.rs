//! # Courier Monitor
//!
//! Uptime monitoring for the endpoints Courier adapters depend on. The
//! monitor probes each configured site on a fixed interval, tracks up/down
//! transitions across restarts, and raises alerts through a pluggable
//! notifier with a per-site cooldown so a flapping or long-down site does
//! not flood the alert channel.
//!
//! ## Overview
//!
//! - **Config**: JSON site list with per-site timeout, expected statuses,
//!   priority, and an optional disaster-recovery note carried into alerts
//! - **Checker**: one bounded GET per site; every failure mode (bad status,
//!   connection error, timeout) reduces to the same failed probe result
//! - **State**: per-site `last_known_up` / `last_alert_at`, persisted to a
//!   JSON state file between runs
//! - **Notify**: `Notifier` trait with log, process-spawn, and fanout
//!   implementations; delivery failures never break the check cycle
//!
//! ## Usage
//!
//! ```rust,no_run
//! use courier_monitor::{LogNotifier, Monitor, MonitorConfig, MonitorError};
//! use std::sync::Arc;
//!
//! async fn run() -> Result<(), MonitorError> {
//!     let config = MonitorConfig::load("monitor.json")?;
//!     let monitor = Monitor::new(config, Arc::new(LogNotifier)).await?;
//!     monitor.run().await;
//!     Ok(())
//! }
//! ```

pub mod checker;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod state;

pub use checker::{CheckResult, HealthChecker};
pub use config::{MonitorConfig, NotificationConfig, SiteConfig};
pub use monitor::{Monitor, MonitorError};
pub use notify::{AlertEvent, FanoutNotifier, LogNotifier, Notifier, ProcessNotifier};
pub use state::{SiteState, StateFile};

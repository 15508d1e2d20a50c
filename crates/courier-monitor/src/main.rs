//! Courier uptime monitor binary
//!
//! Takes the config path as the first argument, falling back to the
//! COURIER_MONITOR_CONFIG environment variable.

use courier_monitor::{
    FanoutNotifier, LogNotifier, Monitor, MonitorConfig, Notifier, ProcessNotifier,
};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Assemble the notifier stack from the notification settings.
fn build_notifier(config: &MonitorConfig) -> Arc<dyn Notifier> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if config.notifications.log {
        notifiers.push(Arc::new(LogNotifier));
    }
    if let Some(command) = &config.notifications.command {
        notifiers.push(Arc::new(ProcessNotifier::new(command.clone())));
    }

    match notifiers.len() {
        1 => notifiers.remove(0),
        _ => Arc::new(FanoutNotifier::new(notifiers)),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("COURIER_MONITOR_CONFIG").ok());

    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Usage: courier-monitor <config.json>");
            eprintln!("(or set COURIER_MONITOR_CONFIG)");
            process::exit(1);
        }
    };

    let config = match MonitorConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let notifier = build_notifier(&config);

    let monitor = match Monitor::new(config, notifier).await {
        Ok(monitor) => monitor,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    monitor.run().await;
}

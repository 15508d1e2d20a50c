//! Persisted per-site state
//!
//! The monitor remembers whether each site was up and when it last alerted,
//! keyed by site name, in a JSON file that survives restarts. Writes go
//! through a temp file and rename so a crash mid-write cannot corrupt the
//! previous state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// State tracked for one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteState {
    /// Site name (the map key, repeated for log readability).
    pub name: String,

    /// Whether the last completed probe succeeded.
    pub last_known_up: bool,

    /// When the last down-alert for this site was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_alert_at: Option<DateTime<Utc>>,

    /// When the site was last seen up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_up_at: Option<DateTime<Utc>>,
}

impl SiteState {
    /// Initial state for a site never seen before. Sites start presumed up
    /// so the first probe of an already-down site raises an alert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_known_up: true,
            last_alert_at: None,
            last_up_at: None,
        }
    }
}

/// The on-disk state map, keyed by site name.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    states: HashMap<String, SiteState>,
}

impl StateFile {
    /// Load state from `path`, starting empty when the file does not exist.
    ///
    /// An unreadable or corrupt state file is logged and discarded rather
    /// than aborting the monitor; alert history is worth less than uptime
    /// coverage.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let states = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(states) => states,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt state file, starting fresh");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read state file, starting fresh");
                HashMap::new()
            }
        };

        debug!(path = %path.display(), sites = states.len(), "Loaded state");
        Self { path, states }
    }

    /// Get the state for a site, creating the initial state if absent.
    pub fn entry(&mut self, name: &str) -> &mut SiteState {
        self.states
            .entry(name.to_string())
            .or_insert_with(|| SiteState::new(name))
    }

    /// Read-only lookup.
    pub fn get(&self, name: &str) -> Option<&SiteState> {
        self.states.get(name)
    }

    /// Persist the state map atomically (write temp file, then rename).
    pub async fn save(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.states)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "State persisted");
        Ok(())
    }
}

//! Application-level configuration, stored as JSON next to the binary's
//! working data. Not part of the session format.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(default)]
pub struct AppConfig {
    /// Reload the previous session on startup.
    pub restore_session: bool,
    /// Autosave period in minutes; 0 disables the timer.
    pub autosave_cycle: u32,
    /// Seeds per work item.
    pub seeds_per_item: usize,
    /// Outstanding-item window size.
    pub queue_size: usize,
    /// Result cap.
    pub max_matching: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            restore_session: true,
            autosave_cycle: 10,
            seeds_per_item: 1024,
            queue_size: 1024,
            max_matching: 65536,
        }
    }
}

impl AppConfig {
    /// Load quietly: any missing file or parse failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "config file unreadable, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

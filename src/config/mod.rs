//! User configuration stored in the application directory.
//!  - `settings.json` holds preferences. Every field has a default, so the file is optional.
//!  - `session.json` holds the identity of the logged in user, see [session].

pub mod session;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    /// Remind to take a break after working this long without one.
    pub break_after_minutes: Option<u32>,
    /// Remind to get back to work once a break lasts this long.
    pub break_limit_minutes: Option<u32>,
    /// How often `watch` reloads the workday from the server.
    pub refresh_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            break_after_minutes: None,
            break_limit_minutes: None,
            refresh_seconds: 60,
            request_timeout_seconds: 10,
        }
    }
}

impl Settings {
    pub fn path(app_dir: &Path) -> PathBuf {
        app_dir.join(SETTINGS_FILE)
    }

    /// Reads settings from `app_dir`, falling back to defaults when the file doesn't exist.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = Self::path(app_dir);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {path:?}")),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Can't read settings file {path:?}")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_seconds.max(1))
    }

    pub fn break_after(&self) -> Option<chrono::Duration> {
        self.break_after_minutes
            .map(|v| chrono::Duration::minutes(v as i64))
    }

    pub fn break_limit(&self) -> Option<chrono::Duration> {
        self.break_limit_minutes
            .map(|v| chrono::Duration::minutes(v as i64))
    }
}

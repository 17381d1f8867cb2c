//! Registry configuration
//!
//! Defaults suit an interactive session; every field can be overridden
//! through the environment:
//! - `INSCRIPTIONS_MODE_CHECK`: `before-deadline` (default) or `always`
//! - `INSCRIPTIONS_SNAPSHOT`: snapshot file path
//! - `INSCRIPTIONS_DATABASE`: SQLite store path (unset = no store)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_FILE: &str = "inscriptions.json";

/// When enrollment checks the candidate kind against the competition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeCheck {
    /// Only while a closing date is set and not yet reached.
    /// Competitions without a closing date, or past it, admit anyone.
    #[default]
    BeforeDeadline,

    /// On every enrollment
    Always,
}

impl FromStr for ModeCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before-deadline" | "before_deadline" => Ok(ModeCheck::BeforeDeadline),
            "always" => Ok(ModeCheck::Always),
            other => Err(format!("unknown mode check policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub mode_check: ModeCheck,
    pub snapshot_path: PathBuf,
    pub database_path: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mode_check: ModeCheck::default(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            database_path: None,
        }
    }
}

impl RegistryConfig {
    /// Defaults overridden by environment variables.
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            mode_check: std::env::var("INSCRIPTIONS_MODE_CHECK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mode_check),
            snapshot_path: std::env::var("INSCRIPTIONS_SNAPSHOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            database_path: std::env::var("INSCRIPTIONS_DATABASE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_mode_check(mut self, mode_check: ModeCheck) -> Self {
        self.mode_check = mode_check;
        self
    }
}

// Settings Store
//
// Typed user settings persisted as JSON. Every field has a default so a
// partial file merges over the defaults, and the older key names are
// accepted as aliases.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "cpu-sentry";
const SETTINGS_FILE: &str = "settings.json";

/// Longest accepted refresh interval, one day
pub const MAX_REFRESH_INTERVAL: u64 = 24 * 60 * 60;

/// What the tray title shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrayMode {
    /// Always show the top process of the snapshot
    Always,
    /// Only show a process while it is alerting, otherwise clear the title
    #[default]
    WarningOnly,
}

/// User settings
///
/// A file may use either the current key or its older alias for a field, not
/// both: serde reports the pair as a duplicate field and the whole file is
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// CPU percentage at or above which a process counts as hot
    #[serde(alias = "high_cpu_threshold")]
    pub cpu_threshold: f32,
    /// Seconds a process must stay hot before it alerts
    #[serde(alias = "high_cpu_duration")]
    pub sustain_duration: u64,
    #[serde(alias = "tray_display_mode")]
    pub tray_mode: TrayMode,
    /// Show the alert popup, not just the tray title
    #[serde(alias = "enable_high_cpu_popup")]
    pub enable_popup: bool,
    pub auto_refresh: bool,
    /// Seconds between ticks
    pub refresh_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cpu_threshold: 95.0,
            sustain_duration: 10,
            tray_mode: TrayMode::WarningOnly,
            enable_popup: false,
            auto_refresh: true,
            refresh_interval: 3,
        }
    }
}

impl Settings {
    /// Reject values that would make the tracker misbehave
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.cpu_threshold.is_finite() || self.cpu_threshold < 0.0 {
            return Err(SettingsError::invalid(format!(
                "cpu_threshold must be a non-negative number, got {}",
                self.cpu_threshold
            )));
        }
        if self.refresh_interval == 0 {
            return Err(SettingsError::invalid("refresh_interval must be at least 1 second"));
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL {
            return Err(SettingsError::invalid(format!(
                "refresh_interval must be at most {} seconds, got {}",
                MAX_REFRESH_INTERVAL, self.refresh_interval
            )));
        }
        Ok(())
    }

    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("[Settings] No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => {
                log::info!("[Settings] Loaded {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("[Settings] Failed to load {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Overwrite the file with defaults and return them
    pub fn reset(path: &Path) -> Result<Self, SettingsError> {
        let settings = Self::default();
        settings.save(path)?;
        Ok(settings)
    }
}

/// `<config_dir>/cpu-sentry/settings.json`, or `./settings.json` when the
/// platform has no config directory
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

// Settings Module - User configuration
//
// Persisted thresholds and durations, plus hot reload of the settings file

pub mod store;
pub mod watcher;

pub use store::{default_settings_path, Settings, TrayMode, MAX_REFRESH_INTERVAL};
pub use watcher::start_settings_watcher;

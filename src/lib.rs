// cpu-sentry - Public API
//
// Detects processes that keep a high CPU load for longer than a configured
// duration and reports them through a tray sink.

pub mod error;
pub mod monitor;
pub mod settings;
pub mod sink;
pub mod tracker;
pub mod types;

pub use error::{SettingsError, SinkError, SnapshotError};
pub use settings::{Settings, TrayMode};
pub use tracker::{Evaluation, SustainedUsageTracker, TrackedEntry};
pub use types::{current_timestamp, Pid, ProcessSample, SharedSettings, Timestamp};

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

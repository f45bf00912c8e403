// Error types for the collaborators around the tracker
//
// The tracker itself is total; only settings, sinks and snapshot
// providers can fail.

use std::io;
use thiserror::Error;

/// Failure to read, parse or accept a settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

impl SettingsError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        SettingsError::Invalid(msg.into())
    }
}

/// Failure to reach the tray/notification sink
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Tray error: {0}")]
    Tray(String),
}

/// Failure to obtain a process snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Process table is empty")]
    Empty,

    #[error("Snapshot unavailable: {0}")]
    Unavailable(String),
}

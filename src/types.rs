// cpu-sentry Type Definitions
//
// This module contains the shared data structures and type aliases
// used throughout the crate.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::settings::Settings;

/// Process identifier as reported by the OS
pub type Pid = u32;

/// Unix timestamp in whole seconds
pub type Timestamp = u64;

/// One process at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub name: String,
    pub pid: Pid,
    pub cpu_usage: f32,
    #[serde(default)]
    pub memory_usage: u64, // bytes, display only
}

impl ProcessSample {
    pub fn new(name: impl Into<String>, pid: Pid, cpu_usage: f32) -> Self {
        Self {
            name: name.into(),
            pid,
            cpu_usage,
            memory_usage: 0,
        }
    }

    pub fn with_memory(mut self, memory_usage: u64) -> Self {
        self.memory_usage = memory_usage;
        self
    }
}

/// Settings shared between the monitor thread and the settings watcher
pub type SharedSettings = Arc<RwLock<Settings>>;

/// Get current Unix timestamp in seconds
///
/// A clock set before the epoch reads as 0 instead of panicking.
pub fn current_timestamp() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

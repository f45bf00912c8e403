// Monitor Module - Sampling loop around the tracker
//
// This module handles process snapshots and the periodic evaluation thread

pub mod driver;
pub mod snapshot;

pub use driver::{start_monitor, Monitor, MonitorCommand, SnapshotFailurePolicy};
pub use snapshot::{SnapshotProvider, SysinfoProvider, DEFAULT_SNAPSHOT_LIMIT};

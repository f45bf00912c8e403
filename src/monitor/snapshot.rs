// Process Snapshot Provider
//
// Reads per-process CPU and memory usage via sysinfo and returns the
// busiest processes first.

use crate::error::SnapshotError;
use crate::types::ProcessSample;
use std::thread;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, System};

/// Number of processes a snapshot keeps by default
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 10;

/// sysinfo needs two refreshes some time apart before CPU usage means anything
const PRIME_DELAY: Duration = Duration::from_millis(200);

pub trait SnapshotProvider: Send {
    /// Current processes, in the order the tray should prefer them
    fn snapshot(&mut self) -> Result<Vec<ProcessSample>, SnapshotError>;
}

pub struct SysinfoProvider {
    sys: System,
    limit: usize,
    primed: bool,
}

impl SysinfoProvider {
    pub fn new(limit: usize) -> Self {
        Self {
            sys: System::new(),
            limit,
            primed: false,
        }
    }

    fn refresh(&mut self) {
        self.sys
            .refresh_processes_specifics(ProcessRefreshKind::new().with_cpu().with_memory());
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SNAPSHOT_LIMIT)
    }
}

impl SnapshotProvider for SysinfoProvider {
    fn snapshot(&mut self) -> Result<Vec<ProcessSample>, SnapshotError> {
        if !self.primed {
            self.refresh();
            thread::sleep(PRIME_DELAY);
            self.primed = true;
        }
        self.refresh();

        let samples: Vec<ProcessSample> = self
            .sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                ProcessSample::new(process.name(), pid.as_u32(), process.cpu_usage())
                    .with_memory(process.memory())
            })
            .collect();

        if samples.is_empty() {
            return Err(SnapshotError::Empty);
        }

        Ok(rank_by_cpu(samples, self.limit))
    }
}

/// Sort descending by CPU usage and keep the first `limit`
///
/// NaN readings sort last; ties are broken by pid so the order is stable
/// across ticks.
pub fn rank_by_cpu(mut samples: Vec<ProcessSample>, limit: usize) -> Vec<ProcessSample> {
    samples.sort_by(|a, b| {
        cpu_key(b)
            .total_cmp(&cpu_key(a))
            .then_with(|| a.pid.cmp(&b.pid))
    });
    samples.truncate(limit);
    samples
}

fn cpu_key(sample: &ProcessSample) -> f32 {
    if sample.cpu_usage.is_nan() {
        f32::NEG_INFINITY
    } else {
        sample.cpu_usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_by_cpu() {
        let samples = vec![
            ProcessSample::new("idle", 1, 0.5),
            ProcessSample::new("broken", 2, f32::NAN),
            ProcessSample::new("busy", 3, 180.0),
            ProcessSample::new("tie-b", 5, 20.0),
            ProcessSample::new("tie-a", 4, 20.0),
        ];

        let ranked = rank_by_cpu(samples, 10);
        let pids: Vec<u32> = ranked.iter().map(|s| s.pid).collect();
        assert_eq!(pids, vec![3, 4, 5, 1, 2]);
    }

    #[test]
    fn test_rank_truncates() {
        let samples = (0..20).map(|i| ProcessSample::new("p", i, i as f32)).collect();
        let ranked = rank_by_cpu(samples, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].pid, 19);
    }

    #[test]
    fn test_sysinfo_snapshot_contains_current_process() {
        let mut provider = SysinfoProvider::new(usize::MAX);
        let samples = provider.snapshot().unwrap();

        let current_pid = std::process::id();
        assert!(samples.iter().any(|s| s.pid == current_pid), "Current process should be in the list");
        assert!(samples.windows(2).all(|w| w[0].cpu_usage >= w[1].cpu_usage || w[1].cpu_usage.is_nan()));
    }

    #[test]
    fn test_sysinfo_snapshot_respects_limit() {
        let mut provider = SysinfoProvider::new(2);
        let samples = provider.snapshot().unwrap();
        assert!(samples.len() <= 2);
        assert!(!samples.is_empty());
    }
}

// Sustained-Usage Tracker
//
// Tracks processes that stay at or above the CPU threshold snapshot after
// snapshot and reports the ones that have done so for long enough.
//
// Per pid: Untracked -> Tracked -> (Alerting) -> Untracked
// Alerting is derived from elapsed time, never stored. A single snapshot
// where the pid is missing or below threshold drops the entry entirely.

use super::tray_text::tray_text_for;
use crate::settings::Settings;
use crate::types::{Pid, ProcessSample, Timestamp};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Continuous-high-usage record for one pid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEntry {
    pub latest_sample: ProcessSample,
    pub first_above_threshold_at: Timestamp,
    pub last_seen_at: Timestamp,
    /// Display only; alerting uses `now - first_above_threshold_at`
    pub accumulated_duration: u64,
    /// Creation order among entries, breaks ties on `first_above_threshold_at`
    #[serde(skip)]
    seq: u64,
}

impl TrackedEntry {
    fn new(sample: ProcessSample, now: Timestamp, seq: u64) -> Self {
        Self {
            latest_sample: sample,
            first_above_threshold_at: now,
            last_seen_at: now,
            accumulated_duration: 0,
            seq,
        }
    }

    fn observe(&mut self, sample: &ProcessSample, now: Timestamp) {
        self.accumulated_duration += now.saturating_sub(self.last_seen_at);
        self.last_seen_at = now;
        self.latest_sample = sample.clone();
    }

    /// Seconds since the pid last crossed the threshold
    pub fn elapsed(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.first_above_threshold_at)
    }
}

/// Result of one `evaluate` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    /// Alerting processes, longest tracked first
    pub alerts: Vec<ProcessSample>,
    /// Empty string means "clear the tray title"
    pub tray_text: String,
}

impl Evaluation {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

/// Callback invoked synchronously at the end of every evaluation
pub type EvaluationListener = Box<dyn FnMut(&Evaluation) + Send>;

#[derive(Default)]
pub struct SustainedUsageTracker {
    entries: HashMap<Pid, TrackedEntry>,
    listeners: Vec<EvaluationListener>,
    next_seq: u64,
}

impl SustainedUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one snapshot taken at `now`
    ///
    /// Never fails; malformed samples are taken as they are.
    pub fn evaluate(&mut self, samples: &[ProcessSample], settings: &Settings, now: Timestamp) -> Evaluation {
        let mut hot: HashSet<Pid> = HashSet::new();

        for sample in samples.iter().filter(|s| s.cpu_usage >= settings.cpu_threshold) {
            hot.insert(sample.pid);

            match self.entries.get_mut(&sample.pid) {
                Some(entry) => entry.observe(sample, now),
                None => {
                    log::debug!(
                        "[Tracker] PID {} ({}) crossed threshold: cpu={:.1}%",
                        sample.pid,
                        sample.name,
                        sample.cpu_usage
                    );
                    let entry = TrackedEntry::new(sample.clone(), now, self.next_seq);
                    self.next_seq += 1;
                    self.entries.insert(sample.pid, entry);
                }
            }
        }

        // No grace period: anything not hot right now starts over
        self.entries.retain(|pid, entry| {
            let keep = hot.contains(pid);
            if !keep {
                log::debug!(
                    "[Tracker] PID {} ({}) dropped after {}s above threshold",
                    pid,
                    entry.latest_sample.name,
                    entry.elapsed(now)
                );
            }
            keep
        });

        // Order of tracking start, so WarningOnly shows the longest-running alert
        let mut alerting: Vec<&TrackedEntry> = self
            .entries
            .values()
            .filter(|entry| entry.elapsed(now) >= settings.sustain_duration)
            .collect();
        alerting.sort_by_key(|entry| (entry.first_above_threshold_at, entry.seq));
        let alerts: Vec<ProcessSample> = alerting.into_iter().map(|entry| entry.latest_sample.clone()).collect();

        let tray_text = tray_text_for(settings.tray_mode, samples, &alerts);

        log::debug!(
            "[Tracker] Evaluated {} samples: tracked={}, alerting={}, tray='{}'",
            samples.len(),
            self.entries.len(),
            alerts.len(),
            tray_text
        );

        let evaluation = Evaluation { alerts, tray_text };
        for listener in self.listeners.iter_mut() {
            listener(&evaluation);
        }
        evaluation
    }

    /// Forget one pid; a still-hot pid starts from zero on the next tick
    pub fn clear_alert(&mut self, pid: Pid) {
        if self.entries.remove(&pid).is_some() {
            log::info!("[Tracker] Cleared PID {}", pid);
        }
    }

    pub fn clear_all(&mut self) {
        if !self.entries.is_empty() {
            log::info!("[Tracker] Cleared {} tracked processes", self.entries.len());
            self.entries.clear();
        }
    }

    /// Seconds `pid` has been continuously hot, 0 if untracked
    pub fn elapsed_duration(&self, pid: Pid, now: Timestamp) -> u64 {
        self.entries.get(&pid).map(|entry| entry.elapsed(now)).unwrap_or(0)
    }

    pub fn entry(&self, pid: Pid) -> Option<&TrackedEntry> {
        self.entries.get(&pid)
    }

    pub fn is_tracked(&self, pid: Pid) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Pid, &TrackedEntry)> {
        self.entries.iter()
    }

    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&Evaluation) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TrayMode;
    use std::sync::{Arc, Mutex};

    fn settings(threshold: f32, duration: u64, mode: TrayMode) -> Settings {
        Settings {
            cpu_threshold: threshold,
            sustain_duration: duration,
            tray_mode: mode,
            ..Settings::default()
        }
    }

    fn sample(name: &str, pid: Pid, cpu: f32) -> ProcessSample {
        ProcessSample::new(name, pid, cpu)
    }

    fn pids(evaluation: &Evaluation) -> Vec<Pid> {
        evaluation.alerts.iter().map(|s| s.pid).collect()
    }

    #[test]
    fn test_alerts_from_duration_until_first_dip() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(90.0, 10, TrayMode::WarningOnly);
        let hot = vec![sample("miner", 7, 99.0)];
        let cold = vec![sample("miner", 7, 10.0)];

        assert!(pids(&tracker.evaluate(&hot, &s, 1000)).is_empty());
        assert!(pids(&tracker.evaluate(&hot, &s, 1005)).is_empty());
        assert_eq!(pids(&tracker.evaluate(&hot, &s, 1010)), vec![7]);
        assert_eq!(pids(&tracker.evaluate(&hot, &s, 1015)), vec![7]);

        let evaluation = tracker.evaluate(&cold, &s, 1020);
        assert!(evaluation.alerts.is_empty());
        assert!(!tracker.is_tracked(7));
        assert_eq!(tracker.elapsed_duration(7, 1020), 0);
    }

    #[test]
    fn test_single_miss_resets_timer() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(90.0, 10, TrayMode::WarningOnly);
        let hot = vec![sample("miner", 7, 95.0)];

        tracker.evaluate(&hot, &s, 0);
        tracker.evaluate(&hot, &s, 8);
        assert_eq!(tracker.elapsed_duration(7, 8), 8);

        // Absent for one tick
        tracker.evaluate(&[], &s, 9);
        assert!(!tracker.is_tracked(7));

        tracker.evaluate(&hot, &s, 10);
        assert_eq!(tracker.entry(7).unwrap().first_above_threshold_at, 10);
        assert!(tracker.evaluate(&hot, &s, 19).alerts.is_empty());
        assert_eq!(pids(&tracker.evaluate(&hot, &s, 20)), vec![7]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(95.0, 0, TrayMode::WarningOnly);

        let evaluation = tracker.evaluate(&[sample("edge", 1, 95.0), sample("below", 2, 94.9)], &s, 0);
        assert_eq!(pids(&evaluation), vec![1]);
        assert!(!tracker.is_tracked(2));
    }

    #[test]
    fn test_clear_alert_restarts_from_zero() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(90.0, 10, TrayMode::WarningOnly);
        let hot = vec![sample("miner", 7, 99.0)];

        tracker.evaluate(&hot, &s, 100);
        assert_eq!(pids(&tracker.evaluate(&hot, &s, 115)), vec![7]);

        tracker.clear_alert(7);
        assert!(!tracker.is_tracked(7));
        tracker.clear_alert(7);

        let evaluation = tracker.evaluate(&hot, &s, 120);
        assert!(evaluation.alerts.is_empty());
        let entry = tracker.entry(7).unwrap();
        assert_eq!(entry.first_above_threshold_at, 120);
        assert_eq!(entry.accumulated_duration, 0);
        assert_eq!(tracker.elapsed_duration(7, 120), 0);
    }

    #[test]
    fn test_empty_snapshot_clears_everything() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(50.0, 0, TrayMode::Always);

        tracker.evaluate(&[sample("a", 1, 60.0), sample("b", 2, 70.0)], &s, 0);
        assert_eq!(tracker.tracked_count(), 2);

        let evaluation = tracker.evaluate(&[], &s, 5);
        assert_eq!(tracker.tracked_count(), 0);
        assert!(evaluation.alerts.is_empty());
        assert_eq!(evaluation.tray_text, "");
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(50.0, 0, TrayMode::WarningOnly);
        tracker.evaluate(&[sample("a", 1, 60.0)], &s, 0);

        tracker.clear_all();
        assert_eq!(tracker.tracked_count(), 0);
        tracker.clear_all();
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn test_latest_sample_and_accumulated_duration() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(90.0, 100, TrayMode::WarningOnly);

        tracker.evaluate(&[sample("job", 3, 91.0)], &s, 10);
        tracker.evaluate(&[sample("job", 3, 97.5)], &s, 13);
        tracker.evaluate(&[sample("job", 3, 93.0)], &s, 20);

        let entry = tracker.entry(3).unwrap();
        assert_eq!(entry.latest_sample.cpu_usage, 93.0);
        assert_eq!(entry.accumulated_duration, 10);
        assert_eq!(entry.last_seen_at, 20);

        // Clock stepping backwards never shrinks anything
        tracker.evaluate(&[sample("job", 3, 93.0)], &s, 15);
        let entry = tracker.entry(3).unwrap();
        assert_eq!(entry.accumulated_duration, 10);
        assert_eq!(tracker.elapsed_duration(3, 5), 0);
    }

    #[test]
    fn test_alerts_ordered_by_tracking_start() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(80.0, 5, TrayMode::WarningOnly);

        tracker.evaluate(&[sample("old", 1, 85.0)], &s, 0);
        tracker.evaluate(&[sample("old", 1, 85.0), sample("new", 2, 99.0)], &s, 3);
        let evaluation = tracker.evaluate(&[sample("new", 2, 99.0), sample("old", 1, 88.0)], &s, 8);

        assert_eq!(pids(&evaluation), vec![1, 2]);
        assert_eq!(evaluation.alerts[0].cpu_usage, 88.0);
        assert_eq!(evaluation.tray_text, "old:88%");
    }

    #[test]
    fn test_same_start_keeps_first_seen_order() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(50.0, 0, TrayMode::WarningOnly);

        tracker.evaluate(&[sample("c", 30, 60.0), sample("a", 10, 90.0), sample("b", 20, 70.0)], &s, 0);
        let evaluation = tracker.evaluate(&[sample("b", 20, 70.0), sample("a", 10, 90.0), sample("c", 30, 60.0)], &s, 1);
        assert_eq!(pids(&evaluation), vec![30, 10, 20]);

        // A re-tracked pid goes to the back
        tracker.clear_alert(30);
        let evaluation = tracker.evaluate(&[sample("c", 30, 60.0), sample("a", 10, 90.0), sample("b", 20, 70.0)], &s, 2);
        assert_eq!(pids(&evaluation), vec![10, 20, 30]);
        assert_eq!(evaluation.tray_text, "a:90%");
    }

    #[test]
    fn test_tray_text_modes() {
        let mut tracker = SustainedUsageTracker::new();
        let snapshot = vec![sample("chrome_helper_renderer", 1, 87.6), sample("vim", 2, 12.3)];

        let warning_only = settings(95.0, 10, TrayMode::WarningOnly);
        assert_eq!(tracker.evaluate(&snapshot, &warning_only, 0).tray_text, "");

        let always = settings(95.0, 10, TrayMode::Always);
        let evaluation = tracker.evaluate(&snapshot, &always, 1);
        assert!(evaluation.alerts.is_empty());
        assert_eq!(evaluation.tray_text, "chrome_he...:87%");
    }

    #[test]
    fn test_duplicate_pid_in_one_snapshot() {
        let mut tracker = SustainedUsageTracker::new();
        let s = settings(50.0, 0, TrayMode::WarningOnly);

        let evaluation = tracker.evaluate(&[sample("dup", 9, 60.0), sample("dup", 9, 70.0)], &s, 0);
        assert_eq!(evaluation.alerts.len(), 1);
        assert_eq!(evaluation.alerts[0].cpu_usage, 70.0);
    }

    #[test]
    fn test_listener_sees_every_evaluation() {
        let mut tracker = SustainedUsageTracker::new();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_by_listener = seen.clone();
        tracker.add_listener(move |evaluation| {
            seen_by_listener.lock().unwrap().push(evaluation.alerts.len());
        });

        let s = settings(50.0, 0, TrayMode::WarningOnly);
        tracker.evaluate(&[sample("a", 1, 60.0)], &s, 0);
        tracker.evaluate(&[], &s, 1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 0]);
    }
}

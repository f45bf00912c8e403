// Monitor Thread
//
// The scheduling loop around the tracker: one snapshot per refresh
// interval, results pushed into the tray sink, clear requests taken from a
// command channel. The tracker lives on this thread only, so every
// mutation is serialized through the channel.

use super::snapshot::SnapshotProvider;
use crate::settings::{Settings, MAX_REFRESH_INTERVAL};
use crate::sink::TraySink;
use crate::tracker::{Evaluation, SustainedUsageTracker};
use crate::types::{current_timestamp, Pid, SharedSettings, Timestamp};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// What to do when a snapshot cannot be taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnapshotFailurePolicy {
    /// Leave the tracker untouched and wait for the next tick
    #[default]
    Skip,
    /// Evaluate an empty snapshot, which drops every tracked process
    TreatAsEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorCommand {
    ClearAlert(Pid),
    ClearAll,
    Shutdown,
}

pub struct Monitor<P: SnapshotProvider> {
    provider: P,
    tracker: SustainedUsageTracker,
    sink: Box<dyn TraySink>,
    settings: SharedSettings,
    last_good: Settings,
    failure_policy: SnapshotFailurePolicy,
    tick_count: u64,
}

impl<P: SnapshotProvider> Monitor<P> {
    pub fn new(provider: P, sink: Box<dyn TraySink>, settings: SharedSettings) -> Self {
        let mut monitor = Self {
            provider,
            tracker: SustainedUsageTracker::new(),
            sink,
            settings,
            last_good: Settings::default(),
            failure_policy: SnapshotFailurePolicy::default(),
            tick_count: 0,
        };
        monitor.last_good = monitor.current_settings();
        monitor
    }

    pub fn with_failure_policy(mut self, policy: SnapshotFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn tracker(&self) -> &SustainedUsageTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SustainedUsageTracker {
        &mut self.tracker
    }

    /// Shared settings if readable and valid, else the last good copy
    pub fn current_settings(&mut self) -> Settings {
        let read = match self.settings.read() {
            Ok(guard) => Some(guard.clone()),
            Err(_) => {
                log::warn!("[Monitor] Settings lock poisoned, using last-known-good settings");
                None
            }
        };

        match read {
            Some(settings) => match settings.validate() {
                Ok(()) => {
                    self.last_good = settings.clone();
                    settings
                }
                Err(e) => {
                    log::warn!("[Monitor] {}, using last-known-good settings", e);
                    self.last_good.clone()
                }
            },
            None => self.last_good.clone(),
        }
    }

    /// Run one sample-evaluate-dispatch cycle at `now`
    ///
    /// Returns None when the snapshot failed and the tick was skipped.
    pub fn tick(&mut self, now: Timestamp) -> Option<Evaluation> {
        let settings = self.current_settings();
        self.tick_with(&settings, now)
    }

    fn tick_with(&mut self, settings: &Settings, now: Timestamp) -> Option<Evaluation> {
        let samples = match self.provider.snapshot() {
            Ok(samples) => samples,
            Err(e) => match self.failure_policy {
                SnapshotFailurePolicy::Skip => {
                    log::warn!("[Monitor] Snapshot failed: {}, skipping tick", e);
                    return None;
                }
                SnapshotFailurePolicy::TreatAsEmpty => {
                    log::warn!("[Monitor] Snapshot failed: {}, treating as empty snapshot", e);
                    Vec::new()
                }
            },
        };

        self.tick_count += 1;
        let evaluation = self.tracker.evaluate(&samples, settings, now);
        self.dispatch(&evaluation, settings);

        // Log every 10 ticks
        if self.tick_count % 10 == 0 {
            log::info!(
                "[Monitor] Tick #{}: samples={}, tracked={}, alerting={}",
                self.tick_count,
                samples.len(),
                self.tracker.tracked_count(),
                evaluation.alerts.len()
            );
        }

        Some(evaluation)
    }

    /// Push one evaluation into the sink; failures are logged and dropped
    fn dispatch(&mut self, evaluation: &Evaluation, settings: &Settings) {
        if let Err(e) = self.sink.set_tray_text(&evaluation.tray_text) {
            log::warn!("[Monitor] Failed to update tray text: {}", e);
        }

        let result = if evaluation.has_alerts() && settings.enable_popup {
            self.sink.show_alert()
        } else {
            self.sink.hide_alert()
        };
        if let Err(e) = result {
            log::warn!("[Monitor] Failed to update alert popup: {}", e);
        }
    }

    /// Apply one command; returns false when the loop should stop
    pub fn handle_command(&mut self, command: MonitorCommand) -> bool {
        match command {
            MonitorCommand::ClearAlert(pid) => {
                self.tracker.clear_alert(pid);
                true
            }
            MonitorCommand::ClearAll => {
                self.tracker.clear_all();
                true
            }
            MonitorCommand::Shutdown => false,
        }
    }

    /// Tick every `refresh_interval` seconds until shut down
    ///
    /// Stops on `Shutdown` or once every command sender is dropped.
    pub fn run(mut self, commands: Receiver<MonitorCommand>) {
        log::info!("[Monitor] Started (failure policy: {:?})", self.failure_policy);

        let mut next_tick = Instant::now();
        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.handle_command(command) {
                        log::info!("[Monitor] Shutdown requested");
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("[Monitor] Channel disconnected, shutting down");
                    break;
                }
            }

            let settings = self.current_settings();
            if settings.auto_refresh {
                self.tick_with(&settings, current_timestamp());
            }
            next_tick = next_tick_after(Instant::now(), settings.refresh_interval);
        }
    }
}

/// When the tick after one at `now` is due, with the interval held to
/// `1..=MAX_REFRESH_INTERVAL` seconds
fn next_tick_after(now: Instant, interval_secs: u64) -> Instant {
    let interval = Duration::from_secs(interval_secs.clamp(1, MAX_REFRESH_INTERVAL));
    // Instant overflow: tick again right away rather than panic
    now.checked_add(interval).unwrap_or(now)
}

/// Start monitor thread
pub fn start_monitor<P>(monitor: Monitor<P>) -> (thread::JoinHandle<()>, Sender<MonitorCommand>)
where
    P: SnapshotProvider + 'static,
{
    let (command_sender, command_receiver) = channel();
    let handle = thread::spawn(move || {
        monitor.run(command_receiver);
    });
    (handle, command_sender)
}

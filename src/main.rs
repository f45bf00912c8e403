use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cpu_sentry::monitor::{start_monitor, Monitor, SnapshotFailurePolicy, SysinfoProvider, DEFAULT_SNAPSHOT_LIMIT};
use cpu_sentry::settings::{default_settings_path, start_settings_watcher, Settings};
use cpu_sentry::sink::LogSink;
use cpu_sentry::{current_timestamp, Pid};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

#[derive(Parser, Debug)]
#[command(name = "cpu-sentry", version, about = "Watch for processes that keep a high CPU load")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Number of busiest processes sampled per tick
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SNAPSHOT_LIMIT)]
    top: usize,

    /// Run a single tick and print the evaluation as JSON
    #[arg(long)]
    once: bool,

    /// Write the default settings file and exit
    #[arg(long)]
    reset_settings: bool,

    /// Treat a failed snapshot as "nothing is busy" instead of skipping the tick
    #[arg(long)]
    reset_on_snapshot_error: bool,

    /// Do not reload the settings file when it changes
    #[arg(long)]
    no_watch: bool,
}

fn main() -> Result<()> {
    cpu_sentry::init_logging();
    let cli = Cli::parse();

    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);

    if cli.reset_settings {
        Settings::reset(&settings_path)
            .with_context(|| format!("Failed to reset {}", settings_path.display()))?;
        println!("Default settings written to {}", settings_path.display());
        return Ok(());
    }

    let settings = Settings::load_or_default(&settings_path);
    log::info!(
        "[Main] threshold={}%, duration={}s, mode={:?}, refresh={}s",
        settings.cpu_threshold,
        settings.sustain_duration,
        settings.tray_mode,
        settings.refresh_interval
    );
    let shared_settings = Arc::new(RwLock::new(settings));

    let policy = if cli.reset_on_snapshot_error {
        SnapshotFailurePolicy::TreatAsEmpty
    } else {
        SnapshotFailurePolicy::Skip
    };

    let mut monitor = Monitor::new(
        SysinfoProvider::new(cli.top),
        Box::new(LogSink::new()),
        shared_settings.clone(),
    )
    .with_failure_policy(policy);

    if cli.once {
        // One tick can only alert when sustain_duration is 0
        let evaluation = match monitor.tick(current_timestamp()) {
            Some(evaluation) => evaluation,
            None => bail!("Failed to take a process snapshot"),
        };
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    // Log whenever the set of alerting processes changes
    let mut alerting: Vec<Pid> = Vec::new();
    monitor.tracker_mut().add_listener(move |evaluation| {
        let pids: Vec<Pid> = evaluation.alerts.iter().map(|s| s.pid).collect();
        if pids == alerting {
            return;
        }
        for sample in evaluation.alerts.iter().filter(|s| !alerting.contains(&s.pid)) {
            log::warn!(
                "[Main] {} (PID {}) has stayed at {:.1}% CPU",
                sample.name,
                sample.pid,
                sample.cpu_usage
            );
        }
        alerting = pids;
    });

    if !cli.no_watch {
        let _settings_watcher = start_settings_watcher(settings_path.clone(), shared_settings.clone());
    }

    // Keep the command sender alive; dropping it stops the monitor
    let (monitor_handle, _commands) = start_monitor(monitor);
    log::info!("[Main] Monitoring started");

    monitor_handle
        .join()
        .map_err(|_| anyhow!("Monitor thread panicked"))?;
    Ok(())
}

// Settings Watcher Thread
//
// Watches the settings file's directory with notify (inotify/FSEvents) and
// reloads the shared settings when the file changes. A reload that fails
// keeps the last-known-good settings.

use super::Settings;
use crate::error::SettingsError;
use crate::types::SharedSettings;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::thread;

/// Start settings watcher thread
pub fn start_settings_watcher(path: PathBuf, shared: SharedSettings) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_settings_watcher(&path, &shared) {
            log::error!("[SettingsWatcher] Error: {}", e);
        }
    })
}

fn run_settings_watcher(path: &Path, shared: &SharedSettings) -> notify::Result<()> {
    // The file itself may not exist yet, or may be replaced by rename
    let dir = watch_dir(path);
    fs::create_dir_all(&dir).map_err(notify::Error::io)?;

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    log::info!("[SettingsWatcher] Watching: {}", path.display());

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if is_settings_event(&event, path) {
                    log::debug!("[SettingsWatcher] Change detected: {:?}", event.kind);
                    apply_reload(shared, Settings::load(path));
                }
            }
            Ok(Err(e)) => {
                log::warn!("[SettingsWatcher] Watch error: {}", e);
            }
            Err(_) => {
                log::info!("[SettingsWatcher] Channel disconnected, shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Only creations and modifications of the settings file itself
fn is_settings_event(event: &Event, path: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    let file_name = path.file_name();
    relevant_kind && file_name.is_some() && event.paths.iter().any(|p| p.file_name() == file_name)
}

/// Swap in freshly loaded settings, or keep the current ones on error
///
/// Returns true if the shared settings changed.
pub fn apply_reload(shared: &SharedSettings, loaded: Result<Settings, SettingsError>) -> bool {
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("[SettingsWatcher] Reload failed: {}, keeping last-known-good settings", e);
            return false;
        }
    };

    let mut current = match shared.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if *current == settings {
        return false;
    }

    log::info!(
        "[SettingsWatcher] Settings reloaded: threshold={}%, duration={}s, mode={:?}, popup={}",
        settings.cpu_threshold,
        settings.sustain_duration,
        settings.tray_mode,
        settings.enable_popup
    );
    *current = settings;
    true
}

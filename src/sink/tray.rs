// Tauri Tray Sink
//
// TraySink backed by a Tauri system tray, using the same singleton pattern
// as the rest of a Tauri app: call `init` once during app setup, then build
// sinks anywhere.
// - Tray title (macOS menu bar) and tooltip
// - Alert window `high-cpu-alert`, or a system notification when the app
//   has no such window
//

use super::TraySink;
use crate::error::SinkError;
use once_cell::sync::OnceCell;
use tauri::api::notification::Notification;
use tauri::Manager;

/// Label of the popup window shown while processes are alerting
pub const ALERT_WINDOW_LABEL: &str = "high-cpu-alert";

/// Global AppHandle singleton for the tray sink
static APP_HANDLE: OnceCell<tauri::AppHandle> = OnceCell::new();

/// Register the AppHandle; call once during app setup
pub fn init(app_handle: tauri::AppHandle) {
    if APP_HANDLE.set(app_handle).is_err() {
        log::warn!("[TraySink] AppHandle already initialized");
    }
    log::info!("[TraySink] ✅ Tray sink initialized");
}

fn get_handle() -> Result<&'static tauri::AppHandle, SinkError> {
    APP_HANDLE
        .get()
        .ok_or_else(|| SinkError::Unavailable("AppHandle not initialized".to_string()))
}

#[derive(Debug, Default)]
pub struct TauriTraySink {
    last_title: String,
}

impl TauriTraySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn notify_fallback(&self, handle: &tauri::AppHandle) -> Result<(), SinkError> {
        let identifier = handle.config().tauri.bundle.identifier.clone();
        let body = if self.last_title.is_empty() {
            "A process has kept a high CPU load".to_string()
        } else {
            format!("{} has kept a high CPU load", self.last_title)
        };

        Notification::new(&identifier)
            .title("High CPU usage ⚠️")
            .body(&body)
            .show()
            .map_err(|e| SinkError::Tray(e.to_string()))
    }
}

impl TraySink for TauriTraySink {
    fn set_tray_text(&mut self, title: &str) -> Result<(), SinkError> {
        let tray = get_handle()?.tray_handle();

        // Menu bar titles only exist on macOS
        #[cfg(target_os = "macos")]
        tray.set_title(title).map_err(|e| SinkError::Tray(e.to_string()))?;

        let tooltip = if title.is_empty() {
            "cpu-sentry".to_string()
        } else {
            format!("cpu-sentry - {}", title)
        };
        tray.set_tooltip(&tooltip).map_err(|e| SinkError::Tray(e.to_string()))?;

        self.last_title = title.to_string();
        Ok(())
    }

    fn show_alert(&mut self) -> Result<(), SinkError> {
        let handle = get_handle()?;

        match handle.get_window(ALERT_WINDOW_LABEL) {
            Some(window) => {
                if !window.is_visible().unwrap_or(false) {
                    window.show().map_err(|e| SinkError::Tray(e.to_string()))?;
                }
                Ok(())
            }
            None => self.notify_fallback(handle),
        }
    }

    fn hide_alert(&mut self) -> Result<(), SinkError> {
        if let Some(window) = get_handle()?.get_window(ALERT_WINDOW_LABEL) {
            window.hide().map_err(|e| SinkError::Tray(e.to_string()))?;
        }
        Ok(())
    }
}

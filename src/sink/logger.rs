// Log Sink
//
// Headless TraySink: reports title changes and alert visibility through
// the log instead of a tray icon. Repeated identical calls are dropped so
// a steady state does not flood the log every tick.

use super::TraySink;
use crate::error::SinkError;

#[derive(Debug, Default)]
pub struct LogSink {
    last_title: Option<String>,
    alert_visible: bool,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alert_visible(&self) -> bool {
        self.alert_visible
    }

    pub fn title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }
}

impl TraySink for LogSink {
    fn set_tray_text(&mut self, title: &str) -> Result<(), SinkError> {
        if self.last_title.as_deref() == Some(title) {
            return Ok(());
        }

        if title.is_empty() {
            log::info!("[Tray] Title cleared");
        } else {
            log::info!("[Tray] {}", title);
        }
        self.last_title = Some(title.to_string());
        Ok(())
    }

    fn show_alert(&mut self) -> Result<(), SinkError> {
        if !self.alert_visible {
            log::warn!("[Tray] ⚠️ High CPU alert raised");
            self.alert_visible = true;
        }
        Ok(())
    }

    fn hide_alert(&mut self) -> Result<(), SinkError> {
        if self.alert_visible {
            log::info!("[Tray] High CPU alert cleared");
            self.alert_visible = false;
        }
        Ok(())
    }
}

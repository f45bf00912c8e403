// Recording Sink
//
// In-memory TraySink that remembers every call. Clones share the same
// record, so a test can hand one clone to the monitor and inspect another.

use super::TraySink;
use crate::error::SinkError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    TrayText(String),
    ShowAlert,
    HideAlert,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call record nothing and return an error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.lock())
    }

    /// Most recent tray title, if any was set
    pub fn last_tray_text(&self) -> Option<String> {
        self.lock().iter().rev().find_map(|call| match call {
            SinkCall::TrayText(title) => Some(title.clone()),
            _ => None,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SinkCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, call: SinkCall) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("recording sink set to fail".to_string()));
        }
        self.lock().push(call);
        Ok(())
    }
}

impl TraySink for RecordingSink {
    fn set_tray_text(&mut self, title: &str) -> Result<(), SinkError> {
        self.record(SinkCall::TrayText(title.to_string()))
    }

    fn show_alert(&mut self) -> Result<(), SinkError> {
        self.record(SinkCall::ShowAlert)
    }

    fn hide_alert(&mut self) -> Result<(), SinkError> {
        self.record(SinkCall::HideAlert)
    }
}

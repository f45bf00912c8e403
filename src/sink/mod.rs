// Sink Module - Tray and alert output
//
// The tracker never talks to the tray directly. Whoever drives it pushes
// each evaluation into a TraySink; calls are fire-and-forget and callers
// log and drop any error.

pub mod logger;
pub mod recording;
#[cfg(feature = "tray")]
pub mod tray;

use crate::error::SinkError;

pub trait TraySink: Send {
    /// Replace the tray title; empty clears it
    fn set_tray_text(&mut self, title: &str) -> Result<(), SinkError>;
    fn show_alert(&mut self) -> Result<(), SinkError>;
    fn hide_alert(&mut self) -> Result<(), SinkError>;
}

pub use logger::LogSink;
pub use recording::{RecordingSink, SinkCall};
#[cfg(feature = "tray")]
pub use tray::TauriTraySink;

// Tracker Module - Sustained high CPU detection
//
// Pure state machine plus the tray text policy it uses

pub mod core;
pub mod tray_text;

pub use self::core::{Evaluation, EvaluationListener, SustainedUsageTracker, TrackedEntry};
pub use tray_text::format_tray_title;

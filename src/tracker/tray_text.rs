// Tray Text Policy
//
// Decides which process the tray title shows and how it is rendered.
//
// Example:
// - "chrome_helper_renderer" at 87.6% -> "chrome_he...:87%"
// - "vim" at 12.3%                    -> "vim:12%"

use crate::settings::TrayMode;
use crate::types::ProcessSample;

/// Names longer than this get shortened
const MAX_NAME_CHARS: usize = 12;
/// Characters kept from a shortened name
const KEPT_NAME_CHARS: usize = 9;
const ELLIPSIS: &str = "...";

/// Render one process as a tray title
///
/// Lengths are counted in chars so multi-byte names are never split
/// inside a code point. The percentage is truncated toward zero.
pub fn format_tray_title(sample: &ProcessSample) -> String {
    let mut title: String = if sample.name.chars().count() > MAX_NAME_CHARS {
        let mut short: String = sample.name.chars().take(KEPT_NAME_CHARS).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        sample.name.clone()
    };

    title.push_str(&format!(":{}%", sample.cpu_usage.trunc() as i64));
    title
}

/// Pick the tray title for one evaluation
///
/// `snapshot` is the caller's input order; `alerts` the freshly built
/// alert set. An empty string means "clear the display".
pub fn tray_text_for(mode: TrayMode, snapshot: &[ProcessSample], alerts: &[ProcessSample]) -> String {
    let shown = match mode {
        TrayMode::Always => snapshot.first(),
        TrayMode::WarningOnly => alerts.first(),
    };

    shown.map(format_tray_title).unwrap_or_default()
}

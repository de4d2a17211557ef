//! Human-readable duration formatting for spreadsheet cells
//!
//! Video durations arrive as whole seconds and are written as clock-style
//! `H:MM:SS` strings (hours are not zero-padded and never roll over into days).

/// Format seconds as `H:MM:SS`.
///
/// # Examples
///
/// ```
/// use sheetkeeper_common::human_time::format_clock_duration;
///
/// assert_eq!(format_clock_duration(125), "0:02:05");
/// assert_eq!(format_clock_duration(3661), "1:01:01");
/// assert_eq!(format_clock_duration(90000), "25:00:00");
/// ```
pub fn format_clock_duration(seconds: i64) -> String {
    let is_negative = seconds < 0;
    let abs_seconds = seconds.unsigned_abs();

    let hours = abs_seconds / 3600;
    let mins = (abs_seconds % 3600) / 60;
    let secs = abs_seconds % 60;
    let formatted = format!("{}:{:02}:{:02}", hours, mins, secs);

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a run timestamp for use in object storage keys.
///
/// ISO-8601 local time with microseconds, with `:` replaced by `-` so the
/// value is safe inside keys and file names, e.g. `2024-03-01T10-20-30.123456`.
pub fn run_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S%.6f").to_string()
}

/// Run timestamp for the current local time
pub fn current_run_timestamp() -> String {
    run_timestamp(Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_run_timestamp_format() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 1, 10, 20, 30)
            .single()
            .unwrap();
        assert_eq!(run_timestamp(at), "2024-03-01T10-20-30.000000");
    }

    #[test]
    fn test_run_timestamp_has_no_colons() {
        let stamp = current_run_timestamp();
        assert!(!stamp.contains(':'));
        assert_eq!(stamp.len(), "2024-03-01T10-20-30.000000".len());
    }
}

/// Utility functions for timestamps and formatting
use time::{format_description, OffsetDateTime, UtcOffset};

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]")
        .expect("Failed to create format description");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

/// Current wall-clock time as unsigned epoch seconds
///
/// The device clock characteristic takes a 32-bit value, so the timestamp
/// is clamped into the unsigned 32-bit range.
pub fn current_epoch_seconds() -> u32 {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp();
    u32::try_from(timestamp).unwrap_or(0)
}

/// Local UTC offset in whole hours
///
/// Falls back to UTC when the local offset cannot be determined, which
/// happens on Unix when the process is already multi-threaded.
pub fn local_utc_offset_hours() -> i8 {
    UtcOffset::current_local_offset()
        .map(|offset| offset.whole_hours())
        .unwrap_or(0)
}

//! Timestamp helpers shared by snapshots, reports and the catalog.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats `instant` as ISO-8601 UTC with millisecond precision.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mcp_toolbox_core::clock::iso_timestamp;
///
/// let instant = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(iso_timestamp(instant), "2025-01-02T03:04:05.000Z");
/// ```
#[must_use]
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time as an ISO-8601 UTC string.
#[must_use]
pub fn now_iso() -> String {
    iso_timestamp(Utc::now())
}

/// Turns an ISO timestamp into a file name stem (`:` and `.` become `-`).
///
/// # Examples
///
/// ```
/// use mcp_toolbox_core::clock::file_stamp;
///
/// assert_eq!(file_stamp("2025-01-02T03:04:05.000Z"), "2025-01-02T03-04-05-000Z");
/// ```
#[must_use]
pub fn file_stamp(iso: &str) -> String {
    iso.replace([':', '.'], "-")
}

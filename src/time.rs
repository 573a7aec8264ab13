//! Time related utils.

use chrono::SecondsFormat;
use chrono::Utc;

use crate::Error;

/// DateTime in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Return the current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format a time into an ISO 8601 string without milliseconds.
///
/// ```shell
/// 2015-04-27T08:23:49Z
/// ```
///
/// This is the exact shape embedded in auth strings and Date headers; the
/// server reproduces it byte for byte while recomputing the signature.
pub fn format_iso8601(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an ISO 8601 string like `2015-04-27T08:23:49Z` into a [`DateTime`].
pub fn parse_iso8601(s: &str) -> crate::Result<DateTime> {
    let t = chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::request_invalid(format!("invalid timestamp {s}")).with_source(e))?;
    Ok(t.with_timezone(&Utc))
}

//! Time related utils.

use crate::{Error, Result};
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %T GMT").to_string()
}

/// Parse time from RFC3339.
///
/// All of them are valid time:
///
/// - `2022-03-13T07:20:04Z`
/// - `2022-03-01T08:12:34+00:00`
/// - `2022-03-01T08:12:34.123+00:00`
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    Ok(chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::unexpected(format!("invalid rfc3339 time: {s}")).with_source(e))?
        .with_timezone(&Utc))
}

/// Parse a unix timestamp in seconds.
pub fn from_unix_seconds(secs: i64) -> Result<DateTime> {
    chrono::DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::unexpected(format!("unix timestamp out of range: {secs}")))
}

/// Parse the `expires_on` field of a token response.
///
/// Identity endpoints return either unix seconds (`"1698760750"`) or an
/// RFC3339 string depending on the endpoint and api version.
pub fn parse_expires_on(s: &str) -> Result<DateTime> {
    let s = s.trim();
    match s.parse::<i64>() {
        Ok(secs) => from_unix_seconds(secs),
        Err(_) => parse_rfc3339(s),
    }
}

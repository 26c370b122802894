//! DATE and DATE-TIME value formatting (RFC 5545 §3.3.4, §3.3.5).

use chrono::{NaiveDate, NaiveDateTime};

/// Formats a DATE value in basic form (`YYYYMMDD`).
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Formats a DATE-TIME value in basic form, with a trailing `Z` when `utc` is set.
#[must_use]
pub fn format_datetime(dt: NaiveDateTime, utc: bool) -> String {
    let mut out = dt.format("%Y%m%dT%H%M%S").to_string();
    if utc {
        out.push('Z');
    }
    out
}

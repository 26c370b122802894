//! Calendar arithmetic shared by the occurrence iterator.

use chrono::{Datelike, Days, NaiveDate};

use crate::rfc::ical::core::Weekday;

/// Returns the number of days in a month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month + 1, 1)
        .or_else(|| NaiveDate::from_ymd_opt(year + 1, 1, 1))
        .map_or(31, |d| d.pred_opt().map_or(31, |p| p.day()))
}

/// Returns the number of days in a year.
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Adds `months` to a (year, month) pair. Returns `None` on overflow.
pub fn add_months(year: i32, month: u32, months: i64) -> Option<(i32, u32)> {
    let total = i64::from(year)
        .checked_mul(12)?
        .checked_add(i64::from(month) - 1)?
        .checked_add(months)?;
    let new_year = i32::try_from(total.div_euclid(12)).ok()?;
    let new_month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
    Some((new_year, new_month))
}

/// Days from `wkst` forward to the weekday of `date` (0..=6).
pub fn days_since_week_start(date: NaiveDate, wkst: Weekday) -> u32 {
    let day = date.weekday().num_days_from_monday();
    let start = wkst.to_chrono().num_days_from_monday();
    (day + 7 - start) % 7
}

/// Start of the week (beginning on `wkst`) that contains `date`.
pub fn week_start(date: NaiveDate, wkst: Weekday) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days_since_week_start(date, wkst))))
}

/// Start of week 1 of `year`: the first week with at least four days in that year.
fn first_week_start(year: i32, wkst: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let start = week_start(jan1, wkst)?;
    if days_since_week_start(jan1, wkst) <= 3 {
        Some(start)
    } else {
        start.checked_add_days(Days::new(7))
    }
}

/// Number of numbered weeks in `year` for weeks starting on `wkst` (52 or 53).
pub fn weeks_in_year(year: i32, wkst: Weekday) -> Option<u32> {
    let this = first_week_start(year, wkst)?;
    let next = first_week_start(year.checked_add(1)?, wkst)?;
    u32::try_from((next - this).num_days() / 7).ok()
}

/// Week-numbering year and week number of `date` (RFC 5545 BYWEEKNO rules).
///
/// Days before week 1 belong to the last week of the previous year, and days
/// in a final partial week of fewer than four days belong to week 1 of the next.
pub fn week_number(date: NaiveDate, wkst: Weekday) -> Option<(i32, u32)> {
    let year = date.year();
    let next_start = first_week_start(year.checked_add(1)?, wkst)?;
    let week_year = if date >= next_start {
        year + 1
    } else if date < first_week_start(year, wkst)? {
        year - 1
    } else {
        year
    };
    let start = first_week_start(week_year, wkst)?;
    let week = u32::try_from((date - start).num_days() / 7).ok()? + 1;
    Some((week_year, week))
}

/// Resolves a signed 1-based index against a list of `len` entries.
///
/// Positive values count from the start, negative values from the end.
pub fn resolve_index(value: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let idx = if value > 0 { value - 1 } else { len + value };
    if (0..len).contains(&idx) {
        usize::try_from(idx).ok()
    } else {
        None
    }
}

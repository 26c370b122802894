//! Value type parsers for RECUR and the DATE / DATE-TIME forms it embeds (RFC 5545 §3.3).
//!
//! Error sources are discarded during parsing (`map_err_ignore`); the
//! offending text is attached as context instead.
#![expect(
    clippy::map_err_ignore,
    reason = "Value parsers replace std parse errors with positioned ParseErrors"
)]

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    ByRule, ByRuleKind, Frequency, RRuleUntil, RecurrenceRule, Weekday, WeekdayNum,
};

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit calendar date.
pub fn parse_date(s: &str, col: usize) -> ParseResult<NaiveDate> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidDate, col).with_context(s);

    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year = s[0..4].parse::<i32>().map_err(|_| invalid())?;
    let month = s[4..6].parse::<u32>().map_err(|_| invalid())?;
    let day = s[6..8].parse::<u32>().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parses a TIME value (RFC 5545 §3.3.12), returning the time and whether it is UTC.
///
/// Format: HHMMSS[Z] (e.g., "133000", "133000Z")
///
/// ## Errors
/// Returns an error if the string is not a valid 6-digit time.
pub fn parse_time(s: &str, col: usize) -> ParseResult<(NaiveTime, bool)> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidTime, col).with_context(s);

    let (time_str, is_utc) = if let Some(stripped) = s.strip_suffix('Z') {
        (stripped, true)
    } else {
        (s, false)
    };

    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hour = time_str[0..2].parse::<u32>().map_err(|_| invalid())?;
    let minute = time_str[2..4].parse::<u32>().map_err(|_| invalid())?;
    let second = time_str[4..6].parse::<u32>().map_err(|_| invalid())?;

    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok((time, is_utc))
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5), returning the instant and whether it is UTC.
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// ## Errors
/// Returns an error if the string is not a valid datetime format.
pub fn parse_datetime(s: &str, col: usize) -> ParseResult<(NaiveDateTime, bool)> {
    let t_pos = s
        .find(['T', 't'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, col).with_context(s))?;

    let date = parse_date(&s[..t_pos], col)?;
    let (time, is_utc) = parse_time(&s[t_pos + 1..], col + t_pos + 1)?;

    Ok((date.and_time(time), is_utc))
}

/// Parses an instant written as DATE or DATE-TIME; a DATE yields local midnight.
///
/// A trailing `Z` is accepted and dropped: instants are compared as wall-clock values.
///
/// ## Errors
/// Returns an error if the string is neither a DATE nor a DATE-TIME.
pub fn parse_instant(s: &str) -> ParseResult<NaiveDateTime> {
    let s = s.trim();
    if s.contains(['T', 't']) {
        parse_datetime(s, 1).map(|(dt, _)| dt)
    } else {
        parse_date(s, 1).map(|d| d.and_time(NaiveTime::MIN))
    }
}

/// Parses the UNTIL value of a RECUR (DATE or DATE-TIME, UTC when suffixed with `Z`).
///
/// ## Errors
/// Returns an error if the value is neither a DATE nor a DATE-TIME.
pub fn parse_until(s: &str, col: usize) -> ParseResult<RRuleUntil> {
    if s.contains(['T', 't']) {
        let (dt, is_utc) = parse_datetime(s, col)?;
        Ok(if is_utc {
            RRuleUntil::Utc(dt)
        } else {
            RRuleUntil::Floating(dt)
        })
    } else {
        parse_date(s, col).map(RRuleUntil::Date)
    }
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a valid integer.
pub fn parse_integer(s: &str, col: usize) -> ParseResult<i64> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, col).with_context(s))
}

/// Parses a RECUR value (RFC 5545 §3.3.10).
///
/// Rule part names are case-insensitive and may appear in any order; empty
/// segments (`FREQ=DAILY;;COUNT=2;`) are skipped. COUNT and UNTIL may both
/// be present.
///
/// ## Errors
/// Returns an error if FREQ is missing, a rule part is unknown or repeated,
/// or a value is malformed or out of range.
pub fn parse_rrule(s: &str) -> ParseResult<RecurrenceRule> {
    let mut freq: Option<Frequency> = None;
    let mut interval: Option<i64> = None;
    let mut count: Option<u32> = None;
    let mut until: Option<RRuleUntil> = None;
    let mut wkst: Option<Weekday> = None;
    let mut parts: Vec<ByRule> = Vec::new();

    let mut offset = 0;
    for segment in s.split(';') {
        let col = offset + 1;
        offset += segment.len() + 1;

        if segment.trim().is_empty() {
            continue;
        }

        let (key, value) = segment.split_once('=').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidRRule, col).with_context(segment)
        })?;
        let key = key.trim().to_ascii_uppercase();
        let value = value.trim();

        match key.as_str() {
            "FREQ" => {
                let parsed = Frequency::parse(value).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidFrequency, col).with_context(value)
                })?;
                set_once(&mut freq, parsed, &key, col)?;
            }
            "INTERVAL" => set_once(&mut interval, parse_integer(value, col)?, &key, col)?,
            "COUNT" => set_once(&mut count, parse_count(value, col)?, &key, col)?,
            "UNTIL" => set_once(&mut until, parse_until(value, col)?, &key, col)?,
            "WKST" => {
                let parsed = Weekday::parse(value).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidWeekday, col).with_context(value)
                })?;
                set_once(&mut wkst, parsed, &key, col)?;
            }
            _ => {
                let kind = ByRuleKind::parse(&key).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::UnknownRulePart, col).with_context(key.clone())
                })?;
                if parts.iter().any(|p| p.kind() == kind) {
                    return Err(ParseError::new(ParseErrorKind::DuplicateRulePart, col)
                        .with_context(key.clone()));
                }
                parts.push(parse_by_rule(kind, value, col)?);
            }
        }
    }

    let freq = freq.ok_or_else(|| ParseError::new(ParseErrorKind::MissingFrequency, 1))?;
    let mut rule = RecurrenceRule::new(freq);
    if let Some(interval) = interval {
        rule.set_interval(interval);
    }
    rule.count = count;
    rule.until = until;
    if let Some(wkst) = wkst {
        rule.wkst = wkst;
    }
    for part in parts {
        rule.set_part(part);
    }

    Ok(rule)
}

fn set_once<T>(slot: &mut Option<T>, value: T, name: &str, col: usize) -> ParseResult<()> {
    if slot.is_some() {
        return Err(ParseError::new(ParseErrorKind::DuplicateRulePart, col).with_context(name));
    }
    *slot = Some(value);
    Ok(())
}

/// Parses the COUNT component of an RRULE.
fn parse_count(value: &str, col: usize) -> ParseResult<u32> {
    let n = parse_integer(value, col)?;
    u32::try_from(n)
        .map_err(|_| ParseError::new(ParseErrorKind::OutOfRange, col).with_context(format!("COUNT={value}")))
}

/// Parses the value list of a single BYxxx rule part.
///
/// ## Errors
/// Returns an error if any list element is malformed or out of range for `kind`.
pub fn parse_by_rule(kind: ByRuleKind, value: &str, col: usize) -> ParseResult<ByRule> {
    if kind == ByRuleKind::Day {
        return value
            .split(',')
            .map(|v| parse_weekday_num(v, col))
            .collect::<ParseResult<Vec<_>>>()
            .map(ByRule::Day);
    }

    let numbers = value
        .split(',')
        .map(|v| check_range(kind, parse_integer(v, col)?, col))
        .collect::<ParseResult<Vec<_>>>()?;
    by_rule_from_numbers(kind, numbers, col)
}

/// Checks a numeric rule part value against the range allowed for `kind`.
///
/// ## Errors
/// Returns `OutOfRange` if the value lies outside the part's range, or is zero
/// where zero is not permitted.
pub(crate) fn check_range(kind: ByRuleKind, value: i64, col: usize) -> ParseResult<i16> {
    let out_of_range =
        || ParseError::new(ParseErrorKind::OutOfRange, col).with_context(format!("{kind}={value}"));

    let (min, max, zero_ok) = kind.range().ok_or_else(out_of_range)?;
    let value = i16::try_from(value).map_err(|_| out_of_range())?;
    if value < min || value > max || (value == 0 && !zero_ok) {
        return Err(out_of_range());
    }
    Ok(value)
}

/// Narrows range-checked numbers into the typed list for `kind`.
pub(crate) fn by_rule_from_numbers(
    kind: ByRuleKind,
    numbers: Vec<i16>,
    col: usize,
) -> ParseResult<ByRule> {
    fn narrow<T: TryFrom<i16>>(numbers: Vec<i16>) -> Option<Vec<T>> {
        numbers.into_iter().map(|n| T::try_from(n).ok()).collect()
    }

    let part = match kind {
        ByRuleKind::Second => narrow(numbers).map(ByRule::Second),
        ByRuleKind::Minute => narrow(numbers).map(ByRule::Minute),
        ByRuleKind::Hour => narrow(numbers).map(ByRule::Hour),
        ByRuleKind::Month => narrow(numbers).map(ByRule::Month),
        ByRuleKind::MonthDay => narrow(numbers).map(ByRule::MonthDay),
        ByRuleKind::WeekNo => narrow(numbers).map(ByRule::WeekNo),
        ByRuleKind::YearDay => Some(ByRule::YearDay(numbers)),
        ByRuleKind::SetPos => Some(ByRule::SetPos(numbers)),
        ByRuleKind::Day => None,
    };
    part.ok_or_else(|| ParseError::new(ParseErrorKind::OutOfRange, col).with_context(kind.as_str()))
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
///
/// ## Errors
/// Returns an error for an unknown weekday or an ordinal outside ±1..=53.
pub fn parse_weekday_num(s: &str, col: usize) -> ParseResult<WeekdayNum> {
    let s = s.trim();
    let invalid = || ParseError::new(ParseErrorKind::InvalidWeekday, col).with_context(s);

    if s.len() < 2 || !s.is_char_boundary(s.len() - 2) {
        return Err(invalid());
    }

    let (ordinal_str, weekday_str) = s.split_at(s.len() - 2);
    let weekday = Weekday::parse(weekday_str).ok_or_else(invalid)?;

    let ordinal = match ordinal_str {
        "" | "+" | "-" => None,
        text => {
            if !text.trim_start_matches(['+', '-']).bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let n = text.parse::<i8>().map_err(|_| invalid())?;
            if n == 0 || !(-53..=53).contains(&n) {
                return Err(ParseError::new(ParseErrorKind::OutOfRange, col).with_context(s));
            }
            Some(n)
        }
    };

    Ok(WeekdayNum { ordinal, weekday })
}

impl FromStr for WeekdayNum {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_weekday_num(s, 1)
    }
}

impl FromStr for RecurrenceRule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_rrule(s)
    }
}

impl RecurrenceRule {
    /// ## Summary
    /// Appends textual values (one, or a comma-separated list) to a rule part,
    /// creating the part when it is not yet set.
    ///
    /// ## Errors
    /// Returns an error if a value is malformed or out of range for `kind`.
    pub fn add_part_value(&mut self, kind: ByRuleKind, value: &str) -> ParseResult<()> {
        let parsed = parse_by_rule(kind, value, 1)?;
        match self.part_mut(kind) {
            Some(existing) => {
                existing.append(parsed);
            }
            None => self.set_part(parsed),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_basic() {
        let date = parse_date("20260123", 1).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("2026012", 1).is_err()); // Too short
        assert!(parse_date("20261301", 1).is_err()); // Invalid month
        assert!(parse_date("20230229", 1).is_err()); // Not a leap year
        assert!(parse_date("2026-1-23", 1).is_err());
    }

    #[test]
    fn parse_time_utc() {
        let (time, is_utc) = parse_time("120000Z", 1).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(is_utc);
    }

    #[test]
    fn parse_time_local() {
        let (time, is_utc) = parse_time("133000", 1).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert!(!is_utc);
    }

    #[test]
    fn parse_datetime_utc_and_floating() {
        let (dt, is_utc) = parse_datetime("20260123T120000Z", 1).unwrap();
        assert!(is_utc);
        assert_eq!(dt.to_string(), "2026-01-23 12:00:00");

        let (_, is_utc) = parse_datetime("20260123T120000", 1).unwrap();
        assert!(!is_utc);
    }

    #[test]
    fn parse_datetime_reports_time_column() {
        let err = parse_datetime("20260123T250000", 7).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidTime);
        assert_eq!(err.column, 16);
    }

    #[test]
    fn parse_instant_date_is_midnight() {
        let dt = parse_instant("20240105").unwrap();
        assert_eq!(dt.to_string(), "2024-01-05 00:00:00");
        let dt = parse_instant("20240105T093000Z").unwrap();
        assert_eq!(dt.to_string(), "2024-01-05 09:30:00");
    }

    #[test]
    fn parse_until_forms() {
        assert!(matches!(parse_until("20121012", 1).unwrap(), RRuleUntil::Date(_)));
        assert!(matches!(
            parse_until("20121012T000000", 1).unwrap(),
            RRuleUntil::Floating(_)
        ));
        assert!(matches!(
            parse_until("20121012T000000Z", 1).unwrap(),
            RRuleUntil::Utc(_)
        ));
    }

    #[test]
    fn parse_rrule_basic() {
        let rrule = parse_rrule("FREQ=DAILY;COUNT=10").unwrap();
        assert_eq!(rrule.freq, Frequency::Daily);
        assert_eq!(rrule.count, Some(10));
        assert_eq!(rrule.interval(), 1);
    }

    #[test]
    fn parse_rrule_weekly_byday() {
        let rrule = parse_rrule("FREQ=WEEKLY;BYDAY=MO,WE,FR").unwrap();
        assert_eq!(rrule.freq, Frequency::Weekly);
        assert_eq!(rrule.by_day().len(), 3);
    }

    #[test]
    fn parse_rrule_monthly_nth() {
        let rrule: RecurrenceRule = "FREQ=MONTHLY;BYDAY=-1FR".parse().unwrap();
        assert_eq!(rrule.by_day().len(), 1);
        assert_eq!(rrule.by_day()[0].ordinal, Some(-1));
        assert_eq!(rrule.by_day()[0].weekday, Weekday::Friday);
    }

    #[test]
    fn parse_rrule_lowercase_keys_and_empty_segments() {
        let rrule = parse_rrule("freq=weekly;;byday=mo;interval=2;").unwrap();
        assert_eq!(rrule.to_string(), "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO");
    }

    #[test]
    fn parse_rrule_count_and_until_together() {
        let rrule = parse_rrule("FREQ=DAILY;COUNT=10;UNTIL=20260131").unwrap();
        assert_eq!(rrule.count, Some(10));
        assert!(rrule.until.is_some());
        assert!(!rrule.is_by_count());
    }

    #[test]
    fn parse_rrule_missing_freq() {
        let err = parse_rrule("COUNT=3;BYDAY=MO").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingFrequency);
    }

    #[test]
    fn parse_rrule_unknown_part() {
        let err = parse_rrule("FREQ=DAILY;BYFOO=1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownRulePart);
        assert_eq!(err.column, 12);
    }

    #[test]
    fn parse_rrule_duplicate_part() {
        let err = parse_rrule("FREQ=DAILY;BYHOUR=1;BYHOUR=2").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateRulePart);
    }

    #[test]
    fn parse_rrule_out_of_range() {
        for text in [
            "FREQ=DAILY;BYHOUR=24",
            "FREQ=DAILY;BYMINUTE=60",
            "FREQ=DAILY;BYSECOND=61",
            "FREQ=MONTHLY;BYMONTHDAY=0",
            "FREQ=MONTHLY;BYMONTHDAY=32",
            "FREQ=YEARLY;BYYEARDAY=-367",
            "FREQ=YEARLY;BYWEEKNO=54",
            "FREQ=YEARLY;BYMONTH=13",
            "FREQ=MONTHLY;BYDAY=MO;BYSETPOS=0",
            "FREQ=YEARLY;BYDAY=54MO",
        ] {
            let err = parse_rrule(text).unwrap_err();
            assert_eq!(err.kind, ParseErrorKind::OutOfRange, "{text}");
        }
    }

    #[test]
    fn parse_rrule_bad_values() {
        assert_eq!(
            parse_rrule("FREQ=FORTNIGHTLY").unwrap_err().kind,
            ParseErrorKind::InvalidFrequency
        );
        assert_eq!(
            parse_rrule("FREQ=WEEKLY;BYDAY=XX").unwrap_err().kind,
            ParseErrorKind::InvalidWeekday
        );
        assert_eq!(
            parse_rrule("FREQ=DAILY;COUNT=ten").unwrap_err().kind,
            ParseErrorKind::InvalidInteger
        );
        assert_eq!(
            parse_rrule("FREQ=DAILY;COUNT").unwrap_err().kind,
            ParseErrorKind::InvalidRRule
        );
        assert_eq!(
            parse_rrule("FREQ=DAILY;UNTIL=2026").unwrap_err().kind,
            ParseErrorKind::InvalidDate
        );
    }

    #[test]
    fn parse_rrule_interval_floor() {
        assert_eq!(parse_rrule("FREQ=DAILY;INTERVAL=0").unwrap().interval(), 1);
        assert_eq!(parse_rrule("FREQ=DAILY;INTERVAL=-3").unwrap().interval(), 1);
    }

    #[test]
    fn text_round_trip_preserves_part_order() {
        for text in [
            "FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU",
            "FREQ=MONTHLY;COUNT=3;BYDAY=TU,WE,TH;BYSETPOS=3",
            "FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH;UNTIL=19971224T000000Z;WKST=SU",
            "FREQ=DAILY;BYHOUR=9,10,11;BYMINUTE=0,30",
        ] {
            assert_eq!(parse_rrule(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn weekday_num_from_str() {
        assert_eq!("MO".parse::<WeekdayNum>().unwrap(), WeekdayNum::every(Weekday::Monday));
        assert_eq!("+2tu".parse::<WeekdayNum>().unwrap(), WeekdayNum::nth(2, Weekday::Tuesday));
        assert_eq!("-1FR".parse::<WeekdayNum>().unwrap(), WeekdayNum::nth(-1, Weekday::Friday));
        assert!("0MO".parse::<WeekdayNum>().is_err());
        assert!("1X".parse::<WeekdayNum>().is_err());
        assert!("M".parse::<WeekdayNum>().is_err());
    }

    #[test]
    fn add_part_value_appends_and_creates() {
        let mut rule = parse_rrule("FREQ=WEEKLY;BYDAY=MO").unwrap();
        rule.add_part_value(ByRuleKind::Day, "WE").unwrap();
        rule.add_part_value(ByRuleKind::Hour, "9,17").unwrap();
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;BYDAY=MO,WE;BYHOUR=9,17");

        assert!(rule.add_part_value(ByRuleKind::Hour, "25").is_err());
        assert_eq!(rule.by_hour(), &[9, 17]);
    }
}

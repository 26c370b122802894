//! Structured RECUR values as carried by jCal (RFC 7265 §3.6.10).
//!
//! Keys are matched case-insensitively. A by-part may be a scalar or a list;
//! numeric values may also be written as numeric strings.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::values::{by_rule_from_numbers, check_range, parse_weekday_num};
use crate::rfc::ical::core::{
    ByRule, ByRuleKind, Frequency, RRuleUntil, RecurData, RecurrenceRule, Weekday,
};

/// Parses a structured RECUR value.
///
/// The reported column is the 1-based position of the offending key.
///
/// ## Errors
/// Returns an error if `freq` is missing, a key is unknown, or a value has the
/// wrong type or lies outside its range.
pub fn parse_recur_data(data: &RecurData) -> ParseResult<RecurrenceRule> {
    let mut freq: Option<Frequency> = None;
    let mut interval: Option<i64> = None;
    let mut count: Option<u32> = None;
    let mut until: Option<RRuleUntil> = None;
    let mut wkst: Option<Weekday> = None;
    let mut parts: Vec<ByRule> = Vec::new();

    for (idx, (key, value)) in data.iter().enumerate() {
        let pos = idx + 1;
        if value.is_null() {
            continue;
        }

        match key.to_ascii_lowercase().as_str() {
            "freq" => {
                let text = value_str(value, key, pos)?;
                freq = Some(Frequency::parse(text).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidFrequency, pos).with_context(text)
                })?);
            }
            "interval" => interval = Some(value_i64(value, key, pos)?),
            "count" => {
                let n = value_i64(value, key, pos)?;
                count = Some(u32::try_from(n).map_err(|_e| {
                    ParseError::new(ParseErrorKind::OutOfRange, pos).with_context(format!("count={n}"))
                })?);
            }
            "until" => until = Some(parse_jcal_until(value_str(value, key, pos)?, pos)?),
            "wkst" => wkst = Some(parse_wkst(value, pos)?),
            other => {
                let kind = ByRuleKind::parse(other).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::UnknownRulePart, pos).with_context(key.clone())
                })?;
                if parts.iter().any(|p| p.kind() == kind) {
                    return Err(ParseError::new(ParseErrorKind::DuplicateRulePart, pos)
                        .with_context(key.clone()));
                }
                parts.push(parse_data_part(kind, value, pos)?);
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

impl RecurrenceRule {
    /// ## Summary
    /// Builds a rule from its structured form.
    ///
    /// ## Errors
    /// See [`parse_recur_data`].
    pub fn from_data(data: &RecurData) -> ParseResult<Self> {
        parse_recur_data(data)
    }
}

fn parse_data_part(kind: ByRuleKind, value: &Value, pos: usize) -> ParseResult<ByRule> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        scalar => vec![scalar],
    };

    if kind == ByRuleKind::Day {
        return items
            .into_iter()
            .map(|item| parse_weekday_num(value_str(item, kind.as_str(), pos)?, pos))
            .collect::<ParseResult<Vec<_>>>()
            .map(ByRule::Day);
    }

    let numbers = items
        .into_iter()
        .map(|item| check_range(kind, value_i64(item, kind.as_str(), pos)?, pos))
        .collect::<ParseResult<Vec<_>>>()?;
    by_rule_from_numbers(kind, numbers, pos)
}

fn parse_wkst(value: &Value, pos: usize) -> ParseResult<Weekday> {
    let invalid = || ParseError::new(ParseErrorKind::InvalidWeekday, pos).with_context(value.to_string());

    match value {
        Value::String(s) => Weekday::parse(s).ok_or_else(invalid),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Weekday::from_number)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parses a jCal UNTIL: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or the same with `Z`.
fn parse_jcal_until(s: &str, pos: usize) -> ParseResult<RRuleUntil> {
    if s.contains('T') {
        let (text, is_utc) = match s.strip_suffix('Z') {
            Some(stripped) => (stripped, true),
            None => (s, false),
        };
        let dt = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").map_err(|_e| {
            ParseError::new(ParseErrorKind::InvalidDateTime, pos).with_context(s)
        })?;
        Ok(if is_utc {
            RRuleUntil::Utc(dt)
        } else {
            RRuleUntil::Floating(dt)
        })
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(RRuleUntil::Date)
            .map_err(|_e| ParseError::new(ParseErrorKind::InvalidDate, pos).with_context(s))
    }
}

fn value_str<'a>(value: &'a Value, key: &str, pos: usize) -> ParseResult<&'a str> {
    value.as_str().ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidValue, pos).with_context(format!("{key}: {value}"))
    })
}

fn value_i64(value: &Value, key: &str, pos: usize) -> ParseResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidInteger, pos).with_context(format!("{key}: {value}"))
    })
}

//! Structured RECUR output (RFC 7265 §3.6.10).

use serde_json::Value;

use crate::rfc::ical::core::{ByRule, RRuleUntil, RecurData, RecurrenceRule, Weekday};

/// Converts a rule to its structured form.
///
/// Keys follow the text order: `freq`, `count`, `interval` (only when above 1),
/// the by-parts in insertion order, `until`, then `wkst` (only when not Monday).
/// Single-value lists are written as scalars.
#[must_use]
pub fn to_recur_data(rule: &RecurrenceRule) -> RecurData {
    let mut data = RecurData::new();
    data.insert("freq".to_string(), Value::from(rule.freq.as_str()));

    if let Some(count) = rule.count {
        data.insert("count".to_string(), Value::from(count));
    }
    if rule.interval() > 1 {
        data.insert("interval".to_string(), Value::from(rule.interval()));
    }

    for part in rule.parts() {
        let key = part.kind().as_str().to_ascii_lowercase();
        data.insert(key, part_value(part));
    }

    if let Some(until) = rule.until {
        data.insert("until".to_string(), Value::from(jcal_until(until)));
    }
    if rule.wkst != Weekday::Monday {
        data.insert("wkst".to_string(), Value::from(rule.wkst.as_str()));
    }

    data
}

impl RecurrenceRule {
    /// Converts this rule to its structured form. See [`to_recur_data`].
    #[must_use]
    pub fn to_data(&self) -> RecurData {
        to_recur_data(self)
    }
}

fn part_value(part: &ByRule) -> Value {
    fn collapse(mut values: Vec<Value>) -> Value {
        if values.len() == 1 {
            values.pop().unwrap_or(Value::Null)
        } else {
            Value::Array(values)
        }
    }
    fn numbers<T: Copy + Into<Value>>(values: &[T]) -> Vec<Value> {
        values.iter().map(|&v| v.into()).collect()
    }

    collapse(match part {
        ByRule::Second(v) | ByRule::Minute(v) | ByRule::Hour(v) | ByRule::Month(v) => numbers(v),
        ByRule::MonthDay(v) | ByRule::WeekNo(v) => numbers(v),
        ByRule::YearDay(v) | ByRule::SetPos(v) => numbers(v),
        ByRule::Day(v) => v.iter().map(|d| Value::from(d.to_string())).collect(),
    })
}

fn jcal_until(until: RRuleUntil) -> String {
    match until {
        RRuleUntil::Date(d) => d.format("%Y-%m-%d").to_string(),
        RRuleUntil::Floating(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        RRuleUntil::Utc(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    }
}

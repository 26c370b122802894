//! Core types for recurrence rules.

mod rrule;

pub use rrule::{
    ByRule, ByRuleKind, Frequency, RRuleUntil, RecurData, RecurrenceRule, Weekday, WeekdayNum,
};

//! iCalendar recurrence (RFC 5545 §3.3.10, §3.8.5) implementation.
//!
//! - `core`: Rule model types
//! - `parse`: RECUR text and structured value parsers
//! - `build`: Structured output and instant formatting
//! - `expand`: Occurrence iteration and recurrence set expansion
//!
//! ## Example
//!
//! ```rust
//! use kunai_rfc::rfc::ical::{RecurrenceRule, RecurrenceSet, parse::parse_instant};
//!
//! let dtstart = parse_instant("20120101T090000").unwrap();
//! let rule: RecurrenceRule = "FREQ=WEEKLY;BYDAY=MO,TH;WKST=SU;COUNT=4".parse().unwrap();
//!
//! let set = RecurrenceSet::new(dtstart).with_rrule(rule);
//! let occurrences: Vec<_> = set.expansion().unwrap().map(Result::unwrap).collect();
//! assert_eq!(occurrences.len(), 4);
//! ```

pub mod build;
pub mod core;
pub mod expand;
pub mod parse;

// Re-export commonly used items at module level
pub use self::core::{
    ByRule, ByRuleKind, Frequency, RRuleUntil, RecurData, RecurrenceRule, Weekday, WeekdayNum,
};
pub use expand::{ExpansionError, OccurrenceIterator, RecurrenceExpansion, RecurrenceSet};
pub use parse::{ParseError, ParseResult, parse_rrule};

//! Recurrence expansion for iCalendar components.
//!
//! This module expands recurrence rules (RRULE) into occurrences according
//! to RFC 5545 §3.3.10, and merges them with RDATE and EXDATE lists.

mod calendar;
mod error;
mod expansion;
mod iterator;
mod set;

pub use error::ExpansionError;
pub use expansion::{ExpansionSnapshot, MAX_MERGE_RETRIES, RecurrenceExpansion};
pub use iterator::{
    IteratorSnapshot, MAX_EMPTY_PERIODS, NormalizedRule, OccurrenceIterator, PeriodSet,
    validate_rule,
};
pub use set::{ExpansionOptions, RecurrenceSet, expand_rrule};

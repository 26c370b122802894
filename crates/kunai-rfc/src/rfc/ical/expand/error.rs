//! Recurrence expansion errors.

use crate::rfc::ical::core::{Frequency, WeekdayNum};

/// Error during recurrence expansion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    /// Rule parts that cannot be used together, or not with this frequency.
    #[error("Invalid recurrence rule: {0}")]
    InvalidCombination(&'static str),

    /// BYDAY ordinal not allowed for the rule's frequency.
    #[error("BYDAY value {value} is not valid for {freq} rules")]
    InvalidPosition { value: WeekdayNum, freq: Frequency },

    /// Too many consecutive periods produced no occurrence.
    #[error("No occurrence found in {limit} consecutive periods; the rule may be impossible to fulfill")]
    PeriodLimitExceeded { limit: u32 },

    /// Too many merge candidates were excluded in a row.
    #[error("Gave up after {limit} merge attempts; the recurrence set may be impossible to fulfill")]
    MergeRetriesExceeded { limit: u32 },

    /// Snapshot state that cannot be resumed.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

//! Recurrence value parsing error types.

use std::fmt;

/// Result type for recurrence parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Error type for recurrence parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Kind of error.
    pub kind: ParseErrorKind,
    /// Column where the offending rule part or value starts (1-based).
    pub column: usize,
    /// Additional context about the error.
    pub context: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: ParseErrorKind, column: usize) -> Self {
        Self {
            kind,
            column,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at column {}", self.kind, self.column)?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kinds of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Invalid date format.
    InvalidDate,
    /// Invalid time format.
    InvalidTime,
    /// Invalid date-time format.
    InvalidDateTime,
    /// Invalid recurrence rule.
    InvalidRRule,
    /// Rule part name not defined for RECUR values.
    UnknownRulePart,
    /// Rule part given more than once.
    DuplicateRulePart,
    /// Missing FREQ rule part.
    MissingFrequency,
    /// Invalid rule part value.
    InvalidValue,
    /// Invalid integer value.
    InvalidInteger,
    /// Numeric value outside the range allowed for its rule part.
    OutOfRange,
    /// Invalid frequency.
    InvalidFrequency,
    /// Invalid weekday.
    InvalidWeekday,
    /// Content line other than DTSTART, RRULE, RDATE or EXDATE.
    UnknownProperty,
    /// Recurrence set without a DTSTART line.
    MissingStart,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate => write!(f, "invalid date format"),
            Self::InvalidTime => write!(f, "invalid time format"),
            Self::InvalidDateTime => write!(f, "invalid date-time format"),
            Self::InvalidRRule => write!(f, "invalid recurrence rule"),
            Self::UnknownRulePart => write!(f, "unknown rule part"),
            Self::DuplicateRulePart => write!(f, "duplicate rule part"),
            Self::MissingFrequency => write!(f, "missing FREQ rule part"),
            Self::InvalidValue => write!(f, "invalid rule part value"),
            Self::InvalidInteger => write!(f, "invalid integer value"),
            Self::OutOfRange => write!(f, "value out of range"),
            Self::InvalidFrequency => write!(f, "invalid frequency"),
            Self::InvalidWeekday => write!(f, "invalid weekday"),
            Self::UnknownProperty => write!(f, "unknown recurrence property"),
            Self::MissingStart => write!(f, "missing DTSTART property"),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

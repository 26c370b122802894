//! Recurrence parsing primitives (RFC 5545 §3.3.10, RFC 7265 §3.6.10).
//!
//! - Values: RECUR text, DATE and DATE-TIME values
//! - Data: structured (jCal) RECUR values
//! - Set: DTSTART/RRULE/RDATE/EXDATE content lines

mod data;
mod error;
mod set;
mod values;

pub use data::parse_recur_data;
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use set::parse_recurrence_set;
pub use values::{
    parse_by_rule, parse_date, parse_datetime, parse_instant, parse_integer, parse_rrule,
    parse_time, parse_until, parse_weekday_num,
};

//! Recurrence serialization.
//!
//! The RECUR text form is produced by `Display` on the core types; this
//! module covers the structured form and instant formatting.

mod data;
mod values;

pub use data::to_recur_data;
pub use values::{format_date, format_datetime};

use thiserror::Error;

use crate::rfc::ical::expand::ExpansionError;
use crate::rfc::ical::parse::ParseError;

/// Recurrence parsing and expansion errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Expansion error: {0}")]
    Expansion(#[from] ExpansionError),

    #[error(transparent)]
    CoreError(#[from] kunai_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;

//! Recurrence sets (RFC 5545 §3.8.5) and range expansion.

use chrono::NaiveDateTime;
use kunai_core::config::DEFAULT_MAX_INSTANCES;
use kunai_core::error::CoreError;
use tracing::warn;

use super::error::ExpansionError;
use super::expansion::RecurrenceExpansion;
use crate::error::RfcResult;
use crate::rfc::ical::core::RecurrenceRule;
use crate::rfc::ical::parse::parse_rrule;

/// ## Summary
/// A set of recurring instances, combining RRULEs, RDATEs and EXDATEs.
///
/// The occurrences are the union of every rule's expansion and the RDATEs,
/// minus the EXDATEs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSet {
    /// The start instant every rule is anchored at.
    pub dtstart: NaiveDateTime,

    /// Recurrence rules (RRULE).
    pub rrules: Vec<RecurrenceRule>,

    /// Additional recurrence dates (RDATE).
    pub rdates: Vec<NaiveDateTime>,

    /// Exception dates (EXDATE) - occurrences to exclude.
    pub exdates: Vec<NaiveDateTime>,
}

impl RecurrenceSet {
    /// Creates a new recurrence set with the given start instant.
    #[must_use]
    pub fn new(dtstart: NaiveDateTime) -> Self {
        Self {
            dtstart,
            rrules: Vec::new(),
            rdates: Vec::new(),
            exdates: Vec::new(),
        }
    }

    /// Adds a recurrence rule.
    #[must_use]
    pub fn with_rrule(mut self, rrule: RecurrenceRule) -> Self {
        self.rrules.push(rrule);
        self
    }

    /// Adds an RDATE.
    #[must_use]
    pub fn with_rdate(mut self, rdate: NaiveDateTime) -> Self {
        self.rdates.push(rdate);
        self
    }

    /// Adds an EXDATE.
    #[must_use]
    pub fn with_exdate(mut self, exdate: NaiveDateTime) -> Self {
        self.exdates.push(exdate);
        self
    }

    /// Whether the set has any RRULE or RDATE.
    #[must_use]
    pub fn has_recurrence(&self) -> bool {
        !self.rrules.is_empty() || !self.rdates.is_empty()
    }

    /// ## Summary
    /// Starts a lazy expansion of the set.
    ///
    /// ## Errors
    /// Returns an error if a rule is invalid.
    pub fn expansion(&self) -> Result<RecurrenceExpansion, ExpansionError> {
        RecurrenceExpansion::new(self)
    }

    /// ## Summary
    /// Expands the set within the range given by `options`.
    ///
    /// Occurrences at or after `range_start` and before `range_end` are kept,
    /// up to `max_instances`. The expansion seeks straight to `range_start`,
    /// except for rules with COUNT which are walked from the start.
    ///
    /// ## Errors
    /// Returns an error if a rule is invalid or the expansion gives up on an
    /// impossible rule or set.
    pub fn expand(&self, options: &ExpansionOptions) -> Result<Vec<NaiveDateTime>, ExpansionError> {
        let mut expansion = self.expansion()?;
        if let Some(start) = options.range_start {
            expansion.seek(start)?;
        }
        let in_range_end = |dt: NaiveDateTime| options.range_end.is_none_or(|end| dt < end);

        let mut occurrences = Vec::new();
        while let Some(occurrence) = expansion.next_occurrence()? {
            if !in_range_end(occurrence) {
                break;
            }
            if options.range_start.is_some_and(|start| occurrence < start) {
                continue;
            }
            occurrences.push(occurrence);

            if occurrences.len() >= options.max_instances {
                if expansion.next_occurrence()?.is_some_and(in_range_end) {
                    warn!(
                        max_instances = options.max_instances,
                        dtstart = %self.dtstart,
                        "Recurrence expansion truncated at instance limit"
                    );
                }
                break;
            }
        }

        Ok(occurrences)
    }
}

/// Options for recurrence expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Maximum number of occurrences to generate.
    pub max_instances: usize,

    /// Start of time range filter (inclusive).
    pub range_start: Option<NaiveDateTime>,

    /// End of time range filter (exclusive).
    pub range_end: Option<NaiveDateTime>,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            max_instances: DEFAULT_MAX_INSTANCES,
            range_start: None,
            range_end: None,
        }
    }
}

impl ExpansionOptions {
    /// Creates expansion options with a time range.
    #[must_use]
    pub fn with_range(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            range_start: Some(start),
            range_end: Some(end),
            ..Self::default()
        }
    }

    /// Sets the maximum number of instances.
    #[must_use]
    pub fn with_max_instances(mut self, max: usize) -> Self {
        self.max_instances = max;
        self
    }
}

/// ## Summary
/// Expands an RRULE text with optional EXDATE/RDATE lists into occurrences.
///
/// ## Errors
///
/// Returns an error if:
/// - `max_instances` is zero
/// - The RRULE text is malformed
/// - The rule cannot be expanded
pub fn expand_rrule(
    rrule_text: &str,
    dtstart: NaiveDateTime,
    exdates: &[NaiveDateTime],
    rdates: &[NaiveDateTime],
    options: &ExpansionOptions,
) -> RfcResult<Vec<NaiveDateTime>> {
    if options.max_instances == 0 {
        return Err(CoreError::ValidationError("max_instances must be at least 1".to_string()).into());
    }

    let set = RecurrenceSet {
        dtstart,
        rrules: vec![parse_rrule(rrule_text)?],
        rdates: rdates.to_vec(),
        exdates: exdates.to_vec(),
    };

    Ok(set.expand(options)?)
}

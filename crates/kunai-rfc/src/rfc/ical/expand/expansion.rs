//! Merged expansion of a recurrence set: RRULE iterators, RDATEs and EXDATEs.
//!
//! Every rule iterator is primed on construction so that its last produced
//! value is its pending head. Each step takes the earliest pending instant
//! across the RDATE cursor and the heads, advances every source sitting on
//! that instant, and drops it if an EXDATE matches.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::error::ExpansionError;
use super::iterator::{IteratorSnapshot, OccurrenceIterator};
use super::set::RecurrenceSet;

/// Candidates excluded in a row before a set is treated as impossible to fulfill.
pub const MAX_MERGE_RETRIES: u32 = 500;

/// Lazily produces the occurrences of a [`RecurrenceSet`], in ascending order
/// and without duplicates.
#[derive(Debug, Clone)]
pub struct RecurrenceExpansion {
    dtstart: NaiveDateTime,
    iterators: Vec<OccurrenceIterator>,
    rdates: Vec<NaiveDateTime>,
    rdate_index: usize,
    exdates: Vec<NaiveDateTime>,
    exdate_index: usize,
    last: NaiveDateTime,
    complete: bool,
}

/// Serializable state of a [`RecurrenceExpansion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionSnapshot {
    pub dtstart: NaiveDateTime,
    pub iterators: Vec<IteratorSnapshot>,
    pub rdates: Vec<NaiveDateTime>,
    pub rdate_index: usize,
    pub exdates: Vec<NaiveDateTime>,
    pub exdate_index: usize,
    pub last: NaiveDateTime,
    pub complete: bool,
}

fn sorted_unique(values: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
    let mut values = values.to_vec();
    values.sort_unstable();
    values.dedup();
    values
}

impl RecurrenceExpansion {
    /// ## Summary
    /// Prepares the merged expansion of `set`.
    ///
    /// A set with neither RRULE nor RDATE produces its start instant alone
    /// (subject to EXDATE).
    ///
    /// ## Errors
    /// Returns an error if a rule is invalid or cannot produce its first
    /// occurrence within the period limit.
    pub fn new(set: &RecurrenceSet) -> Result<Self, ExpansionError> {
        let dtstart = set.dtstart;
        let mut rdates = sorted_unique(&set.rdates);
        let exdates = sorted_unique(&set.exdates);

        if set.rrules.is_empty() && rdates.is_empty() {
            rdates.push(dtstart);
        }

        let mut iterators = Vec::with_capacity(set.rrules.len());
        for rule in &set.rrules {
            let mut iter = rule.iterator(dtstart)?;
            iter.next_occurrence()?;
            iterators.push(iter);
        }

        let last = rdates.first().map_or(dtstart, |&first| first.min(dtstart));
        let exdate_index = exdates.partition_point(|ex| *ex < last);

        debug!(
            %dtstart,
            rules = iterators.len(),
            rdates = rdates.len(),
            exdates = exdates.len(),
            "Created recurrence expansion"
        );

        Ok(Self {
            dtstart,
            iterators,
            rdates,
            rdate_index: 0,
            exdates,
            exdate_index,
            last,
            complete: false,
        })
    }

    /// ## Summary
    /// Restores an expansion from a snapshot taken by [`RecurrenceExpansion::snapshot`].
    ///
    /// ## Errors
    /// Returns `InvalidSnapshot` if a cursor lies past its list, a list is not
    /// strictly ascending, or an iterator snapshot is invalid.
    pub fn from_snapshot(snapshot: ExpansionSnapshot) -> Result<Self, ExpansionError> {
        if snapshot.rdate_index > snapshot.rdates.len() {
            return Err(ExpansionError::InvalidSnapshot(format!(
                "rdate cursor {} past {} dates",
                snapshot.rdate_index,
                snapshot.rdates.len()
            )));
        }
        if snapshot.exdate_index > snapshot.exdates.len() {
            return Err(ExpansionError::InvalidSnapshot(format!(
                "exdate cursor {} past {} dates",
                snapshot.exdate_index,
                snapshot.exdates.len()
            )));
        }
        if !snapshot.rdates.is_sorted_by(|a, b| a < b)
            || !snapshot.exdates.is_sorted_by(|a, b| a < b)
        {
            return Err(ExpansionError::InvalidSnapshot(
                "date lists are not in ascending order".to_string(),
            ));
        }

        let iterators = snapshot
            .iterators
            .into_iter()
            .map(OccurrenceIterator::from_snapshot)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dtstart: snapshot.dtstart,
            iterators,
            rdates: snapshot.rdates,
            rdate_index: snapshot.rdate_index,
            exdates: snapshot.exdates,
            exdate_index: snapshot.exdate_index,
            last: snapshot.last,
            complete: snapshot.complete,
        })
    }

    /// Captures the expansion state.
    #[must_use]
    pub fn snapshot(&self) -> ExpansionSnapshot {
        ExpansionSnapshot {
            dtstart: self.dtstart,
            iterators: self.iterators.iter().map(OccurrenceIterator::snapshot).collect(),
            rdates: self.rdates.clone(),
            rdate_index: self.rdate_index,
            exdates: self.exdates.clone(),
            exdate_index: self.exdate_index,
            last: self.last,
            complete: self.complete,
        }
    }

    /// The most recently produced occurrence, or the earliest start before any.
    #[must_use]
    pub const fn last_occurrence(&self) -> NaiveDateTime {
        self.last
    }

    /// Whether the expansion will produce no further occurrences.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// ## Summary
    /// Moves the expansion ahead so that it no longer walks through the
    /// occurrences before `target` one by one.
    ///
    /// Occurrences before `target` may still be produced afterwards; rules
    /// with COUNT are still expanded from the start.
    ///
    /// ## Errors
    /// Propagates iterator errors while re-reading the moved heads.
    pub fn seek(&mut self, target: NaiveDateTime) -> Result<(), ExpansionError> {
        if self.complete {
            return Ok(());
        }

        for iter in &mut self.iterators {
            if iter.last_occurrence().is_some_and(|head| head < target) && iter.seek(target) {
                iter.next_occurrence()?;
            }
        }
        self.rdate_index = self.rdate_index.max(self.rdates.partition_point(|r| *r < target));
        self.exdate_index = self.exdate_index.max(self.exdates.partition_point(|ex| *ex < target));

        debug!(%target, rdate_index = self.rdate_index, "Seeked recurrence expansion");
        Ok(())
    }

    /// ## Summary
    /// Produces the next occurrence of the set, or `None` once every source
    /// is exhausted.
    ///
    /// ## Errors
    /// Returns `MergeRetriesExceeded` when [`MAX_MERGE_RETRIES`] candidates in
    /// a row are excluded, and propagates iterator errors.
    pub fn next_occurrence(&mut self) -> Result<Option<NaiveDateTime>, ExpansionError> {
        if self.complete {
            return Ok(None);
        }

        for _ in 0..MAX_MERGE_RETRIES {
            self.iterators.retain(|iter| !iter.is_completed());

            let rdate = self.rdates.get(self.rdate_index).copied();
            let head = self.iterators.iter().filter_map(OccurrenceIterator::last_occurrence).min();
            let candidate = match (rdate, head) {
                (None, None) => {
                    self.complete = true;
                    return Ok(None);
                }
                (Some(r), None) => r,
                (None, Some(h)) => h,
                (Some(r), Some(h)) => r.min(h),
            };

            if rdate == Some(candidate) {
                self.rdate_index += 1;
            }
            for iter in &mut self.iterators {
                if iter.last_occurrence() == Some(candidate) {
                    iter.next_occurrence()?;
                }
            }

            while self.exdates.get(self.exdate_index).is_some_and(|ex| *ex < candidate) {
                self.exdate_index += 1;
            }
            if self.exdates.get(self.exdate_index) == Some(&candidate) {
                self.exdate_index += 1;
                trace!(%candidate, "Occurrence excluded");
                continue;
            }

            self.last = candidate;
            return Ok(Some(candidate));
        }

        warn!(
            limit = MAX_MERGE_RETRIES,
            dtstart = %self.dtstart,
            "Recurrence set excluded too many candidates in a row"
        );
        Err(ExpansionError::MergeRetriesExceeded {
            limit: MAX_MERGE_RETRIES,
        })
    }
}

impl Iterator for RecurrenceExpansion {
    type Item = Result<NaiveDateTime, ExpansionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_occurrence().transpose()
    }
}

#[cfg(test)]
#[path = "expansion_tests.rs"]
mod tests;

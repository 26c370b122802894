//! Occurrence iterator for a single recurrence rule (RFC 5545 §3.3.10).
//!
//! Periods of the rule's frequency are numbered from the one containing the
//! start instant, stepping by INTERVAL. Each visited period is expanded into
//! its matching days and times of day (BYxxx expansion and limiting), with
//! BYSETPOS resolved to indices of their product. Occurrences are built from
//! that product one at a time.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::calendar;
use super::error::ExpansionError;
use crate::rfc::ical::core::{Frequency, RecurrenceRule, Weekday, WeekdayNum};

/// Consecutive periods visited without an occurrence before a rule is
/// treated as impossible to fulfill.
pub const MAX_EMPTY_PERIODS: u32 = 10_000;

/// Rule data as used for expansion: lists sorted and de-duplicated, and the
/// fields implied by the start instant filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRule {
    pub freq: Frequency,
    pub interval: u32,
    pub wkst: Weekday,
    /// Last instant covered by UNTIL.
    pub until: Option<NaiveDateTime>,
    pub count: Option<u32>,
    pub by_second: Vec<u8>,
    pub by_minute: Vec<u8>,
    pub by_hour: Vec<u8>,
    pub by_day: Vec<WeekdayNum>,
    pub by_monthday: Vec<i8>,
    pub by_yearday: Vec<i16>,
    pub by_weekno: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_setpos: Vec<i16>,
}

impl NormalizedRule {
    fn new(rule: &RecurrenceRule, dtstart: NaiveDateTime) -> Self {
        fn sorted<T: Ord + Clone>(values: &[T]) -> Vec<T> {
            let mut values = values.to_vec();
            values.sort_unstable();
            values.dedup();
            values
        }
        fn field(value: u32) -> u8 {
            u8::try_from(value).unwrap_or(u8::MAX)
        }

        let freq = rule.freq;
        let mut normalized = Self {
            freq,
            interval: rule.interval().max(1),
            wkst: rule.wkst,
            until: rule.until.map(|u| u.bound()),
            count: rule.count,
            by_second: sorted(rule.by_second()),
            by_minute: sorted(rule.by_minute()),
            by_hour: sorted(rule.by_hour()),
            by_day: sorted(rule.by_day()),
            by_monthday: sorted(rule.by_monthday()),
            by_yearday: sorted(rule.by_yearday()),
            by_weekno: sorted(rule.by_weekno()),
            by_month: sorted(rule.by_month()),
            by_setpos: sorted(rule.by_setpos()),
        };

        // Time fields coarser than the frequency expand from the start instant.
        if normalized.by_second.is_empty() && freq > Frequency::Secondly {
            normalized.by_second = vec![field(dtstart.second())];
        }
        if normalized.by_minute.is_empty() && freq > Frequency::Minutely {
            normalized.by_minute = vec![field(dtstart.minute())];
        }
        if normalized.by_hour.is_empty() && freq > Frequency::Hourly {
            normalized.by_hour = vec![field(dtstart.hour())];
        }

        match freq {
            Frequency::Yearly
                if normalized.by_weekno.is_empty()
                    && normalized.by_yearday.is_empty()
                    && normalized.by_monthday.is_empty()
                    && normalized.by_day.is_empty() =>
            {
                normalized.by_monthday = vec![i8::try_from(dtstart.day()).unwrap_or(1)];
                if normalized.by_month.is_empty() {
                    normalized.by_month = vec![field(dtstart.month())];
                }
            }
            Frequency::Monthly
                if normalized.by_monthday.is_empty() && normalized.by_day.is_empty() =>
            {
                normalized.by_monthday = vec![i8::try_from(dtstart.day()).unwrap_or(1)];
            }
            Frequency::Weekly if normalized.by_day.is_empty() => {
                normalized.by_day = vec![WeekdayNum::every(dtstart.weekday().into())];
            }
            _ => {}
        }

        normalized
    }

    fn month_matches(&self, day: NaiveDate) -> bool {
        self.by_month.is_empty() || self.by_month.iter().any(|&m| u32::from(m) == day.month())
    }

    /// Whether `day` passes every date-level rule part.
    fn day_matches(&self, day: NaiveDate) -> bool {
        self.month_matches(day)
            && (self.by_weekno.is_empty() || self.weekno_matches(day))
            && (self.by_yearday.is_empty() || self.yearday_matches(day))
            && (self.by_monthday.is_empty() || self.monthday_matches(day))
            && (self.by_day.is_empty() || self.weekday_matches(day))
    }

    fn weekno_matches(&self, day: NaiveDate) -> bool {
        let Some((week_year, week)) = calendar::week_number(day, self.wkst) else {
            return false;
        };
        let Some(total) = calendar::weeks_in_year(week_year, self.wkst) else {
            return false;
        };
        self.by_weekno
            .iter()
            .any(|&w| signed_matches(i64::from(w), i64::from(week), i64::from(total)))
    }

    fn yearday_matches(&self, day: NaiveDate) -> bool {
        let len = i64::from(calendar::days_in_year(day.year()));
        self.by_yearday
            .iter()
            .any(|&d| signed_matches(i64::from(d), i64::from(day.ordinal()), len))
    }

    fn monthday_matches(&self, day: NaiveDate) -> bool {
        let len = i64::from(calendar::days_in_month(day.year(), day.month()));
        self.by_monthday
            .iter()
            .any(|&d| signed_matches(i64::from(d), i64::from(day.day()), len))
    }

    fn weekday_matches(&self, day: NaiveDate) -> bool {
        let weekday = Weekday::from(day.weekday());
        self.by_day.iter().any(|d| {
            d.weekday == weekday && d.ordinal.is_none_or(|n| self.ordinal_matches(day, n))
        })
    }

    /// Whether `day` is the `n`th of its weekday within the month or year.
    fn ordinal_matches(&self, day: NaiveDate, n: i8) -> bool {
        let in_month = self.freq == Frequency::Monthly
            || (self.freq == Frequency::Yearly && !self.by_month.is_empty());
        let (index, len) = if in_month {
            (day.day(), calendar::days_in_month(day.year(), day.month()))
        } else {
            (day.ordinal(), calendar::days_in_year(day.year()))
        };
        let from_start = i64::from((index - 1) / 7 + 1);
        let from_end = -i64::from((len - index) / 7 + 1);
        let n = i64::from(n);
        n == from_start || n == from_end
    }
}

/// Positive values count from 1 at the start, negative from -1 at the end.
fn signed_matches(value: i64, position: i64, len: i64) -> bool {
    if value > 0 {
        value == position
    } else {
        len + value + 1 == position
    }
}

/// All wall-clock times formed from the given lists, in ascending order.
///
/// Combinations that are not valid times (second 60) are dropped.
fn time_grid(hours: &[u8], minutes: &[u8], seconds: &[u8]) -> Vec<NaiveTime> {
    let mut times = Vec::with_capacity(hours.len() * minutes.len() * seconds.len());
    for &h in hours {
        for &m in minutes {
            for &s in seconds {
                if let Some(time) = NaiveTime::from_hms_opt(h.into(), m.into(), s.into()) {
                    times.push(time);
                }
            }
        }
    }
    times
}

/// Candidate instants of one period, kept as its matching days and the
/// times of day they expand to.
///
/// Entry `i` of the day×time product is `days[i / times.len()]` at
/// `times[i % times.len()]`; both lists are strictly ascending, so entries
/// are in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSet {
    pub days: Vec<NaiveDate>,
    pub times: Vec<NaiveTime>,
    /// Product indices kept by BYSETPOS, ascending. `None` keeps every entry.
    pub positions: Option<Vec<usize>>,
}

impl PeriodSet {
    fn new(days: Vec<NaiveDate>, times: Vec<NaiveTime>, setpos: &[i16]) -> Self {
        let mut set = Self {
            days,
            times,
            positions: None,
        };
        if !setpos.is_empty() {
            let total = set.product_len();
            let mut picked: Vec<usize> = setpos
                .iter()
                .filter_map(|&p| calendar::resolve_index(i64::from(p), total))
                .collect();
            picked.sort_unstable();
            picked.dedup();
            set.positions = Some(picked);
        }
        set
    }

    fn product_len(&self) -> usize {
        self.days.len().saturating_mul(self.times.len())
    }

    /// Number of candidates in the period.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.as_ref().map_or_else(|| self.product_len(), Vec::len)
    }

    /// Whether the period has no candidate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `i`th candidate of the period.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<NaiveDateTime> {
        let index = match &self.positions {
            Some(positions) => *positions.get(i)?,
            None => i,
        };
        let per_day = self.times.len();
        if per_day == 0 {
            return None;
        }
        let day = self.days.get(index / per_day)?;
        let time = self.times.get(index % per_day)?;
        Some(day.and_time(*time))
    }

    /// Index of the first candidate at or after `instant`.
    fn first_at_or_after(&self, instant: NaiveDateTime) -> usize {
        let (mut low, mut high) = (0, self.len());
        while low < high {
            let mid = low + (high - low) / 2;
            if self.get(mid).is_some_and(|c| c < instant) {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    fn is_well_formed(&self) -> bool {
        let total = self.product_len();
        self.days.is_sorted_by(|a, b| a < b)
            && self.times.is_sorted_by(|a, b| a < b)
            && self.positions.as_ref().is_none_or(|positions| {
                positions.is_sorted_by(|a, b| a < b) && positions.iter().all(|&p| p < total)
            })
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn next_month_start(date: NaiveDate) -> Option<NaiveDateTime> {
    let (year, month) = calendar::add_months(date.year(), date.month(), 1)?;
    NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
}

/// Result of expanding one period.
enum PeriodOutcome {
    /// Candidates of the period, possibly none.
    Candidates(PeriodSet),
    /// Nothing can match before this instant.
    SkipTo(NaiveDateTime),
    /// The calendar ran out or the period starts after UNTIL.
    Exhausted,
}

/// ## Summary
/// Checks rule part combinations that cannot be expanded.
///
/// ## Errors
/// Returns `InvalidCombination` for parts that do not apply to the frequency
/// (or to each other) and `InvalidPosition` for BYDAY ordinals out of range.
pub fn validate_rule(rule: &RecurrenceRule) -> Result<(), ExpansionError> {
    let freq = rule.freq;

    if freq == Frequency::Monthly && !rule.by_yearday().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYYEARDAY may not appear in MONTHLY rules",
        ));
    }
    if freq == Frequency::Monthly && !rule.by_weekno().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYWEEKNO may not appear in MONTHLY rules",
        ));
    }
    if freq == Frequency::Weekly && !rule.by_monthday().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYMONTHDAY may not appear in WEEKLY rules",
        ));
    }
    if freq == Frequency::Weekly && !rule.by_yearday().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYYEARDAY may not appear in WEEKLY rules",
        ));
    }
    if freq != Frequency::Yearly && !rule.by_yearday().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYYEARDAY is only valid in YEARLY rules",
        ));
    }
    if freq != Frequency::Yearly && !rule.by_weekno().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYWEEKNO is only valid in YEARLY rules",
        ));
    }
    if !rule.by_weekno().is_empty() && !rule.by_monthday().is_empty() {
        return Err(ExpansionError::InvalidCombination(
            "BYWEEKNO cannot be combined with BYMONTHDAY",
        ));
    }

    let max_ordinal: i8 = match freq {
        Frequency::Monthly => 5,
        Frequency::Yearly => 53,
        _ => 0,
    };
    if let Some(&value) = rule
        .by_day()
        .iter()
        .find(|d| d.ordinal.is_some_and(|n| n == 0 || n.unsigned_abs() > max_ordinal.unsigned_abs()))
    {
        return Err(ExpansionError::InvalidPosition { value, freq });
    }

    Ok(())
}

/// Lazily produces the occurrences of one rule, in ascending order.
#[derive(Debug, Clone)]
pub struct OccurrenceIterator {
    rule: NormalizedRule,
    dtstart: NaiveDateTime,
    period: i64,
    set: PeriodSet,
    cursor: usize,
    occurrence_number: u32,
    last: Option<NaiveDateTime>,
    completed: bool,
    initialized: bool,
}

/// Serializable state of an [`OccurrenceIterator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IteratorSnapshot {
    pub rule: NormalizedRule,
    pub dtstart: NaiveDateTime,
    pub period: i64,
    pub set: PeriodSet,
    pub cursor: usize,
    pub occurrence_number: u32,
    pub last: Option<NaiveDateTime>,
    pub completed: bool,
    pub initialized: bool,
}

impl OccurrenceIterator {
    /// ## Summary
    /// Creates an iterator over the occurrences of `rule` anchored at `dtstart`.
    ///
    /// `dtstart` itself is only produced when it matches the rule.
    ///
    /// ## Errors
    /// Returns an error if the rule fails [`validate_rule`].
    pub fn new(rule: &RecurrenceRule, dtstart: NaiveDateTime) -> Result<Self, ExpansionError> {
        validate_rule(rule)?;
        let rule = NormalizedRule::new(rule, dtstart);
        debug!(
            freq = %rule.freq,
            interval = rule.interval,
            count = ?rule.count,
            until = ?rule.until,
            %dtstart,
            "Created occurrence iterator"
        );

        Ok(Self {
            rule,
            dtstart,
            period: 0,
            set: PeriodSet::default(),
            cursor: 0,
            occurrence_number: 0,
            last: None,
            completed: false,
            initialized: false,
        })
    }

    /// ## Summary
    /// Restores an iterator from a snapshot taken by [`OccurrenceIterator::snapshot`].
    ///
    /// ## Errors
    /// Returns `InvalidSnapshot` if the cursor lies past the period set, the
    /// period's days, times or positions are not strictly ascending, a
    /// position lies outside the period, or the interval is zero.
    pub fn from_snapshot(snapshot: IteratorSnapshot) -> Result<Self, ExpansionError> {
        if snapshot.cursor > snapshot.set.len() {
            return Err(ExpansionError::InvalidSnapshot(format!(
                "cursor {} past {} candidates",
                snapshot.cursor,
                snapshot.set.len()
            )));
        }
        if !snapshot.set.is_well_formed() {
            return Err(ExpansionError::InvalidSnapshot(
                "period set is not in ascending order".to_string(),
            ));
        }
        if snapshot.rule.interval == 0 {
            return Err(ExpansionError::InvalidSnapshot("interval is zero".to_string()));
        }

        Ok(Self {
            rule: snapshot.rule,
            dtstart: snapshot.dtstart,
            period: snapshot.period,
            set: snapshot.set,
            cursor: snapshot.cursor,
            occurrence_number: snapshot.occurrence_number,
            last: snapshot.last,
            completed: snapshot.completed,
            initialized: snapshot.initialized,
        })
    }

    /// Captures the iterator state.
    #[must_use]
    pub fn snapshot(&self) -> IteratorSnapshot {
        IteratorSnapshot {
            rule: self.rule.clone(),
            dtstart: self.dtstart,
            period: self.period,
            set: self.set.clone(),
            cursor: self.cursor,
            occurrence_number: self.occurrence_number,
            last: self.last,
            completed: self.completed,
            initialized: self.initialized,
        }
    }

    /// The start instant the iterator is anchored at.
    #[must_use]
    pub const fn dtstart(&self) -> NaiveDateTime {
        self.dtstart
    }

    /// The most recently produced occurrence.
    #[must_use]
    pub const fn last_occurrence(&self) -> Option<NaiveDateTime> {
        self.last
    }

    /// Number of occurrences produced so far.
    #[must_use]
    pub const fn occurrence_number(&self) -> u32 {
        self.occurrence_number
    }

    /// Whether the iterator will produce no further occurrences.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// ## Summary
    /// Moves the iterator ahead to the period containing `target`, skipping
    /// the periods in between without expanding them.
    ///
    /// The next occurrence is then the first one of that period, which may
    /// still lie before `target`. Rules with COUNT are left in place since
    /// their numbering depends on every earlier occurrence, as are iterators
    /// already at or past that period. Returns whether the iterator moved.
    pub fn seek(&mut self, target: NaiveDateTime) -> bool {
        if self.completed || self.rule.count.is_some() {
            return false;
        }
        let Some(period) = self.period_containing(target) else {
            return false;
        };
        if period <= self.period {
            return false;
        }

        trace!(from = self.period, to = period, %target, "Seeking occurrence iterator");
        self.period = period;
        self.set = PeriodSet::default();
        self.cursor = 0;
        self.initialized = false;
        true
    }

    /// ## Summary
    /// Produces the next occurrence, or `None` once the rule is exhausted.
    ///
    /// ## Errors
    /// Returns `PeriodLimitExceeded` after [`MAX_EMPTY_PERIODS`] consecutive
    /// periods without an occurrence; the iterator is completed afterwards.
    pub fn next_occurrence(&mut self) -> Result<Option<NaiveDateTime>, ExpansionError> {
        if self.completed {
            return Ok(None);
        }
        if self.rule.count.is_some_and(|count| self.occurrence_number >= count) {
            self.finish();
            return Ok(None);
        }

        let mut visited = 0u32;
        loop {
            if let Some(candidate) = self.set.get(self.cursor) {
                self.cursor += 1;
                if self.rule.until.is_some_and(|until| candidate > until) {
                    self.finish();
                    return Ok(None);
                }
                self.occurrence_number += 1;
                self.last = Some(candidate);
                return Ok(Some(candidate));
            }

            let next = if self.initialized {
                self.period.checked_add(1)
            } else {
                self.initialized = true;
                Some(self.period)
            };
            let Some(mut period) = next else {
                self.finish();
                return Ok(None);
            };

            loop {
                if visited >= MAX_EMPTY_PERIODS {
                    self.finish();
                    warn!(
                        limit = MAX_EMPTY_PERIODS,
                        freq = %self.rule.freq,
                        dtstart = %self.dtstart,
                        "Recurrence rule produced no occurrence within period limit"
                    );
                    return Err(ExpansionError::PeriodLimitExceeded {
                        limit: MAX_EMPTY_PERIODS,
                    });
                }
                visited += 1;

                match self.expand_period(period) {
                    PeriodOutcome::Candidates(set) => {
                        trace!(period, candidates = set.len(), "Expanded recurrence period");
                        self.period = period;
                        self.cursor = set.first_at_or_after(self.dtstart);
                        self.set = set;
                        break;
                    }
                    PeriodOutcome::SkipTo(target) => {
                        let Some(next) = self.period_reaching(period, target) else {
                            self.finish();
                            return Ok(None);
                        };
                        period = next;
                    }
                    PeriodOutcome::Exhausted => {
                        self.finish();
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn finish(&mut self) {
        self.completed = true;
        self.set = PeriodSet::default();
        self.cursor = 0;
    }

    /// First instant of period `k`.
    fn period_start(&self, k: i64) -> Option<NaiveDateTime> {
        let step = k.checked_mul(i64::from(self.rule.interval))?;
        let start = self.dtstart;
        match self.rule.freq {
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(start.year()).checked_add(step)?).ok()?;
                NaiveDate::from_ymd_opt(year, 1, 1).map(midnight)
            }
            Frequency::Monthly => {
                let (year, month) = calendar::add_months(start.year(), start.month(), step)?;
                NaiveDate::from_ymd_opt(year, month, 1).map(midnight)
            }
            Frequency::Weekly => midnight(calendar::week_start(start.date(), self.rule.wkst)?)
                .checked_add_signed(Duration::try_weeks(step)?),
            Frequency::Daily => {
                midnight(start.date()).checked_add_signed(Duration::try_days(step)?)
            }
            Frequency::Hourly => start
                .date()
                .and_hms_opt(start.hour(), 0, 0)?
                .checked_add_signed(Duration::try_hours(step)?),
            Frequency::Minutely => start
                .date()
                .and_hms_opt(start.hour(), start.minute(), 0)?
                .checked_add_signed(Duration::try_minutes(step)?),
            Frequency::Secondly => start
                .date()
                .and_hms_opt(start.hour(), start.minute(), start.second())?
                .checked_add_signed(Duration::try_seconds(step)?),
        }
    }

    /// Index of the period that contains `target`.
    fn period_containing(&self, target: NaiveDateTime) -> Option<i64> {
        let start = self.dtstart;
        let units = match self.rule.freq {
            Frequency::Yearly => i64::from(target.year()) - i64::from(start.year()),
            Frequency::Monthly => {
                (i64::from(target.year()) - i64::from(start.year())) * 12
                    + i64::from(target.month())
                    - i64::from(start.month())
            }
            Frequency::Weekly => {
                let first = calendar::week_start(start.date(), self.rule.wkst)?;
                (target.date() - first).num_days().div_euclid(7)
            }
            Frequency::Daily => (target.date() - start.date()).num_days(),
            Frequency::Hourly => (target - self.period_start(0)?).num_seconds().div_euclid(3_600),
            Frequency::Minutely => (target - self.period_start(0)?).num_seconds().div_euclid(60),
            Frequency::Secondly => (target - self.period_start(0)?).num_seconds(),
        };
        Some(units.div_euclid(i64::from(self.rule.interval)))
    }

    /// Index of the first period after `k` that starts at or after `target`.
    fn period_reaching(&self, k: i64, target: NaiveDateTime) -> Option<i64> {
        let unit: i64 = match self.rule.freq {
            Frequency::Daily => 86_400,
            Frequency::Hourly => 3_600,
            Frequency::Minutely => 60,
            Frequency::Secondly => 1,
            Frequency::Weekly | Frequency::Monthly | Frequency::Yearly => return k.checked_add(1),
        };
        let step = unit.checked_mul(i64::from(self.rule.interval))?;
        let gap = (target - self.period_start(k)?).num_seconds();
        let jumps = if gap <= 0 { 1 } else { (gap + step - 1) / step };
        k.checked_add(jumps.max(1))
    }

    fn expand_period(&self, k: i64) -> PeriodOutcome {
        let Some(start) = self.period_start(k) else {
            return PeriodOutcome::Exhausted;
        };
        if self.rule.until.is_some_and(|until| start > until) {
            return PeriodOutcome::Exhausted;
        }

        if self.rule.freq.is_sub_daily() {
            self.sub_daily_set(start)
        } else {
            self.day_level_set(start)
        }
    }

    /// Candidate set for YEARLY, MONTHLY, WEEKLY and DAILY periods.
    fn day_level_set(&self, start: NaiveDateTime) -> PeriodOutcome {
        let rule = &self.rule;
        let first = start.date();

        if rule.freq == Frequency::Daily && !rule.month_matches(first) {
            return next_month_start(first).map_or(PeriodOutcome::Exhausted, PeriodOutcome::SkipTo);
        }

        let frame_len = match rule.freq {
            Frequency::Yearly => calendar::days_in_year(first.year()),
            Frequency::Monthly => calendar::days_in_month(first.year(), first.month()),
            Frequency::Weekly => 7,
            _ => 1,
        };
        let times = time_grid(&rule.by_hour, &rule.by_minute, &rule.by_second);

        let mut days = Vec::new();
        for offset in 0..frame_len {
            let Some(day) = first.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            if rule.day_matches(day) {
                days.push(day);
            }
        }
        PeriodOutcome::Candidates(PeriodSet::new(days, times, &rule.by_setpos))
    }

    /// Candidate set for HOURLY, MINUTELY and SECONDLY periods.
    ///
    /// Coarser fields act as limits; a failing field skips ahead to the next
    /// month, day, hour or minute instead of visiting every period in between.
    fn sub_daily_set(&self, start: NaiveDateTime) -> PeriodOutcome {
        let rule = &self.rule;
        let day = start.date();
        let skip = |target: Option<NaiveDateTime>| {
            target.map_or(PeriodOutcome::Exhausted, PeriodOutcome::SkipTo)
        };

        if !rule.month_matches(day) {
            return skip(next_month_start(day));
        }
        if !rule.day_matches(day) {
            return skip(day.succ_opt().map(midnight));
        }

        let hour = u8::try_from(start.hour()).unwrap_or(u8::MAX);
        let minute = u8::try_from(start.minute()).unwrap_or(u8::MAX);
        let second = u8::try_from(start.second()).unwrap_or(u8::MAX);

        if !rule.by_hour.is_empty() && !rule.by_hour.contains(&hour) {
            return skip(
                day.and_hms_opt(start.hour(), 0, 0)
                    .and_then(|t| t.checked_add_signed(Duration::hours(1))),
            );
        }

        let times = match rule.freq {
            Frequency::Hourly => time_grid(&[hour], &rule.by_minute, &rule.by_second),
            Frequency::Minutely => {
                if !rule.by_minute.is_empty() && !rule.by_minute.contains(&minute) {
                    return PeriodOutcome::Candidates(PeriodSet::default());
                }
                time_grid(&[hour], &[minute], &rule.by_second)
            }
            _ => {
                if !rule.by_minute.is_empty() && !rule.by_minute.contains(&minute) {
                    return skip(
                        day.and_hms_opt(start.hour(), start.minute(), 0)
                            .and_then(|t| t.checked_add_signed(Duration::minutes(1))),
                    );
                }
                if !rule.by_second.is_empty() && !rule.by_second.contains(&second) {
                    return PeriodOutcome::Candidates(PeriodSet::default());
                }
                time_grid(&[hour], &[minute], &[second])
            }
        };

        PeriodOutcome::Candidates(PeriodSet::new(vec![day], times, &rule.by_setpos))
    }
}

impl Iterator for OccurrenceIterator {
    type Item = Result<NaiveDateTime, ExpansionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_occurrence().transpose()
    }
}

impl RecurrenceRule {
    /// ## Summary
    /// Creates an iterator over this rule's occurrences starting at `dtstart`.
    ///
    /// ## Errors
    /// Returns an error if the rule parts cannot be expanded together.
    pub fn iterator(&self, dtstart: NaiveDateTime) -> Result<OccurrenceIterator, ExpansionError> {
        OccurrenceIterator::new(self, dtstart)
    }

    /// ## Summary
    /// Returns the first occurrence strictly after `after`.
    ///
    /// ## Errors
    /// Returns an error if the rule is invalid or no occurrence is found
    /// within the period limit.
    pub fn next_occurrence_after(
        &self,
        dtstart: NaiveDateTime,
        after: NaiveDateTime,
    ) -> Result<Option<NaiveDateTime>, ExpansionError> {
        let mut iter = self.iterator(dtstart)?;
        while let Some(occurrence) = iter.next_occurrence()? {
            if occurrence > after {
                return Ok(Some(occurrence));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "iterator_tests.rs"]
mod tests;

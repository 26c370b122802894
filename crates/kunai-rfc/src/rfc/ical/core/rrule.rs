//! iCalendar RRULE (Recurrence Rule) value type (RFC 5545 §3.3.10, §3.8.5.3).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Recurrence frequency (RFC 5545 §3.3.10).
///
/// Variants are ordered from the finest to the coarsest period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses a frequency from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }

    /// Whether periods of this frequency are shorter than a day.
    #[must_use]
    pub const fn is_sub_daily(self) -> bool {
        matches!(self, Self::Secondly | Self::Minutely | Self::Hourly)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Returns the two-letter abbreviation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a weekday from a two-letter abbreviation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }

    /// Returns all weekdays in order (Sunday through Saturday).
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Sunday,
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
        ]
    }

    /// Numeric day as used by jCal and vCard tooling: 1 = Sunday … 7 = Saturday.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Sunday => 1,
            Self::Monday => 2,
            Self::Tuesday => 3,
            Self::Wednesday => 4,
            Self::Thursday => 5,
            Self::Friday => 6,
            Self::Saturday => 7,
        }
    }

    /// Inverse of [`Weekday::number`].
    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            1 => Self::Sunday,
            2 => Self::Monday,
            3 => Self::Tuesday,
            4 => Self::Wednesday,
            5 => Self::Thursday,
            6 => Self::Friday,
            7 => Self::Saturday,
            _ => return None,
        })
    }

    /// Converts to the chrono weekday.
    #[must_use]
    pub const fn to_chrono(self) -> chrono::Weekday {
        match self {
            Self::Sunday => chrono::Weekday::Sun,
            Self::Monday => chrono::Weekday::Mon,
            Self::Tuesday => chrono::Weekday::Tue,
            Self::Wednesday => chrono::Weekday::Wed,
            Self::Thursday => chrono::Weekday::Thu,
            Self::Friday => chrono::Weekday::Fri,
            Self::Saturday => chrono::Weekday::Sat,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(wd: chrono::Weekday) -> Self {
        match wd {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weekday with optional occurrence number.
///
/// Used in BYDAY rule part. Examples:
/// - `MO` - every Monday
/// - `1MO` - first Monday of the month/year
/// - `-1FR` - last Friday of the month/year
///
/// Parsing lives in [`crate::rfc::ical::parse`] (`str::parse::<WeekdayNum>()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekdayNum {
    /// Optional occurrence number (-53 to 53, excluding 0).
    pub ordinal: Option<i8>,
    /// The day of the week.
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Creates a weekday occurrence without an ordinal.
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Creates a weekday occurrence with an ordinal.
    ///
    /// ## Panics
    ///
    /// Panics if ordinal is 0 or outside the range -53..=53.
    #[must_use]
    pub fn nth(ordinal: i8, weekday: Weekday) -> Self {
        assert!(ordinal != 0 && (-53..=53).contains(&ordinal));
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{n}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL value for RRULE - a DATE, a floating DATE-TIME, or a UTC DATE-TIME.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RRuleUntil {
    /// Date-only boundary (inclusive of the whole day).
    Date(NaiveDate),
    /// Local wall-clock boundary (inclusive).
    Floating(NaiveDateTime),
    /// UTC boundary (inclusive), written with a trailing `Z`.
    Utc(NaiveDateTime),
}

impl RRuleUntil {
    /// Returns the last instant still covered by this bound.
    #[must_use]
    pub fn bound(&self) -> NaiveDateTime {
        match *self {
            Self::Date(date) => date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)),
            Self::Floating(dt) | Self::Utc(dt) => dt,
        }
    }
}

impl fmt::Display for RRuleUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::Floating(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%S")),
            Self::Utc(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%SZ")),
        }
    }
}

/// Names of the BYxxx rule parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByRuleKind {
    Second,
    Minute,
    Hour,
    Day,
    MonthDay,
    YearDay,
    WeekNo,
    Month,
    SetPos,
}

impl ByRuleKind {
    /// Returns the rule part name as written in RECUR text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "BYSECOND",
            Self::Minute => "BYMINUTE",
            Self::Hour => "BYHOUR",
            Self::Day => "BYDAY",
            Self::MonthDay => "BYMONTHDAY",
            Self::YearDay => "BYYEARDAY",
            Self::WeekNo => "BYWEEKNO",
            Self::Month => "BYMONTH",
            Self::SetPos => "BYSETPOS",
        }
    }

    /// Parses a rule part name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "BYSECOND" => Self::Second,
            "BYMINUTE" => Self::Minute,
            "BYHOUR" => Self::Hour,
            "BYDAY" => Self::Day,
            "BYMONTHDAY" => Self::MonthDay,
            "BYYEARDAY" => Self::YearDay,
            "BYWEEKNO" => Self::WeekNo,
            "BYMONTH" => Self::Month,
            "BYSETPOS" => Self::SetPos,
            _ => return None,
        })
    }

    /// Inclusive numeric range accepted for this part, and whether zero is allowed.
    ///
    /// `BYDAY` has no numeric range and returns `None`.
    #[must_use]
    pub const fn range(self) -> Option<(i16, i16, bool)> {
        match self {
            Self::Second => Some((0, 60, true)),
            Self::Minute => Some((0, 59, true)),
            Self::Hour => Some((0, 23, true)),
            Self::MonthDay => Some((-31, 31, false)),
            Self::YearDay | Self::SetPos => Some((-366, 366, false)),
            Self::WeekNo => Some((-53, 53, false)),
            Self::Month => Some((0, 12, true)),
            Self::Day => None,
        }
    }
}

impl fmt::Display for ByRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single BYxxx rule part with its typed value list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ByRule {
    /// Seconds within a minute (0-60, 60 for leap second).
    Second(Vec<u8>),
    /// Minutes within an hour (0-59).
    Minute(Vec<u8>),
    /// Hours within a day (0-23).
    Hour(Vec<u8>),
    /// Weekdays with optional occurrence numbers.
    Day(Vec<WeekdayNum>),
    /// Days of the month (-31 to 31, excluding 0).
    MonthDay(Vec<i8>),
    /// Days of the year (-366 to 366, excluding 0).
    YearDay(Vec<i16>),
    /// Week numbers (-53 to 53, excluding 0).
    WeekNo(Vec<i8>),
    /// Months of the year.
    Month(Vec<u8>),
    /// Positions within the period's occurrence set (-366 to 366, excluding 0).
    SetPos(Vec<i16>),
}

impl ByRule {
    /// Returns the kind of this rule part.
    #[must_use]
    pub const fn kind(&self) -> ByRuleKind {
        match self {
            Self::Second(_) => ByRuleKind::Second,
            Self::Minute(_) => ByRuleKind::Minute,
            Self::Hour(_) => ByRuleKind::Hour,
            Self::Day(_) => ByRuleKind::Day,
            Self::MonthDay(_) => ByRuleKind::MonthDay,
            Self::YearDay(_) => ByRuleKind::YearDay,
            Self::WeekNo(_) => ByRuleKind::WeekNo,
            Self::Month(_) => ByRuleKind::Month,
            Self::SetPos(_) => ByRuleKind::SetPos,
        }
    }

    /// Number of values in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Second(v) | Self::Minute(v) | Self::Hour(v) | Self::Month(v) => v.len(),
            Self::Day(v) => v.len(),
            Self::MonthDay(v) | Self::WeekNo(v) => v.len(),
            Self::YearDay(v) | Self::SetPos(v) => v.len(),
        }
    }

    /// Whether the list has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends the values of `other` when it is the same kind.
    ///
    /// Returns `false` (leaving `self` untouched) for a different kind.
    pub fn append(&mut self, other: Self) -> bool {
        match (self, other) {
            (Self::Second(a), Self::Second(b))
            | (Self::Minute(a), Self::Minute(b))
            | (Self::Hour(a), Self::Hour(b))
            | (Self::Month(a), Self::Month(b)) => a.extend(b),
            (Self::Day(a), Self::Day(b)) => a.extend(b),
            (Self::MonthDay(a), Self::MonthDay(b)) | (Self::WeekNo(a), Self::WeekNo(b)) => {
                a.extend(b);
            }
            (Self::YearDay(a), Self::YearDay(b)) | (Self::SetPos(a), Self::SetPos(b)) => {
                a.extend(b);
            }
            _ => return false,
        }
        true
    }

    /// Values formatted individually, in list order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        fn strings<T: ToString>(values: &[T]) -> Vec<String> {
            values.iter().map(ToString::to_string).collect()
        }
        match self {
            Self::Second(v) | Self::Minute(v) | Self::Hour(v) | Self::Month(v) => strings(v),
            Self::Day(v) => strings(v),
            Self::MonthDay(v) | Self::WeekNo(v) => strings(v),
            Self::YearDay(v) | Self::SetPos(v) => strings(v),
        }
    }
}

impl fmt::Display for ByRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.values().join(","))
    }
}

/// Structured RECUR value, keyed by lower-case rule part name (RFC 7265 §3.6.10).
pub type RecurData = serde_json::Map<String, serde_json::Value>;

/// Recurrence rule (RFC 5545 §3.3.10, §3.8.5.3).
///
/// Defines a pattern for recurring events, todos, or journal entries.
/// BYxxx parts keep the order in which they were first set, which is also
/// the order they are written back out in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Recurrence frequency.
    pub freq: Frequency,

    /// Defines how often the frequency repeats; always at least 1.
    interval: u32,

    /// End date/time of the recurrence (conventionally exclusive with count).
    pub until: Option<RRuleUntil>,

    /// Number of occurrences (conventionally exclusive with until).
    pub count: Option<u32>,

    /// Week start day (default: Monday).
    pub wkst: Weekday,

    parts: Vec<ByRule>,
}

impl RecurrenceRule {
    /// Creates a rule with the given frequency and all other fields defaulted.
    #[must_use]
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            until: None,
            count: None,
            wkst: Weekday::Monday,
            parts: Vec::new(),
        }
    }

    /// Creates a daily recurrence rule.
    #[must_use]
    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    /// Creates a weekly recurrence rule.
    #[must_use]
    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    /// Creates a monthly recurrence rule.
    #[must_use]
    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    /// Creates a yearly recurrence rule.
    #[must_use]
    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    /// Returns the interval (never zero).
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Sets the interval; non-positive values collapse to 1.
    pub fn set_interval(&mut self, interval: i64) {
        self.interval = u32::try_from(interval).map_or(
            if interval > 0 { u32::MAX } else { 1 },
            |i| i.max(1),
        );
    }

    /// Sets the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: i64) -> Self {
        self.set_interval(interval);
        self
    }

    /// Sets the count.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the until bound.
    #[must_use]
    pub fn with_until(mut self, until: RRuleUntil) -> Self {
        self.until = Some(until);
        self
    }

    /// Sets the week start day.
    #[must_use]
    pub fn with_wkst(mut self, wkst: Weekday) -> Self {
        self.wkst = wkst;
        self
    }

    /// Sets the by-day list.
    #[must_use]
    pub fn with_by_day(mut self, days: Vec<WeekdayNum>) -> Self {
        self.set_part(ByRule::Day(days));
        self
    }

    /// Sets the by-month list.
    #[must_use]
    pub fn with_by_month(mut self, months: Vec<u8>) -> Self {
        self.set_part(ByRule::Month(months));
        self
    }

    /// Sets the by-monthday list.
    #[must_use]
    pub fn with_by_monthday(mut self, days: Vec<i8>) -> Self {
        self.set_part(ByRule::MonthDay(days));
        self
    }

    /// Sets the by-setpos list.
    #[must_use]
    pub fn with_by_setpos(mut self, positions: Vec<i16>) -> Self {
        self.set_part(ByRule::SetPos(positions));
        self
    }

    /// Sets any rule part.
    #[must_use]
    pub fn with_part(mut self, part: ByRule) -> Self {
        self.set_part(part);
        self
    }

    /// Whether the rule ends, by count or by until.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// Whether the rule ends by count alone.
    #[must_use]
    pub const fn is_by_count(&self) -> bool {
        self.count.is_some() && self.until.is_none()
    }

    /// Rule parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[ByRule] {
        &self.parts
    }

    /// Returns the rule part of the given kind, if set.
    #[must_use]
    pub fn part(&self, kind: ByRuleKind) -> Option<&ByRule> {
        self.parts.iter().find(|p| p.kind() == kind)
    }

    /// Sets a rule part, replacing an existing one of the same kind in place.
    ///
    /// An empty value list removes the part.
    pub fn set_part(&mut self, part: ByRule) {
        if part.is_empty() {
            self.remove_part(part.kind());
            return;
        }
        if let Some(existing) = self.parts.iter_mut().find(|p| p.kind() == part.kind()) {
            *existing = part;
        } else {
            self.parts.push(part);
        }
    }

    /// Removes a rule part, returning it if it was set.
    pub fn remove_part(&mut self, kind: ByRuleKind) -> Option<ByRule> {
        let idx = self.parts.iter().position(|p| p.kind() == kind)?;
        Some(self.parts.remove(idx))
    }

    /// Mutable access to a rule part, used when appending single values.
    pub(crate) fn part_mut(&mut self, kind: ByRuleKind) -> Option<&mut ByRule> {
        self.parts.iter_mut().find(|p| p.kind() == kind)
    }

    /// By-second list.
    #[must_use]
    pub fn by_second(&self) -> &[u8] {
        match self.part(ByRuleKind::Second) {
            Some(ByRule::Second(v)) => v,
            _ => &[],
        }
    }

    /// By-minute list.
    #[must_use]
    pub fn by_minute(&self) -> &[u8] {
        match self.part(ByRuleKind::Minute) {
            Some(ByRule::Minute(v)) => v,
            _ => &[],
        }
    }

    /// By-hour list.
    #[must_use]
    pub fn by_hour(&self) -> &[u8] {
        match self.part(ByRuleKind::Hour) {
            Some(ByRule::Hour(v)) => v,
            _ => &[],
        }
    }

    /// By-day list.
    #[must_use]
    pub fn by_day(&self) -> &[WeekdayNum] {
        match self.part(ByRuleKind::Day) {
            Some(ByRule::Day(v)) => v,
            _ => &[],
        }
    }

    /// By-monthday list.
    #[must_use]
    pub fn by_monthday(&self) -> &[i8] {
        match self.part(ByRuleKind::MonthDay) {
            Some(ByRule::MonthDay(v)) => v,
            _ => &[],
        }
    }

    /// By-yearday list.
    #[must_use]
    pub fn by_yearday(&self) -> &[i16] {
        match self.part(ByRuleKind::YearDay) {
            Some(ByRule::YearDay(v)) => v,
            _ => &[],
        }
    }

    /// By-weekno list.
    #[must_use]
    pub fn by_weekno(&self) -> &[i8] {
        match self.part(ByRuleKind::WeekNo) {
            Some(ByRule::WeekNo(v)) => v,
            _ => &[],
        }
    }

    /// By-month list.
    #[must_use]
    pub fn by_month(&self) -> &[u8] {
        match self.part(ByRuleKind::Month) {
            Some(ByRule::Month(v)) => v,
            _ => &[],
        }
    }

    /// By-setpos list.
    #[must_use]
    pub fn by_setpos(&self) -> &[i16] {
        match self.part(ByRuleKind::SetPos) {
            Some(ByRule::SetPos(v)) => v,
            _ => &[],
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.freq)?;

        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }

        if self.interval > 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }

        for part in &self.parts {
            write!(f, ";{part}")?;
        }

        if let Some(ref until) = self.until {
            write!(f, ";UNTIL={until}")?;
        }

        if self.wkst != Weekday::Monday {
            write!(f, ";WKST={}", self.wkst)?;
        }

        Ok(())
    }
}

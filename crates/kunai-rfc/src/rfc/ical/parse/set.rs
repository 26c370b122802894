//! Recurrence set content lines (RFC 5545 §3.8.2.4, §3.8.5).

use std::str::FromStr;

use chrono::NaiveDateTime;

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::values::{parse_instant, parse_rrule};
use crate::rfc::ical::expand::RecurrenceSet;

/// ## Summary
/// Parses a recurrence set from `DTSTART`, `RRULE`, `RDATE` and `EXDATE`
/// content lines, one per line.
///
/// Property parameters (`DTSTART;TZID=...:`) are accepted and ignored, and a
/// trailing `Z` on instants is dropped. `RRULE`, `RDATE` and `EXDATE` may
/// repeat; `RDATE` and `EXDATE` values are comma-separated lists.
///
/// ## Errors
/// Returns an error if a line has no value, names another property, a value
/// is malformed, or `DTSTART` is missing or repeated.
pub fn parse_recurrence_set(text: &str) -> ParseResult<RecurrenceSet> {
    let mut dtstart = None;
    let mut rrules = Vec::new();
    let mut rdates = Vec::new();
    let mut exdates = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (name, value) = line.split_once(':').ok_or_else(|| {
            ParseError::new(ParseErrorKind::InvalidValue, 1)
                .with_context(format!("line {line_no}: expected NAME:VALUE"))
        })?;
        let name = name.split_once(';').map_or(name, |(name, _)| name).to_ascii_uppercase();

        match name.as_str() {
            "DTSTART" => {
                if dtstart.is_some() {
                    return Err(ParseError::new(ParseErrorKind::InvalidValue, 1)
                        .with_context(format!("line {line_no}: DTSTART given more than once")));
                }
                dtstart = Some(parse_instant(value).map_err(|e| on_line(e, line_no, &name))?);
            }
            "RRULE" => rrules.push(parse_rrule(value).map_err(|e| on_line(e, line_no, &name))?),
            "RDATE" => rdates.extend(parse_instant_list(value).map_err(|e| on_line(e, line_no, &name))?),
            "EXDATE" => {
                exdates.extend(parse_instant_list(value).map_err(|e| on_line(e, line_no, &name))?);
            }
            _ => {
                return Err(ParseError::new(ParseErrorKind::UnknownProperty, 1)
                    .with_context(format!("line {line_no}: {name}")));
            }
        }
    }

    let dtstart = dtstart.ok_or_else(|| ParseError::new(ParseErrorKind::MissingStart, 1))?;

    Ok(RecurrenceSet {
        dtstart,
        rrules,
        rdates,
        exdates,
    })
}

fn parse_instant_list(value: &str) -> ParseResult<Vec<NaiveDateTime>> {
    value.split(',').map(parse_instant).collect()
}

fn on_line(err: ParseError, line_no: usize, name: &str) -> ParseError {
    let context = match err.context {
        Some(ctx) => format!("line {line_no} ({name}): {ctx}"),
        None => format!("line {line_no} ({name})"),
    };
    ParseError {
        context: Some(context),
        ..err
    }
}

impl FromStr for RecurrenceSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_recurrence_set(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::Frequency;

    fn dt(s: &str) -> NaiveDateTime {
        parse_instant(s).unwrap()
    }

    #[test]
    fn parses_all_properties() {
        let set: RecurrenceSet = "DTSTART:20120201T093000Z\n\
             RRULE:FREQ=DAILY;COUNT=3\n\
             RDATE:20120210T093000Z,20120211T093000\n\
             EXDATE:20120202T093000Z\n"
            .parse()
            .unwrap();

        assert_eq!(set.dtstart, dt("20120201T093000"));
        assert_eq!(set.rrules.len(), 1);
        assert_eq!(set.rrules[0].freq, Frequency::Daily);
        assert_eq!(set.rdates, [dt("20120210T093000"), dt("20120211T093000")]);
        assert_eq!(set.exdates, [dt("20120202T093000")]);
    }

    #[test]
    fn ignores_parameters_and_blank_lines() {
        let set = parse_recurrence_set(
            "dtstart;TZID=America/New_York:20210313T090000\n\n  RRULE:FREQ=WEEKLY  \nRRULE:FREQ=MONTHLY",
        )
        .unwrap();
        assert_eq!(set.dtstart, dt("20210313T090000"));
        assert_eq!(set.rrules.len(), 2);
    }

    #[test]
    fn date_start_is_midnight() {
        let set = parse_recurrence_set("DTSTART:20120101").unwrap();
        assert_eq!(set.dtstart, dt("20120101T000000"));
        assert!(!set.has_recurrence());
    }

    #[test]
    fn missing_start_rejected() {
        let err = parse_recurrence_set("RRULE:FREQ=DAILY").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingStart);
    }

    #[test]
    fn repeated_start_rejected() {
        let err = parse_recurrence_set("DTSTART:20120101\nDTSTART:20120102").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);
    }

    #[test]
    fn unknown_property_rejected() {
        let err = parse_recurrence_set("DTSTART:20120101\nEXRULE:FREQ=DAILY").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownProperty);
        assert_eq!(err.context.as_deref(), Some("line 2: EXRULE"));
    }

    #[test]
    fn bad_value_names_its_line() {
        let err = parse_recurrence_set("DTSTART:20120101\nRDATE:20120230").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidDate);
        assert!(err.context.unwrap().starts_with("line 2 (RDATE)"));

        let err = parse_recurrence_set("DTSTART:20120101\nRRULE:FREQ=DAILY;BYHOUR=24").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::OutOfRange);
    }
}

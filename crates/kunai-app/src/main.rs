use std::io::Write;

use anyhow::Context;
use kunai_core::config::load_config;
use kunai_core::telemetry::{apply_level, init_tracing};
use kunai_rfc::rfc::ical::build::format_datetime;
use kunai_rfc::rfc::ical::expand::{ExpansionOptions, RecurrenceSet};
use kunai_rfc::rfc::ical::parse::parse_recurrence_set;

const USAGE: &str =
    "usage: kunai <DTSTART> [RRULE:<rule> | RDATE:<instant>[,...] | EXDATE:<instant>[,...]]...";

fn main() -> anyhow::Result<()> {
    let filter_handle = init_tracing("debug")?;

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Err(e) = apply_level(&filter_handle, &config.logging.level) {
        tracing::warn!(error = %e, level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let set = recurrence_set_from_args(std::env::args().skip(1))?;
    let options = ExpansionOptions::default().with_max_instances(config.expansion.max_instances);
    let occurrences = set
        .expand(&options)
        .context("Failed to expand recurrence set")?;

    tracing::info!(count = occurrences.len(), "Expanded recurrence set");

    let mut out = std::io::stdout().lock();
    for occurrence in occurrences {
        writeln!(out, "{}", format_datetime(occurrence, false))?;
    }

    Ok(())
}

/// ## Summary
/// Builds a recurrence set from command line arguments: the start instant
/// followed by `RRULE:`, `RDATE:` and `EXDATE:` content lines.
///
/// ## Errors
/// Returns an error if the start instant is missing or any argument is
/// malformed.
fn recurrence_set_from_args<I>(args: I) -> anyhow::Result<RecurrenceSet>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let dtstart = args.next().context(USAGE)?;

    let mut text = format!("DTSTART:{dtstart}");
    for arg in args {
        text.push('\n');
        text.push_str(&arg);
    }

    parse_recurrence_set(&text).with_context(|| format!("Invalid recurrence set\n{USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kunai_rfc::rfc::ical::parse::parse_instant;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test_log::test]
    fn builds_set_from_arguments() {
        let set = recurrence_set_from_args(args(&[
            "20120101T090000",
            "RRULE:FREQ=DAILY;COUNT=3",
            "EXDATE:20120102T090000",
            "RDATE:20120110T090000",
        ]))
        .unwrap();

        let occurrences = set.expand(&ExpansionOptions::default()).unwrap();
        let formatted: Vec<String> = occurrences
            .into_iter()
            .map(|dt| format_datetime(dt, false))
            .collect();
        assert_eq!(
            formatted,
            ["20120101T090000", "20120103T090000", "20120110T090000"]
        );
    }

    #[test]
    fn start_alone_is_single_occurrence() {
        let set = recurrence_set_from_args(args(&["20120101"])).unwrap();
        assert_eq!(set.dtstart, parse_instant("20120101").unwrap());
        assert!(!set.has_recurrence());
    }

    #[test]
    fn missing_start_is_usage_error() {
        let err = recurrence_set_from_args(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("usage: kunai"));
    }

    #[test]
    fn malformed_argument_is_rejected() {
        assert!(recurrence_set_from_args(args(&["20120101", "FREQ=DAILY"])).is_err());
        assert!(recurrence_set_from_args(args(&["20120101", "RRULE:FREQ=FORTNIGHTLY"])).is_err());
        assert!(recurrence_set_from_args(args(&["not-a-date"])).is_err());
    }
}

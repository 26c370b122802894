use chrono::NaiveDateTime;
use kunai_rfc::rfc::ical::build::format_datetime;
use kunai_rfc::rfc::ical::expand::{ExpansionOptions, RecurrenceSet};
use kunai_rfc::rfc::ical::parse::parse_instant;

pub struct RRuleCase {
    pub name: &'static str,
    pub rruleset: &'static str,
    pub expected: Option<&'static [&'static str]>,
    pub expected_len: Option<usize>,
    pub limit: usize,
    pub after: Option<&'static str>,
    pub before: Option<&'static str>,
    /// Whether the `rrule` crate is expected to agree on this case.
    pub cross_check: bool,
}

#[expect(clippy::too_many_lines)]
pub fn rrule_cases() -> Vec<RRuleCase> {
    vec![
        RRuleCase {
            name: "daily_count",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=DAILY;COUNT=10",
            expected: Some(&[
                "19970902T090000",
                "19970903T090000",
                "19970904T090000",
                "19970905T090000",
                "19970906T090000",
                "19970907T090000",
                "19970908T090000",
                "19970909T090000",
                "19970910T090000",
                "19970911T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "weekly_tu_th",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=WEEKLY;COUNT=10;BYDAY=TU,TH",
            expected: Some(&[
                "19970902T090000",
                "19970904T090000",
                "19970909T090000",
                "19970911T090000",
                "19970916T090000",
                "19970918T090000",
                "19970923T090000",
                "19970925T090000",
                "19970930T090000",
                "19971002T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "weekly_interval_wkst_monday",
            rruleset: "DTSTART:19970805T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO",
            expected: Some(&[
                "19970805T090000",
                "19970810T090000",
                "19970819T090000",
                "19970824T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "weekly_interval_wkst_sunday",
            rruleset: "DTSTART:19970805T090000Z\nRRULE:FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU",
            expected: Some(&[
                "19970805T090000",
                "19970817T090000",
                "19970819T090000",
                "19970831T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_first_friday",
            rruleset: "DTSTART:19970905T090000Z\nRRULE:FREQ=MONTHLY;COUNT=10;BYDAY=1FR",
            expected: Some(&[
                "19970905T090000",
                "19971003T090000",
                "19971107T090000",
                "19971205T090000",
                "19980102T090000",
                "19980206T090000",
                "19980306T090000",
                "19980403T090000",
                "19980501T090000",
                "19980605T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_first_friday_start_not_matching",
            rruleset: "DTSTART:20120107T090000Z\nRRULE:FREQ=MONTHLY;COUNT=3;BYDAY=1FR",
            expected: Some(&["20120203T090000", "20120302T090000", "20120406T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_second_to_last_monday",
            rruleset: "DTSTART:19970922T090000Z\nRRULE:FREQ=MONTHLY;COUNT=6;BYDAY=-2MO",
            expected: Some(&[
                "19970922T090000",
                "19971020T090000",
                "19971117T090000",
                "19971222T090000",
                "19980119T090000",
                "19980216T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_third_to_last_day",
            rruleset: "DTSTART:19970928T090000Z\nRRULE:FREQ=MONTHLY;COUNT=6;BYMONTHDAY=-3",
            expected: Some(&[
                "19970928T090000",
                "19971029T090000",
                "19971128T090000",
                "19971229T090000",
                "19980129T090000",
                "19980226T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_31st_skips_short_months",
            rruleset: "DTSTART:19970131T090000Z\nRRULE:FREQ=MONTHLY;COUNT=5",
            expected: Some(&[
                "19970131T090000",
                "19970331T090000",
                "19970531T090000",
                "19970731T090000",
                "19970831T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_friday_13th",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=MONTHLY;COUNT=5;BYDAY=FR;BYMONTHDAY=13",
            expected: Some(&[
                "19980213T090000",
                "19980313T090000",
                "19981113T090000",
                "19990813T090000",
                "20001013T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_setpos_third_weekday",
            rruleset: "DTSTART:19970904T090000Z\nRRULE:FREQ=MONTHLY;COUNT=3;BYDAY=TU,WE,TH;BYSETPOS=3",
            expected: Some(&["19970904T090000", "19971007T090000", "19971106T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "monthly_last_workday",
            rruleset: "DTSTART:19970929T090000Z\nRRULE:FREQ=MONTHLY;COUNT=3;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1",
            expected: Some(&["19970930T090000", "19971031T090000", "19971128T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "yearly_june_july",
            rruleset: "DTSTART:19970610T090000Z\nRRULE:FREQ=YEARLY;COUNT=10;BYMONTH=6,7",
            expected: Some(&[
                "19970610T090000",
                "19970710T090000",
                "19980610T090000",
                "19980710T090000",
                "19990610T090000",
                "19990710T090000",
                "20000610T090000",
                "20000710T090000",
                "20010610T090000",
                "20010710T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "yearly_day_numbers_every_third_year",
            rruleset: "DTSTART:19970101T090000Z\nRRULE:FREQ=YEARLY;INTERVAL=3;COUNT=10;BYYEARDAY=1,100,200",
            expected: Some(&[
                "19970101T090000",
                "19970410T090000",
                "19970719T090000",
                "20000101T090000",
                "20000409T090000",
                "20000718T090000",
                "20030101T090000",
                "20030410T090000",
                "20030719T090000",
                "20060101T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "yearly_week_twenty_monday",
            rruleset: "DTSTART:19970512T090000Z\nRRULE:FREQ=YEARLY;COUNT=3;BYWEEKNO=20;BYDAY=MO",
            expected: Some(&["19970512T090000", "19980511T090000", "19990517T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "yearly_leap_day",
            rruleset: "DTSTART:20000229T090000Z\nRRULE:FREQ=YEARLY;COUNT=3",
            expected: Some(&["20000229T090000", "20040229T090000", "20080229T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "yearly_every_day_in_january_until",
            rruleset: "DTSTART:19980101T090000Z\nRRULE:FREQ=YEARLY;UNTIL=20000131T140000Z;BYMONTH=1;BYDAY=SU,MO,TU,WE,TH,FR,SA",
            expected: None,
            expected_len: Some(93),
            limit: 200,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "hourly_every_third",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=HOURLY;INTERVAL=3;COUNT=4",
            expected: Some(&[
                "19970902T090000",
                "19970902T120000",
                "19970902T150000",
                "19970902T180000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "minutely_every_fifteen",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=MINUTELY;INTERVAL=15;COUNT=6",
            expected: Some(&[
                "19970902T090000",
                "19970902T091500",
                "19970902T093000",
                "19970902T094500",
                "19970902T100000",
                "19970902T101500",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "secondly_basic",
            rruleset: "DTSTART:20120101T090000Z\nRRULE:FREQ=SECONDLY;COUNT=3",
            expected: Some(&["20120101T090000", "20120101T090001", "20120101T090002"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "rdate_exdate",
            rruleset: "DTSTART:20120201T093000Z\nRRULE:FREQ=DAILY;COUNT=3\nRDATE:20120210T093000Z\nEXDATE:20120202T093000Z",
            expected: Some(&["20120201T093000", "20120203T093000", "20120210T093000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: true,
        },
        RRuleCase {
            name: "after_before",
            rruleset: "DTSTART:20120201T093000Z\nRRULE:FREQ=DAILY;COUNT=3",
            expected: Some(&["20120202T093000", "20120203T093000"]),
            expected_len: None,
            limit: 100,
            after: Some("20120201T100000"),
            before: Some("20120401T090000"),
            cross_check: false,
        },
        RRuleCase {
            name: "limit_truncates_unbounded",
            rruleset: "DTSTART:20120101T000000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR",
            expected: None,
            expected_len: Some(250),
            limit: 250,
            after: None,
            before: None,
            cross_check: false,
        },
        RRuleCase {
            name: "count_and_until_together",
            rruleset: "DTSTART:20120101T090000\nRRULE:FREQ=DAILY;COUNT=10;UNTIL=20120103",
            expected: Some(&["20120101T090000", "20120102T090000", "20120103T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: false,
        },
        RRuleCase {
            name: "weekly_mo_th_sunday_start",
            rruleset: "DTSTART:20120101T090000\nRRULE:FREQ=WEEKLY;BYDAY=MO,TH;WKST=SU;COUNT=4",
            expected: Some(&[
                "20120102T090000",
                "20120105T090000",
                "20120109T090000",
                "20120112T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: false,
        },
        RRuleCase {
            name: "two_rules_share_instants",
            rruleset: "DTSTART:20120102T090000\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4\nRRULE:FREQ=WEEKLY;BYDAY=MO,FR;COUNT=4\nRDATE:20120104T090000",
            expected: Some(&[
                "20120102T090000",
                "20120104T090000",
                "20120106T090000",
                "20120109T090000",
                "20120111T090000",
                "20120113T090000",
            ]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: false,
        },
        RRuleCase {
            name: "start_only",
            rruleset: "DTSTART:20120101T090000",
            expected: Some(&["20120101T090000"]),
            expected_len: None,
            limit: 100,
            after: None,
            before: None,
            cross_check: false,
        },
    ]
}

pub fn assert_case(case: &RRuleCase) {
    let set: RecurrenceSet = case
        .rruleset
        .parse()
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));

    let options = ExpansionOptions {
        max_instances: case.limit,
        range_start: case.after.map(parse_basic),
        range_end: case.before.map(parse_basic),
    };
    let result = set
        .expand(&options)
        .unwrap_or_else(|err| panic!("Failed to expand {}: {}", case.name, err));
    let actual: Vec<String> = result.iter().map(|dt| format_datetime(*dt, false)).collect();

    if let Some(expected) = case.expected {
        assert_eq!(actual, expected, "Case {} did not match", case.name);
    }

    if let Some(expected_len) = case.expected_len {
        assert_eq!(
            actual.len(),
            expected_len,
            "Case {} expected {} occurrences",
            case.name,
            expected_len
        );
    }
}

/// Expands the case with both engines and compares the UTC wall-clock instants.
pub fn assert_cross_check(case: &RRuleCase) {
    let set: RecurrenceSet = case
        .rruleset
        .parse()
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));
    let ours = set
        .expand(&ExpansionOptions::default().with_max_instances(case.limit))
        .unwrap_or_else(|err| panic!("Failed to expand {}: {}", case.name, err));

    let reference: rrule::RRuleSet = case
        .rruleset
        .parse()
        .unwrap_or_else(|err| panic!("rrule crate rejected {}: {}", case.name, err));
    let limit = u16::try_from(case.limit).unwrap_or(u16::MAX);
    let theirs: Vec<NaiveDateTime> = reference
        .all(limit)
        .dates
        .iter()
        .map(chrono::DateTime::naive_utc)
        .collect();

    assert_eq!(ours, theirs, "Case {} disagrees with the rrule crate", case.name);
}

fn parse_basic(value: &str) -> NaiveDateTime {
    parse_instant(value).unwrap_or_else(|err| panic!("Failed to parse instant {value}: {err}"))
}

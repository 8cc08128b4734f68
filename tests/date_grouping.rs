use chrono::{Datelike, Days, NaiveDate, Weekday};
use logbook::dates::{group_weeks, group_weeks_str, parse_date};
use logbook::error::LogbookError;

fn d(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

#[test]
fn one_full_week() {
    let weeks = group_weeks(d("2025-06-02"), d("2025-06-08")).unwrap();
    assert_eq!(weeks.len(), 1);
    assert_eq!(weeks[0].week_ending, d("2025-06-08"));
    assert_eq!(weeks[0].dates.len(), 7);
    assert!(weeks[0].reached_sunday());
}

#[test]
fn mid_week_end_projects_sunday() {
    let weeks = group_weeks(d("2025-06-02"), d("2025-06-11")).unwrap();
    assert_eq!(weeks.len(), 2);
    let last = &weeks[1];
    assert_eq!(last.week_ending, d("2025-06-15"));
    assert_eq!(last.dates.last().copied(), Some(d("2025-06-11")));
    assert!(!last.reached_sunday());
}

#[test]
fn mid_week_start_keeps_its_sunday() {
    let weeks = group_weeks(d("2025-06-05"), d("2025-06-09")).unwrap();
    let endings: Vec<_> = weeks.iter().map(|w| w.week_ending).collect();
    assert_eq!(endings, vec![d("2025-06-08"), d("2025-06-15")]);
    assert_eq!(weeks[0].dates.len(), 4);
    assert_eq!(weeks[1].dates, vec![d("2025-06-09")]);
}

#[test]
fn single_day_range() {
    let weeks = group_weeks(d("2025-06-04"), d("2025-06-04")).unwrap();
    assert_eq!(weeks.len(), 1);
    assert_eq!(weeks[0].week_ending, d("2025-06-08"));
}

#[test]
fn weeks_cover_range_exactly() {
    let starts = ["2024-12-28", "2025-01-01", "2025-02-24", "2025-06-08"];
    for start in starts {
        let start = d(start);
        for len in [0u64, 1, 6, 7, 13, 30, 95] {
            let end = start + Days::new(len);
            let weeks = group_weeks(start, end).unwrap();

            let all: Vec<NaiveDate> = weeks.iter().flat_map(|w| w.dates.iter().copied()).collect();
            let expected: Vec<NaiveDate> = start.iter_days().take_while(|x| *x <= end).collect();
            assert_eq!(all, expected, "{start}..{end}");

            for w in &weeks {
                assert_eq!(w.week_ending.weekday(), Weekday::Sun);
                assert!(w.dates.iter().all(|x| *x <= w.week_ending && *x + Days::new(6) >= w.week_ending));
            }
        }
    }
}

#[test]
fn reversed_range_is_rejected() {
    let err = group_weeks(d("2025-06-09"), d("2025-06-02")).unwrap_err();
    assert!(matches!(err, LogbookError::InvalidRange { .. }));
}

#[test]
fn malformed_dates_name_the_format() {
    let err = group_weeks_str("06/02/2025", "2025-06-08").unwrap_err();
    assert!(matches!(err, LogbookError::InvalidDateFormat { .. }));
    assert!(err.to_string().contains("YYYY-MM-DD"));
}

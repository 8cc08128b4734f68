use crate::error::LogbookError;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"));

/// Strict `YYYY-MM-DD` parsing.
pub fn parse_date(raw: &str) -> Result<NaiveDate, LogbookError> {
    let raw = raw.trim();
    let invalid = || LogbookError::InvalidDateFormat {
        value: raw.to_string(),
    };
    if !DATE_RE.is_match(raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Sunday of the Monday-Sunday week containing `date`.
pub fn projected_sunday(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday();
    date.checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(date)
}

/// Dates of one week inside the requested range. `week_ending` is always the week's Sunday,
/// even when the range stops before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSpan {
    pub week_ending: NaiveDate,
    pub dates: Vec<NaiveDate>,
}

impl WeekSpan {
    /// The span reached its Sunday rather than being cut off by the end of the range.
    pub fn reached_sunday(&self) -> bool {
        self.dates
            .last()
            .is_some_and(|d| d.weekday() == Weekday::Sun)
    }
}

/// Partition `[start, end]` into Monday-Sunday weeks.
pub fn group_weeks(start: NaiveDate, end: NaiveDate) -> Result<Vec<WeekSpan>, LogbookError> {
    if start > end {
        return Err(LogbookError::InvalidRange { start, end });
    }

    let mut weeks = Vec::new();
    let mut current = Vec::new();

    for date in start.iter_days().take_while(|d| *d <= end) {
        current.push(date);
        if date.weekday() == Weekday::Sun || date == end {
            weeks.push(WeekSpan {
                week_ending: projected_sunday(date),
                dates: std::mem::take(&mut current),
            });
        }
    }

    Ok(weeks)
}

pub fn group_weeks_str(start: &str, end: &str) -> Result<Vec<WeekSpan>, LogbookError> {
    group_weeks(parse_date(start)?, parse_date(end)?)
}

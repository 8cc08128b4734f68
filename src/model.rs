use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Sentinel activity number used whenever no match could be resolved.
pub const ACTIVITY_NA: &str = "N/A";

/// One day's logged work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub date: NaiveDate,
    pub description: String,
    pub activity_no: String,
}

impl TaskEntry {
    pub fn new(date: NaiveDate, description: impl Into<String>, activity_no: impl Into<String>) -> Self {
        Self {
            date,
            description: description.into(),
            activity_no: activity_no.into(),
        }
    }
}

/// One calendar week of tasks plus the week's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRecord {
    pub week_ending: NaiveDate,
    pub tasks: Vec<TaskEntry>,
    pub problems: String,
    pub solutions: String,
    #[serde(default)]
    pub supervisor_comment: String,
}

impl WeekRecord {
    /// Tasks are kept in calendar order; any task outside the week is dropped.
    pub fn new(
        week_ending: NaiveDate,
        mut tasks: Vec<TaskEntry>,
        problems: impl Into<String>,
        solutions: impl Into<String>,
    ) -> Self {
        tasks.retain(|t| week_contains(week_ending, t.date));
        tasks.sort_by_key(|t| t.date);
        tasks.dedup_by_key(|t| t.date);
        Self {
            week_ending,
            tasks,
            problems: problems.into(),
            solutions: solutions.into(),
            supervisor_comment: String::new(),
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        week_start(self.week_ending)
    }

    pub fn task_on(&self, date: NaiveDate) -> Option<&TaskEntry> {
        self.tasks.iter().find(|t| t.date == date)
    }

    /// The text fed to the summary and comment prompts: one `- ` line per task.
    pub fn tasks_summary(&self) -> String {
        tasks_summary(self.tasks.iter().map(|t| t.description.as_str()))
    }

    pub fn set_supervisor_comment(&mut self, comment: impl Into<String>) {
        self.supervisor_comment = comment.into();
    }
}

pub fn tasks_summary<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> String {
    descriptions
        .into_iter()
        .map(|d| format!("- {d}\n"))
        .collect()
}

/// Monday of the week ending on `week_ending`.
pub fn week_start(week_ending: NaiveDate) -> NaiveDate {
    week_ending
        .checked_sub_days(Days::new(6))
        .unwrap_or(NaiveDate::MIN)
}

pub fn week_contains(week_ending: NaiveDate, date: NaiveDate) -> bool {
    date <= week_ending && date >= week_start(week_ending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_orders_tasks_and_drops_strays() {
        let week = WeekRecord::new(
            d("2025-06-08"),
            vec![
                TaskEntry::new(d("2025-06-04"), "b", "1.1, 1.2"),
                TaskEntry::new(d("2025-06-02"), "a", "N/A"),
                TaskEntry::new(d("2025-06-09"), "next week", "N/A"),
            ],
            "p",
            "s",
        );
        let dates: Vec<_> = week.tasks.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![d("2025-06-02"), d("2025-06-04")]);
        assert_eq!(week.tasks_summary(), "- a\n- b\n");
    }
}

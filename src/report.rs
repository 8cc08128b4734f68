use crate::model::{TaskEntry, WeekRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Draft,
    Submitted,
    Completed,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportStatus::Draft => "DRAFT",
            ReportStatus::Submitted => "SUBMITTED",
            ReportStatus::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: u64,
    pub student_name: String,
    pub created_at: String,
    pub status: ReportStatus,
    /// SHA-256 of the uploaded workbook.
    #[serde(default)]
    pub source_digest: String,
    pub weeks: Vec<WeekEntry>,
}

/// A stored week. `version` counts supervisor comment writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekEntry {
    pub id: u64,
    pub report_id: u64,
    pub week_ending: NaiveDate,
    pub tasks_summary: String,
    pub tasks: Vec<TaskEntry>,
    pub problems: String,
    pub solutions: String,
    #[serde(default)]
    pub supervisor_comment: String,
    #[serde(default)]
    pub version: u64,
}

impl WeekEntry {
    pub fn to_record(&self) -> WeekRecord {
        let mut record = WeekRecord::new(
            self.week_ending,
            self.tasks.clone(),
            &self.problems,
            &self.solutions,
        );
        record.set_supervisor_comment(&self.supervisor_comment);
        record
    }
}

/// A week to be stored, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWeek {
    pub week_ending: NaiveDate,
    pub tasks_summary: String,
    pub tasks: Vec<TaskEntry>,
    pub problems: String,
    pub solutions: String,
}

impl From<&WeekRecord> for NewWeek {
    fn from(week: &WeekRecord) -> Self {
        Self {
            week_ending: week.week_ending,
            tasks_summary: week.tasks_summary(),
            tasks: week.tasks.clone(),
            problems: week.problems.clone(),
            solutions: week.solutions.clone(),
        }
    }
}

/// What `show` prints.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub report_id: u64,
    pub student_name: String,
    pub status: ReportStatus,
    pub weeks: Vec<WeekPreview>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekPreview {
    pub week_id: u64,
    pub week_ending: NaiveDate,
    pub tasks: Vec<TaskEntry>,
    pub problems: String,
    pub solutions: String,
    pub supervisor_comment: String,
}

impl From<&Report> for Preview {
    fn from(report: &Report) -> Self {
        Self {
            report_id: report.id,
            student_name: report.student_name.clone(),
            status: report.status,
            weeks: report
                .weeks
                .iter()
                .map(|w| WeekPreview {
                    week_id: w.id,
                    week_ending: w.week_ending,
                    tasks: w.tasks.clone(),
                    problems: w.problems.clone(),
                    solutions: w.solutions.clone(),
                    supervisor_comment: w.supervisor_comment.clone(),
                })
                .collect(),
        }
    }
}

/// Summary row for `list`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub id: u64,
    pub student_name: String,
    pub created_at: String,
    pub status: ReportStatus,
    pub weeks: usize,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id,
            student_name: report.student_name.clone(),
            created_at: report.created_at.clone(),
            status: report.status,
            weeks: report.weeks.len(),
        }
    }
}

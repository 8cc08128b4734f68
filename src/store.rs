//! Persistence for reports and their weeks. Each write is its own commit.
//!
//! The file store serializes writers across processes with an exclusive lock on a sibling
//! `.lock` file, held from load to save, so version checks see the latest commit.

use crate::error::LogbookError;
use crate::report::{NewWeek, Report, ReportStatus, WeekEntry};
use crate::util::{ensure_dir, now_rfc3339};
use anyhow::{anyhow, Context, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

pub trait RecordStore {
    fn create_report(&self, student_name: &str, source_digest: &str, weeks: Vec<NewWeek>) -> Result<Report>;
    fn report(&self, id: u64) -> Result<Report>;
    /// All reports, or only those with `status`.
    fn reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>>;
    fn set_status(&self, id: u64, status: ReportStatus) -> Result<Report>;
    fn week(&self, id: u64) -> Result<WeekEntry>;
    /// With `expected_version`, the write only happens if the stored version matches.
    fn set_comment(&self, week_id: u64, comment: &str, expected_version: Option<u64>) -> Result<WeekEntry>;
    /// Several comments in one commit, without version checks. Nothing is written if any
    /// week is missing.
    fn set_comments(&self, comments: &[(u64, String)]) -> Result<Vec<WeekEntry>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    next_report_id: u64,
    next_week_id: u64,
    reports: Vec<Report>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_report_id: 1,
            next_week_id: 1,
            reports: Vec::new(),
        }
    }
}

impl StoreData {
    fn create_report(&mut self, student_name: &str, source_digest: &str, weeks: Vec<NewWeek>) -> Report {
        let id = self.next_report_id;
        self.next_report_id += 1;

        let weeks = weeks
            .into_iter()
            .map(|w| {
                let week_id = self.next_week_id;
                self.next_week_id += 1;
                WeekEntry {
                    id: week_id,
                    report_id: id,
                    week_ending: w.week_ending,
                    tasks_summary: w.tasks_summary,
                    tasks: w.tasks,
                    problems: w.problems,
                    solutions: w.solutions,
                    supervisor_comment: String::new(),
                    version: 0,
                }
            })
            .collect();

        let report = Report {
            id,
            student_name: student_name.to_string(),
            created_at: now_rfc3339(),
            status: ReportStatus::Draft,
            source_digest: source_digest.to_string(),
            weeks,
        };
        self.reports.push(report.clone());
        report
    }

    fn report(&self, id: u64) -> Result<&Report, LogbookError> {
        self.reports
            .iter()
            .find(|r| r.id == id)
            .ok_or(LogbookError::report_not_found(id))
    }

    fn report_mut(&mut self, id: u64) -> Result<&mut Report, LogbookError> {
        self.reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(LogbookError::report_not_found(id))
    }

    fn reports(&self, status: Option<ReportStatus>) -> Vec<Report> {
        self.reports
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect()
    }

    fn week(&self, id: u64) -> Result<&WeekEntry, LogbookError> {
        self.reports
            .iter()
            .flat_map(|r| r.weeks.iter())
            .find(|w| w.id == id)
            .ok_or(LogbookError::week_not_found(id))
    }

    fn week_mut(&mut self, id: u64) -> Result<&mut WeekEntry, LogbookError> {
        self.reports
            .iter_mut()
            .flat_map(|r| r.weeks.iter_mut())
            .find(|w| w.id == id)
            .ok_or(LogbookError::week_not_found(id))
    }

    fn set_comment(
        &mut self,
        week_id: u64,
        comment: &str,
        expected_version: Option<u64>,
    ) -> Result<WeekEntry, LogbookError> {
        let week = self.week_mut(week_id)?;
        if let Some(expected) = expected_version {
            if expected != week.version {
                return Err(LogbookError::VersionConflict {
                    week_id,
                    expected,
                    found: week.version,
                });
            }
        }
        week.supervisor_comment = comment.to_string();
        week.version += 1;
        Ok(week.clone())
    }

    fn set_comments(&mut self, comments: &[(u64, String)]) -> Result<Vec<WeekEntry>, LogbookError> {
        for (week_id, _) in comments {
            self.week(*week_id)?;
        }
        comments
            .iter()
            .map(|(week_id, comment)| self.set_comment(*week_id, comment, None))
            .collect()
    }
}

/// The whole store in one JSON document, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreData> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading store: {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing store: {}", self.path.display()))
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn save(&self, data: &StoreData) -> Result<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, data)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing store: {}", self.path.display()))?;
        debug!("store saved to {}", self.path.display());
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T, LogbookError>) -> Result<T> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("opening lock file: {}", lock_path.display()))?;
        lock.lock_exclusive()
            .with_context(|| format!("locking store: {}", lock_path.display()))?;

        let mut data = self.load()?;
        let out = f(&mut data)?;
        self.save(&data)?;
        // dropping the handle releases the lock
        drop(lock);
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    fn create_report(&self, student_name: &str, source_digest: &str, weeks: Vec<NewWeek>) -> Result<Report> {
        self.modify(|data| Ok(data.create_report(student_name, source_digest, weeks)))
    }

    fn report(&self, id: u64) -> Result<Report> {
        Ok(self.load()?.report(id)?.clone())
    }

    fn reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        Ok(self.load()?.reports(status))
    }

    fn set_status(&self, id: u64, status: ReportStatus) -> Result<Report> {
        self.modify(|data| {
            let report = data.report_mut(id)?;
            report.status = status;
            Ok(report.clone())
        })
    }

    fn week(&self, id: u64) -> Result<WeekEntry> {
        Ok(self.load()?.week(id)?.clone())
    }

    fn set_comment(&self, week_id: u64, comment: &str, expected_version: Option<u64>) -> Result<WeekEntry> {
        self.modify(|data| data.set_comment(week_id, comment, expected_version))
    }

    fn set_comments(&self, comments: &[(u64, String)]) -> Result<Vec<WeekEntry>> {
        self.modify(|data| data.set_comments(comments))
    }
}

/// Keeps everything in memory; for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut StoreData) -> Result<T, LogbookError>) -> Result<T> {
        let mut data = self.data.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(f(&mut *data)?)
    }
}

impl RecordStore for MemoryStore {
    fn create_report(&self, student_name: &str, source_digest: &str, weeks: Vec<NewWeek>) -> Result<Report> {
        self.with(|data| Ok(data.create_report(student_name, source_digest, weeks)))
    }

    fn report(&self, id: u64) -> Result<Report> {
        self.with(|data| data.report(id).cloned())
    }

    fn reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        self.with(|data| Ok(data.reports(status)))
    }

    fn set_status(&self, id: u64, status: ReportStatus) -> Result<Report> {
        self.with(|data| {
            let report = data.report_mut(id)?;
            report.status = status;
            Ok(report.clone())
        })
    }

    fn week(&self, id: u64) -> Result<WeekEntry> {
        self.with(|data| data.week(id).cloned())
    }

    fn set_comment(&self, week_id: u64, comment: &str, expected_version: Option<u64>) -> Result<WeekEntry> {
        self.with(|data| data.set_comment(week_id, comment, expected_version))
    }

    fn set_comments(&self, comments: &[(u64, String)]) -> Result<Vec<WeekEntry>> {
        self.with(|data| data.set_comments(comments))
    }
}

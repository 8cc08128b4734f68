//! The record workflow: upload, review, supervisor comments and the final document.

use crate::{
    assemble::{render_final, TemplateOutcome},
    config::Config,
    dates::parse_date,
    llm::{Completion, LlmDiag},
    model::WeekRecord,
    pipeline::Pipeline,
    report::{NewWeek, Preview, Report, ReportStatus, ReportSummary, WeekEntry},
    store::RecordStore,
    util::sha256_hex,
};
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

pub struct Logbook<C: Completion, S: RecordStore> {
    cfg: Config,
    pipeline: Pipeline<C>,
    store: S,
}

impl<C: Completion, S: RecordStore> Logbook<C, S> {
    pub fn new(cfg: &Config, client: C, store: S) -> Self {
        Self {
            cfg: cfg.clone(),
            pipeline: Pipeline::new(cfg, client),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse and enrich an uploaded workbook into a new draft report.
    pub fn upload(&self, bytes: &[u8], student_name: &str, start: &str, end: &str) -> Result<Report> {
        let (start, end) = (parse_date(start)?, parse_date(end)?);
        let digest = sha256_hex(bytes);
        info!("upload for {student_name:?}: {start}..{end} digest={}", &digest[..12]);

        let weeks = self.pipeline.process_upload(bytes, start, end)?;
        let report = self.store.create_report(
            student_name,
            &digest,
            weeks.iter().map(NewWeek::from).collect(),
        )?;
        info!("report {} created with {} weeks", report.id, report.weeks.len());
        Ok(report)
    }

    pub fn generate_template(&self, path: &Path, sheet_name: &str, start: &str, end: &str) -> Result<TemplateOutcome> {
        let (start, end) = (parse_date(start)?, parse_date(end)?);
        self.pipeline.generate_template(path, sheet_name, start, end)
    }

    pub fn report(&self, id: u64) -> Result<Report> {
        self.store.report(id)
    }

    pub fn preview(&self, id: u64) -> Result<Preview> {
        Ok(Preview::from(&self.store.report(id)?))
    }

    pub fn submit(&self, id: u64) -> Result<Report> {
        let report = self.store.set_status(id, ReportStatus::Submitted)?;
        info!("report {id} submitted");
        Ok(report)
    }

    /// Reports waiting for the supervisor.
    pub fn submitted(&self) -> Result<Vec<ReportSummary>> {
        Ok(self
            .store
            .reports(Some(ReportStatus::Submitted))?
            .iter()
            .map(ReportSummary::from)
            .collect())
    }

    pub fn weeks(&self, report_id: u64) -> Result<Vec<WeekEntry>> {
        Ok(self.store.report(report_id)?.weeks)
    }

    pub fn update_comment(&self, week_id: u64, comment: &str, expected_version: Option<u64>) -> Result<WeekEntry> {
        let week = self.store.set_comment(week_id, comment, expected_version)?;
        info!("week {week_id} comment set (version {})", week.version);
        Ok(week)
    }

    /// Same comment on every week of the report, in one commit. Returns how many weeks
    /// were updated.
    pub fn comment_all(&self, report_id: u64, comment: &str) -> Result<usize> {
        let report = self.store.report(report_id)?;
        let comments: Vec<_> = report.weeks.iter().map(|w| (w.id, comment.to_string())).collect();
        let updated = self.store.set_comments(&comments)?;
        info!("report {report_id}: comment set on {} weeks", updated.len());
        Ok(updated.len())
    }

    /// Draft the supervisor comment with the language model and store it.
    pub fn generate_comment(&self, week_id: u64) -> Result<WeekEntry> {
        let week = self.store.week(week_id)?;
        let comment = self.pipeline.enricher().supervisor_comment(&week.tasks_summary);
        self.store.set_comment(week_id, &comment, None)
    }

    /// Draft comments for every week, then store them in one commit.
    pub fn generate_comments_all(&self, report_id: u64) -> Result<Vec<(u64, String)>> {
        let report = self.store.report(report_id)?;
        let comments: Vec<(u64, String)> = report
            .weeks
            .iter()
            .map(|w| (w.id, self.pipeline.enricher().supervisor_comment(&w.tasks_summary)))
            .collect();
        self.store.set_comments(&comments)?;
        info!("report {report_id}: drafted {} comments", comments.len());
        Ok(comments)
    }

    /// The final document without a signature, for the student's own copy.
    pub fn download(&self, report_id: u64) -> Result<Vec<u8>> {
        let report = self.store.report(report_id)?;
        render_final(&self.cfg.sheets.final_sheet, &records(&report), None)
    }

    /// Sign off: render with the supervisor's signature and mark the report completed.
    pub fn finalize(&self, report_id: u64, signature: &[u8]) -> Result<Vec<u8>> {
        let report = self.store.report(report_id)?;
        if report.status != ReportStatus::Submitted {
            warn!("finalizing report {report_id} in status {}", report.status);
        }
        let bytes = render_final(&self.cfg.sheets.final_sheet, &records(&report), Some(signature))?;
        self.store.set_status(report_id, ReportStatus::Completed)?;
        info!("report {report_id} completed");
        Ok(bytes)
    }

    pub fn health(&self) -> Result<LlmDiag> {
        self.pipeline.enricher().client().doctor()
    }
}

fn records(report: &Report) -> Vec<WeekRecord> {
    report.weeks.iter().map(WeekEntry::to_record).collect()
}

use crate::{
    assemble::{extend_template, TemplateOutcome, TemplateSheet},
    config::Config,
    dates::{group_weeks, WeekSpan},
    enrich::Enricher,
    layout::{self, EditableWorkbook, Workbook},
    llm::Completion,
    model::{TaskEntry, WeekRecord},
    source::{self, Upload},
    util::ensure_dir,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

pub struct Pipeline<C: Completion> {
    cfg: Config,
    enricher: Enricher<C>,
}

impl<C: Completion> Pipeline<C> {
    pub fn new(cfg: &Config, client: C) -> Self {
        Self {
            cfg: cfg.clone(),
            enricher: Enricher::new(&cfg.llm, client),
        }
    }

    pub fn enricher(&self) -> &Enricher<C> {
        &self.enricher
    }

    /// Read an uploaded workbook and resolve every week of `[start, end]` that has tasks.
    pub fn process_upload(&self, bytes: &[u8], start: NaiveDate, end: NaiveDate) -> Result<Vec<WeekRecord>> {
        let spans = group_weeks(start, end)?;
        let workbook = layout::load_bytes(bytes)?;
        let upload = source::read_upload(
            &workbook,
            &self.cfg.sheets.task_sheet,
            &self.cfg.sheets.activity_sheet,
            &self.cfg.tasks,
        )?;
        Ok(self.enrich_weeks(&spans, &upload))
    }

    /// Weeks without tasks are dropped.
    pub fn enrich_weeks(&self, spans: &[WeekSpan], upload: &Upload) -> Vec<WeekRecord> {
        let started = Instant::now();
        let mut weeks = Vec::new();

        for span in spans {
            let tasks: Vec<TaskEntry> = span
                .dates
                .iter()
                .filter_map(|date| {
                    let desc = upload.tasks.get(date)?;
                    let activity = self.enricher.activity_no(desc, &upload.catalog);
                    Some(TaskEntry::new(*date, desc.as_str(), activity))
                })
                .collect();

            if tasks.is_empty() {
                info!("week ending {}: no tasks, dropped", span.week_ending);
                continue;
            }

            let mut week = WeekRecord::new(span.week_ending, tasks, "", "");
            let summary = self.enricher.weekly_summary(&week.tasks_summary());
            week.problems = summary.problems;
            week.solutions = summary.solutions;
            info!("week ending {}: {} tasks", week.week_ending, week.tasks.len());
            weeks.push(week);
        }

        info!(
            "enriched {} of {} weeks in {:.1}s",
            weeks.len(),
            spans.len(),
            started.elapsed().as_secs_f64()
        );
        weeks
    }

    /// Extend the template form in the workbook at `path`, creating the file if needed.
    /// Task descriptions come from the workbook's own task sheet when it has one.
    ///
    /// The file is edited in place: only the blocks written by this run change.
    pub fn generate_template(
        &self,
        path: &Path,
        sheet_name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TemplateOutcome> {
        let spans = group_weeks(start, end)?;

        let (values, mut book) = if path.exists() {
            info!("extending {}", path.display());
            (layout::load(path)?, EditableWorkbook::open(path)?)
        } else {
            info!("creating {}", path.display());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            (Workbook::new(), EditableWorkbook::new())
        };

        let tasks = values
            .sheet(&self.cfg.sheets.task_sheet)
            .map(|s| source::read_tasks(s, &self.cfg.tasks))
            .unwrap_or_else(BTreeMap::new);
        debug!("{} tasks available for the form", tasks.len());

        let mut template = match values.sheet(sheet_name) {
            Some(loaded) => TemplateSheet::restore(loaded)?,
            None => TemplateSheet::new(sheet_name),
        };

        let outcome = extend_template(&mut template, &spans, &tasks)?;
        for edit in &template.edits {
            book.patch_rows(&template.sheet, edit.rows(), edit.created)?;
        }

        book.save(path).with_context(|| format!("saving template: {}", path.display()))?;
        info!(
            "template: {} new blocks, {} re-opened, {} days written, {} skipped",
            outcome.blocks_created, outcome.blocks_reopened, outcome.days_written, outcome.days_skipped
        );
        Ok(outcome)
    }
}

//! Readers for the upstream documents: the task sheet and the activity catalog.

use crate::config::Tasks;
use crate::dates::parse_date;
use crate::enrich::ActivityCatalog;
use crate::layout::grid::{CellValue, Sheet, COL_A, COL_B, COL_C};
use crate::layout::Workbook;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

/// Row 1 holds the column headers.
const FIRST_DATA_ROW: u32 = 2;

/// Everything an upload provides.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub tasks: BTreeMap<NaiveDate, String>,
    pub catalog: ActivityCatalog,
}

/// Read tasks and the activity catalog from an uploaded workbook.
pub fn read_upload(workbook: &Workbook, task_sheet: &str, activity_sheet: &str, cfg: &Tasks) -> Result<Upload> {
    let sheet = workbook
        .sheet(task_sheet)
        .ok_or_else(|| anyhow!("workbook has no sheet named {task_sheet:?}"))?;
    let tasks = read_tasks(sheet, cfg);

    let catalog = match workbook.sheet(activity_sheet) {
        Some(sheet) => read_activity_catalog(sheet),
        None => {
            info!("no {activity_sheet:?} sheet, activity numbers will be N/A");
            ActivityCatalog::default()
        }
    };

    info!("upload: {} dated tasks, {} activities", tasks.len(), catalog.len());
    Ok(Upload { tasks, catalog })
}

/// Date in column A, description in column B. Later rows win on duplicate dates.
pub fn read_tasks(sheet: &Sheet, cfg: &Tasks) -> BTreeMap<NaiveDate, String> {
    let mut tasks = BTreeMap::new();
    for row in FIRST_DATA_ROW..=sheet.max_row() {
        let Some(date) = date_cell(sheet.value(row, COL_A)) else {
            continue;
        };
        let Some(desc) = text_cell(sheet.value(row, COL_B)).map(|s| clean_description(&s, cfg)) else {
            continue;
        };
        if desc.is_empty() {
            debug!("row {row}: empty description, skipped");
            continue;
        }
        tasks.insert(date, desc);
    }
    tasks
}

/// Columns B and C are code and description; only leaf codes (containing `.`) are kept.
pub fn read_activity_catalog(sheet: &Sheet) -> ActivityCatalog {
    let mut catalog = ActivityCatalog::default();
    for row in 1..=sheet.max_row() {
        let code = text_cell(sheet.value(row, COL_B));
        let desc = text_cell(sheet.value(row, COL_C));
        let (Some(code), Some(desc)) = (code, desc) else {
            continue;
        };
        if code.contains('.') {
            catalog.push(&code, &desc);
        }
    }
    catalog
}

fn date_cell(value: Option<&CellValue>) -> Option<NaiveDate> {
    match value? {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_date(s).ok(),
        CellValue::Number(_) => None,
    }
}

fn text_cell(value: Option<&CellValue>) -> Option<String> {
    let text = match value? {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Number(n) => n.to_string(),
        CellValue::DateTime(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub fn clean_description(raw: &str, cfg: &Tasks) -> String {
    let text: String = if cfg.normalize_unicode {
        raw.nfkc().collect()
    } else {
        raw.to_string()
    };
    if cfg.collapse_whitespace {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.trim().to_string()
    }
}

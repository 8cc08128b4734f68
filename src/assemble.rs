//! Turns weeks into sheets: one-shot final documents and the growing template form.

use crate::dates::WeekSpan;
use crate::error::LogbookError;
use crate::layout::block::{self, BlockState, Mode, WeekBlock, APPEND_OFFSET, BLOCK_STRIDE};
use crate::layout::grid::{RowNum, Sheet, COL_A, COL_D};
use crate::layout::{find_blocks, xlsx, Signature, Workbook};
use crate::model::WeekRecord;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Lay out `weeks` back to back from row 1. Weeks without tasks get no block.
pub fn final_sheet(
    name: &str,
    weeks: &[WeekRecord],
    signature: Option<&Signature>,
) -> Result<Sheet, LogbookError> {
    let mut sheet = Sheet::new(name);
    block::set_column_widths(&mut sheet);

    let mut cursor: RowNum = 1;
    for week in weeks {
        if week.tasks.is_empty() {
            debug!("week ending {} has no tasks, no block", week.week_ending);
            continue;
        }
        block::write_record(&mut sheet, cursor, week, signature)?;
        cursor += BLOCK_STRIDE;
    }
    Ok(sheet)
}

/// Render the final document. A signature that cannot be decoded is left out.
pub fn render_final(name: &str, weeks: &[WeekRecord], signature: Option<&[u8]>) -> Result<Vec<u8>> {
    let signature = signature.and_then(|bytes| match Signature::decode(bytes) {
        Ok(sig) => Some(sig),
        Err(err) => {
            warn!("continuing without signature: {err}");
            None
        }
    });

    let sheet = final_sheet(name, weeks, signature.as_ref())?;
    let mut workbook = Workbook::new();
    workbook.push(sheet);
    info!(
        "final document: {} weeks, signed={}",
        weeks.iter().filter(|w| !w.tasks.is_empty()).count(),
        signature.is_some()
    );
    xlsx::to_bytes(&workbook)
}

/// A block written during one [`extend_template`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEdit {
    pub start_row: RowNum,
    /// Newly laid out, as opposed to re-opened.
    pub created: bool,
}

impl BlockEdit {
    pub fn rows(&self) -> std::ops::RangeInclusive<RowNum> {
        self.start_row..=self.start_row + block::BLOCK_ROWS - 1
    }
}

/// A template sheet ready to be extended, with the blocks already on it.
#[derive(Debug, Clone)]
pub struct TemplateSheet {
    pub sheet: Sheet,
    pub blocks: Vec<WeekBlock>,
    pub edits: Vec<BlockEdit>,
}

impl TemplateSheet {
    pub fn new(name: &str) -> Self {
        let mut sheet = Sheet::new(name);
        block::set_column_widths(&mut sheet);
        Self {
            sheet,
            blocks: Vec::new(),
            edits: Vec::new(),
        }
    }

    /// Rebuild a sheet read back from disk. Blocks are re-rendered from their geometry;
    /// anything outside them is carried over as plain values so new blocks land below it.
    pub fn restore(loaded: &Sheet) -> Result<Self, LogbookError> {
        let parsed = find_blocks(loaded);
        let in_block = |row: RowNum, col| {
            (COL_A..=COL_D).contains(&col)
                && parsed
                    .iter()
                    .any(|b| (b.start_row..=b.end_row()).contains(&row))
        };

        let mut out = Self::new(&loaded.name);
        for ((row, col), cell) in loaded.cells() {
            if in_block(row, col) {
                continue;
            }
            if let Some(value) = &cell.value {
                out.sheet.put(row, col, value.clone(), cell.style);
            }
        }
        for b in &parsed {
            if let Some(restored) = b.restore(&mut out.sheet, Mode::Template)? {
                out.blocks.push(restored);
            }
        }
        debug!("restored {} blocks on {:?}", out.blocks.len(), loaded.name);
        Ok(out)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateOutcome {
    pub blocks_created: usize,
    pub blocks_reopened: usize,
    pub days_written: usize,
    pub days_skipped: usize,
    /// Weeks whose Sunday row is now filled.
    pub closed_weeks: Vec<NaiveDate>,
}

/// Append the weeks of `spans` to the form. Dates falling in an open block already on the
/// sheet fill that block; dates in a closed block are skipped.
pub fn extend_template(
    template: &mut TemplateSheet,
    spans: &[WeekSpan],
    tasks: &BTreeMap<NaiveDate, String>,
) -> Result<TemplateOutcome, LogbookError> {
    let mut outcome = TemplateOutcome::default();
    let mut cursor = if template.sheet.is_empty() {
        1
    } else {
        template.sheet.max_row() + APPEND_OFFSET
    };

    for span in spans {
        let existing = template
            .blocks
            .iter()
            .position(|b| b.week_ending() == span.week_ending);

        let idx = match existing {
            Some(i) if template.blocks[i].state() == BlockState::Closed => {
                warn!(
                    "week ending {} is closed, skipping {} dates",
                    span.week_ending,
                    span.dates.len()
                );
                outcome.days_skipped += span.dates.len();
                continue;
            }
            Some(i) => {
                info!("re-opening week ending {}", span.week_ending);
                outcome.blocks_reopened += 1;
                template.edits.push(BlockEdit {
                    start_row: template.blocks[i].start_row(),
                    created: false,
                });
                i
            }
            None => {
                let opened = WeekBlock::open(&mut template.sheet, cursor, span.week_ending, Mode::Template);
                debug!("new block at row {cursor} for week ending {}", span.week_ending);
                template.edits.push(BlockEdit {
                    start_row: cursor,
                    created: true,
                });
                cursor += BLOCK_STRIDE;
                outcome.blocks_created += 1;
                template.blocks.push(opened);
                template.blocks.len() - 1
            }
        };

        let block = &mut template.blocks[idx];
        for &date in &span.dates {
            block.write_day(&mut template.sheet, date, tasks.get(&date).map(String::as_str), None)?;
            outcome.days_written += 1;
        }
        if block.finish(&mut template.sheet) == BlockState::Closed {
            outcome.closed_weeks.push(span.week_ending);
        }
    }

    Ok(outcome)
}

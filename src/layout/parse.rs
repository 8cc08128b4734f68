use super::block::{self, rows, BlockState, Mode, WeekBlock, WEEK_ENDING_LABEL};
use super::grid::{CellValue, RowNum, Sheet, COL_A, COL_B, COL_C, COL_D};
use crate::dates::{parse_date, projected_sunday};
use crate::error::LogbookError;
use crate::model::{TaskEntry, WeekRecord, ACTIVITY_NA};
use chrono::{Datelike, NaiveDate};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDay {
    pub row: RowNum,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub activity_no: Option<String>,
}

/// A week block read back from a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
    pub start_row: RowNum,
    /// The stamped week-ending value, if any.
    pub week_ending: Option<NaiveDate>,
    pub days: Vec<ParsedDay>,
    pub problems: String,
    pub solutions: String,
    pub supervisor_comment: String,
}

impl ParsedBlock {
    /// The week's Sunday: the stamped value, else projected from the first row whose date
    /// matches its weekday.
    pub fn sunday(&self) -> Option<NaiveDate> {
        self.week_ending.or_else(|| {
            self.days
                .iter()
                .find(|d| d.row - self.start_row - rows::FIRST_DAY == d.date.weekday().num_days_from_monday())
                .map(|d| projected_sunday(d.date))
        })
    }

    /// Closed once the Sunday row carries a date.
    pub fn state(&self) -> BlockState {
        let sunday_row = self.start_row + rows::LAST_DAY;
        if self.days.iter().any(|d| d.row == sunday_row) {
            BlockState::Closed
        } else {
            BlockState::Open
        }
    }

    pub fn end_row(&self) -> RowNum {
        self.start_row + block::BLOCK_ROWS - 1
    }

    /// Days with a description become tasks; a missing activity number reads as `N/A`.
    pub fn to_week_record(&self) -> Option<WeekRecord> {
        let week_ending = self.sunday()?;
        let tasks = self
            .days
            .iter()
            .filter_map(|d| {
                let desc = d.description.as_deref()?;
                Some(TaskEntry::new(
                    d.date,
                    desc,
                    d.activity_no.as_deref().unwrap_or(ACTIVITY_NA),
                ))
            })
            .collect();
        let mut record = WeekRecord::new(week_ending, tasks, &self.problems, &self.solutions);
        record.set_supervisor_comment(&self.supervisor_comment);
        Some(record)
    }

    /// Re-render this block at its original position on `sheet`. A block without any date
    /// only gets its skeleton back and yields `None`.
    pub fn restore(&self, sheet: &mut Sheet, mode: Mode) -> Result<Option<WeekBlock>, LogbookError> {
        let Some(sunday) = self.sunday() else {
            block::write_skeleton(sheet, self.start_row, mode);
            return Ok(None);
        };

        let mut restored = WeekBlock::open(sheet, self.start_row, sunday, mode);
        for day in &self.days {
            let (description, activity_no) = (day.description.as_deref(), day.activity_no.as_deref());
            match restored.write_day(sheet, day.date, description, activity_no) {
                Ok(()) => {}
                Err(LogbookError::DateOutsideWeek { .. }) => {
                    warn!(
                        "row {}: {} is not in the week ending {sunday}, left as written",
                        day.row, day.date
                    );
                    restored.keep_day(sheet, day.row, day.date, description, activity_no);
                }
                Err(e) => return Err(e),
            }
        }
        if !self.problems.is_empty() || !self.solutions.is_empty() {
            restored.write_notes(sheet, &self.problems, &self.solutions);
        }
        if !self.supervisor_comment.is_empty() {
            restored.write_comment(sheet, &self.supervisor_comment);
        }
        if self.week_ending.is_some() {
            restored.finish(sheet);
        }
        Ok(Some(WeekBlock::resume(self.start_row, sunday, mode, self.state())))
    }
}

/// Every block on the sheet, top to bottom. A block is recognised by the
/// `WEEK ENDING` label directly above a `DAYS` header.
pub fn find_blocks(sheet: &Sheet) -> Vec<ParsedBlock> {
    let max_row = sheet.max_row();
    let mut blocks = Vec::new();
    let mut row = 1;
    while row <= max_row {
        if sheet.text(row, COL_A).map(str::trim) == Some(WEEK_ENDING_LABEL)
            && sheet.text(row + rows::HEADER, COL_A).map(str::trim) == Some("DAYS")
        {
            blocks.push(parse_block(sheet, row));
            row += block::BLOCK_ROWS;
        } else {
            row += 1;
        }
    }
    blocks
}

fn parse_block(sheet: &Sheet, start_row: RowNum) -> ParsedBlock {
    let week_ending = cell_date(sheet, start_row, COL_B);

    let mut days = Vec::new();
    for i in 0..7u32 {
        let row = start_row + rows::FIRST_DAY + i;
        let description = owned_text(sheet, row, COL_C);
        let activity_no = owned_text(sheet, row, COL_D);
        let date = cell_date(sheet, row, COL_B).or_else(|| {
            // Undated rows with content take their date from the block's label.
            if description.is_some() || activity_no.is_some() {
                week_ending.and_then(|we| block::date_for_row(we, i))
            } else {
                None
            }
        });
        if let Some(date) = date {
            days.push(ParsedDay {
                row,
                date,
                description,
                activity_no,
            });
        }
    }

    let notes = start_row + rows::NOTES;
    ParsedBlock {
        start_row,
        week_ending,
        days,
        problems: owned_text(sheet, notes, COL_C).unwrap_or_default(),
        solutions: owned_text(sheet, notes, COL_D).unwrap_or_default(),
        supervisor_comment: owned_text(sheet, start_row + rows::COMMENT, COL_A).unwrap_or_default(),
    }
}

fn owned_text(sheet: &Sheet, row: RowNum, col: u16) -> Option<String> {
    match sheet.value(row, col)? {
        CellValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
        CellValue::Text(_) => None,
        CellValue::Number(n) => Some(n.to_string()),
        CellValue::DateTime(dt) => Some(dt.date().to_string()),
    }
}

fn cell_date(sheet: &Sheet, row: RowNum, col: u16) -> Option<NaiveDate> {
    match sheet.value(row, col)? {
        CellValue::Text(s) => parse_date(s).ok(),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::grid::CellStyle;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn ignores_stray_labels() {
        let mut sheet = Sheet::new("log");
        sheet.put_text(4, COL_A, WEEK_ENDING_LABEL, CellStyle::PLAIN);
        assert!(find_blocks(&sheet).is_empty());
    }

    #[test]
    fn reads_template_block() {
        let mut sheet = Sheet::new("log");
        let mut block = WeekBlock::open(&mut sheet, 1, d("2025-06-08"), Mode::Template);
        block
            .write_day(&mut sheet, d("2025-06-05"), Some("Cable pulling"), None)
            .unwrap();
        block.write_day(&mut sheet, d("2025-06-06"), None, None).unwrap();
        block.finish(&mut sheet);

        let blocks = find_blocks(&sheet);
        assert_eq!(blocks.len(), 1);
        let parsed = &blocks[0];
        assert_eq!(parsed.week_ending, Some(d("2025-06-08")));
        assert_eq!(parsed.days.len(), 2);
        assert_eq!(parsed.state(), BlockState::Open);

        let record = parsed.to_week_record().unwrap();
        assert_eq!(record.tasks.len(), 1);
        assert_eq!(record.tasks[0].activity_no, ACTIVITY_NA);
    }
}

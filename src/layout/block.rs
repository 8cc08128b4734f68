//! The 14-row weekly table.
//!
//! ```text
//! R      WEEK ENDING | <date>
//! R+1    DAYS | DATE | DESCRIPTION OF WORK CARRIED OUT | ACTIVITY NO.
//! R+2..8 MONDAY..SUNDAY, one row per weekday
//! R+9                  | PROBLEMS ENCOUNTERED | SOLUTIONS FOUND
//! R+10                 | <problems>           | <solutions>
//! R+11   INDUSTRIAL SUPERVISOR'S COMMENTS (A:D)
//! R+12   <comment> (A:D)
//! R+13   DESIGNATION (A:B) | SIGNATURE (C:D, image anchored at C)
//! ```
//!
//! Blocks start 16 rows apart. Template mode produces a form for manual entry; final mode
//! carries the resolved week and the supervisor's sign-off.

use super::grid::{CellStyle, ColNum, HAlign, ImageAnchor, RowNum, Sheet, VAlign, COL_A, COL_B, COL_C, COL_D};
use super::signature::Signature;
use crate::dates::format_date;
use crate::error::LogbookError;
use crate::model::{week_contains, week_start, TaskEntry, WeekRecord};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const BLOCK_ROWS: RowNum = 14;
pub const BLOCK_STRIDE: RowNum = 16;
/// A block appended to existing content starts this many rows below its last row.
pub const APPEND_OFFSET: RowNum = 3;

pub const COLUMN_WIDTHS: [(ColNum, f64); 4] = [(COL_A, 18.0), (COL_B, 15.0), (COL_C, 45.0), (COL_D, 20.0)];
pub const SIGNATURE_WIDTH: u32 = 120;
pub const SIGNATURE_HEIGHT: u32 = 35;

pub const DAY_NAMES: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

pub const WEEK_ENDING_LABEL: &str = "WEEK ENDING";
pub const SIGNATURE_PLACEHOLDER: &str = "SIGNATURE";

/// Row offsets inside a block.
pub mod rows {
    use super::RowNum;

    pub const WEEK_ENDING: RowNum = 0;
    pub const HEADER: RowNum = 1;
    pub const FIRST_DAY: RowNum = 2;
    pub const LAST_DAY: RowNum = 8;
    pub const NOTES_HEADER: RowNum = 9;
    pub const NOTES: RowNum = 10;
    pub const COMMENTS_HEADER: RowNum = 11;
    pub const COMMENT: RowNum = 12;
    pub const SIGN_OFF: RowNum = 13;
}

const LABELS: &[(RowNum, ColNum, &str)] = &[
    (rows::WEEK_ENDING, COL_A, WEEK_ENDING_LABEL),
    (rows::HEADER, COL_A, "DAYS"),
    (rows::HEADER, COL_B, "DATE"),
    (rows::HEADER, COL_C, "DESCRIPTION OF WORK CARRIED OUT"),
    (rows::HEADER, COL_D, "ACTIVITY NO."),
    (rows::NOTES_HEADER, COL_C, "PROBLEMS ENCOUNTERED"),
    (rows::NOTES_HEADER, COL_D, "SOLUTIONS FOUND"),
    (rows::COMMENTS_HEADER, COL_A, "INDUSTRIAL SUPERVISOR'S COMMENTS"),
];

const MERGES: &[(RowNum, ColNum, RowNum, ColNum)] = &[
    (rows::COMMENTS_HEADER, COL_A, rows::COMMENTS_HEADER, COL_D),
    (rows::COMMENT, COL_A, rows::COMMENT, COL_D),
    (rows::SIGN_OFF, COL_A, rows::SIGN_OFF, COL_B),
    (rows::SIGN_OFF, COL_C, rows::SIGN_OFF, COL_D),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Incremental form generation, appended to a growing workbook.
    Template,
    /// One-shot rendering of resolved weeks.
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    WeekLabel,
    WeekValue,
    ColumnHeader,
    DayName,
    Date,
    Description,
    Activity,
    NotesHeader,
    NotesText,
    CommentsHeader,
    Comment,
    Designation,
    Signature,
    Blank,
}

fn slot_at(rel_row: RowNum, col: ColNum) -> Slot {
    match (rel_row, col) {
        (rows::WEEK_ENDING, COL_A) => Slot::WeekLabel,
        (rows::WEEK_ENDING, COL_B) => Slot::WeekValue,
        (rows::HEADER, _) => Slot::ColumnHeader,
        (rows::FIRST_DAY..=rows::LAST_DAY, COL_A) => Slot::DayName,
        (rows::FIRST_DAY..=rows::LAST_DAY, COL_B) => Slot::Date,
        (rows::FIRST_DAY..=rows::LAST_DAY, COL_C) => Slot::Description,
        (rows::FIRST_DAY..=rows::LAST_DAY, COL_D) => Slot::Activity,
        (rows::NOTES_HEADER, COL_C | COL_D) => Slot::NotesHeader,
        (rows::NOTES, COL_C | COL_D) => Slot::NotesText,
        (rows::COMMENTS_HEADER, _) => Slot::CommentsHeader,
        (rows::COMMENT, _) => Slot::Comment,
        (rows::SIGN_OFF, COL_A | COL_B) => Slot::Designation,
        (rows::SIGN_OFF, COL_C | COL_D) => Slot::Signature,
        _ => Slot::Blank,
    }
}

const BOLD: CellStyle = CellStyle::PLAIN.bold();
const CENTERED_BOLD: CellStyle = CellStyle::PLAIN
    .bold()
    .align(HAlign::Center, VAlign::Center)
    .wrapped();
const WRAPPED: CellStyle = CellStyle::PLAIN.wrapped();
const TOP_LEFT_WRAPPED: CellStyle = CellStyle::PLAIN.align(HAlign::Left, VAlign::Top).wrapped();

/// Styling and wording that differ between modes.
struct Theme {
    /// Border every cell of the 14x4 grid, blank ones included.
    grid_border: bool,
    week_label: CellStyle,
    week_value: CellStyle,
    day_name: CellStyle,
    date: CellStyle,
    description: CellStyle,
    notes_header: CellStyle,
    comments_header: CellStyle,
    designation_text: &'static str,
    signature_text: Option<&'static str>,
    signature: CellStyle,
    sign_off_height: Option<f64>,
}

const TEMPLATE: Theme = Theme {
    grid_border: true,
    week_label: BOLD,
    week_value: BOLD.align(HAlign::Left, VAlign::Center),
    day_name: CellStyle::PLAIN.align(HAlign::Left, VAlign::Center),
    date: CellStyle::PLAIN.align(HAlign::Center, VAlign::Center),
    description: CellStyle::PLAIN.align(HAlign::Left, VAlign::Center).wrapped(),
    notes_header: CENTERED_BOLD,
    comments_header: CENTERED_BOLD,
    designation_text: "DESIGNATION",
    signature_text: None,
    signature: CellStyle::PLAIN,
    sign_off_height: None,
};

const FINAL: Theme = Theme {
    grid_border: false,
    week_label: BOLD,
    week_value: BOLD,
    day_name: CellStyle::PLAIN.bordered(),
    date: CellStyle::PLAIN.bordered(),
    description: WRAPPED.bordered(),
    notes_header: BOLD.bordered(),
    comments_header: BOLD.bordered(),
    designation_text: "DESIGNATION\nIndustrial Supervisor",
    signature_text: Some(SIGNATURE_PLACEHOLDER),
    signature: CENTERED_BOLD.bordered(),
    sign_off_height: Some(40.0),
};

impl Theme {
    fn for_mode(mode: Mode) -> &'static Theme {
        match mode {
            Mode::Template => &TEMPLATE,
            Mode::Final => &FINAL,
        }
    }

    fn style(&self, slot: Slot) -> CellStyle {
        let style = match slot {
            Slot::WeekLabel => self.week_label,
            Slot::WeekValue => self.week_value,
            Slot::ColumnHeader => CENTERED_BOLD.bordered(),
            Slot::DayName => self.day_name,
            Slot::Date => self.date,
            Slot::Description => self.description,
            Slot::Activity => TOP_LEFT_WRAPPED.bordered(),
            Slot::NotesHeader => self.notes_header,
            Slot::NotesText => WRAPPED.bordered(),
            Slot::CommentsHeader => self.comments_header,
            Slot::Comment => WRAPPED.bordered(),
            Slot::Designation => CENTERED_BOLD.bordered(),
            Slot::Signature => self.signature,
            Slot::Blank => CellStyle::PLAIN,
        };
        if self.grid_border {
            style.bordered()
        } else {
            style
        }
    }
}

/// Apply the fixed column widths of the log sheet.
pub fn set_column_widths(sheet: &mut Sheet) {
    for (col, width) in COLUMN_WIDTHS {
        sheet.set_col_width(col, width);
    }
}

/// Write the static part of a block: labels, day names, merges, borders.
/// Existing values in data cells are kept, so this also restyles a re-opened block.
pub fn write_skeleton(sheet: &mut Sheet, start_row: RowNum, mode: Mode) {
    let theme = Theme::for_mode(mode);

    for rel in 0..BLOCK_ROWS {
        for col in COL_A..=COL_D {
            let slot = slot_at(rel, col);
            if slot == Slot::Blank && !theme.grid_border {
                continue;
            }
            sheet.set_style(start_row + rel, col, theme.style(slot));
        }
    }

    for &(rel, col, text) in LABELS {
        sheet.put_text(start_row + rel, col, text, theme.style(slot_at(rel, col)));
    }
    for (i, day) in DAY_NAMES.iter().enumerate() {
        let rel = rows::FIRST_DAY + i as RowNum;
        sheet.put_text(start_row + rel, COL_A, *day, theme.style(Slot::DayName));
    }

    for &(r0, c0, r1, c1) in MERGES {
        sheet.merge(start_row + r0, c0, start_row + r1, c1);
    }

    let sign_off = start_row + rows::SIGN_OFF;
    sheet.put_text(sign_off, COL_A, theme.designation_text, theme.style(Slot::Designation));
    if let Some(text) = theme.signature_text {
        sheet.put_text(sign_off, COL_C, text, theme.style(Slot::Signature));
    }
    if let Some(height) = theme.sign_off_height {
        sheet.set_row_height(sign_off, height);
    }
}

/// One week's table on a sheet.
///
/// A block is `Open` from the moment its skeleton is written until its Sunday row is
/// filled (template mode) or it is finished (final mode). The week-ending value is stamped
/// by [`WeekBlock::finish`], never by opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekBlock {
    start_row: RowNum,
    week_ending: NaiveDate,
    mode: Mode,
    state: BlockState,
}

impl WeekBlock {
    /// Write a fresh skeleton at `start_row`.
    pub fn open(sheet: &mut Sheet, start_row: RowNum, week_ending: NaiveDate, mode: Mode) -> Self {
        write_skeleton(sheet, start_row, mode);
        Self {
            start_row,
            week_ending,
            mode,
            state: BlockState::Open,
        }
    }

    /// Pick up a block already present on the sheet.
    pub fn resume(start_row: RowNum, week_ending: NaiveDate, mode: Mode, state: BlockState) -> Self {
        Self {
            start_row,
            week_ending,
            mode,
            state,
        }
    }

    pub fn start_row(&self) -> RowNum {
        self.start_row
    }

    pub fn end_row(&self) -> RowNum {
        self.start_row + BLOCK_ROWS - 1
    }

    pub fn week_ending(&self) -> NaiveDate {
        self.week_ending
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn day_row(&self, date: NaiveDate) -> Result<RowNum, LogbookError> {
        if !week_contains(self.week_ending, date) {
            return Err(LogbookError::DateOutsideWeek {
                date,
                week_ending: self.week_ending,
            });
        }
        let offset = date.weekday().num_days_from_monday();
        Ok(self.start_row + rows::FIRST_DAY + offset)
    }

    /// Fill one weekday row. The date is always written; description and activity only
    /// when given.
    pub fn write_day(
        &mut self,
        sheet: &mut Sheet,
        date: NaiveDate,
        description: Option<&str>,
        activity_no: Option<&str>,
    ) -> Result<(), LogbookError> {
        if self.state == BlockState::Closed {
            return Err(LogbookError::BlockClosed {
                week_ending: self.week_ending,
            });
        }
        let row = self.day_row(date)?;
        self.put_day(sheet, row, date, description, activity_no);
        Ok(())
    }

    /// Put a weekday row back as it was found, even when its date belongs to another week.
    pub fn keep_day(
        &self,
        sheet: &mut Sheet,
        row: RowNum,
        date: NaiveDate,
        description: Option<&str>,
        activity_no: Option<&str>,
    ) {
        self.put_day(sheet, row, date, description, activity_no);
    }

    fn put_day(
        &self,
        sheet: &mut Sheet,
        row: RowNum,
        date: NaiveDate,
        description: Option<&str>,
        activity_no: Option<&str>,
    ) {
        let theme = Theme::for_mode(self.mode);
        sheet.put_text(row, COL_B, format_date(date), theme.style(Slot::Date));
        if let Some(desc) = description {
            sheet.put_text(row, COL_C, desc, theme.style(Slot::Description));
        }
        if let Some(activity) = activity_no {
            sheet.put_text(row, COL_D, activity, theme.style(Slot::Activity));
        }
    }

    pub fn write_task(&mut self, sheet: &mut Sheet, task: &TaskEntry) -> Result<(), LogbookError> {
        self.write_day(
            sheet,
            task.date,
            Some(&task.description),
            Some(&task.activity_no),
        )
    }

    pub fn write_notes(&self, sheet: &mut Sheet, problems: &str, solutions: &str) {
        let theme = Theme::for_mode(self.mode);
        let row = self.start_row + rows::NOTES;
        sheet.put_text(row, COL_C, problems, theme.style(Slot::NotesText));
        sheet.put_text(row, COL_D, solutions, theme.style(Slot::NotesText));
    }

    pub fn write_comment(&self, sheet: &mut Sheet, comment: &str) {
        let theme = Theme::for_mode(self.mode);
        sheet.put_text(
            self.start_row + rows::COMMENT,
            COL_A,
            comment,
            theme.style(Slot::Comment),
        );
    }

    /// Anchor the signature image in the SIGNATURE cell and drop the placeholder text.
    pub fn sign(&self, sheet: &mut Sheet, signature: &Signature) {
        let row = self.start_row + rows::SIGN_OFF;
        sheet.add_image(ImageAnchor {
            row,
            col: COL_C,
            width: SIGNATURE_WIDTH,
            height: SIGNATURE_HEIGHT,
            bytes: signature.bytes(),
        });
        sheet.clear_value(row, COL_C);
    }

    /// Stamp the week-ending value. In template mode the block only closes once its Sunday
    /// row carries a date; a range that stops mid-week leaves it open for a later run.
    pub fn finish(&mut self, sheet: &mut Sheet) -> BlockState {
        let theme = Theme::for_mode(self.mode);
        sheet.put_text(
            self.start_row + rows::WEEK_ENDING,
            COL_B,
            format_date(self.week_ending),
            theme.style(Slot::WeekValue),
        );

        self.state = match self.mode {
            Mode::Final => BlockState::Closed,
            Mode::Template => {
                let sunday = self.start_row + rows::LAST_DAY;
                if sheet.text(sunday, COL_B).is_some() {
                    BlockState::Closed
                } else {
                    BlockState::Open
                }
            }
        };
        self.state
    }
}

/// Write a fully resolved week as a final-mode block at `start_row`.
pub fn write_record(
    sheet: &mut Sheet,
    start_row: RowNum,
    record: &WeekRecord,
    signature: Option<&Signature>,
) -> Result<WeekBlock, LogbookError> {
    let mut block = WeekBlock::open(sheet, start_row, record.week_ending, Mode::Final);
    for task in &record.tasks {
        block.write_task(sheet, task)?;
    }
    block.write_notes(sheet, &record.problems, &record.solutions);
    block.write_comment(sheet, &record.supervisor_comment);
    if let Some(sig) = signature {
        block.sign(sheet, sig);
    }
    block.finish(sheet);
    Ok(block)
}

/// Date shown on weekday row `index` (0 = Monday) of the week ending `week_ending`.
pub fn date_for_row(week_ending: NaiveDate, index: u32) -> Option<NaiveDate> {
    (index < 7).then(|| week_start(week_ending) + chrono::Days::new(u64::from(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn skeleton_is_fourteen_rows() {
        let mut sheet = Sheet::new("log");
        write_skeleton(&mut sheet, 17, Mode::Template);
        assert_eq!(sheet.text(17, COL_A), Some(WEEK_ENDING_LABEL));
        assert_eq!(sheet.text(19, COL_A), Some("MONDAY"));
        assert_eq!(sheet.text(25, COL_A), Some("SUNDAY"));
        assert_eq!(sheet.max_row(), 17 + BLOCK_ROWS - 1);
        assert_eq!(sheet.merges().len(), MERGES.len());
        // week ending value is not part of the skeleton
        assert_eq!(sheet.text(17, COL_B), None);
    }

    #[test]
    fn template_borders_whole_grid() {
        let mut sheet = Sheet::new("log");
        write_skeleton(&mut sheet, 1, Mode::Template);
        for row in 1..=BLOCK_ROWS {
            for col in COL_A..=COL_D {
                assert!(sheet.cell(row, col).unwrap().style.border, "row {row} col {col}");
            }
        }
    }

    #[test]
    fn write_day_rejects_foreign_dates_and_closed_blocks() {
        let mut sheet = Sheet::new("log");
        let mut block = WeekBlock::open(&mut sheet, 1, d("2025-06-08"), Mode::Template);
        assert!(matches!(
            block.write_day(&mut sheet, d("2025-06-09"), None, None),
            Err(LogbookError::DateOutsideWeek { .. })
        ));

        block.write_day(&mut sheet, d("2025-06-08"), Some("wrap up"), None).unwrap();
        assert_eq!(block.finish(&mut sheet), BlockState::Closed);
        assert!(matches!(
            block.write_day(&mut sheet, d("2025-06-07"), None, None),
            Err(LogbookError::BlockClosed { .. })
        ));
    }

    #[test]
    fn partial_week_stays_open() {
        let mut sheet = Sheet::new("log");
        let mut block = WeekBlock::open(&mut sheet, 1, d("2025-06-08"), Mode::Template);
        block.write_day(&mut sheet, d("2025-06-04"), None, None).unwrap();
        assert_eq!(block.finish(&mut sheet), BlockState::Open);
        assert_eq!(sheet.text(1, COL_B), Some("2025-06-08"));
        assert_eq!(sheet.text(6, COL_B), Some("2025-06-04"));
    }

    #[test]
    fn date_for_row_walks_from_monday() {
        assert_eq!(date_for_row(d("2025-06-08"), 0), Some(d("2025-06-02")));
        assert_eq!(date_for_row(d("2025-06-08"), 6), Some(d("2025-06-08")));
        assert_eq!(date_for_row(d("2025-06-08"), 7), None);
    }
}

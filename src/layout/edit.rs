//! In-place editing of a workbook on disk.
//!
//! Only the rows handed to [`EditableWorkbook::patch_rows`] change. Other sheets and the
//! rest of the edited sheet keep their styles, merges, formulas and images.

use super::grid::{Cell, CellStyle, CellValue, ColNum, HAlign, RowNum, Sheet, VAlign, COL_A, COL_D};
use crate::dates::format_date;
use anyhow::{anyhow, Context, Result};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::debug;
use umya_spreadsheet::{Border, HorizontalAlignmentValues, Spreadsheet, Style, VerticalAlignmentValues, Worksheet};

pub struct EditableWorkbook {
    book: Spreadsheet,
}

impl EditableWorkbook {
    /// A workbook with no sheets yet.
    pub fn new() -> Self {
        Self {
            book: umya_spreadsheet::new_file_empty_worksheet(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .with_context(|| format!("opening workbook for editing: {}", path.display()))?;
        Ok(Self { book })
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.book.get_sheet_by_name(name).is_some()
    }

    /// Copy columns A..D of `rows` from `sheet` onto the sheet of the same name, which is
    /// appended with the grid's column widths when the workbook lacks it. Cells absent from
    /// the grid are left alone. With `merges`, the grid's merges inside `rows` are added too.
    pub fn patch_rows(&mut self, sheet: &Sheet, rows: RangeInclusive<RowNum>, merges: bool) -> Result<()> {
        let ws = self.sheet_or_create(sheet)?;

        for row in rows.clone() {
            for col in COL_A..=COL_D {
                if let Some(cell) = sheet.cell(row, col) {
                    patch_cell(ws, row, col, cell);
                }
            }
        }

        if merges {
            for m in sheet
                .merges()
                .iter()
                .filter(|m| rows.contains(&m.first_row) && rows.contains(&m.last_row))
            {
                ws.add_merge_cells(format!(
                    "{}:{}",
                    cell_ref(m.first_row, m.first_col),
                    cell_ref(m.last_row, m.last_col)
                ));
            }
        }
        debug!("patched rows {}..={} of {:?}", rows.start(), rows.end(), sheet.name);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, path)
            .with_context(|| format!("writing workbook: {}", path.display()))
    }

    fn sheet_or_create(&mut self, sheet: &Sheet) -> Result<&mut Worksheet> {
        if !self.has_sheet(&sheet.name) {
            let ws = self.book.new_sheet(sheet.name.as_str()).map_err(|e| anyhow!("adding sheet {:?}: {e}", sheet.name))?;
            for (col, width) in sheet.col_widths() {
                ws.get_column_dimension_mut(&col_letter(col)).set_width(width);
            }
            debug!("added sheet {:?}", sheet.name);
        }
        self.book
            .get_sheet_by_name_mut(&sheet.name)
            .ok_or_else(|| anyhow!("sheet {:?} vanished while editing", sheet.name))
    }
}

impl Default for EditableWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

fn patch_cell(ws: &mut Worksheet, row: RowNum, col: ColNum, cell: &Cell) {
    let target = ws.get_cell_mut(cell_ref(row, col).as_str());
    match &cell.value {
        Some(CellValue::Text(s)) => {
            target.set_value_string(s.as_str());
        }
        Some(CellValue::Number(n)) => {
            target.set_value_number(*n);
        }
        Some(CellValue::DateTime(dt)) => {
            target.set_value_string(format_date(dt.date()));
        }
        None => {}
    }
    apply_style(target.get_style_mut(), &cell.style);
}

fn apply_style(style: &mut Style, cs: &CellStyle) {
    if cs.bold {
        style.get_font_mut().set_bold(true);
    }

    let align = style.get_alignment_mut();
    match cs.h_align {
        HAlign::General => {}
        HAlign::Left => {
            align.set_horizontal(HorizontalAlignmentValues::Left);
        }
        HAlign::Center => {
            align.set_horizontal(HorizontalAlignmentValues::Center);
        }
    }
    match cs.v_align {
        VAlign::Bottom => {}
        VAlign::Center => {
            align.set_vertical(VerticalAlignmentValues::Center);
        }
        VAlign::Top => {
            align.set_vertical(VerticalAlignmentValues::Top);
        }
    }
    if cs.wrap {
        align.set_wrap_text(true);
    }

    if cs.border {
        let borders = style.get_borders_mut();
        borders.get_left_mut().set_border_style(Border::BORDER_THIN);
        borders.get_right_mut().set_border_style(Border::BORDER_THIN);
        borders.get_top_mut().set_border_style(Border::BORDER_THIN);
        borders.get_bottom_mut().set_border_style(Border::BORDER_THIN);
    }
}

/// Only the log columns A..D are ever addressed.
fn col_letter(col: ColNum) -> String {
    char::from(b'A' + col as u8).to_string()
}

fn cell_ref(row: RowNum, col: ColNum) -> String {
    format!("{}{row}", col_letter(col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_refs_are_a1_style() {
        assert_eq!(cell_ref(1, COL_A), "A1");
        assert_eq!(cell_ref(30, COL_D), "D30");
    }
}

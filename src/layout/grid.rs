use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Rows are 1-based like the document; columns are 0-based (`A` = 0).
pub type RowNum = u32;
pub type ColNum = u16;

pub const COL_A: ColNum = 0;
pub const COL_B: ColNum = 1;
pub const COL_C: ColNum = 2;
pub const COL_D: ColNum = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    #[default]
    General,
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    #[default]
    Bottom,
    Center,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    pub bold: bool,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub wrap: bool,
    pub border: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle {
        bold: false,
        h_align: HAlign::General,
        v_align: VAlign::Bottom,
        wrap: false,
        border: false,
    };

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn align(mut self, h: HAlign, v: VAlign) -> Self {
        self.h_align = h;
        self.v_align = v;
        self
    }

    pub const fn wrapped(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub const fn bordered(mut self) -> Self {
        self.border = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: Option<CellValue>,
    pub style: CellStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub first_row: RowNum,
    pub first_col: ColNum,
    pub last_row: RowNum,
    pub last_col: ColNum,
}

impl Merge {
    pub fn contains(&self, row: RowNum, col: ColNum) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn is_anchor(&self, row: RowNum, col: ColNum) -> bool {
        self.first_row == row && self.first_col == col
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnchor {
    pub row: RowNum,
    pub col: ColNum,
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(RowNum, ColNum), Cell>,
    merges: Vec<Merge>,
    images: Vec<ImageAnchor>,
    row_heights: BTreeMap<RowNum, f64>,
    col_widths: BTreeMap<ColNum, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn put_text(&mut self, row: RowNum, col: ColNum, text: impl Into<String>, style: CellStyle) {
        self.put(row, col, CellValue::Text(text.into()), style);
    }

    pub fn put(&mut self, row: RowNum, col: ColNum, value: CellValue, style: CellStyle) {
        self.cells.insert(
            (row, col),
            Cell {
                value: Some(value),
                style,
            },
        );
    }

    /// Restyle a cell without touching its value.
    pub fn set_style(&mut self, row: RowNum, col: ColNum, style: CellStyle) {
        self.cells.entry((row, col)).or_default().style = style;
    }

    pub fn clear_value(&mut self, row: RowNum, col: ColNum) {
        if let Some(cell) = self.cells.get_mut(&(row, col)) {
            cell.value = None;
        }
    }

    pub fn cell(&self, row: RowNum, col: ColNum) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: RowNum, col: ColNum) -> Option<&CellValue> {
        self.cell(row, col).and_then(|c| c.value.as_ref())
    }

    /// Text content, `None` for missing, blank or non-text cells.
    pub fn text(&self, row: RowNum, col: ColNum) -> Option<&str> {
        self.value(row, col)
            .and_then(CellValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn cells(&self) -> impl Iterator<Item = ((RowNum, ColNum), &Cell)> {
        self.cells.iter().map(|(k, v)| (*k, v))
    }

    pub fn merge(&mut self, first_row: RowNum, first_col: ColNum, last_row: RowNum, last_col: ColNum) {
        let m = Merge {
            first_row,
            first_col,
            last_row,
            last_col,
        };
        if !self.merges.contains(&m) {
            self.merges.push(m);
        }
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn merge_at(&self, row: RowNum, col: ColNum) -> Option<&Merge> {
        self.merges.iter().find(|m| m.contains(row, col))
    }

    pub fn add_image(&mut self, anchor: ImageAnchor) {
        self.images.retain(|i| !(i.row == anchor.row && i.col == anchor.col));
        self.images.push(anchor);
    }

    pub fn images(&self) -> &[ImageAnchor] {
        &self.images
    }

    pub fn image_at(&self, row: RowNum, col: ColNum) -> Option<&ImageAnchor> {
        self.images.iter().find(|i| i.row == row && i.col == col)
    }

    pub fn set_row_height(&mut self, row: RowNum, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn row_heights(&self) -> impl Iterator<Item = (RowNum, f64)> + '_ {
        self.row_heights.iter().map(|(r, h)| (*r, *h))
    }

    pub fn set_col_width(&mut self, col: ColNum, width: f64) {
        self.col_widths.insert(col, width);
    }

    pub fn col_width(&self, col: ColNum) -> Option<f64> {
        self.col_widths.get(&col).copied()
    }

    pub fn col_widths(&self) -> impl Iterator<Item = (ColNum, f64)> + '_ {
        self.col_widths.iter().map(|(c, w)| (*c, *w))
    }

    /// Last row holding a value, 0 for an empty sheet.
    pub fn max_row(&self) -> RowNum {
        self.cells
            .iter()
            .filter(|(_, c)| c.value.is_some())
            .map(|((r, _), _)| *r)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.max_row() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.retain(|s| s.name != sheet.name);
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_row_ignores_style_only_cells() {
        let mut sheet = Sheet::new("s");
        sheet.put_text(3, COL_A, "x", CellStyle::PLAIN);
        sheet.set_style(9, COL_D, CellStyle::PLAIN.bordered());
        assert_eq!(sheet.max_row(), 3);
    }

    #[test]
    fn set_style_keeps_value() {
        let mut sheet = Sheet::new("s");
        sheet.put_text(1, COL_B, "2025-06-08", CellStyle::PLAIN);
        sheet.set_style(1, COL_B, CellStyle::PLAIN.bold());
        assert_eq!(sheet.text(1, COL_B), Some("2025-06-08"));
        assert!(sheet.cell(1, COL_B).unwrap().style.bold);
    }
}

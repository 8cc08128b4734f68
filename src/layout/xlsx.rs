use super::grid::{Cell, CellStyle, CellValue, HAlign, Sheet, VAlign, Workbook};
use anyhow::{Context, Result};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Worksheet};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd";

pub fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut out = rust_xlsxwriter::Workbook::new();
    for sheet in workbook.sheets() {
        let ws = out.add_worksheet();
        write_sheet(ws, sheet).with_context(|| format!("writing sheet {:?}", sheet.name))?;
    }
    let bytes = out.save_to_buffer().with_context(|| "serializing workbook")?;
    debug!("workbook serialized ({} bytes)", bytes.len());
    Ok(bytes)
}

pub fn save(workbook: &Workbook, path: &Path) -> Result<()> {
    let bytes = to_bytes(workbook)?;
    std::fs::write(path, bytes).with_context(|| format!("writing workbook: {}", path.display()))
}

pub fn load(path: &Path) -> Result<Workbook> {
    let bytes = std::fs::read(path).with_context(|| format!("reading workbook: {}", path.display()))?;
    load_bytes(&bytes).with_context(|| format!("opening workbook: {}", path.display()))
}

/// Values only: styles, merges and images are not read back.
pub fn load_bytes(bytes: &[u8]) -> Result<Workbook> {
    let mut xlsx: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).with_context(|| "not a readable .xlsx workbook")?;

    let mut workbook = Workbook::new();
    for name in xlsx.sheet_names() {
        let range = match xlsx.worksheet_range(&name) {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping sheet {name:?}: {e}");
                continue;
            }
        };

        let mut sheet = Sheet::new(&name);
        if let Some((row0, col0)) = range.start() {
            for (r, c, data) in range.used_cells() {
                let Some(value) = cell_value(data) else {
                    continue;
                };
                let row = row0 + r as u32 + 1;
                let col = (col0 + c as u32) as u16;
                sheet.put(row, col, value, CellStyle::PLAIN);
            }
        }
        workbook.push(sheet);
    }
    Ok(workbook)
}

fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::DateTime(dt) => dt.as_datetime().map(CellValue::DateTime),
        Data::DateTimeIso(s) => Some(parse_iso(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime)),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    ws.set_name(&sheet.name)?;

    for (col, width) in sheet.col_widths() {
        ws.set_column_width(col, width)?;
    }
    for (row, height) in sheet.row_heights() {
        ws.set_row_height(row.saturating_sub(1), height)?;
    }

    for m in sheet.merges() {
        let anchor = sheet.cell(m.first_row, m.first_col).cloned().unwrap_or_default();
        let text = match &anchor.value {
            Some(CellValue::Text(s)) => s.clone(),
            Some(CellValue::Number(n)) => n.to_string(),
            Some(CellValue::DateTime(dt)) => dt.date().to_string(),
            None => String::new(),
        };
        ws.merge_range(
            m.first_row.saturating_sub(1),
            m.first_col,
            m.last_row.saturating_sub(1),
            m.last_col,
            &text,
            &format_for(&anchor.style),
        )?;
    }

    for ((row, col), cell) in sheet.cells() {
        if sheet.merge_at(row, col).is_some() {
            continue;
        }
        write_cell(ws, row.saturating_sub(1), col, cell)?;
    }

    for img in sheet.images() {
        let image = match Image::new_from_buffer(&img.bytes) {
            Ok(image) => image.set_scale_to_size(img.width, img.height, false),
            Err(e) => {
                warn!("dropping image at row {} col {}: {e}", img.row, img.col);
                continue;
            }
        };
        ws.insert_image(img.row.saturating_sub(1), img.col, &image)?;
    }

    Ok(())
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    let format = format_for(&cell.style);
    match &cell.value {
        Some(CellValue::Text(s)) => {
            ws.write_string_with_format(row, col, s.as_str(), &format)?;
        }
        Some(CellValue::Number(n)) => {
            ws.write_number_with_format(row, col, *n, &format)?;
        }
        Some(CellValue::DateTime(dt)) => {
            let format = format.set_num_format(DATE_NUM_FORMAT);
            ws.write_datetime_with_format(row, col, dt, &format)?;
        }
        None if !cell.style.is_plain() => {
            ws.write_blank(row, col, &format)?;
        }
        None => {}
    }
    Ok(())
}

fn format_for(style: &CellStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    match style.h_align {
        HAlign::General => {}
        HAlign::Left => format = format.set_align(FormatAlign::Left),
        HAlign::Center => format = format.set_align(FormatAlign::Center),
    }
    match style.v_align {
        VAlign::Bottom => {}
        VAlign::Center => format = format.set_align(FormatAlign::VerticalCenter),
        VAlign::Top => format = format.set_align(FormatAlign::Top),
    }
    if style.wrap {
        format = format.set_text_wrap();
    }
    if style.border {
        format = format.set_border(FormatBorder::Thin);
    }
    format
}

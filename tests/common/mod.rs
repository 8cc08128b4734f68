#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use logbook::layout::grid::{CellStyle, CellValue, Sheet, COL_A, COL_B, COL_C};
use logbook::layout::{self, Workbook};
use logbook::llm::{Completion, GenerateRequest, GenerateResponse, LlmDiag};
use std::cell::RefCell;

/// 1x1 transparent PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Which prompt a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ask {
    Activity,
    Summary,
    Comment,
}

pub fn ask_of(req: &GenerateRequest) -> Ask {
    if req.format.as_deref() == Some("json") {
        Ask::Summary
    } else if req.prompt.contains("activity numbers") {
        Ask::Activity
    } else {
        Ask::Comment
    }
}

/// In-process completion service answering from a closure and recording every request.
pub struct Scripted<F: Fn(Ask, &GenerateRequest) -> Result<String>> {
    reply: F,
    pub calls: RefCell<Vec<Ask>>,
}

impl<F: Fn(Ask, &GenerateRequest) -> Result<String>> Scripted<F> {
    pub fn new(reply: F) -> Self {
        Self {
            reply,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn count(&self, ask: Ask) -> usize {
        self.calls.borrow().iter().filter(|a| **a == ask).count()
    }
}

impl<F: Fn(Ask, &GenerateRequest) -> Result<String>> Completion for Scripted<F> {
    fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse> {
        let ask = ask_of(req);
        self.calls.borrow_mut().push(ask);
        let response = (self.reply)(ask, req)?;
        Ok(GenerateResponse { response })
    }

    fn doctor(&self) -> Result<LlmDiag> {
        Ok(LlmDiag {
            host: "stub".into(),
            model: "stub".into(),
            reachable: true,
            model_available: true,
            models: vec!["stub".into()],
            error: None,
        })
    }
}

/// A service that answers every prompt well.
pub fn healthy() -> Scripted<impl Fn(Ask, &GenerateRequest) -> Result<String>> {
    Scripted::new(|ask, _req: &GenerateRequest| {
        Ok(match ask {
            Ask::Activity => "1.1, 2.1".to_string(),
            Ask::Summary => {
                r#"{"problems_encountered": "Parts arrived late.", "solutions_found": "Reordered from a local supplier."}"#
                    .to_string()
            }
            Ask::Comment => "Steady work, well documented.".to_string(),
        })
    })
}

/// A service that is down.
pub fn offline() -> Scripted<impl Fn(Ask, &GenerateRequest) -> Result<String>> {
    Scripted::new(|_ask, _req: &GenerateRequest| Err(anyhow!("connection refused")))
}

pub const ACTIVITIES: &[(&str, &str)] = &[
    ("1", "General"),
    ("1.1", "Safety induction"),
    ("1.2", "Site survey"),
    ("2.1", "Cable termination"),
    ("2.2", "Insulation testing"),
];

/// An upload workbook: a task sheet (dates as text) and an activity sheet.
pub fn upload_workbook(tasks: &[(&str, &str)], activities: &[(&str, &str)]) -> Workbook {
    let mut task_sheet = Sheet::new("task_sheet");
    task_sheet.put_text(1, COL_A, "Date", CellStyle::PLAIN);
    task_sheet.put_text(1, COL_B, "Task", CellStyle::PLAIN);
    for (i, (date, desc)) in tasks.iter().enumerate() {
        let row = i as u32 + 2;
        task_sheet.put_text(row, COL_A, *date, CellStyle::PLAIN);
        task_sheet.put_text(row, COL_B, *desc, CellStyle::PLAIN);
    }

    let mut activity_sheet = Sheet::new("activity_nums");
    for (i, (code, desc)) in activities.iter().enumerate() {
        let row = i as u32 + 1;
        activity_sheet.put_text(row, COL_A, (i + 1).to_string(), CellStyle::PLAIN);
        activity_sheet.put_text(row, COL_B, *code, CellStyle::PLAIN);
        activity_sheet.put_text(row, COL_C, *desc, CellStyle::PLAIN);
    }

    let mut workbook = Workbook::new();
    workbook.push(task_sheet);
    workbook.push(activity_sheet);
    workbook
}

pub fn upload_bytes(tasks: &[(&str, &str)], activities: &[(&str, &str)]) -> Vec<u8> {
    layout::to_bytes(&upload_workbook(tasks, activities)).unwrap()
}

/// Put a real date cell in column A of the task sheet.
pub fn put_date_cell(sheet: &mut Sheet, row: u32, date: NaiveDate) {
    sheet.put(
        row,
        COL_A,
        CellValue::DateTime(date.and_hms_opt(0, 0, 0).unwrap()),
        CellStyle::PLAIN,
    );
}

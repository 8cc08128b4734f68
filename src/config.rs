use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: Llm,
    #[serde(default)]
    pub sheets: Sheets,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub tasks: Tasks,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

/// Text-completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Llm {
    pub enabled: bool,
    pub host: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub min_activity_codes: usize,
    pub max_activity_codes: usize,
}
impl Default for Llm {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "http://localhost:11434".into(),
            model: "gemma3:4b".into(),
            timeout_seconds: 300,
            min_activity_codes: 2,
            max_activity_codes: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Sheets {
    pub task_sheet: String,
    pub activity_sheet: String,
    pub template_sheet: String,
    pub final_sheet: String,
}
impl Default for Sheets {
    fn default() -> Self {
        Self {
            task_sheet: "task_sheet".into(),
            activity_sheet: "activity_nums".into(),
            template_sheet: "log2".into(),
            final_sheet: "log".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub store_path: String,
    pub out_dir: String,
    pub template_workbook: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            store_path: "logbook-store.json".into(),
            out_dir: "out".into(),
            template_workbook: "my_record_book.xlsx".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tasks {
    pub normalize_unicode: bool,
    pub collapse_whitespace: bool,
}
impl Default for Tasks {
    fn default() -> Self {
        Self {
            normalize_unicode: true,
            collapse_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    /// `{id}` is replaced with the report id.
    pub preview_filename: String,
    pub final_filename: String,
    pub print_summary: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            preview_filename: "log_book_preview_{id}.xlsx".into(),
            final_filename: "log_book_final.xlsx".into(),
            print_summary: true,
        }
    }
}

impl Output {
    pub fn preview_filename_for(&self, report_id: u64) -> String {
        self.preview_filename.replace("{id}", &report_id.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

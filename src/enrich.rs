use crate::config::Llm;
use crate::llm::{Completion, GenerateRequest};
use crate::model::ACTIVITY_NA;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

pub const SUMMARY_FALLBACK_PROBLEMS: &str = "Error generating summary.";
pub const SUMMARY_FALLBACK_SOLUTIONS: &str = "Please check LLM connection.";
pub const SUMMARY_MISSING_FIELD: &str = "Could not generate summary.";
pub const EMPTY_WEEK_PROBLEMS: &str = "No specific problems noted.";
pub const EMPTY_WEEK_SOLUTIONS: &str = "Solutions were implemented as part of the tasks.";
pub const COMMENT_FALLBACK: &str = "Good progress this week.";
pub const COMMENT_NO_TASKS: &str = "No tasks recorded for this week.";

static CODE_EDGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\s"'`\[\(\{]+|[\s"'`\]\)\}\.,;:]+$"#).expect("static code pattern")
});

/// Valid activities, each entry `"<code> <description>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCatalog {
    entries: Vec<String>,
}

impl ActivityCatalog {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, code: &str, description: &str) {
        self.entries.push(format!("{} {}", code.trim(), description.trim()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn codes(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.split_whitespace().next())
            .map(trim_code)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub problems: String,
    pub solutions: String,
}

impl WeeklySummary {
    pub fn fallback() -> Self {
        Self {
            problems: SUMMARY_FALLBACK_PROBLEMS.into(),
            solutions: SUMMARY_FALLBACK_SOLUTIONS.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryJson {
    problems_encountered: Option<serde_json::Value>,
    solutions_found: Option<serde_json::Value>,
}

/// Resolves activity numbers, weekly summaries and supervisor comments through the
/// completion service. No method here returns an error: failures become fallbacks.
pub struct Enricher<C: Completion> {
    client: C,
    model: String,
    min_codes: usize,
    max_codes: usize,
}

impl<C: Completion> Enricher<C> {
    pub fn new(cfg: &Llm, client: C) -> Self {
        let max_codes = cfg.max_activity_codes.max(1);
        Self {
            client,
            model: cfg.model.clone(),
            min_codes: cfg.min_activity_codes.clamp(1, max_codes),
            max_codes,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn activity_no(&self, description: &str, catalog: &ActivityCatalog) -> String {
        if catalog.is_empty() {
            return ACTIVITY_NA.to_string();
        }
        info!("requesting activity numbers (task len={})", description.len());
        match self.complete(GenerateRequest::text(
            &self.model,
            activity_prompt(description, catalog, self.min_codes, self.max_codes),
        )) {
            Ok(raw) => {
                debug!("activity response: {}", truncate(&raw, 80));
                clean_activity_codes(&raw, catalog, self.min_codes, self.max_codes)
            }
            Err(err) => {
                warn!("activity lookup failed, using {ACTIVITY_NA}: {err:#}");
                ACTIVITY_NA.to_string()
            }
        }
    }

    pub fn weekly_summary(&self, tasks_summary: &str) -> WeeklySummary {
        if tasks_summary.trim().is_empty() {
            return WeeklySummary {
                problems: EMPTY_WEEK_PROBLEMS.into(),
                solutions: EMPTY_WEEK_SOLUTIONS.into(),
            };
        }
        info!("generating weekly summary ({} chars)", tasks_summary.len());
        let parsed = self
            .complete(GenerateRequest::json(&self.model, summary_prompt(tasks_summary)))
            .and_then(|raw| parse_summary(&raw));
        match parsed {
            Ok(summary) => summary,
            Err(err) => {
                warn!("weekly summary failed, using fallback: {err:#}");
                WeeklySummary::fallback()
            }
        }
    }

    pub fn supervisor_comment(&self, tasks_summary: &str) -> String {
        if tasks_summary.trim().is_empty() {
            return COMMENT_NO_TASKS.to_string();
        }
        info!("generating supervisor comment ({} chars)", tasks_summary.len());
        match self.complete(GenerateRequest::text(&self.model, comment_prompt(tasks_summary))) {
            Ok(comment) if !comment.is_empty() => comment,
            Ok(_) => {
                warn!("empty supervisor comment, using fallback");
                COMMENT_FALLBACK.to_string()
            }
            Err(err) => {
                warn!("supervisor comment failed, using fallback: {err:#}");
                COMMENT_FALLBACK.to_string()
            }
        }
    }

    fn complete(&self, req: GenerateRequest) -> Result<String> {
        let out = self.client.generate(&req)?;
        Ok(out.response.trim().to_string())
    }
}

/// Normalize a model reply into `"<code>, <code>, ..."` or the `N/A` sentinel.
pub fn clean_activity_codes(
    raw: &str,
    catalog: &ActivityCatalog,
    min_codes: usize,
    max_codes: usize,
) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(ACTIVITY_NA) {
        return ACTIVITY_NA.to_string();
    }

    let known = catalog.codes();
    let mut seen = BTreeSet::new();
    let mut codes = Vec::new();
    for piece in raw.split(|c: char| c == ',' || c == '\n') {
        let piece = CODE_EDGES.replace_all(piece, "");
        let Some(code) = piece.split_whitespace().next() else {
            continue;
        };
        let code = trim_code(code);
        if code.is_empty() || (!known.is_empty() && !known.contains(code)) {
            continue;
        }
        if seen.insert(code.to_string()) {
            codes.push(code.to_string());
        }
        if codes.len() == max_codes {
            break;
        }
    }

    if codes.len() < min_codes {
        debug!("only {} usable activity codes in {:?}", codes.len(), truncate(raw, 80));
        return ACTIVITY_NA.to_string();
    }
    codes.join(", ")
}

fn trim_code(code: &str) -> &str {
    code.trim_matches(|c: char| c == '.' || c.is_whitespace())
}

fn parse_summary(raw: &str) -> Result<WeeklySummary> {
    let parsed: SummaryJson =
        serde_json::from_str(raw).with_context(|| "summary response is not a JSON object")?;
    Ok(WeeklySummary {
        problems: field_text(parsed.problems_encountered),
        solutions: field_text(parsed.solutions_found),
    })
}

fn field_text(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => SUMMARY_MISSING_FIELD.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn activity_prompt(description: &str, catalog: &ActivityCatalog, min: usize, max: usize) -> String {
    format!(
        "You classify industrial attachment work against an official activity list.\n\
         Pick between {min} and {max} activity numbers from the list that best match the work \
         described, most relevant first.\n\
         Reply with the activity numbers only, separated by a comma and a space, and nothing else.\n\
         \n\
         Activities:\n\
         ---\n\
         {activities}\n\
         ---\n\
         \n\
         Work description:\n\
         \"{description}\"\n",
        activities = catalog.entries().join("\n"),
    )
}

fn summary_prompt(tasks_summary: &str) -> String {
    format!(
        "These are the tasks a student completed during one week of industrial attachment.\n\
         Infer one problem or challenge they likely faced and the corresponding solution.\n\
         Reply with a single JSON object with exactly two string keys, \
         \"problems_encountered\" and \"solutions_found\", and no other text.\n\
         \n\
         Tasks:\n\
         ---\n\
         {tasks_summary}\
         ---\n"
    )
}

fn comment_prompt(tasks_summary: &str) -> String {
    format!(
        "You are the industrial supervisor signing a student's weekly logbook.\n\
         Write a brief, professional and encouraging comment of one or two sentences approving \
         the week's work below. Reply with the comment only.\n\
         \n\
         Tasks:\n\
         {tasks_summary}"
    )
}

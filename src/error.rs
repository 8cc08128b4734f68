use chrono::NaiveDate;
use thiserror::Error;

/// Conditions a caller can tell apart. Everything else travels as plain `anyhow` context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogbookError {
    #[error("invalid date {value:?}: expected format YYYY-MM-DD")]
    InvalidDateFormat { value: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("week {week_id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict {
        week_id: u64,
        expected: u64,
        found: u64,
    },

    #[error("signature image rejected: {0}")]
    InvalidSignature(String),

    #[error("week block ending {week_ending} is closed")]
    BlockClosed { week_ending: NaiveDate },

    #[error("{date} does not fall in the week ending {week_ending}")]
    DateOutsideWeek {
        date: NaiveDate,
        week_ending: NaiveDate,
    },
}

impl LogbookError {
    pub fn report_not_found(id: u64) -> Self {
        Self::NotFound { kind: "report", id }
    }

    pub fn week_not_found(id: u64) -> Self {
        Self::NotFound { kind: "week", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// True when `err` wraps a [`LogbookError::NotFound`].
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<LogbookError>()
        .is_some_and(LogbookError::is_not_found)
}

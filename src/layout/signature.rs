use crate::error::LogbookError;
use std::sync::Arc;

/// A signature image that the spreadsheet writer accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Arc<[u8]>,
}

impl Signature {
    /// Validate raw image bytes (PNG, JPEG, GIF, BMP).
    pub fn decode(bytes: &[u8]) -> Result<Self, LogbookError> {
        if bytes.is_empty() {
            return Err(LogbookError::InvalidSignature("empty image".into()));
        }
        rust_xlsxwriter::Image::new_from_buffer(bytes)
            .map_err(|e| LogbookError::InvalidSignature(e.to_string()))?;
        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }
}

use std::path::Path;

use super::walker::SupportedFormat;
use crate::error::{AssistantError, Result};

pub fn extract_text(path: &Path, format: SupportedFormat) -> Result<String> {
    match format {
        SupportedFormat::PlainText => std::fs::read_to_string(path).map_err(|e| {
            AssistantError::Ingest(format!("Failed to read text file {}: {}", path.display(), e))
        }),
        SupportedFormat::Pdf => pdf_extract::extract_text(path).map_err(|e| {
            AssistantError::Ingest(format!("Failed to extract PDF text {}: {}", path.display(), e))
        }),
    }
}

/// Same as `extract_text`, for uploads held in memory.
pub fn extract_text_from_bytes(bytes: &[u8], format: SupportedFormat) -> Result<String> {
    match format {
        SupportedFormat::PlainText => String::from_utf8(bytes.to_vec())
            .map_err(|e| AssistantError::Ingest(format!("Text upload is not UTF-8: {}", e))),
        SupportedFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| AssistantError::Ingest(format!("Failed to extract PDF text: {}", e))),
    }
}

//! Upstream text sources.

pub mod profile;

use crate::core::errors::RagError;

pub use profile::{ProfileFields, ProfileScraper};

/// Rejects text that cannot be indexed: blank input, or a failure report
/// from the source (text starting with `Error` or `Failed`).
pub fn validate_source_text(text: &str) -> Result<(), RagError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Err(RagError::SourceUnavailable(
            "the text source returned no content".to_string(),
        ));
    }
    if trimmed.starts_with("Error") || trimmed.starts_with("Failed") {
        let first_line = trimmed.lines().next().unwrap_or(trimmed).trim();
        return Err(RagError::SourceUnavailable(first_line.to_string()));
    }
    Ok(())
}

use crate::config::{DocumentFormatConfig, FormatRegistry};

use super::SegmentError;

/// First format, in format-name order, whose file list names `stem`.
pub fn resolve_format<'a>(
    stem: &str,
    registry: &'a FormatRegistry,
) -> Result<&'a DocumentFormatConfig, SegmentError> {
    registry
        .formats()
        .find(|format| format.file_names.contains(stem))
        .ok_or_else(|| SegmentError::ConfigNotFound {
            filename: stem.to_string(),
        })
}

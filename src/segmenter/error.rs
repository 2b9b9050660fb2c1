use thiserror::Error;

/// Per-document failures. A batch run skips the document and carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("no format config lists file name '{filename}'")]
    ConfigNotFound { filename: String },

    #[error("table-of-contents keyword '{keyword}' not found in '{filename}'")]
    MarkerNotFound { filename: String, keyword: String },

    #[error("no chapter names found in the table of contents of '{filename}'")]
    EmptyChapterList { filename: String },
}

impl SegmentError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::MarkerNotFound { .. } => "marker_not_found",
            Self::EmptyChapterList { .. } => "empty_chapter_list",
        }
    }
}

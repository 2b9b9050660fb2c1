use serde::{Deserialize, Serialize};

use crate::segmenter::SectionType;

/// One output row. Field order is the column order downstream consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub filename: String,
    pub chapter: String,
    pub section: String,
    pub section_type: SectionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEntry {
    pub filename: String,
    pub stem: String,
    pub bytes: u64,
    pub sha256: String,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub text_count: usize,
    pub unresolved_count: usize,
    pub texts: Vec<TextEntry>,
    /// Discovered files that could not be inspected or hashed.
    #[serde(default)]
    pub unreadable: Vec<SkippedDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub kind: String,
    pub reason: String,
}

impl SkippedDocument {
    pub const READ_FAILED: &'static str = "read_failed";

    pub fn read_failed(filename: &str, err: &anyhow::Error) -> Self {
        Self {
            filename: filename.to_string(),
            kind: Self::READ_FAILED.to_string(),
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentCounts {
    pub text_count: usize,
    pub processed_count: usize,
    pub skipped_count: usize,
    pub empty_text_count: usize,
    pub sections_total: usize,
    pub target_sections: usize,
    pub principle_sections: usize,
    pub explanation_sections: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPaths {
    pub text_dir: String,
    pub config_path: String,
    pub output_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: SegmentPaths,
    pub counts: SegmentCounts,
    pub skipped: Vec<SkippedDocument>,
    pub source_hashes: Vec<TextEntry>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSection {
    pub section_id: String,
    pub filename: String,
    pub chapter: String,
    pub section_type: String,
    pub section: String,
}

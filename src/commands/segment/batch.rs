use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::FormatRegistry;
use crate::model::{
    SectionRow, SegmentCounts, SkippedDocument, TextEntry, TextInventoryManifest,
};
use crate::segmenter::{RawDocument, SectionType, SegmentedDocument, Segmenter};
use crate::store::DocumentRecord;

#[derive(Debug)]
pub(super) struct ProcessedDocument {
    pub entry: TextEntry,
    pub year: Option<i32>,
    pub segmented: SegmentedDocument,
}

#[derive(Debug, Default)]
pub(super) struct BatchOutcome {
    pub documents: Vec<ProcessedDocument>,
    pub skipped: Vec<SkippedDocument>,
    pub empty_text_count: usize,
    pub warnings: Vec<String>,
}

impl BatchOutcome {
    pub fn rows(&self) -> Vec<&SectionRow> {
        self.documents
            .iter()
            .flat_map(|document| document.segmented.rows.iter())
            .collect()
    }

    pub fn counts(&self, text_count: usize) -> SegmentCounts {
        let rows = self.rows();
        let count_type = |section_type: SectionType| {
            rows.iter()
                .filter(|row| row.section_type == section_type)
                .count()
        };

        SegmentCounts {
            text_count,
            processed_count: self.documents.len(),
            skipped_count: self.skipped.len(),
            empty_text_count: self.empty_text_count,
            sections_total: rows.len(),
            target_sections: count_type(SectionType::Target),
            principle_sections: count_type(SectionType::Principle),
            explanation_sections: count_type(SectionType::Explanation),
        }
    }

    pub fn records(&self) -> Vec<DocumentRecord<'_>> {
        self.documents
            .iter()
            .map(|document| DocumentRecord {
                filename: &document.entry.stem,
                sha256: &document.entry.sha256,
                format: &document.segmented.format,
                year: document.year,
                chapter_count: document.segmented.chapters.len(),
                rows: &document.segmented.rows,
            })
            .collect()
    }
}

/// Segments every readable text of the inventory. Files the inventory could
/// not read, files failing to read now, and documents failing with a
/// segmentation error are logged and recorded as skipped; the run continues
/// with the next one.
pub(super) fn segment_texts(
    text_dir: &Path,
    inventory: &TextInventoryManifest,
    registry: &FormatRegistry,
) -> BatchOutcome {
    let segmenter = Segmenter::new(registry);
    let mut outcome = BatchOutcome {
        skipped: inventory.unreadable.clone(),
        ..BatchOutcome::default()
    };

    for entry in &inventory.texts {
        let path = text_dir.join(&entry.filename);
        let document = match read_document(&path, &entry.stem) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    filename = %entry.stem,
                    kind = SkippedDocument::READ_FAILED,
                    reason = %format!("{err:#}"),
                    "skipping document"
                );
                outcome
                    .skipped
                    .push(SkippedDocument::read_failed(&entry.stem, &err));
                continue;
            }
        };

        match segmenter.segment_document(&document) {
            Ok(segmented) => {
                if document.content.is_none() {
                    warn!(filename = %entry.stem, "text is not valid UTF-8; no sections produced");
                    outcome.empty_text_count += 1;
                    outcome.warnings.push(format!(
                        "{} is not valid UTF-8; treated as empty text",
                        path.display()
                    ));
                }
                info!(
                    filename = %entry.stem,
                    format = %segmented.format,
                    chapters = segmented.chapters.len(),
                    sections = segmented.rows.len(),
                    "segmented document"
                );
                outcome.documents.push(ProcessedDocument {
                    entry: entry.clone(),
                    year: plan_year(&entry.stem),
                    segmented,
                });
            }
            Err(err) => {
                warn!(
                    filename = %entry.stem,
                    kind = err.kind(),
                    reason = %err,
                    "skipping document"
                );
                outcome.skipped.push(SkippedDocument {
                    filename: entry.stem.clone(),
                    kind: err.kind().to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    outcome
}

fn read_document(path: &Path, stem: &str) -> Result<RawDocument> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    Ok(RawDocument {
        filename: stem.to_string(),
        content: String::from_utf8(bytes).ok(),
    })
}

/// Plan year from stems shaped like `region-2018[-suffix]`.
pub(super) fn plan_year(stem: &str) -> Option<i32> {
    let token = stem.split('-').nth(1)?;
    if token.is_empty() || !token.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

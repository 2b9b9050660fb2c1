//! Regional-plan segmentation: recovers the chapter list from the table of
//! contents and cuts the body into target / principle / explanation
//! sections, each attributed to its nearest preceding chapter heading.

use tracing::debug;

use crate::config::FormatRegistry;
use crate::model::SectionRow;

mod chapters;
mod error;
mod format;
mod markers;
mod normalize;
mod offsets;
mod sections;
mod toc;

pub use chapters::{ChapterExtraction, TocBoundary, extract_chapter_names};
pub use error::SegmentError;
pub use format::resolve_format;
pub use normalize::normalize_text;
pub use sections::{SectionSpan, SectionType, build_sections};
pub use toc::locate_toc_boundary;

/// Extracted text of one plan document, keyed by file stem. `content` is
/// `None` when extraction failed.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SegmentedDocument {
    pub format: String,
    pub chapters: Vec<String>,
    pub rows: Vec<SectionRow>,
}

pub struct Segmenter<'a> {
    registry: &'a FormatRegistry,
}

impl<'a> Segmenter<'a> {
    pub fn new(registry: &'a FormatRegistry) -> Self {
        Self { registry }
    }

    pub fn segment_document(&self, document: &RawDocument) -> Result<SegmentedDocument, SegmentError> {
        let stem = document.filename.as_str();
        let format = resolve_format(stem, self.registry)?;

        let Some(content) = document.content.as_deref() else {
            debug!(filename = %stem, "document has no text; no sections produced");
            return Ok(SegmentedDocument {
                format: format.name.clone(),
                chapters: Vec::new(),
                rows: Vec::new(),
            });
        };

        let text = normalize_text(content);
        let toc_end = locate_toc_boundary(stem, &text, format.toc_marker_for(stem))?;
        let extraction = extract_chapter_names(stem, &text, format, TocBoundary::Offset(toc_end))?;
        let spans = build_sections(extraction.body, format, &extraction.chapters);

        let rows = spans
            .into_iter()
            .filter(|span| span.section_type != SectionType::Start)
            .map(|span| SectionRow {
                filename: stem.to_string(),
                chapter: span.chapter,
                section: span.text,
                section_type: span.section_type,
            })
            .collect::<Vec<SectionRow>>();

        debug!(
            filename = %stem,
            format = %format.name,
            chapters = extraction.chapters.len(),
            sections = rows.len(),
            "segmented document"
        );

        Ok(SegmentedDocument {
            format: format.name.clone(),
            chapters: extraction.chapters,
            rows,
        })
    }
}

use std::collections::HashSet;

use tracing::debug;

use crate::config::DocumentFormatConfig;

use super::SegmentError;

pub const DEFAULT_TOC_MARGIN: f64 = 0.1;

/// End of the table-of-contents region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TocBoundary {
    /// Byte offset into the text. An offset of 0 marks no boundary and falls
    /// back to the default margin.
    Offset(usize),
    /// Fraction of the text length.
    Margin(f64),
}

impl Default for TocBoundary {
    fn default() -> Self {
        Self::Margin(DEFAULT_TOC_MARGIN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterExtraction<'a> {
    pub chapters: Vec<String>,
    pub body: &'a str,
}

/// Collects chapter headings from the table of contents and cuts the text
/// down to the body that follows the last listed heading.
pub fn extract_chapter_names<'a>(
    stem: &str,
    text: &'a str,
    format: &DocumentFormatConfig,
    boundary: TocBoundary,
) -> Result<ChapterExtraction<'a>, SegmentError> {
    let toc_end = toc_end_offset(text, boundary);
    let toc_region = &text[..toc_end];

    let mut seen = HashSet::new();
    let chapters = toc_region
        .split('\n')
        .filter(|line| format.chapter_marker.is_match(line))
        .map(strip_numbering)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect::<Vec<String>>();

    let Some(last) = chapters.last() else {
        return Err(SegmentError::EmptyChapterList {
            filename: stem.to_string(),
        });
    };

    let body_start = match find_after_first_char(text, last) {
        Some(position) => position + last.len(),
        None => {
            // Stripping digits out of the middle of a heading can yield a
            // name that never occurs verbatim.
            debug!(
                filename = %stem,
                chapter = %last,
                "last chapter name not found verbatim; body starts at table-of-contents end"
            );
            toc_end
        }
    };

    Ok(ChapterExtraction {
        chapters,
        body: &text[body_start..],
    })
}

fn toc_end_offset(text: &str, boundary: TocBoundary) -> usize {
    let raw = match boundary {
        TocBoundary::Offset(0) => return toc_end_offset(text, TocBoundary::default()),
        TocBoundary::Offset(offset) => offset,
        TocBoundary::Margin(margin) => (text.len() as f64 * margin.clamp(0.0, 1.0)) as usize,
    };
    floor_char_boundary(text, raw.min(text.len()))
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn strip_numbering(line: &str) -> String {
    line.chars()
        .filter(|ch| *ch != '.' && !ch.is_ascii_digit())
        .collect::<String>()
        .trim()
        .to_string()
}

// A heading sitting at offset 0 is the table of contents itself, never the body.
fn find_after_first_char(text: &str, needle: &str) -> Option<usize> {
    let skip = text.chars().next().map_or(0, char::len_utf8);
    text[skip..].find(needle).map(|position| skip + position)
}

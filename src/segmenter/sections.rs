use serde::{Deserialize, Serialize};

use crate::config::DocumentFormatConfig;

use super::markers::{find_explanation_offsets, find_marker_offsets};
use super::offsets::{char_to_byte_offset, char_to_byte_offsets};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Body text before the first recognized marker.
    Start,
    Target,
    Principle,
    Explanation,
}

impl SectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Target => "target",
            Self::Principle => "principle",
            Self::Explanation => "explanation",
        }
    }
}

/// Sorted span boundaries of one body text.
///
/// `offsets` are char offsets running from 0 to the body's char count; `section_types[i]` types the
/// span `offsets[i]..offsets[i + 1]`, so it is one entry shorter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundaries {
    pub offsets: Vec<usize>,
    pub section_types: Vec<SectionType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSpan {
    /// Empty for the start span and for spans no chapter heading precedes.
    pub chapter: String,
    pub section_type: SectionType,
    pub text: String,
}

pub fn collect_boundaries(body: &str, format: &DocumentFormatConfig) -> SectionBoundaries {
    let prefixes = &format.unwanted_prefixes;
    let tagged = [
        (
            SectionType::Target,
            find_marker_offsets(Some(body), &format.target_marker, prefixes),
        ),
        (
            SectionType::Principle,
            find_marker_offsets(Some(body), &format.principle_marker, prefixes),
        ),
        (
            SectionType::Explanation,
            find_explanation_offsets(Some(body), &format.explanation_marker, prefixes),
        ),
    ];

    let mut merged = tagged
        .into_iter()
        .flat_map(|(section_type, offsets)| {
            offsets
                .into_iter()
                .map(move |offset| (offset, section_type))
        })
        .collect::<Vec<(usize, SectionType)>>();
    // Stable: on equal offsets the marker kind found first keeps its place.
    merged.sort_by_key(|(offset, _)| *offset);

    let mut offsets = Vec::with_capacity(merged.len() + 2);
    let mut section_types = Vec::with_capacity(merged.len() + 1);
    offsets.push(0);
    section_types.push(SectionType::Start);
    for (offset, section_type) in merged {
        offsets.push(offset);
        section_types.push(section_type);
    }
    offsets.push(body.chars().count());

    SectionBoundaries {
        offsets,
        section_types,
    }
}

/// Chapter whose name occurs last before char offset `offset` of `text`;
/// earlier names in `chapters` win ties. Empty when no name occurs there.
pub fn find_chapter_for_offset<'c>(offset: usize, chapters: &'c [String], text: &str) -> &'c str {
    chapter_before_byte(char_to_byte_offset(text, offset), chapters, text)
}

pub fn find_chapters_for_offsets(offsets: &[usize], chapters: &[String], text: &str) -> Vec<String> {
    offsets
        .iter()
        .map(|offset| find_chapter_for_offset(*offset, chapters, text).to_string())
        .collect()
}

fn chapter_before_byte<'c>(byte: usize, chapters: &'c [String], text: &str) -> &'c str {
    let searched = &text[..byte.min(text.len())];
    let mut closest: Option<(usize, &'c str)> = None;

    for chapter in chapters {
        let Some(position) = searched.rfind(chapter.as_str()) else {
            continue;
        };
        if closest.is_none_or(|(best, _)| position > best) {
            closest = Some((position, chapter.as_str()));
        }
    }

    closest.map(|(_, chapter)| chapter).unwrap_or_default()
}

/// Splits `body` into contiguous typed spans covering all of it, each
/// attributed to the nearest chapter heading before its start.
pub fn build_sections(
    body: &str,
    format: &DocumentFormatConfig,
    chapters: &[String],
) -> Vec<SectionSpan> {
    let boundaries = collect_boundaries(body, format);
    let span_starts = &boundaries.offsets[..boundaries.offsets.len() - 1];
    let attributed = find_chapters_for_offsets(span_starts, chapters, body);
    let byte_offsets = char_to_byte_offsets(body, &boundaries.offsets);

    byte_offsets
        .windows(2)
        .zip(boundaries.section_types)
        .zip(attributed)
        .map(|((window, section_type), chapter)| SectionSpan {
            chapter: if section_type == SectionType::Start {
                String::new()
            } else {
                chapter
            },
            section_type,
            text: body[window[0]..window[1]].to_string(),
        })
        .collect()
}

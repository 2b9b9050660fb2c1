use crate::config::{TocAnchor, TocMarker};

use super::SegmentError;

pub fn locate_toc_boundary(
    stem: &str,
    text: &str,
    marker: &TocMarker,
) -> Result<usize, SegmentError> {
    let found = match marker.anchor {
        TocAnchor::First => text.find(&marker.keyword),
        TocAnchor::Last => text.rfind(&marker.keyword),
    };

    found.ok_or_else(|| SegmentError::MarkerNotFound {
        filename: stem.to_string(),
        keyword: marker.keyword.clone(),
    })
}

use regex::Regex;

use super::offsets::byte_to_char_offsets;

/// Characters searched behind a match for an unwanted prefix, on top of the
/// prefix length itself.
const PREFIX_LOOKBACK_SLACK: usize = 3;

/// Char offsets of target/principle markers that open a new section.
///
/// A match only counts when it starts the text or follows a space or a
/// newline, and when none of `unwanted_prefixes` appears right before it.
pub fn find_marker_offsets(
    content: Option<&str>,
    marker: &Regex,
    unwanted_prefixes: &[String],
) -> Vec<usize> {
    let Some(content) = content else {
        return Vec::new();
    };

    let offsets = marker
        .find_iter(content)
        .map(|found| found.start())
        .filter(|offset| follows_separator(content, *offset))
        .collect::<Vec<usize>>();

    let kept = drop_unwanted_prefixes(content, offsets, unwanted_prefixes);
    byte_to_char_offsets(content, &kept)
}

/// Char offsets of explanation markers. These may follow any character.
pub fn find_explanation_offsets(
    content: Option<&str>,
    marker: &Regex,
    unwanted_prefixes: &[String],
) -> Vec<usize> {
    let Some(content) = content else {
        return Vec::new();
    };

    let offsets = marker
        .find_iter(content)
        .map(|found| found.start())
        .collect::<Vec<usize>>();

    let kept = drop_unwanted_prefixes(content, offsets, unwanted_prefixes);
    byte_to_char_offsets(content, &kept)
}

fn follows_separator(content: &str, offset: usize) -> bool {
    match content[..offset].chars().next_back() {
        None => true,
        Some(previous) => previous == ' ' || previous == '\n',
    }
}

fn drop_unwanted_prefixes(
    content: &str,
    offsets: Vec<usize>,
    unwanted_prefixes: &[String],
) -> Vec<usize> {
    offsets
        .into_iter()
        .filter(|offset| {
            !unwanted_prefixes
                .iter()
                .any(|prefix| lookback(content, *offset, prefix).contains(prefix.as_str()))
        })
        .collect()
}

fn lookback(content: &str, offset: usize, prefix: &str) -> String {
    let window = prefix.chars().count() + PREFIX_LOOKBACK_SLACK;
    let mut preceding = content[..offset]
        .chars()
        .rev()
        .take(window)
        .collect::<Vec<char>>();
    preceding.reverse();
    preceding.into_iter().collect()
}

//! Conversions between byte offsets (for slicing) and char offsets (what the
//! marker indexer and section builder report).

use std::iter;

/// Maps ascending byte offsets to char offsets in one pass over `text`.
pub fn byte_to_char_offsets(text: &str, byte_offsets: &[usize]) -> Vec<usize> {
    let mut chars = 0;
    let mut last = 0;
    byte_offsets
        .iter()
        .map(|&byte| {
            chars += text[last..byte].chars().count();
            last = byte;
            chars
        })
        .collect()
}

/// Maps ascending char offsets to byte offsets in one pass over `text`.
/// Offsets past the end clamp to `text.len()`.
pub fn char_to_byte_offsets(text: &str, char_offsets: &[usize]) -> Vec<usize> {
    let mut positions = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(iter::once(text.len()));
    let mut position = positions.next().unwrap_or(text.len());
    let mut char_index = 0;

    char_offsets
        .iter()
        .map(|&target| {
            while char_index < target {
                let Some(next) = positions.next() else {
                    break;
                };
                position = next;
                char_index += 1;
            }
            position
        })
        .collect()
}

pub fn char_to_byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(byte, _)| byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_convert_both_ways_across_umlauts() {
        let text = "grundsätze: ziel 1\nerläuterung";
        let bytes = vec![0, 13, 20];
        let chars = byte_to_char_offsets(text, &bytes);

        assert_eq!(chars, vec![0, 12, 19]);
        assert_eq!(char_to_byte_offsets(text, &chars), bytes);
        assert_eq!(char_to_byte_offset(text, 12), 13);
    }

    #[test]
    fn char_offsets_past_the_end_clamp_to_length() {
        let text = "ä b";
        assert_eq!(char_to_byte_offsets(text, &[3, 3, 9]), vec![4, 4, 4]);
        assert_eq!(char_to_byte_offset(text, 9), 4);
    }
}

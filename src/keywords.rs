//! Keyword search over stored sections: exact token matching and windowed
//! fuzzy matching with surrounding context.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::StoredSection;

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 70;
pub const DEFAULT_CONTEXT_WORDS: usize = 3;
pub const MATCH_SEPARATOR: &str = ";;;";

/// `category -> [keywords]`
pub type ExactKeywords = BTreeMap<String, Vec<String>>;

/// `category -> { keywords, threshold? }`
pub type FuzzyKeywords = BTreeMap<String, FuzzyCategory>;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FuzzyCategory {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub threshold: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzyMatch {
    pub keyword: String,
    pub matched_phrase: String,
    pub score: u8,
}

/// Lower-cases and replaces hyphens and en dashes with spaces.
pub fn clean_content(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '\u{2013}'], " ")
        .trim()
        .to_string()
}

/// Drops every section whose text contains one of `negations`. Returns the
/// kept sections and the number removed.
pub fn apply_negations(
    sections: Vec<StoredSection>,
    negations: &[String],
) -> (Vec<StoredSection>, usize) {
    let before = sections.len();
    let kept = sections
        .into_iter()
        .filter(|section| {
            !negations
                .iter()
                .any(|phrase| section.section.contains(phrase.as_str()))
        })
        .collect::<Vec<StoredSection>>();
    let removed = before - kept.len();
    (kept, removed)
}

pub struct ExactMatcher {
    word: Regex,
}

impl ExactMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            word: Regex::new(r"\w+").context("failed to compile word regex")?,
        })
    }

    /// Exact search over already cleaned text. Categories without a hit are
    /// absent from the result.
    pub fn search(&self, text: &str, keywords: &ExactKeywords) -> BTreeMap<String, Vec<String>> {
        let lowered = text.to_lowercase();
        let words = self
            .word
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect::<Vec<String>>();

        let mut result = BTreeMap::new();
        for (category, candidates) in keywords {
            let found = candidates
                .iter()
                .filter(|keyword| exact_keyword_matches(keyword, &words))
                .cloned()
                .collect::<Vec<String>>();
            if !found.is_empty() {
                result.insert(category.clone(), found);
            }
        }
        result
    }
}

fn exact_keyword_matches(keyword: &str, words: &[String]) -> bool {
    let keyword = keyword.to_lowercase();
    if keyword.contains(' ') {
        keyword
            .split_whitespace()
            .all(|part| words.iter().any(|word| word == part))
    } else {
        words.iter().any(|word| word.contains(keyword.as_str()))
    }
}

/// Scans `content` in windows of the keyword's word count, stepping by that
/// count. Windows scoring above `threshold` are returned with `context_words`
/// words on either side, best score first.
pub fn find_best_matches(
    content: &str,
    keyword: &str,
    threshold: u8,
    context_words: usize,
) -> Vec<FuzzyMatch> {
    let keyword = keyword.to_lowercase();
    let key_length = keyword.split_whitespace().count();
    if key_length == 0 {
        return Vec::new();
    }

    let words = content.split_whitespace().collect::<Vec<&str>>();
    let content_length = words.len();
    let mut matches = Vec::new();

    for start in (0..=content_length).step_by(key_length) {
        let end = (start + key_length).min(content_length);
        let phrase = words[start..end].join(" ");
        let score = similarity_score(&phrase, &keyword);
        if score <= threshold {
            continue;
        }

        let context_start = start.saturating_sub(context_words);
        let context_end = (start + key_length + context_words).min(content_length);
        matches.push(FuzzyMatch {
            keyword: keyword.clone(),
            matched_phrase: words[context_start..context_end].join(" "),
            score,
        });
    }

    matches.sort_by(|left, right| right.score.cmp(&left.score));
    matches
}

/// Fuzzy search of one cleaned section. Categories without a match are
/// absent from the result.
pub fn search_fuzzy(
    content: &str,
    keywords: &FuzzyKeywords,
    default_threshold: u8,
    context_words: usize,
) -> BTreeMap<String, Vec<FuzzyMatch>> {
    let mut result = BTreeMap::new();
    for (category, entry) in keywords {
        let threshold = entry.threshold.unwrap_or(default_threshold);
        let found = entry
            .keywords
            .iter()
            .flat_map(|keyword| find_best_matches(content, keyword, threshold, context_words))
            .collect::<Vec<FuzzyMatch>>();
        if !found.is_empty() {
            result.insert(category.clone(), found);
        }
    }
    result
}

pub fn join_phrases(matches: &[FuzzyMatch]) -> String {
    matches
        .iter()
        .map(|m| m.matched_phrase.as_str())
        .collect::<Vec<&str>>()
        .join(MATCH_SEPARATOR)
}

fn similarity_score(phrase: &str, keyword: &str) -> u8 {
    let ratio = rapidfuzz::fuzz::ratio(phrase.chars(), keyword.chars());
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(section_id: &str, section: &str) -> StoredSection {
        StoredSection {
            section_id: section_id.to_string(),
            filename: "ruhr-2021".to_string(),
            chapter: "freiraum".to_string(),
            section_type: "target".to_string(),
            section: section.to_string(),
        }
    }

    fn exact_dict(entries: &[(&str, &[&str])]) -> ExactKeywords {
        entries
            .iter()
            .map(|(category, words)| {
                (
                    category.to_string(),
                    words.iter().map(|word| word.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn clean_content_lowercases_and_removes_dashes() {
        assert_eq!(
            clean_content("  Wald-Flächen \u{2013} Schutz "),
            "wald flächen   schutz"
        );
    }

    #[test]
    fn negations_remove_matching_sections() {
        let sections = vec![
            stored("a:00000", "ziel 1 keine windenergie"),
            stored("a:00001", "ziel 2 windenergie fördern"),
        ];
        let (kept, removed) = apply_negations(sections, &["keine windenergie".to_string()]);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].section_id, "a:00001");
    }

    #[test]
    fn exact_single_word_matches_inside_tokens() {
        let keywords = exact_dict(&[("wind", &["windenergie"]), ("wasser", &["hochwasser"])]);
        let matcher = ExactMatcher::new().expect("matcher");
        let result = matcher.search("die windenergieanlagen sind zu bündeln", &keywords);

        assert_eq!(result.len(), 1);
        assert_eq!(result["wind"], vec!["windenergie".to_string()]);
    }

    #[test]
    fn exact_multi_word_requires_every_word_as_token() {
        let keywords = exact_dict(&[("grünzug", &["Regionaler Grünzug", "grüne achse"])]);

        let matcher = ExactMatcher::new().expect("matcher");

        let hit = matcher.search("der grünzug ist ein regionaler freiraum", &keywords);
        assert_eq!(hit["grünzug"], vec!["Regionaler Grünzug".to_string()]);

        let miss = matcher.search("die regionalen grünzüge", &keywords);
        assert!(miss.is_empty());
    }

    #[test]
    fn fuzzy_match_carries_context_words() {
        let content = "der regionale grünzug ist zu sichern und zu entwickeln";
        let matches = find_best_matches(content, "Grünzug", 70, 3);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].keyword, "grünzug");
        assert_eq!(matches[0].score, 100);
        assert_eq!(matches[0].matched_phrase, "der regionale grünzug ist zu sichern");
    }

    #[test]
    fn fuzzy_windows_step_by_keyword_length() {
        let matches = find_best_matches("regionale grünzüge sichern", "regionale grünzüge", 70, 0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_phrase, "regionale grünzüge");

        let shifted = find_best_matches("die regionale grünzüge", "regionale grünzüge", 90, 0);
        assert!(shifted.is_empty());
    }

    #[test]
    fn fuzzy_matches_sorted_by_score_descending() {
        let matches = find_best_matches("freiraums schutz freiraum", "freiraum", 70, 0);
        let phrases = matches
            .iter()
            .map(|m| m.matched_phrase.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(phrases, vec!["freiraum", "freiraums"]);
        assert!(matches[0].score > matches[1].score);
    }

    #[test]
    fn fuzzy_category_threshold_overrides_default() {
        let mut keywords = FuzzyKeywords::new();
        keywords.insert(
            "freiraum".to_string(),
            FuzzyCategory {
                keywords: vec!["freiraum".to_string()],
                threshold: Some(99),
            },
        );

        let strict = search_fuzzy("freiraums sichern", &keywords, DEFAULT_FUZZY_THRESHOLD, 3);
        assert!(strict.is_empty());

        keywords.get_mut("freiraum").expect("category").threshold = None;
        let lenient = search_fuzzy("freiraums sichern", &keywords, DEFAULT_FUZZY_THRESHOLD, 3);
        assert_eq!(join_phrases(&lenient["freiraum"]), "freiraums sichern");
    }

    #[test]
    fn empty_keyword_yields_no_matches() {
        assert!(find_best_matches("ziel 1", "  ", 0, 3).is_empty());
    }
}

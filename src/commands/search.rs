use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::cli::SearchArgs;
use crate::keywords::{
    ExactKeywords, ExactMatcher, FuzzyKeywords, apply_negations, clean_content, join_phrases,
    search_fuzzy,
};
use crate::model::StoredSection;
use crate::store;
use crate::util::{read_json, write_json_pretty};

#[derive(Debug, Serialize)]
struct SearchRow {
    section_id: String,
    filename: String,
    chapter: String,
    section_type: String,
    section: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    exact: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fuzzy: BTreeMap<String, Value>,
}

impl SearchRow {
    fn has_hits(&self) -> bool {
        self.exact
            .values()
            .chain(self.fuzzy.values())
            .any(|value| !matches!(value, Value::Null | Value::Bool(false)))
    }
}

pub fn run(args: SearchArgs) -> Result<()> {
    if args.exact_keywords.is_none() && args.fuzzy_keywords.is_none() {
        bail!("nothing to search: pass --exact-keywords and/or --fuzzy-keywords");
    }

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("rplan_sections.sqlite"));
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("keyword_search_results.json"));

    let exact_keywords = match &args.exact_keywords {
        Some(path) => Some(read_json::<ExactKeywords>(path)?),
        None => None,
    };
    let fuzzy_keywords = match &args.fuzzy_keywords {
        Some(path) => Some(read_json::<FuzzyKeywords>(path)?),
        None => None,
    };

    let connection = store::open_store(&db_path)?;
    let mut sections = store::load_sections(&connection)?;
    info!(path = %db_path.display(), sections = sections.len(), "loaded stored sections");

    if let Some(path) = &args.negate_keywords {
        let negations = read_json::<Vec<String>>(path)?;
        info!(negations = ?negations, "applying negate keywords");
        let (kept, removed) = apply_negations(sections, &negations);
        info!(removed, "removed sections with negate keywords");
        sections = kept;
    }

    let matcher = ExactMatcher::new()?;
    let mut rows = Vec::with_capacity(sections.len());
    for section in sections {
        let content = clean_content(&section.section);
        let exact = exact_keywords
            .as_ref()
            .map(|keywords| exact_columns(&matcher, &content, keywords, args.boolean))
            .unwrap_or_default();
        let fuzzy = fuzzy_keywords
            .as_ref()
            .map(|keywords| fuzzy_columns(&content, keywords, &args))
            .unwrap_or_default();

        rows.push(search_row(section, exact, fuzzy));
    }

    let total = rows.len();
    if args.drop_empty {
        rows.retain(SearchRow::has_hits);
    }
    let with_hits = rows.iter().filter(|row| row.has_hits()).count();

    write_json_pretty(&output_path, &rows)?;
    info!(
        path = %output_path.display(),
        searched = total,
        written = rows.len(),
        with_hits,
        "keyword search completed"
    );

    Ok(())
}

fn exact_columns(
    matcher: &ExactMatcher,
    content: &str,
    keywords: &ExactKeywords,
    boolean: bool,
) -> BTreeMap<String, Value> {
    let mut found = matcher.search(content, keywords);
    keywords
        .keys()
        .map(|category| {
            let hit = found.remove(category);
            let value = match (boolean, hit) {
                (true, hit) => Value::Bool(hit.is_some()),
                (false, Some(words)) => Value::from(words),
                (false, None) => Value::Null,
            };
            (category.clone(), value)
        })
        .collect()
}

fn fuzzy_columns(
    content: &str,
    keywords: &FuzzyKeywords,
    args: &SearchArgs,
) -> BTreeMap<String, Value> {
    let found = search_fuzzy(content, keywords, args.threshold, args.context_words);
    keywords
        .keys()
        .map(|category| {
            let hit = found.get(category);
            let value = match (args.boolean, hit) {
                (true, hit) => Value::Bool(hit.is_some()),
                (false, Some(matches)) => Value::String(join_phrases(matches)),
                (false, None) => Value::Null,
            };
            (category.clone(), value)
        })
        .collect()
}

fn search_row(
    section: StoredSection,
    exact: BTreeMap<String, Value>,
    fuzzy: BTreeMap<String, Value>,
) -> SearchRow {
    SearchRow {
        section_id: section.section_id,
        filename: section.filename,
        chapter: section.chapter,
        section_type: section.section_type,
        section: section.section,
        exact,
        fuzzy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(exact: &[(&str, Value)]) -> SearchRow {
        SearchRow {
            section_id: "ruhr-2021:00000".to_string(),
            filename: "ruhr-2021".to_string(),
            chapter: "freiraum".to_string(),
            section_type: "target".to_string(),
            section: "ziel 1".to_string(),
            exact: exact
                .iter()
                .map(|(category, value)| (category.to_string(), value.clone()))
                .collect(),
            fuzzy: BTreeMap::new(),
        }
    }

    #[test]
    fn rows_without_hits_are_detected_in_both_modes() {
        assert!(!row(&[("wind", Value::Null)]).has_hits());
        assert!(!row(&[("wind", Value::Bool(false))]).has_hits());
        assert!(row(&[("wind", Value::Bool(true))]).has_hits());
        assert!(row(&[("wind", Value::from(vec!["windenergie"]))]).has_hits());
    }

    #[test]
    fn exact_columns_report_every_category() {
        let matcher = ExactMatcher::new().expect("matcher");
        let mut keywords = ExactKeywords::new();
        keywords.insert("wind".to_string(), vec!["windenergie".to_string()]);
        keywords.insert("wasser".to_string(), vec!["hochwasser".to_string()]);

        let content = clean_content("Windenergie-Anlagen sind zu bündeln");
        let columns = exact_columns(&matcher, &content, &keywords, false);
        assert_eq!(columns["wind"], Value::from(vec!["windenergie"]));
        assert_eq!(columns["wasser"], Value::Null);

        let flags = exact_columns(&matcher, &content, &keywords, true);
        assert_eq!(flags["wind"], Value::Bool(true));
        assert_eq!(flags["wasser"], Value::Bool(false));
    }
}

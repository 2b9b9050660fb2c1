use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/rplan_structure.toml";
pub const DEFAULT_UNWANTED_PREFIXES: &[&str] = &["zu", "oder", "und", "nach"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read format config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse format config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("format config defines no formats")]
    NoFormats,

    #[error("format '{format}' has an empty {field}")]
    EmptyPattern { format: String, field: &'static str },

    #[error("format '{format}' has an invalid {field}: {source}")]
    InvalidPattern {
        format: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("format '{format}' has an empty table-of-contents keyword")]
    EmptyTocKeyword { format: String },

    #[error("file name '{file_name}' is listed in both '{first}' and '{second}'")]
    DuplicateFileName {
        file_name: String,
        first: String,
        second: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TocAnchor {
    First,
    Last,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TocMarker {
    pub keyword: String,
    pub anchor: TocAnchor,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile {
    formats: BTreeMap<String, RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormat {
    chapter_marker: String,
    target_marker: String,
    principle_marker: String,
    explanation_marker: String,
    file_names: Vec<String>,
    toc_anchor: TocMarker,
    #[serde(default)]
    toc_overrides: BTreeMap<String, TocMarker>,
    #[serde(default)]
    unwanted_prefixes: Option<Vec<String>>,
}

/// Marker patterns and table-of-contents anchor for one family of plan documents.
#[derive(Debug, Clone)]
pub struct DocumentFormatConfig {
    pub name: String,
    /// Anchored at line start, case-sensitive.
    pub chapter_marker: Regex,
    pub target_marker: Regex,
    pub principle_marker: Regex,
    pub explanation_marker: Regex,
    pub file_names: BTreeSet<String>,
    pub toc_anchor: TocMarker,
    pub toc_overrides: BTreeMap<String, TocMarker>,
    pub unwanted_prefixes: Vec<String>,
}

impl DocumentFormatConfig {
    pub fn toc_marker_for(&self, stem: &str) -> &TocMarker {
        self.toc_overrides.get(stem).unwrap_or(&self.toc_anchor)
    }
}

/// All configured formats, keyed and iterated by format name.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, DocumentFormatConfig>,
}

impl FormatRegistry {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: RawConfigFile =
            toml::from_str(raw).map_err(|source| ConfigError::Parse { source })?;

        if parsed.formats.is_empty() {
            return Err(ConfigError::NoFormats);
        }

        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        let mut formats = BTreeMap::new();
        for (name, raw_format) in parsed.formats {
            for file_name in &raw_format.file_names {
                if let Some(first) = owners.insert(file_name.clone(), name.clone()) {
                    return Err(ConfigError::DuplicateFileName {
                        file_name: file_name.clone(),
                        first,
                        second: name,
                    });
                }
            }

            let format = compile_format(&name, raw_format)?;
            formats.insert(name, format);
        }

        Ok(Self { formats })
    }

    pub fn formats(&self) -> impl Iterator<Item = &DocumentFormatConfig> {
        self.formats.values()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&DocumentFormatConfig> {
        self.formats.get(name)
    }
}

fn compile_format(name: &str, raw: RawFormat) -> Result<DocumentFormatConfig, ConfigError> {
    let chapter_source = non_empty(name, "chapter_marker", &raw.chapter_marker)?;
    let chapter_marker = Regex::new(&format!("^(?:{chapter_source})")).map_err(|source| {
        ConfigError::InvalidPattern {
            format: name.to_string(),
            field: "chapter_marker",
            source,
        }
    })?;

    let toc_anchor = lowercase_marker(name, raw.toc_anchor)?;
    let toc_overrides = raw
        .toc_overrides
        .into_iter()
        .map(|(stem, marker)| lowercase_marker(name, marker).map(|marker| (stem, marker)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let unwanted_prefixes = raw.unwanted_prefixes.unwrap_or_else(|| {
        DEFAULT_UNWANTED_PREFIXES
            .iter()
            .map(|prefix| prefix.to_string())
            .collect()
    });

    Ok(DocumentFormatConfig {
        name: name.to_string(),
        chapter_marker,
        target_marker: compile_marker(name, "target_marker", &raw.target_marker)?,
        principle_marker: compile_marker(name, "principle_marker", &raw.principle_marker)?,
        explanation_marker: compile_marker(name, "explanation_marker", &raw.explanation_marker)?,
        file_names: raw.file_names.into_iter().collect(),
        toc_anchor,
        toc_overrides,
        unwanted_prefixes,
    })
}

fn compile_marker(format: &str, field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    let pattern = non_empty(format, field, pattern)?;
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidPattern {
            format: format.to_string(),
            field,
            source,
        })
}

fn non_empty<'a>(format: &str, field: &'static str, pattern: &'a str) -> Result<&'a str, ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::EmptyPattern {
            format: format.to_string(),
            field,
        });
    }
    Ok(pattern)
}

// Normalized text is lower-case, so keywords are matched lower-case too.
fn lowercase_marker(format: &str, marker: TocMarker) -> Result<TocMarker, ConfigError> {
    let keyword = marker.keyword.to_lowercase();
    if keyword.is_empty() {
        return Err(ConfigError::EmptyTocKeyword {
            format: format.to_string(),
        });
    }
    Ok(TocMarker {
        keyword,
        anchor: marker.anchor,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const TEST_CONFIG: &str = r#"
[formats.format_1]
chapter_marker = '\d+(\.\d+)*\.? '
target_marker = 'ziel \d'
principle_marker = 'grundsatz( \d+|\n)|grundsätze'
explanation_marker = 'erläuterung(en)?(:|\n)'
file_names = ["duesseldorf-2018", "test_rplan"]

[formats.format_1.toc_anchor]
keyword = "Inhaltsverzeichnis"
anchor = "last"

[formats.format_1.toc_overrides.test_rplan]
keyword = "content"
anchor = "first"

[formats.format_2]
chapter_marker = 'kapitel \d+'
target_marker = 'z \d+'
principle_marker = 'g \d+'
explanation_marker = 'erläuterungen'
file_names = ["ruhr-2021"]
unwanted_prefixes = ["gemäß"]

[formats.format_2.toc_anchor]
keyword = "inhalt"
anchor = "first"
"#;

    pub(crate) fn test_registry() -> FormatRegistry {
        FormatRegistry::from_toml_str(TEST_CONFIG).expect("test config should load")
    }

    #[test]
    fn loads_formats_with_defaults_and_overrides() {
        let registry = test_registry();
        assert_eq!(registry.formats().count(), 2);

        let format_1 = registry.get("format_1").expect("format_1");
        assert_eq!(
            format_1.unwanted_prefixes,
            vec!["zu", "oder", "und", "nach"]
        );
        assert_eq!(format_1.toc_anchor.keyword, "inhaltsverzeichnis");
        assert_eq!(format_1.toc_anchor.anchor, TocAnchor::Last);
        assert_eq!(format_1.toc_marker_for("test_rplan").keyword, "content");
        assert_eq!(
            format_1.toc_marker_for("duesseldorf-2018").anchor,
            TocAnchor::Last
        );

        let format_2 = registry.get("format_2").expect("format_2");
        assert_eq!(format_2.unwanted_prefixes, vec!["gemäß"]);
    }

    #[test]
    fn in_body_markers_ignore_case_and_chapter_marker_is_line_anchored() {
        let registry = test_registry();
        let format_1 = registry.get("format_1").expect("format_1");

        assert!(format_1.target_marker.is_match("ZIEL 3"));
        assert!(format_1.explanation_marker.is_match("ERLÄUTERUNG:"));
        assert!(format_1.chapter_marker.is_match("1.1 chapter"));
        assert!(!format_1.chapter_marker.is_match("see 1.1 chapter"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let raw = TEST_CONFIG.replace("'ziel \\d'", "'ziel ('");
        let err = FormatRegistry::from_toml_str(&raw).expect_err("invalid regex should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidPattern {
                field: "target_marker",
                ..
            }
        ));
    }

    #[test]
    fn rejects_missing_marker_key() {
        let raw = TEST_CONFIG.replace("target_marker = 'ziel \\d'\n", "");
        let err = FormatRegistry::from_toml_str(&raw).expect_err("missing key should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn rejects_file_name_claimed_by_two_formats() {
        let raw = TEST_CONFIG.replace("[\"ruhr-2021\"]", "[\"ruhr-2021\", \"test_rplan\"]");
        let err = FormatRegistry::from_toml_str(&raw).expect_err("duplicate should fail");
        match err {
            ConfigError::DuplicateFileName {
                file_name,
                first,
                second,
            } => {
                assert_eq!(file_name, "test_rplan");
                assert_eq!(first, "format_1");
                assert_eq!(second, "format_2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_config_and_empty_keyword() {
        assert!(matches!(
            FormatRegistry::from_toml_str("[formats]\n"),
            Err(ConfigError::NoFormats)
        ));

        let raw = TEST_CONFIG.replace("keyword = \"inhalt\"", "keyword = \"\"");
        assert!(matches!(
            FormatRegistry::from_toml_str(&raw),
            Err(ConfigError::EmptyTocKeyword { .. })
        ));
    }
}

//! Parameter Extraction
//!
//! Pulls query parameters (language, tag) out of free-form request
//! text via an ordered rule list. Array order is priority order: the
//! first matching rule wins, so tests can enumerate rule coverage
//! independently of the planning loop.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Query parameters recognized in request text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub language: Option<String>,
    pub tag: Option<String>,
}

impl QueryParams {
    /// Convert to a tool input mapping. Unset fields are omitted
    /// entirely rather than sent as null.
    pub fn to_input(&self) -> Map<String, Value> {
        let mut input = Map::new();
        if let Some(lang) = &self.language {
            input.insert("language".to_string(), Value::String(lang.clone()));
        }
        if let Some(tag) = &self.tag {
            input.insert("tag".to_string(), Value::String(tag.clone()));
        }
        input
    }
}

/// Language keywords, checked in order; first match wins.
const LANGUAGE_RULES: &[(&str, &str)] = &[("德语", "de"), ("英语", "en")];

/// Category keywords. These outrank proficiency levels: a request
/// mentioning both "名词" and "A1" is tagged "名词".
const CATEGORY_RULES: &[&str] = &["名词", "动词", "形容词", "家具", "建筑"];

/// CEFR proficiency levels, matched case-insensitively.
const LEVEL_RULES: &[&str] = &["A1", "A2", "B1", "B2", "C1"];

/// Level regexes, compiled once from `LEVEL_RULES`.
fn level_regexes() -> &'static [(&'static str, Regex)] {
    static REGEXES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        LEVEL_RULES
            .iter()
            .filter_map(|level| {
                Regex::new(&format!("(?i){level}"))
                    .ok()
                    .map(|re| (*level, re))
            })
            .collect()
    })
}

fn explicit_tag_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(r"标签[：:]\s*([^\s,，]+)").ok())
        .as_ref()
}

/// Extract both parameters from request text.
pub fn extract_params(text: &str) -> QueryParams {
    QueryParams {
        language: extract_language(text),
        tag: extract_tag(text),
    }
}

/// Map a language mention to its ISO code.
pub fn extract_language(text: &str) -> Option<String> {
    LANGUAGE_RULES
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, code)| code.to_string())
}

/// Extract a tag from request text.
///
/// Priority order: an explicit `标签: <x>` marker, then category
/// keywords, then CEFR levels. Within each list the first match wins
/// and later rules are unreachable -- intentional, for reproducible
/// planning.
pub fn extract_tag(text: &str) -> Option<String> {
    if let Some(explicit) = extract_explicit_tag(text) {
        return Some(explicit);
    }

    if let Some(category) = CATEGORY_RULES.iter().find(|c| text.contains(*c)) {
        return Some((*category).to_string());
    }

    level_regexes()
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(level, _)| (*level).to_string())
}

/// A tag named explicitly with a `标签:` or `标签：` marker.
fn extract_explicit_tag(text: &str) -> Option<String> {
    explicit_tag_regex()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_with_level_tag() {
        let params = extract_params("分析德语A1单词");
        assert_eq!(params.language.as_deref(), Some("de"));
        assert_eq!(params.tag.as_deref(), Some("A1"));
    }

    #[test]
    fn test_level_tag_is_case_insensitive() {
        assert_eq!(extract_tag("show me b2 words").as_deref(), Some("B2"));
    }

    #[test]
    fn test_every_level_rule_compiles_and_matches() {
        assert_eq!(level_regexes().len(), LEVEL_RULES.len());
        for level in LEVEL_RULES {
            let lowered = level.to_lowercase();
            assert_eq!(extract_tag(&lowered).as_deref(), Some(*level));
        }
    }

    #[test]
    fn test_english_language() {
        assert_eq!(extract_language("统计英语词汇").as_deref(), Some("en"));
    }

    #[test]
    fn test_category_outranks_level() {
        // Both "名词" and "A1" are present; the category wins.
        assert_eq!(extract_tag("分析A1名词").as_deref(), Some("名词"));
    }

    #[test]
    fn test_explicit_marker_outranks_everything() {
        assert_eq!(
            extract_tag("分析名词, 标签: 高频").as_deref(),
            Some("高频")
        );
    }

    #[test]
    fn test_explicit_marker_fullwidth_colon() {
        assert_eq!(extract_tag("标签：家具").as_deref(), Some("家具"));
    }

    #[test]
    fn test_first_category_rule_wins() {
        assert_eq!(extract_tag("分析动词和形容词").as_deref(), Some("动词"));
    }

    #[test]
    fn test_no_match_yields_empty_params() {
        let params = extract_params("分析单词");
        assert_eq!(params, QueryParams::default());
        assert!(params.to_input().is_empty());
    }

    #[test]
    fn test_to_input_includes_only_set_fields() {
        let params = extract_params("德语单词");
        let input = params.to_input();
        assert_eq!(input.get("language").unwrap(), "de");
        assert!(!input.contains_key("tag"));
    }
}

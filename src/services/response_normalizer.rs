// src/services/response_normalizer.rs
//
// Response Normalizer
//
// Turns the inference service's free-form text into an InferenceResult.
//
// CRITICAL RULES:
// - Never fails: anything unparseable becomes InferenceResult::Invalid
// - Single place where "is this field usable" is decided; downstream code
//   only sees fully defaulted fields
// - Missing or mistyped fields default individually (partial structure is
//   still useful)

use log::{debug, warn};
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::{dedupe_terms, Category, InferenceResult, InferenceSignal};

const CATEGORY_KEYS: &[&str] = &["category", "type", "mediaCategory", "media_category"];
const IS_ANIME_KEYS: &[&str] = &["isAnime", "is_anime"];
const TITLE_KEYS: &[&str] = &["detectedTitle", "detected_title", "title"];
const CHARACTER_KEYS: &[&str] = &["characters", "detectedCharacters", "detected_characters"];
const GENRE_KEYS: &[&str] = &["genre"];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "confidenceScore", "confidence_score"];
const KEYWORD_KEYS: &[&str] = &["keywords", "tags"];
const SIMILAR_KEYS: &[&str] = &["similarTitles", "similar_titles", "recommendations"];

/// Placeholder strings models emit instead of null
const NULL_LIKE: &[&str] = &["null", "none", "unknown", "n/a", "na", "-"];

pub struct ResponseNormalizer {
    fence_pattern: Regex,
    markup_pattern: Regex,
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self {
            fence_pattern: Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap(),
            markup_pattern: Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(\s[^<>]*)?/?>").unwrap(),
        }
    }

    /// Normalize one raw response
    pub fn normalize(&self, raw_text: &str) -> InferenceResult {
        match self.extract_object(raw_text) {
            Some(object) => self.read_signal(&object),
            None => InferenceResult::Invalid,
        }
    }

    /// Strip code fences and surrounding prose, then parse the outermost
    /// JSON object. Markup around the object means we are looking at an
    /// error page or an HTML rendering, not an answer.
    fn extract_object(&self, raw_text: &str) -> Option<Map<String, Value>> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            debug!("Inference response was empty");
            return None;
        }

        let body = self
            .fence_pattern
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .unwrap_or(trimmed);

        let (start, end) = match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if end > start => (start, end),
            _ => {
                warn!("Inference response contains no JSON object");
                return None;
            }
        };

        let prefix = &body[..start];
        let suffix = &body[end + 1..];
        if self.markup_pattern.is_match(prefix) || self.markup_pattern.is_match(suffix) {
            warn!("Inference response is wrapped in markup");
            return None;
        }

        match serde_json::from_str::<Value>(&body[start..=end]) {
            Ok(Value::Object(object)) => Some(object),
            Ok(_) => None,
            Err(e) => {
                warn!("Inference response is not valid JSON: {}", e);
                None
            }
        }
    }

    fn read_signal(&self, object: &Map<String, Value>) -> InferenceResult {
        let recognized = [
            CATEGORY_KEYS,
            IS_ANIME_KEYS,
            TITLE_KEYS,
            CHARACTER_KEYS,
            GENRE_KEYS,
            CONFIDENCE_KEYS,
            KEYWORD_KEYS,
            SIMILAR_KEYS,
        ]
        .iter()
        .any(|keys| lookup(object, keys).is_some());

        if !recognized {
            warn!("Inference response has none of the expected fields");
            return InferenceResult::Invalid;
        }

        InferenceResult::Valid(InferenceSignal {
            category: read_category(object),
            detected_title: lookup(object, TITLE_KEYS).and_then(read_string),
            characters: lookup(object, CHARACTER_KEYS)
                .map(read_list)
                .unwrap_or_default(),
            genre: lookup(object, GENRE_KEYS).and_then(|v| match v {
                Value::Array(_) => read_list(v).into_iter().next(),
                _ => read_string(v),
            }),
            confidence: lookup(object, CONFIDENCE_KEYS)
                .map(read_confidence)
                .unwrap_or(0.0),
            keywords: lookup(object, KEYWORD_KEYS).map(read_list).unwrap_or_default(),
            similar_titles: lookup(object, SIMILAR_KEYS).map(read_list).unwrap_or_default(),
        })
    }
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// First present, non-null value among `keys`
fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn read_string(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() || NULL_LIKE.contains(&text.to_lowercase().as_str()) {
        return None;
    }
    Some(text.to_string())
}

/// Arrays of strings; a lone string counts as a one-element list
fn read_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => dedupe_terms(items.iter().filter_map(read_string)),
        Value::String(_) => read_string(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Numbers or numeric strings. Percentages (1 < c <= 100) are rescaled.
fn read_confidence(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(c) if c.is_nan() => 0.0,
        Some(c) if c > 1.0 && c <= 100.0 => c / 100.0,
        Some(c) => c.clamp(0.0, 1.0),
        None => 0.0,
    }
}

fn read_category(object: &Map<String, Value>) -> Category {
    let labelled = lookup(object, CATEGORY_KEYS)
        .and_then(|v| v.as_str())
        .map(Category::from_label)
        .unwrap_or(Category::Unknown);

    if labelled.is_known() {
        return labelled;
    }

    match lookup(object, IS_ANIME_KEYS) {
        Some(Value::Bool(true)) => Category::Anime,
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("true") => Category::Anime,
        _ => Category::Unknown,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(raw: &str) -> InferenceSignal {
        ResponseNormalizer::new()
            .normalize(raw)
            .into_signal()
            .expect("expected a valid signal")
    }

    fn is_invalid(raw: &str) -> bool {
        !ResponseNormalizer::new().normalize(raw).raw_valid()
    }

    #[test]
    fn test_plain_json() {
        let s = signal(
            r#"{"isAnime": true, "detectedTitle": "Spirited Away", "characters": ["Chihiro", "Haku"],
                "genre": "Fantasy", "confidence": 0.92, "keywords": ["spirits", "bathhouse"],
                "similarTitles": ["My Neighbor Totoro"]}"#,
        );
        assert_eq!(s.category, Category::Anime);
        assert_eq!(s.detected_title.as_deref(), Some("Spirited Away"));
        assert_eq!(s.characters, vec!["Chihiro".to_string(), "Haku".to_string()]);
        assert_eq!(s.genre.as_deref(), Some("Fantasy"));
        assert_eq!(s.confidence, 0.92);
        assert_eq!(s.similar_titles, vec!["My Neighbor Totoro".to_string()]);
    }

    #[test]
    fn test_code_fence_and_prose_are_stripped() {
        let s = signal(
            "Sure! Here is the analysis:\n```json\n{\"detectedTitle\": \"Akira\", \"confidence\": 0.7}\n```\nLet me know if you need more.",
        );
        assert_eq!(s.detected_title.as_deref(), Some("Akira"));
        assert_eq!(s.confidence, 0.7);
    }

    #[test]
    fn test_prose_without_fence() {
        let s = signal("The answer is {\"keywords\": [\"heist\"]} as requested.");
        assert_eq!(s.keywords, vec!["heist".to_string()]);
        assert!(s.detected_title.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let s = signal(r#"{"detectedTitle": "Paprika"}"#);
        assert_eq!(s.category, Category::Unknown);
        assert!(s.characters.is_empty());
        assert!(s.genre.is_none());
        assert_eq!(s.confidence, 0.0);
        assert!(s.keywords.is_empty());
    }

    #[test]
    fn test_mistyped_fields_default_individually() {
        let s = signal(
            r#"{"detectedTitle": 42, "characters": "Spike", "confidence": "85%", "keywords": {"a": 1}}"#,
        );
        assert!(s.detected_title.is_none());
        assert_eq!(s.characters, vec!["Spike".to_string()]);
        assert_eq!(s.confidence, 0.85);
        assert!(s.keywords.is_empty());
    }

    #[test]
    fn test_null_like_title() {
        let s = signal(r#"{"detected_title": "Unknown", "confidence": 0.1}"#);
        assert!(s.detected_title.is_none());
    }

    #[test]
    fn test_category_label_beats_is_anime() {
        let s = signal(r#"{"category": "live-action", "isAnime": true}"#);
        assert_eq!(s.category, Category::LiveAction);

        let s = signal(r#"{"category": "???", "isAnime": true}"#);
        assert_eq!(s.category, Category::Anime);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(signal(r#"{"confidence": 250}"#).confidence, 1.0);
        assert_eq!(signal(r#"{"confidence": -3}"#).confidence, 0.0);
        assert_eq!(signal(r#"{"confidence": 92}"#).confidence, 0.92);
    }

    #[test]
    fn test_list_entries_deduplicated() {
        let s = signal(r#"{"keywords": ["Mecha", "mecha", " ", "Pilots", null]}"#);
        assert_eq!(s.keywords, vec!["Mecha".to_string(), "Pilots".to_string()]);
    }

    #[test]
    fn test_truncated_json_is_invalid() {
        assert!(is_invalid(r#"{"detectedTitle": "Spirited Aw"#));
        assert!(is_invalid(r#"{"detectedTitle": "Spirited Away", "keywords": [}"#));
    }

    #[test]
    fn test_html_wrapped_json_is_invalid() {
        assert!(is_invalid(
            "<html><body><pre>{\"detectedTitle\": \"Spirited Away\"}</pre></body></html>"
        ));
        assert!(is_invalid("<p>{\"confidence\": 0.5}</p>"));
    }

    #[test]
    fn test_non_object_and_empty_are_invalid() {
        assert!(is_invalid(""));
        assert!(is_invalid("   \n  "));
        assert!(is_invalid("I could not identify this image."));
        assert!(is_invalid("[1, 2, 3]"));
        assert!(is_invalid("```\nnot json\n```"));
    }

    #[test]
    fn test_unrecognized_object_is_invalid() {
        assert!(is_invalid(r#"{"error": {"code": 429, "message": "quota"}}"#));
    }
}

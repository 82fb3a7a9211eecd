// src/domain/inference/value_objects.rs
//
// Normalized output of the external inference service.
//
// The response normalizer is the only producer of these types. Downstream code
// pattern-matches on InferenceResult instead of re-checking the raw shape.

use serde::{Deserialize, Serialize};

use crate::domain::resolution::{Category, CategoryHint};

/// Outcome of normalizing one raw inference response.
///
/// `Invalid` means "no signal". It is not the same thing as a valid answer
/// with zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InferenceResult {
    Valid(InferenceSignal),
    Invalid,
}

/// A fully defaulted, non-optional view of what the oracle said
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceSignal {
    pub category: Category,
    pub detected_title: Option<String>,
    pub characters: Vec<String>,
    pub genre: Option<String>,

    /// Oracle's self-reported confidence, clamped to [0.0, 1.0]
    pub confidence: f64,

    pub keywords: Vec<String>,
    pub similar_titles: Vec<String>,
}

impl InferenceResult {
    /// True when normalization succeeded
    pub fn raw_valid(&self) -> bool {
        matches!(self, InferenceResult::Valid(_))
    }

    pub fn signal(&self) -> Option<&InferenceSignal> {
        match self {
            InferenceResult::Valid(signal) => Some(signal),
            InferenceResult::Invalid => None,
        }
    }

    pub fn into_signal(self) -> Option<InferenceSignal> {
        match self {
            InferenceResult::Valid(signal) => Some(signal),
            InferenceResult::Invalid => None,
        }
    }
}

impl InferenceSignal {
    /// A known category reported with nonzero confidence
    pub fn has_category_signal(&self) -> bool {
        self.category.is_known() && self.confidence > 0.0
    }

    /// Whether the signal carries anything a catalog search can use
    pub fn is_usable(&self) -> bool {
        self.detected_title.is_some()
            || !self.keywords.is_empty()
            || !self.similar_titles.is_empty()
            || self.has_category_signal()
    }

    /// Category hint derived from this signal
    pub fn to_hint(&self) -> CategoryHint {
        let mut keywords = self.keywords.clone();
        if let Some(genre) = &self.genre {
            keywords.push(genre.clone());
        }
        CategoryHint::inferred(self.category, keywords, self.confidence)
    }

    /// Every term a catalog entry may be matched against when scoring:
    /// the detected title, characters, keywords and similar titles.
    pub fn scoring_terms(&self) -> Vec<String> {
        self.detected_title
            .iter()
            .chain(self.characters.iter())
            .chain(self.keywords.iter())
            .chain(self.similar_titles.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_has_no_signal() {
        let result = InferenceResult::Invalid;
        assert!(!result.raw_valid());
        assert!(result.signal().is_none());
    }

    #[test]
    fn test_zero_confidence_is_still_valid() {
        let result = InferenceResult::Valid(InferenceSignal::default());
        assert!(result.raw_valid());
        assert!(!result.signal().unwrap().has_category_signal());
        assert!(!result.signal().unwrap().is_usable());
    }

    #[test]
    fn test_to_hint_carries_genre() {
        let signal = InferenceSignal {
            category: Category::Anime,
            genre: Some("Fantasy".to_string()),
            confidence: 0.8,
            keywords: vec!["spirits".to_string()],
            ..Default::default()
        };
        let hint = signal.to_hint();
        assert!(hint.is_confident());
        assert_eq!(hint.keywords, vec!["spirits".to_string(), "Fantasy".to_string()]);
    }
}

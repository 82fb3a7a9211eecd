// src/services/relevance_scorer.rs
//
// Relevance Scorer
//
// Deterministic weighted sum over substring and rating heuristics:
// - title_match_weight per target term found in the title
// - synopsis_match_weight per occurrence of a target term in the synopsis
// - high_rating_bonus above high_rating_threshold, otherwise
//   secondary_rating_bonus above secondary_rating_threshold
// - detected_title_weight once when the title equals or contains the
//   oracle's detected title

use std::cmp::Ordering;

use crate::config::ScoringWeights;
use crate::domain::{dedupe_terms, CatalogEntry, CategoryHint, InferenceSignal};

/// Terms shorter than this match too much noise to be meaningful
const MIN_TERM_LEN: usize = 2;

/// What a catalog entry is scored against: the active hint's keywords,
/// plus the oracle's title/characters/keywords when inference was used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringTarget {
    terms: Vec<String>,

    /// Normalized oracle title, when inference named one
    detected_title: Option<String>,
}

impl ScoringTarget {
    pub fn from_hint(hint: &CategoryHint) -> Self {
        Self::from_terms(hint.keywords.iter())
    }

    pub fn from_signal(signal: &InferenceSignal, hint: &CategoryHint) -> Self {
        let terms = signal.scoring_terms();
        let mut target = Self::from_terms(terms.iter().chain(hint.keywords.iter()));
        target.detected_title = signal
            .detected_title
            .as_deref()
            .map(normalize_title)
            .filter(|title| title.chars().count() >= MIN_TERM_LEN);
        target
    }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = dedupe_terms(terms)
            .into_iter()
            .map(|t| t.to_lowercase())
            .filter(|t| t.chars().count() >= MIN_TERM_LEN)
            .collect();
        Self {
            terms,
            detected_title: None,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn detected_title(&self) -> Option<&str> {
        self.detected_title.as_deref()
    }

    /// Whether the entry's title equals or contains the detected title
    pub fn matches_detected_title(&self, entry: &CatalogEntry) -> bool {
        match &self.detected_title {
            Some(detected) => {
                let padded = format!(" {} ", normalize_title(&entry.title));
                padded.contains(&format!(" {} ", detected))
            }
            None => false,
        }
    }
}

/// Lowercase, punctuation folded to spaces, whitespace collapsed
fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct RelevanceScorer {
    weights: ScoringWeights,
}

impl RelevanceScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Score one entry against a target
    pub fn score(&self, entry: &CatalogEntry, target: &ScoringTarget) -> f64 {
        let title = entry.title.to_lowercase();
        let synopsis = entry.synopsis.to_lowercase();

        let mut score = 0.0;
        for term in target.terms() {
            if title.contains(term.as_str()) {
                score += self.weights.title_match_weight;
            }
            let occurrences = synopsis.matches(term.as_str()).count();
            score += occurrences as f64 * self.weights.synopsis_match_weight;
        }

        if target.matches_detected_title(entry) {
            score += self.weights.detected_title_weight;
        }

        score + self.rating_bonus(entry.rating)
    }

    fn rating_bonus(&self, rating: f64) -> f64 {
        if rating > self.weights.high_rating_threshold {
            self.weights.high_rating_bonus
        } else if rating > self.weights.secondary_rating_threshold {
            self.weights.secondary_rating_bonus
        } else {
            0.0
        }
    }

    /// Tie-break for equal scores: higher popularity first, then lower
    /// catalog identity. Total, so sorting is fully deterministic.
    pub fn tie_break(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        b.popularity
            .total_cmp(&a.popularity)
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogId, Category, HintStrength};

    fn entry(id: u64, title: &str, synopsis: &str, rating: f64) -> CatalogEntry {
        CatalogEntry::new(CatalogId::movie(id), title, synopsis).with_rating(rating)
    }

    #[test]
    fn test_title_and_synopsis_weights() {
        let scorer = RelevanceScorer::default();
        let target = ScoringTarget::from_terms(["demon", "slayer"]);
        let e = entry(
            1,
            "Demon Slayer: Mugen Train",
            "A demon hunts. Another demon appears.",
            5.0,
        );
        // title: demon +3, slayer +3; synopsis: demon x2 = +2
        assert_eq!(scorer.score(&e, &target), 8.0);
    }

    #[test]
    fn test_rating_bonus_tiers() {
        let scorer = RelevanceScorer::default();
        let empty = ScoringTarget::default();
        assert_eq!(scorer.score(&entry(1, "x", "", 8.0), &empty), 2.0);
        assert_eq!(scorer.score(&entry(1, "x", "", 7.5), &empty), 1.0);
        assert_eq!(scorer.score(&entry(1, "x", "", 6.5), &empty), 1.0);
        assert_eq!(scorer.score(&entry(1, "x", "", 6.0), &empty), 0.0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let scorer = RelevanceScorer::default();
        let target = ScoringTarget::from_terms(["Spirited Away"]);
        assert_eq!(scorer.score(&entry(1, "SPIRITED AWAY", "", 0.0), &target), 3.0);
    }

    #[test]
    fn test_short_terms_ignored() {
        let target = ScoringTarget::from_terms(["a", "ok", "x"]);
        assert_eq!(target.terms(), &["ok".to_string()]);
    }

    #[test]
    fn test_target_from_signal_includes_title_and_hint_keywords() {
        let signal = InferenceSignal {
            detected_title: Some("Akira".to_string()),
            characters: vec!["Kaneda".to_string()],
            keywords: vec!["cyberpunk".to_string()],
            ..Default::default()
        };
        let hint = CategoryHint::heuristic(
            Category::Anime,
            vec!["anime".to_string(), "akira".to_string()],
            HintStrength::Low,
            0.2,
        );
        let target = ScoringTarget::from_signal(&signal, &hint);
        assert_eq!(
            target.terms(),
            &["akira".to_string(), "kaneda".to_string(), "cyberpunk".to_string(), "anime".to_string()]
        );
    }

    fn spirited_away_target() -> ScoringTarget {
        let signal = InferenceSignal {
            detected_title: Some("Spirited Away".to_string()),
            keywords: vec!["Studio Ghibli".to_string(), "spirits".to_string()],
            ..Default::default()
        };
        ScoringTarget::from_signal(&signal, &CategoryHint::unknown())
    }

    #[test]
    fn test_detected_title_match_is_word_aligned() {
        let target = spirited_away_target();
        assert_eq!(target.detected_title(), Some("spirited away"));
        assert!(target.matches_detected_title(&entry(1, "Spirited Away", "", 0.0)));
        assert!(target.matches_detected_title(&entry(2, "Spirited Away: Live on Stage", "", 0.0)));
        assert!(!target.matches_detected_title(&entry(3, "Studio Ghibli: Spirits", "", 0.0)));
        assert!(!target.matches_detected_title(&entry(4, "Dispirited Awayday", "", 0.0)));
    }

    #[test]
    fn test_detected_title_weight_added_once() {
        let scorer = RelevanceScorer::default();
        // title term +3, detected title +5, rating 8.5 +2
        assert_eq!(
            scorer.score(&entry(1, "Spirited Away", "", 8.5), &spirited_away_target()),
            10.0
        );
        assert!(!ScoringTarget::from_terms(["spirited away"])
            .matches_detected_title(&entry(1, "Spirited Away", "", 8.5)));
    }

    #[test]
    fn test_tie_break_popularity_then_id() {
        let a = entry(2, "a", "", 0.0).with_popularity(10.0);
        let b = entry(1, "b", "", 0.0).with_popularity(20.0);
        let c = entry(3, "c", "", 0.0).with_popularity(20.0);
        assert_eq!(RelevanceScorer::tie_break(&b, &a), Ordering::Less);
        assert_eq!(RelevanceScorer::tie_break(&b, &c), Ordering::Less);
        assert_eq!(RelevanceScorer::tie_break(&a, &a), Ordering::Equal);
    }
}

// src/services/prefilter_service.rs
//
// Heuristic Pre-Filter
//
// Cheap, local category guess from artifact metadata only.
//
// CRITICAL RULES:
// - Never calls an external service
// - Never fails
// - Reads metadata (filename, declared type, size), never content bytes
// - Bounded work: at most `max_tokens` tokens are inspected

use regex::Regex;
use std::path::Path;

use crate::config::{ConfidencePolicy, PrefilterConfig};
use crate::domain::{Artifact, ArtifactKind, Category, CategoryHint, HintStrength};

/// Confidence carried by a hint backed by a single weak indicator
const LOW_HINT_CONFIDENCE: f64 = 0.2;

/// Result of evaluating one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct PrefilterReport {
    pub hint: CategoryHint,

    /// Count of weak signals supporting the hint's category
    pub indicator_score: u32,

    /// Lexicon terms found in the metadata, in source order
    pub matched_terms: Vec<String>,

    /// Whether the declared type and size look like a lossless screenshot
    pub screenshot_signal: bool,
}

/// Deterministic, lexicon-based pre-filter
pub struct HeuristicPrefilter {
    token_pattern: Regex,
    lexicon: Vec<(Category, Vec<&'static str>)>,
    config: PrefilterConfig,
    policy: ConfidencePolicy,
}

impl HeuristicPrefilter {
    pub fn new(config: PrefilterConfig, policy: ConfidencePolicy) -> Self {
        Self {
            token_pattern: Regex::new(r"[[:alnum:]]+").unwrap(),
            // Order doubles as the tie-break between equally scored categories
            lexicon: vec![
                (
                    Category::Anime,
                    vec![
                        "anime", "manga", "otaku", "shonen", "shounen", "shojo", "shoujo",
                        "seinen", "isekai", "mecha", "chibi", "senpai", "sensei", "waifu",
                        "ghibli", "miyazaki", "naruto", "goku", "dragonball", "pokemon",
                        "pikachu", "luffy", "demon", "slayer", "kimetsu", "tanjiro", "jujutsu",
                        "kaisen", "titan", "bleach", "evangelion", "totoro", "gundam",
                        "crunchyroll", "cosplay",
                    ],
                ),
                (
                    Category::Animation,
                    vec![
                        "pixar", "disney", "dreamworks", "cartoon", "toon", "animated", "cgi",
                        "shrek", "simpsons", "minions", "frozen",
                    ],
                ),
                (
                    Category::LiveAction,
                    vec![
                        "film", "movie", "actor", "actress", "scene", "still", "trailer", "imdb",
                        "premiere", "screencap",
                    ],
                ),
            ],
            config,
            policy,
        }
    }

    /// Produce the provisional category hint for an artifact
    pub fn prefilter(&self, artifact: &Artifact) -> CategoryHint {
        self.evaluate(artifact).hint
    }

    /// Full evaluation, including the indicator score behind the hint
    pub fn evaluate(&self, artifact: &Artifact) -> PrefilterReport {
        let tokens = self.tokenize(artifact);
        let screenshot_signal = self.is_screenshot_sized(artifact);

        let mut best: Option<(Category, u32, Vec<usize>)> = None;
        for (category, terms) in &self.lexicon {
            let positions: Vec<usize> = tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| terms.contains(&token.as_str()))
                .map(|(idx, _)| idx)
                .collect();

            let mut score = distinct_count(&tokens, &positions);
            if screenshot_signal && *category == Category::Anime {
                score += 1;
            }

            let better = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => score > 0,
            };
            if better {
                best = Some((*category, score, positions));
            }
        }

        let Some((category, indicator_score, positions)) = best else {
            return PrefilterReport {
                hint: CategoryHint::unknown(),
                indicator_score: 0,
                matched_terms: Vec::new(),
                screenshot_signal,
            };
        };

        let matched_terms: Vec<String> = positions.iter().map(|&i| tokens[i].clone()).collect();
        let keywords = keyword_set(&tokens, &positions);

        let hint = if indicator_score >= self.config.confident_indicator_score {
            CategoryHint::heuristic(
                category,
                keywords,
                HintStrength::Confident,
                self.policy.heuristic_confident,
            )
        } else {
            CategoryHint::heuristic(category, keywords, HintStrength::Low, LOW_HINT_CONFIDENCE)
        };

        PrefilterReport {
            hint,
            indicator_score,
            matched_terms,
            screenshot_signal,
        }
    }

    /// Lowercased alphanumeric tokens of the filename stem (images) or the
    /// description (text), capped at `max_tokens`.
    fn tokenize(&self, artifact: &Artifact) -> Vec<String> {
        let Some(source) = artifact.token_source() else {
            return Vec::new();
        };

        let source = match artifact.kind() {
            ArtifactKind::Image => Path::new(source)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(source),
            ArtifactKind::Text => source,
        };

        self.token_pattern
            .find_iter(source)
            .take(self.config.max_tokens)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Lossless, screenshot-sized images are weak evidence of drawn content
    fn is_screenshot_sized(&self, artifact: &Artifact) -> bool {
        if artifact.kind() != ArtifactKind::Image {
            return false;
        }
        let metadata = artifact.metadata();
        let lossless = matches!(
            metadata.media_type.as_deref(),
            Some("image/png") | Some("image/webp") | Some("image/gif")
        );
        lossless && metadata.byte_size > 0 && metadata.byte_size <= self.config.screenshot_max_bytes
    }
}

impl Default for HeuristicPrefilter {
    fn default() -> Self {
        Self::new(PrefilterConfig::default(), ConfidencePolicy::default())
    }
}

fn distinct_count(tokens: &[String], positions: &[usize]) -> u32 {
    let mut seen: Vec<&str> = Vec::new();
    for &i in positions {
        if !seen.contains(&tokens[i].as_str()) {
            seen.push(&tokens[i]);
        }
    }
    seen.len() as u32
}

/// Adjacent matches are joined into phrases placed first ("demon slayer"),
/// followed by the individual matched tokens.
fn keyword_set(tokens: &[String], positions: &[usize]) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut run: Vec<usize> = Vec::new();

    for &pos in positions {
        if run.last().map(|&last| last + 1 == pos).unwrap_or(true) {
            run.push(pos);
        } else {
            phrases.extend(phrase_from_run(tokens, &run));
            run = vec![pos];
        }
    }
    phrases.extend(phrase_from_run(tokens, &run));

    phrases
        .into_iter()
        .chain(positions.iter().map(|&i| tokens[i].clone()))
        .collect()
}

/// A phrase needs at least two distinct words
fn phrase_from_run(tokens: &[String], run: &[usize]) -> Option<String> {
    let mut words: Vec<&str> = Vec::new();
    for &i in run {
        if words.last() != Some(&tokens[i].as_str()) {
            words.push(&tokens[i]);
        }
    }
    (words.len() > 1).then(|| words.join(" "))
}

// ============================================================================
// TESTS
// ============================================================================

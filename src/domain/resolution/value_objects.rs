// src/domain/resolution/value_objects.rs
//
// Resolution Value Objects
//
// Pure, immutable data structures describing a single resolution: the active
// category hint, the catalog queries derived from it, the ranked candidates
// and the final result handed to the caller.
//
// CRITICAL INVARIANTS:
// - Everything here is request-scoped; nothing is persisted
// - candidates.len() <= MAX_CANDIDATES
// - confidence is always within [0.0, 1.0]
// - No two candidates share a catalog identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::CatalogEntry;

/// Hard upper bound on the number of candidates returned to the caller
pub const MAX_CANDIDATES: usize = 5;

// ============================================================================
// CATEGORY HINT
// ============================================================================

/// Provisional classification of what an artifact depicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Anime,
    LiveAction,
    Animation,
    #[default]
    Unknown,
}

impl Category {
    /// Parse a loosely formatted category label ("Live Action", "anime", "cartoon")
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();

        match normalized.as_str() {
            "anime" | "manga" | "japaneseanimation" => Category::Anime,
            "liveaction" | "film" | "movie" | "tv" | "series" | "live" => Category::LiveAction,
            "animation" | "animated" | "cartoon" | "westernanimation" => Category::Animation,
            _ => Category::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Anime => write!(f, "anime"),
            Category::LiveAction => write!(f, "live-action"),
            Category::Animation => write!(f, "animation"),
            Category::Unknown => write!(f, "unknown"),
        }
    }
}

/// Which stage produced a hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintSource {
    Heuristic,
    Inference,
}

impl std::fmt::Display for HintSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HintSource::Heuristic => write!(f, "heuristic"),
            HintSource::Inference => write!(f, "inference"),
        }
    }
}

/// How strongly the indicators support the hint's category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintStrength {
    Confident,
    Low,
    None,
}

/// The single active classification for a resolution.
///
/// A later hint replaces an earlier one only if its confidence is not lower,
/// see [`CategoryHint::supersede`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryHint {
    pub category: Category,

    /// Ordered, duplicate-free keyword set
    pub keywords: Vec<String>,

    pub source: HintSource,
    pub strength: HintStrength,
    pub confidence: f64,
}

impl CategoryHint {
    /// A heuristic hint with no category signal
    pub fn unknown() -> Self {
        Self {
            category: Category::Unknown,
            keywords: Vec::new(),
            source: HintSource::Heuristic,
            strength: HintStrength::None,
            confidence: 0.0,
        }
    }

    pub fn heuristic(
        category: Category,
        keywords: Vec<String>,
        strength: HintStrength,
        confidence: f64,
    ) -> Self {
        Self {
            category,
            keywords: dedupe_terms(keywords),
            source: HintSource::Heuristic,
            strength,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn inferred(category: Category, keywords: Vec<String>, confidence: f64) -> Self {
        let strength = if category.is_known() && confidence > 0.0 {
            HintStrength::Confident
        } else {
            HintStrength::None
        };

        Self {
            category,
            keywords: dedupe_terms(keywords),
            source: HintSource::Inference,
            strength,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_confident(&self) -> bool {
        self.strength == HintStrength::Confident && self.category.is_known()
    }

    /// Returns the hint that should be active after `later` arrives.
    pub fn supersede(self, later: CategoryHint) -> CategoryHint {
        if later.confidence >= self.confidence {
            later
        } else {
            self
        }
    }
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn dedupe_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for term in terms {
        let trimmed = term.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            result.push(trimmed.to_string());
        }
    }
    result
}

// ============================================================================
// CATALOG QUERY
// ============================================================================

/// One query issued to the media catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum CatalogQuery {
    Text(String),
    Trending,
    Popular,
}

impl CatalogQuery {
    pub fn text(query: impl Into<String>) -> Self {
        CatalogQuery::Text(query.into())
    }
}

impl std::fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogQuery::Text(text) => write!(f, "\"{}\"", text),
            CatalogQuery::Trending => write!(f, "trending"),
            CatalogQuery::Popular => write!(f, "popular"),
        }
    }
}

// ============================================================================
// RANKED CANDIDATE
// ============================================================================

/// A deduplicated, scored catalog entry. Computed fresh per resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub entry: CatalogEntry,
    pub score: f64,

    /// 1-based position in the final list
    pub rank: usize,

    /// The highest-priority query that returned this entry
    pub matched_query: CatalogQuery,
}

// ============================================================================
// RESOLUTION CONFIDENCE
// ============================================================================

/// Self-reported certainty in the top result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResolutionConfidence {
    /// Score from 0.0 (no confidence) to 1.0 (absolute certainty)
    score: f64,
}

impl ResolutionConfidence {
    /// Creates a new confidence score, clamped to [0.0, 1.0]. NaN maps to 0.0.
    pub fn new(score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score };
        Self {
            score: score.clamp(0.0, 1.0),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn none() -> Self {
        Self::new(0.0)
    }
}

impl PartialEq for ResolutionConfidence {
    fn eq(&self, other: &Self) -> bool {
        (self.score - other.score).abs() < f64::EPSILON
    }
}

impl std::fmt::Display for ResolutionConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.score * 100.0)
    }
}

// ============================================================================
// RESOLUTION STATE MACHINE
// ============================================================================

/// States of the resolution cascade.
///
/// INIT -> PREFILTERED -> (INFERRED | INFERENCE_SKIPPED) -> SEARCHED -> DONE,
/// with DEGRADED reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Init,
    Prefiltered,
    Inferred,
    InferenceSkipped,
    Searched,
    Done,
    Degraded,
}

impl ResolutionState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(&self, next: ResolutionState) -> bool {
        use ResolutionState::*;
        match (self, next) {
            (Done, _) | (Degraded, _) => false,
            (_, Degraded) => true,
            (Init, Prefiltered) => true,
            (Prefiltered, Inferred) | (Prefiltered, InferenceSkipped) => true,
            (Inferred, Searched) | (InferenceSkipped, Searched) => true,
            (Searched, Done) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionState::Done | ResolutionState::Degraded)
    }
}

impl std::fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionState::Init => write!(f, "INIT"),
            ResolutionState::Prefiltered => write!(f, "PREFILTERED"),
            ResolutionState::Inferred => write!(f, "INFERRED"),
            ResolutionState::InferenceSkipped => write!(f, "INFERENCE_SKIPPED"),
            ResolutionState::Searched => write!(f, "SEARCHED"),
            ResolutionState::Done => write!(f, "DONE"),
            ResolutionState::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// Caller-facing summary of how the resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved,
    Degraded,
}

// ============================================================================
// RESOLUTION RESULT (TOP-LEVEL OUTCOME)
// ============================================================================

/// The final output of one `resolve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The artifact this result describes
    pub artifact_id: Uuid,

    /// At most MAX_CANDIDATES, best first
    pub candidates: Vec<RankedCandidate>,

    pub confidence: ResolutionConfidence,

    /// Ordered, human-readable trail of which cascade branches fired
    pub explanation: Vec<String>,

    pub outcome: ResolutionOutcome,

    /// Every state visited, in order
    pub states: Vec<ResolutionState>,

    /// Every catalog query issued, in priority order
    pub queries: Vec<CatalogQuery>,

    /// When the artifact was submitted
    pub submitted_at: DateTime<Utc>,

    pub resolved_at: DateTime<Utc>,
}

impl ResolutionResult {
    pub fn is_degraded(&self) -> bool {
        self.outcome == ResolutionOutcome::Degraded
    }

    pub fn top(&self) -> Option<&RankedCandidate> {
        self.candidates.first()
    }

    pub fn visited(&self, state: ResolutionState) -> bool {
        self.states.contains(&state)
    }
}

// ============================================================================
// TESTS
// ============================================================================

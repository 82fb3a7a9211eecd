// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are UI-friendly representations
// - DTOs NEVER leak domain invariants
// - DTOs are simple, serializable structs
// - Conversion FROM domain values only (never TO)

use serde::{Deserialize, Serialize};

use crate::domain::{RankedCandidate, ResolutionOutcome, ResolutionResult};

// ============================================================================
// REQUEST DTOs
// ============================================================================

/// An artifact as submitted by the UI.
///
/// `kind` is `"image"` (with `data_base64`) or `"text"` (with `text`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveArtifactDto {
    pub kind: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub data_base64: Option<String>,
    pub text: Option<String>,
}

// ============================================================================
// RESULT DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCandidateDto {
    pub rank: usize,
    pub catalog_id: String,
    pub media_type: String,
    pub title: String,
    pub synopsis: String,
    pub rating: f64,
    pub popularity: f64,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub score: f64,
    pub matched_query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResultDto {
    pub artifact_id: String,
    pub candidates: Vec<RankedCandidateDto>,
    pub confidence: f64,
    pub explanation: Vec<String>,
    pub degraded: bool,
    pub states: Vec<String>,
    pub queries: Vec<String>,
    pub submitted_at: String,
    pub resolved_at: String,

    /// Time between submission and result
    pub elapsed_ms: i64,
}

// ============================================================================
// CONVERSIONS (Domain → DTO)
// ============================================================================

impl From<RankedCandidate> for RankedCandidateDto {
    fn from(candidate: RankedCandidate) -> Self {
        let entry = candidate.entry;
        Self {
            rank: candidate.rank,
            catalog_id: entry.id.to_string(),
            media_type: entry.id.media_type.to_string(),
            title: entry.title,
            synopsis: entry.synopsis,
            rating: entry.rating,
            popularity: entry.popularity,
            release_date: entry.release_date,
            poster_path: entry.poster_path,
            score: candidate.score,
            matched_query: candidate.matched_query.to_string(),
        }
    }
}

impl From<ResolutionResult> for ResolutionResultDto {
    fn from(result: ResolutionResult) -> Self {
        Self {
            artifact_id: result.artifact_id.to_string(),
            candidates: result
                .candidates
                .into_iter()
                .map(RankedCandidateDto::from)
                .collect(),
            confidence: result.confidence.score(),
            explanation: result.explanation,
            degraded: result.outcome == ResolutionOutcome::Degraded,
            states: result.states.iter().map(|s| s.to_string()).collect(),
            queries: result.queries.iter().map(|q| q.to_string()).collect(),
            submitted_at: result.submitted_at.to_rfc3339(),
            resolved_at: result.resolved_at.to_rfc3339(),
            elapsed_ms: (result.resolved_at - result.submitted_at).num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CatalogEntry, CatalogId, CatalogQuery, ResolutionConfidence, ResolutionState,
    };
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_result_dto_flattens_domain_values() {
        let submitted_at = Utc::now();
        let result = ResolutionResult {
            artifact_id: Uuid::new_v4(),
            candidates: vec![RankedCandidate {
                entry: CatalogEntry::new(CatalogId::tv(85937), "Demon Slayer", "Tanjiro...")
                    .with_rating(8.7),
                score: 11.0,
                rank: 1,
                matched_query: CatalogQuery::text("demon slayer"),
            }],
            confidence: ResolutionConfidence::new(0.45),
            explanation: vec!["Pre-filter: anime (confident, 3 indicators)".to_string()],
            outcome: ResolutionOutcome::Resolved,
            states: vec![ResolutionState::Init, ResolutionState::Prefiltered],
            queries: vec![CatalogQuery::text("demon slayer"), CatalogQuery::Trending],
            submitted_at,
            resolved_at: submitted_at + Duration::milliseconds(1250),
        };

        let dto = ResolutionResultDto::from(result);
        assert_eq!(dto.candidates[0].catalog_id, "tv:85937");
        assert_eq!(dto.candidates[0].media_type, "tv");
        assert_eq!(dto.candidates[0].matched_query, "\"demon slayer\"");
        assert_eq!(dto.confidence, 0.45);
        assert!(!dto.degraded);
        assert_eq!(dto.states, vec!["INIT", "PREFILTERED"]);
        assert_eq!(dto.queries[1], "trending");
        assert_eq!(dto.submitted_at, submitted_at.to_rfc3339());
        assert_eq!(dto.elapsed_ms, 1250);
    }

    #[test]
    fn test_request_dto_accepts_missing_optionals() {
        let dto: ResolveArtifactDto =
            serde_json::from_str(r#"{"kind":"text","file_name":null,"mime_type":null,"data_base64":null,"text":"cozy heist"}"#)
                .unwrap();
        assert_eq!(dto.kind, "text");
        assert_eq!(dto.text.as_deref(), Some("cozy heist"));
    }
}

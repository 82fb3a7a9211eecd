// src/services/resolution_service.rs
//
// Resolution Service
//
// The resolution controller: turns one artifact into a ranked, explained
// list of catalog candidates by walking the cascade
//
//   INIT -> PREFILTERED -> (INFERRED | INFERENCE_SKIPPED) -> SEARCHED -> DONE
//
// with DEGRADED reachable whenever the catalog is unreachable for every query.
//
// CRITICAL RULES:
// - resolve() never returns an error; failures become explanation entries
// - Zero retries: a failed call advances to the next fallback branch
// - The inference service is never called when it reports itself unconfigured
// - Confidence without inference is always strictly below confidence with it
// - Request-scoped: no state survives a call, concurrent calls are independent

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::domain::{
    dedupe_terms, validate_artifact, Artifact, CatalogQuery, Category, CategoryHint, DomainError,
    DomainResult, HintSource, HintStrength, InferenceResult, InferenceSignal, RankedCandidate,
    ResolutionConfidence, ResolutionOutcome, ResolutionResult, ResolutionState,
};
use crate::error::AppError;
use crate::integrations::{InferenceService, MediaCatalogClient};
use crate::services::prefilter_service::HeuristicPrefilter;
use crate::services::relevance_scorer::{RelevanceScorer, ScoringTarget};
use crate::services::response_normalizer::ResponseNormalizer;
use crate::services::search_aggregator::{SearchAggregator, SearchBatch};

/// Upper bound on oracle keywords turned into queries
const MAX_KEYWORD_QUERIES: usize = 4;

/// Upper bound on oracle similar titles turned into queries
const MAX_SIMILAR_QUERIES: usize = 3;

/// Last-resort stage, run only when every earlier query came back empty
const FALLBACK_QUERIES: [CatalogQuery; 2] = [CatalogQuery::Trending, CatalogQuery::Popular];

// ============================================================================
// RESOLUTION TRAIL
// ============================================================================

/// States visited and explanation lines, threaded through one resolution
#[derive(Debug)]
struct Trail {
    state: ResolutionState,
    states: Vec<ResolutionState>,
    explanation: Vec<String>,
}

impl Trail {
    fn new() -> Self {
        Self {
            state: ResolutionState::Init,
            states: vec![ResolutionState::Init],
            explanation: Vec::new(),
        }
    }

    fn advance(&mut self, next: ResolutionState) -> DomainResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        debug!("Resolution state {} -> {}", self.state, next);
        self.state = next;
        self.states.push(next);
        Ok(())
    }

    fn note(&mut self, line: impl Into<String>) {
        let line = line.into();
        debug!("{}", line);
        self.explanation.push(line);
    }
}

/// Which branch produced the active hint and query list
enum Branch {
    Inferred(InferenceSignal),
    Skipped,
}

// ============================================================================
// RESOLUTION SERVICE
// ============================================================================

pub struct ResolutionService {
    config: ResolverConfig,
    prefilter: HeuristicPrefilter,
    normalizer: ResponseNormalizer,
    aggregator: SearchAggregator,
    inference: Option<Arc<dyn InferenceService>>,
}

impl ResolutionService {
    pub fn new(
        config: ResolverConfig,
        catalog: Arc<dyn MediaCatalogClient>,
        inference: Option<Arc<dyn InferenceService>>,
    ) -> Self {
        let aggregator = SearchAggregator::new(
            catalog,
            config.catalog.timeout(),
            RelevanceScorer::new(config.scoring.clone()),
            config.candidate_limit(),
        );

        Self {
            prefilter: HeuristicPrefilter::new(config.prefilter.clone(), config.confidence.clone()),
            normalizer: ResponseNormalizer::new(),
            aggregator,
            inference,
            config,
        }
    }

    /// Resolution without any inference service
    pub fn heuristic_only(config: ResolverConfig, catalog: Arc<dyn MediaCatalogClient>) -> Self {
        Self::new(config, catalog, None)
    }

    pub fn inference_configured(&self) -> bool {
        self.inference
            .as_ref()
            .map(|service| service.is_configured())
            .unwrap_or(false)
    }

    /// Resolve an artifact. Always yields a well-formed result.
    pub async fn resolve(&self, artifact: &Artifact) -> ResolutionResult {
        info!("Resolving {} artifact {}", artifact.kind(), artifact.id());

        let mut trail = Trail::new();
        let mut queries = Vec::new();

        match self.run(artifact, &mut trail, &mut queries).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Resolution of {} aborted: {}", artifact.id(), e);
                trail.note(format!("Resolution aborted by an internal error ({})", e));
                if !trail.state.is_terminal() {
                    trail.state = ResolutionState::Degraded;
                    trail.states.push(ResolutionState::Degraded);
                }
                Self::finish(
                    artifact,
                    trail,
                    Vec::new(),
                    ResolutionConfidence::none(),
                    ResolutionOutcome::Degraded,
                    queries,
                )
            }
        }
    }

    async fn run(
        &self,
        artifact: &Artifact,
        trail: &mut Trail,
        queries: &mut Vec<CatalogQuery>,
    ) -> DomainResult<ResolutionResult> {
        // INIT -> PREFILTERED
        let artifact_valid = match validate_artifact(artifact) {
            Ok(()) => true,
            Err(e) => {
                trail.note(format!("Artifact is incomplete ({}); using metadata only", e));
                false
            }
        };

        let report = self.prefilter.evaluate(artifact);
        trail.advance(ResolutionState::Prefiltered)?;
        trail.note(describe_prefilter(&report.hint, report.indicator_score));

        // PREFILTERED -> INFERRED | INFERENCE_SKIPPED
        let branch = if artifact_valid {
            self.infer(artifact, trail).await
        } else {
            trail.note("Inference skipped for an incomplete artifact");
            Branch::Skipped
        };

        let hint = match &branch {
            Branch::Inferred(signal) => {
                trail.advance(ResolutionState::Inferred)?;
                let inferred = signal.to_hint();
                let active = report.hint.clone().supersede(inferred);
                if active.source == HintSource::Inference {
                    trail.note(format!(
                        "Inference hint ({}) replaced the pre-filter hint",
                        active.category
                    ));
                } else {
                    trail.note(format!(
                        "Pre-filter hint ({}) kept over a less confident inference hint",
                        active.category
                    ));
                }
                active
            }
            Branch::Skipped => {
                trail.advance(ResolutionState::InferenceSkipped)?;
                report.hint.clone()
            }
        };

        // -> SEARCHED
        *queries = self.derive_queries(&hint, &branch, trail);
        let batch = self.search(queries, trail).await;
        *queries = batch.queries.clone();

        if batch.all_failed() {
            return self.degrade(artifact, trail, &batch, queries.clone());
        }

        trail.advance(ResolutionState::Searched)?;
        let target = match &branch {
            Branch::Inferred(signal) => ScoringTarget::from_signal(signal, &hint),
            Branch::Skipped => ScoringTarget::from_hint(&hint),
        };
        let candidates = self.aggregator.dedupe_and_rank(batch.entries, &target);

        // -> DONE
        let confidence = self.confidence_for(&branch, &hint, &candidates, trail);
        trail.advance(ResolutionState::Done)?;
        info!(
            "Resolved {} with {} candidates at {}",
            artifact.id(),
            candidates.len(),
            confidence
        );

        Ok(Self::finish(
            artifact,
            std::mem::replace(trail, Trail::new()),
            candidates,
            confidence,
            ResolutionOutcome::Resolved,
            queries.clone(),
        ))
    }

    // ========================================================================
    // INFERENCE
    // ========================================================================

    async fn infer(&self, artifact: &Artifact, trail: &mut Trail) -> Branch {
        let service = match &self.inference {
            Some(service) if service.is_configured() => service,
            _ => {
                trail.note("Inference service not configured; using the pre-filter hint");
                return Branch::Skipped;
            }
        };

        let timeout = self.config.inference.timeout();
        let raw = match tokio::time::timeout(timeout, service.analyze(artifact)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("Inference call failed: {}", e);
                trail.note(format!(
                    "Inference failed ({}); using the pre-filter hint",
                    e.failure_class()
                ));
                return Branch::Skipped;
            }
            Err(_) => {
                let e = AppError::Timeout {
                    service: "inference",
                    after_ms: self.config.inference.timeout_ms,
                };
                warn!("{}", e);
                trail.note(format!(
                    "Inference timed out after {}ms; using the pre-filter hint",
                    self.config.inference.timeout_ms
                ));
                return Branch::Skipped;
            }
        };

        match self.normalizer.normalize(&raw) {
            InferenceResult::Valid(signal) if signal.is_usable() => {
                trail.note(describe_signal(&signal));
                Branch::Inferred(signal)
            }
            InferenceResult::Valid(_) => {
                trail.note("Inference response carried no usable signal; using the pre-filter hint");
                Branch::Skipped
            }
            InferenceResult::Invalid => {
                trail.note("Inference response was malformed; using the pre-filter hint");
                Branch::Skipped
            }
        }
    }

    // ========================================================================
    // QUERY DERIVATION
    // ========================================================================

    fn derive_queries(&self, hint: &CategoryHint, branch: &Branch, trail: &mut Trail) -> Vec<CatalogQuery> {
        let seeds = &self.config.seeds;

        let (terms, with_trending) = match branch {
            Branch::Inferred(signal) => {
                let keywords = signal.keywords.iter().take(MAX_KEYWORD_QUERIES);
                let similar = signal.similar_titles.iter().take(MAX_SIMILAR_QUERIES);

                let terms: Vec<String> = if signal.has_category_signal() {
                    trail.note(format!(
                        "Querying oracle title and keywords, then {} seed terms",
                        signal.category
                    ));
                    signal
                        .detected_title
                        .iter()
                        .chain(keywords)
                        .chain(similar)
                        .chain(seeds.for_category(signal.category))
                        .cloned()
                        .collect()
                } else {
                    trail.note(format!(
                        "No category signal from inference; querying oracle keywords, then {} seed terms",
                        hint.category
                    ));
                    let lead: Vec<&String> = signal
                        .detected_title
                        .iter()
                        .chain(keywords)
                        .collect();
                    // Similar titles are the only lead when nothing else came back
                    let lead = if lead.is_empty() { similar.collect() } else { lead };
                    lead.into_iter()
                        .chain(seeds.for_category(hint.category))
                        .cloned()
                        .collect()
                };
                (terms, false)
            }
            Branch::Skipped if hint.is_confident() => {
                trail.note(format!(
                    "Confident pre-filter hint; querying its keywords, then {} seed terms",
                    hint.category
                ));
                let terms: Vec<String> = hint
                    .keywords
                    .iter()
                    .chain(seeds.for_category(hint.category))
                    .cloned()
                    .collect();
                (terms, false)
            }
            Branch::Skipped => {
                trail.note("Weak pre-filter hint; querying generic seed terms, then trending");
                (seeds.generic.clone(), true)
            }
        };

        let mut queries: Vec<CatalogQuery> =
            dedupe_terms(terms).into_iter().map(CatalogQuery::Text).collect();
        if with_trending {
            queries.push(CatalogQuery::Trending);
        }
        if queries.is_empty() {
            queries.push(CatalogQuery::Trending);
        }
        queries
    }

    // ========================================================================
    // SEARCH
    // ========================================================================

    async fn search(&self, queries: &[CatalogQuery], trail: &mut Trail) -> SearchBatch {
        let mut batch = self.aggregator.aggregate(queries).await;
        note_search(trail, &batch);

        if batch.is_empty() {
            let fallback: Vec<CatalogQuery> = FALLBACK_QUERIES
                .iter()
                .filter(|q| !batch.queries.contains(q))
                .cloned()
                .collect();

            if !fallback.is_empty() {
                trail.note("No catalog results; falling back to trending and popular titles");
                let later = self.aggregator.aggregate(&fallback).await;
                note_search(trail, &later);
                batch.merge(later);
            }
        }

        batch
    }

    fn degrade(
        &self,
        artifact: &Artifact,
        trail: &mut Trail,
        batch: &SearchBatch,
        queries: Vec<CatalogQuery>,
    ) -> DomainResult<ResolutionResult> {
        let mut classes: Vec<&str> = Vec::new();
        for failure in &batch.failures {
            if !classes.contains(&failure.failure_class) {
                classes.push(failure.failure_class);
            }
        }

        trail.advance(ResolutionState::Degraded)?;
        trail.note(format!(
            "Catalog unavailable: all {} queries failed ({})",
            batch.queries.len(),
            classes.join(", ")
        ));
        warn!("Resolution of {} degraded: catalog unavailable", artifact.id());

        Ok(Self::finish(
            artifact,
            std::mem::replace(trail, Trail::new()),
            Vec::new(),
            ResolutionConfidence::none(),
            ResolutionOutcome::Degraded,
            queries,
        ))
    }

    // ========================================================================
    // CONFIDENCE
    // ========================================================================

    fn confidence_for(
        &self,
        branch: &Branch,
        hint: &CategoryHint,
        candidates: &[RankedCandidate],
        trail: &mut Trail,
    ) -> ResolutionConfidence {
        if candidates.is_empty() {
            trail.note("No candidates found");
            return ResolutionConfidence::none();
        }

        let policy = &self.config.confidence;
        let score = match branch {
            Branch::Inferred(signal) if signal.confidence < policy.inference_floor => {
                trail.note(format!(
                    "Oracle confidence {:.2} raised to the inference floor {:.2}",
                    signal.confidence, policy.inference_floor
                ));
                policy.inference_floor
            }
            Branch::Inferred(signal) => signal.confidence,
            Branch::Skipped if hint.is_confident() => policy.heuristic_confident,
            Branch::Skipped => policy.heuristic_generic,
        };

        let confidence = ResolutionConfidence::new(score);
        trail.note(format!("Confidence {}", confidence));
        confidence
    }

    fn finish(
        artifact: &Artifact,
        trail: Trail,
        candidates: Vec<RankedCandidate>,
        confidence: ResolutionConfidence,
        outcome: ResolutionOutcome,
        queries: Vec<CatalogQuery>,
    ) -> ResolutionResult {
        ResolutionResult {
            artifact_id: artifact.id(),
            candidates,
            confidence,
            explanation: trail.explanation,
            outcome,
            states: trail.states,
            queries,
            submitted_at: artifact.submitted_at(),
            resolved_at: Utc::now(),
        }
    }
}

fn describe_prefilter(hint: &CategoryHint, indicator_score: u32) -> String {
    match hint.strength {
        HintStrength::Confident => format!(
            "Pre-filter: {} (confident, {} indicators)",
            hint.category, indicator_score
        ),
        HintStrength::Low => format!(
            "Pre-filter: {} (low confidence, {} indicator)",
            hint.category, indicator_score
        ),
        HintStrength::None => "Pre-filter: no category indicators".to_string(),
    }
}

fn describe_signal(signal: &InferenceSignal) -> String {
    match (&signal.detected_title, signal.category) {
        (Some(title), Category::Unknown) => format!(
            "Inference detected \"{}\" (confidence {:.2})",
            title, signal.confidence
        ),
        (Some(title), category) => format!(
            "Inference detected \"{}\" as {} (confidence {:.2})",
            title, category, signal.confidence
        ),
        (None, category) => format!(
            "Inference returned {} keywords, category {} (confidence {:.2})",
            signal.keywords.len(),
            category,
            signal.confidence
        ),
    }
}

fn note_search(trail: &mut Trail, batch: &SearchBatch) {
    if batch.failures.is_empty() {
        trail.note(format!(
            "Searched {} queries, {} results",
            batch.queries.len(),
            batch.entries.len()
        ));
    } else {
        trail.note(format!(
            "Searched {} queries, {} results, {} failed",
            batch.queries.len(),
            batch.entries.len(),
            batch.failures.len()
        ));
    }
}

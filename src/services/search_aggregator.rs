// src/services/search_aggregator.rs
//
// Search Aggregator
//
// Fans an ordered list of catalog queries out to the MediaCatalogClient,
// merges whatever comes back, and turns it into a short ranked list.
//
// CRITICAL RULES:
// - One query failing (error or timeout) never aborts the others
// - A failed query contributes nothing; it is recorded, not raised
// - Deduplication is by catalog identity; the highest-priority query wins
// - Ordering: detected-title matches first, then score desc, then query
//   priority, then popularity desc, then id

use futures::future::join_all;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{CatalogEntry, CatalogQuery, RankedCandidate, MAX_CANDIDATES};
use crate::error::{AppError, AppResult};
use crate::integrations::MediaCatalogClient;
use crate::services::relevance_scorer::{RelevanceScorer, ScoringTarget};

/// A catalog entry together with the query that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedEntry {
    pub entry: CatalogEntry,

    /// Priority of the producing query (0 = highest)
    pub query_index: usize,

    /// Position inside that query's result list
    pub position: usize,

    pub query: CatalogQuery,
}

/// A query that produced no results because it failed
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFailure {
    pub query: CatalogQuery,
    pub failure_class: &'static str,
    pub message: String,
}

/// Everything one or more aggregation rounds produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBatch {
    /// Entries in query priority order, duplicates included
    pub entries: Vec<SourcedEntry>,

    /// Queries issued, in priority order
    pub queries: Vec<CatalogQuery>,

    pub succeeded: usize,
    pub failures: Vec<QueryFailure>,
}

impl SearchBatch {
    /// Every issued query failed
    pub fn all_failed(&self) -> bool {
        !self.queries.is_empty() && self.succeeded == 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a later, lower-priority round. Its query indices continue
    /// after this batch's.
    pub fn merge(&mut self, later: SearchBatch) {
        let offset = self.queries.len();
        self.entries
            .extend(later.entries.into_iter().map(|mut sourced| {
                sourced.query_index += offset;
                sourced
            }));
        self.queries.extend(later.queries);
        self.succeeded += later.succeeded;
        self.failures.extend(later.failures);
    }

    /// The entries alone, in query priority order
    pub fn catalog_entries(&self) -> Vec<CatalogEntry> {
        self.entries.iter().map(|s| s.entry.clone()).collect()
    }
}

pub struct SearchAggregator {
    catalog: Arc<dyn MediaCatalogClient>,
    query_timeout: Duration,
    scorer: RelevanceScorer,
    limit: usize,
}

impl SearchAggregator {
    pub fn new(
        catalog: Arc<dyn MediaCatalogClient>,
        query_timeout: Duration,
        scorer: RelevanceScorer,
        limit: usize,
    ) -> Self {
        Self {
            catalog,
            query_timeout,
            scorer,
            limit: limit.clamp(1, MAX_CANDIDATES),
        }
    }

    // ========================================================================
    // FAN-OUT
    // ========================================================================

    /// Issue every query concurrently and merge the results in priority order
    pub async fn aggregate(&self, queries: &[CatalogQuery]) -> SearchBatch {
        let futures = queries
            .iter()
            .enumerate()
            .map(|(index, query)| async move { (index, query, self.run_query(query).await) });

        let mut batch = SearchBatch {
            queries: queries.to_vec(),
            ..Default::default()
        };

        // join_all preserves input order, so entries stay in priority order
        for (query_index, query, outcome) in join_all(futures).await {
            match outcome {
                Ok(entries) => {
                    debug!("Catalog query {} returned {} entries", query, entries.len());
                    batch.succeeded += 1;
                    batch
                        .entries
                        .extend(entries.into_iter().enumerate().map(|(position, entry)| {
                            SourcedEntry {
                                entry,
                                query_index,
                                position,
                                query: query.clone(),
                            }
                        }));
                }
                Err(e) => {
                    warn!("Catalog query {} failed: {}", query, e);
                    batch.failures.push(QueryFailure {
                        query: query.clone(),
                        failure_class: e.failure_class(),
                        message: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    async fn run_query(&self, query: &CatalogQuery) -> AppResult<Vec<CatalogEntry>> {
        let call = async {
            match query {
                CatalogQuery::Text(text) => self.catalog.search_by_text(text).await,
                CatalogQuery::Trending => self.catalog.get_trending().await,
                CatalogQuery::Popular => self.catalog.get_popular().await,
            }
        };

        tokio::time::timeout(self.query_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Timeout {
                    service: "catalog",
                    after_ms: self.query_timeout.as_millis() as u64,
                })
            })
    }

    // ========================================================================
    // DEDUPE & RANK
    // ========================================================================

    /// Deduplicate by catalog identity, score against `target`, sort and
    /// truncate. The result does not depend on the order of `entries`.
    pub fn dedupe_and_rank(
        &self,
        entries: Vec<SourcedEntry>,
        target: &ScoringTarget,
    ) -> Vec<RankedCandidate> {
        let mut unique: BTreeMap<_, SourcedEntry> = BTreeMap::new();
        for sourced in entries {
            let key = sourced.entry.id;
            let earlier = unique
                .get(&key)
                .map(|kept| {
                    (sourced.query_index, sourced.position) < (kept.query_index, kept.position)
                })
                .unwrap_or(true);
            if earlier {
                unique.insert(key, sourced);
            }
        }

        let mut scored: Vec<(bool, f64, SourcedEntry)> = unique
            .into_values()
            .map(|sourced| {
                let title_match = target.matches_detected_title(&sourced.entry);
                let score = self.scorer.score(&sourced.entry, target);
                (title_match, score, sourced)
            })
            .collect();

        // A named title outranks any amount of keyword overlap
        scored.sort_by(|(match_a, score_a, a), (match_b, score_b, b)| {
            match_b
                .cmp(match_a)
                .then_with(|| score_b.total_cmp(score_a))
                .then_with(|| a.query_index.cmp(&b.query_index))
                .then_with(|| RelevanceScorer::tie_break(&a.entry, &b.entry))
        });

        scored
            .into_iter()
            .take(self.limit)
            .enumerate()
            .map(|(i, (_, score, sourced))| RankedCandidate {
                entry: sourced.entry,
                score,
                rank: i + 1,
                matched_query: sourced.query,
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogId, CategoryHint, InferenceSignal};
    use crate::integrations::MockMediaCatalogClient;
    use std::collections::HashSet;

    fn entry(id: u64, title: &str) -> CatalogEntry {
        CatalogEntry::new(CatalogId::movie(id), title, "")
    }

    fn sourced(id: u64, title: &str, query_index: usize, query: &str) -> SourcedEntry {
        SourcedEntry {
            entry: entry(id, title),
            query_index,
            position: 0,
            query: CatalogQuery::text(query),
        }
    }

    fn aggregator(catalog: MockMediaCatalogClient) -> SearchAggregator {
        SearchAggregator::new(
            Arc::new(catalog),
            Duration::from_millis(200),
            RelevanceScorer::default(),
            MAX_CANDIDATES,
        )
    }

    #[tokio::test]
    async fn test_failed_query_does_not_abort_others() {
        let mut catalog = MockMediaCatalogClient::new();
        catalog
            .expect_search_by_text()
            .withf(|q| q == "broken")
            .returning(|_| Err(AppError::Catalog("boom".to_string())));
        catalog
            .expect_search_by_text()
            .withf(|q| q == "akira")
            .returning(|_| Ok(vec![entry(149, "Akira")]));
        catalog
            .expect_get_trending()
            .returning(|| Ok(vec![entry(1, "Trending Thing")]));

        let batch = aggregator(catalog)
            .aggregate(&[
                CatalogQuery::text("broken"),
                CatalogQuery::text("akira"),
                CatalogQuery::Trending,
            ])
            .await;

        assert_eq!(batch.succeeded, 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].failure_class, "catalog");
        assert!(!batch.all_failed());

        let titles: Vec<_> = batch.catalog_entries().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Akira", "Trending Thing"]);
        assert_eq!(batch.entries[0].query_index, 1);
        assert_eq!(batch.entries[1].query_index, 2);
    }

    #[tokio::test]
    async fn test_slow_query_times_out_as_failure() {
        let aggregator = SearchAggregator::new(
            Arc::new(SlowCatalog),
            Duration::from_millis(20),
            RelevanceScorer::default(),
            MAX_CANDIDATES,
        );
        let batch = aggregator.aggregate(&[CatalogQuery::Trending]).await;
        assert!(batch.all_failed());
        assert_eq!(batch.failures[0].failure_class, "timeout");
    }

    /// Never answers within any reasonable timeout
    struct SlowCatalog;

    #[async_trait::async_trait]
    impl MediaCatalogClient for SlowCatalog {
        async fn search_by_text(&self, _query: &str) -> AppResult<Vec<CatalogEntry>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }

        async fn get_trending(&self) -> AppResult<Vec<CatalogEntry>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }

        async fn get_popular(&self) -> AppResult<Vec<CatalogEntry>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_empty_query_list() {
        let batch = aggregator(MockMediaCatalogClient::new()).aggregate(&[]).await;
        assert!(batch.is_empty());
        assert!(!batch.all_failed());
    }

    #[test]
    fn test_duplicate_attributed_to_higher_priority_query() {
        let aggregator = aggregator(MockMediaCatalogClient::new());
        let ranked = aggregator.dedupe_and_rank(
            vec![
                sourced(7, "Heat", 3, "trending"),
                sourced(7, "Heat", 1, "heist"),
                sourced(8, "Ronin", 2, "thriller"),
            ],
            &ScoringTarget::default(),
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].entry.id, CatalogId::movie(7));
        assert_eq!(ranked[0].matched_query, CatalogQuery::text("heist"));
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_score_beats_query_priority() {
        let aggregator = aggregator(MockMediaCatalogClient::new());
        let ranked = aggregator.dedupe_and_rank(
            vec![
                sourced(1, "Something Else", 0, "first"),
                sourced(2, "Spirited Away", 4, "later"),
            ],
            &ScoringTarget::from_terms(["spirited away"]),
        );
        assert_eq!(ranked[0].entry.title, "Spirited Away");
    }

    #[test]
    fn test_detected_title_match_outranks_keyword_heavy_entry() {
        let aggregator = aggregator(MockMediaCatalogClient::new());
        let signal = InferenceSignal {
            detected_title: Some("Spirited Away".to_string()),
            keywords: vec!["Studio Ghibli".to_string(), "spirits".to_string()],
            ..Default::default()
        };
        let target = ScoringTarget::from_signal(&signal, &CategoryHint::unknown());

        let mut heavy = sourced(500, "Studio Ghibli: Spirits", 1, "Studio Ghibli");
        heavy.entry.synopsis = "Studio Ghibli spirits, more spirits, Studio Ghibli again".to_string();
        heavy.entry.rating = 7.0;
        let mut named = sourced(129, "Spirited Away", 0, "Spirited Away");
        named.entry.rating = 8.5;

        let ranked = aggregator.dedupe_and_rank(vec![heavy, named], &target);
        assert_eq!(ranked[0].entry.id, CatalogId::movie(129));
        // The keyword-heavy entry still carries the higher raw score
        assert_eq!(ranked[0].score, 10.0);
        assert_eq!(ranked[1].score, 11.0);
    }

    #[test]
    fn test_ranking_is_order_independent() {
        let aggregator = aggregator(MockMediaCatalogClient::new());
        let target = ScoringTarget::from_terms(["robot"]);
        let input = vec![
            sourced(5, "Robot Dreams", 1, "robot"),
            sourced(3, "Big Hero", 0, "robot"),
            sourced(9, "Iron Giant", 0, "robot"),
            sourced(3, "Big Hero", 2, "animated"),
            sourced(4, "Robots", 1, "robot"),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let a = aggregator.dedupe_and_rank(input, &target);
        let b = aggregator.dedupe_and_rank(reversed, &target);
        assert_eq!(a, b);

        let ids: HashSet<_> = a.iter().map(|c| c.entry.id).collect();
        assert_eq!(ids.len(), a.len());
    }

    #[test]
    fn test_truncates_to_limit() {
        let aggregator = SearchAggregator::new(
            Arc::new(MockMediaCatalogClient::new()),
            Duration::from_millis(10),
            RelevanceScorer::default(),
            50,
        );
        let entries = (0..12).map(|i| sourced(i, "x", 0, "q")).collect();
        let ranked = aggregator.dedupe_and_rank(entries, &ScoringTarget::default());
        assert_eq!(ranked.len(), MAX_CANDIDATES);
        // Equal scores, same query, zero popularity: lowest id first
        assert_eq!(ranked[0].entry.id, CatalogId::movie(0));
    }

    #[test]
    fn test_merge_offsets_query_indices() {
        let mut primary = SearchBatch {
            queries: vec![CatalogQuery::text("a"), CatalogQuery::text("b")],
            failures: vec![],
            ..Default::default()
        };
        let fallback = SearchBatch {
            entries: vec![SourcedEntry {
                entry: entry(1, "x"),
                query_index: 0,
                position: 0,
                query: CatalogQuery::Trending,
            }],
            queries: vec![CatalogQuery::Trending],
            succeeded: 1,
            failures: vec![],
        };
        primary.merge(fallback);
        assert_eq!(primary.entries[0].query_index, 2);
        assert_eq!(primary.queries.len(), 3);
        assert_eq!(primary.succeeded, 1);
    }
}

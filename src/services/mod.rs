// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod prefilter_service;
pub mod relevance_scorer;
pub mod resolution_service;
pub mod response_normalizer;
pub mod search_aggregator;


// Re-export all services and their types
pub use prefilter_service::{HeuristicPrefilter, PrefilterReport};

pub use response_normalizer::ResponseNormalizer;

pub use relevance_scorer::{RelevanceScorer, ScoringTarget};

pub use search_aggregator::{QueryFailure, SearchAggregator, SearchBatch, SourcedEntry};

pub use resolution_service::ResolutionService;

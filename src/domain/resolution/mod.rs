// src/domain/resolution/mod.rs
//
// Resolution Domain
//
// Value objects describing the outcome of identifying an artifact.
//
// CRITICAL RULES:
// - All types are pure value objects (immutable)
// - No side effects
// - No I/O (that's the services' job)
// - Deterministic: same input -> same output

pub mod value_objects;

pub use value_objects::{
    dedupe_terms,
    CatalogQuery,
    Category,
    CategoryHint,
    HintSource,
    HintStrength,
    RankedCandidate,
    ResolutionConfidence,
    ResolutionOutcome,
    ResolutionResult,
    ResolutionState,
    MAX_CANDIDATES,
};

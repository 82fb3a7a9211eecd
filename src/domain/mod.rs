// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file MUST declare all domain modules and re-export their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod artifact;
pub mod catalog;
pub mod inference;
pub mod resolution;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Artifact Domain
pub use artifact::{
    media_type_for_path, validate_artifact, Artifact, ArtifactContent, ArtifactKind,
    ArtifactMetadata,
};

// Catalog Domain
pub use catalog::{CatalogEntry, CatalogId, MediaType};

// Inference Domain
pub use inference::{InferenceResult, InferenceSignal};

// Resolution Domain
pub use resolution::{
    dedupe_terms, CatalogQuery, Category, CategoryHint, HintSource, HintStrength,
    RankedCandidate, ResolutionConfidence, ResolutionOutcome, ResolutionResult, ResolutionState,
    MAX_CANDIDATES,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ResolutionState,
        to: ResolutionState,
    },
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;

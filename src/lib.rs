// src/lib.rs
// Media Resolver - Identify a movie, series or anime from an image or a mood
//
// Architecture:
// - Domain-centric: value objects and invariants live in domain/, no I/O
// - Cascade: pre-filter -> optional inference -> catalog search -> ranking
// - Explicit collaborators: catalog and inference clients are injected
// - Failures are data: every resolution ends in a well-formed result
// - Application Layer: UI boundary (DTOs + commands)

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod integrations;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API - Domain Values
// ============================================================================

pub use domain::{
    validate_artifact,
    // Artifact
    Artifact,
    ArtifactKind,
    ArtifactMetadata,
    // Catalog
    CatalogEntry,
    CatalogId,
    // Resolution
    CatalogQuery,
    Category,
    CategoryHint,
    // Inference
    InferenceResult,
    InferenceSignal,
    MediaType,
    RankedCandidate,
    ResolutionConfidence,
    ResolutionOutcome,
    ResolutionResult,
    ResolutionState,
    MAX_CANDIDATES,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::ResolverConfig;

// ============================================================================
// PUBLIC API - Services & Collaborators
// ============================================================================

pub use integrations::{GeminiClient, InferenceService, MediaCatalogClient, TmdbClient};
pub use services::ResolutionService;

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, ResolutionResultDto, ResolveArtifactDto};

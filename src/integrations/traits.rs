// src/integrations/traits.rs
//
// Collaborator contracts consumed by the resolver.
//
// Both collaborators are stateless per call: dropping an in-flight future
// (caller cancellation, timeout) leaves them consistent.

use async_trait::async_trait;

use crate::domain::{Artifact, CatalogEntry};
use crate::error::AppResult;

/// Media catalog (search, trending, popular).
///
/// Implementations are idempotent and may fail with transport errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaCatalogClient: Send + Sync {
    async fn search_by_text(&self, query: &str) -> AppResult<Vec<CatalogEntry>>;

    async fn get_trending(&self) -> AppResult<Vec<CatalogEntry>>;

    async fn get_popular(&self) -> AppResult<Vec<CatalogEntry>>;
}

/// External generative model used as a noisy, optional oracle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// False when no credential is configured. `analyze` must not be
    /// called in that case.
    fn is_configured(&self) -> bool;

    /// Submit the artifact and return the raw (unparsed) response text
    async fn analyze(&self, artifact: &Artifact) -> AppResult<String>;
}

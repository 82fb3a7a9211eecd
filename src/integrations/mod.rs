// src/integrations/mod.rs
//
// External Integrations Module
//
// Collaborator traits consumed by the resolver, plus the real HTTP clients.

pub mod gemini;
pub mod tmdb;
pub mod traits;

pub use gemini::client::GeminiClient;
pub use tmdb::client::TmdbClient;
pub use traits::{InferenceService, MediaCatalogClient};

#[cfg(test)]
pub use traits::{MockInferenceService, MockMediaCatalogClient};

pub mod entity;
pub mod invariants;

pub use entity::{media_type_for_path, Artifact, ArtifactContent, ArtifactKind, ArtifactMetadata};
pub use invariants::validate_artifact;

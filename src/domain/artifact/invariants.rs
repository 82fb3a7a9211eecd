use super::entity::{Artifact, ArtifactContent};
use crate::domain::{DomainError, DomainResult};

/// Validates all Artifact invariants
pub fn validate_artifact(artifact: &Artifact) -> DomainResult<()> {
    match artifact.content() {
        ArtifactContent::Bytes(bytes) => {
            validate_image_bytes(bytes)?;
            validate_image_media_type(artifact.metadata().media_type.as_deref())?;
        }
        ArtifactContent::Text(text) => validate_description(text)?,
    }
    Ok(())
}

fn validate_image_bytes(bytes: &[u8]) -> DomainResult<()> {
    if bytes.is_empty() {
        return Err(DomainError::InvariantViolation(
            "Image artifact has no content".to_string(),
        ));
    }
    Ok(())
}

fn validate_image_media_type(media_type: Option<&str>) -> DomainResult<()> {
    match media_type {
        Some(media_type) if media_type.starts_with("image/") => Ok(()),
        Some(other) => Err(DomainError::InvariantViolation(format!(
            "Media type {} is not an image type",
            other
        ))),
        None => Err(DomainError::InvariantViolation(
            "Image artifact has no declared media type".to_string(),
        )),
    }
}

fn validate_description(text: &str) -> DomainResult<()> {
    if text.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Description cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Invariants that must hold true for Artifact domain:
///
/// 1. Content never changes after construction
/// 2. byte_size always equals the content length
/// 3. Image artifacts have content and an image/* media type
/// 4. Text artifacts are not blank

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_image() {
        let artifact = Artifact::image(vec![1], Some("still.jpg".to_string()), None);
        assert!(validate_artifact(&artifact).is_ok());
    }

    #[test]
    fn test_empty_image_fails() {
        let artifact = Artifact::image(Vec::new(), Some("still.jpg".to_string()), None);
        assert!(validate_artifact(&artifact).is_err());
    }

    #[test]
    fn test_non_image_media_type_fails() {
        let artifact = Artifact::image(
            vec![1],
            Some("notes.txt".to_string()),
            Some("application/pdf".to_string()),
        );
        assert!(validate_artifact(&artifact).is_err());
    }

    #[test]
    fn test_blank_text_fails() {
        assert!(validate_artifact(&Artifact::text("   ")).is_err());
        assert!(validate_artifact(&Artifact::text("space opera")).is_ok());
    }
}

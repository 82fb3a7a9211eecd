// src/application/commands/resolution_commands.rs
//
// Resolution Command Handlers
//
// RULES:
// - Accept DTOs
// - Reject invalid artifacts before they reach the resolver
// - Call the resolution service
// - Return DTOs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;
use std::path::Path;

use crate::application::error_handling::ToErrorResponse;
use crate::application::{dto::*, state::AppState};
use crate::domain::{media_type_for_path, validate_artifact, Artifact};
use crate::error::{AppError, AppResult};

/// Resolve an artifact submitted by the UI
pub async fn resolve_artifact(
    dto: ResolveArtifactDto,
    state: &AppState,
) -> Result<ResolutionResultDto, String> {
    let artifact = artifact_from_dto(dto).to_error_response()?;
    let result = state.resolution_service.resolve(&artifact).await;
    Ok(ResolutionResultDto::from(result))
}

/// Resolve an image read from disk
pub async fn resolve_image_file(
    path: &Path,
    state: &AppState,
) -> Result<ResolutionResultDto, String> {
    let artifact = artifact_from_file(path).to_error_response()?;
    let result = state.resolution_service.resolve(&artifact).await;
    Ok(ResolutionResultDto::from(result))
}

/// Build and validate an artifact from its DTO
pub fn artifact_from_dto(dto: ResolveArtifactDto) -> AppResult<Artifact> {
    let artifact = match dto.kind.trim().to_lowercase().as_str() {
        "image" => {
            let data = dto.data_base64.ok_or_else(|| {
                AppError::InvalidArtifact("image artifacts require data_base64".to_string())
            })?;
            let bytes = STANDARD.decode(data.trim())?;
            Artifact::image(bytes, dto.file_name, dto.mime_type)
        }
        "text" => Artifact::text(dto.text.unwrap_or_default()),
        other => {
            return Err(AppError::InvalidArtifact(format!(
                "unsupported artifact kind '{}'",
                other
            )))
        }
    };

    validate_artifact(&artifact)?;
    Ok(artifact)
}

/// Read an image file into a validated artifact
pub fn artifact_from_file(path: &Path) -> AppResult<Artifact> {
    let media_type = media_type_for_path(path).ok_or_else(|| {
        AppError::InvalidArtifact(format!("{} is not a supported image", path.display()))
    })?;

    let bytes = std::fs::read(path)?;
    info!("Read {} bytes from {}", bytes.len(), path.display());

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);

    let artifact = Artifact::image(bytes, file_name, Some(media_type.to_string()));
    validate_artifact(&artifact)?;
    Ok(artifact)
}

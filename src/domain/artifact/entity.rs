use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// The payload submitted for identification: an uploaded image or a free-text
/// mood/theme description.
///
/// An artifact is immutable once constructed. The resolver only ever borrows it.
#[derive(Debug, Clone)]
pub struct Artifact {
    id: Uuid,
    content: ArtifactContent,
    metadata: ArtifactMetadata,
    submitted_at: DateTime<Utc>,
}

/// Raw artifact content
#[derive(Debug, Clone)]
pub enum ArtifactContent {
    Bytes(Vec<u8>),
    Text(String),
}

/// Declared kind of the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Image,
    Text,
}

/// Lightweight metadata describing the artifact without touching its content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Original filename (images only, if the uploader provided one)
    pub file_name: Option<String>,

    /// Declared media type, e.g. `image/png` or `text/plain`
    pub media_type: Option<String>,

    /// Size of the content in bytes
    pub byte_size: u64,
}

impl Artifact {
    /// Create an image artifact
    pub fn image(bytes: Vec<u8>, file_name: Option<String>, media_type: Option<String>) -> Self {
        let media_type = media_type.or_else(|| {
            file_name
                .as_deref()
                .and_then(|name| media_type_for_path(Path::new(name)))
                .map(str::to_string)
        });

        let metadata = ArtifactMetadata {
            file_name,
            media_type,
            byte_size: bytes.len() as u64,
        };

        Self {
            id: Uuid::new_v4(),
            content: ArtifactContent::Bytes(bytes),
            metadata,
            submitted_at: Utc::now(),
        }
    }

    /// Create a text artifact (mood or theme description)
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let metadata = ArtifactMetadata {
            file_name: None,
            media_type: Some("text/plain".to_string()),
            byte_size: text.len() as u64,
        };

        Self {
            id: Uuid::new_v4(),
            content: ArtifactContent::Text(text),
            metadata,
            submitted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ArtifactKind {
        match self.content {
            ArtifactContent::Bytes(_) => ArtifactKind::Image,
            ArtifactContent::Text(_) => ArtifactKind::Text,
        }
    }

    pub fn content(&self) -> &ArtifactContent {
        &self.content
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Image bytes, if this is an image artifact
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.content {
            ArtifactContent::Bytes(bytes) => Some(bytes),
            ArtifactContent::Text(_) => None,
        }
    }

    /// Description text, if this is a text artifact
    pub fn description(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Bytes(_) => None,
            ArtifactContent::Text(text) => Some(text),
        }
    }

    /// The string the pre-filter tokenizes: the filename for images, the
    /// description itself for text.
    pub fn token_source(&self) -> Option<&str> {
        match &self.content {
            ArtifactContent::Bytes(_) => self.metadata.file_name.as_deref(),
            ArtifactContent::Text(text) => Some(text),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Image => write!(f, "image"),
            ArtifactKind::Text => write!(f, "text"),
        }
    }
}

/// Guess an image media type from a file extension
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

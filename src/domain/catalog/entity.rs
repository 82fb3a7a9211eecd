use serde::{Deserialize, Serialize};

/// Kind of work in the media catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Tv,
}

/// Stable catalog identity.
///
/// Catalog ids are only unique within a media type, so the type is part of
/// the identity. Ordering is total and used as the last ranking tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogId {
    pub media_type: MediaType,
    pub id: u64,
}

/// An item returned by the media catalog. Read-only for the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: CatalogId,
    pub title: String,
    pub synopsis: String,

    /// Average user rating on a 0-10 scale
    pub rating: f64,

    /// Catalog-reported popularity (unbounded, higher is more popular)
    pub popularity: f64,

    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub genre_ids: Vec<u32>,
}

impl CatalogId {
    pub fn movie(id: u64) -> Self {
        Self {
            media_type: MediaType::Movie,
            id,
        }
    }

    pub fn tv(id: u64) -> Self {
        Self {
            media_type: MediaType::Tv,
            id,
        }
    }
}

impl CatalogEntry {
    /// Create a catalog entry with no optional metadata
    pub fn new(id: CatalogId, title: impl Into<String>, synopsis: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            synopsis: synopsis.into(),
            rating: 0.0,
            popularity: 0.0,
            release_date: None,
            poster_path: None,
            genre_ids: Vec::new(),
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
        }
    }
}

impl std::fmt::Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_includes_media_type() {
        assert_ne!(CatalogId::movie(129), CatalogId::tv(129));
        assert_eq!(CatalogId::movie(129).to_string(), "movie:129");
    }

    #[test]
    fn test_identity_ordering_is_total() {
        let mut ids = vec![CatalogId::tv(1), CatalogId::movie(7), CatalogId::movie(2)];
        ids.sort();
        assert_eq!(ids, vec![CatalogId::movie(2), CatalogId::movie(7), CatalogId::tv(1)]);
    }
}

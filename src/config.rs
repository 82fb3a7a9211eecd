// src/config.rs
//
// Resolver configuration
//
// Resolution order: defaults -> JSON file in the user config dir -> environment.
// A missing inference key is a supported setup (heuristic-only resolution),
// never a load error.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{Category, MAX_CANDIDATES};
use crate::error::{AppError, AppResult};

pub const ENV_TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_TMDB_ACCESS_TOKEN: &str = "TMDB_ACCESS_TOKEN";
pub const ENV_TMDB_BASE_URL: &str = "TMDB_BASE_URL";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GEMINI_MODEL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub catalog: CatalogConfig,
    pub inference: InferenceConfig,
    pub scoring: ScoringWeights,
    pub prefilter: PrefilterConfig,
    pub confidence: ConfidencePolicy,
    pub seeds: SeedTerms,
    pub max_candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// v3 API key, sent as a query parameter
    pub api_key: Option<String>,

    /// v4 read access token, sent as a bearer token. Wins over `api_key`.
    pub access_token: Option<String>,

    pub base_url: String,
    pub language: String,

    /// Per-query timeout
    pub timeout_ms: u64,

    /// Minimum spacing between two catalog requests
    pub min_request_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

/// Weights of the relevance scorer. Hand-tuned; treat as defaults, not contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub title_match_weight: f64,
    pub synopsis_match_weight: f64,
    pub high_rating_threshold: f64,
    pub high_rating_bonus: f64,
    pub secondary_rating_threshold: f64,
    pub secondary_rating_bonus: f64,

    /// Added once when an entry's title equals or contains the oracle's detected title
    pub detected_title_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefilterConfig {
    /// Indicator score at which a heuristic hint counts as confident
    pub confident_indicator_score: u32,

    /// Upper bound on tokens inspected per artifact
    pub max_tokens: usize,

    /// Lossless images up to this size look like screenshots
    pub screenshot_max_bytes: u64,
}

/// Confidence reported for each resolution branch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    /// Heuristic-only resolution from a confident pre-filter hint
    pub heuristic_confident: f64,

    /// Heuristic-only resolution from generic seeds / trending
    pub heuristic_generic: f64,

    /// Lowest confidence reported when the inference branch was used.
    /// Must stay above both heuristic constants.
    pub inference_floor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedTerms {
    pub anime: Vec<String>,
    pub live_action: Vec<String>,
    pub animation: Vec<String>,
    pub generic: Vec<String>,
}

// ============================================================================
// DEFAULTS
// ============================================================================

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            inference: InferenceConfig::default(),
            scoring: ScoringWeights::default(),
            prefilter: PrefilterConfig::default(),
            confidence: ConfidencePolicy::default(),
            seeds: SeedTerms::default(),
            max_candidates: MAX_CANDIDATES,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            access_token: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            language: "en-US".to_string(),
            timeout_ms: 8_000,
            min_request_interval_ms: 250,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            timeout_ms: 20_000,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_match_weight: 3.0,
            synopsis_match_weight: 1.0,
            high_rating_threshold: 7.5,
            high_rating_bonus: 2.0,
            secondary_rating_threshold: 6.0,
            secondary_rating_bonus: 1.0,
            detected_title_weight: 5.0,
        }
    }
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            confident_indicator_score: 2,
            max_tokens: 64,
            screenshot_max_bytes: 3 * 1024 * 1024,
        }
    }
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            heuristic_confident: 0.45,
            heuristic_generic: 0.40,
            inference_floor: 0.55,
        }
    }
}

impl Default for SeedTerms {
    fn default() -> Self {
        let terms = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            anime: terms(&["anime", "shonen", "studio ghibli"]),
            live_action: terms(&["drama", "thriller"]),
            animation: terms(&["animated", "pixar", "cartoon"]),
            generic: terms(&["adventure", "drama", "comedy"]),
        }
    }
}

// ============================================================================
// ACCESSORS
// ============================================================================

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn valid_access_token(&self) -> Option<&str> {
        self.access_token.as_deref().map(str::trim).filter(|t| is_valid_key(t))
    }

    pub fn valid_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| is_valid_key(k))
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map(is_valid_key).unwrap_or(false)
    }
}

impl SeedTerms {
    /// Default seed terms for a category; unknown falls back to generic terms
    pub fn for_category(&self, category: Category) -> &[String] {
        match category {
            Category::Anime => &self.anime,
            Category::LiveAction => &self.live_action,
            Category::Animation => &self.animation,
            Category::Unknown => &self.generic,
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl ResolverConfig {
    /// Default location: {config_dir}/media-resolver/config.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("media-resolver").join("config.json"))
    }

    /// Load from the default location (if present), apply environment
    /// overrides and validate.
    pub fn load() -> AppResult<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ResolverConfig = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded resolver config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_TMDB_API_KEY).filter(|k| is_valid_key(k)) {
            info!("Catalog API key loaded from environment variable");
            self.catalog.api_key = Some(key.trim().to_string());
        }
        if let Some(token) = lookup(ENV_TMDB_ACCESS_TOKEN).filter(|t| is_valid_key(t)) {
            info!("Catalog access token loaded from environment variable");
            self.catalog.access_token = Some(token.trim().to_string());
        }
        if let Some(url) = lookup(ENV_TMDB_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.catalog.base_url = url.trim().to_string();
        }
        if let Some(key) = lookup(ENV_GEMINI_API_KEY).filter(|k| is_valid_key(k)) {
            info!("Inference API key loaded from environment variable");
            self.inference.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = lookup(ENV_GEMINI_MODEL).filter(|m| !m.trim().is_empty()) {
            self.inference.model = model.trim().to_string();
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let policy = &self.confidence;
        for (name, value) in [
            ("heuristic_confident", policy.heuristic_confident),
            ("heuristic_generic", policy.heuristic_generic),
            ("inference_floor", policy.inference_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "confidence.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if policy.heuristic_confident >= policy.inference_floor
            || policy.heuristic_generic >= policy.inference_floor
        {
            return Err(AppError::Config(
                "heuristic confidence must be strictly below confidence.inference_floor"
                    .to_string(),
            ));
        }

        if self.scoring.secondary_rating_threshold > self.scoring.high_rating_threshold {
            return Err(AppError::Config(
                "scoring.secondary_rating_threshold cannot exceed scoring.high_rating_threshold"
                    .to_string(),
            ));
        }

        if self.max_candidates == 0 {
            return Err(AppError::Config("max_candidates must be at least 1".to_string()));
        }

        if self.catalog.timeout_ms == 0 || self.inference.timeout_ms == 0 {
            return Err(AppError::Config("timeouts must be nonzero".to_string()));
        }

        Ok(())
    }

    /// Candidate limit, never above the hard cap
    pub fn candidate_limit(&self) -> usize {
        self.max_candidates.clamp(1, MAX_CANDIDATES)
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn base() -> ResolverConfig {
        ResolverConfig::default()
    }

    #[test]
    fn test_defaults_validate() {
        assert!(base().validate().is_ok());
        assert!(!base().inference.is_configured());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_GEMINI_API_KEY, " secret "),
            (ENV_TMDB_API_KEY, ""),
            (ENV_GEMINI_MODEL, "gemini-2.0-flash"),
        ]
        .into_iter()
        .collect();

        let mut config = base();
        config.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.inference.api_key.as_deref(), Some("secret"));
        assert!(config.inference.is_configured());
        assert_eq!(config.inference.model, "gemini-2.0-flash");
        // Blank values never override
        assert!(config.catalog.api_key.is_none());
        assert!(config.catalog.access_token.is_none());
    }

    #[test]
    fn test_catalog_access_token_from_env() {
        let mut config = base();
        config.apply_env_overrides(|name| {
            (name == ENV_TMDB_ACCESS_TOKEN).then(|| " eyJ-token ".to_string())
        });
        assert_eq!(config.catalog.valid_access_token(), Some("eyJ-token"));
        assert_eq!(config.catalog.valid_api_key(), None);
    }

    #[test]
    fn test_blank_catalog_credentials_are_ignored() {
        let mut config = base();
        config.catalog.api_key = Some("  ".to_string());
        config.catalog.access_token = Some(String::new());
        assert_eq!(config.catalog.valid_api_key(), None);
        assert_eq!(config.catalog.valid_access_token(), None);
    }

    #[test]
    fn test_heuristic_confidence_must_stay_below_inference_floor() {
        let mut config = base();
        config.confidence.heuristic_confident = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rating_thresholds_ordered() {
        let mut config = base();
        config.scoring.secondary_rating_threshold = 9.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_candidates": 3, "scoring": {{ "title_match_weight": 4.0 }} }}"#
        )
        .unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_candidates, 3);
        assert_eq!(config.scoring.title_match_weight, 4.0);
        assert_eq!(config.scoring.synopsis_match_weight, 1.0);
        assert_eq!(config.catalog.timeout_ms, 8_000);
    }

    #[test]
    fn test_from_file_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ResolverConfig::from_file(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_candidate_limit_is_capped() {
        let mut config = base();
        config.max_candidates = 50;
        assert_eq!(config.candidate_limit(), MAX_CANDIDATES);
    }
}

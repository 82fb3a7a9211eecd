// src/integrations/tmdb/client.rs
//
// TMDB API Integration
//
// ARCHITECTURE:
// - REST client for the TMDB v3 API
// - Handles authentication and client-side rate limiting
// - Maps external DTOs -> CatalogEntry (read-only values)
// - Used by the search aggregator through MediaCatalogClient
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - No retries: a failed call is reported, the resolver cascade decides what's next
// - Person results from multi-search are dropped

use async_trait::async_trait;
use log::debug;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::CatalogConfig;
use crate::domain::{CatalogEntry, CatalogId, MediaType};
use crate::error::{AppError, AppResult};
use crate::integrations::traits::MediaCatalogClient;

const SERVICE: &str = "catalog";

/// Paged result wrapper shared by search, trending and popular
#[derive(Debug, Deserialize)]
struct PagedResponse {
    #[serde(default)]
    results: Vec<MediaItem>,
}

/// A movie, show or person as TMDB returns it
#[derive(Debug, Deserialize)]
struct MediaItem {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    vote_average: Option<f64>,
    popularity: Option<f64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u32>,
}

/// How the client authenticates
#[derive(Debug, Clone)]
enum Credential {
    /// v3 API key, sent as `api_key` query parameter
    ApiKey(String),

    /// v4 read access token, sent as bearer token
    Bearer(String),
}

impl Credential {
    fn label(&self) -> &'static str {
        match self {
            Credential::ApiKey(_) => "api key",
            Credential::Bearer(_) => "bearer token",
        }
    }
}

/// Rate limiter state
struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// TMDB API Client
pub struct TmdbClient {
    base_url: String,
    language: String,
    http_client: Client,
    rate_limiter: Mutex<RateLimiter>,
    credential: Credential,
}

impl TmdbClient {
    /// Create a client from config. A read access token is preferred over
    /// an API key; having neither is an error.
    pub fn new(config: &CatalogConfig) -> AppResult<Self> {
        let credential = match (config.valid_access_token(), config.valid_api_key()) {
            (Some(token), _) => Credential::Bearer(token.to_string()),
            (None, Some(key)) => Credential::ApiKey(key.to_string()),
            (None, None) => {
                return Err(AppError::NotConfigured(
                    "catalog API key or access token".to_string(),
                ))
            }
        };
        debug!("TMDB client authenticating with {}", credential.label());

        let http_client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            http_client,
            rate_limiter: Mutex::new(RateLimiter::new(config.min_request_interval())),
            credential,
        })
    }

    // ========================================================================
    // INTERNAL: Request Execution
    // ========================================================================

    /// GET a paged endpoint and map its results.
    ///
    /// `default_type` applies to endpoints whose items carry no `media_type`.
    async fn fetch_paged(
        &self,
        path: &str,
        params: &[(&str, &str)],
        default_type: MediaType,
    ) -> AppResult<Vec<CatalogEntry>> {
        self.rate_limiter.lock().await.wait_if_needed().await;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http_client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&[("language", self.language.as_str()), ("page", "1")])
            .query(params);

        request = match &self.credential {
            Credential::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
            Credential::Bearer(token) => {
                request.header(header::AUTHORIZATION, format!("Bearer {}", token))
            }
        };

        debug!("TMDB request: {}", path);
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(AppError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let page: PagedResponse = response.json().await?;
        Ok(Self::map_results(page, default_type))
    }

    fn map_results(page: PagedResponse, default_type: MediaType) -> Vec<CatalogEntry> {
        page.results
            .into_iter()
            .filter_map(|item| Self::map_item(item, default_type))
            .collect()
    }

    /// Map a TMDB item to a CatalogEntry. Returns None for people and for
    /// items without any title.
    fn map_item(item: MediaItem, default_type: MediaType) -> Option<CatalogEntry> {
        let media_type = match item.media_type.as_deref() {
            Some("movie") => MediaType::Movie,
            Some("tv") => MediaType::Tv,
            Some(_) => return None,
            None => default_type,
        };

        let title = item
            .title
            .or(item.name)
            .filter(|t| !t.trim().is_empty())?;

        Some(CatalogEntry {
            id: CatalogId {
                media_type,
                id: item.id,
            },
            title,
            synopsis: item.overview.unwrap_or_default(),
            rating: item.vote_average.unwrap_or(0.0),
            popularity: item.popularity.unwrap_or(0.0),
            release_date: item.release_date.or(item.first_air_date),
            poster_path: item.poster_path,
            genre_ids: item.genre_ids,
        })
    }
}

#[async_trait]
impl MediaCatalogClient for TmdbClient {
    async fn search_by_text(&self, query: &str) -> AppResult<Vec<CatalogEntry>> {
        self.fetch_paged(
            "/search/multi",
            &[("query", query), ("include_adult", "false")],
            MediaType::Movie,
        )
        .await
    }

    async fn get_trending(&self) -> AppResult<Vec<CatalogEntry>> {
        self.fetch_paged("/trending/all/week", &[], MediaType::Movie)
            .await
    }

    async fn get_popular(&self) -> AppResult<Vec<CatalogEntry>> {
        self.fetch_paged("/movie/popular", &[], MediaType::Movie)
            .await
    }
}

// src/integrations/gemini/client.rs
//
// Gemini generateContent integration.
//
// Returns the model's raw text. Parsing happens in the response normalizer,
// never here: the model is free to wrap its JSON in prose or code fences.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::InferenceConfig;
use crate::domain::{Artifact, ArtifactContent};
use crate::error::{AppError, AppResult};
use crate::integrations::traits::InferenceService;

const SERVICE: &str = "inference";

const IMAGE_PROMPT: &str = r#"Identify the movie, TV series or anime this image is from.
Answer with a single JSON object and nothing else, using these fields:
{
  "isAnime": boolean,
  "category": "anime" | "live-action" | "animation" | "unknown",
  "detectedTitle": string or null,
  "characters": [string],
  "genre": string or null,
  "confidence": number between 0 and 1,
  "keywords": [string],
  "similarTitles": [string]
}"#;

const TEXT_PROMPT: &str = r#"A viewer describes the mood or theme they want to watch.
Suggest matching movies, TV series or anime.
Answer with a single JSON object and nothing else, using these fields:
{
  "isAnime": boolean,
  "category": "anime" | "live-action" | "animation" | "unknown",
  "detectedTitle": best single matching title or null,
  "characters": [],
  "genre": string or null,
  "confidence": number between 0 and 1,
  "keywords": [search keywords],
  "similarTitles": [other matching titles]
}
Description: "#;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini API Client
pub struct GeminiClient {
    base_url: String,
    model: String,
    http_client: Client,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Create a client from config. A missing API key yields an unconfigured
    /// client rather than an error.
    pub fn new(config: &InferenceConfig) -> AppResult<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http_client,
            api_key: config
                .api_key
                .as_deref()
                .filter(|_| config.is_configured())
                .map(|key| key.trim().to_string()),
        })
    }

    /// A client that reports itself as unconfigured
    pub fn unconfigured() -> AppResult<Self> {
        Self::new(&InferenceConfig::default())
    }

    fn request_body(artifact: &Artifact) -> Value {
        let parts = match artifact.content() {
            ArtifactContent::Bytes(bytes) => {
                let mime_type = artifact
                    .metadata()
                    .media_type
                    .clone()
                    .unwrap_or_else(|| "image/jpeg".to_string());
                json!([
                    { "text": IMAGE_PROMPT },
                    { "inline_data": { "mime_type": mime_type, "data": STANDARD.encode(bytes) } }
                ])
            }
            ArtifactContent::Text(text) => json!([
                { "text": format!("{}{}", TEXT_PROMPT, text.trim()) }
            ]),
        };

        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": { "temperature": 0.2 }
        })
    }

    /// Concatenate the text parts of the first candidate
    fn extract_text(response: GenerateResponse) -> AppResult<String> {
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::Inference(
                "model returned no text candidates".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, artifact: &Artifact) -> AppResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::NotConfigured("inference API key".to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!("Submitting {} artifact {} for inference", artifact.kind(), artifact.id());

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .header(header::CONTENT_TYPE, "application/json")
            .json(&Self::request_body(artifact))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        Self::extract_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_client() {
        let client = GeminiClient::unconfigured().unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let config = InferenceConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!GeminiClient::new(&config).unwrap().is_configured());
    }

    #[test]
    fn test_client_agrees_with_config_on_key() {
        let config = InferenceConfig {
            api_key: Some(" key ".to_string()),
            ..Default::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.is_configured(), config.is_configured());
        assert_eq!(client.api_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn test_analyze_without_key_fails_fast() {
        let client = GeminiClient::unconfigured().unwrap();
        let result = client.analyze(&Artifact::text("sad robots")).await;
        assert!(matches!(result, Err(AppError::NotConfigured(_))));
    }

    #[test]
    fn test_image_request_body_inlines_base64() {
        let artifact = Artifact::image(vec![0xff, 0xd8], Some("still.jpg".to_string()), None);
        let body = GeminiClient::request_body(&artifact);
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9g=");
    }

    #[test]
    fn test_text_request_body_embeds_description() {
        let body = GeminiClient::request_body(&Artifact::text("  cozy heist  "));
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.ends_with("Description: cozy heist"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"```json\n{"},{"text":"}\n```"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiClient::extract_text(response).unwrap(), "```json\n{}\n```");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiClient::extract_text(response),
            Err(AppError::Inference(_))
        ));
    }
}

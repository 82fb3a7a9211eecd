// src/main.rs
//
// Command-line entry point.
//
//   media-resolver <image-path>
//   media-resolver --text "<mood or theme>"
//
// Prints the resolution result as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use env_logger::{Builder, Target};
use log::{info, LevelFilter};

use media_resolver::application::commands::{resolve_artifact, resolve_image_file};
use media_resolver::application::{AppState, ResolveArtifactDto};
use media_resolver::integrations::{GeminiClient, InferenceService, TmdbClient};
use media_resolver::{ResolutionService, ResolverConfig};

enum Request {
    Image(PathBuf),
    Text(String),
}

fn init_logger() {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }
    Builder::new()
        .target(Target::Stderr)
        .filter_level(LevelFilter::Warn)
        .filter_module("media_resolver", LevelFilter::Info)
        .init();
}

fn parse_args() -> anyhow::Result<Request> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(flag), Some(text)) if flag == "--text" => Ok(Request::Text(text)),
        (Some(path), None) if !path.starts_with("--") => Ok(Request::Image(PathBuf::from(path))),
        _ => bail!("usage: media-resolver <image-path> | media-resolver --text \"<description>\""),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let request = parse_args()?;

    // 1. CONFIGURATION
    let config = ResolverConfig::load().context("failed to load resolver config")?;

    // 2. COLLABORATORS
    let catalog = Arc::new(
        TmdbClient::new(&config.catalog)
            .context("a catalog credential is required (set TMDB_ACCESS_TOKEN or TMDB_API_KEY)")?,
    );
    let inference = GeminiClient::new(&config.inference).context("failed to build inference client")?;
    if !inference.is_configured() {
        info!("No inference API key; resolving from heuristics only");
    }
    let inference: Arc<dyn InferenceService> = Arc::new(inference);

    // 3. APPLICATION STATE
    let state = AppState::new(ResolutionService::new(config, catalog, Some(inference)));

    // 4. RESOLVE
    let outcome = match request {
        Request::Image(path) => resolve_image_file(&path, &state).await,
        Request::Text(text) => {
            let dto = ResolveArtifactDto {
                kind: "text".to_string(),
                file_name: None,
                mime_type: None,
                data_base64: None,
                text: Some(text),
            };
            resolve_artifact(dto, &state).await
        }
    };

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(error_json) => bail!("request rejected: {}", error_json),
    }
}

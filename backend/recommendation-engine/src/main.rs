use anyhow::{Context, Result};
use recommendation_engine::config::LogFormat;
use recommendation_engine::{
    Config, InMemoryContentStore, InMemoryInterestStore, RecommendationContext,
    RecommendationEngine,
};
use std::env;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = Config::from_env().context("Failed to load config")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.service.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    info!(
        service = %config.service.service_name,
        candidates_path = %config.service.candidates_path,
        "Starting recommendation run"
    );

    let content = InMemoryContentStore::from_json_file(&config.service.candidates_path)?;
    let interests = match &config.service.profiles_path {
        Some(path) => InMemoryInterestStore::from_json_file(path)?,
        None => InMemoryInterestStore::default(),
    };

    info!(candidate_count = content.len(), "Candidates loaded");

    let engine = RecommendationEngine::new(
        Arc::new(content),
        Arc::new(interests),
        config.recommendation.clone(),
        config.pools.clone(),
    )?;

    let context = context_from_env()?;
    let items = engine.compose_mixed(&context).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&items).context("Failed to serialize recommendations")?
    );

    Ok(())
}

/// SEED_ITEM_ID, VIEWER_ID, CATEGORY_ID, EXCLUDE_IDS (comma separated), LIMIT
fn context_from_env() -> Result<RecommendationContext> {
    let mut context = RecommendationContext::default();

    if let Some(seed) = uuid_var("SEED_ITEM_ID")? {
        context = context.with_seed(seed);
    }
    if let Some(viewer) = uuid_var("VIEWER_ID")? {
        context = context.with_viewer(viewer);
    }
    if let Some(category) = uuid_var("CATEGORY_ID")? {
        context = context.with_category(category);
    }
    if let Ok(raw) = env::var("EXCLUDE_IDS") {
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Uuid::parse_str(s).with_context(|| format!("Invalid id in EXCLUDE_IDS: {}", s)))
            .collect::<Result<Vec<_>>>()?;
        context = context.excluding(ids);
    }
    if let Ok(raw) = env::var("LIMIT") {
        let limit = raw.parse().context("LIMIT must be a positive integer")?;
        context = context.with_limit(limit);
    }

    Ok(context)
}

fn uuid_var(key: &str) -> Result<Option<Uuid>> {
    match env::var(key) {
        Ok(raw) => Uuid::parse_str(raw.trim())
            .map(Some)
            .with_context(|| format!("{} must be a UUID", key)),
        Err(_) => Ok(None),
    }
}

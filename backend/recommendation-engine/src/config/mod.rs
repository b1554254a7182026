use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub pools: PoolConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub log_format: LogFormat,
    pub candidates_path: String,
    pub profiles_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown LOG_FORMAT '{}'",
                other
            ))),
        }
    }
}

/// Batch-size caps applied to repository queries
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub recent_pool_size: usize,
    pub popular_pool_size: usize,
    pub trending_pool_size: usize,
    pub editorial_pool_size: usize,
    pub category_pool_size: usize,
    pub trending_window_days: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            recent_pool_size: 100,
            popular_pool_size: 200,
            trending_pool_size: 100,
            editorial_pool_size: 20,
            category_pool_size: 100,
            trending_window_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub recency: f64,
    pub popularity: f64,
    pub engagement: f64,
    pub relevance: f64,
    pub personalization: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency: 0.2,
            popularity: 0.15,
            engagement: 0.15,
            relevance: 0.3,
            personalization: 0.2,
        }
    }
}

/// Tunables of the scorer. Treated as data: callers build or load one and the
/// engine validates it once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub weights: ScoringWeights,
    pub recency_half_life_days: f64,
    pub min_score: f64,
    pub diversity_factor: f64,
    /// Comments count this many reactions in the engagement rate
    pub engagement_comment_weight: f64,
    pub engagement_scale: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            recency_half_life_days: 7.0,
            min_score: 0.1,
            diversity_factor: 0.3,
            engagement_comment_weight: 2.0,
            engagement_scale: 10.0,
        }
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("recency", self.weights.recency),
            ("popularity", self.weights.popularity),
            ("engagement", self.weights.engagement),
            ("relevance", self.weights.relevance),
            ("personalization", self.weights.personalization),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "weight '{}' must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !self.recency_half_life_days.is_finite() || self.recency_half_life_days <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "recency half-life must be positive, got {}",
                self.recency_half_life_days
            )));
        }

        if !self.min_score.is_finite() {
            return Err(EngineError::InvalidConfig(
                "min_score must be finite".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.diversity_factor) {
            return Err(EngineError::InvalidConfig(format!(
                "diversity factor must be within [0, 1], got {}",
                self.diversity_factor
            )));
        }

        if !(self.engagement_comment_weight > 0.0 && self.engagement_scale > 0.0) {
            return Err(EngineError::InvalidConfig(
                "engagement calibration constants must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply `RECOMMENDATION_*` overrides on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let overrides = envy::prefixed("RECOMMENDATION_")
            .from_env::<RecommendationOverrides>()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let config = overrides.apply(Self::default());
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationOverrides {
    recency_weight: Option<f64>,
    popularity_weight: Option<f64>,
    engagement_weight: Option<f64>,
    relevance_weight: Option<f64>,
    personalization_weight: Option<f64>,
    half_life_days: Option<f64>,
    min_score: Option<f64>,
    diversity_factor: Option<f64>,
    engagement_comment_weight: Option<f64>,
    engagement_scale: Option<f64>,
}

impl RecommendationOverrides {
    fn apply(self, mut config: RecommendationConfig) -> RecommendationConfig {
        let weights = &mut config.weights;
        weights.recency = self.recency_weight.unwrap_or(weights.recency);
        weights.popularity = self.popularity_weight.unwrap_or(weights.popularity);
        weights.engagement = self.engagement_weight.unwrap_or(weights.engagement);
        weights.relevance = self.relevance_weight.unwrap_or(weights.relevance);
        weights.personalization = self
            .personalization_weight
            .unwrap_or(weights.personalization);

        config.recency_half_life_days = self
            .half_life_days
            .unwrap_or(config.recency_half_life_days);
        config.min_score = self.min_score.unwrap_or(config.min_score);
        config.diversity_factor = self.diversity_factor.unwrap_or(config.diversity_factor);
        config.engagement_comment_weight = self
            .engagement_comment_weight
            .unwrap_or(config.engagement_comment_weight);
        config.engagement_scale = self.engagement_scale.unwrap_or(config.engagement_scale);
        config
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = PoolConfig::default();

        Ok(Config {
            service: ServiceConfig {
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "recommendation-engine".to_string()),
                log_format: env::var("LOG_FORMAT")
                    .unwrap_or_else(|_| "pretty".to_string())
                    .parse()?,
                candidates_path: env::var("CANDIDATES_PATH")
                    .unwrap_or_else(|_| "fixtures/candidates.json".to_string()),
                profiles_path: env::var("PROFILES_PATH").ok(),
            },
            pools: PoolConfig {
                recent_pool_size: parse_var("RECENT_POOL_SIZE", defaults.recent_pool_size)?,
                popular_pool_size: parse_var("POPULAR_POOL_SIZE", defaults.popular_pool_size)?,
                trending_pool_size: parse_var("TRENDING_POOL_SIZE", defaults.trending_pool_size)?,
                editorial_pool_size: parse_var(
                    "EDITORIAL_POOL_SIZE",
                    defaults.editorial_pool_size,
                )?,
                category_pool_size: parse_var("CATEGORY_POOL_SIZE", defaults.category_pool_size)?,
                trending_window_days: parse_var(
                    "TRENDING_WINDOW_DAYS",
                    defaults.trending_window_days,
                )?,
            },
            recommendation: RecommendationConfig::from_env()?,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| {
            EngineError::InvalidConfig(format!("{} must be a valid number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

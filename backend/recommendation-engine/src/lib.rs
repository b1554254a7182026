pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod utils;

pub use config::{Config, RecommendationConfig};
pub use engine::RecommendationEngine;
pub use error::{EngineError, Result};
pub use models::{CandidateItem, InterestProfile, RecommendationContext, RecommendationReason, ScoredItem};
pub use repository::{ContentRepository, InMemoryContentStore, InMemoryInterestStore, InterestStore};
pub use services::{DiversityLayer, MixedComposer, RecommendationStrategy};

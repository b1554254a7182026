pub mod diversity;
pub mod mixed;
pub mod scoring;
pub mod signals;
pub mod strategies;

pub use diversity::{diversify, DiversityLayer};
pub use mixed::{merge_by_priority, CompositionStats, MixedComposer, MixedSlot, SlotOutcome};
pub use scoring::CandidateScorer;
pub use strategies::{RecommendationStrategy, StrategyKind, StrategyRequest};

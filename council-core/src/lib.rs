//! # Council Core
//!
//! Expert-response weighting and synthesis scoring for The Council.
//! Provides model quality lookup, per-response weighting, weight normalization,
//! weighted aggregation, synthesis cache keys and the judgment pipeline that
//! blends several LLM answers into one ranked verdict.
//!
//! Everything here is synchronous, pure computation over in-memory data.

pub mod cache_key;
pub mod config;
pub mod contradictions;
pub mod error;
pub mod judge;
pub mod model_quality;
pub mod signals;
pub mod synthesis;
pub mod types;
pub mod weights;

// Re-export commonly used types at the crate root.
pub use cache_key::{SynthesisCacheKey, compute_cache_key};
pub use config::{CouncilConfig, load_config};
pub use error::{ConfigError, CouncilError, Result, WeightingError};
pub use judge::{JudgmentScorer, NO_VALID_RESPONSES};
pub use model_quality::ModelQualityTable;
pub use signals::{ClaimExtractor, ConfidenceExtractor};
pub use types::{
    ConfidenceLevel, Contradiction, ContradictionKind, ExpertResponse, JudgmentResult,
    NormalizedWeight, ResponseStatus, ScoreBreakdown, WeightFactors, WeightedEntry, WeightedValue,
};
pub use weights::{WeightCalculator, calculate_weighted_average, normalize_weights};

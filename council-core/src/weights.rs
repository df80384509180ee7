//! Expert weighting: raw weights, normalization and weighted aggregation.
//!
//! The three steps are kept separate so each can be tested on its own:
//! 1. [`WeightCalculator`] turns each response into a raw weight from model
//!    quality, confidence and content quality.
//! 2. [`normalize_weights`] rescales raw weights into a distribution summing to 1.
//! 3. [`calculate_weighted_average`] combines per-expert scalars using weights
//!    the caller has already normalized.

use tracing::debug;

use crate::config::{ContentConfig, CouncilConfig, WeightConfig};
use crate::error::WeightingError;
use crate::model_quality::ModelQualityTable;
use crate::signals::{ConfidenceExtractor, ContentSignals, MarkerConfidenceExtractor};
use crate::types::{ExpertResponse, NormalizedWeight, WeightFactors, WeightedEntry, WeightedValue};

/// Computes per-response raw weights.
///
/// All collaborators are injected, so two calculators never share hidden state.
pub struct WeightCalculator {
    models: ModelQualityTable,
    confidence: Box<dyn ConfidenceExtractor>,
    weights: WeightConfig,
    content: ContentConfig,
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new(
            ModelQualityTable::default(),
            WeightConfig::default(),
            ContentConfig::default(),
        )
    }
}

impl WeightCalculator {
    /// Create a calculator using the default marker-based confidence extractor.
    pub fn new(models: ModelQualityTable, weights: WeightConfig, content: ContentConfig) -> Self {
        Self {
            models,
            confidence: Box::new(MarkerConfidenceExtractor::new()),
            weights,
            content,
        }
    }

    pub fn from_config(config: &CouncilConfig) -> Self {
        Self::new(
            ModelQualityTable::from_config(&config.models),
            config.weights.clone(),
            config.content.clone(),
        )
    }

    /// Replace the confidence extraction strategy.
    pub fn with_confidence_extractor(mut self, extractor: Box<dyn ConfidenceExtractor>) -> Self {
        self.confidence = extractor;
        self
    }

    pub fn models(&self) -> &ModelQualityTable {
        &self.models
    }

    pub fn content_config(&self) -> &ContentConfig {
        &self.content
    }

    /// Raw weight for every response, in input order. Empty in, empty out.
    pub fn calculate_expert_weights(&self, responses: &[ExpertResponse]) -> Vec<WeightedEntry> {
        responses.iter().map(|response| self.weigh(response)).collect()
    }

    /// Raw weight of a single response.
    pub fn weigh(&self, response: &ExpertResponse) -> WeightedEntry {
        let factors = self.factors(response);
        let weight = self.combine(&factors);
        debug!(
            expert = response.expert_id.as_str(),
            model = response.model.as_str(),
            model_quality = factors.model_quality,
            confidence = factors.confidence_factor,
            content = factors.content_quality,
            weight,
            "Computed expert weight"
        );
        WeightedEntry {
            expert_id: response.expert_id.clone(),
            weight,
            factors,
        }
    }

    /// The three weight factors of one response.
    pub fn factors(&self, response: &ExpertResponse) -> WeightFactors {
        WeightFactors {
            model_quality: self.models.lookup(&response.model),
            confidence_factor: self.confidence_factor(response),
            content_quality: self.content_quality(&ContentSignals::from_text(&response.output)),
        }
    }

    /// Reported confidence, else a marker in the text, else the configured default.
    pub fn confidence_factor(&self, response: &ExpertResponse) -> f64 {
        response
            .reported_confidence()
            .or_else(|| {
                self.confidence
                    .extract(&response.output)
                    .filter(|c| c.is_finite())
                    .map(|c| c.clamp(0.0, 1.0))
            })
            .unwrap_or(self.weights.default_confidence)
    }

    /// Content quality in [min_quality, 1]. Never decreases with length or structure.
    pub fn content_quality(&self, signals: &ContentSignals) -> f64 {
        let min = self.content.min_quality;
        let length = signals.length_score(self.content.saturation_chars);
        let structure = signals.structure_score();
        let raw = self.content.length_share * length + (1.0 - self.content.length_share) * structure;
        (min + (1.0 - min) * raw).clamp(min, 1.0)
    }

    fn combine(&self, factors: &WeightFactors) -> f64 {
        self.weights.model * factors.model_quality
            + self.weights.confidence * factors.confidence_factor
            + self.weights.content * factors.content_quality
    }
}

/// Rescale raw weights so they sum to 1.
///
/// Negative and non-finite weights count as 0. When every weight is 0 the
/// result is uniform (`1/n`), so any non-empty input yields a distribution.
/// Order and count are preserved.
pub fn normalize_weights<S: AsRef<str>>(entries: &[(S, f64)]) -> Vec<NormalizedWeight> {
    let sanitized: Vec<f64> = entries
        .iter()
        .map(|(_, w)| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    // Scale by the largest weight first so the sum stays finite.
    let max = sanitized.iter().copied().fold(0.0, f64::max);
    let scaled: Vec<f64> = sanitized
        .iter()
        .map(|w| if max > 0.0 { w / max } else { 0.0 })
        .collect();
    let total: f64 = scaled.iter().sum();
    let uniform = 1.0 / entries.len().max(1) as f64;

    entries
        .iter()
        .zip(scaled)
        .map(|((id, raw), weight)| NormalizedWeight {
            expert_id: id.as_ref().to_string(),
            weight: *raw,
            normalized_weight: if total > 0.0 { weight / total } else { uniform },
        })
        .collect()
}

/// Σ value·weight over pre-normalized weights.
///
/// A single value is returned unchanged whatever its weight. Zero values is the
/// one error the weighting math surfaces.
pub fn calculate_weighted_average(values: &[WeightedValue]) -> Result<f64, WeightingError> {
    match values {
        [] => Err(WeightingError::EmptyInput),
        [only] => Ok(only.value),
        _ => Ok(values.iter().map(|v| v.value * v.weight).sum()),
    }
}

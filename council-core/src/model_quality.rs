//! Baseline quality scores per model identifier.
//!
//! The curated table uses provider-qualified ids (`provider/model`) as served
//! by OpenRouter-style gateways. Lookups fall back to the bare model name, and
//! anything unrecognized gets the configured default. Lookup never fails.

use std::collections::BTreeMap;

use crate::config::ModelQualityConfig;

/// Score returned for unknown models when no config is supplied.
pub const DEFAULT_MODEL_QUALITY: f64 = 0.5;

const CURATED_MODELS: &[(&str, f64)] = &[
    // Frontier
    ("openai/gpt-4", 0.95),
    ("openai/gpt-4o", 0.95),
    ("openai/gpt-4-turbo", 0.93),
    ("openai/o1", 0.96),
    ("anthropic/claude-3-opus", 0.95),
    ("anthropic/claude-3.5-sonnet", 0.94),
    ("anthropic/claude-sonnet-4", 0.95),
    ("google/gemini-1.5-pro", 0.90),
    ("google/gemini-pro", 0.85),
    ("deepseek/deepseek-chat", 0.86),
    ("meta-llama/llama-3.1-405b-instruct", 0.88),
    // Mid-tier
    ("openai/gpt-4o-mini", 0.80),
    ("openai/gpt-3.5-turbo", 0.70),
    ("anthropic/claude-3-sonnet", 0.88),
    ("anthropic/claude-3-haiku", 0.75),
    ("google/gemini-flash-1.5", 0.75),
    ("meta-llama/llama-3-70b-instruct", 0.80),
    ("meta-llama/llama-3-8b-instruct", 0.62),
    ("mistralai/mistral-large", 0.82),
    ("mistralai/mixtral-8x7b-instruct", 0.70),
    ("mistralai/mistral-7b-instruct", 0.60),
    ("qwen/qwen-2-72b-instruct", 0.78),
];

/// Lookup table from model id to baseline quality in [0, 1].
#[derive(Debug, Clone)]
pub struct ModelQualityTable {
    scores: BTreeMap<String, f64>,
    default_score: f64,
}

impl Default for ModelQualityTable {
    fn default() -> Self {
        Self {
            scores: CURATED_MODELS
                .iter()
                .map(|(model, score)| (model.to_string(), *score))
                .collect(),
            default_score: DEFAULT_MODEL_QUALITY,
        }
    }
}

impl ModelQualityTable {
    /// Curated table with config overrides layered on top.
    pub fn from_config(config: &ModelQualityConfig) -> Self {
        let mut table = Self::default().with_default_score(config.default_score);
        for (model, score) in &config.overrides {
            table.insert(model, *score);
        }
        table
    }

    pub fn with_default_score(mut self, score: f64) -> Self {
        self.default_score = clamp_unit(score);
        self
    }

    /// Add or replace a model's score. Values are clamped into [0, 1].
    pub fn insert(&mut self, model: &str, score: f64) {
        self.scores.insert(normalize_id(model), clamp_unit(score));
    }

    pub fn default_score(&self) -> f64 {
        self.default_score
    }

    /// Baseline quality for `model`, or the default when unrecognized.
    pub fn lookup(&self, model: &str) -> f64 {
        self.find(model).unwrap_or(self.default_score)
    }

    /// Whether `model` resolves to a curated or configured entry.
    pub fn is_known(&self, model: &str) -> bool {
        self.find(model).is_some()
    }

    /// All entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores.iter().map(|(model, score)| (model.as_str(), *score))
    }

    fn find(&self, model: &str) -> Option<f64> {
        let id = normalize_id(model);
        if id.is_empty() {
            return None;
        }
        if let Some(score) = self.scores.get(&id) {
            return Some(*score);
        }

        // "provider/model" not in the table: retry with the bare name.
        let bare = match id.rsplit_once('/') {
            Some((_, name)) => name,
            None => id.as_str(),
        };
        if bare != id {
            if let Some(score) = self.scores.get(bare) {
                return Some(*score);
            }
        }

        // Bare name: match the model part of qualified entries.
        self.scores
            .iter()
            .find(|(key, _)| key.rsplit_once('/').is_some_and(|(_, name)| name == bare))
            .map(|(_, score)| *score)
    }
}

fn normalize_id(model: &str) -> String {
    model.trim().to_lowercase()
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_MODEL_QUALITY
    }
}

//! Configuration system for the Council synthesis core.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/council/config.toml` and/or
//! `.council/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;

const SUM_TOLERANCE: f64 = 1e-6;

/// Top-level configuration for weighting and judging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouncilConfig {
    #[serde(default)]
    pub weights: WeightConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub models: ModelQualityConfig,
}

/// Coefficients of the raw weight formula. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Coefficient applied to the model quality factor.
    pub model: f64,
    /// Coefficient applied to the confidence factor.
    pub confidence: f64,
    /// Coefficient applied to the content quality factor.
    pub content: f64,
    /// Confidence assumed when a response reports none and its text carries no marker.
    pub default_confidence: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            model: 0.4,
            confidence: 0.3,
            content: 0.3,
            default_confidence: 0.7,
        }
    }
}

/// Content-quality heuristic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Output length (in characters) at which the length score saturates.
    pub saturation_chars: usize,
    /// Floor for content quality, applied to empty output.
    pub min_quality: f64,
    /// Share of the length score in content quality; structure takes the rest.
    pub length_share: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            saturation_chars: 1500,
            min_quality: 0.1,
            length_share: 0.6,
        }
    }
}

/// Judgment scoring, contradiction and synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub accuracy_weight: f64,
    pub completeness_weight: f64,
    pub conciseness_weight: f64,
    /// Share of `total` driven by the response's normalized weight.
    pub weight_share: f64,
    /// Accuracy points lost per contradiction involving the response.
    pub contradiction_penalty: f64,
    /// Word count up to which conciseness is a full 100.
    pub ideal_word_count: usize,
    pub min_conciseness: f64,
    /// Share of overall confidence driven by inter-expert agreement.
    pub agreement_weight: f64,
    pub high_confidence_threshold: f64,
    pub medium_confidence_threshold: f64,
    /// Minimum content-word overlap for two statements to be about the same thing.
    pub topic_overlap_threshold: f64,
    /// A point is novel when its overlap with everything already synthesized is below this.
    pub novelty_threshold: f64,
    /// Number of responses the unified response may draw from.
    pub max_synthesis_sources: usize,
    /// Novel points taken from a secondary response carrying the top weight.
    pub max_points_per_source: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            accuracy_weight: 0.4,
            completeness_weight: 0.35,
            conciseness_weight: 0.25,
            weight_share: 0.2,
            contradiction_penalty: 15.0,
            ideal_word_count: 400,
            min_conciseness: 20.0,
            agreement_weight: 0.5,
            high_confidence_threshold: 0.8,
            medium_confidence_threshold: 0.5,
            topic_overlap_threshold: 0.6,
            novelty_threshold: 0.5,
            max_synthesis_sources: 3,
            max_points_per_source: 4,
        }
    }
}

/// Model quality table settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelQualityConfig {
    /// Score for unknown models.
    pub default_score: f64,
    /// Per-model scores layered on top of the curated table.
    pub overrides: BTreeMap<String, f64>,
}

impl Default for ModelQualityConfig {
    fn default() -> Self {
        Self {
            default_score: 0.5,
            overrides: BTreeMap::new(),
        }
    }
}

impl CouncilConfig {
    /// Check every invariant the weighting and judging math relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        check_unit("weights.model", w.model)?;
        check_unit("weights.confidence", w.confidence)?;
        check_unit("weights.content", w.content)?;
        check_unit("weights.default_confidence", w.default_confidence)?;
        check_sum("weights", &[w.model, w.confidence, w.content])?;

        let c = &self.content;
        if c.saturation_chars == 0 {
            return Err(invalid("content.saturation_chars must be greater than 0"));
        }
        check_unit("content.min_quality", c.min_quality)?;
        check_unit("content.length_share", c.length_share)?;

        let s = &self.scoring;
        check_unit("scoring.accuracy_weight", s.accuracy_weight)?;
        check_unit("scoring.completeness_weight", s.completeness_weight)?;
        check_unit("scoring.conciseness_weight", s.conciseness_weight)?;
        check_sum(
            "scoring dimension weights",
            &[s.accuracy_weight, s.completeness_weight, s.conciseness_weight],
        )?;
        check_unit("scoring.weight_share", s.weight_share)?;
        check_unit("scoring.agreement_weight", s.agreement_weight)?;
        check_unit("scoring.topic_overlap_threshold", s.topic_overlap_threshold)?;
        check_unit("scoring.novelty_threshold", s.novelty_threshold)?;
        check_unit(
            "scoring.high_confidence_threshold",
            s.high_confidence_threshold,
        )?;
        check_unit(
            "scoring.medium_confidence_threshold",
            s.medium_confidence_threshold,
        )?;
        if s.medium_confidence_threshold > s.high_confidence_threshold {
            return Err(invalid(
                "scoring.medium_confidence_threshold must not exceed scoring.high_confidence_threshold",
            ));
        }
        if !(0.0..=100.0).contains(&s.contradiction_penalty) {
            return Err(invalid(
                "scoring.contradiction_penalty must be within [0, 100]",
            ));
        }
        if !(0.0..=100.0).contains(&s.min_conciseness) {
            return Err(invalid("scoring.min_conciseness must be within [0, 100]"));
        }
        if s.ideal_word_count == 0 {
            return Err(invalid("scoring.ideal_word_count must be greater than 0"));
        }
        if s.max_synthesis_sources == 0 {
            return Err(invalid(
                "scoring.max_synthesis_sources must be greater than 0",
            ));
        }

        check_unit("models.default_score", self.models.default_score)?;
        for (model, score) in &self.models.overrides {
            check_unit(&format!("models.overrides.\"{model}\""), *score)?;
        }

        Ok(())
    }

    /// Render the configuration as TOML, e.g. to seed a config file.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be within [0, 1], got {value}")))
    }
}

fn check_sum(group: &str, values: &[f64]) -> Result<(), ConfigError> {
    let sum: f64 = values.iter().sum();
    if (sum - 1.0).abs() <= SUM_TOLERANCE {
        Ok(())
    } else {
        Err(invalid(format!("{group} must sum to 1, got {sum}")))
    }
}

/// Load configuration from all layers and validate the result.
///
/// An explicit `config_file` must exist; user and workspace files are optional.
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&CouncilConfig>,
) -> Result<CouncilConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(CouncilConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "council", "council") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".council").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (COUNCIL_WEIGHTS__MODEL, COUNCIL_SCORING__AGREEMENT_WEIGHT, etc.)
    figment = figment.merge(Env::prefixed("COUNCIL_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: CouncilConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

//! Core data types: expert responses in, weights and judgments out.
//!
//! Wire format is camelCase so JSON produced by the host application
//! deserializes directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of the upstream LLM call that produced a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Success,
    Error,
    Timeout,
    Cancelled,
}

impl ResponseStatus {
    pub fn is_success(self) -> bool {
        self == ResponseStatus::Success
    }

    /// Stable single-byte tag, used when hashing responses.
    pub(crate) fn tag(self) -> u8 {
        match self {
            ResponseStatus::Success => 0,
            ResponseStatus::Error => 1,
            ResponseStatus::Timeout => 2,
            ResponseStatus::Cancelled => 3,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Success => write!(f, "success"),
            ResponseStatus::Error => write!(f, "error"),
            ResponseStatus::Timeout => write!(f, "timeout"),
            ResponseStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One expert's answer for a judging round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertResponse {
    /// Opaque identifier, unique within one judging call.
    pub expert_id: String,
    /// Display label. Not used in scoring.
    #[serde(default)]
    pub expert_name: String,
    /// Model identifier, e.g. `openai/gpt-4`.
    #[serde(default)]
    pub model: String,
    /// Final response text.
    #[serde(default)]
    pub output: String,
    /// Self-reported confidence in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub status: ResponseStatus,
    /// Failure message for non-success statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExpertResponse {
    /// Create a successful response with no self-reported confidence.
    pub fn new(
        expert_id: impl Into<String>,
        model: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            expert_id: expert_id.into(),
            expert_name: String::new(),
            model: model.into(),
            output: output.into(),
            confidence: None,
            status: ResponseStatus::Success,
            error: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.expert_name = name.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_status(mut self, status: ResponseStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_error(mut self, status: ResponseStatus, message: impl Into<String>) -> Self {
        self.status = status;
        self.error = Some(message.into());
        self
    }

    /// Self-reported confidence, clamped into [0, 1]. Non-finite values count as absent.
    pub fn reported_confidence(&self) -> Option<f64> {
        self.confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
    }

    /// Name shown in commentary and synthesis attributions.
    pub fn display_name(&self) -> &str {
        if self.expert_name.trim().is_empty() {
            &self.expert_id
        } else {
            &self.expert_name
        }
    }

    /// A response missing its output or model still gets judged, just poorly.
    pub fn is_malformed(&self) -> bool {
        self.output.trim().is_empty() || self.model.trim().is_empty()
    }
}

/// The three inputs to a response's raw weight, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightFactors {
    pub model_quality: f64,
    pub confidence_factor: f64,
    pub content_quality: f64,
}

/// Raw weight computed for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedEntry {
    pub expert_id: String,
    pub weight: f64,
    pub factors: WeightFactors,
}

/// A raw weight together with its share of the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedWeight {
    pub expert_id: String,
    pub weight: f64,
    pub normalized_weight: f64,
}

/// A scalar paired with the (pre-normalized) weight it contributes with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    pub value: f64,
    pub weight: f64,
}

impl WeightedValue {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

impl From<(f64, f64)> for WeightedValue {
    fn from((value, weight): (f64, f64)) -> Self {
        Self { value, weight }
    }
}

/// Per-expert quality dimensions, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub accuracy: f64,
    pub completeness: f64,
    pub conciseness: f64,
    pub total: f64,
}

/// How two responses disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    /// Each response recommends a different option as the best one.
    CompetingRecommendation,
    /// One response states what the other explicitly negates.
    Negation,
}

/// A detected disagreement between two experts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contradiction {
    pub first_expert: String,
    pub second_expert: String,
    pub kind: ContradictionKind,
    /// Human-readable disagreement statement.
    pub description: String,
}

impl Contradiction {
    pub fn involves(&self, expert_id: &str) -> bool {
        self.first_expert == expert_id || self.second_expert == expert_id
    }
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Coarse bucket for the overall judgment confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::High => write!(f, "high"),
        }
    }
}

/// The structured verdict over one set of expert responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentResult {
    pub score_breakdown: BTreeMap<String, ScoreBreakdown>,
    /// Overall agreement/quality scalar in [0, 1].
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub contradictions: Vec<Contradiction>,
    pub unified_response: String,
    pub judge_commentary: String,
    /// Normalized weights of the judged responses, highest first.
    pub weights: Vec<NormalizedWeight>,
    /// Experts excluded because their upstream call did not succeed.
    pub failed_experts: Vec<String>,
}

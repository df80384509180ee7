//! Judgment scoring: turns a set of expert responses into one verdict.
//!
//! # Pipeline
//!
//! 1. **Filter**: responses whose upstream call failed are set aside.
//! 2. **Weight**: raw weights, then normalization over the successful set.
//! 3. **Score**: accuracy, completeness and conciseness per response.
//! 4. **Contradictions**: pairwise claim comparison.
//! 5. **Synthesize**: unified response led by the highest-weighted expert.
//! 6. **Confidence**: weighted confidence blended with inter-expert agreement.
//!
//! Judging is total: every input, including an empty one, produces a result.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::{CouncilConfig, ScoringConfig};
use crate::contradictions::ContradictionDetector;
use crate::signals::{ClaimExtractor, ContentSignals};
use crate::synthesis::{RankedResponse, build_unified_response};
use crate::types::{
    ConfidenceLevel, Contradiction, ExpertResponse, JudgmentResult, NormalizedWeight,
    ScoreBreakdown, WeightFactors, WeightedEntry, WeightedValue,
};
use crate::weights::{WeightCalculator, calculate_weighted_average, normalize_weights};

/// `unified_response` when nothing could be judged.
pub const NO_VALID_RESPONSES: &str =
    "No valid expert responses were available to synthesize a unified answer.";

// Accuracy leans on the model more than on self-reported confidence.
const ACCURACY_MODEL_SHARE: f64 = 0.6;
const COMPLETENESS_LENGTH_SHARE: f64 = 0.7;

/// Stateless judge over sets of expert responses.
pub struct JudgmentScorer {
    calculator: WeightCalculator,
    detector: ContradictionDetector,
    scoring: ScoringConfig,
}

impl Default for JudgmentScorer {
    fn default() -> Self {
        Self::new(WeightCalculator::default(), ScoringConfig::default())
    }
}

impl JudgmentScorer {
    pub fn new(calculator: WeightCalculator, scoring: ScoringConfig) -> Self {
        Self {
            detector: ContradictionDetector::new(scoring.topic_overlap_threshold),
            calculator,
            scoring,
        }
    }

    pub fn from_config(config: &CouncilConfig) -> Self {
        Self::new(WeightCalculator::from_config(config), config.scoring.clone())
    }

    /// Replace the claim extraction strategy used for contradiction detection.
    pub fn with_claim_extractor(mut self, extractor: Box<dyn ClaimExtractor>) -> Self {
        self.detector = self.detector.with_claim_extractor(extractor);
        self
    }

    pub fn calculator(&self) -> &WeightCalculator {
        &self.calculator
    }

    /// Judge a set of responses. Never fails.
    pub fn judge(&self, responses: &[ExpertResponse]) -> JudgmentResult {
        // Stage 1: Filter.
        let (successful, failed): (Vec<&ExpertResponse>, Vec<&ExpertResponse>) =
            responses.iter().partition(|r| r.status.is_success());
        if !failed.is_empty() {
            warn!(
                failed = failed.len(),
                total = responses.len(),
                "Excluding failed expert responses from judgment"
            );
        }
        if successful.is_empty() {
            return self.empty_judgment(responses.len(), &failed);
        }

        // Stage 2: Weight.
        let entries: Vec<_> = successful.iter().map(|r| self.calculator.weigh(r)).collect();
        let raw: Vec<(&str, f64)> = entries
            .iter()
            .map(|e| (e.expert_id.as_str(), e.weight))
            .collect();
        let normalized = normalize_weights(&raw);
        debug!(experts = successful.len(), "Weights normalized");

        // Stage 4 runs before scoring: accuracy is penalized per contradiction.
        let contradictions = if successful.len() > 1 {
            self.detector.detect(&successful)
        } else {
            Vec::new()
        };
        debug!(
            contradictions = contradictions.len(),
            "Contradiction detection complete"
        );

        // Stage 3: Score.
        let n = successful.len();
        let score_breakdown: BTreeMap<String, ScoreBreakdown> = successful
            .iter()
            .zip(&entries)
            .zip(&normalized)
            .map(|((response, entry), weight)| {
                let involved = contradictions
                    .iter()
                    .filter(|c| c.involves(&response.expert_id))
                    .count();
                let score = self.score(
                    response,
                    &entry.factors,
                    weight.normalized_weight,
                    n,
                    involved,
                );
                (response.expert_id.clone(), score)
            })
            .collect();

        // Stage 5: Synthesize.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            normalized[b]
                .normalized_weight
                .total_cmp(&normalized[a].normalized_weight)
        });
        let ranked: Vec<RankedResponse<'_>> = order
            .iter()
            .map(|&i| RankedResponse {
                response: successful[i],
                normalized_weight: normalized[i].normalized_weight,
            })
            .collect();
        let unified_response = if n == 1 {
            successful[0].output.clone()
        } else {
            let unified = build_unified_response(&ranked, &self.scoring);
            if unified.is_empty() {
                NO_VALID_RESPONSES.to_string()
            } else {
                unified
            }
        };

        // Stage 6: Confidence.
        let confidence = if n == 1 {
            entries[0].factors.confidence_factor
        } else {
            self.overall_confidence(&entries, &normalized, &contradictions)
        };
        let confidence_level = self.confidence_level(confidence);

        let weights: Vec<NormalizedWeight> = order.iter().map(|&i| normalized[i].clone()).collect();
        let judge_commentary = self.commentary(
            responses.len(),
            &successful,
            &failed,
            &ranked,
            &contradictions,
            confidence,
            confidence_level,
        );

        info!(
            experts = n,
            failed = failed.len(),
            contradictions = contradictions.len(),
            confidence,
            level = %confidence_level,
            "Judgment complete"
        );

        JudgmentResult {
            score_breakdown,
            confidence,
            confidence_level,
            contradictions,
            unified_response,
            judge_commentary,
            weights,
            failed_experts: failed.iter().map(|r| r.expert_id.clone()).collect(),
        }
    }

    fn empty_judgment(&self, total: usize, failed: &[&ExpertResponse]) -> JudgmentResult {
        let judge_commentary = if total == 0 {
            "No expert responses were provided, so there was nothing to judge.".to_string()
        } else {
            format!(
                "All {} expert responses failed ({}); no judgment could be formed.",
                total,
                describe_failures(failed)
            )
        };
        info!(failed = failed.len(), "Judgment skipped: no successful responses");

        JudgmentResult {
            score_breakdown: BTreeMap::new(),
            confidence: 0.0,
            confidence_level: ConfidenceLevel::Low,
            contradictions: Vec::new(),
            unified_response: NO_VALID_RESPONSES.to_string(),
            judge_commentary,
            weights: Vec::new(),
            failed_experts: failed.iter().map(|r| r.expert_id.clone()).collect(),
        }
    }

    /// Per-response score breakdown, each dimension in [0, 100].
    fn score(
        &self,
        response: &ExpertResponse,
        factors: &WeightFactors,
        normalized_weight: f64,
        n: usize,
        contradictions: usize,
    ) -> ScoreBreakdown {
        let s = &self.scoring;
        let signals = ContentSignals::from_text(&response.output);

        let accuracy = (100.0
            * (ACCURACY_MODEL_SHARE * factors.model_quality
                + (1.0 - ACCURACY_MODEL_SHARE) * factors.confidence_factor)
            - s.contradiction_penalty * contradictions as f64)
            .clamp(0.0, 100.0);

        let length = signals.length_score(self.calculator.content_config().saturation_chars);
        let completeness = (100.0
            * (COMPLETENESS_LENGTH_SHARE * length
                + (1.0 - COMPLETENESS_LENGTH_SHARE) * signals.structure_score()))
        .clamp(0.0, 100.0);

        let conciseness = if signals.words == 0 {
            0.0
        } else if signals.words <= s.ideal_word_count {
            100.0
        } else {
            (100.0 * s.ideal_word_count as f64 / signals.words as f64).max(s.min_conciseness)
        };

        let quality = s.accuracy_weight * accuracy
            + s.completeness_weight * completeness
            + s.conciseness_weight * conciseness;
        let share = (normalized_weight * n as f64).min(1.0) * 100.0;
        let total = ((1.0 - s.weight_share) * quality + s.weight_share * share).clamp(0.0, 100.0);

        ScoreBreakdown {
            accuracy,
            completeness,
            conciseness,
            total,
        }
    }

    fn overall_confidence(
        &self,
        entries: &[WeightedEntry],
        normalized: &[NormalizedWeight],
        contradictions: &[Contradiction],
    ) -> f64 {
        let values: Vec<WeightedValue> = entries
            .iter()
            .zip(normalized)
            .map(|(e, w)| WeightedValue::new(e.factors.confidence_factor, w.normalized_weight))
            .collect();
        let weighted = calculate_weighted_average(&values).unwrap_or(0.0);

        let n = entries.len();
        let pairs = n * n.saturating_sub(1) / 2;
        let agreement = if pairs == 0 {
            1.0
        } else {
            let disputed: HashSet<(&str, &str)> = contradictions
                .iter()
                .map(|c| (c.first_expert.as_str(), c.second_expert.as_str()))
                .collect();
            1.0 - disputed.len().min(pairs) as f64 / pairs as f64
        };

        let aw = self.scoring.agreement_weight;
        ((1.0 - aw) * weighted + aw * agreement).clamp(0.0, 1.0)
    }

    /// Bucket a confidence value using the configured thresholds.
    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        if confidence >= self.scoring.high_confidence_threshold {
            ConfidenceLevel::High
        } else if confidence >= self.scoring.medium_confidence_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn commentary(
        &self,
        total: usize,
        successful: &[&ExpertResponse],
        failed: &[&ExpertResponse],
        ranked: &[RankedResponse<'_>],
        contradictions: &[Contradiction],
        confidence: f64,
        level: ConfidenceLevel,
    ) -> String {
        let mut parts = vec![format!(
            "Judged {} of {} expert responses.",
            successful.len(),
            total
        )];

        if !failed.is_empty() {
            parts.push(format!(
                "Excluded {} failed response(s): {}.",
                failed.len(),
                describe_failures(failed)
            ));
        }

        let malformed = successful.iter().filter(|r| r.is_malformed()).count();
        if malformed > 0 {
            parts.push(format!(
                "{malformed} response(s) were missing output or model and were scored at minimum quality."
            ));
        }

        if let Some(top) = ranked.first() {
            let model = if top.response.model.trim().is_empty() {
                "unknown model"
            } else {
                top.response.model.as_str()
            };
            parts.push(format!(
                "Highest weighted: {} ({}, {:.1}% of total weight).",
                top.response.display_name(),
                model,
                top.normalized_weight * 100.0
            ));
        }

        if successful.len() > 1 {
            if contradictions.is_empty() {
                parts.push("No contradictions detected between experts.".to_string());
            } else {
                parts.push(format!(
                    "Detected {} contradiction(s); treat the disputed points with care.",
                    contradictions.len()
                ));
            }
        }

        parts.push(format!("Overall confidence is {level} ({confidence:.2})."));
        parts.join(" ")
    }
}

fn describe_failures(failed: &[&ExpertResponse]) -> String {
    failed
        .iter()
        .map(|r| match &r.error {
            Some(message) => format!("{}: {} - {}", r.display_name(), r.status, message),
            None => format!("{}: {}", r.display_name(), r.status),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

//! Pairwise contradiction detection between expert responses.

use std::collections::HashSet;

use crate::signals::{Claim, ClaimExtractor, HeuristicClaimExtractor};
use crate::types::{Contradiction, ContradictionKind, ExpertResponse};

const MAX_QUOTE_CHARS: usize = 120;

/// Compares the claims of every pair of responses.
pub struct ContradictionDetector {
    claims: Box<dyn ClaimExtractor>,
    overlap_threshold: f64,
}

impl ContradictionDetector {
    pub fn new(overlap_threshold: f64) -> Self {
        Self {
            claims: Box::new(HeuristicClaimExtractor::new()),
            overlap_threshold,
        }
    }

    /// Replace the claim extraction strategy.
    pub fn with_claim_extractor(mut self, extractor: Box<dyn ClaimExtractor>) -> Self {
        self.claims = extractor;
        self
    }

    /// Contradictions for each pair `(i, j)` with `i < j`, in input order.
    /// Identical descriptions are reported once.
    pub fn detect(&self, responses: &[&ExpertResponse]) -> Vec<Contradiction> {
        let claims: Vec<Vec<Claim>> = responses
            .iter()
            .map(|r| self.claims.extract(&r.output))
            .collect();

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for i in 0..responses.len() {
            for j in (i + 1)..responses.len() {
                for a in &claims[i] {
                    for b in &claims[j] {
                        if !a.conflicts_with(b, self.overlap_threshold) {
                            continue;
                        }
                        let contradiction = describe(responses[i], a, responses[j], b);
                        if seen.insert(contradiction.description.clone()) {
                            found.push(contradiction);
                        }
                    }
                }
            }
        }
        found
    }
}

fn describe(
    first: &ExpertResponse,
    a: &Claim,
    second: &ExpertResponse,
    b: &Claim,
) -> Contradiction {
    let (kind, description) = match (a, b) {
        (
            Claim::Recommendation {
                label: la,
                predicate,
                ..
            },
            Claim::Recommendation { label: lb, .. },
        ) => (
            ContradictionKind::CompetingRecommendation,
            format!(
                "{} says {} is the {} option, but {} says {} is",
                first.display_name(),
                la,
                predicate,
                second.display_name(),
                lb
            ),
        ),
        _ => (
            ContradictionKind::Negation,
            format!(
                "{} states \"{}\" while {} states \"{}\"",
                first.display_name(),
                quote(a.sentence()),
                second.display_name(),
                quote(b.sentence())
            ),
        ),
    };
    Contradiction {
        first_expert: first.expert_id.clone(),
        second_expert: second.expert_id.clone(),
        kind,
        description,
    }
}

fn quote(sentence: &str) -> String {
    if sentence.chars().count() <= MAX_QUOTE_CHARS {
        return sentence.to_string();
    }
    let truncated: String = sentence.chars().take(MAX_QUOTE_CHARS).collect();
    format!("{}...", truncated.trim_end())
}

//! Unified response synthesis.
//!
//! The highest-weighted response is the backbone. Lower-ranked responses add
//! points the backbone does not already cover, in proportion to their weight
//! relative to the top response.

use std::collections::BTreeSet;

use crate::config::ScoringConfig;
use crate::signals::{content_terms, jaccard, split_sentences};
use crate::types::ExpertResponse;

/// Heading of the section holding points contributed by secondary responses.
pub const ADDITIONAL_PERSPECTIVES_HEADING: &str = "## Additional perspectives";

/// Sentences with fewer content words than this are too thin to stand alone.
const MIN_POINT_TERMS: usize = 3;

/// A response paired with its normalized weight.
#[derive(Debug, Clone, Copy)]
pub struct RankedResponse<'a> {
    pub response: &'a ExpertResponse,
    pub normalized_weight: f64,
}

/// Blend ranked responses (highest weight first) into one text.
///
/// The backbone is the highest-ranked response with non-empty output. Returns
/// an empty string when no response has any output; callers handle that case.
pub fn build_unified_response(ranked: &[RankedResponse<'_>], config: &ScoringConfig) -> String {
    let Some(backbone) = ranked
        .iter()
        .position(|r| !r.response.output.trim().is_empty())
    else {
        return String::new();
    };
    let top = &ranked[backbone];
    let base = top.response.output.trim();

    let mut covered: Vec<BTreeSet<String>> = split_sentences(base)
        .iter()
        .map(|s| content_terms(s))
        .collect();
    let mut points: Vec<(String, &str)> = Vec::new();

    let secondary = ranked
        .iter()
        .enumerate()
        .filter(|(i, r)| *i != backbone && !r.response.output.trim().is_empty())
        .map(|(_, r)| r)
        .take(config.max_synthesis_sources.saturating_sub(1));
    for source in secondary {
        let quota = point_quota(source.normalized_weight, top.normalized_weight, config);
        let mut taken = 0;
        for sentence in split_sentences(&source.response.output) {
            if taken >= quota {
                break;
            }
            let terms = content_terms(&sentence);
            if terms.len() < MIN_POINT_TERMS {
                continue;
            }
            let novel = covered
                .iter()
                .all(|c| jaccard(c, &terms) < config.novelty_threshold);
            if novel {
                points.push((sentence, source.response.display_name()));
                covered.push(terms);
                taken += 1;
            }
        }
    }

    if points.is_empty() {
        return base.to_string();
    }

    let mut unified = String::from(base);
    unified.push_str("\n\n");
    unified.push_str(ADDITIONAL_PERSPECTIVES_HEADING);
    unified.push_str("\n\n");
    for (point, name) in points {
        unified.push_str(&format!("- {point} ({name})\n"));
    }
    unified.truncate(unified.trim_end().len());
    unified
}

/// How many novel points a secondary response may contribute.
fn point_quota(weight: f64, top_weight: f64, config: &ScoringConfig) -> usize {
    if top_weight <= 0.0 {
        return config.max_points_per_source;
    }
    let share = (weight / top_weight).clamp(0.0, 1.0);
    (config.max_points_per_source as f64 * share).ceil() as usize
}

//! End-to-end judging scenarios over realistic expert panels.

use pretty_assertions::assert_eq;

use council_core::signals::{Claim, ClaimExtractor};
use council_core::{
    ConfidenceLevel, ContradictionKind, CouncilConfig, ExpertResponse, JudgmentResult,
    JudgmentScorer, NO_VALID_RESPONSES, ResponseStatus, compute_cache_key,
};

/// Three frontier models agreeing on what TypeScript is.
fn consensus_responses() -> Vec<ExpertResponse> {
    vec![
        ExpertResponse::new(
            "gpt",
            "openai/gpt-4",
            "TypeScript is a statically typed superset of JavaScript developed by Microsoft. \
             It compiles to plain JavaScript and runs anywhere JavaScript runs.\n\n\
             - Optional static types catch errors at compile time\n\
             - Excellent editor tooling and autocompletion\n\n\
             Confidence: 95%",
        )
        .with_name("GPT-4"),
        ExpertResponse::new(
            "claude",
            "anthropic/claude-3-opus",
            "## TypeScript\n\n\
             TypeScript is a typed superset of JavaScript created by Microsoft. \
             Its type system helps teams catch bugs early and refactor large codebases safely.\n\n\
             Confidence: 92%",
        )
        .with_name("Claude"),
        ExpertResponse::new(
            "gemini",
            "google/gemini-pro",
            "TypeScript extends JavaScript with optional static typing. \
             Code written in TypeScript is compiled into JavaScript, so it works in every browser and in Node.js.\n\n\
             Confidence: 90%",
        )
        .with_name("Gemini"),
    ]
}

/// Three experts each crowning a different framework.
fn disagreement_responses() -> Vec<ExpertResponse> {
    vec![
        ExpertResponse::new(
            "react",
            "openai/gpt-4",
            "React is the best framework for building modern web applications thanks to its ecosystem.",
        ),
        ExpertResponse::new(
            "vue",
            "anthropic/claude-3-opus",
            "Vue is the best framework for building modern web applications because of its gentle learning curve.",
        ),
        ExpertResponse::new(
            "svelte",
            "google/gemini-pro",
            "Svelte is the best framework for building modern web applications since it compiles away the runtime.",
        ),
    ]
}

fn assert_distribution(result: &JudgmentResult) {
    let sum: f64 = result.weights.iter().map(|w| w.normalized_weight).sum();
    assert!((sum - 1.0).abs() < 1e-9, "weights sum to {sum}");
}

#[test]
fn consensus_panel_is_confident_and_uncontested() {
    let result = JudgmentScorer::default().judge(&consensus_responses());

    assert!(result.contradictions.is_empty(), "{:?}", result.contradictions);
    assert!(result.confidence >= 0.8, "confidence {}", result.confidence);
    assert_eq!(result.confidence_level, ConfidenceLevel::High);
    assert_eq!(result.score_breakdown.len(), 3);
    assert!(result.failed_experts.is_empty());
    assert_distribution(&result);
    assert!(result.judge_commentary.contains("No contradictions detected"));
}

#[test]
fn disagreement_panel_reports_contradictions() {
    let result = JudgmentScorer::default().judge(&disagreement_responses());

    assert!(!result.contradictions.is_empty());
    assert_eq!(result.contradictions.len(), 3);
    assert!(
        result
            .contradictions
            .iter()
            .all(|c| c.kind == ContradictionKind::CompetingRecommendation)
    );
    assert_eq!(result.contradictions[0].first_expert, "react");
    assert_eq!(result.contradictions[0].second_expert, "vue");
    assert!(result.confidence < 0.8);
    assert_eq!(result.confidence_level, ConfidenceLevel::Low);
    assert!(result.judge_commentary.contains("Detected 3 contradiction(s)"));
}

#[test]
fn context_qualified_comparatives_are_consensus() {
    let responses = [
        ExpertResponse::new(
            "a",
            "openai/gpt-4",
            "TypeScript is better for large codebases. Plain JavaScript is better for quick prototypes.",
        ),
        ExpertResponse::new(
            "b",
            "anthropic/claude-3-opus",
            "TypeScript is better for large codebases because types catch bugs early.",
        ),
        ExpertResponse::new(
            "c",
            "google/gemini-pro",
            "Tooling is better with TypeScript, and refactoring is safer.",
        ),
    ];
    let result = JudgmentScorer::default().judge(&responses);
    assert!(result.contradictions.is_empty(), "{:?}", result.contradictions);
    assert_eq!(result.confidence_level, ConfidenceLevel::High);
}

#[test]
fn negated_recommendation_is_a_contradiction() {
    let responses = [
        ExpertResponse::new("a", "openai/gpt-4", "React is the best framework for large apps."),
        ExpertResponse::new("b", "openai/gpt-4", "React is not the best framework for large apps."),
    ];
    let result = JudgmentScorer::default().judge(&responses);
    assert_eq!(result.contradictions.len(), 1);
    assert_eq!(result.contradictions[0].kind, ContradictionKind::Negation);
    assert!(result.confidence < 0.5);
}

#[test]
fn blank_top_response_does_not_lead_synthesis() {
    let responses = [
        ExpertResponse::new("blank", "openai/gpt-4", "").with_confidence(1.0),
        ExpertResponse::new("real", "acme/small-model", "Cache rendered pages at the edge.")
            .with_confidence(0.2),
    ];
    let result = JudgmentScorer::default().judge(&responses);
    assert_eq!(result.weights[0].expert_id, "blank");
    assert_eq!(result.unified_response, "Cache rendered pages at the edge.");

    let all_blank = [
        ExpertResponse::new("x", "openai/gpt-4", ""),
        ExpertResponse::new("y", "openai/gpt-4o", " "),
    ];
    let result = JudgmentScorer::default().judge(&all_blank);
    assert_eq!(result.unified_response, NO_VALID_RESPONSES);
}

#[test]
fn known_model_outweighs_unknown_model() {
    let text = "Use connection pooling and keep transactions short.";
    let responses = [
        ExpertResponse::new("known", "openai/gpt-4", text).with_confidence(0.8),
        ExpertResponse::new("unknown", "acme/unheard-of-model", text).with_confidence(0.8),
    ];
    let result = JudgmentScorer::default().judge(&responses);

    let share = |id: &str| {
        result
            .weights
            .iter()
            .find(|w| w.expert_id == id)
            .map(|w| w.normalized_weight)
            .unwrap()
    };
    assert!(share("known") > share("unknown"));
    assert_eq!(result.weights[0].expert_id, "known");
}

#[test]
fn empty_panel_never_fails() {
    let result = JudgmentScorer::default().judge(&[]);
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.contradictions.len(), 0);
    assert_eq!(result.unified_response, NO_VALID_RESPONSES);
}

#[test]
fn single_response_passes_through() {
    let r = ExpertResponse::new("only", "openai/gpt-4o", "Pin dependencies with a lockfile.")
        .with_confidence(0.66);
    let result = JudgmentScorer::default().judge(std::slice::from_ref(&r));
    assert_eq!(result.unified_response, r.output);
    assert!((result.confidence - 0.66).abs() < 1e-12);
    assert!(result.contradictions.is_empty());
}

#[test]
fn malformed_response_does_not_abort_judging() {
    let mut responses = consensus_responses();
    responses.push(ExpertResponse::new("broken", "", ""));
    let result = JudgmentScorer::default().judge(&responses);

    assert_eq!(result.score_breakdown.len(), 4);
    assert_eq!(result.weights.last().map(|w| w.expert_id.as_str()), Some("broken"));
    assert!(result.score_breakdown["broken"].total < result.score_breakdown["gpt"].total);
    assert_distribution(&result);
}

#[test]
fn failed_experts_are_excluded_but_reported() {
    let mut responses = consensus_responses();
    responses.push(
        ExpertResponse::new("mistral", "mistralai/mistral-large", "")
            .with_name("Mistral")
            .with_error(ResponseStatus::Error, "HTTP 429"),
    );
    let result = JudgmentScorer::default().judge(&responses);

    assert_eq!(result.failed_experts, vec!["mistral".to_string()]);
    assert!(!result.score_breakdown.contains_key("mistral"));
    assert!(result.judge_commentary.contains("Mistral: error - HTTP 429"));
    assert!(result.contradictions.is_empty());
}

#[test]
fn unified_response_leads_with_top_expert() {
    let result = JudgmentScorer::default().judge(&consensus_responses());
    let top = &result.weights[0].expert_id;
    let top_output = consensus_responses()
        .into_iter()
        .find(|r| &r.expert_id == top)
        .map(|r| r.output)
        .unwrap();
    assert!(result.unified_response.starts_with(top_output.trim()));
}

#[test]
fn agreement_weight_is_configurable() {
    let mut config = CouncilConfig::default();
    config.scoring.agreement_weight = 0.0;
    config.validate().unwrap();

    let responses = [
        ExpertResponse::new("a", "openai/gpt-4", "React is the best framework.").with_confidence(0.9),
        ExpertResponse::new("b", "openai/gpt-4", "Vue is the best framework.").with_confidence(0.9),
    ];
    let result = JudgmentScorer::from_config(&config).judge(&responses);
    assert_eq!(result.contradictions.len(), 1);
    assert!((result.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn claim_extractor_is_pluggable() {
    struct Silent;
    impl ClaimExtractor for Silent {
        fn extract(&self, _text: &str) -> Vec<Claim> {
            Vec::new()
        }
    }

    let scorer = JudgmentScorer::default().with_claim_extractor(Box::new(Silent));
    let result = scorer.judge(&disagreement_responses());
    assert!(result.contradictions.is_empty());
}

#[test]
fn judgment_is_deterministic_and_order_stable() {
    let scorer = JudgmentScorer::default();
    let first = scorer.judge(&consensus_responses());
    let second = scorer.judge(&consensus_responses());
    assert_eq!(first, second);

    let mut reversed = consensus_responses();
    reversed.reverse();
    let third = scorer.judge(&reversed);
    for (id, score) in &first.score_breakdown {
        assert!((score.total - third.score_breakdown[id].total).abs() < 1e-9);
    }
    assert!((first.confidence - third.confidence).abs() < 1e-12);
    assert_eq!(first.weights[0].expert_id, third.weights[0].expert_id);
}

#[test]
fn judgment_serializes_camel_case() {
    let result = JudgmentScorer::default().judge(&consensus_responses());
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("scoreBreakdown").is_some());
    assert!(json.get("unifiedResponse").is_some());
    assert!(json.get("judgeCommentary").is_some());
    assert_eq!(json["confidenceLevel"], "high");

    let back: JudgmentResult = serde_json::from_value(json).unwrap();
    assert_eq!(back.unified_response, result.unified_response);
    assert_eq!(back.contradictions, result.contradictions);
    assert_eq!(back.confidence_level, result.confidence_level);
}

#[test]
fn cache_key_ignores_collection_order() {
    let forward = consensus_responses();
    let mut shuffled = consensus_responses();
    shuffled.rotate_left(1);
    assert_eq!(
        compute_cache_key("What is TypeScript?", &forward),
        compute_cache_key("What is TypeScript?", &shuffled)
    );
}

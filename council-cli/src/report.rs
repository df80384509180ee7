//! Markdown report for a judgment, for humans reading the CLI output.

use council_core::{ConfidenceLevel, JudgmentResult};

/// Render a judgment as Markdown.
pub fn judgment_to_markdown(task: &str, result: &JudgmentResult) -> String {
    let mut md = String::new();

    md.push_str("# Council Judgment\n\n");
    if !task.trim().is_empty() {
        md.push_str(&format!("**Task:** {}\n\n", task.trim()));
    }

    md.push_str(&format!(
        "**Confidence:** {} ({:.2})\n\n",
        level_label(result.confidence_level),
        result.confidence
    ));

    if !result.weights.is_empty() {
        md.push_str("## Expert Weights\n\n");
        md.push_str("| Rank | Expert | Raw | Share |\n");
        md.push_str("|------|--------|-----|-------|\n");
        for (rank, weight) in result.weights.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {:.3} | {:.1}% |\n",
                rank + 1,
                escape_cell(&weight.expert_id),
                weight.weight,
                weight.normalized_weight * 100.0
            ));
        }
        md.push('\n');

        md.push_str("## Scores\n\n");
        md.push_str("| Expert | Accuracy | Completeness | Conciseness | Total |\n");
        md.push_str("|--------|----------|--------------|-------------|-------|\n");
        // Same order as the weights table.
        for weight in &result.weights {
            if let Some(score) = result.score_breakdown.get(&weight.expert_id) {
                md.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:.1} | **{:.1}** |\n",
                    escape_cell(&weight.expert_id),
                    score.accuracy,
                    score.completeness,
                    score.conciseness,
                    score.total
                ));
            }
        }
        md.push('\n');
    }

    if !result.contradictions.is_empty() {
        md.push_str(&format!(
            "## Contradictions ({})\n\n",
            result.contradictions.len()
        ));
        for contradiction in &result.contradictions {
            md.push_str(&format!(
                "- **{}** vs **{}**: {}\n",
                contradiction.first_expert, contradiction.second_expert, contradiction
            ));
        }
        md.push('\n');
    }

    if !result.failed_experts.is_empty() {
        md.push_str("## Failed Experts\n\n");
        for id in &result.failed_experts {
            md.push_str(&format!("- {id}\n"));
        }
        md.push('\n');
    }

    md.push_str("## Unified Response\n\n");
    md.push_str(result.unified_response.trim());
    md.push_str("\n\n");

    md.push_str("## Commentary\n\n");
    md.push_str(&result.judge_commentary);
    md.push('\n');

    md
}

fn level_label(level: ConfidenceLevel) -> &'static str {
    match level {
        ConfidenceLevel::High => "High",
        ConfidenceLevel::Medium => "Medium",
        ConfidenceLevel::Low => "Low",
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

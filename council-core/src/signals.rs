//! Text signal extraction: the heuristic half of weighting and judging.
//!
//! Each heuristic sits behind a single-method `extract(text)` strategy trait so
//! it can be swapped or tested independently of the aggregation math:
//! - [`ConfidenceExtractor`] reads a self-reported confidence marker
//!   ("Confidence: 85%", "I'm 90% confident", "high confidence").
//! - [`ClaimExtractor`] pulls comparable claims (recommendations and plain
//!   statements) used for contradiction detection.
//!
//! [`ContentSignals`] measures length and structure for content quality.

use regex::Regex;
use std::collections::BTreeSet;

/// Strategy for reading a confidence signal out of response text.
pub trait ConfidenceExtractor: Send + Sync {
    /// Confidence in [0, 1], or `None` when the text carries no marker.
    fn extract(&self, text: &str) -> Option<f64>;
}

/// Extractor that never finds a marker. Every response falls back to the default.
pub struct NoConfidenceExtractor;

impl ConfidenceExtractor for NoConfidenceExtractor {
    fn extract(&self, _text: &str) -> Option<f64> {
        None
    }
}

/// Pattern-based confidence marker extractor.
///
/// Numeric markers win over qualitative ones, and the last marker in the text
/// wins over earlier ones since models usually state confidence at the end.
pub struct MarkerConfidenceExtractor {
    labeled: Regex,
    trailing_percent: Regex,
    qualitative: Regex,
}

impl MarkerConfidenceExtractor {
    pub fn new() -> Self {
        Self {
            // "Confidence: 85%", "confidence level = 0.9", "Confidence score: 7/10"
            labeled: Regex::new(
                r"(?i)\bconfidence(?:\s+(?:level|score|rating))?\s*([:=]|\bis\b|\bof\b)?\s*(\d{1,3}(?:\.\d+)?)\s*(%|/\s*100\b|/\s*10\b)?",
            )
            .expect("valid labeled confidence pattern"),
            // "I am 90% confident", "80% confidence"
            trailing_percent: Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*%\s+confiden(?:t|ce)\b")
                .expect("valid trailing confidence pattern"),
            qualitative: Regex::new(
                r"(?i)\b(very high|high|moderate|medium|low|very low)\s+(?:level of\s+)?confidence\b",
            )
            .expect("valid qualitative confidence pattern"),
        }
    }

    fn numeric(&self, text: &str) -> Option<f64> {
        let labeled = self.labeled.captures_iter(text).filter_map(|caps| {
            let start = caps.get(0)?.start();
            let separated = caps.get(1).is_some();
            let value: f64 = caps.get(2)?.as_str().parse().ok()?;
            let scale = caps
                .get(3)
                .map(|m| m.as_str().replace(char::is_whitespace, ""));
            let value = match scale.as_deref() {
                Some("%") | Some("/100") => percent(value),
                Some("/10") => (value <= 10.0).then_some(value / 10.0),
                _ if value <= 1.0 => Some(value),
                // "confidence 5 services" is a count, not a percentage.
                _ if separated => percent(value),
                _ => None,
            }?;
            Some((start, value))
        });
        let trailing = self.trailing_percent.captures_iter(text).filter_map(|caps| {
            let start = caps.get(0)?.start();
            let value = percent(caps.get(1)?.as_str().parse().ok()?)?;
            Some((start, value))
        });

        labeled
            .chain(trailing)
            .max_by_key(|(start, _)| *start)
            .map(|(_, value)| value)
    }

    fn qualitative(&self, text: &str) -> Option<f64> {
        let caps = self.qualitative.captures_iter(text).last()?;
        let level = caps.get(1)?.as_str().to_lowercase();
        let value = match level.as_str() {
            "very high" => 0.95,
            "high" => 0.85,
            "moderate" | "medium" => 0.6,
            "low" => 0.35,
            _ => 0.2,
        };
        Some(value)
    }
}

impl Default for MarkerConfidenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceExtractor for MarkerConfidenceExtractor {
    fn extract(&self, text: &str) -> Option<f64> {
        self.numeric(text).or_else(|| self.qualitative(text))
    }
}

fn percent(value: f64) -> Option<f64> {
    (value <= 100.0).then_some(value / 100.0)
}

// ---------------------------------------------------------------------------
// Content structure
// ---------------------------------------------------------------------------

/// Length and structure measurements of a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSignals {
    pub chars: usize,
    pub words: usize,
    pub headings: usize,
    pub list_items: usize,
    pub paragraphs: usize,
}

impl ContentSignals {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let mut signals = Self {
            chars: trimmed.chars().count(),
            words: trimmed.split_whitespace().count(),
            ..Default::default()
        };

        let mut in_paragraph = false;
        for line in trimmed.lines() {
            let line = line.trim();
            if line.is_empty() {
                in_paragraph = false;
                continue;
            }
            if !in_paragraph {
                signals.paragraphs += 1;
                in_paragraph = true;
            }
            if is_heading(line) {
                signals.headings += 1;
            } else if list_marker_len(line).is_some() {
                signals.list_items += 1;
            }
        }
        signals
    }

    /// Fraction of structural signals present: headings, lists, multiple paragraphs.
    pub fn structure_score(&self) -> f64 {
        let present = [
            self.headings > 0,
            self.list_items > 0,
            self.paragraphs >= 2,
        ]
        .iter()
        .filter(|p| **p)
        .count();
        present as f64 / 3.0
    }

    /// Length relative to the saturation point, capped at 1.
    pub fn length_score(&self, saturation_chars: usize) -> f64 {
        if saturation_chars == 0 {
            return 1.0;
        }
        (self.chars as f64 / saturation_chars as f64).min(1.0)
    }
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        return line[hashes..].starts_with(' ');
    }
    // Bold-only line used as a heading: "**Summary**" or "**Summary:**"
    line.len() > 4
        && line.starts_with("**")
        && line.trim_end_matches(':').ends_with("**")
        && !line[2..line.len() - 2].contains("**")
}

/// Byte length of a leading list marker ("- ", "* ", "1. ", "2) "), if any.
fn list_marker_len(line: &str) -> Option<usize> {
    for bullet in ["- ", "* ", "+ ", "• "] {
        if line.starts_with(bullet) {
            return Some(bullet.len());
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && digits <= 3 {
        let rest = &line[digits..];
        if rest.starts_with(". ") || rest.starts_with(") ") {
            return Some(digits + 2);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// A comparable assertion pulled out of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    /// "X is the best ..." style recommendation of one option.
    Recommendation {
        /// Lowercased subject used for comparison.
        subject: String,
        /// Subject as written.
        label: String,
        /// Normalized quality being claimed ("best", "better", "fastest").
        predicate: String,
        /// Content words qualifying the claim ("for large codebases").
        scope: BTreeSet<String>,
        sentence: String,
    },
    /// A plain statement, reduced to its content words.
    Statement {
        terms: BTreeSet<String>,
        negated: bool,
        sentence: String,
    },
}

impl Claim {
    pub fn sentence(&self) -> &str {
        match self {
            Claim::Recommendation { sentence, .. } | Claim::Statement { sentence, .. } => sentence,
        }
    }

    /// Whether two claims are mutually exclusive.
    ///
    /// Recommendations conflict when they crown different subjects for the same
    /// predicate in the same scope. An unqualified recommendation covers every
    /// scope; qualified ones must share at least `overlap_threshold` of the
    /// smaller scope. Statements conflict when they overlap by at least
    /// `overlap_threshold` (Jaccard over content words) and exactly one is negated.
    pub fn conflicts_with(&self, other: &Claim, overlap_threshold: f64) -> bool {
        match (self, other) {
            (
                Claim::Recommendation {
                    subject: a,
                    predicate: pa,
                    scope: sa,
                    ..
                },
                Claim::Recommendation {
                    subject: b,
                    predicate: pb,
                    scope: sb,
                    ..
                },
            ) => pa == pb && a != b && scopes_overlap(sa, sb, overlap_threshold),
            (
                Claim::Statement {
                    terms: ta,
                    negated: na,
                    ..
                },
                Claim::Statement {
                    terms: tb,
                    negated: nb,
                    ..
                },
            ) => na != nb && jaccard(ta, tb) >= overlap_threshold,
            _ => false,
        }
    }
}

fn scopes_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>, threshold: f64) -> bool {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return true;
    }
    a.intersection(b).count() as f64 / smaller as f64 >= threshold
}

/// Strategy for turning response text into comparable claims.
pub trait ClaimExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<Claim>;
}

/// Keyword and negation based claim extractor.
pub struct HeuristicClaimExtractor {
    recommendation: Regex,
    min_terms: usize,
}

impl HeuristicClaimExtractor {
    pub fn new() -> Self {
        Self {
            recommendation: Regex::new(
                r"(?i)\b([a-z][a-z0-9.+#-]*)\s+is\s+(?:clearly\s+|definitely\s+|by far\s+|simply\s+)?(?:the\s+)?(best|better|superior|preferred|recommended|ideal|fastest)\b",
            )
            .expect("valid recommendation pattern"),
            min_terms: 3,
        }
    }
}

impl Default for HeuristicClaimExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimExtractor for HeuristicClaimExtractor {
    fn extract(&self, text: &str) -> Vec<Claim> {
        let mut claims = Vec::new();
        for sentence in split_sentences(text) {
            for caps in self.recommendation.captures_iter(&sentence) {
                let (Some(subject), Some(predicate)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let label = subject.as_str().trim_end_matches('.');
                let subject = label.to_lowercase();
                let generic = STOPWORDS.contains(&subject.as_str())
                    || ASPECTS.contains(&subject.as_str());
                if generic {
                    continue;
                }
                let predicate = match predicate.as_str().to_lowercase().as_str() {
                    "fastest" => "fastest",
                    "better" | "superior" => "better",
                    _ => "best",
                };
                claims.push(Claim::Recommendation {
                    subject,
                    label: label.to_string(),
                    predicate: predicate.to_string(),
                    scope: scope_terms(&sentence[predicate_end(&caps)..]),
                    sentence: sentence.clone(),
                });
            }

            // Recommendation sentences are statements too, so a negated
            // restatement ("React is not the best ...") still conflicts.
            let terms = content_terms(&sentence);
            if terms.len() >= self.min_terms {
                claims.push(Claim::Statement {
                    terms,
                    negated: is_negated(&sentence),
                    sentence,
                });
            }
        }
        claims
    }
}

fn predicate_end(caps: &regex::Captures<'_>) -> usize {
    caps.get(2).map_or(0, |m| m.end())
}

/// Content words of the phrase qualifying a recommendation, up to the first
/// clause break ("for large codebases because ..." gives {large, codebases}).
fn scope_terms(rest: &str) -> BTreeSet<String> {
    let mut phrase = Vec::new();
    for raw in rest.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if CLAUSE_BREAKS.contains(&word.to_lowercase().as_str()) {
            break;
        }
        phrase.push(word);
        if raw.ends_with([',', ';', ':']) {
            break;
        }
    }
    content_terms(&phrase.join(" "))
}

// ---------------------------------------------------------------------------
// Text helpers shared by contradiction detection and synthesis
// ---------------------------------------------------------------------------

/// Words that end the phrase qualifying a recommendation.
const CLAUSE_BREAKS: &[&str] = &[
    "because", "since", "thanks", "as", "due", "given", "which", "while", "but", "and",
    "so", "although", "though", "whereas", "unless", "if", "when",
];

/// Generic quality nouns. "Tooling is better with X" praises X, it does not
/// crown "tooling" over anything.
const ASPECTS: &[&str] = &[
    "tooling", "performance", "support", "documentation", "docs", "ecosystem", "community",
    "security", "safety", "speed", "readability", "maintainability", "reliability",
    "scalability", "testing", "debugging", "refactoring", "quality", "experience",
    "onboarding", "adoption", "everything", "nothing", "something", "anything", "which",
    "mine", "yours", "ours", "theirs",
];

const NEGATIONS: &[&str] = &["not", "no", "never", "cannot", "neither", "nor", "none"];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "so", "of", "to", "in", "on", "at", "by",
    "for", "with", "as", "from", "into", "is", "are", "was", "were", "be", "been", "being", "it",
    "its", "this", "that", "these", "those", "there", "here", "which", "what", "who", "whom",
    "when", "where", "why", "how", "i", "we", "you", "they", "he", "she", "them", "us", "our",
    "your", "their", "my", "me", "do", "does", "did", "has", "have", "had", "can", "could",
    "will", "would", "should", "may", "might", "must", "also", "very", "more", "most", "some",
    "any", "all", "each", "just", "than", "too", "one", "option", "choice", "answer",
];

/// Split text into trimmed sentences, dropping heading and list markers.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for line in text.lines() {
        let mut line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_heading(line) {
            continue;
        }
        if let Some(len) = list_marker_len(line) {
            line = line[len..].trim();
        }

        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let at_boundary = chars.peek().is_none_or(|next| next.is_whitespace());
            if matches!(c, '.' | '!' | '?') && at_boundary {
                push_sentence(&mut sentences, &current);
                current.clear();
            }
        }
        push_sentence(&mut sentences, &current);
    }
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.trim();
    if sentence.chars().any(char::is_alphanumeric) {
        sentences.push(sentence.to_string());
    }
}

/// Lowercased content words: no stopwords, no negations, at least two characters.
pub fn content_terms(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase().replace('’', "'");
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|w| w.chars().count() >= 2)
        .filter(|w| !STOPWORDS.contains(w) && !NEGATIONS.contains(w))
        // Fragments of contractions ("isn" from "isn't") carry no content.
        .filter(|w| !(w.ends_with('n') && lower.contains(&format!("{w}'t"))))
        .map(str::to_string)
        .collect()
}

/// Whether a sentence contains an explicit negation.
pub fn is_negated(sentence: &str) -> bool {
    sentence.split_whitespace().any(|raw| {
        let word = raw
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’')
            .to_lowercase()
            .replace('’', "'");
        NEGATIONS.contains(&word.as_str()) || word.ends_with("n't")
    })
}

/// Jaccard similarity of two term sets. Two empty sets are dissimilar.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<f64> {
        MarkerConfidenceExtractor::new().extract(text)
    }

    #[test]
    fn test_confidence_percent_marker() {
        assert_eq!(extract("Use Postgres.\n\nConfidence: 85%"), Some(0.85));
        assert_eq!(extract("confidence level = 0.9"), Some(0.9));
        assert_eq!(extract("Confidence score: 7/10"), Some(0.7));
        assert_eq!(extract("Confidence: 90"), Some(0.9));
    }

    #[test]
    fn test_confidence_trailing_percent() {
        assert_eq!(extract("I am 80% confident this works."), Some(0.8));
    }

    #[test]
    fn test_confidence_last_marker_wins() {
        let text = "Initial confidence: 40%. After checking the docs, confidence: 90%";
        assert_eq!(extract(text), Some(0.9));
    }

    #[test]
    fn test_confidence_qualitative_fallback() {
        assert_eq!(extract("I have high confidence in this answer."), Some(0.85));
        assert_eq!(extract("Low confidence, needs verification."), Some(0.35));
    }

    #[test]
    fn test_confidence_absent_or_out_of_range() {
        assert_eq!(extract("No marker here."), None);
        assert_eq!(extract("Confidence: 250%"), None);
        assert_eq!(extract("We have confidence 5 services will scale."), None);
        assert_eq!(extract("confidence 0.8"), Some(0.8));
        assert_eq!(extract(""), None);
        assert_eq!(NoConfidenceExtractor.extract("Confidence: 90%"), None);
    }

    #[test]
    fn test_content_signals_plain_text() {
        let signals = ContentSignals::from_text("Just one short line.");
        assert_eq!(signals.paragraphs, 1);
        assert_eq!(signals.headings, 0);
        assert_eq!(signals.list_items, 0);
        assert_eq!(signals.words, 4);
        assert_eq!(signals.structure_score(), 0.0);
    }

    #[test]
    fn test_content_signals_structured() {
        let text = "## Overview\nTypeScript adds types.\n\n- Static checks\n- Better tooling\n\n1. Install it\n2) Configure it";
        let signals = ContentSignals::from_text(text);
        assert_eq!(signals.headings, 1);
        assert_eq!(signals.list_items, 4);
        assert_eq!(signals.paragraphs, 3);
        assert_eq!(signals.structure_score(), 1.0);
    }

    #[test]
    fn test_content_signals_bold_heading() {
        let signals = ContentSignals::from_text("**Summary:**\nShort answer.");
        assert_eq!(signals.headings, 1);
    }

    #[test]
    fn test_length_score_saturates() {
        let signals = ContentSignals::from_text(&"a".repeat(3000));
        assert_eq!(signals.length_score(1500), 1.0);
        let signals = ContentSignals::from_text(&"a".repeat(750));
        assert!((signals.length_score(1500) - 0.5).abs() < 1e-12);
        assert_eq!(ContentSignals::from_text("").length_score(1500), 0.0);
    }

    #[test]
    fn test_split_sentences() {
        let text = "# Title\nGPT-3.5 is older. Is it slower? Yes!\n- A bullet point here\n\n";
        assert_eq!(
            split_sentences(text),
            vec![
                "GPT-3.5 is older.",
                "Is it slower?",
                "Yes!",
                "A bullet point here"
            ]
        );
    }

    #[test]
    fn test_negation_detection() {
        assert!(is_negated("TypeScript is not a runtime."));
        assert!(is_negated("It doesn't run in the browser."));
        assert!(is_negated("It doesn’t run in the browser."));
        assert!(!is_negated("TypeScript compiles to JavaScript."));
        assert!(!is_negated("Nothing notable here, knots aside."));
    }

    #[test]
    fn test_content_terms_drop_noise() {
        let terms = content_terms("TypeScript isn't a runtime for the browser.");
        let expected: BTreeSet<String> = ["typescript", "runtime", "browser"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(terms, expected);
    }

    #[test]
    fn test_recommendation_claims_conflict() {
        let extractor = HeuristicClaimExtractor::new();
        let react = extractor.extract("React is the best framework for web apps.");
        let vue = extractor.extract("Honestly, Vue is clearly the best framework.");
        let recommendations = react
            .iter()
            .filter(|c| matches!(c, Claim::Recommendation { .. }))
            .count();
        assert_eq!(recommendations, 1);
        assert!(matches!(
            &react[0],
            Claim::Recommendation { subject, label, .. } if subject == "react" && label == "React"
        ));
        assert!(react[0].conflicts_with(&vue[0], 0.6));
        assert!(!react[0].conflicts_with(&react[0], 0.6));
    }

    #[test]
    fn test_scoped_comparatives_do_not_conflict() {
        let extractor = HeuristicClaimExtractor::new();
        let typescript = extractor.extract("TypeScript is better for large codebases because types catch bugs early.");
        let javascript = extractor.extract("Plain JavaScript is better for quick prototypes.");
        assert!(matches!(
            &typescript[0],
            Claim::Recommendation { scope, predicate, .. }
                if predicate == "better" && scope.len() == 2 && scope.contains("codebases")
        ));
        assert!(!typescript[0].conflicts_with(&javascript[0], 0.6));

        let go = extractor.extract("Go is better for large codebases.");
        assert!(typescript[0].conflicts_with(&go[0], 0.6));
    }

    #[test]
    fn test_comparative_and_superlative_are_distinct() {
        let extractor = HeuristicClaimExtractor::new();
        let better = extractor.extract("Rust is better.");
        let best = extractor.extract("Go is the best.");
        assert!(!better[0].conflicts_with(&best[0], 0.6));
    }

    #[test]
    fn test_aspect_subjects_ignored() {
        let extractor = HeuristicClaimExtractor::new();
        let claims = extractor.extract("Tooling is better with TypeScript, and refactoring is safer.");
        assert!(
            claims
                .iter()
                .all(|c| !matches!(c, Claim::Recommendation { .. }))
        );
    }

    #[test]
    fn test_negated_recommendation_conflicts_as_statement() {
        let extractor = HeuristicClaimExtractor::new();
        let crowned = extractor.extract("React is the best framework for large apps.");
        let denied = extractor.extract("React is not the best framework for large apps.");
        assert!(
            crowned
                .iter()
                .any(|a| denied.iter().any(|b| a.conflicts_with(b, 0.6)))
        );
    }

    #[test]
    fn test_pronoun_subjects_ignored() {
        let extractor = HeuristicClaimExtractor::new();
        let claims = extractor.extract("It is the best choice overall.");
        assert!(
            claims
                .iter()
                .all(|c| !matches!(c, Claim::Recommendation { .. }))
        );
    }

    #[test]
    fn test_statement_claims_conflict_on_negation() {
        let extractor = HeuristicClaimExtractor::new();
        let a = extractor.extract("TypeScript code runs natively in web browsers.");
        let b = extractor.extract("TypeScript code never runs natively in web browsers.");
        let c = extractor.extract("TypeScript code runs natively in web browsers today.");
        assert!(a[0].conflicts_with(&b[0], 0.6));
        assert!(!a[0].conflicts_with(&c[0], 0.6));
    }

    #[test]
    fn test_short_sentences_make_no_claims() {
        let extractor = HeuristicClaimExtractor::new();
        assert!(extractor.extract("Yes. Not really.").is_empty());
    }

    #[test]
    fn test_jaccard() {
        let a = content_terms("static typing catches bugs early");
        let b = content_terms("static typing catches bugs");
        assert!((jaccard(&a, &b) - 0.8).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}

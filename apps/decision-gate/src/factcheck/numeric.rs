//! Layer 1: the numeric hard-check.
//!
//! Extracts the most specific figure from both the claim and the
//! ground-truth premise, applies directional sign from the surrounding
//! words, and compares. A relative divergence beyond tolerance is a
//! contradiction at full confidence, no matter what a semantic model
//! would say: numbers outrank rhetoric.
//!
//! Extraction priority: first percentage, else first currency amount,
//! else first bare number with magnitude >= 10 (small bare integers are
//! usually dates or counts, not figures worth checking).

use std::sync::OnceLock;

use regex::Regex;

use crate::factcheck::types::{FactCheckResult, FactLabel};

/// Bare numbers below this magnitude are ignored by extraction.
const MIN_BARE_FIGURE: f64 = 10.0;

/// Directional sense of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Growth, gains, upward movement.
    Positive,
    /// Decline, losses, downward movement.
    Negative,
}

/// What kind of figure was extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FigureKind {
    /// A percentage ("5%", "5 percent").
    Percent,
    /// A currency amount ("$3.2 billion").
    Currency,
    /// A bare number ("volume of 48000000").
    Bare,
}

/// A signed figure extracted from text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Figure {
    /// Signed value; percents stay in percent units (5% -> 5.0).
    pub value: f64,
    /// Extraction source.
    pub kind: FigureKind,
}

#[allow(clippy::expect_used)] // Regex patterns are compile-time constants; expect() is safe here
fn percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(-?\d+(?:\.\d+)?)\s*(?:%|percent)").expect("percent regex is valid")
    })
}

#[allow(clippy::expect_used)] // Regex patterns are compile-time constants; expect() is safe here
fn currency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\$\s*(-?\d+(?:\.\d+)?)\s*(billion|million|thousand|bn|mm|[bmk])?\b")
            .expect("currency regex is valid")
    })
}

#[allow(clippy::expect_used)] // Regex patterns are compile-time constants; expect() is safe here
fn bare_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("number regex is valid"))
}

/// Infer the directional sense of a sentence from its verbs.
///
/// Token-wise matching so "support" does not read as "up". Returns `None`
/// when no directional vocabulary is present or both directions appear.
pub(crate) fn infer_direction(text: &str) -> Option<Direction> {
    const POSITIVE: &[&str] = &[
        "grew", "grow", "grows", "growing", "rose", "rise", "rises", "rising", "gained", "gain",
        "gains", "increased", "increase", "increasing", "up", "climbed", "climbing", "expanded",
        "surged", "jumped", "improved", "beat",
    ];
    const NEGATIVE: &[&str] = &[
        "fell", "fall", "falls", "falling", "declined", "decline", "declines", "declining",
        "dropped", "drop", "drops", "decreased", "decrease", "decreasing", "down", "lost",
        "shrank", "contracted", "slumped", "plunged", "missed",
    ];

    let mut positive = false;
    let mut negative = false;
    for token in text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
    {
        if POSITIVE.contains(&token.as_str()) {
            positive = true;
        }
        if NEGATIVE.contains(&token.as_str()) {
            negative = true;
        }
    }
    match (positive, negative) {
        (true, false) => Some(Direction::Positive),
        (false, true) => Some(Direction::Negative),
        _ => None,
    }
}

fn currency_multiplier(suffix: &str) -> f64 {
    match suffix.to_lowercase().as_str() {
        "billion" | "bn" | "b" => 1e9,
        "million" | "mm" | "m" => 1e6,
        "thousand" | "k" => 1e3,
        _ => 1.0,
    }
}

/// Apply directional sign to an unsigned magnitude.
///
/// An explicit minus in the text wins; otherwise negative-direction verbs
/// flip the sign.
fn signed(value: f64, text: &str) -> f64 {
    if value < 0.0 {
        return value;
    }
    match infer_direction(text) {
        Some(Direction::Negative) => -value,
        _ => value,
    }
}

/// Extract the most specific figure from a sentence.
pub(crate) fn extract_figure(text: &str) -> Option<Figure> {
    if let Some(cap) = percent_regex().captures(text) {
        let raw: f64 = cap.get(1)?.as_str().parse().ok()?;
        return Some(Figure {
            value: signed(raw, text),
            kind: FigureKind::Percent,
        });
    }

    if let Some(cap) = currency_regex().captures(text) {
        let raw: f64 = cap.get(1)?.as_str().parse().ok()?;
        let multiplier = cap.get(2).map_or(1.0, |m| currency_multiplier(m.as_str()));
        return Some(Figure {
            value: signed(raw * multiplier, text),
            kind: FigureKind::Currency,
        });
    }

    for m in bare_number_regex().find_iter(text) {
        let raw: f64 = m.as_str().parse().ok()?;
        if raw.abs() >= MIN_BARE_FIGURE {
            return Some(Figure {
                value: signed(raw, text),
                kind: FigureKind::Bare,
            });
        }
    }

    None
}

/// Compare claim and premise figures; `Some` only on contradiction.
///
/// Returns `None` when either side has no extractable figure or the
/// figures agree within tolerance, in which case the semantic layer
/// decides.
pub(crate) fn contradiction(
    claim_text: &str,
    premise: &str,
    tolerance: f64,
) -> Option<FactCheckResult> {
    let claim_figure = extract_figure(claim_text)?;
    let truth_figure = extract_figure(premise)?;

    let divergence =
        (claim_figure.value - truth_figure.value).abs() / truth_figure.value.abs().max(1e-9);
    if divergence <= tolerance {
        return None;
    }

    Some(FactCheckResult::fresh(
        FactLabel::Contradiction,
        1.0,
        format!(
            "claimed figure {:.2} diverges from ground truth {:.2} beyond {:.0}% tolerance; {premise}",
            claim_figure.value,
            truth_figure.value,
            tolerance * 100.0,
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_beats_currency_and_bare() {
        let figure = extract_figure("Revenue of $2.1 billion grew 12% against 900 estimates")
            .expect("extracts");
        assert_eq!(figure.kind, FigureKind::Percent);
        assert!((figure.value - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_currency_with_multiplier() {
        let figure = extract_figure("Quarterly revenue came in at $3.2 billion").expect("extracts");
        assert_eq!(figure.kind, FigureKind::Currency);
        assert!((figure.value - 3.2e9).abs() < 1.0);

        let figure = extract_figure("Buyback of $500M announced").expect("extracts");
        assert!((figure.value - 5.0e8).abs() < 1.0);
    }

    #[test]
    fn test_bare_number_threshold() {
        assert_eq!(extract_figure("ranked 3 in its sector"), None);
        let figure = extract_figure("average daily volume near 48000000 shares").expect("extracts");
        assert_eq!(figure.kind, FigureKind::Bare);
        assert!((figure.value - 48_000_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_direction_words_flip_sign() {
        let figure = extract_figure("Revenue fell by 5% last quarter").expect("extracts");
        assert!((figure.value + 5.0).abs() < 1e-9);

        let figure = extract_figure("Revenue grew by 5% last quarter").expect("extracts");
        assert!((figure.value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_support_is_not_up() {
        assert_eq!(infer_direction("the stock found support at 150"), None);
    }

    #[test]
    fn test_mixed_directions_are_indeterminate() {
        assert_eq!(
            infer_direction("shares rose early then fell into the close"),
            None
        );
    }

    #[test]
    fn test_contradiction_on_opposite_directions() {
        let result = contradiction(
            "Revenue fell by 5% year over year",
            "Revenue grew 5.00% year over year.",
            0.10,
        )
        .expect("should contradict");
        assert_eq!(result.label, FactLabel::Contradiction);
        assert!((result.confidence - 1.0).abs() < f64::EPSILON);
        assert!(!result.valid);
    }

    #[test]
    fn test_agreement_within_tolerance_defers() {
        assert_eq!(
            contradiction(
                "Revenue grew about 5.2% year over year",
                "Revenue grew 5.00% year over year.",
                0.10,
            ),
            None
        );
    }

    #[test]
    fn test_magnitude_divergence_contradicts() {
        let result = contradiction(
            "Revenue grew 25% year over year",
            "Revenue grew 5.00% year over year.",
            0.10,
        )
        .expect("should contradict");
        assert!(result.evidence.contains("diverges"));
    }

    #[test]
    fn test_no_figures_defers() {
        assert_eq!(
            contradiction("Growth remains strong", "Revenue grew 5.00% year over year.", 0.10),
            None
        );
    }
}

use std::sync::LazyLock;

use regex::{Captures, Regex};

pub const MAX_SCORE: f64 = 5.0;

/// Score patterns tied to the assessment vocabulary, tried in order.
static ANCHORED_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)Overall\s+Difficulty\s+Score\s*(?:\([^)\n]*\))?\s*[:=\-]?\s*(\d+(?:\.\d+)?)(?:[ \t]*/[ \t]*(\d+(?:\.\d+)?))?",
        r"(?i)\bScore\b\s*(?:\([^)\n]*\))?\s*[:=\-]?\s*(\d+(?:\.\d+)?)(?:[ \t]*/[ \t]*(\d+(?:\.\d+)?))?",
        r"\b(\d+(?:\.\d+)?)\s*/\s*5(?:\.0)?\b",
        r"(?i)\b(\d+(?:\.\d+)?)\s*out\s+of\s+5(?:\.0)?\b",
        r"(?i)\b(?:Hardness(?:\s+Level)?|Classification|Difficulty(?:\s+Level)?)\b\s*[:=\-]?\s*[A-Za-z_ ]{0,12}?\s*[(\[]?\s*(\d+(?:\.\d+)?)(?:[ \t]*/[ \t]*(\d+(?:\.\d+)?))?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A bare number, with the denominator when written as a fraction.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\b(?:[ \t]*/[ \t]*(\d+(?:\.\d+)?))?").unwrap()
});

/// Find a difficulty score in `0..=5`.
///
/// Anchored patterns win over bare numbers; the first bare number in range
/// is the fallback. `None` means the text carries no usable score.
pub fn extract_score(text: &str) -> Option<f64> {
    anchored_score(text).or_else(|| bare_score(text))
}

/// Score written next to assessment vocabulary (`Score: 4`, `3.5/5`, ...).
pub fn anchored_score(text: &str) -> Option<f64> {
    ANCHORED_RES
        .iter()
        .find_map(|re| re.captures_iter(text).find_map(|caps| on_five_point_scale(&caps)))
}

fn bare_score(text: &str) -> Option<f64> {
    NUMBER_RE
        .captures_iter(text)
        .find_map(|caps| on_five_point_scale(&caps))
}

/// The number in group 1, unless group 2 puts it over something other
/// than 5 (`4.5/10` is not a 0–5 score).
fn on_five_point_scale(caps: &Captures<'_>) -> Option<f64> {
    if let Some(denominator) = caps.get(2) {
        if denominator.as_str().parse::<f64>().ok() != Some(MAX_SCORE) {
            return None;
        }
    }
    caps.get(1).and_then(|m| parse_bounded(m.as_str()))
}

fn parse_bounded(token: &str) -> Option<f64> {
    let value: f64 = token.parse().ok()?;
    (0.0..=MAX_SCORE).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_difficulty_on_next_line() {
        assert_eq!(
            extract_score("Overall Difficulty Score\n4.3\nHardness Level\nHard"),
            Some(4.3)
        );
    }

    #[test]
    fn cascade_order() {
        // the labelled score wins over an earlier x/5
        assert_eq!(extract_score("Rated 2/5 last year. Overall Difficulty Score: 3.8"), Some(3.8));
        assert_eq!(extract_score("Score (0-5): 4"), Some(4.0));
        assert_eq!(extract_score("we rate it 3.5 / 5"), Some(3.5));
        assert_eq!(extract_score("about 4 out of 5 overall"), Some(4.0));
        assert_eq!(extract_score("Hardness Level: HARD (4.6)"), Some(4.6));
    }

    #[test]
    fn out_of_range_anchored_values_skipped() {
        assert_eq!(extract_score("Score: 42. Later, Score: 2.5"), Some(2.5));
        assert_eq!(extract_score("Score: 7"), None);
    }

    #[test]
    fn bare_number_fallback() {
        assert_eq!(extract_score("In 2023 there were 12 teams and 3 blockers"), Some(3.0));
        assert_eq!(extract_score("Q3 targets"), None);
    }

    #[test]
    fn other_denominators_rejected() {
        assert_eq!(extract_score("Score: 4.5/10"), None);
        assert_eq!(extract_score("Score: 8 / 10"), None);
        assert_eq!(extract_score("Score: 4.5/10, or 3.5 / 5 on our scale"), Some(3.5));
        assert_eq!(extract_score("Score: 4/5"), Some(4.0));
        assert_eq!(extract_score("Overall Difficulty Score: 3.2 / 5.0"), Some(3.2));
        assert_eq!(anchored_score("Hardness Level: HARD (4.6/10)"), None);
    }

    #[test]
    fn absent() {
        assert_eq!(extract_score("The analysis is inconclusive."), None);
        assert_eq!(extract_score(""), None);
    }

    #[test]
    fn always_in_bounds() {
        let samples = [
            "Score: 5.0",
            "Score: 0",
            "10/5 or 5.5 out of 5, then 4.9",
            "Difficulty: 9, fallback 1.25",
            "99 100 4.999",
        ];
        for s in samples {
            if let Some(v) = extract_score(s) {
                assert!((0.0..=5.0).contains(&v), "{} gave {}", s, v);
            }
        }
    }
}

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::score::anchored_score;

static LEVEL_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Hardness\s+Level|Classification|Difficulty\s+Level)\b[ \t]*(?::|=|-|\n)[ \t]*\n?[ \t]*([^\n]+)",
    )
    .unwrap()
});
static NEGATED_HARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnot(?:[_\s]+|\s+very\s+)(?:hard|difficult|complex)\b").unwrap()
});
static HARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:hard|difficult|complex|challenging)\b").unwrap());
static MODERATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:moderate|moderately|medium)\b").unwrap());
static EASY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:easy|simple|straightforward)\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Hard,
    Moderate,
    NotHard,
    Unknown,
}

impl Classification {
    /// Three-tier banding used for scores written in the text.
    pub fn from_band(score: f64) -> Self {
        if !score.is_finite() {
            Classification::Unknown
        } else if score > 4.0 {
            Classification::Hard
        } else if score > 3.0 {
            Classification::Moderate
        } else {
            Classification::NotHard
        }
    }

    /// Two-tier cut applied to a caller-supplied score when the text has
    /// no cue of its own. There is no moderate tier here.
    pub fn from_threshold(score: f64) -> Self {
        if !score.is_finite() {
            Classification::Unknown
        } else if score >= 4.0 {
            Classification::Hard
        } else {
            Classification::NotHard
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Classification::Hard => "HARD",
            Classification::Moderate => "MODERATE",
            Classification::NotHard => "NOT_HARD",
            Classification::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Classify the difficulty described in `text`.
///
/// Lexical evidence comes first: a labelled level (`Hardness Level: Hard`),
/// then cue words anywhere, then a score written in the text. Only when the
/// text has none of these is the supplied `score` thresholded.
pub fn extract_classification(text: &str, score: Option<f64>) -> Classification {
    let labelled = LEVEL_LABEL_RE
        .captures(text)
        .and_then(|caps| cue_words(&caps[1]));
    if let Some(c) = labelled.or_else(|| cue_words(text)) {
        return c;
    }
    if let Some(literal) = anchored_score(text) {
        return Classification::from_band(literal);
    }
    score.map_or(Classification::Unknown, Classification::from_threshold)
}

fn cue_words(text: &str) -> Option<Classification> {
    if NEGATED_HARD_RE.is_match(text) {
        Some(Classification::NotHard)
    } else if HARD_RE.is_match(text) {
        Some(Classification::Hard)
    } else if MODERATE_RE.is_match(text) {
        Some(Classification::Moderate)
    } else if EASY_RE.is_match(text) {
        Some(Classification::NotHard)
    } else {
        None
    }
}

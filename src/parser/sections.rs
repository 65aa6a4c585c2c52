use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use tracing::debug;

use super::compile_lenient;

/// Sentinel shown for a section that could not be found.
pub const NO_DATA: &str = "No data available";

static LEADING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.(?:\s+|$)").unwrap());
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\d+\.\s*$").unwrap());

/// A named pattern marking where a section starts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct Anchor {
    pub name: String,
    pub pattern: String,
}

impl Anchor {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Anchor {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    /// Anchor on a label followed by a colon or a line break,
    /// e.g. `Current System:` or `Inputs\n`.
    pub fn labelled(name: impl Into<String>, label: &str) -> Self {
        Anchor::new(name, format!(r"\b(?:{})[ \t]*[:\n]", label))
    }
}

pub mod anchors {
    use super::Anchor;

    pub fn current_system() -> Vec<Anchor> {
        vec![
            Anchor::labelled("core_problem", r"Core\s+Problem|Business\s+Problem"),
            Anchor::labelled("current_system", r"Current\s+System"),
            Anchor::labelled("inputs", r"Inputs?"),
            Anchor::labelled("outputs", r"Outputs?"),
            Anchor::labelled("pain_points", r"Pain\s+Points?"),
        ]
    }

    pub fn hardness() -> Vec<Anchor> {
        vec![
            Anchor::labelled("overall_difficulty_score", r"Overall\s+Difficulty\s+Score"),
            Anchor::labelled("hardness_level", r"Hardness\s+Level"),
            Anchor::labelled("sme_justification", r"SME\s+Justification"),
            Anchor::labelled("summary", r"Summary"),
            Anchor::labelled("key_takeaways", r"Key\s+Takeaways?"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionValue {
    Found(String),
    Missing,
}

impl SectionValue {
    pub fn as_str(&self) -> &str {
        match self {
            SectionValue::Found(text) => text,
            SectionValue::Missing => NO_DATA,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SectionValue::Found(_))
    }
}

impl fmt::Display for SectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section name → content, in the caller's declared anchor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(String, SectionValue)>,
}

impl SectionMap {
    pub fn get(&self, name: &str) -> Option<&SectionValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn found_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_found()).count()
    }

    /// Transform every found section, leaving missing ones in place.
    pub fn map_found<F>(&self, mut f: F) -> SectionMap
    where
        F: FnMut(&str) -> String,
    {
        let entries = self
            .entries
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    SectionValue::Found(text) => SectionValue::Found(f(text)),
                    SectionValue::Missing => SectionValue::Missing,
                };
                (name.clone(), value)
            })
            .collect();
        SectionMap { entries }
    }
}

impl Serialize for SectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value.as_str())?;
        }
        map.end()
    }
}

/// Slice `text` into the sections named by `anchors`.
///
/// Boundaries follow the order in which anchors actually occur in the
/// text, so a section runs from the end of its anchor to the start of the
/// next anchor found after it. Key order in the result follows `anchors`.
/// Every anchor gets an entry; unmatched or empty ones are `Missing`.
pub fn split_sections(text: &str, anchors: &[Anchor]) -> SectionMap {
    // (anchor index, match start, match end)
    let mut hits: Vec<(usize, usize, usize)> = anchors
        .iter()
        .enumerate()
        .filter_map(|(k, anchor)| {
            let re = compile_lenient(&anchor.pattern)?;
            let m = re.find(text)?;
            Some((k, m.start(), m.end()))
        })
        .collect();
    hits.sort_by_key(|&(k, start, _)| (start, k));

    let mut values = vec![SectionValue::Missing; anchors.len()];
    for (pos, &(k, _, end)) in hits.iter().enumerate() {
        let stop = hits.get(pos + 1).map_or(text.len(), |&(_, start, _)| start);
        if stop <= end {
            continue;
        }
        let content = clean_section(&text[end..stop]);
        if !content.is_empty() {
            values[k] = SectionValue::Found(content);
        }
    }

    debug!(
        anchors = anchors.len(),
        matched = hits.len(),
        "split sections"
    );

    SectionMap {
        entries: anchors
            .iter()
            .map(|a| a.name.clone())
            .zip(values)
            .collect(),
    }
}

fn clean_section(raw: &str) -> String {
    let text = raw.trim();
    let text = TRAILING_NUMBER_RE.replace(text, "");
    let text = LEADING_NUMBER_RE.replace(&text, "");
    text.trim().to_string()
}

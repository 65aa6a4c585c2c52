use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::parser::sections::{anchors, Anchor, NO_DATA};

/// Per-caller settings for the classifier and the section splitter.
///
/// Each agent page formats its model output with slightly different
/// vocabulary; a profile captures those differences so the same engine
/// serves all of them. Profiles load from JSON with every field optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    /// Lines matching this pattern open a section heading block.
    pub section_pattern: Option<String>,
    /// Longest label (in words) still treated as `Label: value`.
    pub key_value_max_words: usize,
    /// Drop `N.` prefixes from every line before classifying.
    pub strip_numbering: bool,
    /// Rewrite `" - "` to `" : "` so dashed definitions split like labels.
    pub dash_to_colon: bool,
    pub highlight_phrases: Vec<String>,
    /// Whole lines rendered as headings even without a colon.
    pub standalone_headings: Vec<String>,
    /// Rendered in place of an empty document.
    pub placeholder: String,
    pub anchors: Vec<Anchor>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::generic()
    }
}

impl Profile {
    pub fn generic() -> Self {
        Profile {
            name: "generic".into(),
            section_pattern: Some(r"Step\s*\d+\s*:".into()),
            key_value_max_words: 8,
            strip_numbering: false,
            dash_to_colon: true,
            highlight_phrases: Vec::new(),
            standalone_headings: Vec::new(),
            placeholder: NO_DATA.into(),
            anchors: Vec::new(),
        }
    }

    pub fn vocabulary() -> Self {
        Profile {
            name: "vocabulary".into(),
            standalone_headings: vec!["Revenue Growth Rate".into()],
            placeholder: "No vocabulary data available".into(),
            ..Self::generic()
        }
    }

    pub fn current_system() -> Self {
        Profile {
            name: "current-system".into(),
            section_pattern: Some(
                r"^\s*(?:Current\s+System|Inputs?|Outputs?|Pain\s+Points?|System\s+Description)\b"
                    .into(),
            ),
            key_value_max_words: 12,
            strip_numbering: true,
            placeholder: "No current system data available".into(),
            anchors: anchors::current_system(),
            ..Self::generic()
        }
    }

    pub fn hardness() -> Self {
        Profile {
            name: "hardness".into(),
            section_pattern: Some(
                r"^\s*(?:Overall\s+Difficulty\s+Score|Hardness\s+Level|SME\s+Justification|Summary|Key\s+Takeaways?)\b"
                    .into(),
            ),
            key_value_max_words: 12,
            placeholder: "No hardness data available".into(),
            anchors: anchors::hardness(),
            ..Self::generic()
        }
    }

    /// Look up a built-in profile by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "generic" => Some(Self::generic()),
            "vocabulary" => Some(Self::vocabulary()),
            "current-system" | "current_system" => Some(Self::current_system()),
            "hardness" => Some(Self::hardness()),
            _ => None,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading profile {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing profile {}", path.display()))
    }

    pub fn with_highlights<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight_phrases.extend(phrases.into_iter().map(Into::into));
        self
    }
}

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Step\s*(\d+)\s*:\s*([^\n]+)").unwrap());
static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+([^:\n]+)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub number: u32,
    pub title: String,
    /// Numbered entries listed under the step, label part only.
    pub items: Vec<String>,
}

/// Outline of `Step N: title` sections and the numbered items under each.
///
/// Works on raw or sanitized text. Repeated step numbers keep the first
/// occurrence.
pub fn extract_steps(text: &str) -> Vec<Step> {
    let matches: Vec<_> = STEP_RE.captures_iter(text).collect();
    let mut seen = HashSet::new();
    let mut steps = Vec::new();

    for (idx, caps) in matches.iter().enumerate() {
        let Ok(number) = caps[1].parse::<u32>() else {
            continue;
        };
        if !seen.insert(number) {
            continue;
        }

        let body_start = caps.get(0).map_or(0, |m| m.end());
        let body_end = matches
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = &text[body_start..body_end];

        let items = ITEM_RE
            .captures_iter(body)
            .map(|c| clean_fragment(&c[1]))
            .filter(|item| !item.is_empty())
            .collect();

        steps.push(Step {
            number,
            title: clean_fragment(&caps[2]),
            items,
        });
    }

    steps
}

fn clean_fragment(raw: &str) -> String {
    TAG_RE
        .replace_all(raw, "")
        .replace(['*', '`'], "")
        .trim()
        .to_string()
}

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::compile_lenient;
use crate::profile::Profile;

static NUM_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+\.\s+[^:]+):\s*(.*)$").unwrap());
static NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s+(.+)$").unwrap());
static BULLET_KV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(•|\d+\.)\s*([^:\d][^:]*):\s*(.*)$").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*•\s*(.*)$").unwrap());
static KV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([^:]+):\s*(.*)$").unwrap());
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:•|-|\d+\.)\s+").unwrap());
static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]*").unwrap());
static DASH_BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Bullet,
    /// Digits of an `N.` marker, kept as written.
    Numbered(String),
}

impl Marker {
    fn parse(token: &str) -> Self {
        match token.trim().strip_suffix('.') {
            Some(digits) => Marker::Numbered(digits.to_string()),
            None => Marker::Bullet,
        }
    }

    pub fn glyph(&self) -> String {
        match self {
            Marker::Bullet => "•".to_string(),
            Marker::Numbered(n) => format!("{}.", n),
        }
    }
}

/// One classified line (or line group) of model output.
///
/// Multi-line blocks join their lines with `\n`; renderers turn that
/// into the surface's line break.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Blank,
    SectionHeading {
        text: String,
    },
    KeyValue {
        label: String,
        value: String,
    },
    ListItem {
        marker: Marker,
        label: Option<String>,
        value: Option<String>,
        /// Content after the marker, continuations included.
        raw: String,
        emphasized: bool,
    },
    PlainLine {
        text: String,
        /// Byte ranges of caller highlight phrases, sorted and disjoint.
        highlights: Vec<Range<usize>>,
    },
}

impl Block {
    pub fn is_blank(&self) -> bool {
        matches!(self, Block::Blank)
    }

    /// The source lines this block was built from, after normalization.
    pub fn source_text(&self) -> String {
        match self {
            Block::Blank => String::new(),
            Block::SectionHeading { text } => text.clone(),
            Block::KeyValue { label, value } => join_label(label, value),
            Block::ListItem { marker, raw, .. } if raw.is_empty() => marker.glyph(),
            Block::ListItem { marker, raw, .. } => format!("{} {}", marker.glyph(), raw),
            Block::PlainLine { text, .. } => text.clone(),
        }
    }
}

fn join_label(label: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{}:", label)
    } else {
        format!("{}: {}", label, value)
    }
}

/// Classification rules in precedence order; the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Blank,
    Highlight,
    SectionMarker,
    NumberedKeyValue,
    NumberedHeading,
    BulletItem,
    KeyValue,
    StandaloneHeading,
    Plain,
}

pub const RULES: [Rule; 9] = [
    Rule::Blank,
    Rule::Highlight,
    Rule::SectionMarker,
    Rule::NumberedKeyValue,
    Rule::NumberedHeading,
    Rule::BulletItem,
    Rule::KeyValue,
    Rule::StandaloneHeading,
    Rule::Plain,
];

/// Line classifier compiled from a [`Profile`].
#[derive(Debug, Clone)]
pub struct Classifier {
    section: Option<Regex>,
    highlights: Vec<Regex>,
    standalone: Vec<String>,
    key_value_max_words: usize,
    strip_numbering: bool,
    dash_to_colon: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::new(&Profile::generic())
    }
}

impl Classifier {
    pub fn new(profile: &Profile) -> Self {
        Classifier {
            section: profile.section_pattern.as_deref().and_then(compile_lenient),
            highlights: profile
                .highlight_phrases
                .iter()
                .filter_map(|p| compile_lenient(p))
                .collect(),
            standalone: profile
                .standalone_headings
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            key_value_max_words: profile.key_value_max_words,
            strip_numbering: profile.strip_numbering,
            dash_to_colon: profile.dash_to_colon,
        }
    }

    /// Profile-specific rewrites applied to sanitized text before classifying.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = if self.strip_numbering {
            NUMBER_PREFIX_RE.replace_all(text, "").into_owned()
        } else {
            text.to_string()
        };
        if self.dash_to_colon {
            out = out.replace(" - ", " : ");
        }
        DASH_BULLET_RE.replace_all(&out, "• ").into_owned()
    }

    /// Normalize `text` and split it into an ordered block stream.
    pub fn classify(&self, text: &str) -> Vec<Block> {
        if text.trim().is_empty() {
            return vec![Block::Blank];
        }

        let normalized = self.normalize(text);
        let lines: Vec<&str> = normalized.lines().collect();
        let mut blocks = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let (rule, block, next) = self.classify_at(&lines, i);
            trace!(?rule, line = i, consumed = next - i, "classified");
            blocks.push(block);
            i = next;
        }

        blocks
    }

    /// Classify the line at `i`, returning the winning rule, its block and
    /// the index of the first unconsumed line (always `> i`). An index past
    /// the end reads as a blank line.
    pub fn classify_at(&self, lines: &[&str], i: usize) -> (Rule, Block, usize) {
        if i >= lines.len() {
            return (Rule::Blank, Block::Blank, i + 1);
        }
        for rule in RULES {
            if let Some((block, next)) = self.apply(rule, lines, i) {
                debug_assert!(next > i);
                return (rule, block, next);
            }
        }
        // Rule::Plain always applies
        (Rule::Plain, plain(lines[i]), i + 1)
    }

    fn apply(&self, rule: Rule, lines: &[&str], i: usize) -> Option<(Block, usize)> {
        let line = lines[i].trim_end();
        match rule {
            Rule::Blank => line.trim().is_empty().then_some((Block::Blank, i + 1)),

            Rule::Highlight => {
                let text = line.trim();
                let highlights = self.highlight_ranges(text);
                if highlights.is_empty() {
                    return None;
                }
                let block = Block::PlainLine {
                    text: text.to_string(),
                    highlights,
                };
                Some((block, i + 1))
            }

            Rule::SectionMarker => {
                if !self.is_section_marker(line) {
                    return None;
                }
                let (group, next) = collect_continuation(lines, i);
                let block = Block::SectionHeading {
                    text: join_trimmed(&group),
                };
                Some((block, next))
            }

            Rule::NumberedKeyValue => {
                let caps = NUM_COLON_RE.captures(line)?;
                let block = Block::KeyValue {
                    label: caps[1].trim().to_string(),
                    value: caps[2].trim().to_string(),
                };
                Some((block, i + 1))
            }

            Rule::NumberedHeading => {
                let caps = NUM_RE.captures(line)?;
                let (group, next) = collect_continuation(lines, i);
                let mut parts = vec![caps[2].trim()];
                parts.extend(group[1..].iter().map(|l| l.trim()));
                let block = Block::ListItem {
                    marker: Marker::Numbered(caps[1].to_string()),
                    label: None,
                    value: None,
                    raw: parts.join("\n"),
                    emphasized: true,
                };
                Some((block, next))
            }

            Rule::BulletItem => {
                if let Some(caps) = BULLET_KV_RE.captures(line) {
                    let label = caps[2].trim().to_string();
                    let value = caps[3].trim().to_string();
                    let block = Block::ListItem {
                        marker: Marker::parse(&caps[1]),
                        raw: join_label(&label, &value),
                        label: Some(label),
                        value: Some(value),
                        emphasized: false,
                    };
                    return Some((block, i + 1));
                }
                let caps = BULLET_RE.captures(line)?;
                let (group, next) = collect_continuation(lines, i);
                let mut parts = vec![caps[1].trim()];
                parts.extend(group[1..].iter().map(|l| l.trim()));
                let block = Block::ListItem {
                    marker: Marker::Bullet,
                    label: None,
                    value: None,
                    raw: parts.join("\n").trim().to_string(),
                    emphasized: false,
                };
                Some((block, next))
            }

            Rule::KeyValue => {
                let caps = KV_RE.captures(line)?;
                let label = caps[1].trim();
                let value = caps[2].trim();
                if label.is_empty()
                    || label.split_whitespace().count() > self.key_value_max_words
                    || value.starts_with("//")
                    || self.is_section_marker(label)
                {
                    return None;
                }
                let block = Block::KeyValue {
                    label: label.to_string(),
                    value: value.to_string(),
                };
                Some((block, i + 1))
            }

            Rule::StandaloneHeading => {
                let text = line.trim();
                if !self.standalone.contains(&text.to_lowercase()) {
                    return None;
                }
                let block = Block::SectionHeading {
                    text: text.to_string(),
                };
                Some((block, i + 1))
            }

            Rule::Plain => Some((plain(line), i + 1)),
        }
    }

    fn is_section_marker(&self, text: &str) -> bool {
        self.section.as_ref().is_some_and(|re| re.is_match(text))
    }

    fn highlight_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let mut ranges: Vec<Range<usize>> = self
            .highlights
            .iter()
            .flat_map(|re| re.find_iter(text))
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect();
        ranges.sort_by_key(|r| (r.start, r.end));

        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for r in ranges {
            match merged.last_mut() {
                Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
                _ => merged.push(r),
            }
        }
        merged
    }
}

fn plain(line: &str) -> Block {
    Block::PlainLine {
        text: line.trim_end().to_string(),
        highlights: Vec::new(),
    }
}

fn join_trimmed(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gather the line at `start` plus any wrapped continuation lines.
///
/// A continuation is indented or starts lowercase. Collection stops at a
/// blank line or a line that opens its own bullet/numbered item. Returns
/// the collected lines and the index of the first line not consumed.
/// A `start` past the end collects nothing.
pub fn collect_continuation<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    if start >= lines.len() {
        return (Vec::new(), start);
    }
    let mut group = vec![lines[start].trim_end()];
    let mut j = start + 1;

    while j < lines.len() {
        let next = lines[j];
        if next.trim().is_empty() || LIST_MARKER_RE.is_match(next) {
            break;
        }
        let indented = next.starts_with(char::is_whitespace);
        let lowercase = next
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_lowercase);
        if !(indented || lowercase) {
            break;
        }
        group.push(next.trim_end());
        j += 1;
    }

    (group, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Vec<Block> {
        Classifier::default().classify(text)
    }

    fn rule_for(classifier: &Classifier, line: &str) -> Rule {
        classifier.classify_at(&[line], 0).0
    }

    #[test]
    fn empty_string() {
        let blocks = classify("");
        assert_eq!(blocks, vec![Block::Blank]);
    }

    #[test]
    fn only_bullet_markers() {
        let blocks = classify("•\n•\n•");
        assert_eq!(blocks.len(), 3);
        assert!(blocks
            .iter()
            .all(|b| matches!(b, Block::ListItem { marker: Marker::Bullet, raw, .. } if raw.is_empty())));
    }

    #[test]
    fn key_values() {
        let blocks = classify("Account: Acme Corp\nIndustry: Retail");
        assert_eq!(
            blocks,
            vec![
                Block::KeyValue {
                    label: "Account".into(),
                    value: "Acme Corp".into()
                },
                Block::KeyValue {
                    label: "Industry".into(),
                    value: "Retail".into()
                },
            ]
        );
    }

    #[test]
    fn key_value_word_threshold() {
        let short = Classifier::new(&Profile::vocabulary());
        let long = Classifier::new(&Profile::current_system());
        let line = "The ten word label that keeps on going and going on: value";
        assert_eq!(rule_for(&short, line), Rule::Plain);
        assert_eq!(rule_for(&long, line), Rule::KeyValue);
    }

    #[test]
    fn url_is_not_a_label() {
        let c = Classifier::default();
        assert_eq!(rule_for(&c, "See https://example.com"), Rule::Plain);
    }

    #[test]
    fn step_heading_collects_continuation() {
        let blocks = classify("Step 1: Revenue\n  measured quarterly\nGrowth rate is 5%.");
        assert_eq!(
            blocks[0],
            Block::SectionHeading {
                text: "Step 1: Revenue\nmeasured quarterly".into()
            }
        );
        assert!(matches!(&blocks[1], Block::KeyValue { .. } | Block::PlainLine { .. }));
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn section_vocabulary_beats_key_value() {
        let c = Classifier::new(&Profile::current_system());
        assert_eq!(rule_for(&c, "Inputs: orders and returns"), Rule::SectionMarker);
        assert_eq!(rule_for(&c, "Inputting orders: manual"), Rule::KeyValue);
        let g = Classifier::default();
        assert_eq!(rule_for(&g, "Inputs: orders and returns"), Rule::KeyValue);
    }

    #[test]
    fn numbered_with_colon() {
        let c = Classifier::default();
        let (rule, block, _) = c.classify_at(&["1. Gross Margin: revenue minus COGS"], 0);
        assert_eq!(rule, Rule::NumberedKeyValue);
        assert_eq!(
            block,
            Block::KeyValue {
                label: "1. Gross Margin".into(),
                value: "revenue minus COGS".into()
            }
        );
    }

    #[test]
    fn numbered_without_colon() {
        let blocks = classify("2. Churn Rate\nshare of customers lost\n3. Next item");
        assert_eq!(
            blocks[0],
            Block::ListItem {
                marker: Marker::Numbered("2".into()),
                label: None,
                value: None,
                raw: "Churn Rate\nshare of customers lost".into(),
                emphasized: true,
            }
        );
        assert!(matches!(&blocks[1], Block::ListItem { marker: Marker::Numbered(n), .. } if n == "3"));
    }

    #[test]
    fn bullet_with_label() {
        let blocks = classify("• EBITDA: earnings before interest");
        assert_eq!(
            blocks[0],
            Block::ListItem {
                marker: Marker::Bullet,
                label: Some("EBITDA".into()),
                value: Some("earnings before interest".into()),
                raw: "EBITDA: earnings before interest".into(),
                emphasized: false,
            }
        );
    }

    #[test]
    fn dash_definitions_become_labels() {
        let blocks = classify("- ARPU - average revenue per user");
        assert!(matches!(&blocks[0], Block::ListItem { label: Some(l), .. } if l == "ARPU"));
    }

    #[test]
    fn standalone_heading() {
        let c = Classifier::new(&Profile::vocabulary());
        assert_eq!(rule_for(&c, "  Revenue Growth Rate "), Rule::StandaloneHeading);
        assert_eq!(rule_for(&Classifier::default(), "Revenue Growth Rate"), Rule::Plain);
    }

    #[test]
    fn highlight_bypasses_other_rules() {
        let c = Classifier::new(&Profile::generic().with_highlights(["churn"]));
        let (rule, block, _) = c.classify_at(&["Churn: customers lost, churn is high"], 0);
        assert_eq!(rule, Rule::Highlight);
        assert_eq!(
            block,
            Block::PlainLine {
                text: "Churn: customers lost, churn is high".into(),
                highlights: vec![0..5, 23..28],
            }
        );
    }

    #[test]
    fn overlapping_highlights_merge() {
        let c = Classifier::new(&Profile::generic().with_highlights(["gross margin", "margin rate"]));
        let (_, block, _) = c.classify_at(&["the gross margin rate fell"], 0);
        assert!(matches!(block, Block::PlainLine { highlights, .. } if highlights == vec![4..21]));
    }

    #[test]
    fn invalid_highlight_pattern_matches_literally() {
        let c = Classifier::new(&Profile::generic().with_highlights(["growth (yoy", "[unclosed"]));
        let (rule, block, _) = c.classify_at(&["Revenue growth (YoY was strong, [unclosed bracket"], 0);
        assert_eq!(rule, Rule::Highlight);
        assert!(matches!(block, Block::PlainLine { highlights, .. } if highlights.len() == 2));
    }

    #[test]
    fn strip_numbering_profile() {
        let c = Classifier::new(&Profile::current_system());
        let blocks = c.classify("2. Inputs: orders\n3. Outputs: invoices");
        assert!(blocks
            .iter()
            .all(|b| matches!(b, Block::SectionHeading { .. })));
    }

    #[test]
    fn continuation_cursor() {
        let lines = ["Step 1: A", "  wrapped", "lower start", "Upper stops", "tail"];
        let (group, next) = collect_continuation(&lines, 0);
        assert_eq!(group, vec!["Step 1: A", "  wrapped", "lower start"]);
        assert_eq!(next, 3);

        let lines = ["1. A", "• b", "c"];
        assert_eq!(collect_continuation(&lines, 0), (vec!["1. A"], 1));

        let lines = ["1. A", "", "  indented"];
        assert_eq!(collect_continuation(&lines, 0), (vec!["1. A"], 1));

        let lines = ["last"];
        assert_eq!(collect_continuation(&lines, 0), (vec!["last"], 1));
    }

    #[test]
    fn out_of_range_cursor() {
        assert_eq!(collect_continuation(&[], 0), (Vec::new(), 0));
        assert_eq!(collect_continuation(&["a"], 3), (Vec::new(), 3));

        let c = Classifier::default();
        assert_eq!(c.classify_at(&[], 0), (Rule::Blank, Block::Blank, 1));
        assert_eq!(c.classify_at(&["Step 1: A"], 1), (Rule::Blank, Block::Blank, 2));
    }

    #[test]
    fn every_line_consumed_once() {
        let text = "Step 1: A\nwrapped\n\n1. B\n  more\n• c: d\nplain Line\nK: v";
        let c = Classifier::default();
        let normalized = c.normalize(text);
        let lines: Vec<&str> = normalized.lines().collect();
        let mut i = 0;
        let mut consumed = 0;
        while i < lines.len() {
            let (_, _, next) = c.classify_at(&lines, i);
            assert!(next > i);
            consumed += next - i;
            i = next;
        }
        assert_eq!(consumed, lines.len());
    }

    #[test]
    fn order_preserved() {
        let text = "Step 1: Revenue\nGrowth rate is 5%.\n\n• KPI: margin\n2. Cost\nplain words here";
        let c = Classifier::default();
        let expected: Vec<String> = c
            .normalize(text)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        let rebuilt: Vec<String> = c
            .classify(text)
            .iter()
            .filter(|b| !b.is_blank())
            .flat_map(|b| {
                b.source_text()
                    .lines()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        assert_eq!(rebuilt, expected);
    }

    #[test]
    fn vocabulary_fixture() {
        let raw = std::fs::read_to_string("tests/fixtures/vocabulary.txt").unwrap();
        let clean = crate::parser::sanitize(&raw);
        let blocks = Classifier::new(&Profile::vocabulary()).classify(&clean);
        let headings = blocks
            .iter()
            .filter(|b| matches!(b, Block::SectionHeading { text } if text.starts_with("Step")))
            .count();
        assert_eq!(headings, 3);
        assert!(blocks.iter().any(|b| matches!(b, Block::KeyValue { .. })));
        assert!(blocks.iter().any(|b| matches!(b, Block::ListItem { .. })));
    }
}

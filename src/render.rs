use std::ops::Range;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::parser::blocks::{Block, Marker};
use crate::parser::document::{Document, Paragraph};

static COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthe\s+company\b").unwrap());
static INDUSTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bthe\s+industry\b").unwrap());

/// Values the selection widgets report when nothing real was picked.
const UNSET_NAMES: [&str; 4] = [
    "unknown company",
    "unknown industry",
    "select account",
    "select industry",
];

/// Presentation strings for one output surface.
///
/// The block model carries structure only; everything visual comes from
/// here. Loads from JSON with missing fields taken from [`Theme::html`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub wrapper_open: String,
    pub wrapper_close: String,
    pub paragraph_open: String,
    pub paragraph_close: String,
    pub paragraph_separator: String,
    pub line_break: String,
    pub strong_open: String,
    pub strong_close: String,
    pub heading_open: String,
    pub heading_close: String,
    pub bullet: String,
    pub escape_html: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::html()
    }
}

impl Theme {
    pub fn html() -> Self {
        Theme {
            wrapper_open: r#"<div class="prose-display">"#.into(),
            wrapper_close: "</div>".into(),
            paragraph_open: "<p style='margin:6px 0; line-height:1.45; font-size:0.98rem;'>".into(),
            paragraph_close: "</p>".into(),
            paragraph_separator: String::new(),
            line_break: "<br>".into(),
            strong_open: "<strong>".into(),
            strong_close: "</strong>".into(),
            heading_open: "<strong>".into(),
            heading_close: "</strong>".into(),
            bullet: "•".into(),
            escape_html: true,
        }
    }

    pub fn plain() -> Self {
        Theme {
            wrapper_open: String::new(),
            wrapper_close: String::new(),
            paragraph_open: String::new(),
            paragraph_close: String::new(),
            paragraph_separator: "\n\n".into(),
            line_break: "\n".into(),
            strong_open: String::new(),
            strong_close: String::new(),
            heading_open: String::new(),
            heading_close: String::new(),
            bullet: "•".into(),
            escape_html: false,
        }
    }

    /// Plain layout with ANSI bold for emphasis.
    pub fn terminal() -> Self {
        Theme {
            strong_open: "\x1b[1m".into(),
            strong_close: "\x1b[0m".into(),
            heading_open: "\x1b[1;4m".into(),
            heading_close: "\x1b[0m".into(),
            ..Theme::plain()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "html" => Some(Self::html()),
            "plain" => Some(Self::plain()),
            "terminal" => Some(Self::terminal()),
            _ => None,
        }
    }

    /// Escape `text` for this surface and map `\n` to its line break.
    fn text(&self, text: &str) -> String {
        let escaped = if self.escape_html {
            escape_html(text)
        } else {
            text.to_string()
        };
        escaped.replace('\n', &self.line_break)
    }

    fn strong(&self, text: &str) -> String {
        format!("{}{}{}", self.strong_open, self.text(text), self.strong_close)
    }

    fn heading(&self, text: &str) -> String {
        format!("{}{}{}", self.heading_open, self.text(text), self.heading_close)
    }
}

/// Serialize `doc` for the surface described by `theme`.
///
/// An empty document renders as `placeholder`, never as an empty string.
pub fn render(doc: &Document, theme: &Theme, placeholder: &str) -> String {
    if doc.is_empty() {
        return placeholder.to_string();
    }

    let body = doc
        .paragraphs
        .iter()
        .map(|p| render_paragraph(p, theme))
        .collect::<Vec<_>>()
        .join(&theme.paragraph_separator);

    let out = format!("{}{}{}", theme.wrapper_open, body, theme.wrapper_close);
    collapse_breaks(&out, &theme.line_break)
}

fn render_paragraph(paragraph: &Paragraph, theme: &Theme) -> String {
    let lines: Vec<String> = paragraph
        .blocks
        .iter()
        .filter_map(|b| render_block(b, theme))
        .collect();
    format!(
        "{}{}{}",
        theme.paragraph_open,
        lines.join(&theme.line_break),
        theme.paragraph_close
    )
}

fn render_block(block: &Block, theme: &Theme) -> Option<String> {
    let out = match block {
        Block::Blank => return None,
        Block::SectionHeading { text } => theme.heading(text),
        Block::KeyValue { label, value } => labelled(theme, label, value),
        Block::ListItem {
            marker,
            label,
            value,
            raw,
            emphasized,
        } => {
            let glyph = match marker {
                Marker::Bullet => theme.bullet.clone(),
                Marker::Numbered(_) => marker.glyph(),
            };
            let content = match (label, value) {
                (Some(label), value) => labelled(theme, label, value.as_deref().unwrap_or("")),
                _ if raw.is_empty() => return Some(theme.text(&glyph)),
                _ if *emphasized => theme.strong(raw),
                _ => theme.text(raw),
            };
            format!("{} {}", theme.text(&glyph), content)
        }
        Block::PlainLine { text, highlights } => highlighted(theme, text, highlights),
    };
    Some(out)
}

fn labelled(theme: &Theme, label: &str, value: &str) -> String {
    let label = theme.strong(&format!("{}:", label));
    if value.is_empty() {
        label
    } else {
        format!("{} {}", label, theme.text(value))
    }
}

fn highlighted(theme: &Theme, text: &str, ranges: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for range in ranges {
        let (Some(before), Some(phrase)) = (text.get(pos..range.start), text.get(range.clone()))
        else {
            continue;
        };
        out.push_str(&theme.text(before));
        out.push_str(&theme.strong(phrase));
        pos = range.end;
    }
    out.push_str(&theme.text(text.get(pos..).unwrap_or("")));
    out
}

/// Collapse runs of three or more line breaks down to two.
fn collapse_breaks(markup: &str, line_break: &str) -> String {
    if line_break.is_empty() {
        return markup.to_string();
    }
    let pattern = format!(r"(?:{}[ \t]*){{3,}}", regex::escape(line_break));
    match Regex::new(&pattern) {
        Ok(re) => re
            .replace_all(markup, NoExpand(&line_break.repeat(2)))
            .into_owned(),
        Err(_) => markup.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Swap generic references (`the company`, `the industry`) for the names
/// the user selected. Unset or placeholder names leave the text alone.
pub fn personalize(markup: &str, account: &str, industry: &str, theme: &Theme) -> String {
    let mut out = markup.to_string();
    for (re, name) in [(&*COMPANY_RE, account), (&*INDUSTRY_RE, industry)] {
        let name = name.trim();
        if name.is_empty() || UNSET_NAMES.contains(&name.to_lowercase().as_str()) {
            continue;
        }
        let name = if theme.escape_html {
            escape_html(name)
        } else {
            name.to_string()
        };
        out = re.replace_all(&out, NoExpand(&name)).into_owned();
    }
    out
}

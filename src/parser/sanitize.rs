use std::sync::LazyLock;

use regex::Regex;

static STRAY_S_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*s[ \t]*(?:\n|$)").unwrap());
static STRAY_S_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:[ \t]*s[ \t]+)+").unwrap());
static ANSWER_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Q\d+\s*Answer\s*Explanation\s*:").unwrap());
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(\S(?:[^\n]*?\S)?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(\S(?:[^*\n]*?\S)?)\*").unwrap());
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[^\n]*$").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]*)`").unwrap());
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*").unwrap());
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*$").unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]\n]*\]\([^)\n]*\)").unwrap());
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\([^)\n]*\)").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());
static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*][ \t]+").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>\n]*>").unwrap());

/// Strip markdown and model artifacts from raw LLM output.
///
/// The rule set is re-applied until the text stops changing, so the
/// result is a fixed point: `sanitize(&sanitize(t)) == sanitize(t)`.
///
/// A pass that changes the text either shortens it or swaps an ASCII
/// bullet marker for `•` at the same length, so the loop terminates.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
    loop {
        let next = sanitize_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn sanitize_pass(text: &str) -> String {
    // 1. stray "s" tokens left by the upstream parser
    let text = STRAY_S_LINE_RE.replace_all(text, "");
    let text = STRAY_S_PREFIX_RE.replace_all(&text, "");

    // 2. boilerplate labels
    let text = ANSWER_LABEL_RE.replace_all(&text, "");

    // 3. emphasis and code
    let text = BOLD_RE.replace_all(&text, "$1");
    let text = ITALIC_RE.replace_all(&text, "$1");
    let text = FENCE_RE.replace_all(&text, "");
    let text = CODE_RE.replace_all(&text, "$1");

    // 4. headers, rules, images, links
    let text = HEADER_RE.replace_all(&text, "");
    let text = RULE_RE.replace_all(&text, "");
    let text = IMAGE_RE.replace_all(&text, "");
    let text = LINK_RE.replace_all(&text, "$1");

    // 5. whitespace
    let text = BLANK_RUN_RE.replace_all(&text, "\n\n");
    let text = SPACE_RUN_RE.replace_all(&text, " ");

    // 6. bullets
    let text = BULLET_RE.replace_all(&text, "• ");

    // 7. html
    let text = TAG_RE.replace_all(&text, "");
    let text = text
        .replace("&amp;", "&")
        .replace("& Key Takeaway:", "Key Takeaway:");

    // 8.
    text.trim().to_string()
}

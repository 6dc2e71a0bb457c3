use regex::Regex;
use std::sync::LazyLock;

static MARKUP_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid markup tag regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

pub const TITLE_MAX_CHARS: usize = 60;
pub const UNTITLED: &str = "Untitled";

/// Reduce rich-text markup to the text a reader would actually see.
///
/// Tags become spaces, `&nbsp;` becomes a space, whitespace runs collapse to a
/// single space and the ends are trimmed.
pub fn strip_to_plain_text(markup: &str) -> String {
    let without_tags = MARKUP_TAG_RE.replace_all(markup, " ");
    let without_nbsp = without_tags.replace("&nbsp;", " ");
    WHITESPACE_RE
        .replace_all(&without_nbsp, " ")
        .trim()
        .to_string()
}

pub fn derive_title(content: &str) -> String {
    let text = strip_to_plain_text(content);
    if text.is_empty() {
        return UNTITLED.to_string();
    }
    text.chars().take(TITLE_MAX_CHARS).collect()
}

pub fn validate_content(content: &str) -> bool {
    !strip_to_plain_text(content).is_empty()
}

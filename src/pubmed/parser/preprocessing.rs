//! Cleanup applied to EFetch XML before it reaches the reader

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Strip inline formatting tags (`<i>`, `<sup>`, `<sub>`, ...) from titles and abstracts
///
/// Removing them up front lets every text run inside `ArticleTitle` or
/// `AbstractText` arrive as one contiguous string.
pub(crate) fn strip_inline_html_tags(xml: &str) -> String {
    static INLINE_TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = INLINE_TAG_REGEX.get_or_init(|| {
        Regex::new(r"</?(?:i|b|u|sup|sub|em|strong|italic|bold)>")
            .expect("inline tag pattern is valid")
    });

    let cleaned = re.replace_all(xml, "");

    if cleaned.len() != xml.len() {
        debug!(
            original_bytes = xml.len(),
            cleaned_bytes = cleaned.len(),
            "Stripped inline formatting tags"
        );
    }

    cleaned.into_owned()
}

/// Trim and collapse internal whitespace runs to single spaces
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

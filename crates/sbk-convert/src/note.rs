//! Plain-text extraction from saved notes.
//!
//! A note is stored as `index.html` whose text sits in the first `<pre>`
//! element. The line break right after the opening tag is markup, not
//! content.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// First `<pre>` element body; an unclosed element runs to the end.
static PRE_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<pre(?:[\s/][^>]*)?>(.*?)(?:</pre|\z)").expect("valid pre regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Text content of the first `<pre>` element, or `None` if there is none.
///
/// Nested tags are dropped and character references decoded.
pub fn extract_pre_text(html: &str) -> Option<String> {
    let raw = PRE_BODY.captures(html)?.get(1)?.as_str();
    let stripped = TAG.replace_all(raw, "");
    let text: Cow<str> = html_escape::decode_html_entities(&stripped);
    let text = text
        .strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(&text);
    Some(text.to_string())
}

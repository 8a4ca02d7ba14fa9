use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Built once, shared by every serializer call.
static TEXT_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">"])
        .expect("Failed to build XML text escaper")
});

static ATTR_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "\n", "\r", "\t"])
        .expect("Failed to build XML attribute escaper")
});

/// Escape character data for element content.
///
/// Only `&`, `<` and `>` are replaced; quotes are legal in text nodes and are
/// written as-is so run text stays byte-identical to what authoring tools emit.
///
/// # Examples
///
/// ```
/// use longan::common::xml::escape_text;
/// assert_eq!(escape_text("R&D <2025>"), "R&amp;D &lt;2025&gt;");
/// assert_eq!(escape_text("\"quoted\""), "\"quoted\"");
/// ```
#[inline]
pub fn escape_text(s: &str) -> String {
    TEXT_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;"])
}

/// Escape an attribute value for a double-quoted attribute.
///
/// Whitespace control characters are written as character references so that
/// attribute-value normalization on re-read gives back the same string.
///
/// # Examples
///
/// ```
/// use longan::common::xml::escape_attr;
/// assert_eq!(escape_attr("a \"b\" & c"), "a &quot;b&quot; &amp; c");
/// assert_eq!(escape_attr("line\nbreak"), "line&#10;break");
/// ```
#[inline]
pub fn escape_attr(s: &str) -> String {
    ATTR_ESCAPER.replace_all(
        s,
        &["&amp;", "&lt;", "&gt;", "&quot;", "&#10;", "&#13;", "&#9;"],
    )
}

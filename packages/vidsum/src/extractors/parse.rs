//! Shared HTML and embedded-JSON parsing helpers for extractors.
//!
//! Platform pages embed their data as JSON blobs inside script tags
//! (`window.__INITIAL_STATE__ = {...}`) and mirror the essentials into
//! OpenGraph meta tags; extractors try the blob first and fall back to
//! the metas.

use regex::Regex;
use serde_json::Value;

/// Extract the content of an OpenGraph/meta tag by property or name.
pub(crate) fn meta_content(html: &str, property: &str) -> Option<String> {
    let escaped = regex::escape(property);

    // content= after the property attribute
    let forward = Regex::new(&format!(
        r#"<meta[^>]*(?:property|name)\s*=\s*["']{escaped}["'][^>]*content\s*=\s*["']([^"']*)["']"#
    ))
    .unwrap();
    if let Some(cap) = forward.captures(html) {
        let content = decode_entities(cap[1].trim());
        if !content.is_empty() {
            return Some(content);
        }
    }

    // content= before the property attribute
    let reversed = Regex::new(&format!(
        r#"<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*(?:property|name)\s*=\s*["']{escaped}["']"#
    ))
    .unwrap();
    if let Some(cap) = reversed.captures(html) {
        let content = decode_entities(cap[1].trim());
        if !content.is_empty() {
            return Some(content);
        }
    }

    None
}

/// All values of a repeated meta tag (e.g. one `og:image` per note
/// image).
pub(crate) fn meta_contents(html: &str, property: &str) -> Vec<String> {
    let escaped = regex::escape(property);
    let re = Regex::new(&format!(
        r#"<meta[^>]*(?:property|name)\s*=\s*["']{escaped}["'][^>]*content\s*=\s*["']([^"']*)["']"#
    ))
    .unwrap();
    re.captures_iter(html)
        .map(|cap| decode_entities(cap[1].trim()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// The page `<title>`, entity-decoded.
pub(crate) fn page_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap();
    re.captures(html)
        .map(|cap| decode_entities(cap[1].trim()))
        .filter(|s| !s.is_empty())
}

/// Parse the `window.__INITIAL_STATE__` JSON blob embedded in a page.
pub(crate) fn initial_state(html: &str) -> Option<Value> {
    let re =
        Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.+?\})\s*;?\s*</script>").unwrap();
    let cap = re.captures(html)?;
    let raw = cap[1].trim().trim_end_matches(';');
    // Some pages serialize `undefined` into the blob, which is not JSON.
    let cleaned = raw.replace(":undefined", ":null");
    serde_json::from_str(&cleaned).ok()
}

/// Strip tags from rich-text HTML, preserving paragraph breaks.
pub(crate) fn strip_html(html: &str) -> String {
    let mut text = html.to_string();

    let script = Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap();
    let style = Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap();
    text = script.replace_all(&text, "").to_string();
    text = style.replace_all(&text, "").to_string();

    let breaks = Regex::new(r"(?i)</p>|<br\s*/?>").unwrap();
    text = breaks.replace_all(&text, "\n").to_string();

    let tags = Regex::new(r"<[^>]+>").unwrap();
    text = tags.replace_all(&text, "").to_string();

    let multi_newline = Regex::new(r"\n{3,}").unwrap();
    text = multi_newline.replace_all(&text, "\n\n").to_string();

    decode_entities(text.trim())
}

/// Decode the handful of HTML entities platform pages actually emit.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Pull a string field out of inline JSON by key, for pages where the
/// full blob fails to parse but the fields are still present.
pub(crate) fn inline_json_str(html: &str, key: &str) -> Option<String> {
    let escaped = regex::escape(key);
    let re = Regex::new(&format!(r#""{escaped}"\s*:\s*"((?:[^"\\]|\\.)*)""#)).unwrap();
    re.captures(html).map(|cap| {
        cap[1]
            .replace("\\n", "\n")
            .replace("\\\"", "\"")
            .replace("\\/", "/")
            .replace("\\\\", "\\")
    })
}

/// Pull an integer field out of inline JSON by key.
pub(crate) fn inline_json_int(html: &str, key: &str) -> Option<i64> {
    let escaped = regex::escape(key);
    let re = Regex::new(&format!(r#""{escaped}"\s*:\s*(\d+)"#)).unwrap();
    re.captures(html).and_then(|cap| cap[1].parse().ok())
}

//! Hidden form field scraping.
//!
//! The Green Button download POST only succeeds when it replays the
//! anti-forgery/state tokens the server renders into the billing page as
//! `<input type="hidden">` elements. This module pulls those name/value
//! pairs out of the page markup.

use std::collections::HashMap;

use regex::Regex;

fn input_tag_regex() -> Regex {
    Regex::new(r"(?is)<input\b[^>]*>").expect("Invalid regex")
}

fn hidden_type_regex() -> Regex {
    Regex::new(r#"(?is)\btype\s*=\s*["']?hidden["']?"#).expect("Invalid regex")
}

fn name_attr_regex() -> Regex {
    Regex::new(r#"(?is)\bname\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).expect("Invalid regex")
}

fn value_attr_regex() -> Regex {
    Regex::new(r#"(?is)\bvalue\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).expect("Invalid regex")
}

/// Extracts every `<input type="hidden">` name/value pair from `html`.
///
/// Pure function over the document: no network or session interaction.
/// Quoting style and attribute order do not matter. A page with no hidden
/// inputs yields an empty map; a hidden input without a value contributes
/// an empty string.
pub fn extract_hidden_fields(html: &str) -> HashMap<String, String> {
    let hidden = hidden_type_regex();
    let name = name_attr_regex();
    let value = value_attr_regex();

    let mut fields = HashMap::new();
    for tag in input_tag_regex().find_iter(html) {
        let tag = tag.as_str();
        if !hidden.is_match(tag) {
            continue;
        }
        let Some(field_name) = capture_attr(&name, tag) else {
            continue;
        };
        let field_value = capture_attr(&value, tag).unwrap_or_default();
        fields.insert(decode_entities(&field_name), decode_entities(&field_value));
    }
    fields
}

fn capture_attr(re: &Regex, tag: &str) -> Option<String> {
    let captures = re.captures(tag)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str().to_string())
}

/// Decodes the five standard HTML entities so scraped values replay what
/// the server rendered rather than its markup escaping.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ============================================================================
// Tests
// ============================================================================

/*
 * selector.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The selector provider: CSS queries shaped into template values.
//!
//! `selector:.headline` yields text, `selectorHtml:.headline` yields
//! serialized HTML, and a `?attr` suffix yields that attribute instead.
//! Zero matches produce the empty string, one match produces its value,
//! and several matches produce a JSON array of per-element values.

use clipnote_page::DomHandle;
use serde_json::Value;

use crate::value::Carry;

/// What to read from each matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorMode {
    Text,
    Html,
}

/// Run a selector expression (with optional `?attr` suffix) against the
/// borrowed DOM.
pub fn select(dom: &dyn DomHandle, raw: &str, mode: SelectorMode) -> Carry {
    let (selector, attr) = split_attr(raw);
    let selector = selector.trim();
    if selector.is_empty() {
        return Carry::str("");
    }

    let nodes = dom.query_selector_all(selector);
    let mut values: Vec<String> = nodes
        .iter()
        .map(|node| match (attr, mode) {
            (Some(name), _) => node.attribute(name).unwrap_or("").to_string(),
            (None, SelectorMode::Text) => node.text_content.clone(),
            (None, SelectorMode::Html) => node.outer_html.clone(),
        })
        .collect();

    match values.len() {
        0 => Carry::str(""),
        1 => Carry::Str(values.remove(0)),
        _ => Carry::Json(Value::Array(values.into_iter().map(Value::String).collect())),
    }
}

/// Split `selector?attr` at the last `?`. A trailing or missing attr
/// name means no attribute access.
fn split_attr(raw: &str) -> (&str, Option<&str>) {
    match raw.rfind('?') {
        Some(pos) => {
            let attr = raw[pos + 1..].trim();
            if attr.is_empty() {
                (&raw[..pos], None)
            } else {
                (&raw[..pos], Some(attr))
            }
        }
        None => (raw, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_page::HtmlDom;
    use serde_json::json;

    fn dom() -> HtmlDom {
        HtmlDom::parse(
            r#"<article>
                 <h1 class="headline">Top Story</h1>
                 <a class="ref" href="/a">one</a>
                 <a class="ref" href="/b">two</a>
               </article>"#,
        )
    }

    #[test]
    fn test_single_match_text() {
        let carry = select(&dom(), ".headline", SelectorMode::Text);
        assert_eq!(carry, Carry::str("Top Story"));
    }

    #[test]
    fn test_single_match_html() {
        let carry = select(&dom(), ".headline", SelectorMode::Html);
        assert_eq!(
            carry,
            Carry::str(r#"<h1 class="headline">Top Story</h1>"#)
        );
    }

    #[test]
    fn test_many_matches_are_json() {
        let carry = select(&dom(), ".ref", SelectorMode::Text);
        assert_eq!(carry, Carry::Json(json!(["one", "two"])));
    }

    #[test]
    fn test_attr_suffix() {
        let carry = select(&dom(), ".ref?href", SelectorMode::Text);
        assert_eq!(carry, Carry::Json(json!(["/a", "/b"])));
    }

    #[test]
    fn test_missing_attr_is_empty_string() {
        let carry = select(&dom(), ".headline?href", SelectorMode::Text);
        assert_eq!(carry, Carry::str(""));
    }

    #[test]
    fn test_no_match_is_empty() {
        assert_eq!(select(&dom(), ".absent", SelectorMode::Text), Carry::str(""));
    }

    #[test]
    fn test_invalid_selector_is_empty() {
        assert_eq!(select(&dom(), "p::oops", SelectorMode::Text), Carry::str(""));
        assert_eq!(select(&dom(), "", SelectorMode::Text), Carry::str(""));
    }
}

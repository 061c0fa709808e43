//! Lenient HTML tree used by the DOM handle and the HTML filters.
//!
//! Real-world page markup is rarely well-formed, so the tokenizer here is
//! hand-written and tolerant: unknown constructs become text, unclosed
//! elements are closed at end of input, and mismatched end tags are
//! recovered from instead of rejected. Parsing is total — every input
//! produces a tree.

mod json;
mod markdown;
mod parse;

pub use json::{from_json, to_json};
pub use markdown::to_markdown;
pub use parse::parse;

use hashlink::LinkedHashMap;

/// A node in the HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    /// Text content (entities already decoded).
    Text(String),

    /// An element with attributes and children.
    Element(HtmlElement),
}

/// An HTML element.
///
/// Tag names are lowercased at parse time. Attribute order is preserved
/// so that serialization round-trips modulo whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    /// Lowercased tag name.
    pub tag: String,

    /// Attributes in source order, values entity-decoded.
    pub attributes: LinkedHashMap<String, String>,

    /// Child content.
    pub children: Vec<HtmlNode>,
}

/// Elements that never have children or end tags.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

impl HtmlElement {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: LinkedHashMap::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Serialize this element back to HTML.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }

    /// Serialize only the children of this element.
    pub fn inner_html(&self) -> String {
        serialize(&self.children)
    }

    /// Concatenated text content of this element's subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

impl HtmlNode {
    /// Serialize this node back to HTML.
    pub fn to_html(&self) -> String {
        match self {
            HtmlNode::Text(t) => escape_text(t),
            HtmlNode::Element(el) => el.outer_html(),
        }
    }

    /// The text content of this node.
    pub fn text_content(&self) -> String {
        match self {
            HtmlNode::Text(t) => t.clone(),
            HtmlNode::Element(el) => el.text_content(),
        }
    }
}

/// Serialize a node list back to HTML.
pub fn serialize(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(&escape_text(t)),
            HtmlNode::Element(el) => write_element(&mut out, el),
        }
    }
    out
}

/// Concatenated text content of a node list.
pub fn text_of(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

fn write_element(out: &mut String, el: &HtmlElement) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    if is_void(&el.tag) {
        return;
    }
    for child in &el.children {
        match child {
            HtmlNode::Text(t) => {
                // Raw-text elements keep their content verbatim.
                if el.tag == "script" || el.tag == "style" {
                    out.push_str(t);
                } else {
                    out.push_str(&escape_text(t));
                }
            }
            HtmlNode::Element(inner) => write_element(out, inner),
        }
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

pub(crate) fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_of_nested() {
        let nodes = parse("<div>a<span>b</span>c</div>");
        assert_eq!(text_of(&nodes), "abc");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let html = r#"<div class="x"><p>hi</p></div>"#;
        let nodes = parse(html);
        assert_eq!(serialize(&nodes), html);
    }

    #[test]
    fn test_outer_html_void() {
        let nodes = parse(r#"<img src="a.png">"#);
        assert_eq!(serialize(&nodes), r#"<img src="a.png">"#);
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a<b&c"), "a&lt;b&amp;c");
    }
}

//! Read-only DOM access.
//!
//! The engine never owns a browser document. It borrows a [`DomHandle`]
//! for the duration of one render and asks it one thing: which elements
//! match a CSS selector. Results come back as detached [`DomNode`]
//! snapshots so no live references outlive the call.
//!
//! [`HtmlDom`] is the bundled implementation, backed by the lenient HTML
//! tree in [`crate::html`]. It answers a practical selector subset: tag,
//! `#id`, `.class`, `[attr]`, `[attr=value]`, compound selectors,
//! descendant and child combinators, and comma-separated groups.

use hashlink::LinkedHashMap;

use crate::html::{self, HtmlElement, HtmlNode};

/// A detached snapshot of a matched element.
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    /// Concatenated text content of the subtree.
    pub text_content: String,

    /// The element serialized back to HTML.
    pub outer_html: String,

    /// Attributes in source order.
    pub attributes: LinkedHashMap<String, String>,
}

impl DomNode {
    /// Get an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }
}

/// Read-only query access to the live page document.
///
/// Implementations must tolerate invalid selectors by returning an empty
/// list; they must never mutate the underlying document.
pub trait DomHandle {
    /// Return all elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Vec<DomNode>;
}

/// A [`DomHandle`] with no document behind it.
///
/// Every query returns no matches. Useful for rendering templates that
/// use no `selector:` variables, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDom;

impl DomHandle for NullDom {
    fn query_selector_all(&self, _selector: &str) -> Vec<DomNode> {
        Vec::new()
    }
}

/// An in-memory DOM over parsed HTML.
#[derive(Debug, Clone)]
pub struct HtmlDom {
    roots: Vec<HtmlNode>,
}

impl HtmlDom {
    /// Parse `html` into a queryable document.
    pub fn parse(html: &str) -> Self {
        Self {
            roots: html::parse(html),
        }
    }
}

impl DomHandle for HtmlDom {
    fn query_selector_all(&self, selector: &str) -> Vec<DomNode> {
        let Ok(groups) = parse_selector(selector) else {
            tracing::debug!(selector, "invalid selector, returning no matches");
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut ancestors: Vec<&HtmlElement> = Vec::new();
        for node in &self.roots {
            visit(node, &mut ancestors, &groups, &mut out);
        }
        out
    }
}

fn visit<'a>(
    node: &'a HtmlNode,
    ancestors: &mut Vec<&'a HtmlElement>,
    groups: &[Vec<Step>],
    out: &mut Vec<DomNode>,
) {
    let HtmlNode::Element(el) = node else {
        return;
    };
    if groups.iter().any(|chain| matches_chain(el, ancestors, chain)) {
        out.push(DomNode {
            text_content: el.text_content(),
            outer_html: el.outer_html(),
            attributes: el.attributes.clone(),
        });
    }
    ancestors.push(el);
    for child in &el.children {
        visit(child, ancestors, groups, out);
    }
    ancestors.pop();
}

/// One compound selector plus the combinator that links it to the next.
#[derive(Debug, Clone, PartialEq)]
struct Step {
    compound: Compound,
    /// Relationship to the *following* step in the chain.
    combinator: Combinator,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
    /// The last step of a chain has no outgoing combinator.
    None,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, el: &HtmlElement) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        for class in &self.classes {
            let has = el
                .attr("class")
                .is_some_and(|c| c.split_ascii_whitespace().any(|part| part == class));
            if !has {
                return false;
            }
        }
        for (name, expected) in &self.attrs {
            match (el.attr(name), expected) {
                (Some(actual), Some(want)) if actual == want => {}
                (Some(_), None) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Match `el` (with its ancestor stack) against a combinator chain.
fn matches_chain(el: &HtmlElement, ancestors: &[&HtmlElement], chain: &[Step]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.compound.matches(el) {
        return false;
    }
    // Walk the remaining steps right-to-left up the ancestor stack.
    let mut upper = ancestors.len();
    for step in rest.iter().rev() {
        match step.combinator {
            Combinator::Child => {
                if upper == 0 || !step.compound.matches(ancestors[upper - 1]) {
                    return false;
                }
                upper -= 1;
            }
            _ => {
                let found = ancestors[..upper]
                    .iter()
                    .rposition(|anc| step.compound.matches(anc));
                match found {
                    Some(idx) => upper = idx,
                    None => return false,
                }
            }
        }
    }
    true
}

/// Parse a selector list. Returns `Err(())` on anything outside the
/// supported subset; callers translate that into "no matches".
fn parse_selector(input: &str) -> Result<Vec<Vec<Step>>, ()> {
    let mut groups = Vec::new();
    for part in input.split(',') {
        let chain = parse_chain(part.trim())?;
        if chain.is_empty() {
            return Err(());
        }
        groups.push(chain);
    }
    if groups.is_empty() { Err(()) } else { Ok(groups) }
}

fn parse_chain(input: &str) -> Result<Vec<Step>, ()> {
    let mut steps: Vec<Step> = Vec::new();
    let mut chars = input.chars().peekable();
    loop {
        // Leading whitespace / combinator before the next compound.
        let mut combinator = Combinator::Descendant;
        let mut saw_sep = false;
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                saw_sep = true;
                chars.next();
            } else if ch == '>' {
                combinator = Combinator::Child;
                saw_sep = true;
                chars.next();
            } else {
                break;
            }
        }
        if chars.peek().is_none() {
            break;
        }
        if let Some(prev) = steps.last_mut() {
            if !saw_sep {
                return Err(());
            }
            prev.combinator = combinator;
        }
        let compound = parse_compound(&mut chars)?;
        if compound.is_empty() {
            return Err(());
        }
        steps.push(Step {
            compound,
            combinator: Combinator::None,
        });
    }
    Ok(steps)
}

fn parse_compound(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Compound, ()> {
    let mut compound = Compound::default();
    while let Some(&ch) = chars.peek() {
        match ch {
            '*' => {
                chars.next();
                compound.tag = Some("*".to_string());
            }
            '#' => {
                chars.next();
                let name = read_ident(chars);
                if name.is_empty() {
                    return Err(());
                }
                compound.id = Some(name);
            }
            '.' => {
                chars.next();
                let name = read_ident(chars);
                if name.is_empty() {
                    return Err(());
                }
                compound.classes.push(name);
            }
            '[' => {
                chars.next();
                let name = read_ident(chars);
                if name.is_empty() {
                    return Err(());
                }
                let value = if chars.peek() == Some(&'=') {
                    chars.next();
                    Some(read_attr_value(chars))
                } else {
                    None
                };
                if chars.next() != Some(']') {
                    return Err(());
                }
                compound.attrs.push((name, value));
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => {
                if compound.tag.is_some() || !compound.is_empty() {
                    return Err(());
                }
                compound.tag = Some(read_ident(chars).to_ascii_lowercase());
            }
            c if c.is_whitespace() || c == '>' => break,
            _ => return Err(()),
        }
    }
    Ok(compound)
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
            chars.next();
        } else {
            break;
        }
    }
    out
}

fn read_attr_value(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut out = String::new();
    let quote = match chars.peek() {
        Some(&q @ ('"' | '\'')) => {
            chars.next();
            Some(q)
        }
        _ => None,
    };
    while let Some(&ch) = chars.peek() {
        match quote {
            Some(q) if ch == q => {
                chars.next();
                break;
            }
            None if ch == ']' => break,
            _ => {
                out.push(ch);
                chars.next();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom() -> HtmlDom {
        HtmlDom::parse(
            r#"<div id="top" class="wrap">
                 <p class="tag hot">A</p>
                 <p class="tag">B</p>
                 <span data-k="v">C</span>
                 <ul><li class="tag">D</li></ul>
               </div>"#,
        )
    }

    #[test]
    fn test_query_by_tag() {
        let nodes = dom().query_selector_all("p");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].text_content, "A");
    }

    #[test]
    fn test_query_by_class() {
        let nodes = dom().query_selector_all(".tag");
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_query_compound() {
        let nodes = dom().query_selector_all("p.tag.hot");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text_content, "A");
    }

    #[test]
    fn test_query_by_id() {
        let nodes = dom().query_selector_all("#top");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_query_attribute() {
        assert_eq!(dom().query_selector_all("[data-k]").len(), 1);
        assert_eq!(dom().query_selector_all("[data-k=v]").len(), 1);
        assert_eq!(dom().query_selector_all(r#"[data-k="v"]"#).len(), 1);
        assert_eq!(dom().query_selector_all("[data-k=w]").len(), 0);
    }

    #[test]
    fn test_query_descendant() {
        let nodes = dom().query_selector_all("div li");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].text_content, "D");
    }

    #[test]
    fn test_query_child() {
        // li is not a direct child of div.
        assert_eq!(dom().query_selector_all("div > li").len(), 0);
        assert_eq!(dom().query_selector_all("ul > li").len(), 1);
    }

    #[test]
    fn test_query_group() {
        let nodes = dom().query_selector_all("span, #top");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_invalid_selector_is_empty() {
        assert!(dom().query_selector_all("p:first-child").is_empty());
        assert!(dom().query_selector_all("").is_empty());
        assert!(dom().query_selector_all("[unclosed").is_empty());
    }

    #[test]
    fn test_attribute_snapshot() {
        let nodes = dom().query_selector_all("span");
        assert_eq!(nodes[0].attribute("data-k"), Some("v"));
    }
}

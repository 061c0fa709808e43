/*
 * html.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filters that transform HTML content.
//!
//! All of them parse the carried string into the lenient HTML tree,
//! rewrite it, and serialize back. A non-string carry passes through.

use clipnote_page::html::{self, HtmlElement, HtmlNode};

use crate::filters::{FilterArgs, FilterContext};
use crate::value::Carry;

/// Convert HTML to Markdown, resolving relative links against the
/// context URL.
pub fn markdown(carry: Carry, ctx: &FilterContext) -> Carry {
    on_html_text(carry, |text| {
        let base = (!ctx.url.is_empty()).then_some(ctx.url);
        html::to_markdown(text, base)
    })
}

/// `strip_tags` removes every tag (keeping text); `strip_tags:("p","a")`
/// keeps the listed tags.
pub fn strip_tags(carry: Carry, args: &FilterArgs) -> Carry {
    let keep = tag_list(args);
    on_nodes(carry, |nodes| {
        unwrap_tags(nodes, &|el| !keep.contains(&el.tag))
    })
}

/// `remove_tags:("span")` unwraps the listed tags, keeping their
/// content.
pub fn remove_tags(carry: Carry, args: &FilterArgs) -> Carry {
    let drop = tag_list(args);
    if drop.is_empty() {
        return carry;
    }
    on_nodes(carry, |nodes| {
        unwrap_tags(nodes, &|el| drop.contains(&el.tag))
    })
}

/// `replace_tags:("h1","h2")` renames elements.
pub fn replace_tags(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(from) = args.text(0).map(|s| s.trim().to_ascii_lowercase()) else {
        return carry;
    };
    let Some(to) = args.text(1).map(|s| s.trim().to_ascii_lowercase()) else {
        return carry;
    };
    if from.is_empty() || to.is_empty() {
        return carry;
    }
    on_nodes(carry, |nodes| {
        map_elements(nodes, &|el| {
            if el.tag == from {
                el.tag = to.clone();
            }
        })
    })
}

/// `strip_attr` removes every attribute; `strip_attr:("href")` keeps the
/// listed ones.
pub fn strip_attr(carry: Carry, args: &FilterArgs) -> Carry {
    let keep = tag_list(args);
    on_nodes(carry, |nodes| {
        map_elements(nodes, &|el| {
            el.attributes.retain(|name, _| keep.iter().any(|k| k == name));
        })
    })
}

/// `remove_attr:("class","style")` removes the listed attributes.
pub fn remove_attr(carry: Carry, args: &FilterArgs) -> Carry {
    let drop = tag_list(args);
    if drop.is_empty() {
        return carry;
    }
    on_nodes(carry, |nodes| {
        map_elements(nodes, &|el| {
            el.attributes.retain(|name, _| !drop.iter().any(|d| d == name));
        })
    })
}

/// `remove_html:(".ad", "#banner", "nav")` deletes matching elements and
/// their content. Selectors here are single compounds: tag, `.class`,
/// `#id`, or combinations.
pub fn remove_html(carry: Carry, args: &FilterArgs) -> Carry {
    let selectors: Vec<Compound> = tag_list(args)
        .iter()
        .filter_map(|raw| Compound::parse(raw))
        .collect();
    if selectors.is_empty() {
        return carry;
    }
    on_nodes(carry, |nodes| {
        drop_matching(nodes, &|el| selectors.iter().any(|s| s.matches(el)))
    })
}

/// Project the HTML tree to its JSON form.
pub fn html_to_json(carry: Carry) -> Carry {
    let input = match carry {
        Carry::Str(s) => s,
        other => return other,
    };
    let nodes = html::parse(&input);
    Carry::Json(html::to_json(&nodes))
}

fn on_html_text(carry: Carry, f: impl Fn(&str) -> String) -> Carry {
    match carry {
        Carry::Str(s) => Carry::Str(f(&s)),
        other => other,
    }
}

fn on_nodes(carry: Carry, f: impl Fn(Vec<HtmlNode>) -> Vec<HtmlNode>) -> Carry {
    on_html_text(carry, |text| html::serialize(&f(html::parse(text))))
}

/// Tag/attribute name lists may arrive as several arguments or one
/// comma-separated token.
fn tag_list(args: &FilterArgs) -> Vec<String> {
    args.values()
        .iter()
        .flat_map(|arg| arg.text().split(','))
        .map(|name| name.trim().trim_start_matches('<').trim_end_matches('>').to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Replace elements matching `unwrap` with their (recursively processed)
/// children.
fn unwrap_tags(nodes: Vec<HtmlNode>, unwrap: &dyn Fn(&HtmlElement) -> bool) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Element(mut el) => {
                let children = std::mem::take(&mut el.children);
                let children = unwrap_tags(children, unwrap);
                if unwrap(&el) {
                    out.extend(children);
                } else {
                    el.children = children;
                    out.push(HtmlNode::Element(el));
                }
            }
            text => out.push(text),
        }
    }
    out
}

/// Apply an in-place edit to every element.
fn map_elements(nodes: Vec<HtmlNode>, edit: &dyn Fn(&mut HtmlElement)) -> Vec<HtmlNode> {
    nodes
        .into_iter()
        .map(|node| match node {
            HtmlNode::Element(mut el) => {
                edit(&mut el);
                el.children = map_elements(std::mem::take(&mut el.children), edit);
                HtmlNode::Element(el)
            }
            text => text,
        })
        .collect()
}

/// Delete elements matching the predicate, content included.
fn drop_matching(nodes: Vec<HtmlNode>, matches: &dyn Fn(&HtmlElement) -> bool) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Element(mut el) => {
                if matches(&el) {
                    continue;
                }
                el.children = drop_matching(std::mem::take(&mut el.children), matches);
                out.push(HtmlNode::Element(el));
            }
            text => out.push(text),
        }
    }
    out
}

/// A single compound selector for `remove_html`.
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let mut compound = Compound {
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let mut rest = raw;
        while !rest.is_empty() {
            let (kind, body) = match rest.chars().next()? {
                '.' => ('.', &rest[1..]),
                '#' => ('#', &rest[1..]),
                _ => ('t', rest),
            };
            let end = body
                .find(['.', '#'])
                .unwrap_or(body.len());
            let name = body[..end].trim();
            if name.is_empty() {
                return None;
            }
            match kind {
                '.' => compound.classes.push(name.to_string()),
                '#' => compound.id = Some(name.to_string()),
                _ => compound.tag = Some(name.to_ascii_lowercase()),
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, el: &HtmlElement) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| {
            el.attr("class")
                .is_some_and(|c| c.split_ascii_whitespace().any(|part| part == class))
        })
    }
}

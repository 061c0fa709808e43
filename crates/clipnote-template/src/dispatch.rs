/*
 * dispatch.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The variable dispatcher: classify a mustache expression and route it
//! to the right provider.
//!
//! Routing is a closed prefix table — `selector:`, `selectorHtml:`,
//! `schema:`, `meta:name:`, `meta:property:`, the prompt forms, and the
//! variable map as the default. The dispatcher also detects the filter
//! tail, splitting on `|` only at top level (never inside quotes,
//! parenthesized argument groups, or `${…}` spans).

use clipnote_page::{DomHandle, MetaAttr, PageContext};

use crate::filters::{self, FilterContext};
use crate::path::{parse_path, resolve};
use crate::prompt::Prompts;
use crate::schema::SchemaIndex;
use crate::selector::{SelectorMode, select};
use crate::value::Carry;
use crate::vars::VariableMap;

/// Everything a render pass needs besides the variable map.
pub struct RenderEnv<'a> {
    pub page: &'a PageContext,
    pub schema: &'a SchemaIndex,
    pub dom: &'a dyn DomHandle,
    /// The context URL with text fragments already stripped.
    pub url: &'a str,
}

/// Resolve a full mustache expression (base plus filter tail) to a
/// carry. Prompt expressions register in `prompts` and come back as an
/// opaque sentinel.
pub fn resolve_expression(
    expr: &str,
    vars: &VariableMap,
    env: &RenderEnv<'_>,
    prompts: &mut Prompts,
) -> Carry {
    let (base, filter_specs) = split_expression(expr);
    let base = base.trim();

    if let Some(text) = prompt_text(base) {
        let sentinel = prompts.register(text, filter_specs);
        return Carry::Str(sentinel);
    }

    let carry = resolve_base(base, vars, env);
    let ctx = FilterContext { url: env.url };
    filters::apply_chain(carry, filter_specs.iter().map(String::as_str), &ctx)
}

/// Resolve just the base expression through the provider table.
pub fn resolve_base(base: &str, vars: &VariableMap, env: &RenderEnv<'_>) -> Carry {
    if let Some(rest) = base.strip_prefix("selector:") {
        return select(env.dom, rest.trim(), SelectorMode::Text);
    }
    if let Some(rest) = base.strip_prefix("selectorHtml:") {
        return select(env.dom, rest.trim(), SelectorMode::Html);
    }
    if let Some(rest) = base.strip_prefix("schema:") {
        return schema_lookup(rest.trim(), env.schema);
    }
    if let Some(rest) = base.strip_prefix("meta:name:") {
        return meta_lookup(env.page, MetaAttr::Name, rest.trim());
    }
    if let Some(rest) = base.strip_prefix("meta:property:") {
        return meta_lookup(env.page, MetaAttr::Property, rest.trim());
    }
    variable_lookup(base, vars)
}

fn schema_lookup(rest: &str, schema: &SchemaIndex) -> Carry {
    let result = match rest.strip_prefix('@') {
        Some(typed) => {
            // `@Type:path` is the canonical form; `@Type.path` also
            // appears in loop sources.
            let (type_name, path) = match typed.split_once(':') {
                Some((type_name, path)) => (type_name, path),
                None => typed.split_once('.').unwrap_or((typed, "")),
            };
            schema.typed(type_name.trim(), path.trim())
        }
        None => schema.shorthand(rest),
    };
    match result {
        Some(value) => Carry::from_value(value),
        None => Carry::str(""),
    }
}

fn meta_lookup(page: &PageContext, attr: MetaAttr, value: &str) -> Carry {
    Carry::str(page.meta_content(attr, value).unwrap_or(""))
}

/// Default provider: the variable map, with `.`/`[n]` steps resolved
/// over the bound value.
fn variable_lookup(expr: &str, vars: &VariableMap) -> Carry {
    // Exact binding wins, path steps otherwise.
    if let Some(value) = vars.get(expr) {
        return Carry::str(value);
    }
    let head_len = expr.find(['.', '[']).unwrap_or(expr.len());
    let (name, tail) = expr.split_at(head_len);
    let Some(bound) = vars.get(name) else {
        return Carry::str("");
    };
    if tail.is_empty() {
        return Carry::str(bound);
    }
    let tail = tail.strip_prefix('.').unwrap_or(tail);
    let root = Carry::str(bound).to_value();
    match resolve(&root, &parse_path(tail)) {
        Some(value) => Carry::from_value(value),
        None => Carry::str(""),
    }
}

/// The prompt provider recognizes `"…"` and `prompt:"…"`.
fn prompt_text(base: &str) -> Option<String> {
    let quoted = |s: &str| -> Option<String> {
        let inner = s.strip_prefix('"')?.strip_suffix('"')?;
        Some(inner.to_string())
    };
    if let Some(rest) = base.strip_prefix("prompt:") {
        let rest = rest.trim();
        return quoted(rest).or_else(|| Some(rest.to_string()));
    }
    quoted(base)
}

/// Split an expression into its base and filter tail at top-level `|`.
pub fn split_expression(expr: &str) -> (String, Vec<String>) {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut paren_depth = 0i32;
    let mut brace_depth = 0i32;
    let mut chars = expr.chars().peekable();

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == '\\' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' => {
                    paren_depth += 1;
                    current.push(ch);
                }
                ')' => {
                    paren_depth -= 1;
                    current.push(ch);
                }
                '$' if chars.peek() == Some(&'{') => {
                    brace_depth += 1;
                    current.push(ch);
                    current.push(chars.next().expect("peeked brace"));
                }
                '}' if brace_depth > 0 => {
                    brace_depth -= 1;
                    current.push(ch);
                }
                '|' if paren_depth <= 0 && brace_depth == 0 => {
                    parts.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            },
        }
    }
    parts.push(current);

    let mut iter = parts.into_iter();
    let base = iter.next().unwrap_or_default();
    let filters = iter
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    (base, filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_page::{HtmlDom, MetaAttr, PageContext};
    use serde_json::json;

    fn page() -> PageContext {
        PageContext::builder()
            .url("https://example.com/post")
            .title("A Post")
            .meta_entry(MetaAttr::Name, "author", "Jo")
            .meta_entry(MetaAttr::Property, "og:image", "https://example.com/i.png")
            .add_json_ld(r#"{"@type": "Recipe", "name": "Bread"}"#)
            .timestamp(0)
            .build()
    }

    fn with_env<R>(page: &PageContext, dom: &HtmlDom, f: impl FnOnce(&RenderEnv<'_>) -> R) -> R {
        let schema = SchemaIndex::build(&page.schema_org);
        let env = RenderEnv {
            page,
            schema: &schema,
            dom,
            url: &page.url,
        };
        f(&env)
    }

    fn resolve_str(expr: &str, vars: &VariableMap, page: &PageContext, dom: &HtmlDom) -> String {
        with_env(page, dom, |env| {
            let mut prompts = Prompts::new();
            resolve_expression(expr, vars, env, &mut prompts).into_output()
        })
    }

    #[test]
    fn test_split_plain() {
        let (base, filters) = split_expression("title|upper|trim");
        assert_eq!(base, "title");
        assert_eq!(filters, vec!["upper", "trim"]);
    }

    #[test]
    fn test_split_respects_quotes() {
        let (base, filters) = split_expression(r#"title|replace:"a|b":"c""#);
        assert_eq!(base, "title");
        assert_eq!(filters, vec![r#"replace:"a|b":"c""#]);
    }

    #[test]
    fn test_split_respects_parens() {
        let (_, filters) = split_expression(r#"x|replace:(/a|b/g:"c")|upper"#);
        assert_eq!(filters, vec![r#"replace:(/a|b/g:"c")"#, "upper"]);
    }

    #[test]
    fn test_split_respects_dollar_brace() {
        let (_, filters) = split_expression(r#"hl|template:"${a|b}""#);
        assert_eq!(filters, vec![r#"template:"${a|b}""#]);
    }

    #[test]
    fn test_variable_provider() {
        let page = page();
        let dom = HtmlDom::parse("");
        let mut vars = VariableMap::new();
        vars.insert("title", "Hello");
        assert_eq!(resolve_str("title|upper", &vars, &page, &dom), "HELLO");
        assert_eq!(resolve_str("missing", &vars, &page, &dom), "");
    }

    #[test]
    fn test_variable_path_steps() {
        let page = page();
        let dom = HtmlDom::parse("");
        let mut vars = VariableMap::new();
        vars.insert_value("book", &json!({"authors": ["A", "B"]}));
        assert_eq!(resolve_str("book.authors[1]", &vars, &page, &dom), "B");
        assert_eq!(resolve_str("book.missing", &vars, &page, &dom), "");
    }

    #[test]
    fn test_schema_provider() {
        let page = page();
        let dom = HtmlDom::parse("");
        let vars = VariableMap::new();
        assert_eq!(
            resolve_str("schema:@Recipe:name", &vars, &page, &dom),
            "Bread"
        );
        assert_eq!(resolve_str("schema:name", &vars, &page, &dom), "Bread");
        assert_eq!(resolve_str("schema:@Recipe.name", &vars, &page, &dom), "Bread");
    }

    #[test]
    fn test_meta_provider() {
        let page = page();
        let dom = HtmlDom::parse("");
        let vars = VariableMap::new();
        assert_eq!(resolve_str("meta:name:author", &vars, &page, &dom), "Jo");
        assert_eq!(
            resolve_str("meta:property:og:image", &vars, &page, &dom),
            "https://example.com/i.png"
        );
        assert_eq!(resolve_str("meta:name:absent", &vars, &page, &dom), "");
    }

    #[test]
    fn test_selector_provider() {
        let page = page();
        let dom = HtmlDom::parse(r#"<h1 class="t">Headline</h1>"#);
        let vars = VariableMap::new();
        assert_eq!(resolve_str("selector:.t", &vars, &page, &dom), "Headline");
        assert_eq!(
            resolve_str("selectorHtml:.t", &vars, &page, &dom),
            r#"<h1 class="t">Headline</h1>"#
        );
    }

    #[test]
    fn test_prompt_provider_emits_sentinel() {
        let page = page();
        let dom = HtmlDom::parse("");
        let vars = VariableMap::new();
        with_env(&page, &dom, |env| {
            let mut prompts = Prompts::new();
            let out =
                resolve_expression(r#""summarize this"|blockquote"#, &vars, env, &mut prompts)
                    .into_output();
            assert_eq!(prompts.requests().len(), 1);
            assert_eq!(prompts.requests()[0].prompt, "summarize this");
            assert_eq!(prompts.requests()[0].filters, vec!["blockquote"]);
            assert_eq!(out, prompts.sentinel_for(0));
        });
    }

    #[test]
    fn test_prompt_prefix_form() {
        assert_eq!(
            prompt_text(r#"prompt:"what is this?""#),
            Some("what is this?".to_string())
        );
        assert_eq!(
            prompt_text("prompt:bare words"),
            Some("bare words".to_string())
        );
        assert_eq!(prompt_text(r#""quoted""#), Some("quoted".to_string()));
        assert_eq!(prompt_text("title"), None);
    }
}

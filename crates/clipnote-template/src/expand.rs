/*
 * expand.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The logic pass: `{% for NAME in SOURCE %} … {% endfor %}` expansion.
//!
//! Blocks nest; the outermost block expands first, tracking balance by
//! counting openings and closings. Per iteration the variable map is
//! cloned, the iterator name bound to the element's canonical string,
//! iterator-rooted mustaches resolved in place, and nested blocks
//! expanded recursively. Outer bindings are never mutated.
//!
//! After this pass only `{{…}}` expressions and literal text remain:
//! loops over non-arrays expand to nothing, and stray or unknown
//! `{% … %}` directives are consumed.

use crate::dispatch::{RenderEnv, resolve_expression, split_expression};
use crate::prompt::Prompts;
use crate::vars::{VariableMap, canonical_string};

/// Expand every logic block in `template`.
pub fn expand_logic(
    template: &str,
    vars: &VariableMap,
    env: &RenderEnv<'_>,
    prompts: &mut Prompts,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{%") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open..];
        let Some((directive, directive_len)) = read_directive(after_open) else {
            // Unterminated directive; drop the marker and move on.
            rest = &after_open[2..];
            continue;
        };

        match parse_directive(&directive) {
            Directive::For { name, source } => {
                match find_block_end(&after_open[directive_len..]) {
                    Some((body, consumed)) => {
                        expand_block(&name, &source, body, vars, env, prompts, &mut out);
                        rest = &after_open[directive_len + consumed..];
                    }
                    None => {
                        // No matching endfor; consume the directive alone.
                        tracing::debug!(%name, "for block without endfor");
                        rest = &after_open[directive_len..];
                    }
                }
            }
            Directive::EndFor | Directive::Unknown => {
                rest = &after_open[directive_len..];
            }
        }
    }
    out.push_str(rest);
    out
}

enum Directive {
    For { name: String, source: String },
    EndFor,
    Unknown,
}

/// Read one `{% … %}` directive starting at the given text. Returns the
/// directive content and total length consumed.
fn read_directive(text: &str) -> Option<(String, usize)> {
    debug_assert!(text.starts_with("{%"));
    let close = text.find("%}")?;
    Some((text[2..close].trim().to_string(), close + 2))
}

fn parse_directive(content: &str) -> Directive {
    if content == "endfor" {
        return Directive::EndFor;
    }
    let Some(rest) = content.strip_prefix("for ") else {
        return Directive::Unknown;
    };
    let rest = rest.trim();
    let Some((name, rest)) = rest.split_once(char::is_whitespace) else {
        return Directive::Unknown;
    };
    let Some(source) = rest.trim_start().strip_prefix("in ") else {
        return Directive::Unknown;
    };
    let source = source.trim();
    if name.is_empty() || source.is_empty() {
        return Directive::Unknown;
    }
    Directive::For {
        name: name.to_string(),
        source: source.to_string(),
    }
}

/// Find the body of the block opened just before `text`, honoring
/// nesting. Returns the body slice and the bytes consumed through the
/// matching `{% endfor %}`.
fn find_block_end(text: &str) -> Option<(&str, usize)> {
    let mut depth = 1usize;
    let mut pos = 0usize;
    while let Some(open) = text[pos..].find("{%") {
        let at = pos + open;
        let Some((content, len)) = read_directive(&text[at..]) else {
            return None;
        };
        match parse_directive(&content) {
            Directive::For { .. } => depth += 1,
            Directive::EndFor => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[..at], at + len));
                }
            }
            Directive::Unknown => {}
        }
        pos = at + len;
    }
    None
}

/// Expand one block for every element of its source array.
fn expand_block(
    name: &str,
    source: &str,
    body: &str,
    vars: &VariableMap,
    env: &RenderEnv<'_>,
    prompts: &mut Prompts,
    out: &mut String,
) {
    let carry = resolve_expression(source, vars, env, prompts);
    let Some(items) = carry.as_array() else {
        tracing::debug!(source, "loop source is not an array, expanding to nothing");
        return;
    };

    for item in &items {
        let mut iter_vars = vars.clone();
        iter_vars.insert(name, canonical_string(item));
        let substituted = substitute_iterator(body, name, &iter_vars, env, prompts);
        out.push_str(&expand_logic(&substituted, &iter_vars, env, prompts));
    }
}

/// Resolve mustaches rooted at the iterator name inside a loop body,
/// leaving every other mustache for the later variable pass.
fn substitute_iterator(
    body: &str,
    name: &str,
    vars: &VariableMap,
    env: &RenderEnv<'_>,
    prompts: &mut Prompts,
) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        let expr = &rest[open + 2..open + 2 + close];
        let end = open + 2 + close + 2;
        if is_rooted_at(expr, name) {
            out.push_str(&rest[..open]);
            out.push_str(&resolve_expression(expr.trim(), vars, env, prompts).into_output());
        } else {
            out.push_str(&rest[..end]);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

/// Does the expression's base start at the given variable name?
fn is_rooted_at(expr: &str, name: &str) -> bool {
    let (base, _) = split_expression(expr);
    let base = base.trim();
    match base.strip_prefix(name) {
        Some("") => true,
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}

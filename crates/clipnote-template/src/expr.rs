/*
 * expr.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The restricted mini-expression language used by `map` and `template`.
//!
//! `map` takes an arrow expression `ident => body` where the body is one
//! of exactly three shapes:
//!
//! 1. a path rooted at the parameter (`item`, `item.a.b`, `item[0].c`),
//! 2. an object literal of paths (`({k1: item.a, k2: item.b})`),
//! 3. a template literal (`"- ${item.text}"`), producing `{str: …}`.
//!
//! Everything else is rejected: no arithmetic, no calls, no operators.
//! Rejection is deliberate — callers fall back to a no-op mapping, which
//! keeps rendering total and deterministic.

use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};
use crate::path::{Step, parse_path, resolve};
use crate::value::value_to_text;

/// A parsed arrow expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowExpr {
    pub param: String,
    pub body: ArrowBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    /// A parameter-rooted path; empty steps mean the element itself.
    Path(Vec<Step>),

    /// `({key: path, …})` — each value a parameter-rooted path.
    Object(Vec<(String, Vec<Step>)>),

    /// `"…${path}…"` — produces `{str: <expanded>}` per element.
    Template(TemplateLit),
}

/// A parsed template literal: literal runs and `${path}` holes.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLit {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Lit(String),
    Path(String),
}

impl ArrowExpr {
    /// Parse `ident => body`.
    pub fn parse(raw: &str) -> TemplateResult<Self> {
        let (param, body) = raw.split_once("=>").ok_or_else(|| unsupported(raw))?;
        let param = param.trim();
        if !is_identifier(param) {
            return Err(unsupported(raw));
        }
        let body = body.trim();

        let body = if body.starts_with('"') || body.starts_with('\'') {
            ArrowBody::Template(TemplateLit::parse(body)?)
        } else if body.starts_with('(') {
            ArrowBody::Object(parse_object_body(body, param)?)
        } else {
            let steps = relative_steps(body, param).ok_or_else(|| unsupported(raw))?;
            ArrowBody::Path(steps)
        };

        Ok(Self {
            param: param.to_string(),
            body,
        })
    }

    /// Apply the arrow to one element.
    pub fn apply(&self, element: &Value) -> Value {
        match &self.body {
            ArrowBody::Path(steps) => resolve(element, steps).unwrap_or(Value::Null),
            ArrowBody::Object(fields) => {
                let mut out = Map::new();
                for (key, steps) in fields {
                    let value = resolve(element, steps).unwrap_or(Value::Null);
                    out.insert(key.clone(), value);
                }
                Value::Object(out)
            }
            ArrowBody::Template(lit) => {
                let mut out = Map::new();
                out.insert(
                    "str".to_string(),
                    Value::String(lit.expand(element, Some(&self.param))),
                );
                Value::Object(out)
            }
        }
    }
}

impl TemplateLit {
    /// Parse a quoted template literal, honoring `\n`, `\t`, `\"`, `\\`
    /// escapes outside the `${…}` holes.
    pub fn parse(raw: &str) -> TemplateResult<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let quote = match chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(unsupported(raw)),
        };

        let mut segments = Vec::new();
        let mut lit = String::new();
        let mut closed = false;
        while let Some(ch) = chars.next() {
            match ch {
                c if c == quote => {
                    closed = true;
                    break;
                }
                '\\' => match chars.next() {
                    Some('n') => lit.push('\n'),
                    Some('t') => lit.push('\t'),
                    Some(other) => lit.push(other),
                    None => break,
                },
                '$' => {
                    if chars.as_str().starts_with('{') {
                        chars.next();
                        let rest = chars.as_str();
                        let end = rest.find('}').ok_or_else(|| unsupported(raw))?;
                        let path = rest[..end].trim().to_string();
                        chars = rest[end + 1..].chars();
                        if !lit.is_empty() {
                            segments.push(Segment::Lit(std::mem::take(&mut lit)));
                        }
                        segments.push(Segment::Path(path));
                    } else {
                        lit.push('$');
                    }
                }
                other => lit.push(other),
            }
        }
        if !closed {
            return Err(unsupported(raw));
        }
        if !lit.is_empty() {
            segments.push(Segment::Lit(lit));
        }
        Ok(Self { segments })
    }

    /// Expand against one element. `param` names the arrow parameter so
    /// `${item.x}` and `${x}` both resolve; unknown paths expand empty.
    pub fn expand(&self, element: &Value, param: Option<&str>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Lit(text) => out.push_str(text),
                Segment::Path(path) => {
                    let steps = match param.and_then(|p| relative_steps(path, p)) {
                        Some(steps) => steps,
                        None => parse_path(path),
                    };
                    if let Some(value) = resolve(element, &steps) {
                        out.push_str(&value_to_text(&value));
                    }
                }
            }
        }
        out
    }
}

fn parse_object_body(body: &str, param: &str) -> TemplateResult<Vec<(String, Vec<Step>)>> {
    let inner = body
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .map(str::trim)
        .ok_or_else(|| unsupported(body))?;
    let inner = inner
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| unsupported(body))?;

    let mut fields = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let (key, path) = item.split_once(':').ok_or_else(|| unsupported(body))?;
        let key = key.trim().trim_matches(['"', '\'']).to_string();
        if key.is_empty() {
            return Err(unsupported(body));
        }
        let steps = relative_steps(path.trim(), param).ok_or_else(|| unsupported(body))?;
        fields.push((key, steps));
    }
    if fields.is_empty() {
        return Err(unsupported(body));
    }
    Ok(fields)
}

/// Steps of a parameter-rooted path, relative to the element.
///
/// `item` → `[]`, `item.a.b` → `[a, b]`, `item[0].c` → `[0, c]`.
fn relative_steps(path: &str, param: &str) -> Option<Vec<Step>> {
    if path == param {
        return Some(Vec::new());
    }
    let rest = path.strip_prefix(param)?;
    if rest.starts_with('.') {
        Some(parse_path(&rest[1..]))
    } else if rest.starts_with('[') {
        Some(parse_path(rest))
    } else {
        None
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn unsupported(raw: &str) -> TemplateError {
    TemplateError::UnsupportedExpression {
        message: raw.to_string(),
    }
}

/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Dotted/bracketed path resolution over JSON value trees.
//!
//! Paths are sequences of steps: property names (`a.b`), numeric indexes
//! (`[0]`), and the splat (`[*]`) which maps the remainder of the path
//! over every element of an array. A string value that parses as JSON is
//! auto-parsed before descending, so schema fields holding stringified
//! JSON still resolve.

use serde_json::Value;

/// One step of a resolution path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.name`
    Key(String),
    /// `[0]`
    Index(usize),
    /// `[*]`
    Splat,
}

/// Parse `a.b[0].c` / `x[*].y` into steps.
///
/// Parsing is lenient: malformed bracket contents become key steps so
/// resolution can still fail softly instead of erroring.
pub fn parse_path(path: &str) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('.') {
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('[') {
            let end = match after.find(']') {
                Some(end) => end,
                None => {
                    steps.push(Step::Key(after.to_string()));
                    break;
                }
            };
            let inner = &after[..end];
            if inner == "*" {
                steps.push(Step::Splat);
            } else if let Ok(index) = inner.parse::<usize>() {
                steps.push(Step::Index(index));
            } else {
                steps.push(Step::Key(inner.trim_matches(['"', '\'']).to_string()));
            }
            rest = &after[end + 1..];
            continue;
        }
        let end = rest.find(['.', '[']).unwrap_or(rest.len());
        steps.push(Step::Key(rest[..end].to_string()));
        rest = &rest[end..];
    }
    steps
}

/// Resolve `steps` against `value`. Missing keys, out-of-range indexes,
/// and type mismatches all yield `None`.
pub fn resolve(value: &Value, steps: &[Step]) -> Option<Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Some(value.clone());
    };

    // Descend through stringified JSON.
    if let Value::String(s) = value {
        let trimmed = s.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                return resolve(&parsed, steps);
            }
        }
        return None;
    }

    match step {
        Step::Key(key) => resolve(value.as_object()?.get(key)?, rest),
        Step::Index(index) => resolve(value.as_array()?.get(*index)?, rest),
        Step::Splat => {
            let items = value.as_array()?;
            let mapped: Vec<Value> = items
                .iter()
                .filter_map(|item| resolve(item, rest))
                .collect();
            Some(Value::Array(mapped))
        }
    }
}

/// Parse and resolve in one call.
pub fn resolve_path(value: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(value.clone());
    }
    resolve(value, &parse_path(path))
}

/*
 * schema.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Index over the page's JSON-LD blobs.
//!
//! Construction walks every parsed blob and registers each object that
//! carries an `@type` (under every type name when `@type` is an array).
//! Two query forms are answered:
//!
//! - typed: `@Type:path` — the first registered object of `Type`, then
//!   the path resolved against it;
//! - shorthand: `key` / `key.sub` — breadth-first over the blob trees for
//!   the first object containing `key`, then the path resolved there.
//!
//! A resolved scalar that looks like a numbered or bulleted list is split
//! into an array of item texts, so recipe instructions stored as one
//! string still iterate.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::path::resolve_path;

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+\.|[-*])\s+").expect("list pattern compiles"));

/// Queryable index over a page's JSON-LD.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    /// `(type name, object)` in document walk order.
    by_type: Vec<(String, Value)>,

    /// The blob roots, for shorthand breadth-first search.
    roots: Vec<Value>,
}

impl SchemaIndex {
    /// Build the index from parsed JSON-LD blobs.
    pub fn build(blobs: &[Value]) -> Self {
        let mut by_type = Vec::new();
        for blob in blobs {
            register(blob, &mut by_type);
        }
        Self {
            by_type,
            roots: blobs.to_vec(),
        }
    }

    /// `@Type:path` — typed lookup. The leading `@` must already be
    /// stripped from `type_name`.
    pub fn typed(&self, type_name: &str, path: &str) -> Option<Value> {
        let object = self
            .by_type
            .iter()
            .find(|(name, _)| name == type_name)
            .map(|(_, object)| object)?;
        resolve_path(object, path).map(coerce_list)
    }

    /// Shorthand lookup: find the shallowest object containing the first
    /// path step, then resolve the full path against it.
    pub fn shorthand(&self, path: &str) -> Option<Value> {
        let first = first_step(path);
        if first.is_empty() {
            return None;
        }
        let mut queue: VecDeque<&Value> = self.roots.iter().collect();
        while let Some(value) = queue.pop_front() {
            match value {
                Value::Object(map) => {
                    if map.contains_key(first) {
                        if let Some(found) = resolve_path(value, path) {
                            return Some(coerce_list(found));
                        }
                    }
                    queue.extend(map.values());
                }
                Value::Array(items) => queue.extend(items.iter()),
                _ => {}
            }
        }
        None
    }
}

/// Register every object carrying `@type`, depth-first in document order.
fn register(value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            if let Some(type_value) = map.get("@type") {
                for name in type_names(type_value) {
                    out.push((name, value.clone()));
                }
            }
            for child in map.values() {
                register(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                register(item, out);
            }
        }
        _ => {}
    }
}

fn type_names(type_value: &Value) -> Vec<String> {
    match type_value {
        Value::String(s) => vec![s.trim_start_matches('@').to_string()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim_start_matches('@').to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn first_step(path: &str) -> &str {
    let end = path.find(['.', '[']).unwrap_or(path.len());
    &path[..end]
}

/// Split a scalar string that reads as a Markdown-ish list into an array
/// of item texts.
fn coerce_list(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    if !LIST_ITEM.is_match(text) {
        return value;
    }
    let items: Vec<Value> = text
        .lines()
        .filter_map(|line| {
            let stripped = LIST_ITEM.replace(line, "");
            let stripped = stripped.trim();
            (!stripped.is_empty()).then(|| Value::String(stripped.to_string()))
        })
        .collect();
    Value::Array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> SchemaIndex {
        SchemaIndex::build(&[
            json!({
                "@context": "https://schema.org",
                "@type": "Recipe",
                "name": "Bread",
                "ingredients": [{"name": "flour"}, {"name": "water"}],
                "author": {"@type": "Person", "name": "Jo"}
            }),
            json!({
                "@graph": [
                    {"@type": ["Article", "NewsArticle"], "headline": "Big News"}
                ]
            }),
        ])
    }

    #[test]
    fn test_typed_lookup() {
        assert_eq!(index().typed("Recipe", "name"), Some(json!("Bread")));
        assert_eq!(index().typed("Person", "name"), Some(json!("Jo")));
    }

    #[test]
    fn test_typed_multi_type_registration() {
        assert_eq!(index().typed("NewsArticle", "headline"), Some(json!("Big News")));
        assert_eq!(index().typed("Article", "headline"), Some(json!("Big News")));
    }

    #[test]
    fn test_typed_is_case_sensitive() {
        assert_eq!(index().typed("recipe", "name"), None);
    }

    #[test]
    fn test_typed_with_splat() {
        assert_eq!(
            index().typed("Recipe", "ingredients[*].name"),
            Some(json!(["flour", "water"]))
        );
    }

    #[test]
    fn test_shorthand_top_level() {
        assert_eq!(index().shorthand("headline"), Some(json!("Big News")));
    }

    #[test]
    fn test_shorthand_nested_path() {
        assert_eq!(index().shorthand("author.name"), Some(json!("Jo")));
    }

    #[test]
    fn test_shorthand_missing() {
        assert_eq!(index().shorthand("nope"), None);
        assert_eq!(index().shorthand(""), None);
    }

    #[test]
    fn test_list_coercion() {
        let idx = SchemaIndex::build(&[json!({
            "@type": "Recipe",
            "steps": "1. Mix\n2. Knead\n3. Bake"
        })]);
        assert_eq!(
            idx.typed("Recipe", "steps"),
            Some(json!(["Mix", "Knead", "Bake"]))
        );
    }

    #[test]
    fn test_bullet_list_coercion() {
        let idx = SchemaIndex::build(&[json!({
            "@type": "Thing",
            "notes": "- one\n* two"
        })]);
        assert_eq!(idx.typed("Thing", "notes"), Some(json!(["one", "two"])));
    }

    #[test]
    fn test_plain_string_not_coerced() {
        let idx = SchemaIndex::build(&[json!({"@type": "Thing", "name": "plain text"})]);
        assert_eq!(idx.typed("Thing", "name"), Some(json!("plain text")));
    }
}

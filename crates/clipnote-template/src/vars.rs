/*
 * vars.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The variable map: template names bound to canonical string values.
//!
//! Every binding is stored as a string; arrays and objects are
//! JSON-serialized on entry so loop bodies and path lookups see one
//! representation. Loop iterations clone the map, bind the iterator
//! name, and discard the clone at loop exit — outer bindings are never
//! mutated.

use rustc_hash::FxHashMap;
use serde_json::Value;

use clipnote_page::PageContext;

use crate::value::value_to_text;

/// Case-sensitive name → canonical string bindings.
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    entries: FxHashMap<String, String>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plain string binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Insert a JSON value, serializing arrays and objects.
    pub fn insert_value(&mut self, name: impl Into<String>, value: &Value) {
        let canonical = match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        };
        self.entries.insert(name.into(), canonical);
    }

    /// Look up a binding. Undefined names are simply absent; callers
    /// treat that as the empty string.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Build the preset bindings for a page, with `url` already
    /// normalized by the compiler.
    pub fn for_page(page: &PageContext, normalized_url: &str) -> Self {
        let mut vars = Self::new();
        vars.insert("url", normalized_url);
        vars.insert("title", &page.title);
        vars.insert("author", &page.author);
        vars.insert("description", &page.description);
        vars.insert("domain", &page.domain);
        vars.insert("favicon", &page.favicon);
        vars.insert("image", &page.image);
        vars.insert("published", &page.published);
        vars.insert("site", &page.site);
        vars.insert("words", page.words.to_string());
        vars.insert("content", &page.content);
        vars.insert("contentHtml", &page.content_html);
        vars.insert("selection", &page.selection);
        vars.insert("selectionHtml", &page.selection_html);
        vars.insert("fullHtml", &page.full_html);
        vars.insert("noteName", &page.note_name);
        vars.insert("date", &page.date);
        vars.insert("time", &page.time);
        vars.insert(
            "highlights",
            serde_json::to_string(&page.highlights).unwrap_or_else(|_| "[]".to_string()),
        );
        vars
    }
}

/// Canonicalize a JSON value for binding as an iterator variable.
pub fn canonical_string(value: &Value) -> String {
    value_to_text(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_value_serializes_structures() {
        let mut vars = VariableMap::new();
        vars.insert_value("tags", &json!(["a", "b"]));
        assert_eq!(vars.get("tags"), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_insert_value_keeps_strings_bare() {
        let mut vars = VariableMap::new();
        vars.insert_value("t", &json!("plain"));
        assert_eq!(vars.get("t"), Some("plain"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut vars = VariableMap::new();
        vars.insert("Title", "x");
        assert_eq!(vars.get("title"), None);
        assert_eq!(vars.get("Title"), Some("x"));
    }

    #[test]
    fn test_clone_isolation() {
        let mut outer = VariableMap::new();
        outer.insert("a", "1");
        let mut inner = outer.clone();
        inner.insert("a", "2");
        inner.insert("b", "3");
        assert_eq!(outer.get("a"), Some("1"));
        assert!(!outer.contains("b"));
    }

    #[test]
    fn test_for_page_presets() {
        let page = PageContext::builder()
            .url("https://example.com/a")
            .title("T")
            .timestamp(0)
            .build();
        let vars = VariableMap::for_page(&page, "https://example.com/a");
        assert_eq!(vars.get("title"), Some("T"));
        assert_eq!(vars.get("url"), Some("https://example.com/a"));
        assert_eq!(vars.get("highlights"), Some("[]"));
        assert_eq!(vars.get("date"), Some("1970-01-01"));
    }
}

/*
 * prompt.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The prompt sentinel protocol.
//!
//! Prompt expressions cannot be resolved during the synchronous render —
//! an external interpreter answers them later. The variable pass emits
//! an opaque sentinel per prompt and records the prompt text together
//! with its filter tail; [`resolve_answers`] performs the late pass once
//! answers exist.
//!
//! The sentinel brackets use U+001A (SUBSTITUTE). A control character
//! cannot survive HTML text extraction, so the marker cannot collide
//! with legitimate page content, and the sequential id keeps renders
//! deterministic and cacheable.

use crate::filters::{self, FilterContext};
use crate::value::Carry;

const MARK: char = '\u{1a}';

/// One prompt awaiting an external answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub id: usize,
    pub prompt: String,
    /// Filter tail recorded for the late pass.
    pub filters: Vec<String>,
}

/// Prompt collector for one render.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    requests: Vec<PromptRequest>,
}

impl Prompts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prompt and return the sentinel to splice into the
    /// rendered text.
    pub fn register(&mut self, prompt: String, filters: Vec<String>) -> String {
        let id = self.requests.len();
        self.requests.push(PromptRequest {
            id,
            prompt,
            filters,
        });
        self.sentinel_for(id)
    }

    pub fn sentinel_for(&self, id: usize) -> String {
        sentinel(id)
    }

    pub fn requests(&self) -> &[PromptRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn into_requests(self) -> Vec<PromptRequest> {
        self.requests
    }
}

fn sentinel(id: usize) -> String {
    format!("{MARK}PROMPT:{id}{MARK}")
}

/// Replace each sentinel with its filter-chain-applied answer.
///
/// `answers` pairs positionally with the recorded requests; missing
/// answers (interpreter cancellation or timeout) resolve to the empty
/// string. Answers that parse as JSON enter their filter chains as
/// structured values.
pub fn resolve_answers(
    text: &str,
    requests: &[PromptRequest],
    answers: &[String],
    context_url: &str,
) -> String {
    let mut out = text.to_string();
    let ctx = FilterContext { url: context_url };
    for request in requests {
        let answer = answers.get(request.id).map(String::as_str).unwrap_or("");
        let resolved = if answer.is_empty() {
            String::new()
        } else {
            let carry = Carry::str(answer).upgraded();
            filters::apply_chain(carry, request.filters.iter().map(String::as_str), &ctx)
                .into_output()
        };
        out = out.replace(&sentinel(request.id), &resolved);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_sentinel() {
        let mut prompts = Prompts::new();
        let s0 = prompts.register("first".to_string(), vec![]);
        let s1 = prompts.register("second".to_string(), vec!["upper".to_string()]);
        assert_ne!(s0, s1);
        assert!(s0.contains("PROMPT:0"));
        assert_eq!(prompts.requests().len(), 2);
    }

    #[test]
    fn test_sentinel_contains_control_chars() {
        let mut prompts = Prompts::new();
        let s = prompts.register("p".to_string(), vec![]);
        assert!(s.starts_with('\u{1a}'));
        assert!(s.ends_with('\u{1a}'));
    }

    #[test]
    fn test_resolve_answers() {
        let mut prompts = Prompts::new();
        let text = format!(
            "A: {} B: {}",
            prompts.register("a".to_string(), vec!["upper".to_string()]),
            prompts.register("b".to_string(), vec![])
        );
        let requests = prompts.into_requests();
        let out = resolve_answers(
            &text,
            &requests,
            &["hello".to_string(), "world".to_string()],
            "",
        );
        assert_eq!(out, "A: HELLO B: world");
    }

    #[test]
    fn test_missing_answers_resolve_empty() {
        let mut prompts = Prompts::new();
        let text = prompts.register("a".to_string(), vec![]);
        let requests = prompts.into_requests();
        assert_eq!(resolve_answers(&text, &requests, &[], ""), "");
    }

    #[test]
    fn test_json_answer_feeds_filters() {
        let mut prompts = Prompts::new();
        let text = prompts.register(
            "list things".to_string(),
            vec!["join:\" + \"".to_string()],
        );
        let requests = prompts.into_requests();
        let out = resolve_answers(&text, &requests, &[r#"["a","b"]"#.to_string()], "");
        assert_eq!(out, "a + b");
    }
}

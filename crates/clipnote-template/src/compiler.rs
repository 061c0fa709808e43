/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The compiler entry point: URL normalization, memoization, and the
//! two render passes.
//!
//! Pass one expands logic blocks; pass two resolves every remaining
//! mustache through the dispatcher and filter pipeline. Prompt
//! expressions come back as sentinels plus a prompt table; the late
//! pass ([`RenderOutput::resolve_prompts`]) splices interpreter answers
//! in once they exist.
//!
//! Rendering is total and deterministic for a given template and page.
//! A bounded LRU cache keyed by `(template, page fingerprint)`
//! short-circuits identical re-renders; DOM handles are never retained
//! in the cache.

use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use hashlink::LruCache;
use rustc_hash::FxHasher;

use clipnote_page::{DomHandle, PageContext, strip_text_fragment};

use crate::dispatch::{RenderEnv, resolve_expression};
use crate::expand::expand_logic;
use crate::prompt::{PromptRequest, Prompts, resolve_answers};
use crate::schema::SchemaIndex;
use crate::vars::VariableMap;

const CACHE_CAPACITY: usize = 64;

/// The rendered text plus the prompt table for the late pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// Rendered text, with one sentinel per prompt expression.
    pub text: String,

    /// Prompts awaiting the external interpreter, in document order.
    pub prompts: Vec<PromptRequest>,

    /// The normalized context URL (kept for the late pass, where prompt
    /// filter chains may need it).
    pub context_url: String,
}

impl RenderOutput {
    /// Replace prompt sentinels with filter-chain-applied answers.
    ///
    /// `answers` pairs positionally with [`RenderOutput::prompts`];
    /// missing answers (cancellation, timeout) resolve to empty.
    pub fn resolve_prompts(&self, answers: &[String]) -> String {
        if self.prompts.is_empty() {
            return self.text.clone();
        }
        resolve_answers(&self.text, &self.prompts, answers, &self.context_url)
    }
}

/// The template compiler.
///
/// Holds only the render cache; everything else is borrowed per call.
#[derive(Debug)]
pub struct Compiler {
    cache: Mutex<LruCache<(String, u64), RenderOutput>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(LruCache::new(CACHE_CAPACITY)),
        }
    }

    /// Render `template` against a page and its DOM.
    ///
    /// Never fails: missing values become empty strings, malformed
    /// constructs degrade, and every `{{…}}`/`{% … %}` is consumed.
    pub fn render(
        &self,
        template: &str,
        page: &PageContext,
        dom: &dyn DomHandle,
    ) -> RenderOutput {
        let url = strip_text_fragment(&page.url);
        let fingerprint = fingerprint(page, &url);
        let key = (template.to_string(), fingerprint);

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                tracing::trace!(fingerprint, "render cache hit");
                return hit.clone();
            }
        }

        let output = render_uncached(template, page, dom, &url);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, output.clone());
        }
        output
    }
}

/// One-shot render without a shared cache.
pub fn render(template: &str, page: &PageContext, dom: &dyn DomHandle) -> RenderOutput {
    let url = strip_text_fragment(&page.url);
    render_uncached(template, page, dom, &url)
}

fn render_uncached(
    template: &str,
    page: &PageContext,
    dom: &dyn DomHandle,
    url: &str,
) -> RenderOutput {
    let schema = SchemaIndex::build(&page.schema_org);
    let env = RenderEnv {
        page,
        schema: &schema,
        dom,
        url,
    };
    let vars = VariableMap::for_page(page, url);
    let mut prompts = Prompts::new();

    let expanded = expand_logic(template, &vars, &env, &mut prompts);
    let text = resolve_mustaches(&expanded, &vars, &env, &mut prompts);

    RenderOutput {
        text,
        prompts: prompts.into_requests(),
        context_url: url.to_string(),
    }
}

/// The variable pass: resolve every `{{…}}` left after logic expansion,
/// in document order.
fn resolve_mustaches(
    template: &str,
    vars: &VariableMap,
    env: &RenderEnv<'_>,
    prompts: &mut Prompts,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..open]);
        let expr = rest[open + 2..open + 2 + close].trim();
        out.push_str(&resolve_expression(expr, vars, env, prompts).into_output());
        rest = &rest[open + 2 + close + 2..];
    }
    out.push_str(rest);
    out
}

/// Stable digest of the normalized URL plus the page snapshot.
fn fingerprint(page: &PageContext, url: &str) -> u64 {
    let mut hasher = FxHasher::default();
    url.hash(&mut hasher);
    match serde_json::to_string(page) {
        Ok(snapshot) => snapshot.hash(&mut hasher),
        Err(_) => page.title.hash(&mut hasher),
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipnote_page::{HtmlDom, NullDom};

    fn page() -> PageContext {
        PageContext::builder()
            .url("https://x.test/a#:~:text=hello")
            .title("Hello")
            .timestamp(0)
            .build()
    }

    #[test]
    fn test_literal_template_is_identity() {
        let out = render("plain text, no constructs", &page(), &NullDom);
        assert_eq!(out.text, "plain text, no constructs");
        assert!(out.prompts.is_empty());
    }

    #[test]
    fn test_variable_with_filter() {
        let out = render("{{title|upper}}", &page(), &NullDom);
        assert_eq!(out.text, "HELLO");
    }

    #[test]
    fn test_url_normalized_once() {
        let out = render("{{url}}", &page(), &NullDom);
        assert_eq!(out.text, "https://x.test/a");
    }

    #[test]
    fn test_missing_variable_is_empty() {
        let out = render("[{{nope}}]", &page(), &NullDom);
        assert_eq!(out.text, "[]");
    }

    #[test]
    fn test_no_constructs_left() {
        let templates = [
            "{{title}} {% for t in tags %}{{t}}{% endfor %} {{missing}}",
            "{% for a in b %}{% endfor %}",
            "{{unclosed",
        ];
        for template in templates {
            let out = render(template, &page(), &NullDom);
            assert!(!out.text.contains("{%"), "template: {template}");
            assert!(!out.text.contains("%}"), "template: {template}");
        }
    }

    #[test]
    fn test_prompt_table() {
        let out = render(r#"{{"summarize"|blockquote}}"#, &page(), &NullDom);
        assert_eq!(out.prompts.len(), 1);
        assert_eq!(out.prompts[0].prompt, "summarize");
        assert!(out.text.contains('\u{1a}'));

        let resolved = out.resolve_prompts(&["two lines\nhere".to_string()]);
        assert_eq!(resolved, "> two lines\n> here");
    }

    #[test]
    fn test_prompt_cancelled_resolves_empty() {
        let out = render(r#"A{{"q"}}B"#, &page(), &NullDom);
        assert_eq!(out.resolve_prompts(&[]), "AB");
    }

    #[test]
    fn test_cache_hit_returns_same_output() {
        let compiler = Compiler::new();
        let page = page();
        let first = compiler.render("{{title}} {{date}}", &page, &NullDom);
        let second = compiler.render("{{title}} {{date}}", &page, &NullDom);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_distinguishes_pages() {
        let compiler = Compiler::new();
        let a = page();
        let b = PageContext::builder()
            .url("https://x.test/a")
            .title("Other")
            .timestamp(0)
            .build();
        assert_eq!(compiler.render("{{title}}", &a, &NullDom).text, "Hello");
        assert_eq!(compiler.render("{{title}}", &b, &NullDom).text, "Other");
    }

    #[test]
    fn test_selector_end_to_end() {
        let dom = HtmlDom::parse(
            r#"<span class="tag">A</span><span class="tag">B</span><span class="tag">A</span>"#,
        );
        let out = render(r#"{{selector:.tag|unique|join:"-"}}"#, &page(), &dom);
        assert_eq!(out.text, "A-B");
    }
}

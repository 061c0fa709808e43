//! The immutable page snapshot that templates render against.
//!
//! A `PageContext` is assembled once by the extraction layer (outside
//! this workspace) and handed to the template engine read-only. Derived
//! fields — Markdown content, the default note name, clip date and time —
//! are computed once at construction so rendering stays deterministic.

use serde::{Deserialize, Serialize};

use crate::datetime::DateTime;
use crate::html;

/// Which attribute a `<meta>` entry was keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaAttr {
    /// `<meta name="…" content="…">`
    Name,
    /// `<meta property="…" content="…">`
    Property,
}

/// One `<meta>` element from the page head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub attr: MetaAttr,
    pub value: String,
    pub content: String,
}

/// A user highlight captured on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub text: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<String>>,
}

/// Everything the engine knows about one clipped page.
///
/// Construct through [`PageContext::builder`]. The record is immutable
/// after `build()`; the live DOM is deliberately not part of it and is
/// borrowed separately per render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub domain: String,
    pub favicon: String,
    pub image: String,
    pub published: String,
    pub site: String,
    pub words: u64,
    pub content_html: String,
    pub selection_html: String,
    pub full_html: String,
    pub highlights: Vec<Highlight>,
    pub meta: Vec<MetaEntry>,
    /// Parsed JSON-LD payloads, in document order.
    pub schema_org: Vec<serde_json::Value>,

    // Derived at construction.
    pub content: String,
    pub selection: String,
    pub note_name: String,
    pub date: String,
    pub time: String,
}

impl PageContext {
    pub fn builder() -> PageContextBuilder {
        PageContextBuilder::default()
    }

    /// Look up a `<meta>` entry's content by attribute kind and value.
    pub fn meta_content(&self, attr: MetaAttr, value: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|entry| entry.attr == attr && entry.value == value)
            .map(|entry| entry.content.as_str())
    }
}

/// Builder for [`PageContext`].
#[derive(Debug, Clone, Default)]
pub struct PageContextBuilder {
    url: String,
    title: String,
    author: String,
    description: String,
    domain: String,
    favicon: String,
    image: String,
    published: String,
    site: String,
    words: u64,
    content_html: String,
    selection_html: String,
    full_html: String,
    highlights: Vec<Highlight>,
    meta: Vec<MetaEntry>,
    schema_org: Vec<serde_json::Value>,
    timestamp: Option<i64>,
}

impl PageContextBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        if self.domain.is_empty() {
            if let Ok(parsed) = url::Url::parse(&self.url) {
                self.domain = parsed.host_str().unwrap_or("").to_string();
            }
        }
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn favicon(mut self, favicon: impl Into<String>) -> Self {
        self.favicon = favicon.into();
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn words(mut self, words: u64) -> Self {
        self.words = words;
        self
    }

    pub fn content_html(mut self, html: impl Into<String>) -> Self {
        self.content_html = html.into();
        self
    }

    pub fn selection_html(mut self, html: impl Into<String>) -> Self {
        self.selection_html = html.into();
        self
    }

    pub fn full_html(mut self, html: impl Into<String>) -> Self {
        self.full_html = html.into();
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlights.push(highlight);
        self
    }

    pub fn highlights(mut self, highlights: Vec<Highlight>) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn meta_entry(mut self, attr: MetaAttr, value: impl Into<String>, content: impl Into<String>) -> Self {
        self.meta.push(MetaEntry {
            attr,
            value: value.into(),
            content: content.into(),
        });
        self
    }

    /// Add a raw JSON-LD payload. Unparsable payloads are dropped.
    pub fn add_json_ld(mut self, payload: &str) -> Self {
        match serde_json::from_str(payload) {
            Ok(value) => self.schema_org.push(value),
            Err(error) => {
                tracing::debug!(%error, "ignoring unparsable JSON-LD payload");
            }
        }
        self
    }

    /// Fix the clip timestamp (seconds since the unix epoch). Defaults to
    /// the system clock at `build()`.
    pub fn timestamp(mut self, unix_secs: i64) -> Self {
        self.timestamp = Some(unix_secs);
        self
    }

    pub fn build(self) -> PageContext {
        let now = self.timestamp.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0)
        });
        let now = DateTime::from_unix(now);
        let base = if self.url.is_empty() {
            None
        } else {
            Some(self.url.as_str())
        };
        let content = html::to_markdown(&self.content_html, base);
        let selection = html::to_markdown(&self.selection_html, base);
        let note_name = default_note_name(&self.title);

        PageContext {
            url: self.url,
            title: self.title,
            author: self.author,
            description: self.description,
            domain: self.domain,
            favicon: self.favicon,
            image: self.image,
            published: self.published,
            site: self.site,
            words: self.words,
            content_html: self.content_html,
            selection_html: self.selection_html,
            full_html: self.full_html,
            highlights: self.highlights,
            meta: self.meta,
            schema_org: self.schema_org,
            content,
            selection,
            note_name,
            date: now.date_string(),
            time: now.time_string(),
        }
    }
}

/// Default note name: the title made safe for any filesystem.
fn default_note_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PageContext {
        PageContext::builder()
            .url("https://example.com/post#:~:text=x")
            .title("A Title: With / Illegal * Chars")
            .content_html("<h1>Hi</h1><p>Body</p>")
            .meta_entry(MetaAttr::Name, "author", "Jo Doe")
            .meta_entry(MetaAttr::Property, "og:site_name", "Example")
            .add_json_ld(r#"{"@type": "Article", "headline": "Hi"}"#)
            .add_json_ld("{not json")
            .timestamp(1_718_461_845)
            .build()
    }

    #[test]
    fn test_derived_content_markdown() {
        let ctx = context();
        assert_eq!(ctx.content, "# Hi\n\nBody");
    }

    #[test]
    fn test_derived_note_name() {
        let ctx = context();
        assert_eq!(ctx.note_name, "A Title With Illegal Chars");
    }

    #[test]
    fn test_derived_date_time() {
        let ctx = context();
        assert_eq!(ctx.date, "2024-06-15");
        assert_eq!(ctx.time, "14:30:45");
    }

    #[test]
    fn test_domain_from_url() {
        let ctx = context();
        assert_eq!(ctx.domain, "example.com");
    }

    #[test]
    fn test_bad_json_ld_dropped() {
        let ctx = context();
        assert_eq!(ctx.schema_org.len(), 1);
    }

    #[test]
    fn test_meta_lookup() {
        let ctx = context();
        assert_eq!(ctx.meta_content(MetaAttr::Name, "author"), Some("Jo Doe"));
        assert_eq!(
            ctx.meta_content(MetaAttr::Property, "og:site_name"),
            Some("Example")
        );
        assert_eq!(ctx.meta_content(MetaAttr::Name, "og:site_name"), None);
    }

    #[test]
    fn test_empty_builder_builds() {
        let ctx = PageContext::builder().timestamp(0).build();
        assert_eq!(ctx.title, "");
        assert_eq!(ctx.date, "1970-01-01");
    }
}

/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template compilation and rendering engine for clipnote.
//!
//! Given a user-authored template string and a [`PageContext`] snapshot
//! (plus a borrowed DOM handle), the engine produces the text that goes
//! into a note body, filename, frontmatter value, or folder path. It
//! supports:
//!
//! - Mustache expressions: `{{title}}`, `{{book.authors[0]}}`
//! - Typed providers: `{{selector:.headline}}`, `{{schema:@Recipe:name}}`,
//!   `{{meta:property:og:image}}`, `{{"prompt text"}}`
//! - Filter chains: `{{title|upper|safe_name}}`
//! - Logic blocks: `{% for t in tags %}…{% endfor %}`
//! - A restricted `map`/`template` mini-expression language
//!
//! Rendering is total: every input yields a string, missing values
//! become empty, and malformed constructs degrade instead of failing.
//! Prompt expressions are late-bound through an opaque sentinel and
//! resolved by [`RenderOutput::resolve_prompts`] once the external
//! interpreter has answered.
//!
//! # Example
//!
//! ```ignore
//! use clipnote_page::{HtmlDom, PageContext};
//! use clipnote_template::Compiler;
//!
//! let page = PageContext::builder()
//!     .url("https://example.com/post")
//!     .title("Hello")
//!     .build();
//! let dom = HtmlDom::parse("<h1 class=\"t\">Hello</h1>");
//!
//! let compiler = Compiler::new();
//! let out = compiler.render("# {{title|upper}}", &page, &dom);
//! assert_eq!(out.text, "# HELLO");
//! ```

pub mod compiler;
pub mod dispatch;
pub mod error;
pub mod expand;
pub mod expr;
pub mod filters;
pub mod path;
pub mod prompt;
pub mod schema;
pub mod selector;
pub mod value;
pub mod vars;

// Re-export main types at crate root
pub use compiler::{Compiler, RenderOutput, render};
pub use error::{TemplateError, TemplateResult};
pub use prompt::PromptRequest;
pub use schema::SchemaIndex;
pub use value::Carry;
pub use vars::VariableMap;

// The page-side types most callers need alongside the engine.
pub use clipnote_page::{DomHandle, HtmlDom, NullDom, PageContext};

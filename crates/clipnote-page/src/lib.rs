//! Page-side data model for clipnote.
//!
//! This crate owns everything the template engine needs to know about a
//! clipped page while staying independent of how the engine renders it:
//!
//! - [`PageContext`] — the immutable per-page snapshot with derived
//!   fields computed once at construction.
//! - [`DomHandle`] / [`HtmlDom`] — read-only CSS-selector access to the
//!   live document, returning detached [`DomNode`] snapshots.
//! - [`html`] — a lenient HTML tree (parser, serializer, JSON projection,
//!   Markdown conversion) shared by the DOM and the HTML filters.
//! - [`datetime`] — civil UTC datetime arithmetic without a timezone
//!   stack.
//! - [`strip_text_fragment`] — `#:~:text=` anchor normalization.

pub mod context;
pub mod datetime;
pub mod dom;
pub mod html;
pub mod url;

pub use context::{Highlight, MetaAttr, MetaEntry, PageContext, PageContextBuilder};
pub use dom::{DomHandle, DomNode, HtmlDom, NullDom};
pub use url::strip_text_fragment;

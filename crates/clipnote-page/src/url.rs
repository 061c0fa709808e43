//! URL normalization for clipped pages.
//!
//! Browsers append text-fragment directives (`#:~:text=…`) to URLs when
//! the user arrives via a highlight link. Those anchors are noise for
//! note-keeping and are stripped before rendering.

use url::Url;

/// Strip a text-fragment directive from `raw`.
///
/// The directive delimiter is `:~:` inside the fragment. Everything from
/// the delimiter to the end of the fragment is removed; if the directive
/// was the entire fragment, the `#` is removed too. Stripping is
/// idempotent.
pub fn strip_text_fragment(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            let Some(fragment) = url.fragment() else {
                return url.to_string();
            };
            let Some(pos) = fragment.find(":~:") else {
                return url.to_string();
            };
            let kept = fragment[..pos].to_string();
            if kept.is_empty() {
                url.set_fragment(None);
            } else {
                url.set_fragment(Some(&kept));
            }
            url.to_string()
        }
        // Not an absolute URL; fall back to plain string surgery.
        Err(_) => match raw.find('#') {
            Some(hash) => match raw[hash..].find(":~:") {
                Some(rel) => {
                    let cut = hash + rel;
                    let kept = &raw[..cut];
                    kept.strip_suffix('#').unwrap_or(kept).to_string()
                }
                None => raw.to_string(),
            },
            None => raw.to_string(),
        },
    }
}

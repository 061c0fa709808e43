/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The filter registry and pipeline runner.
//!
//! A filter chain is a left-associative sequence of `name:args` stages.
//! Before each stage the carry is upgraded (a string holding a JSON array
//! or object becomes structured); after the last stage the caller
//! flattens the carry back to text.
//!
//! Every filter is pure and total: on a type mismatch it returns its
//! input unchanged, an unparsable argument list skips the stage, and an
//! unknown name skips the stage. Filter names are a closed set — part of
//! the public surface.

pub mod args;
mod array;
mod case;
mod date;
mod html;
mod map;
mod markdown;
mod numeric;
mod replace;

use crate::value::Carry;

pub use args::{Arg, ArgItem, FilterArgs};

/// Ambient inputs available to every filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterContext<'a> {
    /// The page URL, already normalized. Used by `markdown` for relative
    /// links and by `fragment_link` for highlight anchors.
    pub url: &'a str,
}

/// Apply a full chain of `name:args` stages, left to right.
pub fn apply_chain<'a, I>(carry: Carry, specs: I, ctx: &FilterContext) -> Carry
where
    I: IntoIterator<Item = &'a str>,
{
    let mut carry = carry;
    for spec in specs {
        carry = apply_one(carry.upgraded(), spec, ctx);
    }
    carry
}

/// Apply one `name:args` stage.
pub fn apply_one(carry: Carry, spec: &str, ctx: &FilterContext) -> Carry {
    let spec = spec.trim();
    if spec.is_empty() {
        return carry;
    }
    let (name, raw) = match spec.find(':') {
        Some(pos) => (spec[..pos].trim(), &spec[pos + 1..]),
        None => (spec, ""),
    };

    // These parse their argument text themselves.
    match name {
        "map" => return map::map(carry, raw),
        "template" => return map::template(carry, raw),
        "calc" => return numeric::calc(carry, raw),
        _ => {}
    }

    let parsed = match args::parse_args(raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            tracing::debug!(filter = name, %error, "skipping filter with bad arguments");
            return carry;
        }
    };

    dispatch(name, carry, &parsed, ctx)
}

fn dispatch(name: &str, carry: Carry, args: &FilterArgs, ctx: &FilterContext) -> Carry {
    match name {
        // Date and time.
        "date" => date::date(carry, args),
        "date_modify" => date::date_modify(carry, args),
        "duration" => date::duration(carry, args),

        // Case and trim.
        "camel" => case::camel(carry),
        "capitalize" => case::capitalize(carry),
        "kebab" => case::kebab(carry),
        "lower" => case::lower(carry),
        "pascal" => case::pascal(carry),
        "snake" => case::snake(carry),
        "title" => case::title(carry),
        "upper" => case::upper(carry),
        "uncamel" => case::uncamel(carry),
        "trim" => case::trim(carry),

        // Replacement and sanitizing.
        "replace" => replace::replace(carry, args),
        "safe_name" => replace::safe_name(carry, args),
        "strip_md" => replace::strip_md(carry),

        // Markdown builders.
        "blockquote" => markdown::blockquote(carry),
        "callout" => markdown::callout(carry, args),
        "list" => markdown::list(carry, args),
        "table" => markdown::table(carry, args),
        "link" => markdown::link(carry, args),
        "wikilink" => markdown::wikilink(carry, args),
        "image" => markdown::image(carry, args),
        "footnote" => markdown::footnote(carry),
        "fragment_link" => markdown::fragment_link(carry, ctx),

        // HTML transforms.
        "markdown" => html::markdown(carry, ctx),
        "strip_tags" => html::strip_tags(carry, args),
        "remove_tags" => html::remove_tags(carry, args),
        "replace_tags" => html::replace_tags(carry, args),
        "strip_attr" => html::strip_attr(carry, args),
        "remove_attr" => html::remove_attr(carry, args),
        "remove_html" => html::remove_html(carry, args),
        "html_to_json" => html::html_to_json(carry),

        // Arrays and objects.
        "first" => array::first(carry),
        "last" => array::last(carry),
        "nth" => array::nth(carry, args),
        "reverse" => array::reverse(carry),
        "slice" => array::slice(carry, args),
        "split" => array::split(carry, args),
        "join" => array::join(carry, args),
        "unique" => array::unique(carry),
        "merge" => array::merge(carry, args),
        "object" => array::object(carry, args),
        "length" => array::length(carry),

        // Numbers.
        "round" => numeric::round(carry, args),
        "number_format" => numeric::number_format(carry, args),

        other => {
            tracing::debug!(filter = other, "unknown filter, passing value through");
            carry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> FilterContext<'static> {
        FilterContext { url: "" }
    }

    #[test]
    fn test_chain_left_to_right() {
        let out = apply_chain(Carry::str("a,b,a"), ["split:\",\"", "unique", "join:\"-\""], &ctx());
        assert_eq!(out.into_output(), "a-b");
    }

    #[test]
    fn test_unknown_filter_passthrough() {
        let out = apply_one(Carry::str("x"), "definitely_not_a_filter", &ctx());
        assert_eq!(out, Carry::str("x"));
    }

    #[test]
    fn test_bad_args_skip_stage() {
        let out = apply_one(Carry::str("x"), "join:\"unterminated", &ctx());
        assert_eq!(out, Carry::str("x"));
    }

    #[test]
    fn test_auto_upgrade_between_stages() {
        // `split` emits an array; the next stage sees structure.
        let out = apply_chain(Carry::str(r#"["b","a"]"#), ["reverse", "join:\"\""], &ctx());
        assert_eq!(out.into_output(), "ab");
    }

    #[test]
    fn test_empty_spec_passthrough() {
        assert_eq!(apply_one(Carry::Json(json!([1])), "  ", &ctx()), Carry::Json(json!([1])));
    }
}

/*
 * replace.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Text replacement, filename sanitizing, and Markdown stripping.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filters::args::{Arg, FilterArgs};
use crate::value::Carry;

/// `replace:"a":"b"`, `replace:("a":"1","b":"2")`, or
/// `replace:/pat/flags:"repl"`. Pairs apply in order.
pub fn replace(carry: Carry, args: &FilterArgs) -> Carry {
    let input = match carry {
        Carry::Str(s) => s,
        other => return other,
    };

    let mut pairs: Vec<(&Arg, &Arg)> = args.pairs();
    let values = args.values();
    let fallback;
    if pairs.is_empty() && values.len() >= 2 {
        fallback = (values[0], values[1]);
        pairs.push((fallback.0, fallback.1));
    }
    if pairs.is_empty() {
        return Carry::Str(input);
    }

    let mut out = input;
    for (search, replacement) in pairs {
        let replacement_text = replacement.text();
        out = match search {
            Arg::Regex { pattern, flags } => match build_regex(pattern, flags) {
                Some(re) => {
                    if flags.contains('g') {
                        re.replace_all(&out, replacement_text).into_owned()
                    } else {
                        re.replace(&out, replacement_text).into_owned()
                    }
                }
                None => {
                    tracing::debug!(%pattern, "skipping unparsable replace pattern");
                    out
                }
            },
            plain => out.replace(plain.text(), replacement_text),
        };
    }
    Carry::Str(out)
}

fn build_regex(pattern: &str, flags: &str) -> Option<Regex> {
    let mut prefix = String::new();
    for flag in flags.chars() {
        match flag {
            'i' => prefix.push_str("(?i)"),
            'm' => prefix.push_str("(?m)"),
            's' => prefix.push_str("(?s)"),
            _ => {}
        }
    }
    Regex::new(&format!("{prefix}{pattern}")).ok()
}

/// Characters illegal in filenames on each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Windows,
    Mac,
    Linux,
    All,
}

/// `safe_name` / `safe_name:windows|mac|linux` — make the value safe as
/// a filename: drop illegal characters, collapse whitespace runs, trim
/// leading and trailing dots and spaces.
pub fn safe_name(carry: Carry, args: &FilterArgs) -> Carry {
    let input = match carry {
        Carry::Str(s) => s,
        other => return other,
    };
    let target = match args.text(0).map(str::trim) {
        Some("windows") => Target::Windows,
        Some("mac") => Target::Mac,
        Some("linux") => Target::Linux,
        _ => Target::All,
    };

    let cleaned: String = input
        .chars()
        .filter(|&ch| !is_illegal(ch, target))
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    Carry::Str(
        collapsed
            .trim_matches(|c: char| c == '.' || c == ' ')
            .to_string(),
    )
}

fn is_illegal(ch: char, target: Target) -> bool {
    if ch.is_control() {
        return true;
    }
    match target {
        Target::Windows | Target::All => {
            matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
        }
        Target::Mac => matches!(ch, '/' | ':'),
        Target::Linux => ch == '/',
    }
}

static MD_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image pattern compiles"));
static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link pattern compiles"));
static MD_WIKILINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?:[^\]|]*\|)?([^\]]*)\]\]").expect("wikilink pattern compiles"));
static MD_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[^\n]*$").expect("fence pattern compiles"));
static MD_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("heading pattern compiles"));
static MD_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^>\s?").expect("quote pattern compiles"));
static MD_LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+\.)\s+").expect("list pattern compiles"));
static MD_STARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*{1,3}([^*]+)\*{1,3}").expect("star pattern compiles"));
static MD_UNDERSCORES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_{1,3}([^_]+)_{1,3}").expect("underscore pattern compiles"));
static MD_STRIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~~([^~]+)~~").expect("strike pattern compiles"));

/// Remove Markdown formatting, keeping the readable text.
pub fn strip_md(carry: Carry) -> Carry {
    let input = match carry {
        Carry::Str(s) => s,
        other => return other,
    };
    let mut out = input;
    out = MD_IMAGE.replace_all(&out, "$1").into_owned();
    out = MD_WIKILINK.replace_all(&out, "$1").into_owned();
    out = MD_LINK.replace_all(&out, "$1").into_owned();
    out = MD_CODE_FENCE.replace_all(&out, "").into_owned();
    out = MD_HEADING.replace_all(&out, "").into_owned();
    out = MD_QUOTE.replace_all(&out, "").into_owned();
    out = MD_LIST_MARKER.replace_all(&out, "").into_owned();
    out = MD_STARS.replace_all(&out, "$1").into_owned();
    out = MD_UNDERSCORES.replace_all(&out, "$1").into_owned();
    out = MD_STRIKE.replace_all(&out, "$1").into_owned();
    out = out.replace('`', "");
    Carry::Str(out)
}

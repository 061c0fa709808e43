/*
 * markdown.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Filters that build Markdown constructs: quotes, callouts, lists,
//! tables, links, footnotes, and highlight fragment links.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::filters::{FilterArgs, FilterContext};
use crate::value::{Carry, value_to_text};

/// Prefix every line with `> `.
pub fn blockquote(carry: Carry) -> Carry {
    let text = carry.into_output();
    let quoted = text
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    Carry::Str(quoted)
}

/// `callout:("kind", "Title", folded)` — wrap in an Obsidian callout.
/// `folded` true renders the collapsed marker.
pub fn callout(carry: Carry, args: &FilterArgs) -> Carry {
    let kind = args.text(0).filter(|s| !s.is_empty()).unwrap_or("note");
    let title = args.text(1).unwrap_or("");
    let fold = if args.boolean(2).unwrap_or(false) { "-" } else { "" };

    let mut out = format!("> [!{kind}]{fold}");
    if !title.is_empty() {
        out.push(' ');
        out.push_str(title);
    }
    for line in carry.into_output().lines() {
        out.push_str("\n> ");
        out.push_str(line);
    }
    Carry::Str(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Numbered,
    Task,
    NumberedTask,
}

/// `list` / `list:numbered` / `list:task` / `list:numbered-task`.
pub fn list(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(items) = carry.as_array() else {
        return carry;
    };
    let kind = match args.text(0).map(str::trim) {
        Some("numbered") => ListKind::Numbered,
        Some("task") => ListKind::Task,
        Some("numbered-task") => ListKind::NumberedTask,
        _ => ListKind::Bullet,
    };
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let text = value_to_text(item);
            match kind {
                ListKind::Bullet => format!("- {text}"),
                ListKind::Numbered => format!("{}. {text}", i + 1),
                ListKind::Task => format!("- [ ] {text}"),
                ListKind::NumberedTask => format!("{}. [ ] {text}", i + 1),
            }
        })
        .collect();
    Carry::Str(lines.join("\n"))
}

/// Build a Markdown table.
///
/// Array of objects infers the header from the keys; explicit headers
/// may be passed as arguments (`table:("Name","Price")`). Array of
/// arrays lays rows out positionally; a plain array becomes a single
/// `Value` column.
pub fn table(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(items) = carry.as_array() else {
        return carry;
    };
    if items.is_empty() {
        return Carry::str("");
    }

    let explicit: Vec<String> = args
        .values()
        .iter()
        .map(|arg| arg.text().to_string())
        .collect();

    let (headers, rows): (Vec<String>, Vec<Vec<String>>) = match &items[0] {
        Value::Object(_) => {
            let mut headers: Vec<String> = Vec::new();
            for item in &items {
                if let Value::Object(map) = item {
                    for key in map.keys() {
                        if !headers.contains(key) {
                            headers.push(key.clone());
                        }
                    }
                }
            }
            let rows = items
                .iter()
                .map(|item| {
                    headers
                        .iter()
                        .map(|h| match item {
                            Value::Object(map) => {
                                map.get(h).map(value_to_text).unwrap_or_default()
                            }
                            other => value_to_text(other),
                        })
                        .collect()
                })
                .collect();
            let headers = if explicit.is_empty() { headers } else { explicit };
            (headers, rows)
        }
        Value::Array(_) => {
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|item| match item {
                    Value::Array(cells) => cells.iter().map(value_to_text).collect(),
                    other => vec![value_to_text(other)],
                })
                .collect();
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let headers = if explicit.is_empty() {
                (1..=width).map(|i| format!("Column {i}")).collect()
            } else {
                explicit
            };
            (headers, rows)
        }
        _ => {
            let headers = if explicit.is_empty() {
                vec!["Value".to_string()]
            } else {
                explicit
            };
            let rows = items.iter().map(|item| vec![value_to_text(item)]).collect();
            (headers, rows)
        }
    };

    let width = headers.len().max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut out = String::new();
    write_row(&mut out, &headers, width);
    out.push('|');
    for _ in 0..width {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &rows {
        write_row(&mut out, row, width);
    }
    Carry::Str(out.trim_end().to_string())
}

fn write_row(out: &mut String, cells: &[String], width: usize) {
    out.push('|');
    for col in 0..width {
        let cell = cells
            .get(col)
            .map(|c| c.replace('|', "\\|").replace('\n', "<br>"))
            .unwrap_or_default();
        out.push(' ');
        out.push_str(&cell);
        out.push_str(" |");
    }
    out.push('\n');
}

/// `link` / `link:"text"` — produce `[text](url)` tokens. Arrays yield
/// one token per element; objects yield one per `key: url` pair.
pub fn link(carry: Carry, args: &FilterArgs) -> Carry {
    token_builder(carry, args, |url, text| format!("[{text}]({url})"))
}

/// `image` / `image:"alt"` — produce `![alt](url)` tokens.
pub fn image(carry: Carry, args: &FilterArgs) -> Carry {
    token_builder(carry, args, |url, text| {
        let alt = if text == url { "" } else { text };
        format!("![{alt}]({url})")
    })
}

/// `wikilink` / `wikilink:"alias"` — produce `[[target]]` or
/// `[[target|alias]]` tokens.
pub fn wikilink(carry: Carry, args: &FilterArgs) -> Carry {
    token_builder(carry, args, |target, text| {
        if text == target {
            format!("[[{target}]]")
        } else {
            format!("[[{target}|{text}]]")
        }
    })
}

/// Shared scalar/array/object shaping for the link-family filters.
fn token_builder(
    carry: Carry,
    args: &FilterArgs,
    build: impl Fn(&str, &str) -> String,
) -> Carry {
    let label = args.text(0).filter(|s| !s.is_empty());
    let token_for = |target: &Value| -> Value {
        let target = value_to_text(target);
        let text = label.unwrap_or(&target);
        Value::String(build(&target, text))
    };

    match carry.to_value() {
        Value::Array(items) => {
            Carry::Json(Value::Array(items.iter().map(token_for).collect()))
        }
        Value::Object(map) => Carry::Json(Value::Array(
            map.iter()
                .map(|(key, value)| {
                    let target = value_to_text(value);
                    Value::String(build(&target, key))
                })
                .collect(),
        )),
        Value::String(s) if s.is_empty() => Carry::str(""),
        scalar => Carry::Str(match &token_for(&scalar) {
            Value::String(s) => s.clone(),
            other => value_to_text(other),
        }),
    }
}

/// Footnote definitions: arrays get numeric ids, objects get slug ids.
pub fn footnote(carry: Carry) -> Carry {
    match carry.to_value() {
        Value::Array(items) => {
            let notes: Vec<String> = items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("[^{}]: {}", i + 1, value_to_text(item)))
                .collect();
            Carry::Str(notes.join("\n\n"))
        }
        Value::Object(map) => {
            let notes: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("[^{}]: {}", slug(key), value_to_text(value)))
                .collect();
            Carry::Str(notes.join("\n\n"))
        }
        _ => carry,
    }
}

fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut dash = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Turn highlight values into links that reopen the page at the
/// highlighted text, via a `#:~:text=` anchor on the context URL.
pub fn fragment_link(carry: Carry, ctx: &FilterContext) -> Carry {
    let link_for = |value: &Value| -> Value {
        let text = match value {
            Value::Object(map) => map.get("text").map(value_to_text).unwrap_or_default(),
            other => value_to_text(other),
        };
        let encoded = utf8_percent_encode(&text, NON_ALPHANUMERIC).to_string();
        Value::String(format!("[{}]({}#:~:text={})", text, ctx.url, encoded))
    };

    match carry.to_value() {
        Value::Array(items) => {
            Carry::Json(Value::Array(items.iter().map(link_for).collect()))
        }
        Value::String(s) if s.is_empty() => Carry::str(""),
        single => Carry::from_value(link_for(&single)),
    }
}

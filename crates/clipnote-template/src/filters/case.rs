/*
 * case.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Case and whitespace filters.

use crate::value::Carry;

/// Apply a string transform to a string carry; anything else passes
/// through unchanged.
fn on_string(carry: Carry, f: impl Fn(&str) -> String) -> Carry {
    match carry {
        Carry::Str(s) => Carry::Str(f(&s)),
        Carry::Json(serde_json::Value::String(s)) => Carry::Str(f(&s)),
        other => other,
    }
}

/// Split into words at non-alphanumeric runs and camel boundaries.
///
/// `"HTTPServer v2-beta"` → `["HTTP", "Server", "v2", "beta"]`.
fn words(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = input.chars().collect();
    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() && ch.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            // aB | 1B   or   ABc (acronym followed by a word)
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_lower) {
                out.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

pub fn camel(carry: Carry) -> Carry {
    on_string(carry, |s| {
        let mut parts = words(s).into_iter();
        let mut out = parts.next().map(|w| w.to_lowercase()).unwrap_or_default();
        for word in parts {
            out.push_str(&capitalize_word(&word));
        }
        out
    })
}

pub fn pascal(carry: Carry) -> Carry {
    on_string(carry, |s| {
        words(s).iter().map(|w| capitalize_word(w)).collect()
    })
}

pub fn kebab(carry: Carry) -> Carry {
    on_string(carry, |s| {
        words(s)
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    })
}

pub fn snake(carry: Carry) -> Carry {
    on_string(carry, |s| {
        words(s)
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_")
    })
}

pub fn lower(carry: Carry) -> Carry {
    on_string(carry, |s| s.to_lowercase())
}

pub fn upper(carry: Carry) -> Carry {
    on_string(carry, |s| s.to_uppercase())
}

pub fn capitalize(carry: Carry) -> Carry {
    on_string(carry, |s| {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            }
            None => String::new(),
        }
    })
}

pub fn title(carry: Carry) -> Carry {
    on_string(carry, |s| {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for ch in s.chars() {
            if ch.is_whitespace() {
                at_word_start = true;
                out.push(ch);
            } else if at_word_start {
                out.extend(ch.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        out
    })
}

/// `camelCase` → `camel case`.
pub fn uncamel(carry: Carry) -> Carry {
    on_string(carry, |s| {
        words(s)
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    })
}

pub fn trim(carry: Carry) -> Carry {
    on_string(carry, |s| s.trim().to_string())
}

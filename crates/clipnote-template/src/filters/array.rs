/*
 * array.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Array and object filters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::filters::FilterArgs;
use crate::value::{Carry, value_to_text};

pub fn first(carry: Carry) -> Carry {
    match carry.as_array() {
        Some(items) => match items.into_iter().next() {
            Some(item) => Carry::from_value(item),
            None => Carry::str(""),
        },
        None => carry,
    }
}

pub fn last(carry: Carry) -> Carry {
    match carry.as_array() {
        Some(items) => match items.into_iter().next_back() {
            Some(item) => Carry::from_value(item),
            None => Carry::str(""),
        },
        None => carry,
    }
}

static STEP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d*)n\s*(?:\+\s*(\d+))?$").expect("step pattern compiles"));

/// `nth:N` picks the Nth element (1-based; out of range → empty).
/// `nth:An+B` keeps every element whose 1-based index is `A·k+B`.
/// `nth:i,j,k:size` keeps offsets `i,j,k` within windows of `size`.
pub fn nth(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(items) = carry.as_array() else {
        return carry;
    };
    if args.is_empty() {
        return carry;
    }

    // Window form arrives as pairs: `1,3:4` → values [1], pair (3, 4).
    if let Some((last_offset, size)) = args.pairs().first() {
        let mut offsets: Vec<usize> = args
            .values()
            .iter()
            .filter_map(|arg| arg.text().trim().parse().ok())
            .collect();
        if let Ok(offset) = last_offset.text().trim().parse() {
            offsets.push(offset);
        }
        let Ok(size) = size.text().trim().parse::<usize>() else {
            return Carry::Json(Value::Array(items));
        };
        if size == 0 || offsets.is_empty() {
            return Carry::Json(Value::Array(items));
        }
        let picked: Vec<Value> = items
            .into_iter()
            .enumerate()
            .filter(|(i, _)| offsets.contains(&(i % size + 1)))
            .map(|(_, v)| v)
            .collect();
        return Carry::Json(Value::Array(picked));
    }

    let Some(pattern) = args.text(0).map(str::trim) else {
        return Carry::Json(Value::Array(items));
    };

    if let Some(caps) = STEP_PATTERN.captures(pattern) {
        let step: usize = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let offset: usize = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if step == 0 {
            return Carry::Json(Value::Array(items));
        }
        let picked: Vec<Value> = items
            .into_iter()
            .enumerate()
            .filter(|(i, _)| (i + 1) >= offset && (i + 1 - offset) % step == 0)
            .map(|(_, v)| v)
            .collect();
        return Carry::Json(Value::Array(picked));
    }

    match pattern.parse::<usize>() {
        Ok(0) => Carry::str(""),
        Ok(n) => match items.into_iter().nth(n - 1) {
            Some(item) => Carry::from_value(item),
            None => Carry::str(""),
        },
        Err(_) => Carry::Json(Value::Array(items)),
    }
}

pub fn reverse(carry: Carry) -> Carry {
    if let Some(mut items) = carry.as_array() {
        items.reverse();
        return Carry::Json(Value::Array(items));
    }
    match carry {
        Carry::Str(s) => Carry::Str(s.chars().rev().collect()),
        other => other,
    }
}

/// `slice:start` / `slice:(start,end)` with JavaScript half-open
/// semantics, negative indices counting from the end.
pub fn slice(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(start) = args.number(0) else {
        return carry;
    };
    let start = start as i64;
    let end = args.number(1).map(|n| n as i64);

    if let Some(items) = carry.as_array() {
        let (from, to) = bounds(items.len(), start, end);
        return Carry::Json(Value::Array(items[from..to].to_vec()));
    }
    match carry {
        Carry::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (from, to) = bounds(chars.len(), start, end);
            Carry::Str(chars[from..to].iter().collect())
        }
        other => other,
    }
}

fn bounds(len: usize, start: i64, end: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let clamp = |idx: i64| -> usize {
        let idx = if idx < 0 { len + idx } else { idx };
        idx.clamp(0, len) as usize
    };
    let from = clamp(start);
    let to = clamp(end.unwrap_or(len));
    (from, to.max(from))
}

/// `split:sep` — string to array. With no separator, splits into
/// characters.
pub fn split(carry: Carry, args: &FilterArgs) -> Carry {
    let input = match carry {
        Carry::Str(s) => s,
        other => return other,
    };
    let parts: Vec<Value> = match args.text(0) {
        Some(sep) if !sep.is_empty() => input
            .split(sep)
            .map(|part| Value::String(part.to_string()))
            .collect(),
        _ => input
            .chars()
            .map(|ch| Value::String(ch.to_string()))
            .collect(),
    };
    Carry::Json(Value::Array(parts))
}

/// `join` / `join:sep` — array to string, default separator `,`.
pub fn join(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(items) = carry.as_array() else {
        return carry;
    };
    let sep = args.text(0).unwrap_or(",");
    let joined = items
        .iter()
        .map(value_to_text)
        .collect::<Vec<_>>()
        .join(sep);
    Carry::Str(joined)
}

/// Structural deduplication, keeping first occurrences.
pub fn unique(carry: Carry) -> Carry {
    let Some(items) = carry.as_array() else {
        return carry;
    };
    let mut seen: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    Carry::Json(Value::Array(seen))
}

/// Append arguments to an array (each argument taken as JSON when it
/// parses, text otherwise), or fold `key:value` pairs into an object.
pub fn merge(carry: Carry, args: &FilterArgs) -> Carry {
    match carry.to_value() {
        Value::Array(mut items) => {
            for arg in args.values() {
                items.push(arg_to_value(arg.text()));
            }
            Carry::Json(Value::Array(items))
        }
        Value::Object(mut map) => {
            for (key, value) in args.pairs() {
                map.insert(key.text().to_string(), arg_to_value(value.text()));
            }
            Carry::Json(Value::Object(map))
        }
        _ => carry,
    }
}

fn arg_to_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// `object:keys` / `object:values` / `object:array` — project an object
/// into the requested shape.
pub fn object(carry: Carry, args: &FilterArgs) -> Carry {
    let Value::Object(map) = carry.to_value() else {
        return carry;
    };
    match args.text(0).map(str::trim) {
        Some("keys") => Carry::Json(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        Some("values") => Carry::Json(Value::Array(map.values().cloned().collect())),
        Some("array") | None => Carry::Json(Value::Array(
            map.into_iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k), v]))
                .collect(),
        )),
        Some(_) => carry,
    }
}

pub fn length(carry: Carry) -> Carry {
    let n = match carry.to_value() {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        Value::Null => 0,
        Value::Bool(_) | Value::Number(_) => return carry,
    };
    Carry::Str(n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::args::parse_args;
    use serde_json::json;

    fn arr(v: Value) -> Carry {
        Carry::Json(v)
    }

    fn run(filter: fn(Carry, &FilterArgs) -> Carry, carry: Carry, raw: &str) -> Carry {
        filter(carry, &parse_args(raw).unwrap())
    }

    #[test]
    fn test_first_last() {
        assert_eq!(first(arr(json!(["a", "b"]))), Carry::str("a"));
        assert_eq!(last(arr(json!(["a", "b"]))), Carry::str("b"));
        assert_eq!(first(arr(json!([]))), Carry::str(""));
        assert_eq!(last(arr(json!([]))), Carry::str(""));
    }

    #[test]
    fn test_nth_single() {
        assert_eq!(run(nth, arr(json!(["a", "b", "c"])), "2"), Carry::str("b"));
        assert_eq!(run(nth, arr(json!(["a"])), "5"), Carry::str(""));
    }

    #[test]
    fn test_nth_step() {
        let got = run(nth, arr(json!([1, 2, 3, 4, 5, 6])), "2n");
        assert_eq!(got, Carry::Json(json!([2, 4, 6])));
        let got = run(nth, arr(json!([1, 2, 3, 4, 5])), "2n+1");
        assert_eq!(got, Carry::Json(json!([1, 3, 5])));
    }

    #[test]
    fn test_nth_window() {
        // Offsets 1 and 2 inside every window of 4.
        let got = run(nth, arr(json!([1, 2, 3, 4, 5, 6, 7, 8])), "1,2:4");
        assert_eq!(got, Carry::Json(json!([1, 2, 5, 6])));
    }

    #[test]
    fn test_reverse() {
        assert_eq!(reverse(arr(json!([1, 2, 3]))), Carry::Json(json!([3, 2, 1])));
        assert_eq!(reverse(Carry::str("abc")), Carry::str("cba"));
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let v = arr(json!(["x", "y"]));
        assert_eq!(reverse(reverse(v.clone())), v);
    }

    #[test]
    fn test_slice_array() {
        assert_eq!(
            run(slice, arr(json!([1, 2, 3, 4])), "(1, 3)"),
            Carry::Json(json!([2, 3]))
        );
        assert_eq!(
            run(slice, arr(json!([1, 2, 3, 4])), "-2"),
            Carry::Json(json!([3, 4]))
        );
        assert_eq!(
            run(slice, arr(json!([1, 2])), "(0, -1)"),
            Carry::Json(json!([1]))
        );
    }

    #[test]
    fn test_slice_string() {
        assert_eq!(run(slice, Carry::str("hello"), "(1, 3)"), Carry::str("el"));
    }

    #[test]
    fn test_slice_no_args_passthrough() {
        let v = arr(json!([1]));
        assert_eq!(run(slice, v.clone(), ""), v);
    }

    #[test]
    fn test_split_and_join() {
        assert_eq!(
            run(split, Carry::str("a,b"), "\",\""),
            Carry::Json(json!(["a", "b"]))
        );
        assert_eq!(
            run(join, arr(json!(["a", "b"])), "\"-\""),
            Carry::str("a-b")
        );
        assert_eq!(run(join, arr(json!(["a", "b"])), ""), Carry::str("a,b"));
        assert_eq!(run(join, arr(json!([])), "\",\""), Carry::str(""));
    }

    #[test]
    fn test_split_chars() {
        assert_eq!(
            run(split, Carry::str("abc"), ""),
            Carry::Json(json!(["a", "b", "c"]))
        );
    }

    #[test]
    fn test_unique() {
        assert_eq!(
            unique(arr(json!(["A", "B", "A"]))),
            Carry::Json(json!(["A", "B"]))
        );
        // Structural equality on objects.
        assert_eq!(
            unique(arr(json!([{"a": 1}, {"a": 1}, {"a": 2}]))),
            Carry::Json(json!([{"a": 1}, {"a": 2}]))
        );
    }

    #[test]
    fn test_merge_array() {
        assert_eq!(
            run(merge, arr(json!([1])), "(\"x\", \"[2,3]\")"),
            Carry::Json(json!([1, "x", [2, 3]]))
        );
    }

    #[test]
    fn test_merge_object() {
        assert_eq!(
            run(merge, arr(json!({"a": 1})), "(\"b\":\"2\")"),
            Carry::Json(json!({"a": 1, "b": 2}))
        );
    }

    #[test]
    fn test_object_projections() {
        let o = arr(json!({"a": 1, "b": 2}));
        assert_eq!(
            run(object, o.clone(), "keys"),
            Carry::Json(json!(["a", "b"]))
        );
        assert_eq!(run(object, o.clone(), "values"), Carry::Json(json!([1, 2])));
        assert_eq!(
            run(object, o, "array"),
            Carry::Json(json!([["a", 1], ["b", 2]]))
        );
    }

    #[test]
    fn test_length() {
        assert_eq!(length(arr(json!([1, 2, 3]))), Carry::str("3"));
        assert_eq!(length(Carry::str("héllo")), Carry::str("5"));
        assert_eq!(length(arr(json!({"a": 1}))), Carry::str("1"));
    }
}

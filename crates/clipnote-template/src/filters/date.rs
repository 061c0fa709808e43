/*
 * date.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Date, interval, and duration filters.
//!
//! Formatting uses a day-token vocabulary (`YYYY`, `MM`, `DD`, `HH`,
//! `mm`, `ss`, `MMM`, `dddd`, …) with `[bracketed]` literals. Inputs are
//! ISO 8601 strings, unix timestamps, or — for `date` with two arguments
//! — any format the same vocabulary can describe.

use once_cell::sync::Lazy;
use regex::Regex;

use clipnote_page::datetime::DateTime;

use crate::filters::FilterArgs;
use crate::value::Carry;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

static INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-])\s*(\d+)\s*(year|month|week|day|hour|minute|second)s?\s*$")
        .expect("interval pattern compiles")
});

/// `date:"YYYY-MM-DD"` or `date:("OUT_FMT","IN_FMT")`.
pub fn date(carry: Carry, args: &FilterArgs) -> Carry {
    let Carry::Str(input) = &carry else {
        return carry;
    };
    let parsed = match args.text(1) {
        Some(in_fmt) => parse_with_format(input, in_fmt),
        None => parse_input(input).map(|(dt, _)| dt),
    };
    let Some(dt) = parsed else {
        return carry;
    };
    let out_fmt = args.text(0).unwrap_or("YYYY-MM-DD");
    Carry::Str(format_tokens(dt, out_fmt))
}

/// `date_modify:"+1 day"` / `date_modify:"-2 months"`.
pub fn date_modify(carry: Carry, args: &FilterArgs) -> Carry {
    let Carry::Str(input) = &carry else {
        return carry;
    };
    let Some(spec) = args.text(0) else {
        return carry;
    };
    let Some((dt, had_time)) = parse_input(input) else {
        return carry;
    };
    let Some(caps) = INTERVAL.captures(spec) else {
        return carry;
    };
    let sign: i64 = if &caps[1] == "-" { -1 } else { 1 };
    let amount: i64 = match caps[2].parse() {
        Ok(n) => n,
        Err(_) => return carry,
    };
    let amount = sign * amount;

    let shifted = match &caps[3] {
        "year" => dt.add_months(amount * 12),
        "month" => dt.add_months(amount),
        "week" => dt.add_seconds(amount * 7 * 86_400),
        "day" => dt.add_seconds(amount * 86_400),
        "hour" => dt.add_seconds(amount * 3_600),
        "minute" => dt.add_seconds(amount * 60),
        _ => dt.add_seconds(amount),
    };

    let out = if had_time {
        format!("{}T{}", shifted.date_string(), shifted.time_string())
    } else {
        shifted.date_string()
    };
    Carry::Str(out)
}

/// ISO 8601 duration (or plain seconds) → `H:mm:ss` style text.
pub fn duration(carry: Carry, _args: &FilterArgs) -> Carry {
    let total = match &carry {
        Carry::Str(s) => parse_duration_secs(s),
        Carry::Json(serde_json::Value::Number(n)) => n.as_f64().map(|f| f as i64),
        _ => None,
    };
    let Some(total) = total else {
        return carry;
    };
    let hours = total / 3_600;
    let minutes = total % 3_600 / 60;
    let seconds = total % 60;
    let out = if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    };
    Carry::Str(out)
}

/// Parse an ISO datetime or unix timestamp. The boolean reports whether
/// the input carried a time-of-day component.
fn parse_input(input: &str) -> Option<(DateTime, bool)> {
    let trimmed = input.trim();
    if let Some(dt) = DateTime::parse(trimmed) {
        return Some((dt, trimmed.len() > 10));
    }
    // Unix timestamps: seconds, or milliseconds for 13+ digits.
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = trimmed.parse().ok()?;
        let secs = if digits.len() >= 13 { n / 1_000 } else { n };
        return Some((DateTime::from_unix(secs), true));
    }
    None
}

fn parse_duration_secs(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(secs) = trimmed.parse::<f64>() {
        return Some(secs as i64);
    }
    let rest = trimmed.strip_prefix('P').or_else(|| trimmed.strip_prefix('p'))?;
    let mut total = 0i64;
    let mut in_time = false;
    let mut number = String::new();
    for ch in rest.chars() {
        match ch {
            'T' | 't' => in_time = true,
            '0'..='9' | '.' => number.push(ch),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let secs = match (unit.to_ascii_uppercase(), in_time) {
                    ('Y', _) => value * 365.0 * 86_400.0,
                    ('M', false) => value * 30.0 * 86_400.0,
                    ('W', _) => value * 7.0 * 86_400.0,
                    ('D', _) => value * 86_400.0,
                    ('H', _) => value * 3_600.0,
                    ('M', true) => value * 60.0,
                    ('S', _) => value,
                    _ => return None,
                };
                total += secs as i64;
            }
        }
    }
    number.is_empty().then_some(total)
}

/// Render `dt` through the token vocabulary.
fn format_tokens(dt: DateTime, fmt: &str) -> String {
    let mut out = String::new();
    let mut rest = fmt;
    while !rest.is_empty() {
        // Bracketed literals pass through verbatim.
        if let Some(after) = rest.strip_prefix('[') {
            match after.find(']') {
                Some(end) => {
                    out.push_str(&after[..end]);
                    rest = &after[end + 1..];
                    continue;
                }
                None => {
                    out.push('[');
                    rest = after;
                    continue;
                }
            }
        }
        let (token, len) = longest_token(rest);
        match token {
            Some(token) => {
                out.push_str(&expand_token(dt, token));
                rest = &rest[len..];
            }
            None => {
                let ch = rest.chars().next().expect("rest is non-empty");
                out.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }
    out
}

const TOKENS: &[&str] = &[
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "dddd", "ddd", "DD", "D", "HH", "H", "mm", "m", "ss",
    "s",
];

fn longest_token(rest: &str) -> (Option<&'static str>, usize) {
    for token in TOKENS {
        if rest.starts_with(token) {
            return (Some(token), token.len());
        }
    }
    (None, 0)
}

fn expand_token(dt: DateTime, token: &str) -> String {
    match token {
        "YYYY" => format!("{:04}", dt.year),
        "YY" => format!("{:02}", dt.year.rem_euclid(100)),
        "MMMM" => MONTHS[(dt.month - 1) as usize].to_string(),
        "MMM" => MONTHS[(dt.month - 1) as usize][..3].to_string(),
        "MM" => format!("{:02}", dt.month),
        "M" => dt.month.to_string(),
        "dddd" => WEEKDAYS[dt.weekday() as usize].to_string(),
        "ddd" => WEEKDAYS[dt.weekday() as usize][..3].to_string(),
        "DD" => format!("{:02}", dt.day),
        "D" => dt.day.to_string(),
        "HH" => format!("{:02}", dt.hour),
        "H" => dt.hour.to_string(),
        "mm" => format!("{:02}", dt.minute),
        "m" => dt.minute.to_string(),
        "ss" => format!("{:02}", dt.second),
        "s" => dt.second.to_string(),
        _ => token.to_string(),
    }
}

/// Parse `input` according to a format written in the same vocabulary.
fn parse_with_format(input: &str, fmt: &str) -> Option<DateTime> {
    let mut dt = DateTime::new(1970, 1, 1, 0, 0, 0);
    let mut input = input.trim();
    let mut fmt_rest = fmt;

    while !fmt_rest.is_empty() {
        let (token, len) = longest_token(fmt_rest);
        match token {
            Some("YYYY") => dt.year = read_number(&mut input, 4)? as i32,
            Some("YY") => dt.year = 2000 + read_number(&mut input, 2)? as i32,
            Some("MM") | Some("M") => dt.month = read_number(&mut input, 2)? as u8,
            Some("DD") | Some("D") => dt.day = read_number(&mut input, 2)? as u8,
            Some("HH") | Some("H") => dt.hour = read_number(&mut input, 2)? as u8,
            Some("mm") | Some("m") => dt.minute = read_number(&mut input, 2)? as u8,
            Some("ss") | Some("s") => dt.second = read_number(&mut input, 2)? as u8,
            Some("MMMM") | Some("MMM") => dt.month = read_month_name(&mut input)?,
            Some("dddd") | Some("ddd") => {
                skip_letters(&mut input);
            }
            Some(_) | None => {
                let ch = fmt_rest.chars().next().expect("fmt is non-empty");
                input = input.strip_prefix(ch)?;
                fmt_rest = &fmt_rest[ch.len_utf8()..];
                continue;
            }
        }
        fmt_rest = &fmt_rest[len..];
    }

    dt.is_valid().then_some(dt)
}

fn read_number(input: &mut &str, max: usize) -> Option<u32> {
    let digits = input.len() - input.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let take = digits.min(max);
    if take == 0 {
        return None;
    }
    let value = input[..take].parse().ok()?;
    *input = &input[take..];
    Some(value)
}

fn read_month_name(input: &mut &str) -> Option<u8> {
    let head = input.get(..3)?.to_lowercase();
    for (i, name) in MONTHS.iter().enumerate() {
        if name.to_lowercase().starts_with(&head) {
            skip_letters(input);
            return Some(i as u8 + 1);
        }
    }
    None
}

fn skip_letters(input: &mut &str) {
    *input = input.trim_start_matches(|c: char| c.is_alphabetic());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::args::parse_args;

    fn run(filter: fn(Carry, &FilterArgs) -> Carry, input: &str, raw_args: &str) -> String {
        let args = parse_args(raw_args).unwrap();
        filter(Carry::str(input), &args).into_output()
    }

    #[test]
    fn test_date_default_format() {
        assert_eq!(run(date, "2024-06-15T14:30:45Z", ""), "2024-06-15");
    }

    #[test]
    fn test_date_tokens() {
        assert_eq!(
            run(date, "2024-06-15", "\"MMM D, YYYY\""),
            "Jun 15, 2024"
        );
        assert_eq!(run(date, "2024-06-15", "\"dddd\""), "Saturday");
        assert_eq!(run(date, "2024-06-05", "\"D/M/YY\""), "5/6/24");
    }

    #[test]
    fn test_date_bracket_literal() {
        assert_eq!(
            run(date, "2024-06-15", "\"[Day] D\""),
            "Day 15"
        );
    }

    #[test]
    fn test_date_with_input_format() {
        assert_eq!(
            run(date, "15/06/2024", "(\"YYYY-MM-DD\", \"DD/MM/YYYY\")"),
            "2024-06-15"
        );
    }

    #[test]
    fn test_date_month_name_input() {
        assert_eq!(
            run(date, "June 15, 2024", "(\"YYYY-MM-DD\", \"MMMM D, YYYY\")"),
            "2024-06-15"
        );
    }

    #[test]
    fn test_date_unix_timestamp() {
        assert_eq!(run(date, "1718461845", "\"YYYY-MM-DD HH:mm\""), "2024-06-15 14:30");
        assert_eq!(run(date, "1718461845000", "\"YYYY-MM-DD\""), "2024-06-15");
    }

    #[test]
    fn test_date_invalid_passthrough() {
        assert_eq!(run(date, "not a date", "\"YYYY\""), "not a date");
    }

    #[test]
    fn test_date_modify_days() {
        assert_eq!(run(date_modify, "2024-06-15", "\"+10 days\""), "2024-06-25");
        assert_eq!(run(date_modify, "2024-01-01", "\"-1 day\""), "2023-12-31");
    }

    #[test]
    fn test_date_modify_months_clamp() {
        assert_eq!(run(date_modify, "2024-01-31", "\"+1 month\""), "2024-02-29");
    }

    #[test]
    fn test_date_modify_keeps_time() {
        assert_eq!(
            run(date_modify, "2024-06-15T10:00:00Z", "\"+2 hours\""),
            "2024-06-15T12:00:00"
        );
    }

    #[test]
    fn test_date_modify_bad_interval_passthrough() {
        assert_eq!(run(date_modify, "2024-06-15", "\"soonish\""), "2024-06-15");
    }

    #[test]
    fn test_duration_iso() {
        assert_eq!(run(duration, "PT1H30M15S", ""), "1:30:15");
        assert_eq!(run(duration, "PT5M3S", ""), "5:03");
        assert_eq!(run(duration, "P1DT2H", ""), "26:00:00");
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(run(duration, "3725", ""), "1:02:05");
        assert_eq!(run(duration, "59", ""), "0:59");
    }

    #[test]
    fn test_duration_invalid_passthrough() {
        assert_eq!(run(duration, "later", ""), "later");
    }
}

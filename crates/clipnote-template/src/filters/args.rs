/*
 * args.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tokenizer for filter argument lists.
//!
//! Understands bare tokens (`split:,`), quoted strings with backslash
//! escapes (`join:", "`), regex literals (`replace:/\d+/g:"N"`),
//! parenthesized positional groups (`callout:("note","Title",true)`),
//! and key/value object form (`replace:("a":"1","b":"2")`).
//!
//! A tokenizer error makes the runner skip the filter; it never aborts
//! the render.

use crate::error::{TemplateError, TemplateResult};

/// One parsed argument token.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Quoted string, escapes processed.
    Str(String),

    /// Bare token, kept verbatim.
    Bare(String),

    /// Regex literal `/pattern/flags`.
    Regex { pattern: String, flags: String },
}

impl Arg {
    /// The textual content of this argument.
    pub fn text(&self) -> &str {
        match self {
            Arg::Str(s) | Arg::Bare(s) => s,
            Arg::Regex { pattern, .. } => pattern,
        }
    }
}

/// One comma-separated item: a lone value or a `key:value` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgItem {
    Value(Arg),
    Pair(Arg, Arg),
}

/// A parsed argument list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterArgs {
    pub items: Vec<ArgItem>,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Positional (non-pair) arguments in order.
    pub fn values(&self) -> Vec<&Arg> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ArgItem::Value(arg) => Some(arg),
                ArgItem::Pair(..) => None,
            })
            .collect()
    }

    /// Key/value pairs in order.
    pub fn pairs(&self) -> Vec<(&Arg, &Arg)> {
        self.items
            .iter()
            .filter_map(|item| match item {
                ArgItem::Pair(k, v) => Some((k, v)),
                ArgItem::Value(_) => None,
            })
            .collect()
    }

    /// The nth positional argument as text.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.values().get(index).map(|arg| arg.text())
    }

    /// The nth positional argument parsed as a number.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.text(index)?.trim().parse().ok()
    }

    /// The nth positional argument as a boolean (`true`/`false`).
    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.text(index)?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// Tokenize a raw argument string.
pub fn parse_args(raw: &str) -> TemplateResult<FilterArgs> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(FilterArgs::default());
    }
    let inner = strip_group(raw).unwrap_or(raw);
    let mut lexer = Lexer::new(inner);
    let mut items = Vec::new();

    loop {
        lexer.skip_whitespace();
        if lexer.at_end() {
            break;
        }
        let first = lexer.token()?;
        lexer.skip_whitespace();
        if lexer.eat(':') {
            lexer.skip_whitespace();
            let second = lexer.token()?;
            items.push(ArgItem::Pair(first, second));
        } else {
            items.push(ArgItem::Value(first));
        }
        lexer.skip_whitespace();
        if !lexer.eat(',') && !lexer.at_end() {
            return Err(TemplateError::InvalidArgs {
                message: format!("unexpected input at {:?}", lexer.rest()),
            });
        }
    }

    Ok(FilterArgs { items })
}

/// If the whole string is one balanced `(…)` group, return the inside.
fn strip_group(raw: &str) -> Option<&str> {
    let inner = raw.strip_prefix('(')?.strip_suffix(')')?;
    // Reject `(a),(b)` — the wrapping parens must be one group.
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for ch in inner.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => quote = Some(ch),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return None;
                    }
                }
                _ => {}
            },
        }
    }
    (depth == 0).then_some(inner)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let skip = rest.len() - rest.trim_start().len();
        self.pos += skip;
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn token(&mut self) -> TemplateResult<Arg> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote),
            Some('/') => self.regex(),
            Some(_) => Ok(self.bare()),
            None => Err(TemplateError::InvalidArgs {
                message: "expected a token".to_string(),
            }),
        }
    }

    fn quoted(&mut self, quote: char) -> TemplateResult<Arg> {
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch == quote {
                self.pos += i + 1;
                return Ok(Arg::Str(out));
            }
            if ch == '\\' {
                match chars.next() {
                    Some((_, esc)) => out.push(unescape(esc)),
                    None => break,
                }
            } else {
                out.push(ch);
            }
        }
        Err(TemplateError::InvalidArgs {
            message: "unterminated string".to_string(),
        })
    }

    fn regex(&mut self) -> TemplateResult<Arg> {
        self.pos += 1;
        let mut pattern = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch == '/' {
                self.pos += i + 1;
                let flag_len = self
                    .rest()
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(self.rest().len());
                let flags = self.rest()[..flag_len].to_string();
                self.pos += flag_len;
                return Ok(Arg::Regex { pattern, flags });
            }
            if ch == '\\' {
                // Keep the escape for the regex engine.
                pattern.push('\\');
                if let Some((_, esc)) = chars.next() {
                    pattern.push(esc);
                }
            } else {
                pattern.push(ch);
            }
        }
        Err(TemplateError::InvalidArgs {
            message: "unterminated regex".to_string(),
        })
    }

    fn bare(&mut self) -> Arg {
        let rest = self.rest();
        let end = rest.find([',', ':', ')']).unwrap_or(rest.len());
        let token = rest[..end].trim().to_string();
        self.pos += end;
        Arg::Bare(token)
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(parse_args("").unwrap().is_empty());
        assert!(parse_args("  ").unwrap().is_empty());
    }

    #[test]
    fn test_single_quoted() {
        let args = parse_args(r#"", ""#).unwrap();
        assert_eq!(args.text(0), Some(", "));
    }

    #[test]
    fn test_bare_token() {
        let args = parse_args("bullet").unwrap();
        assert_eq!(args.text(0), Some("bullet"));
    }

    #[test]
    fn test_positional_group() {
        let args = parse_args(r#"("note", "Title", true)"#).unwrap();
        assert_eq!(args.text(0), Some("note"));
        assert_eq!(args.text(1), Some("Title"));
        assert_eq!(args.boolean(2), Some(true));
    }

    #[test]
    fn test_key_value_group() {
        let args = parse_args(r#"("a":"1","b":"2")"#).unwrap();
        let pairs = args.pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.text(), "a");
        assert_eq!(pairs[1].1.text(), "2");
    }

    #[test]
    fn test_unparenthesized_pair() {
        let args = parse_args(r#""a":"b""#).unwrap();
        assert_eq!(args.pairs().len(), 1);
    }

    #[test]
    fn test_regex_literal() {
        let args = parse_args(r"/\d+/gi").unwrap();
        assert_eq!(
            args.values()[0],
            &Arg::Regex {
                pattern: r"\d+".to_string(),
                flags: "gi".to_string()
            }
        );
    }

    #[test]
    fn test_regex_pair() {
        let args = parse_args(r#"/a|b/g:"x""#).unwrap();
        let pairs = args.pairs();
        assert_eq!(pairs.len(), 1);
        assert!(matches!(pairs[0].0, Arg::Regex { .. }));
    }

    #[test]
    fn test_escapes() {
        let args = parse_args(r#""a\nb\t\"c\\""#).unwrap();
        assert_eq!(args.text(0), Some("a\nb\t\"c\\"));
    }

    #[test]
    fn test_numbers() {
        let args = parse_args("2, -1").unwrap();
        assert_eq!(args.number(0), Some(2.0));
        assert_eq!(args.number(1), Some(-1.0));
    }

    #[test]
    fn test_unterminated_string_errors() {
        assert!(parse_args(r#""abc"#).is_err());
    }

    #[test]
    fn test_colon_inside_quotes_is_not_a_pair() {
        let args = parse_args(r#""a:b""#).unwrap();
        assert_eq!(args.pairs().len(), 0);
        assert_eq!(args.text(0), Some("a:b"));
    }
}

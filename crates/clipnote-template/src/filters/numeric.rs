/*
 * numeric.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Numeric filters: `calc`, `round`, `number_format`.

use crate::filters::FilterArgs;
use crate::value::Carry;

/// `calc:"*2"` / `calc:"+5*3"` / `calc:"**2"` — evaluate an arithmetic
/// expression with the carried number as the leading operand. Operators:
/// `+ - * / ** ^` and parentheses. Anything unparsable, or a non-numeric
/// carry, passes through unchanged.
pub fn calc(carry: Carry, raw: &str) -> Carry {
    let Some(base) = carry.as_number() else {
        return carry;
    };
    let expr = raw.trim().trim_matches(['"', '\'']);
    if expr.is_empty() {
        return carry;
    }
    let Some(mut tokens) = tokenize(expr) else {
        tracing::debug!(expr, "skipping unparsable calc expression");
        return carry;
    };
    tokens.insert(0, Token::Number(base));
    match eval(&tokens) {
        Some(result) if result.is_finite() => Carry::Str(format_number(result)),
        _ => carry,
    }
}

/// `round` / `round:digits`.
pub fn round(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(value) = carry.as_number() else {
        return carry;
    };
    let digits = args.number(0).unwrap_or(0.0) as i32;
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    Carry::Str(format_number(rounded))
}

/// `number_format:(decimals, decimal_point, thousands_sep)`.
pub fn number_format(carry: Carry, args: &FilterArgs) -> Carry {
    let Some(value) = carry.as_number() else {
        return carry;
    };
    let decimals = args.number(0).unwrap_or(0.0).max(0.0) as usize;
    let point = args.text(1).unwrap_or(".");
    let thousands = args.text(2).unwrap_or(",");

    let formatted = format!("{value:.decimals$}");
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part.as_str()),
    };

    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(thousands);
        }
        grouped.push(ch);
    }

    let mut out = format!("{sign}{grouped}");
    if let Some(frac) = frac_part {
        out.push_str(point);
        out.push_str(&frac);
    }
    Carry::Str(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some(&(i, ch)) = chars.peek() {
        match ch {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek().is_some_and(|&(_, c)| c == '*') {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '^' => {
                tokens.push(Token::Pow);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let rest = &expr[i..];
                let end = rest
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(rest.len());
                let number: f64 = rest[..end].parse().ok()?;
                tokens.push(Token::Number(number));
                while chars.peek().is_some_and(|&(j, _)| j < i + end) {
                    chars.next();
                }
            }
            _ => return None,
        }
    }
    Some(tokens)
}

/// Shunting-yard evaluation. `**`/`^` bind tightest and associate right.
fn eval(tokens: &[Token]) -> Option<f64> {
    let mut output: Vec<f64> = Vec::new();
    let mut ops: Vec<Token> = Vec::new();

    fn precedence(op: &Token) -> u8 {
        match op {
            Token::Pow => 3,
            Token::Star | Token::Slash => 2,
            Token::Plus | Token::Minus => 1,
            _ => 0,
        }
    }

    fn apply(output: &mut Vec<f64>, op: Token) -> Option<()> {
        let right = output.pop()?;
        let left = output.pop()?;
        let value = match op {
            Token::Plus => left + right,
            Token::Minus => left - right,
            Token::Star => left * right,
            Token::Slash => left / right,
            Token::Pow => left.powf(right),
            _ => return None,
        };
        output.push(value);
        Some(())
    }

    let mut prev_was_value = false;
    for &token in tokens {
        match token {
            Token::Number(n) => {
                if prev_was_value {
                    return None;
                }
                output.push(n);
                prev_was_value = true;
            }
            Token::Open => {
                ops.push(token);
                prev_was_value = false;
            }
            Token::Close => {
                loop {
                    match ops.pop() {
                        Some(Token::Open) => break,
                        Some(op) => apply(&mut output, op)?,
                        None => return None,
                    }
                }
                prev_was_value = true;
            }
            op => {
                // Unary minus becomes `0 - x`.
                if !prev_was_value {
                    if op == Token::Minus {
                        output.push(0.0);
                        ops.push(Token::Minus);
                        continue;
                    }
                    return None;
                }
                while let Some(top) = ops.last() {
                    let higher = precedence(top) > precedence(&op)
                        || (precedence(top) == precedence(&op) && op != Token::Pow);
                    if *top != Token::Open && higher {
                        let top = ops.pop().expect("top exists");
                        apply(&mut output, top)?;
                    } else {
                        break;
                    }
                }
                ops.push(op);
                prev_was_value = false;
            }
        }
    }
    while let Some(op) = ops.pop() {
        if op == Token::Open {
            return None;
        }
        apply(&mut output, op)?;
    }
    (output.len() == 1).then(|| output[0])
}

/// Integer results print without a decimal point.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

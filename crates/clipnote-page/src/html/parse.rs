//! Tolerant HTML tokenizer and tree builder.
//!
//! The scanner walks the input byte-by-byte, building a stack of open
//! elements. Anything it cannot make sense of is kept as text, so parsing
//! never fails.

use hashlink::LinkedHashMap;

use super::{HtmlElement, HtmlNode, is_void};

/// Parse an HTML fragment into a node list.
///
/// Comments and doctype declarations are dropped. `<script>` and `<style>`
/// contents are treated as raw text. Unclosed elements are closed at end
/// of input; end tags with no matching open element are ignored.
pub fn parse(input: &str) -> Vec<HtmlNode> {
    Parser::new(input).run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Open-element stack. The bottom sentinel holds finished roots.
    stack: Vec<HtmlElement>,
    roots: Vec<HtmlNode>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<HtmlNode> {
        while self.pos < self.input.len() {
            if self.rest().starts_with("<!--") {
                self.skip_comment();
            } else if self.rest().starts_with("<!") || self.rest().starts_with("<?") {
                self.skip_until('>');
            } else if self.rest().starts_with("</") {
                self.close_tag();
            } else if self.starts_open_tag() {
                self.open_tag();
            } else {
                self.text();
            }
        }
        // Close everything left open.
        while let Some(el) = self.stack.pop() {
            self.append(HtmlNode::Element(el));
        }
        self.roots
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_open_tag(&self) -> bool {
        let bytes = self.rest().as_bytes();
        bytes.len() >= 2 && bytes[0] == b'<' && bytes[1].is_ascii_alphabetic()
    }

    fn append(&mut self, node: HtmlNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn skip_comment(&mut self) {
        match self.rest().find("-->") {
            Some(end) => self.pos += end + 3,
            None => self.pos = self.input.len(),
        }
    }

    fn skip_until(&mut self, ch: char) {
        match self.rest().find(ch) {
            Some(end) => self.pos += end + 1,
            None => self.pos = self.input.len(),
        }
    }

    fn text(&mut self) {
        let rest = self.rest();
        // Up to the next '<', or everything that is left. The first
        // character is part of the text even when it is a '<' that
        // failed to open a tag.
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let end = rest[first..]
            .find('<')
            .map(|i| i + first)
            .unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;
        self.append(HtmlNode::Text(decode_entities(raw)));
    }

    fn close_tag(&mut self) {
        self.pos += 2; // "</"
        let name = self.read_name();
        self.skip_until('>');
        if name.is_empty() {
            return;
        }
        // Find a matching open element; ignore the end tag otherwise.
        let Some(depth) = self.stack.iter().rposition(|el| el.tag == name) else {
            return;
        };
        while self.stack.len() > depth {
            let el = self.stack.pop().expect("stack depth checked");
            self.append(HtmlNode::Element(el));
        }
    }

    fn open_tag(&mut self) {
        self.pos += 1; // '<'
        let name = self.read_name();
        let mut attributes = LinkedHashMap::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            let attr_name = self.read_attr_name();
            if attr_name.is_empty() {
                // Stray character; skip it to guarantee progress.
                self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
                continue;
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attr_value()
            } else {
                String::new()
            };
            attributes.entry(attr_name).or_insert(value);
        }

        // Implied end tags for the common offenders.
        self.close_implied(&name);

        let element = HtmlElement {
            tag: name.clone(),
            attributes,
            children: Vec::new(),
        };

        if self_closing || is_void(&name) {
            self.append(HtmlNode::Element(element));
        } else if name == "script" || name == "style" {
            let mut element = element;
            element.children = self.raw_text(&name);
            self.append(HtmlNode::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    /// Close elements that cannot contain the incoming tag.
    fn close_implied(&mut self, incoming: &str) {
        let closes = |open: &str| -> bool {
            match incoming {
                "p" | "ul" | "ol" | "div" | "table" | "blockquote" | "h1" | "h2" | "h3" | "h4"
                | "h5" | "h6" | "pre" => open == "p",
                "li" => open == "li",
                "tr" => open == "tr" || open == "td" || open == "th",
                "td" | "th" => open == "td" || open == "th",
                "option" => open == "option",
                "dd" | "dt" => open == "dd" || open == "dt",
                _ => false,
            }
        };
        while let Some(top) = self.stack.last() {
            if closes(&top.tag) {
                let el = self.stack.pop().expect("top exists");
                self.append(HtmlNode::Element(el));
            } else {
                break;
            }
        }
    }

    /// Consume raw text until the matching end tag (for script/style).
    fn raw_text(&mut self, tag: &str) -> Vec<HtmlNode> {
        let closer = format!("</{tag}");
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let (content, consumed) = match lower.find(&closer) {
            Some(idx) => {
                let after = &rest[idx..];
                let close_len = after.find('>').map(|i| i + 1).unwrap_or(after.len());
                (&rest[..idx], idx + close_len)
            }
            None => (rest, rest.len()),
        };
        let content = content.to_string();
        self.pos += consumed;
        if content.is_empty() {
            Vec::new()
        } else {
            vec![HtmlNode::Text(content)]
        }
    }

    fn read_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        self.pos += end;
        name
    }

    fn read_attr_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        self.pos += end;
        name
    }

    fn read_attr_value(&mut self) -> String {
        let rest = self.rest();
        let mut chars = rest.chars();
        match chars.next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                let value = &body[..end];
                self.pos += 1 + end + if end < body.len() { 1 } else { 0 };
                decode_entities(value)
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                let value = &rest[..end];
                self.pos += end;
                decode_entities(value)
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        self.pos += end;
    }
}

/// Decode the common named entities plus numeric character references.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let window = &rest.as_bytes()[..rest.len().min(10)];
        let semi = match window.iter().position(|&b| b == b';') {
            Some(i) => i,
            None => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix('#')
                .and_then(|num| {
                    if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        num.parse::<u32>().ok()
                    }
                })
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

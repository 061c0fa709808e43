//! HTML to Markdown conversion.
//!
//! Covers the element vocabulary that survives article extraction:
//! headings, paragraphs, emphasis, code, links, images, lists, quotes,
//! tables, and rules. Unknown elements contribute their children.

use url::Url;

use super::{HtmlElement, HtmlNode, parse};

/// Convert an HTML fragment to Markdown.
///
/// Relative `href`/`src` values are resolved against `base_url` when one
/// is supplied and parses.
pub fn to_markdown(html: &str, base_url: Option<&str>) -> String {
    let nodes = parse(html);
    let base = base_url.and_then(|u| Url::parse(u).ok());
    let mut w = Writer {
        base,
        blocks: Vec::new(),
    };
    w.walk(&nodes, "");
    let out = w.blocks.join("\n\n");
    out.trim().to_string()
}

struct Writer {
    base: Option<Url>,
    blocks: Vec<String>,
}

impl Writer {
    /// Render a node list as a sequence of blocks, each prefixed for the
    /// current quote/list nesting.
    fn walk(&mut self, nodes: &[HtmlNode], prefix: &str) {
        let mut inline = String::new();
        for node in nodes {
            match node {
                HtmlNode::Element(el) if is_block(&el.tag) => {
                    self.flush_inline(&mut inline, prefix);
                    self.block_element(el, prefix);
                }
                other => inline.push_str(&self.inline(other, false)),
            }
        }
        self.flush_inline(&mut inline, prefix);
    }

    fn flush_inline(&mut self, inline: &mut String, prefix: &str) {
        let text = collapse_whitespace(inline).trim().to_string();
        inline.clear();
        if !text.is_empty() {
            self.push_block(&text, prefix);
        }
    }

    fn push_block(&mut self, text: &str, prefix: &str) {
        if prefix.is_empty() {
            self.blocks.push(text.to_string());
        } else {
            let prefixed: Vec<String> = text
                .lines()
                .map(|line| format!("{prefix}{line}"))
                .collect();
            self.blocks.push(prefixed.join("\n"));
        }
    }

    fn block_element(&mut self, el: &HtmlElement, prefix: &str) {
        match el.tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.tag[1..].parse::<usize>().unwrap_or(1);
                let text = self.inline_children(el, false);
                let text = collapse_whitespace(&text);
                let text = text.trim();
                if !text.is_empty() {
                    self.push_block(&format!("{} {}", "#".repeat(level), text), prefix);
                }
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "aside"
            | "figure" | "figcaption" | "nav" => {
                self.walk(&el.children, prefix);
            }
            "blockquote" => {
                let child_prefix = format!("{prefix}> ");
                let mark = self.blocks.len();
                self.walk(&el.children, &child_prefix);
                // Blank lines between quoted blocks still carry the marker.
                if self.blocks.len() > mark + 1 {
                    let joined = self.blocks.split_off(mark).join(&format!("\n{prefix}>\n"));
                    self.blocks.push(joined);
                }
            }
            "pre" => {
                let code = el.text_content();
                let code = code.trim_end_matches('\n');
                self.push_block(&format!("```\n{code}\n```"), prefix);
            }
            "ul" | "ol" => {
                let items = self.list_items(el, prefix);
                if !items.is_empty() {
                    self.blocks.push(items.join("\n"));
                }
            }
            "table" => {
                if let Some(table) = self.table(el) {
                    self.push_block(&table, prefix);
                }
            }
            "hr" => self.push_block("---", prefix),
            _ => self.walk(&el.children, prefix),
        }
    }

    fn list_items(&mut self, list: &HtmlElement, prefix: &str) -> Vec<String> {
        let ordered = list.tag == "ol";
        let mut items = Vec::new();
        let mut index = 0usize;
        for child in &list.children {
            let HtmlNode::Element(li) = child else {
                continue;
            };
            if li.tag != "li" {
                continue;
            }
            index += 1;
            let marker = if ordered {
                format!("{index}. ")
            } else {
                "- ".to_string()
            };
            let indent = " ".repeat(marker.len());
            let mut line = String::new();
            let mut nested: Vec<String> = Vec::new();
            for part in &li.children {
                match part {
                    HtmlNode::Element(inner) if inner.tag == "ul" || inner.tag == "ol" => {
                        let sub = self.list_items(inner, prefix);
                        nested.extend(sub.into_iter().map(|l| format!("{indent}{l}")));
                    }
                    other => line.push_str(&self.inline(other, false)),
                }
            }
            let line = collapse_whitespace(&line);
            items.push(format!("{prefix}{marker}{}", line.trim()));
            items.extend(nested.into_iter().map(|l| format!("{prefix}{l}")));
        }
        items
    }

    fn table(&mut self, el: &HtmlElement) -> Option<String> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        collect_rows(el, &mut |tr| {
            let mut cells = Vec::new();
            for cell in &tr.children {
                if let HtmlNode::Element(c) = cell {
                    if c.tag == "td" || c.tag == "th" {
                        let text = self.inline_children(c, false);
                        cells.push(collapse_whitespace(&text).trim().replace('|', "\\|"));
                    }
                }
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        });
        if rows.is_empty() {
            return None;
        }
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut out = String::new();
        for (i, row) in rows.iter().enumerate() {
            out.push('|');
            for col in 0..width {
                out.push(' ');
                out.push_str(row.get(col).map(String::as_str).unwrap_or(""));
                out.push_str(" |");
            }
            out.push('\n');
            if i == 0 {
                out.push('|');
                for _ in 0..width {
                    out.push_str(" --- |");
                }
                out.push('\n');
            }
        }
        Some(out.trim_end().to_string())
    }

    fn inline_children(&self, el: &HtmlElement, in_code: bool) -> String {
        el.children
            .iter()
            .map(|n| self.inline(n, in_code))
            .collect()
    }

    fn inline(&self, node: &HtmlNode, in_code: bool) -> String {
        match node {
            HtmlNode::Text(t) => t.clone(),
            HtmlNode::Element(el) => match el.tag.as_str() {
                "br" => "\n".to_string(),
                "em" | "i" => wrap_nonempty(&self.inline_children(el, in_code), "*"),
                "strong" | "b" => wrap_nonempty(&self.inline_children(el, in_code), "**"),
                "del" | "s" | "strike" => {
                    wrap_nonempty(&self.inline_children(el, in_code), "~~")
                }
                "code" if !in_code => {
                    let body = self.inline_children(el, true);
                    if body.is_empty() {
                        String::new()
                    } else {
                        format!("`{body}`")
                    }
                }
                "a" => {
                    let text = self.inline_children(el, in_code);
                    let text = collapse_whitespace(&text);
                    let text = text.trim();
                    match el.attr("href") {
                        Some(href) if !href.is_empty() => {
                            let href = self.resolve(href);
                            if text.is_empty() {
                                href
                            } else {
                                format!("[{text}]({href})")
                            }
                        }
                        _ => text.to_string(),
                    }
                }
                "img" => {
                    let alt = el.attr("alt").unwrap_or("");
                    match el.attr("src") {
                        Some(src) if !src.is_empty() => {
                            format!("![{alt}]({})", self.resolve(src))
                        }
                        _ => String::new(),
                    }
                }
                _ => self.inline_children(el, in_code),
            },
        }
    }

    fn resolve(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

fn collect_rows(el: &HtmlElement, f: &mut impl FnMut(&HtmlElement)) {
    for child in &el.children {
        if let HtmlNode::Element(inner) = child {
            if inner.tag == "tr" {
                f(inner);
            } else {
                collect_rows(inner, f);
            }
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "h1" | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "p"
            | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "aside"
            | "figure"
            | "figcaption"
            | "nav"
            | "blockquote"
            | "pre"
            | "ul"
            | "ol"
            | "table"
            | "hr"
    )
}

fn wrap_nonempty(body: &str, mark: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{mark}{trimmed}{mark}")
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for ch in s.chars() {
        if ch == '\n' {
            // Hard breaks from <br> survive collapsing.
            out.push('\n');
            in_space = true;
        } else if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

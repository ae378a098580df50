//! HTML pretty-printing.
//!
//! Block elements get their own lines with two-space indentation; elements
//! holding only inline content stay on one line; `pre`, `textarea`, `script`
//! and `style` bodies are copied verbatim.

use aflow_kernel::prelude::{Asset, Step, StepError};
use std::fmt::Write as _;

const VOID: &[&str] =
    &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

const RAW_TEXT: &[&str] = &["pre", "script", "style", "textarea"];

const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i", "img", "input", "kbd",
    "label", "mark", "q", "s", "samp", "select", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// `<!DOCTYPE ...>` and other declarations, verbatim.
    Declaration(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    name: String,
    attrs: String,
    self_closing: bool,
    children: Vec<Node>,
    /// Verbatim body of raw-text elements.
    raw: Option<String>,
}

impl Element {
    fn lower(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    fn is_void(&self) -> bool {
        self.self_closing || VOID.contains(&self.lower().as_str())
    }

    fn open_tag(&self) -> String {
        let mut tag = format!("<{}", self.name);
        if !self.attrs.is_empty() {
            tag.push(' ');
            tag.push_str(&self.attrs);
        }
        tag.push_str(if self.self_closing { " />" } else { ">" });
        tag
    }

    fn close_tag(&self) -> String {
        format!("</{}>", self.name)
    }
}

/// Re-indents an HTML document.
#[must_use]
pub fn pretty(html: &str) -> String {
    let nodes = parse(html);
    let mut out = String::with_capacity(html.len());
    write_nodes(&nodes, 0, &mut out);
    out
}

fn parse(html: &str) -> Vec<Node> {
    let mut root = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let rest = &html[pos..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body.find("-->").unwrap_or(body.len());
            append(&mut stack, &mut root, Node::Comment(body[..end].to_owned()));
            pos += 4 + (end + 3).min(body.len());
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            append(&mut stack, &mut root, Node::Declaration(rest[..end].to_owned()));
            pos += end;
        } else if let Some(after) = rest.strip_prefix("</") {
            let name_len = after.find(|c: char| c == '>' || c.is_whitespace()).unwrap_or(after.len());
            let name = after[..name_len].to_ascii_lowercase();
            pos += rest.find('>').map_or(rest.len(), |i| i + 1);
            if let Some(open) = stack.iter().rposition(|e| e.lower() == name) {
                while stack.len() > open {
                    close_top(&mut stack, &mut root);
                }
            }
        } else if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let (mut element, consumed) = start_tag(rest);
            pos += consumed;
            let lower = element.lower();

            if RAW_TEXT.contains(&lower.as_str()) && !element.self_closing {
                let body = &html[pos..];
                let end = find_ci(body, &format!("</{lower}")).unwrap_or(body.len());
                element.raw = Some(body[..end].to_owned());
                pos += end;
                pos += html[pos..].find('>').map_or(html.len() - pos, |i| i + 1);
                append(&mut stack, &mut root, Node::Element(element));
            } else if element.is_void() {
                append(&mut stack, &mut root, Node::Element(element));
            } else {
                stack.push(element);
            }
        } else {
            let end = rest.char_indices().skip(1).find(|&(_, c)| c == '<').map_or(rest.len(), |(i, _)| i);
            append(&mut stack, &mut root, Node::Text(rest[..end].to_owned()));
            pos += end;
        }
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut root);
    }
    root
}

fn append(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.push(node),
    }
}

fn close_top(stack: &mut Vec<Element>, root: &mut Vec<Node>) {
    if let Some(element) = stack.pop() {
        append(stack, root, Node::Element(element));
    }
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack.as_bytes().windows(needle.len()).position(|w| w.eq_ignore_ascii_case(needle))
}

/// Parses `<name attrs>` at the start of `tag`; returns the element and the
/// number of bytes consumed.
fn start_tag(tag: &str) -> (Element, usize) {
    let name_len = tag[1..].find(|c: char| c == '>' || c == '/' || c.is_whitespace()).map_or(tag.len() - 1, |i| i);
    let name = tag[1..=name_len].to_owned();

    let mut quote = None;
    let mut end = tag.len();
    for (i, c) in tag.char_indices().skip(1 + name_len) {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {},
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => {
                end = i;
                break;
            },
            None => {},
        }
    }

    let inner = &tag[1 + name_len..end];
    let trimmed = inner.trim_end();
    let self_closing = trimmed.ends_with('/');
    let attrs = collapse(trimmed.trim_end_matches('/'), true).trim().to_owned();
    let consumed = (end + 1).min(tag.len());

    (Element { name, attrs, self_closing, children: Vec::new(), raw: None }, consumed)
}

/// Collapses whitespace runs into single spaces; with `quotes`, runs inside
/// quoted attribute values are kept.
fn collapse(text: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote = None;
    let mut space = false;
    for c in text.chars() {
        if quote.is_none() && c.is_whitespace() {
            space = true;
            continue;
        }
        if space {
            out.push(' ');
            space = false;
        }
        match quote {
            Some(q) if c == q => quote = None,
            None if quotes && (c == '"' || c == '\'') => quote = Some(c),
            _ => {},
        }
        out.push(c);
    }
    if space {
        out.push(' ');
    }
    out
}

fn is_inline(node: &Node) -> bool {
    match node {
        Node::Text(_) => true,
        Node::Element(e) => {
            e.raw.is_none() && INLINE.contains(&e.lower().as_str()) && e.children.iter().all(is_inline)
        },
        Node::Comment(_) | Node::Declaration(_) => false,
    }
}

fn render_inline(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&collapse(text, false)),
            Node::Element(e) => {
                out.push_str(&e.open_tag());
                if !e.is_void() {
                    render_inline(&e.children, out);
                    out.push_str(&e.close_tag());
                }
            },
            Node::Comment(_) | Node::Declaration(_) => {},
        }
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_nodes(nodes: &[Node], depth: usize, out: &mut String) {
    let mut start = 0;
    while start < nodes.len() {
        if is_inline(&nodes[start]) {
            let end = nodes[start..].iter().position(|n| !is_inline(n)).map_or(nodes.len(), |i| start + i);
            let mut line = String::new();
            render_inline(&nodes[start..end], &mut line);
            let line = line.trim();
            if !line.is_empty() {
                indent(depth, out);
                out.push_str(line);
                out.push('\n');
            }
            start = end;
        } else {
            write_block(&nodes[start], depth, out);
            start += 1;
        }
    }
}

fn write_block(node: &Node, depth: usize, out: &mut String) {
    indent(depth, out);
    match node {
        Node::Comment(body) => {
            let _ = writeln!(out, "<!--{body}-->");
        },
        Node::Declaration(text) => {
            out.push_str(text.trim());
            out.push('\n');
        },
        Node::Text(text) => {
            out.push_str(collapse(text, false).trim());
            out.push('\n');
        },
        Node::Element(e) => {
            out.push_str(&e.open_tag());
            if let Some(raw) = &e.raw {
                out.push_str(raw);
                out.push_str(&e.close_tag());
            } else if !e.is_void() {
                if e.children.iter().all(is_inline) {
                    let mut line = String::new();
                    render_inline(&e.children, &mut line);
                    out.push_str(line.trim());
                } else {
                    out.push('\n');
                    write_nodes(&e.children, depth + 1, out);
                    indent(depth, out);
                }
                out.push_str(&e.close_tag());
            }
            out.push('\n');
        },
    }
}

/// Re-indents rendered HTML.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pretty;

impl Step for Pretty {
    fn name(&self) -> &'static str {
        "pretty"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let formatted = pretty(asset.text()?);
        asset.set_text(formatted);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indents_blocks_and_keeps_inline_lines() {
        let html = "<!DOCTYPE html><html><head><title>Home</title><meta charset=\"utf-8\"></head>\n<body><main><h1>Hello <em>you</em>!</h1>\n\n<ul><li><a href=\"/\">Home</a></li><li>About</li></ul></main></body></html>";
        assert_eq!(
            pretty(html),
            "<!DOCTYPE html>\n<html>\n  <head>\n    <title>Home</title>\n    <meta charset=\"utf-8\">\n  </head>\n  <body>\n    <main>\n      <h1>Hello <em>you</em>!</h1>\n      <ul>\n        <li><a href=\"/\">Home</a></li>\n        <li>About</li>\n      </ul>\n    </main>\n  </body>\n</html>\n"
        );
    }

    #[test]
    fn test_raw_text_elements_verbatim() {
        let html = "<div><pre>  a\n    b</pre><script>if (a < b) {\n  go()\n}</script></div>";
        assert_eq!(
            pretty(html),
            "<div>\n  <pre>  a\n    b</pre>\n  <script>if (a < b) {\n  go()\n}</script>\n</div>\n"
        );
    }

    #[test]
    fn test_mixed_content_and_comments() {
        let html = "<section>intro <b>bold</b><!-- note --><p class=\"x\"\n   id='y'>text</p><svg><path d=\"M0 0\"/></svg></section>";
        assert_eq!(
            pretty(html),
            "<section>\n  intro <b>bold</b>\n  <!-- note -->\n  <p class=\"x\" id='y'>text</p>\n  <svg>\n    <path d=\"M0 0\" />\n  </svg>\n</section>\n"
        );
    }

    #[test]
    fn test_pretty_is_idempotent() {
        let html = "<body><div><span>a</span> <span>b</span><div>c</div></div><textarea> x </textarea></body>";
        let once = pretty(html);
        assert_eq!(pretty(&once), once);
    }
}

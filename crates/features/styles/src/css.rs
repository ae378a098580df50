//! A small CSS tree: enough structure for prefixing, sorting, media merging
//! and minification of compiled (plain) CSS.

use aflow_kernel::prelude::{Asset, Step, StepError};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self { property: property.into(), value: value.into(), important: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    /// Name without the `@`.
    pub name: String,
    pub prelude: String,
    pub items: Option<Vec<Item>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Declaration(Declaration),
    Rule(Rule),
    AtRule(AtRule),
    /// Comment body without the delimiters.
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Expanded,
    Compressed,
}

/// Parse failure with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.message)
    }
}

impl Stylesheet {
    /// Parses plain CSS.
    ///
    /// # Errors
    /// Returns a [`ParseError`] for unbalanced blocks, unterminated strings or
    /// comments and declarations without a colon.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut parser = Parser { src: source, bytes: source.as_bytes(), pos: 0 };
        let items = parser.items(false)?;
        Ok(Self { items })
    }

    #[must_use]
    pub fn to_css(&self, style: OutputStyle) -> String {
        let mut out = String::new();
        match style {
            OutputStyle::Expanded => {
                for (i, item) in self.items.iter().enumerate() {
                    if i > 0 && !matches!(item, Item::Comment(_)) {
                        out.push('\n');
                    }
                    write_expanded(item, 0, &mut out);
                }
            },
            OutputStyle::Compressed => write_compressed(&self.items, &mut out),
        }
        out
    }
}

/// Parses an asset, naming the file in errors.
pub(crate) fn parse_asset(asset: &Asset) -> Result<Stylesheet, StepError> {
    Stylesheet::parse(asset.text()?).map_err(|e| StepError::Transform {
        message: format!("{}:{e}", asset.display_name()).into(),
        context: None,
    })
}

/// Production minification.
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanCss;

impl Step for CleanCss {
    fn name(&self) -> &'static str {
        "clean-css"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let sheet = parse_asset(&asset)?;
        asset.set_text(sheet.to_css(OutputStyle::Compressed));
        Ok(asset)
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>, at: usize) -> ParseError {
        let before = &self.bytes[..at.min(self.bytes.len())];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let column = at - before.iter().rposition(|&b| b == b'\n').map_or(0, |p| p + 1) + 1;
        ParseError { message: message.into(), line, column }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_comment(&self) -> bool {
        self.bytes.get(self.pos) == Some(&b'/') && self.bytes.get(self.pos + 1) == Some(&b'*')
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn comment(&mut self) -> Result<&str, ParseError> {
        let start = self.pos;
        let body = start + 2;
        match self.src[body..].find("*/") {
            Some(end) => {
                self.pos = body + end + 2;
                Ok(&self.src[body..body + end])
            },
            None => Err(self.error("Unclosed comment", start)),
        }
    }

    fn string(&mut self, quote: u8) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'\n' => return Err(self.error("Unclosed string", start)),
                _ if b == quote => return Ok(()),
                _ => {},
            }
        }
        Err(self.error("Unclosed string", start))
    }

    /// Reads text up to one of `stops` at nesting depth zero, skipping
    /// comments. The stop byte is not consumed.
    fn chunk(&mut self, stops: &[u8]) -> Result<(String, Option<u8>), ParseError> {
        let mut text = String::new();
        let mut depth: Vec<(u8, usize)> = Vec::new();
        let mut from = self.pos;

        while let Some(b) = self.peek() {
            if depth.is_empty() && stops.contains(&b) {
                text.push_str(&self.src[from..self.pos]);
                return Ok((text, Some(b)));
            }
            match b {
                b'"' | b'\'' => self.string(b)?,
                b'/' if self.starts_comment() => {
                    text.push_str(&self.src[from..self.pos]);
                    self.comment()?;
                    text.push(' ');
                    from = self.pos;
                },
                b'(' | b'[' => {
                    depth.push((if b == b'(' { b')' } else { b']' }, self.pos));
                    self.pos += 1;
                },
                b')' | b']' => {
                    match depth.pop() {
                        Some((close, _)) if close == b => {},
                        _ => return Err(self.error(format!("Unexpected \"{}\"", b as char), self.pos)),
                    }
                    self.pos += 1;
                },
                _ => self.pos += 1,
            }
        }

        if let Some(&(close, at)) = depth.last() {
            return Err(self.error(format!("Missing \"{}\"", close as char), at));
        }
        text.push_str(&self.src[from..self.pos]);
        Ok((text, None))
    }

    fn items(&mut self, nested: bool) -> Result<Vec<Item>, ParseError> {
        let open = self.pos.saturating_sub(1);
        let mut items = Vec::new();

        loop {
            self.skip_ws();
            let Some(b) = self.peek() else {
                if nested {
                    return Err(self.error("Unclosed block", open));
                }
                return Ok(items);
            };

            match b {
                b'}' => {
                    if !nested {
                        return Err(self.error("Unexpected \"}\"", self.pos));
                    }
                    self.pos += 1;
                    return Ok(items);
                },
                b';' => self.pos += 1,
                b'/' if self.starts_comment() => {
                    let body = self.comment()?.to_owned();
                    items.push(Item::Comment(body));
                },
                b'@' => items.push(self.at_rule()?),
                _ => {
                    let start = self.pos;
                    let (text, stop) = self.chunk(b"{;}")?;
                    if stop == Some(b'{') {
                        self.pos += 1;
                        let items_in = self.items(true)?;
                        items.push(Item::Rule(Rule { selector: collapse_ws(&text), items: items_in }));
                    } else {
                        if stop == Some(b';') {
                            self.pos += 1;
                        }
                        items.push(Item::Declaration(declaration(&text).ok_or_else(|| {
                            self.error(format!("Unknown word \"{}\"", text.trim()), start)
                        })?));
                    }
                },
            }
        }
    }

    fn at_rule(&mut self) -> Result<Item, ParseError> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            self.pos += 1;
        }
        let name = self.src[start..self.pos].to_owned();
        if name.is_empty() {
            return Err(self.error("At-rule without name", start - 1));
        }

        let (prelude, stop) = self.chunk(b"{;}")?;
        let prelude = collapse_ws(&prelude);
        let items = match stop {
            Some(b'{') => {
                self.pos += 1;
                Some(self.items(true)?)
            },
            Some(b';') => {
                self.pos += 1;
                None
            },
            _ => None,
        };
        Ok(Item::AtRule(AtRule { name, prelude, items }))
    }
}

fn declaration(text: &str) -> Option<Declaration> {
    let (property, value) = text.split_once(':')?;
    let property = property.trim();
    if property.is_empty() || property.contains(char::is_whitespace) {
        return None;
    }

    let mut value = value.trim();
    let mut important = false;
    if let Some(bang) = value.rfind('!')
        && value[bang + 1..].trim().eq_ignore_ascii_case("important")
    {
        important = true;
        value = value[..bang].trim_end();
    }

    let value = if property.starts_with("--") { value.to_owned() } else { collapse_ws(value) };
    Some(Declaration { property: property.to_owned(), value, important })
}

/// Collapses whitespace runs outside strings into single spaces.
fn collapse_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote = None;
    let mut pending_space = false;

    for c in text.trim().chars() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        out.push(c);
    }
    out
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_expanded(item: &Item, depth: usize, out: &mut String) {
    indent(depth, out);
    match item {
        Item::Declaration(d) => {
            let _ = write!(out, "{}: {}", d.property, d.value);
            if d.important {
                out.push_str(" !important");
            }
            out.push_str(";\n");
        },
        Item::Comment(body) => {
            let _ = writeln!(out, "/*{body}*/");
        },
        Item::Rule(rule) => {
            let _ = writeln!(out, "{} {{", rule.selector);
            write_block(&rule.items, depth, out);
        },
        Item::AtRule(at) => {
            out.push('@');
            out.push_str(&at.name);
            if !at.prelude.is_empty() {
                out.push(' ');
                out.push_str(&at.prelude);
            }
            match &at.items {
                Some(items) => {
                    out.push_str(" {\n");
                    write_block(items, depth, out);
                },
                None => out.push_str(";\n"),
            }
        },
    }
}

fn write_block(items: &[Item], depth: usize, out: &mut String) {
    for item in items {
        write_expanded(item, depth + 1, out);
    }
    indent(depth, out);
    out.push_str("}\n");
}

fn write_compressed(items: &[Item], out: &mut String) {
    let mut previous_declaration = false;
    for item in items {
        match item {
            Item::Declaration(d) => {
                if previous_declaration {
                    out.push(';');
                }
                out.push_str(&d.property);
                out.push(':');
                if d.property.starts_with("--") {
                    out.push_str(&d.value);
                } else {
                    out.push_str(&minify_value(&d.value));
                }
                if d.important {
                    out.push_str("!important");
                }
                previous_declaration = true;
                continue;
            },
            Item::Comment(body) if body.starts_with('!') => {
                if previous_declaration {
                    out.push(';');
                }
                let _ = write!(out, "/*{body}*/");
            },
            Item::Comment(_) => continue,
            Item::Rule(rule) => {
                if previous_declaration {
                    out.push(';');
                }
                out.push_str(&minify_selector(&rule.selector));
                out.push('{');
                write_compressed(&rule.items, out);
                out.push('}');
            },
            Item::AtRule(at) => {
                if previous_declaration {
                    out.push(';');
                }
                out.push('@');
                out.push_str(&at.name);
                if !at.prelude.is_empty() {
                    out.push(' ');
                    out.push_str(&minify_value(&at.prelude));
                }
                match &at.items {
                    Some(items) => {
                        out.push('{');
                        write_compressed(items, out);
                        out.push('}');
                    },
                    None => out.push(';'),
                }
            },
        }
        previous_declaration = false;
    }
}

/// Drops spaces next to `chars` outside strings; the input is whitespace-collapsed.
fn tighten(text: &str, chars: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote = None;
    let mut iter = text.chars().peekable();

    while let Some(c) = iter.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            },
            ' ' if out.ends_with(chars) || iter.peek().is_some_and(|n| chars.contains(n)) => {},
            _ => out.push(c),
        }
    }
    out
}

fn minify_selector(selector: &str) -> String {
    tighten(selector, &[',', '>', '+', '~'])
}

fn minify_value(value: &str) -> String {
    let tight = tighten(value, &[',', ':']);
    strip_leading_zeros(&tight)
}

/// `0.5em` becomes `.5em`; digits inside identifiers are left alone.
fn strip_leading_zeros(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut quote = None;

    for (i, &c) in chars.iter().enumerate() {
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
        let boundary = i == 0 || matches!(chars[i - 1], ' ' | ',' | '(' | '-' | '+' | '/' | ':');
        let leading_zero = c == '0'
            && boundary
            && chars.get(i + 1) == Some(&'.')
            && chars.get(i + 2).is_some_and(char::is_ascii_digit)
            && !(i >= 2 && chars[i - 1] == '-' && chars[i - 2].is_alphanumeric());
        if !leading_zero {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules_and_at_rules() {
        let sheet = Stylesheet::parse(
            "@charset \"utf-8\";\n/* head */\na, b > c { color: red; margin: 0 !important }\n@media (min-width: 600px) { a { color: blue; } }",
        )
        .unwrap();

        assert_eq!(sheet.items.len(), 4);
        let Item::Rule(rule) = &sheet.items[2] else { panic!("expected rule") };
        assert_eq!(rule.selector, "a, b > c");
        assert_eq!(rule.items.len(), 2);
        let Item::Declaration(margin) = &rule.items[1] else { panic!("expected declaration") };
        assert!(margin.important);
        assert_eq!(margin.value, "0");
    }

    #[test]
    fn test_semicolons_inside_urls_and_strings() {
        let sheet = Stylesheet::parse("a { background: url(data:image/png;base64,AAA); content: \"a;b}\"; }").unwrap();
        let Item::Rule(rule) = &sheet.items[0] else { panic!("expected rule") };
        assert_eq!(rule.items.len(), 2);
    }

    #[test]
    fn test_parse_errors_carry_positions() {
        let err = Stylesheet::parse("a {\n  color: red;\n").unwrap_err();
        assert_eq!((err.line, err.column), (1, 3));
        assert_eq!(err.message, "Unclosed block");

        let err = Stylesheet::parse("a { color red; }").unwrap_err();
        assert!(err.message.starts_with("Unknown word"));

        assert!(Stylesheet::parse("a { color: red; }}").is_err());
    }

    #[test]
    fn test_expanded_output() {
        let sheet = Stylesheet::parse("a{color:red}@media screen{b{margin:0}}").unwrap();
        assert_eq!(
            sheet.to_css(OutputStyle::Expanded),
            "a {\n  color: red;\n}\n\n@media screen {\n  b {\n    margin: 0;\n  }\n}\n"
        );
    }

    #[test]
    fn test_compressed_output() {
        let sheet = Stylesheet::parse(
            "/*! keep */\n/* drop */\na ,  b > c {\n  margin: 0 auto;\n  opacity: 0.5;\n  color: rgba(0, 0, 0, 0.25) !important;\n}\n@media (min-width: 600px) {\n  a { top: -0.5em; }\n}\n",
        )
        .unwrap();
        assert_eq!(
            sheet.to_css(OutputStyle::Compressed),
            "/*! keep */a,b>c{margin:0 auto;opacity:.5;color:rgba(0,0,0,.25)!important}@media (min-width:600px){a{top:-.5em}}"
        );
    }

    #[test]
    fn test_expanded_is_stable() {
        let css = "a {\n  color: red;\n}\n\n@media print {\n  a {\n    color: black;\n  }\n}\n";
        let sheet = Stylesheet::parse(css).unwrap();
        assert_eq!(sheet.to_css(OutputStyle::Expanded), css);
    }
}

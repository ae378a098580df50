//! Token-level minification: comments and whitespace go, except `/*!`
//! license comments and the line breaks automatic semicolon insertion
//! depends on.

use crate::lexer::{Token, TokenKind, tokenize};
use aflow_kernel::prelude::{Asset, Step, StepError};

/// Keywords whose operand may not start on a new line.
const RESTRICTED: &[&str] = &["return", "throw", "break", "continue", "yield"];

/// Minifies `source`.
///
/// # Errors
/// Returns the tokenizer error for malformed input.
pub fn minify(source: &str) -> Result<String, crate::lexer::LexError> {
    let tokens = tokenize(source)?;
    let mut out = String::with_capacity(source.len() / 2);
    let mut previous: Option<Token<'_>> = None;
    let mut pending_newline = false;

    for token in tokens {
        if token.is_comment() {
            pending_newline |= token.newline_before || token.text.contains('\n');
            if token.kind == TokenKind::BlockComment && token.text.starts_with("/*!") {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(token.text);
                out.push('\n');
                pending_newline = false;
                previous = None;
            }
            continue;
        }

        let newline = pending_newline || token.newline_before;
        pending_newline = false;

        if let Some(prev) = previous {
            if newline && keeps_line_break(&prev, &token) {
                out.push('\n');
            } else if needs_space(&prev, &token) {
                out.push(' ');
            }
        }
        out.push_str(token.text);
        previous = Some(token);
    }
    Ok(out)
}

/// Whether dropping a line break between `prev` and `next` could change how
/// semicolons are inserted.
fn keeps_line_break(prev: &Token<'_>, next: &Token<'_>) -> bool {
    if prev.kind == TokenKind::Word && RESTRICTED.contains(&prev.text) {
        return true;
    }
    let ends_expression = match prev.kind {
        TokenKind::Punct => matches!(prev.text, ")" | "]" | "}" | "++" | "--"),
        _ => true,
    };
    let starts_statement = match next.kind {
        TokenKind::Punct => matches!(next.text, "{" | "++" | "--" | "!" | "~"),
        TokenKind::Template => false,
        _ => true,
    };
    ends_expression && starts_statement
}

fn needs_space(prev: &Token<'_>, next: &Token<'_>) -> bool {
    let (Some(last), Some(first)) = (prev.text.bytes().last(), next.text.bytes().next()) else {
        return false;
    };
    let word = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'\\') || b >= 0x80;

    (word(last) && word(first))
        || (last == b'+' && first == b'+')
        || (last == b'-' && first == b'-')
        || (last == b'/' && matches!(first, b'/' | b'*'))
        || (prev.kind == TokenKind::Number && first == b'.' && !prev.text.contains(['.', 'e', 'E', 'x', 'X']))
}

/// Production minification.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uglify;

impl Step for Uglify {
    fn name(&self) -> &'static str {
        "uglify"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let minified = minify(asset.text()?).map_err(|e| StepError::Transform {
            message: format!("{}:{e}", asset.display_name()).into(),
            context: None,
        })?;
        asset.set_text(minified);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_and_comments_removed() {
        let source = "// header\nfunction add(a, b) {\n  /* sum */\n  return a + b;\n}\n";
        assert_eq!(minify(source).unwrap(), "function add(a,b){return a+b;}");
    }

    #[test]
    fn test_license_comments_survive() {
        let source = "/*! lib v1 | MIT */\nvar x = 1;\n";
        assert_eq!(minify(source).unwrap(), "/*! lib v1 | MIT */\nvar x=1;");
    }

    #[test]
    fn test_asi_line_breaks_kept() {
        assert_eq!(minify("let a = 1\nlet b = a\n++b\n").unwrap(), "let a=1\nlet b=a\n++b");
        assert_eq!(minify("function f() {\n  return\n  42\n}").unwrap(), "function f(){return\n42}");
        assert_eq!(minify("const x = y\n  .map(f)\n  .filter(g)").unwrap(), "const x=y.map(f).filter(g)");
    }

    #[test]
    fn test_token_gluing_avoided() {
        assert_eq!(minify("a + +b; c - -d; e / /re/.source; 1 .toString()").unwrap(), "a+ +b;c- -d;e/ /re/.source;1 .toString()");
        assert_eq!(minify("typeof x === 'y'").unwrap(), "typeof x==='y'");
    }

    #[test]
    fn test_minify_is_idempotent() {
        let once = minify("if (a) {\n  b()\n}\nelse c = `t ${ d }`\n").unwrap();
        assert_eq!(minify(&once).unwrap(), once);
    }
}

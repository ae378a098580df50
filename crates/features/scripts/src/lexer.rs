//! A JavaScript tokenizer: just enough to find syntax errors the linter
//! reports and to drop whitespace and comments without changing meaning.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number,
    String,
    /// A complete template literal, substitutions included.
    Template,
    Regex,
    Punct,
    LineComment,
    BlockComment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: usize,
    pub column: usize,
    /// A line terminator separates this token from the previous one.
    pub newline_before: bool,
}

impl Token<'_> {
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    #[must_use]
    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == punct
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: &'static str,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.message)
    }
}

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==", "!=", "<=", ">=",
    "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which a `/` starts a regular expression.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do", "else", "yield",
    "await",
];

/// Tokenizes `source`, comments included.
///
/// # Errors
/// Returns a [`LexError`] for unterminated strings, templates, comments and
/// regular expressions.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    let mut context = SlashContext::default();

    while let Some(token) = lexer.next_token(context.regex_allowed())? {
        context.push(token);
        tokens.push(token);
    }
    Ok(tokens)
}

/// Keywords whose parenthesized head is followed by a statement.
const STATEMENT_HEADS: &[&str] = &["if", "while", "for", "with"];

/// Tracks what the tokens so far imply about a following `/`.
#[derive(Debug, Default)]
struct SlashContext<'a> {
    previous: Option<Token<'a>>,
    /// One entry per open bracket: whether its closer ends a statement head
    /// or a block, after which a statement (maybe a regex) starts.
    groups: Vec<bool>,
    closed_statement: bool,
}

impl<'a> SlashContext<'a> {
    fn regex_allowed(&self) -> bool {
        self.closed_statement || regex_allowed(self.previous.as_ref())
    }

    fn push(&mut self, token: Token<'a>) {
        if token.is_comment() {
            return;
        }
        self.closed_statement = false;
        if token.kind == TokenKind::Punct {
            match token.text {
                "(" => self.groups.push(
                    self.previous.is_some_and(|p| p.kind == TokenKind::Word && STATEMENT_HEADS.contains(&p.text)),
                ),
                "{" => self.groups.push(opens_block(self.previous.as_ref())),
                "[" => self.groups.push(false),
                ")" | "]" | "}" => self.closed_statement = self.groups.pop().unwrap_or(false),
                _ => {},
            }
        }
        self.previous = Some(token);
    }
}

fn regex_allowed(previous: Option<&Token<'_>>) -> bool {
    let Some(token) = previous else {
        return true;
    };
    match token.kind {
        TokenKind::Punct => !matches!(token.text, ")" | "]" | "}" | "++" | "--"),
        TokenKind::Word => REGEX_KEYWORDS.contains(&token.text),
        _ => false,
    }
}

/// A `{` opens a block unless it stands where an expression is expected
/// (object literals).
fn opens_block(previous: Option<&Token<'_>>) -> bool {
    match previous {
        None => true,
        Some(token) => match token.kind {
            TokenKind::Punct => matches!(token.text, ";" | "{" | "}" | ")" | "=>"),
            TokenKind::Word => matches!(token.text, "else" | "do" | "try" | "finally"),
            _ => false,
        },
    }
}

const fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'_' | b'$' | b'#' | b'\\') || b >= 0x80
}

const fn is_word_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'\\') || b >= 0x80
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let pos = if src.starts_with('\u{feff}') { 3 } else { 0 };
        Self { src, bytes: src.as_bytes(), pos, line: 1, line_start: pos }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if self.bytes.get(self.pos) == Some(&b'\n') {
            self.line += 1;
            self.line_start = self.pos + 1;
        }
        self.pos += 1;
    }

    fn column(&self) -> usize {
        self.pos - self.line_start + 1
    }

    /// Skips whitespace and reports whether a line break was crossed.
    fn skip_whitespace(&mut self) -> bool {
        let mut newline = false;
        while let Some(b) = self.peek_at(0) {
            if b == b'\n' {
                newline = true;
            } else if !b.is_ascii_whitespace() {
                break;
            }
            self.bump();
        }
        newline
    }

    fn next_token(&mut self, regex_allowed: bool) -> Result<Option<Token<'a>>, LexError> {
        let newline_before = self.skip_whitespace();
        let Some(b) = self.peek_at(0) else {
            return Ok(None);
        };
        let (start, line, column) = (self.pos, self.line, self.column());
        let fail = |message| LexError { message, line, column };
        let next = self.peek_at(1);

        let kind = match b {
            b'/' if next == Some(b'/') => {
                while self.peek_at(0).is_some_and(|c| c != b'\n') {
                    self.bump();
                }
                TokenKind::LineComment
            },
            b'/' if next == Some(b'*') => {
                let end = self.src[start + 2..].find("*/").ok_or_else(|| fail("Unterminated comment"))?;
                while self.pos < start + 2 + end + 2 {
                    self.bump();
                }
                TokenKind::BlockComment
            },
            b'"' | b'\'' => {
                self.bump();
                loop {
                    match self.peek_at(0) {
                        None | Some(b'\n') => return Err(fail("Unterminated string constant")),
                        Some(b'\\') => {
                            self.bump();
                            self.bump();
                        },
                        Some(c) => {
                            self.bump();
                            if c == b {
                                break;
                            }
                        },
                    }
                }
                TokenKind::String
            },
            b'`' => {
                self.bump();
                self.template().map_err(|()| fail("Unterminated template"))?;
                TokenKind::Template
            },
            b'/' if regex_allowed => {
                self.bump();
                let mut in_class = false;
                loop {
                    match self.peek_at(0) {
                        None | Some(b'\n') => return Err(fail("Unterminated regular expression")),
                        Some(b'\\') => {
                            self.bump();
                            self.bump();
                            continue;
                        },
                        Some(b'[') => in_class = true,
                        Some(b']') => in_class = false,
                        Some(b'/') if !in_class => {
                            self.bump();
                            break;
                        },
                        Some(_) => {},
                    }
                    self.bump();
                }
                while self.peek_at(0).is_some_and(is_word_part) {
                    self.bump();
                }
                TokenKind::Regex
            },
            b'0'..=b'9' => {
                self.number(start);
                TokenKind::Number
            },
            b'.' if next.is_some_and(|c| c.is_ascii_digit()) => {
                self.number(start);
                TokenKind::Number
            },
            _ if is_word_start(b) => {
                self.bump();
                while self.peek_at(0).is_some_and(is_word_part) {
                    self.bump();
                }
                TokenKind::Word
            },
            _ => {
                let rest = &self.src[start..];
                let len = PUNCTUATORS
                    .iter()
                    .find(|p| rest.starts_with(**p))
                    .filter(|p| !(**p == "?." && rest.as_bytes().get(2).is_some_and(u8::is_ascii_digit)))
                    .map_or(1, |p| p.len());
                for _ in 0..len {
                    self.bump();
                }
                TokenKind::Punct
            },
        };

        Ok(Some(Token { kind, text: &self.src[start..self.pos], line, column, newline_before }))
    }

    fn number(&mut self, start: usize) {
        let hex = matches!(self.src.get(start..start + 2), Some("0x" | "0X"));
        while let Some(c) = self.peek_at(0) {
            let exponent_sign =
                matches!(c, b'+' | b'-') && !hex && matches!(self.bytes[self.pos - 1], b'e' | b'E');
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Consumes a template literal after its opening backtick, including
    /// nested `${...}` substitutions.
    fn template(&mut self) -> Result<(), ()> {
        loop {
            match self.peek_at(0) {
                None => return Err(()),
                Some(b'\\') => {
                    self.bump();
                    self.bump();
                },
                Some(b'`') => {
                    self.bump();
                    return Ok(());
                },
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    self.bump();
                    self.bump();
                    self.substitution()?;
                },
                Some(_) => self.bump(),
            }
        }
    }

    fn substitution(&mut self) -> Result<(), ()> {
        let mut depth = 1usize;
        let mut context = SlashContext::default();
        loop {
            let token = self.next_token(context.regex_allowed()).map_err(|_| ())?.ok_or(())?;
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            context.push(token);
        }
    }
}

//! Script linting: parsing errors plus `no-debugger`.

use crate::lexer::{TokenKind, tokenize};
use aflow_kernel::prelude::{Asset, Step, StepError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// `None` for parsing errors, which have no rule id.
    pub rule: Option<&'static str>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.message)?;
        if let Some(rule) = self.rule {
            write!(f, " ({rule})")?;
        }
        Ok(())
    }
}

fn parsing(line: usize, column: usize, message: impl fmt::Display) -> Violation {
    Violation { line, column, message: format!("Parsing error: {message}"), rule: None }
}

/// Lints script source. A parsing error is the only violation reported for
/// that file.
#[must_use]
pub fn lint(source: &str) -> Vec<Violation> {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(e) => return vec![parsing(e.line, e.column, e.message)],
    };

    let mut violations = Vec::new();
    let mut stack: Vec<(&str, usize, usize)> = Vec::new();
    let mut previous: Option<&str> = None;

    for token in tokens.iter().filter(|t| !t.is_comment()) {
        match (token.kind, token.text) {
            (TokenKind::Punct, open @ ("{" | "(" | "[")) => {
                let close = match open {
                    "{" => "}",
                    "(" => ")",
                    _ => "]",
                };
                stack.push((close, token.line, token.column));
            },
            (TokenKind::Punct, close @ ("}" | ")" | "]")) => match stack.pop() {
                Some((expected, ..)) if expected == close => {},
                _ => return vec![parsing(token.line, token.column, format_args!("Unexpected token {close}"))],
            },
            (TokenKind::Word, "debugger") if !matches!(previous, Some("." | "?.")) => {
                violations.push(Violation {
                    line: token.line,
                    column: token.column,
                    message: "Unexpected 'debugger' statement.".to_owned(),
                    rule: Some("no-debugger"),
                });
            },
            _ => {},
        }
        previous = Some(token.text);
    }

    if let Some((close, line, column)) = stack.pop() {
        return vec![parsing(line, column, format_args!("'{close}' expected"))];
    }
    violations
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EsLint;

impl Step for EsLint {
    fn name(&self) -> &'static str {
        "eslint"
    }

    fn apply(&self, asset: Asset) -> Result<Asset, StepError> {
        let violations = lint(asset.text()?);
        if violations.is_empty() {
            return Ok(asset);
        }
        let name = asset.display_name();
        let report = violations.iter().map(|v| format!("{name}:{v}")).collect::<Vec<_>>().join("\n");
        Err(StepError::Lint { message: report.into(), context: None })
    }
}

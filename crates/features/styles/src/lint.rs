//! Stylesheet linting: a syntax check plus `block-no-empty` and
//! `no-extra-semicolons`, reported in stylelint's `line:col message (rule)` form.

use aflow_kernel::prelude::{Asset, Step, StepError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub rule: &'static str,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} ({})", self.line, self.column, self.message, self.rule)
    }
}

const SYNTAX: &str = "CssSyntaxError";
const BLOCK_NO_EMPTY: &str = "block-no-empty";
const NO_EXTRA_SEMICOLONS: &str = "no-extra-semicolons";

struct Frame {
    close: char,
    line: usize,
    column: usize,
    /// `#{...}` interpolation, exempt from `block-no-empty`.
    interpolation: bool,
    empty: bool,
}

/// Lints SCSS source text. A syntax error ends the scan; rule violations
/// before it are still reported.
#[must_use]
pub fn lint(source: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut chars = source.chars().peekable();
    let (mut line, mut column) = (1, 0);
    let mut last_significant: Option<char> = None;

    macro_rules! advance {
        () => {{
            let c = chars.next();
            if c == Some('\n') {
                line += 1;
                column = 0;
            } else if c.is_some() {
                column += 1;
            }
            c
        }};
    }
    macro_rules! syntax {
        ($line:expr, $column:expr, $($msg:tt)+) => {{
            violations.push(Violation { line: $line, column: $column, message: format!($($msg)+), rule: SYNTAX });
            return violations;
        }};
    }

    while let Some(c) = advance!() {
        if c.is_whitespace() {
            continue;
        }
        let (at_line, at_column) = (line, column);

        match c {
            '/' if chars.peek() == Some(&'*') => {
                advance!();
                let mut closed = false;
                let mut star = false;
                while let Some(n) = advance!() {
                    if star && n == '/' {
                        closed = true;
                        break;
                    }
                    star = n == '*';
                }
                if !closed {
                    syntax!(at_line, at_column, "Unclosed comment");
                }
                mark_content(&mut stack);
                continue;
            },
            '/' if chars.peek() == Some(&'/') && !in_parens(&stack) => {
                while chars.peek().is_some_and(|&n| n != '\n') {
                    advance!();
                }
                mark_content(&mut stack);
                continue;
            },
            '"' | '\'' => {
                let mut closed = false;
                while let Some(n) = advance!() {
                    match n {
                        '\\' => {
                            advance!();
                        },
                        '\n' => break,
                        _ if n == c => {
                            closed = true;
                            break;
                        },
                        _ => {},
                    }
                }
                if !closed {
                    syntax!(at_line, at_column, "Unclosed string");
                }
                mark_content(&mut stack);
            },
            '{' | '(' | '[' => {
                let interpolation = c == '{' && last_significant == Some('#');
                mark_content(&mut stack);
                let close = match c {
                    '{' => '}',
                    '(' => ')',
                    _ => ']',
                };
                stack.push(Frame { close, line: at_line, column: at_column, interpolation, empty: true });
            },
            '}' | ')' | ']' => match stack.pop() {
                Some(frame) if frame.close == c => {
                    if c == '}' && frame.empty && !frame.interpolation {
                        violations.push(Violation {
                            line: frame.line,
                            column: frame.column,
                            message: "Unexpected empty block".to_owned(),
                            rule: BLOCK_NO_EMPTY,
                        });
                    }
                    mark_content(&mut stack);
                },
                Some(frame) => {
                    syntax!(at_line, at_column, "Unexpected \"{c}\", expected \"{}\"", frame.close);
                },
                None => {
                    syntax!(at_line, at_column, "Unexpected \"{c}\"");
                },
            },
            ';' => {
                if matches!(last_significant, Some(';' | '{')) && !in_parens(&stack) {
                    violations.push(Violation {
                        line: at_line,
                        column: at_column,
                        message: "Unexpected extra semicolon".to_owned(),
                        rule: NO_EXTRA_SEMICOLONS,
                    });
                }
                mark_content(&mut stack);
            },
            _ => mark_content(&mut stack),
        }
        last_significant = Some(c);
    }

    if let Some(frame) = stack.last() {
        let message = if frame.close == '}' { "Unclosed block" } else { "Unclosed bracket" };
        syntax!(frame.line, frame.column, "{message}");
    }
    violations
}

fn mark_content(stack: &mut [Frame]) {
    if let Some(frame) = stack.last_mut() {
        frame.empty = false;
    }
}

fn in_parens(stack: &[Frame]) -> bool {
    stack.iter().any(|f| f.close == ')')
}

/// Fails the asset when [`lint`] reports anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct StyleLint;

impl Step for StyleLint {
    fn name(&self) -> &'static str {
        "stylelint"
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

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(source: &str) -> Vec<(usize, usize, &'static str)> {
        lint(source).into_iter().map(|v| (v.line, v.column, v.rule)).collect()
    }

    #[test]
    fn test_clean_scss_passes() {
        let source = "// header\n$c: #fff;\n.a {\n  color: $c;\n  &:hover { color: darken($c, 10%); }\n  .#{$name} { top: 0; }\n  background: url(//cdn.example.com/x.png);\n}\n";
        assert!(lint(source).is_empty(), "{:?}", lint(source));
    }

    #[test]
    fn test_empty_block() {
        assert_eq!(rules("a {\n}\nb { /* note */ }"), vec![(1, 3, BLOCK_NO_EMPTY)]);
    }

    #[test]
    fn test_extra_semicolons() {
        assert_eq!(rules("a { color: red;; }"), vec![(1, 16, NO_EXTRA_SEMICOLONS)]);
        assert_eq!(rules("a {; color: red; }"), vec![(1, 4, NO_EXTRA_SEMICOLONS)]);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(rules("a {\n  color: red;\n"), vec![(1, 3, SYNTAX)]);
        assert_eq!(rules("a { color: red; }\n}"), vec![(2, 1, SYNTAX)]);
        assert_eq!(rules("a { content: \"oops; }"), vec![(1, 14, SYNTAX)]);
        assert_eq!(rules("/* open"), vec![(1, 1, SYNTAX)]);
        assert_eq!(rules("a { width: calc(1px + 2px; }"), vec![(1, 28, SYNTAX)]);
    }

    #[test]
    fn test_step_reports_file_positions() {
        let asset = Asset::from_text("main.scss", "a {}\n");
        let err = StyleLint.apply(asset).unwrap_err();
        assert_eq!(err.to_string(), "main.scss:1:3 Unexpected empty block (block-no-empty)");
    }
}

//! External command-line tools as chain steps.
//!
//! The asset is written to the tool's stdin and replaced by its stdout.

use crate::asset::Asset;
use crate::step::{Step, StepError};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::debug;

const FILE_PLACEHOLDER: &str = "{file}";
const DIR_PLACEHOLDER: &str = "{dir}";
/// Stderr excerpts longer than this are truncated in failure messages.
const MAX_STDERR: usize = 4096;

#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: &'static str,
    program: String,
    args: Vec<String>,
}

impl ExternalTool {
    /// Builds a tool step from a configured command line.
    ///
    /// Returns `None` for an empty command, which disables the step.
    #[must_use]
    pub fn from_command(name: &'static str, command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self { name, program: program.clone(), args: args.to_vec() })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn expand_args(&self, asset: &Asset) -> Vec<String> {
        let file = asset.source.display().to_string();
        let dir = asset.source_dir().display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &file).replace(DIR_PLACEHOLDER, &dir))
            .collect()
    }
}

impl Step for ExternalTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let args = self.expand_args(&asset);
        debug!(tool = %self.program, ?args, asset = %asset.relative.display(), "Running external tool");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| StepError::Tool {
                context: Some(format!("failed to start `{}`", self.program).into()),
                source,
            })?;

        // Tools may emit output before draining stdin; feed it from its own thread.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = std::mem::take(&mut asset.contents);
            std::thread::spawn(move || match stdin.write_all(&input) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let output = child.wait_with_output().map_err(|source| StepError::Tool {
            context: Some(format!("failed to wait for `{}`", self.program).into()),
            source,
        })?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {},
                Ok(Err(source)) => {
                    return Err(StepError::Tool {
                        context: Some(format!("failed to write to `{}`", self.program).into()),
                        source,
                    });
                },
                Err(_) => {
                    return Err(StepError::Internal {
                        message: "stdin writer thread panicked".into(),
                        context: Some(self.program.clone().into()),
                    });
                },
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut detail = stderr.trim().to_owned();
            if detail.len() > MAX_STDERR {
                let cut = (0..=MAX_STDERR).rev().find(|&i| detail.is_char_boundary(i)).unwrap_or(0);
                detail.truncate(cut);
                detail.push_str("...");
            }
            let status = output.status.code().map_or_else(|| "signal".to_owned(), |c| c.to_string());
            return Err(StepError::Transform {
                message: format!("{}: `{}` exited with {status}: {detail}", asset.display_name(), self.program)
                    .into(),
                context: None,
            });
        }

        asset.contents = output.stdout;
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_empty_command_disables_step() {
        assert!(ExternalTool::from_command("sass", &[]).is_none());
        assert!(ExternalTool::from_command("sass", &cmd(&["  "])).is_none());
    }

    #[test]
    fn test_placeholders_expand() {
        let tool = ExternalTool::from_command("sass", &cmd(&["sass", "--load-path={dir}", "{file}"])).unwrap();
        let asset = Asset::new("/src/scss/main.scss", "main.scss", Vec::new());
        assert_eq!(tool.expand_args(&asset), vec!["--load-path=/src/scss", "/src/scss/main.scss"]);
    }

    #[test]
    fn test_missing_binary_is_tool_error() {
        let tool = ExternalTool::from_command("sass", &cmd(&["aflow-definitely-missing-binary"])).unwrap();
        let err = tool.apply(Asset::from_text("a.scss", "a{}")).unwrap_err();
        assert!(matches!(err, StepError::Tool { .. }));
        assert!(err.to_string().contains("aflow-definitely-missing-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_replaces_contents() {
        let tool = ExternalTool::from_command("upper", &cmd(&["tr", "a-z", "A-Z"])).unwrap();
        let out = tool.apply(Asset::from_text("a.js", "let x;")).unwrap();
        assert_eq!(out.contents, b"LET X;");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_transform_error() {
        let tool = ExternalTool::from_command("sh", &cmd(&["sh", "-c", "echo broken >&2; exit 3"])).unwrap();
        let err = tool.apply(Asset::from_text("a.scss", "a{}")).unwrap_err();
        assert!(matches!(err, StepError::Transform { .. }));
        assert!(err.to_string().contains("exited with 3: broken"));
    }
}

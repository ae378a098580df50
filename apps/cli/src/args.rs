//! # Command-line arguments
//!
//! Subcommands keep the task names users already type (`compileSass`,
//! `minJs`, ...) as aliases of their kebab-case names.

use aflow::domain::Mode;
use aflow_logger::{LevelFilter, LogFile};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "aflow")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Front-end asset pipeline: styles, scripts, templates and images")]
pub struct Cli {
    /// Build mode (development, production)
    #[arg(long, global = true, env = "AFLOW_MODE")]
    pub mode: Option<Mode>,

    /// Shorthand for --mode production
    #[arg(long, global = true)]
    pub production: bool,

    /// Configuration file (defaults to ./aflow.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to daily files in DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Write the log files as JSON lines
    #[arg(long, global = true, requires = "log_dir")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// `--production` wins, then `--mode`/`AFLOW_MODE`, then development.
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.production { Mode::Production } else { self.mode.unwrap_or_default() }
    }

    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO }
    }

    #[must_use]
    pub fn log_file(&self) -> Option<LogFile> {
        self.log_dir.as_ref().map(|dir| LogFile::new(dir).json(self.log_json))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Delete the output directory
    Clean,
    /// Compile stylesheets
    #[command(alias = "compileSass")]
    CompileSass,
    /// Lint, transpile and minify scripts
    #[command(alias = "minJs")]
    MinJs,
    /// Render page templates
    #[command(aliases = ["compilePug", "compile-templates"])]
    CompilePug,
    /// Optimize changed images
    #[command(alias = "minImages")]
    MinImages,
    /// Run the four transform tasks once
    Dev,
    /// Run the four transform tasks once (same as dev)
    Build,
    /// Rebuild on source changes until interrupted
    Watch,
    /// Serve the output directory with live reload
    #[command(aliases = ["browserInit", "serve"])]
    BrowserInit,
    /// Dev server plus watch
    Start,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aflow").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_aliases_resolve_to_commands() {
        assert_eq!(parse(&["compileSass"]).command, Command::CompileSass);
        assert_eq!(parse(&["minJs"]).command, Command::MinJs);
        assert_eq!(parse(&["compile-templates"]).command, Command::CompilePug);
        assert_eq!(parse(&["minImages"]).command, Command::MinImages);
        assert_eq!(parse(&["serve"]).command, Command::BrowserInit);
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(parse(&["build"]).mode(), Mode::Development);
        assert_eq!(parse(&["build", "--production"]).mode(), Mode::Production);
        assert_eq!(parse(&["--mode", "prod", "build"]).mode(), Mode::Production);
        assert_eq!(parse(&["--mode", "Development", "dev"]).mode(), Mode::Development);
    }

    #[test]
    fn test_production_flag_overrides_mode() {
        assert_eq!(parse(&["--mode", "development", "--production", "dev"]).mode(), Mode::Production);
        assert!(Cli::try_parse_from(["aflow", "--mode", "staging", "dev"]).is_err());
    }

    #[test]
    fn test_log_file_flags() {
        assert_eq!(parse(&["dev"]).log_file(), None);
        assert_eq!(parse(&["dev", "--log-dir", "logs"]).log_file(), Some(LogFile::new("logs")));
        assert_eq!(
            parse(&["--log-dir", "logs", "--log-json", "dev"]).log_file(),
            Some(LogFile::new("logs").json(true))
        );
        assert!(Cli::try_parse_from(["aflow", "--log-json", "dev"]).is_err());
    }
}

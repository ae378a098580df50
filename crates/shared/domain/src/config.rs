use crate::category::Category;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level pipeline configuration.
///
/// The build mode is deliberately absent: it comes from the command line or
/// environment, never from the config file.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfigInner {
    /// Directory all relative paths resolve against.
    pub project_root: PathBuf,
    pub paths: PathsConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
    pub tools: ToolsConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into tasks.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(flatten, default)]
    inner: Arc<PipelineConfigInner>,
}

impl Deref for PipelineConfig {
    type Target = PipelineConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PipelineConfig {
    fn deref_mut(&mut self) -> &mut PipelineConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Source globs per category plus output locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub styles: SourceConfig,
    pub scripts: SourceConfig,
    pub templates: SourceConfig,
    pub images: SourceConfig,
    pub output: OutputConfig,
}

impl PathsConfig {
    #[must_use]
    pub const fn source(&self, category: Category) -> &SourceConfig {
        match category {
            Category::Style => &self.styles,
            Category::Script => &self.scripts,
            Category::Template => &self.templates,
            Category::Image => &self.images,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub pattern: String,
    /// Glob patterns excluded from the source set.
    pub ignore: Vec<String>,
}

impl SourceConfig {
    fn new(pattern: &str, ignore: &[&str]) -> Self {
        Self {
            pattern: pattern.to_owned(),
            ignore: ignore.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub styles: PathBuf,
    pub scripts: PathBuf,
    pub templates: PathBuf,
    pub images: PathBuf,
    /// Source map directory, relative to each category's output directory.
    pub source_maps: String,
}

impl OutputConfig {
    #[must_use]
    pub fn dir(&self, category: Category) -> &PathBuf {
        match category {
            Category::Style => &self.styles,
            Category::Script => &self.scripts,
            Category::Template => &self.templates,
            Category::Image => &self.images,
        }
    }
}

/// Dev server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub live_reload: bool,
    /// Show the in-browser connection banner.
    pub notify: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

/// External tool command lines. An empty list disables the step.
///
/// `{file}` and `{dir}` in arguments expand to the source file and its directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub sass: Vec<String>,
    pub transpiler: Vec<String>,
    pub jpeg: Vec<String>,
    pub png: Vec<String>,
    pub gif: Vec<String>,
}

impl ToolsConfig {
    /// All tools switched off; steps fall back to pass-through.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { sass: Vec::new(), transpiler: Vec::new(), jpeg: Vec::new(), png: Vec::new(), gif: Vec::new() }
    }
}

// --- Default ---

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            styles: SourceConfig::new("src/assets/scss/**/*.scss", &[]),
            scripts: SourceConfig::new("src/assets/js/**/*.js", &[]),
            templates: SourceConfig::new("src/templates/**/*.html", &["**/_*.html"]),
            images: SourceConfig::new("src/assets/images/**/*", &[]),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            styles: PathBuf::from("dist/assets/css"),
            scripts: PathBuf::from("dist/assets/js"),
            templates: PathBuf::from("dist"),
            images: PathBuf::from("dist/assets/images"),
            source_maps: "sourcemaps".to_owned(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::LOCALHOST), port: 3000, live_reload: true, notify: false }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 200 }
    }
}

fn tool(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sass: tool(&["sass", "--stdin", "--no-source-map", "--load-path={dir}"]),
            transpiler: tool(&["esbuild", "--target=es2015", "--loader=js"]),
            jpeg: tool(&["cjpeg", "-quality", "80"]),
            png: tool(&["pngquant", "--quality=65-80", "--speed", "1", "-"]),
            gif: tool(&["gifsicle", "--optimize=3"]),
        }
    }
}

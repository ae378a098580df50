use crate::step::StepError;
use std::path::{Path, PathBuf};

/// An original source feeding a generated file, kept for source maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Path relative to the category source base, `/`-separated.
    pub name: String,
    pub content: String,
}

/// An in-memory file flowing through a step chain.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Physical source path; empty for synthetic assets.
    pub source: PathBuf,
    /// Output path relative to the category output directory.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
    pub origins: Vec<Origin>,
}

impl Asset {
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, relative: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self { source: source.into(), relative: relative.into(), contents, origins: Vec::new() }
    }

    /// Synthetic text asset, mostly for tests and examples.
    #[must_use]
    pub fn from_text(relative: impl Into<PathBuf>, text: &str) -> Self {
        Self::new(PathBuf::new(), relative, text.as_bytes().to_vec())
    }

    /// Contents as UTF-8 text.
    ///
    /// # Errors
    /// Returns [`StepError::Transform`] if the contents are not valid UTF-8.
    pub fn text(&self) -> Result<&str, StepError> {
        std::str::from_utf8(&self.contents).map_err(|e| StepError::Transform {
            message: format!("{} is not valid UTF-8: {e}", self.display_name()).into(),
            context: None,
        })
    }

    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }

    /// Records the current contents as the origin of everything produced from now on.
    ///
    /// # Errors
    /// Returns [`StepError::Transform`] if the contents are not valid UTF-8.
    pub fn capture_origin(&mut self) -> Result<(), StepError> {
        let content = self.text()?.to_owned();
        self.origins = vec![Origin { name: slash_path(&self.relative), content }];
        Ok(())
    }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.relative.set_extension(extension);
        self
    }

    /// Directory of the physical source, used for relative lookups.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Name used in user-facing messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.source.as_os_str().is_empty() {
            slash_path(&self.relative)
        } else {
            self.source.display().to_string()
        }
    }
}

/// Renders a relative path with `/` separators on every platform.
#[must_use]
pub fn slash_path(path: &Path) -> String {
    path.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_extension_rewrites_relative() {
        let asset = Asset::from_text("pages/about.scss", "a{}").with_extension("css");
        assert_eq!(asset.relative, PathBuf::from("pages/about.css"));
    }

    #[test]
    fn test_capture_origin_uses_slash_names() {
        let mut asset = Asset::from_text(Path::new("pages").join("home.js"), "let a;");
        asset.capture_origin().unwrap();
        assert_eq!(asset.origins[0].name, "pages/home.js");
        assert_eq!(asset.origins[0].content, "let a;");
    }

    #[test]
    fn test_invalid_utf8_is_transform_error() {
        let asset = Asset::new("a.css", "a.css", vec![0xff, 0xfe]);
        assert!(matches!(asset.text(), Err(StepError::Transform { .. })));
    }
}

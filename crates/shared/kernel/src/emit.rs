//! Writing chain results, with or without source maps depending on the mode.

use crate::asset::{Asset, slash_path};
use crate::report::TaskReport;
use crate::sourcemap::SourceMap;
use crate::task::{TaskError, TaskErrorExt};
use aflow_domain::Mode;
use aflow_storage::OutputRoot;
use std::path::{Path, PathBuf};

/// How a `sourceMappingURL` comment is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSyntax {
    /// `/*# sourceMappingURL=... */`
    Block,
    /// `//# sourceMappingURL=...`
    Line,
}

/// Writes assets below one output directory.
#[derive(Debug, Clone)]
pub struct Emitter {
    output: OutputRoot,
    maps_dir: String,
    syntax: CommentSyntax,
}

impl Emitter {
    #[must_use]
    pub fn new(output: OutputRoot, maps_dir: impl Into<String>, syntax: CommentSyntax) -> Self {
        Self { output, maps_dir: maps_dir.into(), syntax }
    }

    #[must_use]
    pub const fn output(&self) -> &OutputRoot {
        &self.output
    }

    /// Relative path of the map for an output file (`sourcemaps/app.css.map`).
    #[must_use]
    pub fn map_path(&self, relative: &Path) -> PathBuf {
        let mut name = relative.as_os_str().to_os_string();
        name.push(".map");
        Path::new(&self.maps_dir).join(name)
    }

    /// Writes the asset without a map.
    ///
    /// # Errors
    /// Returns [`TaskError::Storage`] on write failures.
    pub async fn write(&self, asset: &Asset, report: &mut TaskReport) -> Result<(), TaskError> {
        let outcome = self
            .output
            .write(&asset.relative, &asset.contents)
            .await
            .context(format!("Failed to write {}", asset.relative.display()))?;
        report.record_write(self.output.resolve(&asset.relative)?, outcome);
        Ok(())
    }

    /// Development writes the asset plus its map and a `sourceMappingURL`
    /// comment; production writes the bare asset and deletes a stale map.
    ///
    /// # Errors
    /// Returns [`TaskError::Storage`] on write failures.
    pub async fn emit(&self, mut asset: Asset, mode: Mode, report: &mut TaskReport) -> Result<(), TaskError> {
        let map_rel = self.map_path(&asset.relative);

        if !mode.source_maps() {
            self.write(&asset, report).await?;
            if self.output.remove(&map_rel).await? {
                report.removed.push(self.output.resolve(&map_rel)?);
            }
            return Ok(());
        }

        let generated = String::from_utf8_lossy(&asset.contents).into_owned();
        let file_name = asset.relative.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let map = SourceMap::line_identity(file_name, &asset.origins, &generated);
        let json = map.to_json().map_err(|e| TaskError::Internal {
            message: e.to_string().into(),
            context: Some("Failed to serialize source map".into()),
        })?;

        let url = map_url(&asset.relative, &map_rel);
        let comment = match self.syntax {
            CommentSyntax::Block => format!("\n/*# sourceMappingURL={url} */\n"),
            CommentSyntax::Line => format!("\n//# sourceMappingURL={url}\n"),
        };
        let mut text = generated.trim_end().to_owned();
        text.push_str(&comment);
        asset.set_text(text);

        self.write(&asset, report).await?;

        let outcome = self
            .output
            .write(&map_rel, json.as_bytes())
            .await
            .context(format!("Failed to write {}", map_rel.display()))?;
        report.record_write(self.output.resolve(&map_rel)?, outcome);
        Ok(())
    }
}

/// Map location relative to the generated file's directory.
fn map_url(relative: &Path, map_rel: &Path) -> String {
    let depth = relative.parent().map_or(0, |p| p.components().count());
    let mut url = "../".repeat(depth);
    url.push_str(&slash_path(map_rel));
    url
}

//! Source map v3 documents.
//!
//! Maps are line-granular: generated line `n` points at line `n` of the first
//! origin, clamped to the origin's length. That is exact for line-preserving
//! transforms and a useful approximation for compilers that reflow output.

use crate::asset::Origin;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Builds a line-identity map for `generated` against `origins`.
    #[must_use]
    pub fn line_identity(file: impl Into<String>, origins: &[Origin], generated: &str) -> Self {
        let source_lines = origins.first().map_or(0, |o| o.content.lines().count().max(1));
        let generated_lines = generated.lines().count().max(1);

        Self {
            version: 3,
            file: file.into(),
            sources: origins.iter().map(|o| o.name.clone()).collect(),
            sources_content: origins.iter().map(|o| o.content.clone()).collect(),
            names: Vec::new(),
            mappings: line_mappings(generated_lines, source_lines),
        }
    }

    /// # Errors
    /// Returns a serialization error; never expected for well-formed maps.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `AAAA` maps column 0 of the first line to line 0 of source 0; each following
/// `AACA` advances the source line by one. Lines past the source stay unmapped.
fn line_mappings(generated_lines: usize, source_lines: usize) -> String {
    (0..generated_lines)
        .map(|line| match line {
            _ if line >= source_lines => "",
            0 => "AAAA",
            _ => "AACA",
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(content: &str) -> Vec<Origin> {
        vec![Origin { name: "main.scss".to_owned(), content: content.to_owned() }]
    }

    #[test]
    fn test_identity_mappings() {
        let map = SourceMap::line_identity("main.css", &origin("a\nb\nc"), "x\ny\nz");
        assert_eq!(map.mappings, "AAAA;AACA;AACA");
    }

    #[test]
    fn test_mappings_clamped_to_source() {
        let map = SourceMap::line_identity("main.css", &origin("a"), "x\ny\nz");
        assert_eq!(map.mappings, "AAAA;;");
    }

    #[test]
    fn test_json_shape() {
        let map = SourceMap::line_identity("app.js", &origin("let a;"), "let a;");
        let value: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["sources"][0], "main.scss");
        assert_eq!(value["sourcesContent"][0], "let a;");
        assert_eq!(value["file"], "app.js");
    }
}

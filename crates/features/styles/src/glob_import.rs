//! Expands globbed `@import`, `@use` and `@forward` statements into one
//! statement per matching stylesheet.

use aflow_kernel::asset::slash_path;
use aflow_kernel::prelude::{Asset, Step, StepError};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DIRECTIVES: &[&str] = &["@import", "@use", "@forward"];
const STYLE_EXTENSIONS: &[&str] = &["scss", "sass", "css"];

#[derive(Debug, Default, Clone, Copy)]
pub struct GlobImport;

impl Step for GlobImport {
    fn name(&self) -> &'static str {
        "sass-glob"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
        let text = asset.text()?;
        if !text.contains(['*', '?', '[']) {
            return Ok(asset);
        }
        let expanded = expand(text, asset.source_dir(), Some(asset.source.as_path()))?;
        asset.set_text(expanded);
        Ok(asset)
    }
}

/// Rewrites every globbed directive line of `source`, resolving patterns
/// against `dir`. `current` is never imported into itself.
///
/// # Errors
/// Returns [`StepError::Transform`] for malformed glob patterns.
pub fn expand(source: &str, dir: &Path, current: Option<&Path>) -> Result<String, StepError> {
    let mut out = String::with_capacity(source.len());

    for line in source.split_inclusive('\n') {
        match parse_directive(line) {
            Some(directive) if has_magic(directive.url) => {
                let files = matching_files(dir, directive.url, current)?;
                let indent = &line[..line.len() - line.trim_start().len()];
                for file in files {
                    out.push_str(indent);
                    out.push_str(directive.keyword);
                    out.push(' ');
                    out.push(directive.quote);
                    out.push_str(&file);
                    out.push(directive.quote);
                    out.push_str(directive.suffix);
                    out.push_str(";\n");
                }
            },
            _ => out.push_str(line),
        }
    }
    Ok(out)
}

struct Directive<'a> {
    keyword: &'static str,
    quote: char,
    url: &'a str,
    /// Whatever follows the URL, e.g. ` as *`.
    suffix: &'a str,
}

fn parse_directive(line: &str) -> Option<Directive<'_>> {
    let trimmed = line.trim();
    let keyword = *DIRECTIVES.iter().find(|k| {
        trimmed.strip_prefix(**k).is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })?;
    let rest = trimmed[keyword.len()..].trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let close = rest[1..].find(quote)? + 1;
    let url = &rest[1..close];
    let suffix = rest[close + 1..].trim_end().trim_end_matches(';').trim_end();
    Some(Directive { keyword, quote, url, suffix })
}

fn has_magic(url: &str) -> bool {
    url.contains(['*', '?', '['])
}

fn matching_files(dir: &Path, url: &str, current: Option<&Path>) -> Result<Vec<String>, StepError> {
    let pattern = Pattern::new(url).map_err(|e| StepError::Transform {
        message: format!("Invalid import glob \"{url}\": {e}").into(),
        context: None,
    })?;
    let has_extension = Path::new(url).extension().is_some();
    let options = MatchOptions { require_literal_separator: true, ..MatchOptions::new() };

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| current.is_none_or(|c| c != path.as_path()))
        .filter_map(|path| path.strip_prefix(dir).ok().map(Path::to_path_buf))
        .filter(|rel| {
            let Some(ext) = rel.extension().and_then(|e| e.to_str()) else {
                return false;
            };
            if !STYLE_EXTENSIONS.contains(&ext) {
                return false;
            }
            let candidate = if has_extension { rel.clone() } else { rel.with_extension("") };
            pattern.matches_path_with(&candidate, options) || pattern.matches_path_with(&unpartial(&candidate), options)
        })
        .collect();

    files.sort();
    Ok(files.iter().map(|p| slash_path(p)).collect())
}

/// `parts/_btn` matches `parts/*btn` patterns written without the underscore.
fn unpartial(path: &Path) -> PathBuf {
    match path.file_name().and_then(|n| n.to_str()).and_then(|n| n.strip_prefix('_')) {
        Some(name) => path.with_file_name(name),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for rel in ["parts/_buttons.scss", "parts/_forms.scss", "parts/notes.md", "components/cards/_card.scss"] {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        tmp
    }

    #[test]
    fn test_expands_sorted_per_file() {
        let tmp = fixture();
        let out = expand("@import \"parts/*\";\n.a { top: 0; }\n", tmp.path(), None).unwrap();
        assert_eq!(out, "@import \"parts/_buttons.scss\";\n@import \"parts/_forms.scss\";\n.a { top: 0; }\n");
    }

    #[test]
    fn test_recursive_use_keeps_suffix_and_quotes() {
        let tmp = fixture();
        let out = expand("  @use 'components/**/*' as *;\n", tmp.path(), None).unwrap();
        assert_eq!(out, "  @use 'components/cards/_card.scss' as *;\n");
    }

    #[test]
    fn test_plain_imports_untouched() {
        let tmp = fixture();
        let source = "@import \"parts/buttons\";\n@forward \"src/list\" hide list-reset;\n";
        assert_eq!(expand(source, tmp.path(), None).unwrap(), source);
    }

    #[test]
    fn test_no_match_drops_statement() {
        let tmp = fixture();
        assert_eq!(expand("@import \"missing/*\";\n", tmp.path(), None).unwrap(), "");
    }

    #[test]
    fn test_importing_file_is_excluded() {
        let tmp = fixture();
        let current = tmp.path().join("parts/_forms.scss");
        let out = expand("@import \"parts/*\";\n", tmp.path(), Some(current.as_path())).unwrap();
        assert_eq!(out, "@import \"parts/_buttons.scss\";\n");
    }
}

//! Source discovery: registry patterns compiled into a base directory plus globs.

use crate::task::{TaskError, TaskErrorExt};
use aflow_domain::RegistryEntry;
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

const MATCH_OPTIONS: MatchOptions =
    MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: false };

/// A discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the glob base directory.
    pub relative: PathBuf,
    pub modified: Option<SystemTime>,
}

/// A compiled source selection: `base` is the literal directory prefix of the
/// pattern, the remaining glob is matched against paths relative to it.
#[derive(Debug, Clone)]
pub struct SourceGlob {
    root: PathBuf,
    base: PathBuf,
    pattern: Pattern,
    /// `pattern` with a leading `**/` removed, so `**/*.js` also matches `app.js`.
    shallow: Option<Pattern>,
    ignore: Vec<Pattern>,
}

impl SourceGlob {
    /// Compiles a registry entry against the project root.
    ///
    /// # Errors
    /// Returns [`TaskError::Pattern`] for invalid glob syntax.
    pub fn from_entry(root: &Path, entry: &RegistryEntry) -> Result<Self, TaskError> {
        Self::new(root, &entry.source.pattern, &entry.source.ignore)
    }

    /// # Errors
    /// Returns [`TaskError::Pattern`] for invalid glob syntax.
    pub fn new(root: &Path, pattern: &str, ignore: &[String]) -> Result<Self, TaskError> {
        let pattern = clean_pattern(pattern);
        let (base, glob) = split_base(&pattern);
        let glob = if glob.is_empty() { "**/*".to_owned() } else { glob };

        let shallow = match glob.strip_prefix("**/") {
            Some(rest) => Some(Pattern::new(rest).context(format!("Invalid pattern: {pattern}"))?),
            None => None,
        };

        let ignore = ignore
            .iter()
            .map(|p| {
                let p = clean_pattern(p.trim_start_matches('!'));
                Pattern::new(&p).context(format!("Invalid ignore pattern: {p}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            base: root.join(base),
            pattern: Pattern::new(&glob).context(format!("Invalid pattern: {pattern}"))?,
            shallow,
            ignore,
        })
    }

    /// Directory the walk and the watcher start from.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether `path` (absolute, or relative to the project root) is selected.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let path = if path.is_absolute() || path.starts_with(&self.root) {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let Ok(relative) = path.strip_prefix(&self.base) else {
            return false;
        };
        self.matches_relative(relative) && !self.is_ignored(&path)
    }

    /// Like [`matches`](Self::matches) but without the ignore list: ignored
    /// files (layouts, partials) still feed the files that are built.
    #[must_use]
    pub fn covers(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base).is_ok_and(|relative| self.matches_relative(relative))
    }

    fn matches_relative(&self, relative: &Path) -> bool {
        self.pattern.matches_path_with(relative, MATCH_OPTIONS)
            || self.shallow.as_ref().is_some_and(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let from_root = path.strip_prefix(&self.root).unwrap_or(path);
        let from_base = path.strip_prefix(&self.base).unwrap_or(path);
        self.ignore.iter().any(|p| {
            p.matches_path_with(from_root, MATCH_OPTIONS)
                || p.matches_path_with(from_base, MATCH_OPTIONS)
                || p.as_str().strip_prefix("**/").and_then(|rest| Pattern::new(rest).ok()).is_some_and(
                    |rest| path.file_name().is_some_and(|name| rest.matches_path_with(Path::new(name), MATCH_OPTIONS)),
                )
        })
    }

    /// Walks the base directory and returns matching files sorted by relative path.
    ///
    /// # Errors
    /// Returns [`TaskError::Walk`] when the base directory is missing or unreadable.
    pub fn discover(&self) -> Result<Vec<SourceFile>, TaskError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.base).follow_links(true) {
            let entry = entry.context(format!("Failed to read sources under {}", self.base.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !self.matches(path) {
                continue;
            }
            let relative = path.strip_prefix(&self.base).unwrap_or(path).to_path_buf();
            let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
            files.push(SourceFile { path: path.to_path_buf(), relative, modified });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        Ok(files)
    }

    /// [`discover`](Self::discover) on the blocking pool.
    ///
    /// # Errors
    /// See [`discover`](Self::discover).
    pub async fn discover_async(&self) -> Result<Vec<SourceFile>, TaskError> {
        let glob = self.clone();
        tokio::task::spawn_blocking(move || glob.discover()).await?
    }
}

/// Partials (`_name.ext`) are inputs for other files, never standalone outputs.
#[must_use]
pub fn is_partial(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with('_'))
}

fn clean_pattern(pattern: &str) -> String {
    pattern.trim().trim_start_matches("./").to_owned()
}

fn has_magic(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Splits `src/assets/js/**/*.js` into (`src/assets/js`, `**/*.js`).
fn split_base(pattern: &str) -> (PathBuf, String) {
    let mut base = PathBuf::new();
    let mut rest = Vec::new();
    let mut in_glob = false;

    for component in Path::new(pattern).components() {
        let Component::Normal(segment) = component else {
            if !in_glob {
                base.push(component.as_os_str());
            }
            continue;
        };
        let segment = segment.to_string_lossy();
        if in_glob || has_magic(&segment) {
            in_glob = true;
            rest.push(segment.into_owned());
        } else {
            base.push(segment.as_ref());
        }
    }

    if rest.is_empty() {
        // A literal file path: base is its directory, the glob its name.
        let name = base.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        base.pop();
        return (base, Pattern::escape(&name));
    }

    (base, rest.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn test_split_base() {
        assert_eq!(split_base("src/assets/js/**/*.js"), (PathBuf::from("src/assets/js"), "**/*.js".to_owned()));
        assert_eq!(split_base("src/*.css"), (PathBuf::from("src"), "*.css".to_owned()));
        assert_eq!(split_base("src/app.js"), (PathBuf::from("src"), "app.js".to_owned()));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "src/js/b.js");
        touch(tmp.path(), "src/js/a.js");
        touch(tmp.path(), "src/js/lib/c.js");
        touch(tmp.path(), "src/js/readme.md");

        let glob = SourceGlob::new(tmp.path(), "./src/js/**/*.js", &[]).unwrap();
        let files = glob.discover().unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("a.js"), PathBuf::from("b.js"), PathBuf::from("lib/c.js")]);
        assert!(files.iter().all(|f| f.modified.is_some()));
    }

    #[test]
    fn test_ignore_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "src/templates/index.html");
        touch(tmp.path(), "src/templates/_layout.html");
        touch(tmp.path(), "src/templates/blog/_card.html");

        let glob =
            SourceGlob::new(tmp.path(), "src/templates/**/*.html", &["!./src/templates/**/_*.html".to_owned()]).unwrap();
        let files = glob.discover().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, PathBuf::from("index.html"));

        let relative_ignore = SourceGlob::new(tmp.path(), "src/templates/**/*.html", &["**/_*.html".to_owned()]).unwrap();
        assert_eq!(relative_ignore.discover().unwrap().len(), 1);
    }

    #[test]
    fn test_matches_absolute_and_relative() {
        let root = Path::new("/site");
        let glob = SourceGlob::new(root, "src/assets/scss/**/*.scss", &[]).unwrap();
        assert!(glob.matches(Path::new("/site/src/assets/scss/main.scss")));
        assert!(glob.matches(Path::new("src/assets/scss/parts/_btn.scss")));
        assert!(!glob.matches(Path::new("/site/src/assets/js/main.js")));
        assert!(!glob.matches(Path::new("/elsewhere/main.scss")));
    }

    #[test]
    fn test_covers_ignores_ignore_list() {
        let root = Path::new("/site");
        let glob = SourceGlob::new(root, "src/templates/**/*.html", &["**/_*.html".to_owned()]).unwrap();
        let layout = Path::new("/site/src/templates/_layout.html");
        assert!(!glob.matches(layout));
        assert!(glob.covers(layout));
        assert!(!glob.covers(Path::new("/site/src/templates/notes.txt")));
    }

    #[test]
    fn test_missing_base_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let glob = SourceGlob::new(tmp.path(), "src/nope/**/*", &[]).unwrap();
        assert!(matches!(glob.discover(), Err(TaskError::Walk { .. })));
    }

    proptest! {
        #[test]
        fn prop_underscore_names_are_partials(stem in "[a-z0-9-]{1,12}", dir in "[a-z]{1,8}") {
            let partial = PathBuf::from(&dir).join(format!("_{stem}.html"));
            let page = PathBuf::from(&dir).join(format!("{stem}.html"));
            prop_assert!(is_partial(&partial));
            prop_assert!(!is_partial(&page));
        }
    }
}

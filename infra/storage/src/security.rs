use crate::error::{StorageError, StorageErrorExt};
use std::path::{Component, Path, PathBuf};

/// Collapse `.` / `..` lexically while ensuring the path never escapes the sandbox root.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StorageError::PathTraversalAttempt {
                        message: path.display().to_string().into(),
                        context: Some("Path attempted to escape sandbox via '..'".into()),
                    });
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversalAttempt {
                    message: path.display().to_string().into(),
                    context: Some("Absolute paths are not allowed in sandbox".into()),
                });
            },
        }
    }

    Ok(out)
}

/// Turns `root` into an absolute physical path, even if it does not exist yet.
///
/// The nearest existing ancestor is canonicalized and the missing tail is appended.
pub(crate) fn absolutize(root: &Path) -> Result<PathBuf, StorageError> {
    let absolute = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir().context("Failed to read current directory")?.join(root)
    };

    let mut tail = Vec::new();
    let mut current = absolute.as_path();
    loop {
        if current.exists() {
            let mut resolved = current
                .canonicalize()
                .context(format!("Failed to resolve output root: {}", current.display()))?;
            for segment in tail.iter().rev() {
                resolved.push(segment);
            }
            return Ok(resolved);
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                current = parent;
            },
            _ => return Ok(absolute),
        }
    }
}

/// Safely joins a path to the root and ensures it doesn't escape the sandbox.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();

    if path.is_absolute() {
        return Err(StorageError::PathTraversalAttempt {
            message: format!("Absolute paths are not allowed in sandbox {}", path.display()).into(),
            context: None,
        });
    }

    let safe_rel = normalize_relative(path)?;
    if safe_rel.as_os_str().is_empty() {
        return Err(StorageError::PathTraversalAttempt {
            message: path.display().to_string().into(),
            context: Some("Path resolves to the sandbox root itself".into()),
        });
    }
    let joined = root.join(safe_rel);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_path(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Path attempted to escape sandbox via a symlink".into()),
        })
    }
}

/// Validates a path that doesn't exist yet through its first existing ancestor.
///
/// Reaching the root itself (existing or not) is accepted.
fn validate_path(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    if !joined.starts_with(root) {
        return Err(StorageError::PathTraversalAttempt {
            message: joined.display().to_string().into(),
            context: Some("Path is outside sandbox boundaries".into()),
        });
    }

    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_inner_parent() {
        let out = normalize_relative(Path::new("css/../js/./app.js")).unwrap();
        assert_eq!(out, PathBuf::from("js/app.js"));
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert!(normalize_relative(Path::new("../app.js")).is_err());
        assert!(normalize_relative(Path::new("a/../../app.js")).is_err());
    }

    #[test]
    fn test_absolutize_missing_tail() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("dist/assets");
        let resolved = absolutize(&missing).unwrap();
        let base = tmp.path().canonicalize().unwrap();
        assert_eq!(resolved, base.join("dist").join("assets"));
    }
}

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

pub(crate) const TMP_MARKER: &str = ".aflowtmp.";

const STALE_AFTER: Duration = Duration::from_secs(300);

pub(crate) async fn purge_tmp(root: &Path) {
    if !root.exists() {
        return;
    }
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now, STALE_AFTER)).await {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up temporary files");
        },
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
        },
        _ => {},
    }
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root).into_iter().flatten().filter(|e| is_tmp(e) && is_stale(e, now, threshold)).for_each(
        |entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove stale temp file");
                failed += 1;
            },
        },
    );

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_stale_only_touches_tmp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let keep = tmp.path().join("app.css");
        let orphan = tmp.path().join(format!("app.css{TMP_MARKER}7"));
        std::fs::write(&keep, "a{}").unwrap();
        std::fs::write(&orphan, "partial").unwrap();

        let later = SystemTime::now() + Duration::from_secs(3600);
        let (removed, failed) = remove_stale(tmp.path(), later, STALE_AFTER);

        assert_eq!((removed, failed), (1, 0));
        assert!(keep.exists());
        assert!(!orphan.exists());
    }

    #[test]
    fn test_fresh_tmp_files_survive() {
        let tmp = tempfile::tempdir().unwrap();
        let in_flight = tmp.path().join(format!("app.js{TMP_MARKER}1"));
        std::fs::write(&in_flight, "x").unwrap();

        let (removed, _) = remove_stale(tmp.path(), SystemTime::now(), STALE_AFTER);
        assert_eq!(removed, 0);
        assert!(in_flight.exists());
    }
}

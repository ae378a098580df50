use aflow_storage::*;
use tempfile::TempDir;

async fn open(temp: &TempDir) -> OutputRoot {
    OutputRoot::builder().root(temp.path().join("dist")).open().await.unwrap()
}

#[tokio::test]
async fn test_path_traversal_blocked() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    assert!(output.resolve("../etc/passwd").is_err());
    assert!(output.resolve("assets/../../secret").is_err());
    assert!(output.resolve("/etc/passwd").is_err());
    assert!(output.resolve(".").is_err());
}

#[tokio::test]
async fn test_open_does_not_create_root() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;
    assert!(!output.root().exists());

    let created = OutputRoot::builder().root(temp.path().join("out")).create(true).open().await.unwrap();
    assert!(created.root().is_dir());
}

#[tokio::test]
async fn test_write_reports_outcomes() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    assert_eq!(output.write("assets/js/app.js", b"a()").await.unwrap(), WriteOutcome::Created);
    assert_eq!(output.write("assets/js/app.js", b"a()").await.unwrap(), WriteOutcome::Unchanged);
    assert_eq!(output.write("assets/js/app.js", b"b()").await.unwrap(), WriteOutcome::Updated);

    assert_eq!(output.read("assets/js/app.js").await.unwrap(), b"b()");
    assert!(output.exists("assets/js/app.js").unwrap());
}

#[tokio::test]
async fn test_unchanged_write_keeps_mtime() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    output.write("index.html", b"<p></p>").await.unwrap();
    let path = output.resolve("index.html").unwrap();
    let before = std::fs::metadata(&path).unwrap().modified().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    output.write("index.html", b"<p></p>").await.unwrap();

    let after = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_no_tmp_files_left_behind() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    output.write("a/b/c.css", b"x{}").await.unwrap();
    let names: Vec<_> = std::fs::read_dir(output.root().join("a/b"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["c.css".to_owned()]);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    output.write("sourcemaps/app.css.map", b"{}").await.unwrap();
    assert!(output.remove("sourcemaps/app.css.map").await.unwrap());
    assert!(!output.remove("sourcemaps/app.css.map").await.unwrap());
}

#[tokio::test]
async fn test_clean_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    assert!(!output.clean().await.unwrap(), "cleaning a missing root succeeds");

    output.write("assets/css/app.css", b"a{}").await.unwrap();
    assert!(output.clean().await.unwrap());
    assert!(!output.root().exists());
    assert!(!output.clean().await.unwrap());
}

#[tokio::test]
async fn test_read_missing_returns_file_not_found() {
    let temp = TempDir::new().unwrap();
    let output = open(&temp).await;

    let err = output.read("missing.js").await.expect_err("expected error");
    match err {
        StorageError::FileNotFound { .. } => {},
        other => panic!("unexpected error: {other:?}"),
    }
}

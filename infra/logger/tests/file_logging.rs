use aflow_logger::{LevelFilter, LogFile, Logger, LoggerError};
use std::fs;
use std::path::Path;

fn log_lines(dir: &Path) -> Vec<String> {
    let file = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().is_some_and(|ext| ext == "log"))
        .expect("a daily log file");
    let name = file.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("aflow-test."), "{name}");
    fs::read_to_string(file).unwrap().lines().map(str::to_owned).collect()
}

// One subscriber per process, so installing and re-installing share a test.
#[test]
fn json_log_directory_and_single_install() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("logs");

    let logger = Logger::builder()
        .name("aflow-test")
        .console(false)
        .level(LevelFilter::INFO)
        .env_filter("info")
        .file(LogFile::new(&dir).json(true))
        .init()
        .unwrap();
    assert!(logger.writes_files());

    tracing::warn!(task = "compileSass", kind = "Compile", "Task failed");
    tracing::debug!(task = "compileSass", "Below the level");

    let again = Logger::builder().init().unwrap_err();
    assert!(matches!(again, LoggerError::Subscriber { .. }));

    drop(logger);

    let lines = log_lines(&dir);
    assert_eq!(lines.len(), 1, "{lines:?}");
    let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["level"], "WARN");
    assert_eq!(record["fields"]["message"], "Task failed");
    assert_eq!(record["fields"]["task"], "compileSass");
}

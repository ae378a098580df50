use aflow::domain::config::ToolsConfig;
use aflow::domain::{Category, Mode, PipelineConfig};
use aflow::kernel::notify::MemoryNotifier;
use aflow::{Pipeline, ReloadRequested};
use aflow::event_bus::EventReceiverExt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A project with every source directory present.
fn project(root: &Path) {
    for dir in ["src/assets/scss", "src/assets/js", "src/templates", "src/assets/images"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}

async fn pipeline(root: &Path) -> (Pipeline, Arc<MemoryNotifier>) {
    let mut config = PipelineConfig::default();
    config.project_root = root.to_path_buf();
    config.tools = ToolsConfig::disabled();
    config.watch.debounce_ms = 50;
    let notifier = Arc::new(MemoryNotifier::new());
    let pipeline = Pipeline::builder().config(config).notifier(notifier.clone()).build().await.unwrap();
    (pipeline, notifier)
}

#[tokio::test]
async fn broken_stylesheet_does_not_stop_scripts() {
    let tmp = tempfile::tempdir().unwrap();
    project(tmp.path());
    write(tmp.path(), "src/assets/scss/main.scss", ".a {\n  color: red;\n");
    write(tmp.path(), "src/assets/js/app.js", "const a = 1\n");
    let (pipeline, notifier) = pipeline(tmp.path()).await;

    let summary = pipeline.build(Mode::Production).await;

    let notes = notifier.take();
    assert_eq!(notes.len(), 1, "{notes:?}");
    assert_eq!(notes[0].title, "compileSass");
    assert!(notes[0].message.contains("Unclosed block"));
    assert_eq!(summary.failures(), 1);

    assert!(!tmp.path().join("dist/assets/css/main.css").exists());
    assert_eq!(fs::read_to_string(tmp.path().join("dist/assets/js/app.js")).unwrap(), "const a=1");
    assert_eq!(summary.report(Category::Script).unwrap().written.len(), 1);
}

#[tokio::test]
async fn missing_source_directory_is_notified_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/js/app.js", "let a = 1\n");
    let (pipeline, notifier) = pipeline(tmp.path()).await;

    assert!(pipeline.run_category(Category::Template, Mode::Development).await.is_none());
    let notes = notifier.take();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "compilePug");
    assert!(notes[0].message.contains("templates"), "{}", notes[0].message);

    assert!(pipeline.run_category(Category::Script, Mode::Development).await.is_some());
    assert!(notifier.take().is_empty());
}

#[tokio::test]
async fn clean_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    project(tmp.path());
    write(tmp.path(), "src/assets/js/app.js", "let a = 1\n");
    let (pipeline, notifier) = pipeline(tmp.path()).await;

    pipeline.dev(Mode::Development).await;
    assert!(tmp.path().join("dist/assets/js/app.js").exists());

    assert!(pipeline.clean().await.unwrap());
    assert!(!tmp.path().join("dist").exists());
    assert!(!pipeline.clean().await.unwrap());
    assert!(notifier.take().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn watch_rebuilds_and_requests_reload() {
    let tmp = tempfile::tempdir().unwrap();
    project(tmp.path());
    let (pipeline, _notifier) = pipeline(tmp.path()).await;
    let mut reloads = pipeline.events().subscribe::<ReloadRequested>().unwrap();

    let watching = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.watch(Mode::Development).await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;

    write(tmp.path(), "src/assets/js/app.js", "let a = 1\n");
    let event = tokio::time::timeout(Duration::from_secs(10), reloads.recv_event())
        .await
        .expect("no reload requested")
        .unwrap();

    assert_eq!(event.category, Category::Script);
    assert!(tmp.path().join("dist/assets/js/app.js").exists());
    watching.abort();
}

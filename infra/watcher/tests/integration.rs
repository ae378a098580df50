use aflow_watcher::FileWatcher;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread")]
async fn changes_reach_only_matching_subscriptions() {
    let tmp = tempfile::tempdir().unwrap();
    let styles = tmp.path().join("scss");
    let scripts = tmp.path().join("js");
    std::fs::create_dir_all(&styles).unwrap();
    std::fs::create_dir_all(&scripts).unwrap();

    let mut watcher = FileWatcher::new().unwrap();
    let mut style_sub =
        watcher.subscribe("styles", &styles, |p: &Path| p.extension().is_some_and(|e| e == "scss")).unwrap();
    let mut script_sub =
        watcher.subscribe("scripts", &scripts, |p: &Path| p.extension().is_some_and(|e| e == "js")).unwrap();

    std::fs::write(styles.join("main.scss"), "a { color: red }").unwrap();
    std::fs::write(styles.join("notes.txt"), "ignored").unwrap();

    let batch = timeout(Duration::from_secs(10), style_sub.next_batch(Duration::from_millis(200)))
        .await
        .expect("no change observed")
        .unwrap();
    assert!(batch.iter().all(|p| p.ends_with("main.scss")), "{batch:?}");
    assert!(batch.iter().all(|p| p.starts_with(&styles)));

    let quiet = timeout(Duration::from_millis(500), script_sub.next_batch(Duration::from_millis(50))).await;
    assert!(quiet.is_err(), "script subscription saw {quiet:?}");
}

#[test]
fn missing_root_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut watcher = FileWatcher::new().unwrap();
    let err = watcher.subscribe("images", tmp.path().join("missing"), |_: &Path| true).unwrap_err();
    assert_eq!(err.kind(), "Notify");
}

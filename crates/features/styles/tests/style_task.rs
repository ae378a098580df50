use aflow_kernel::domain::config::ToolsConfig;
use aflow_kernel::prelude::*;
use std::fs;
use std::path::Path;

const MAIN: &str = "@media (min-width: 600px) {\n  .a { color: blue; }\n}\n.a {\n  user-select: none;\n  color: red;\n}\n@media (min-width: 600px) {\n  .b { color: green; }\n}\n";

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

async fn task(root: &Path) -> aflow_styles::StyleTask {
    let mut config = PipelineConfig::default();
    config.project_root = root.to_path_buf();
    config.tools = ToolsConfig::disabled();
    let registry = PathRegistry::from_config(&config);
    aflow_styles::init(&config, &registry).await.unwrap()
}

#[tokio::test]
async fn development_writes_processed_css_with_map() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/main.scss", MAIN);
    write(tmp.path(), "src/assets/scss/_vars.scss", ".v { top: 0; }\n");

    let report = task(tmp.path()).await.run(Mode::Development).await.unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.skipped, 1);

    let css_dir = tmp.path().join("dist/assets/css");
    let css = fs::read_to_string(css_dir.join("main.css")).unwrap();
    assert!(css.starts_with(".a {\n  color: red;\n  -webkit-user-select: none;\n  user-select: none;\n}"), "{css}");
    assert_eq!(css.matches("@media").count(), 1, "{css}");
    assert!(css.find(".b {").unwrap() > css.find(".a {\n    color: blue").unwrap());
    assert!(css.ends_with("/*# sourceMappingURL=sourcemaps/main.css.map */\n"));

    let map = fs::read_to_string(css_dir.join("sourcemaps/main.css.map")).unwrap();
    assert!(map.contains("\"sources\":[\"main.scss\"]"), "{map}");
    assert!(!css_dir.join("_vars.css").exists());
}

#[tokio::test]
async fn production_minifies_and_drops_maps() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/main.scss", MAIN);
    let task = task(tmp.path()).await;

    task.run(Mode::Development).await.unwrap();
    let map = tmp.path().join("dist/assets/css/sourcemaps/main.css.map");
    assert!(map.exists());

    let report = task.run(Mode::Production).await.unwrap();
    assert!(report.is_success());
    assert!(!map.exists(), "stale map survives production build");
    assert_eq!(report.removed.len(), 1);

    let css = fs::read_to_string(tmp.path().join("dist/assets/css/main.css")).unwrap();
    assert_eq!(
        css,
        ".a{color:red;-webkit-user-select:none;user-select:none}@media (min-width:600px){.a{color:blue}.b{color:green}}"
    );
}

#[tokio::test]
async fn development_after_production_restores_maps() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/main.scss", MAIN);
    let style_task = task(tmp.path()).await;
    let css_path = tmp.path().join("dist/assets/css/main.css");

    style_task.run(Mode::Production).await.unwrap();
    assert!(!fs::read_to_string(&css_path).unwrap().contains('\n'));

    let report = style_task.run(Mode::Development).await.unwrap();
    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.written.len(), 2);

    let css = fs::read_to_string(&css_path).unwrap();
    assert!(css.starts_with(".a {\n  color: red;"), "{css}");
    assert!(css.ends_with("/*# sourceMappingURL=sourcemaps/main.css.map */\n"));
    assert!(tmp.path().join("dist/assets/css/sourcemaps/main.css.map").exists());

    let fresh = tempfile::tempdir().unwrap();
    write(fresh.path(), "src/assets/scss/main.scss", MAIN);
    task(fresh.path()).await.run(Mode::Development).await.unwrap();
    assert_eq!(css, fs::read_to_string(fresh.path().join("dist/assets/css/main.css")).unwrap());
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/main.scss", MAIN);
    write(tmp.path(), "src/assets/scss/pages/home.scss", ".home { display: flex; }\n");
    let task = task(tmp.path()).await;

    let first = task.run(Mode::Development).await.unwrap();
    assert_eq!(first.written.len(), 4);

    let second = task.run(Mode::Development).await.unwrap();
    assert!(second.written.is_empty(), "{:?}", second.written);
    assert_eq!(second.unchanged.len(), 4);

    let nested = fs::read_to_string(tmp.path().join("dist/assets/css/pages/home.css")).unwrap();
    assert!(nested.contains("sourceMappingURL=../sourcemaps/pages/home.css.map"));
}

#[tokio::test]
async fn broken_file_fails_alone() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/broken.scss", ".a {\n  color: red;\n");
    write(tmp.path(), "src/assets/scss/empty.scss", ".a {}\n");
    write(tmp.path(), "src/assets/scss/ok.scss", ".ok { top: 0; }\n");

    let report = task(tmp.path()).await.run(Mode::Production).await.unwrap();
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures.iter().all(|f| f.step == "stylelint"));
    assert!(report.failures[0].message.ends_with("broken.scss:1:4 Unclosed block (CssSyntaxError)"), "{}", report.failures[0]);
    assert!(report.failures[1].message.contains("(block-no-empty)"));

    let css_dir = tmp.path().join("dist/assets/css");
    assert!(!css_dir.join("broken.css").exists());
    assert!(!css_dir.join("empty.css").exists());
    assert_eq!(fs::read_to_string(css_dir.join("ok.css")).unwrap(), ".ok{top:0}");
}

#[tokio::test]
async fn partials_are_linted_never_written() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "src/assets/scss/_broken.scss", ".x { color: red;; }\n");

    let report = task(tmp.path()).await.run(Mode::Development).await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("no-extra-semicolons"));
    assert_eq!(report.outputs(), 0);
}

#[tokio::test]
async fn missing_source_dir_is_task_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = task(tmp.path()).await.run(Mode::Development).await.unwrap_err();
    assert_eq!(err.kind(), "Walk");
}

#[tokio::test]
async fn chain_follows_mode() {
    let tmp = tempfile::tempdir().unwrap();
    let task = task(tmp.path()).await;

    assert_eq!(task.chain(Mode::Development).names(), vec!["stylelint", "sass-glob", "postcss", "merge-media-queries"]);
    assert_eq!(task.chain(Mode::Production).names().last(), Some(&"clean-css"));
}

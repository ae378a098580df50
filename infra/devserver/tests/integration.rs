use aflow_devserver::{DevServer, Reload};
use aflow_domain::config::ServerConfig;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use std::fs;
use std::path::Path;
use tower::ServiceExt;

fn site(root: &Path) {
    fs::create_dir_all(root.join("assets/css")).unwrap();
    fs::create_dir_all(root.join("blog")).unwrap();
    fs::write(root.join("index.html"), "<html><body><h1>Home</h1></body></html>").unwrap();
    fs::write(root.join("blog/index.html"), "<p>blog</p>").unwrap();
    fs::write(root.join("assets/css/main.css"), "body{color:red}").unwrap();
}

fn server(root: &Path, cfg: ServerConfig) -> DevServer {
    DevServer::builder().config(&cfg).root(root).build()
}

async fn get(server: &DevServer, path: &str) -> Response {
    server.router().oneshot(Request::get(path).body(Body::empty()).unwrap()).await.unwrap()
}

async fn text(response: Response) -> String {
    String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap()
}

#[tokio::test]
async fn index_is_served_with_reload_script() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    let server = server(tmp.path(), ServerConfig::default());

    let response = get(&server, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(
        text(response).await,
        "<html><body><h1>Home</h1><script src=\"/__aflow/client.js\" async></script></body></html>"
    );
}

#[tokio::test]
async fn static_files_get_their_content_type() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    let server = server(tmp.path(), ServerConfig::default());

    let response = get(&server, "/assets/css/main.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/css"));
    assert_eq!(text(response).await, "body{color:red}");
}

#[tokio::test]
async fn head_requests_keep_the_file_length() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    let server = server(tmp.path(), ServerConfig::default());

    let request = Request::head("/index.html").body(Body::empty()).unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "39");
    assert!(text(response).await.is_empty());
}

#[tokio::test]
async fn percent_encoded_names_are_decoded() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    fs::write(tmp.path().join("assets/css/print sheet.css"), "@page{margin:0}").unwrap();
    let server = server(tmp.path(), ServerConfig::default());

    let response = get(&server, "/assets/css/print%20sheet.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "@page{margin:0}");
}

#[tokio::test]
async fn directories_redirect_then_serve_index() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    let server = server(tmp.path(), ServerConfig::default());

    let redirect = get(&server, "/blog").await;
    assert!(redirect.status().is_redirection());
    assert_eq!(redirect.headers()[header::LOCATION], "/blog/");

    let page = get(&server, "/blog/").await;
    assert!(text(page).await.starts_with("<p>blog</p><script"));
}

#[tokio::test]
async fn missing_and_escaping_paths_are_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("dist");
    site(&root);
    fs::write(tmp.path().join("secret.txt"), "nope").unwrap();
    let server = server(&root, ServerConfig::default());

    let missing = get(&server, "/nope.html").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(missing).await, "Cannot GET /nope.html");

    assert_eq!(get(&server, "/%2e%2e/secret.txt").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_script_honours_notify_setting() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());

    let quiet = text(get(&server(tmp.path(), ServerConfig::default()), "/__aflow/client.js").await).await;
    assert!(quiet.contains("var notify = false;"));

    let cfg = ServerConfig { notify: true, ..ServerConfig::default() };
    let chatty = text(get(&server(tmp.path(), cfg), "/__aflow/client.js").await).await;
    assert!(chatty.contains("var notify = true;"));
}

#[tokio::test]
async fn live_reload_can_be_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    site(tmp.path());
    let cfg = ServerConfig { live_reload: false, ..ServerConfig::default() };
    let server = server(tmp.path(), cfg);

    assert_eq!(text(get(&server, "/").await).await, "<html><body><h1>Home</h1></body></html>");
    assert_eq!(get(&server, "/__aflow/client.js").await.status(), StatusCode::NOT_FOUND);
}

#[test]
fn reload_without_clients_reaches_nobody() {
    let server = DevServer::builder().root("dist").build();
    let reloader = server.reloader();
    assert_eq!(reloader.clients(), 0);
    assert_eq!(reloader.reload(Reload::Page), 0);
    assert_eq!(Reload::Css.as_str(), "css");
}

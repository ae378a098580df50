use axum::Router;
use axum::handler::HandlerWithoutStateExt;
use axum::middleware;
use axum::routing::get;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::livereload::{self, CLIENT_PATH, Reloader, SOCKET_PATH};

#[derive(Debug, Clone)]
pub(crate) struct ServerState {
    pub(crate) root: Arc<PathBuf>,
    pub(crate) reloader: Reloader,
    pub(crate) live_reload: bool,
    pub(crate) notify: bool,
}

/// `index.html` for directories, a redirect for directories without a
/// trailing slash, `Cannot GET <path>` for anything missing.
pub(crate) fn init(state: ServerState) -> Router {
    let files = ServeDir::new(state.root.as_path())
        .append_index_html_on_directories(true)
        .not_found_service(assets::not_found.into_service());

    let mut router = Router::new();
    if state.live_reload {
        router = router.route(SOCKET_PATH, get(livereload::socket)).route(CLIENT_PATH, get(livereload::client));
    }
    router
        .fallback_service(files)
        .layer(middleware::from_fn_with_state(state.clone(), assets::live_reload_html))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

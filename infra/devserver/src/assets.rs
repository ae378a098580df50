//! Static files from the output root, plus live-reload injection for pages.

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::livereload;
use crate::router::ServerState;

/// Upper bound for buffering a page before injecting the reload script.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

/// Body for paths outside the output tree or missing from it.
pub(crate) async fn not_found(uri: Uri) -> Response {
    (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], format!("Cannot GET {}", uri.path()))
        .into_response()
}

/// Inserts the live-reload tag before the last `</body>`, or appends it.
#[must_use]
pub fn inject(html: &str, snippet: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + snippet.len());
            out.push_str(&html[..at]);
            out.push_str(snippet);
            out.push_str(&html[at..]);
            out
        },
        None => format!("{html}{snippet}"),
    }
}

fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"))
}

/// Marks every response uncacheable and, with live reload on, adds the
/// client script to full `GET` responses of HTML pages.
pub(crate) async fn live_reload_html(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let inject_script = state.live_reload && request.method() == Method::GET;
    let mut response = next.run(request).await;
    response.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    if !inject_script || response.status() != StatusCode::OK || !is_html(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Failed to buffer page for live reload");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        },
    };
    let page = inject(&String::from_utf8_lossy(&bytes), &livereload::snippet());
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_last_body_close() {
        assert_eq!(inject("<body><p>x</p></BODY>", "<s/>"), "<body><p>x</p><s/></BODY>");
        assert_eq!(inject("<body></body><body></body>", "<s/>"), "<body></body><body><s/></body>");
        assert_eq!(inject("<p>fragment</p>", "<s/>"), "<p>fragment</p><s/>");
    }
}

//! Reload signalling: a broadcast channel per server, one WebSocket session
//! per connected page.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::router::ServerState;

pub const SOCKET_PATH: &str = "/__aflow/livereload";
pub const CLIENT_PATH: &str = "/__aflow/client.js";

const CAPACITY: usize = 16;

/// What connected pages should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// Full page reload.
    Page,
    /// Re-fetch stylesheets in place.
    Css,
}

impl Reload {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "reload",
            Self::Css => "css",
        }
    }
}

/// Pushes reload signals to every connected page. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Reloader {
    tx: broadcast::Sender<Reload>,
}

impl Default for Reloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reloader {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Signals every connected page; returns how many were reached.
    /// No connected page is not an error.
    pub fn reload(&self, kind: Reload) -> usize {
        let reached = self.tx.send(kind).unwrap_or(0);
        debug!(kind = kind.as_str(), reached, "Reload signalled");
        reached
    }

    #[must_use]
    pub fn clients(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Reload> {
        self.tx.subscribe()
    }
}

pub(crate) async fn socket(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let rx = state.reloader.subscribe();
    ws.on_upgrade(move |socket| session(socket, rx))
}

async fn session(mut socket: WebSocket, mut rx: broadcast::Receiver<Reload>) {
    trace!("Live reload client connected");
    loop {
        tokio::select! {
            signal = rx.recv() => {
                let kind = match signal {
                    Ok(kind) => kind,
                    // Missed signals collapse into one full reload.
                    Err(broadcast::error::RecvError::Lagged(_)) => Reload::Page,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if socket.send(Message::Text(kind.as_str().into())).await.is_err() {
                    break;
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {},
            },
        }
    }
    trace!("Live reload client disconnected");
}

pub(crate) async fn client(State(state): State<ServerState>) -> Response {
    let script = CLIENT_SCRIPT.replace("__NOTIFY__", if state.notify { "true" } else { "false" });
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8"), (header::CACHE_CONTROL, "no-cache")], script)
        .into_response()
}

/// Tag injected into served HTML.
pub(crate) fn snippet() -> String {
    format!("<script src=\"{CLIENT_PATH}\" async></script>")
}

const CLIENT_SCRIPT: &str = r#"(function () {
  var notify = __NOTIFY__;
  var url = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/__aflow/livereload";

  function banner(text) {
    if (!notify) return;
    var el = document.createElement("div");
    el.textContent = text;
    el.style.cssText = "position:fixed;top:0;right:0;z-index:2147483647;padding:8px 14px;" +
      "font:13px sans-serif;color:#fff;background:#1b2032;opacity:.9";
    document.body.appendChild(el);
    setTimeout(function () { el.remove(); }, 1500);
  }

  function refreshStyles() {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    for (var i = 0; i < links.length; i++) {
      var href = new URL(links[i].href);
      href.searchParams.set("aflow", Date.now());
      links[i].href = href.toString();
    }
  }

  function connect() {
    var socket = new WebSocket(url);
    socket.onopen = function () { banner("Connected to aflow"); };
    socket.onmessage = function (event) {
      if (event.data === "css") { refreshStyles(); banner("Injected CSS"); }
      else { location.reload(); }
    };
    socket.onclose = function () { setTimeout(connect, 1000); };
  }

  connect();
})();
"#;

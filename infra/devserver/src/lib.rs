//! # Dev Server
//!
//! Serves the build output over HTTP with live reload.
//!
//! HTML responses get a small client script that connects to a WebSocket
//! endpoint; [`Reloader::reload`] pushes `reload` (full page) or `css`
//! (stylesheet swap) to every connected page.
//!
//! ## Example
//! ```no_run
//! use aflow_devserver::{DevServer, Reload};
//! use aflow_domain::config::ServerConfig;
//!
//! # async fn example() -> Result<(), aflow_devserver::DevServerError> {
//! let server = DevServer::builder().config(&ServerConfig::default()).root("dist").build();
//! let reloader = server.reloader();
//! tokio::spawn(async move { server.run().await });
//! reloader.reload(Reload::Css);
//! # Ok(())
//! # }
//! ```

mod assets;
mod error;
mod livereload;
mod router;

pub use assets::inject;
pub use error::{DevServerError, DevServerErrorExt};
pub use livereload::{CLIENT_PATH, Reload, Reloader, SOCKET_PATH};

use aflow_domain::config::ServerConfig;
use axum::Router;
use axum_server::Handle;
use router::ServerState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct DevServerBuilder {
    cfg: ServerConfig,
    root: PathBuf,
}

impl DevServerBuilder {
    pub fn config(mut self, cfg: &ServerConfig) -> Self {
        self.cfg = cfg.clone();
        self
    }

    /// Directory served at `/`.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub const fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    pub fn build(self) -> DevServer {
        DevServer {
            address: SocketAddr::new(self.cfg.address, self.cfg.port),
            state: ServerState {
                root: Arc::new(self.root),
                reloader: Reloader::new(),
                live_reload: self.cfg.live_reload,
                notify: self.cfg.notify,
            },
        }
    }
}

#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct DevServer {
    address: SocketAddr,
    state: ServerState,
}

impl DevServer {
    pub fn builder() -> DevServerBuilder {
        DevServerBuilder::default()
    }

    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    /// Handle for pushing reload signals to connected pages.
    #[must_use]
    pub fn reloader(&self) -> Reloader {
        self.state.reloader.clone()
    }

    /// The HTTP application, without binding a socket.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Serves until Ctrl+C or SIGTERM. Open connections are dropped at once.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn run(self) -> Result<(), DevServerError> {
        let app = self.router();
        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, stopping dev server");
            shutdown_handle.shutdown();
        });

        info!(
            address = %self.address,
            root = %self.state.root.display(),
            live_reload = self.state.live_reload,
            "Serving on http://{}", self.address
        );

        axum_server::bind(self.address)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context(format!("Failed to serve on {}", self.address))?;

        info!("Dev server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn shutdown_signal() -> Result<(), DevServerError> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, DevServerError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), DevServerError>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}

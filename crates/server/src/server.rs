//! Log server.
//!
//! Binds a TCP port, serves the cached listing and per-source viewer
//! pages, and upgrades `<viewer>/$` requests to a live tail over
//! WebSocket. Runs until its cancellation token fires, then drains.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use logyard_protocol::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_PORT, LISTING_ROUTE, SHUTDOWN_ROUTE, SHUTDOWN_TIMEOUT,
    SOURCE_ROUTE_PREFIX, STREAM_ROUTE_SUFFIX,
};
use logyard_sources::Catalog;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::ServerError;
use crate::cache::PageCache;
use crate::connection;
use crate::page::render_listing;
use crate::registry::SourceRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// How often each tail session checks its file for growth.
    pub poll_interval: Duration,
    /// Upper bound on the drain after shutdown is requested.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
        }
    }
}

/// State shared by every request handler.
struct AppState {
    page: PageCache,
    registry: SourceRegistry,
    poll_interval: Duration,
    cancel: CancellationToken,
    sessions: TaskTracker,
}

/// The listing and live-tail server.
pub struct LogServer {
    port: u16,
    shutdown_timeout: Duration,
    state: Arc<AppState>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl LogServer {
    /// Prerenders the listing and registers one endpoint per catalogued
    /// file. The catalog is not consulted again afterwards.
    pub fn new(config: ServerConfig, catalog: &Catalog) -> Arc<Self> {
        let registry = SourceRegistry::from_catalog(catalog);
        tracing::info!(endpoints = registry.len(), "source endpoints registered");

        Arc::new(Self {
            port: config.port,
            shutdown_timeout: config.shutdown_timeout,
            state: Arc::new(AppState {
                page: PageCache::new(render_listing(catalog)),
                registry,
                poll_interval: config.poll_interval,
                cancel: CancellationToken::new(),
                sessions: TaskTracker::new(),
            }),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// The process-wide shutdown token. Cancelling it has the same effect
    /// as visiting the shutdown route.
    pub fn cancel_token(&self) -> CancellationToken {
        self.state.cancel.clone()
    }

    /// Requests a graceful shutdown.
    pub fn shutdown(&self) {
        self.state.cancel.cancel();
    }

    fn router(&self) -> Router {
        Router::new()
            .route(LISTING_ROUTE, get(listing))
            .route(SHUTDOWN_ROUTE, get(shutdown))
            .route(&format!("{SOURCE_ROUTE_PREFIX}*path"), get(source))
            .fallback(not_found)
            .with_state(Arc::clone(&self.state))
    }

    /// Runs the server until shutdown is requested and the drain finishes.
    ///
    /// Returns [`ServerError::ShutdownTimeout`] if open connections and
    /// tail sessions do not wind down within the configured timeout.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("log server listening on {local_addr}");

        let cancel = self.state.cancel.clone();
        let serve = axum::serve(listener, self.router())
            .with_graceful_shutdown(cancel.clone().cancelled_owned())
            .into_future();
        let mut serve = std::pin::pin!(serve);

        tokio::select! {
            result = &mut serve => {
                // Only reachable if the listener failed before shutdown.
                result?;
                return Ok(());
            }
            _ = cancel.cancelled() => {}
        }

        tracing::info!("server shutting down");
        let sessions = self.state.sessions.clone();
        let drain = async move {
            serve.await?;
            sessions.close();
            sessions.wait().await;
            Ok::<_, std::io::Error>(())
        };

        match tokio::time::timeout(self.shutdown_timeout, drain).await {
            Ok(result) => {
                result?;
                tracing::info!("server stopped");
                Ok(())
            }
            Err(_) => {
                tracing::error!(timeout = ?self.shutdown_timeout, "shutdown timed out");
                Err(ServerError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

async fn listing(State(state): State<Arc<AppState>>) -> Response {
    tracing::debug!("listing request");
    html(state.page.current())
}

async fn shutdown(State(state): State<Arc<AppState>>) -> Response {
    tracing::info!("shutdown requested");
    state.cancel.cancel();
    (StatusCode::FOUND, [(header::LOCATION, LISTING_ROUTE)]).into_response()
}

async fn source(
    State(state): State<Arc<AppState>>,
    Path(rest): Path<String>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let route = format!("{SOURCE_ROUTE_PREFIX}{rest}");

    let Some(endpoint) = route.strip_suffix(STREAM_ROUTE_SUFFIX) else {
        return match state.registry.get(&route) {
            Some(entry) => {
                tracing::debug!(endpoint = %route, "viewer request");
                html(entry.viewer.clone())
            }
            None => not_found_route(&route),
        };
    };

    let Some(entry) = state.registry.get(endpoint) else {
        return not_found_route(&route);
    };
    let Some(ws) = ws else {
        return (StatusCode::BAD_REQUEST, "expected a WebSocket upgrade").into_response();
    };

    let endpoint = endpoint.to_owned();
    let path = entry.path.clone();
    let poll_interval = state.poll_interval;
    let cancel = state.cancel.child_token();
    let sessions = state.sessions.clone();

    ws.on_upgrade(move |socket| {
        sessions.track_future(connection::serve_viewer(
            socket,
            endpoint,
            path,
            poll_interval,
            cancel,
        ))
    })
}

async fn not_found(uri: Uri) -> Response {
    not_found_route(uri.path())
}

fn not_found_route(route: &str) -> Response {
    tracing::debug!(route, "no such route");
    (StatusCode::NOT_FOUND, "not found").into_response()
}

fn html(body: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
}

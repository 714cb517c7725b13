// src/serve/mod.rs

//! Development web server: static files from the generated site plus the
//! live-reload event stream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::sse::{Event as SseEvent, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::get;
use futures::stream::Stream;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, warn};

use crate::config::BuildConfig;
use crate::errors::Result;
use crate::fs::FileSystem;

pub mod reload;

pub use reload::{CLIENT_SCRIPT, RELOAD_PATH, ReloadEvent, ReloadHub, ReloadInjector};

/// Shared state of the dev server.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub site_root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub hub: ReloadHub,
    pub injector: Arc<ReloadInjector>,
}

impl ServerState {
    pub fn new(site_root: PathBuf, fs: Arc<dyn FileSystem>, hub: ReloadHub) -> Result<Self> {
        Ok(Self {
            site_root,
            fs,
            hub,
            injector: Arc::new(ReloadInjector::new()?),
        })
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(reload_stream))
        .fallback(serve_file)
        .with_state(state)
}

/// Bind `host:port` and serve the generated site in the background.
pub async fn start_server(
    config: &BuildConfig,
    fs: Arc<dyn FileSystem>,
    hub: ReloadHub,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let site_root = config.resolve(&config.paths().site_dir);
    let state = ServerState::new(site_root, fs, hub)?;

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!("binding dev server to {}:{}", config.server.host, config.server.port)
        })?;
    let addr = listener.local_addr()?;
    info!(%addr, "serving site at http://{addr}/");

    let app = router(state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "dev server stopped");
        }
    });
    Ok((addr, handle))
}

pub async fn reload_stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let stream = BroadcastStream::new(state.hub.subscribe()).filter_map(|msg| match msg {
        Ok(event) => Some(Ok(SseEvent::default()
            .event(event.event_name())
            .data(event.event_name()))),
        // Lagged receivers just miss a reload.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

pub async fn serve_file(State(state): State<ServerState>, uri: Uri) -> Response {
    let Some(mut path) = resolve_request_path(&state.site_root, uri.path()) else {
        warn!(path = %uri.path(), "rejected request path");
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    };
    if state.fs.is_dir(&path) {
        path = path.join("index.html");
    }
    if !state.fs.is_file(&path) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    let kind = content_type(&path);
    let bytes = match state.fs.read(&path) {
        Ok(b) => b,
        Err(e) => {
            error!(path = ?path, error = %e, "reading file to serve");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    if kind.starts_with("text/html") {
        let html = state.injector.inject(&String::from_utf8_lossy(&bytes));
        return ([(header::CONTENT_TYPE, kind)], html).into_response();
    }
    ([(header::CONTENT_TYPE, kind)], bytes).into_response()
}

/// Map a request path onto the site directory. Paths that try to leave it
/// are rejected; a trailing slash maps to `index.html`.
pub fn resolve_request_path(site_root: &Path, request: &str) -> Option<PathBuf> {
    let mut path = site_root.to_path_buf();
    for component in Path::new(request.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if request.ends_with('/') {
        path.push("index.html");
    }
    Some(path)
}

pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

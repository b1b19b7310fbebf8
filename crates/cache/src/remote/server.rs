//! axum handlers in front of one [`Cache`]

use crate::core::Cache;
use crate::errors::CacheError;
use crate::hashing::ActionId;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use futures::StreamExt;
use std::future::Future;
use std::io::{Seek, SeekFrom};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Failure of a single protocol request, rendered as a plain-text response
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("request body is empty")]
    EmptyBody,

    #[error("failed to receive request body: {0}")]
    Receive(String),

    #[error("cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("method {0} not allowed, use GET or POST")]
    MethodNotAllowed(Method),

    #[error("no route for {0}")]
    UnknownPath(Uri),
}

impl ProtocolError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::Cache(CacheError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ProtocolError::Cache(CacheError::Malformed { .. }) => StatusCode::BAD_REQUEST,
            ProtocolError::Cache(CacheError::Remote { .. }) => StatusCode::BAD_GATEWAY,
            ProtocolError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProtocolError::EmptyBody => StatusCode::PRECONDITION_FAILED,
            ProtocolError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProtocolError::UnknownPath(_) => StatusCode::NOT_FOUND,
            ProtocolError::Receive(_) | ProtocolError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "cache request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "cache request rejected");
        }
        let mut response = (status, self.to_string()).into_response();
        if let ProtocolError::MethodNotAllowed(_) = self {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
        }
        response
    }
}

/// Routes serving `cache` over the remote protocol
pub fn router(cache: Arc<Cache>) -> Router {
    Router::new()
        .route(
            "/:action",
            get(fetch).post(store).fallback(method_not_allowed),
        )
        .route("/", any(missing_action))
        .fallback(unknown_path)
        .with_state(cache)
}

/// Serve `cache` on `listener` until Ctrl-C
pub async fn serve(listener: TcpListener, cache: Arc<Cache>) -> std::io::Result<()> {
    serve_with_shutdown(listener, cache, ctrl_c()).await
}

/// Serve `cache` on `listener` until `shutdown` completes
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    cache: Arc<Cache>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, dir = %cache.dir().display(), "serving cache");

    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(%addr, "cache server stopped");
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
}

async fn method_not_allowed(method: Method) -> ProtocolError {
    ProtocolError::MethodNotAllowed(method)
}

async fn missing_action() -> ProtocolError {
    CacheError::malformed("", "missing action id").into()
}

async fn unknown_path(uri: Uri) -> ProtocolError {
    ProtocolError::UnknownPath(uri)
}

async fn fetch(
    State(cache): State<Arc<Cache>>,
    Path(segment): Path<String>,
) -> Result<Response, ProtocolError> {
    let action = ActionId::from_base64url(&segment)?;

    let lookup = tokio::task::spawn_blocking(move || cache.get_file(&action)).await?;
    let (path, entry) = lookup?;

    // An empty file is never a usable artifact.
    if entry.size == 0 {
        return Err(CacheError::not_found(action).into());
    }

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CacheError::not_found(action).into());
        }
        Err(e) => return Err(CacheError::io(&path, "open content file", e).into()),
    };

    debug!(action = %action, bytes = entry.size, "serving cache hit");
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(entry.size)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

async fn store(
    State(cache): State<Arc<Cache>>,
    Path(segment): Path<String>,
    body: Body,
) -> Result<StatusCode, ProtocolError> {
    let action = ActionId::from_base64url(&segment)?;

    // Spool inside the cache root so the upload never needs a second copy
    // across filesystems.
    let spool = tempfile::tempfile_in(cache.dir())
        .map_err(|e| CacheError::io(cache.dir(), "create upload spool", e))?;
    let mut spool = tokio::fs::File::from_std(spool);

    let mut received: u64 = 0;
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProtocolError::Receive(e.to_string()))?;
        received += chunk.len() as u64;
        spool
            .write_all(&chunk)
            .await
            .map_err(|e| ProtocolError::Receive(e.to_string()))?;
    }

    if received == 0 {
        return Err(ProtocolError::EmptyBody);
    }

    spool
        .flush()
        .await
        .map_err(|e| ProtocolError::Receive(e.to_string()))?;
    let mut spool = spool.into_std().await;
    spool
        .seek(SeekFrom::Start(0))
        .map_err(|e| ProtocolError::Receive(e.to_string()))?;

    let stored = tokio::task::spawn_blocking(move || cache.put(&action, spool)).await?;
    let (output, size) = stored?;

    debug!(action = %action, output = %output, bytes = size, "stored upload");
    Ok(StatusCode::CREATED)
}

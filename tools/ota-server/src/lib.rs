/// Development firmware server
///
/// Serves a single image at `GET /firmware.bin` for devices on the local
/// network.  Every other path is a 404.
use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;

/// Path devices request.
pub const FIRMWARE_ROUTE: &str = "/firmware.bin";

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::NotFound(what) => {
                tracing::warn!("404: {}", what);
                StatusCode::NOT_FOUND.into_response()
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    firmware: PathBuf,
}

impl AppState {
    pub fn new(firmware: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                firmware: firmware.into(),
            }),
        }
    }

    pub fn firmware_path(&self) -> &std::path::Path {
        &self.inner.firmware
    }
}

/// GET /firmware.bin - the image bytes, re-read on every request so a
/// rebuilt image is picked up without restarting the server.
pub async fn firmware(State(state): State<AppState>) -> Result<Response> {
    let path = state.firmware_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!("Serving {} ({} bytes)", path.display(), bytes.len());
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(FIRMWARE_ROUTE, get(firmware))
        .fallback(not_found)
        .with_state(state)
}

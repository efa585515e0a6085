use std::{
    any::Any,
    net::SocketAddr,
    path::PathBuf,
};

use anyhow::Context;
use axum::{
    body::{Bytes, Full},
    extract::multipart::{Multipart, MultipartError},
    http::{self, header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use thiserror::Error;
use tokio::fs;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::models::{ErrorResponse, UploadResponse};

pub const PORT: u16 = 3000;
pub const UPLOAD_DIR: &str = "./uploads";

/// Fixed settings resolved once at startup and shared with the handler.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub upload_dir: PathBuf,
}

/// Everything that can go wrong while handling an upload request.
///
/// The `IntoResponse` impl is the single place these become JSON, so no
/// fault leaves the handler as anything but an `ErrorResponse` body.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("expected a multipart/form-data request")]
    NotMultipart,
    #[error("file upload error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("no file was selected")]
    NoFile,
    #[error("storing the upload failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotMultipart | Self::Multipart(_) | Self::NoFile => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        error!(%status, "upload request failed: {message}");

        (status, Json(ErrorResponse { message })).into_response()
    }
}

async fn post_upload(
    Extension(config): Extension<ServiceConfig>,
    multipart: Option<Multipart>,
) -> Result<Json<UploadResponse>, ServiceError> {
    // handler for POST /api/upload, one file per request
    let mut multipart = multipart.ok_or(ServiceError::NotMultipart)?;

    while let Some(field) = multipart.next_field().await? {
        // only the first field carrying a filename is the upload
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        let bytes = field.bytes().await?;
        let path = config.upload_dir.join(&filename);

        // truncates silently on a name collision, last writer wins
        fs::write(&path, &bytes).await?;
        let stored = fs::canonicalize(&path).await.unwrap_or(path);

        info!(filename = %filename, size = bytes.len(), "stored upload");

        return Ok(Json(UploadResponse {
            message: "file uploaded successfully".to_string(),
            filename,
            path: stored.display().to_string(),
        }));
    }

    Err(ServiceError::NoFile)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> http::Response<Full<Bytes>> {
    let detail = if let Some(text) = err.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = err.downcast_ref::<&str>() {
        (*text).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    error!("unhandled fault in the request pipeline: {detail}");

    let body = serde_json::json!({ "message": "unknown internal server error" }).to_string();
    http::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::from(body))
        .expect("static response parts")
}

pub fn app(config: ServiceConfig) -> Router {
    Router::new()
        .route("/api/upload", post(post_upload))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
}

pub async fn run(app: Router, port: u16) -> anyhow::Result<()> {
    // runs the webserver
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let server = axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to listen for SIGINT: {err}");
            }
        });

    info!("upload service listening on http://{addr}");
    server.await.context("server exited with an error")?;

    Ok(())
}

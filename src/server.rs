//! HTTP front end: one form page and one upload endpoint.
//!
//! ```text
//! GET  /   → HTML form (multipart, one file field named "file")
//! POST /   → .apkg attachment, or an error
//! ```
//!
//! Error responses come in two shapes. A rejected upload (wrong file name,
//! no file) gets the form's fixed plain-text message before any processing.
//! Anything that fails after the upload was accepted is returned as JSON
//! `{"error": "..."}` with a status derived from [`ErrorKind`].

use crate::convert::FlashcardPipeline;
use crate::error::{ErrorKind, Pdf2AnkiError};
use crate::pipeline::input::validate_upload_name;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Name of the multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "file";

/// The upload form.
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>PDF to Anki</title>
  <style>
    body { font-family: sans-serif; max-width: 36rem; margin: 4rem auto; color: #333; }
    form { display: flex; gap: 1rem; align-items: center; }
  </style>
</head>
<body>
  <h1>PDF to Anki flashcards</h1>
  <p>Upload a PDF to receive an Anki deck generated from its text.</p>
  <form action="/" method="post" enctype="multipart/form-data">
    <input type="file" name="file" accept=".pdf,application/pdf" required>
    <button type="submit">Generate deck</button>
  </form>
</body>
</html>
"#;

/// Server state shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FlashcardPipeline>,
}

/// Build the application router.
pub fn router(pipeline: Arc<FlashcardPipeline>) -> Router {
    let body_limit = pipeline.config().max_upload_bytes;
    Router::new()
        .route("/", get(index).post(upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(pipeline: Arc<FlashcardPipeline>, addr: SocketAddr) -> Result<(), Pdf2AnkiError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Server error: {e}")))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let pdf = match read_upload(&mut multipart).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    // Each request packages into its own directory, removed on drop.
    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => return error_response(&Pdf2AnkiError::Internal(format!("tempdir: {e}"))),
    };

    let output = match state.pipeline.run(&pdf, None, scratch.path()).await {
        Ok(output) => output,
        Err(e) => return error_response(&e),
    };

    let bytes = match tokio::fs::read(&output.package_path).await {
        Ok(bytes) => bytes,
        Err(source) => {
            return error_response(&Pdf2AnkiError::PackageWriteFailed {
                path: output.package_path.clone(),
                source,
            })
        }
    };

    let file_name = output
        .package_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("deck.apkg")
        .to_string();
    info!("Sending {} ({} bytes, {} cards)", file_name, bytes.len(), output.card_count());

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Pull the PDF out of the form, rejecting anything that is not a `.pdf`
/// upload before its body is read.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                return Err((e.status(), e.body_text()).into_response());
            }
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        if let Err(e) = validate_upload_name(filename.as_deref()) {
            return Err(invalid_upload(&e));
        }
        return match field.bytes().await {
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => {
                warn!("Upload interrupted: {}", e);
                Err((e.status(), e.body_text()).into_response())
            }
        };
    }

    Err(invalid_upload(&Pdf2AnkiError::InvalidUpload { filename: None }))
}

fn invalid_upload(err: &Pdf2AnkiError) -> Response {
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

/// HTTP status for a failed run.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Upload => StatusCode::BAD_REQUEST,
        ErrorKind::Extraction => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::GenerationFormat | ErrorKind::GenerationService => StatusCode::BAD_GATEWAY,
        ErrorKind::GenerationTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Packaging | ErrorKind::Configuration | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &Pdf2AnkiError) -> Response {
    let status = status_for(err.kind());
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request failed: {}", err);
    }
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

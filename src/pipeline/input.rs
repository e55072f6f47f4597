//! Input acceptance: decide whether an upload or local file is worth
//! processing before any PDF work starts.
//!
//! The check is deliberately cheap. A wrong file name is rejected here with
//! the form's fixed message and the extractor never runs; content problems
//! (wrong magic, corrupt document) are the extractor's job.

use crate::error::Pdf2AnkiError;
use std::path::Path;
use tracing::debug;

/// Accept only file names ending in `.pdf`, compared case-insensitively.
///
/// `None` (no file in the form) and empty names are rejected too.
pub fn validate_upload_name(filename: Option<&str>) -> Result<&str, Pdf2AnkiError> {
    match filename {
        Some(name) if has_pdf_extension(name) => {
            debug!("Accepted upload: {}", name);
            Ok(name)
        }
        other => {
            debug!("Rejected upload: {:?}", other);
            Err(Pdf2AnkiError::InvalidUpload {
                filename: other.map(str::to_string),
            })
        }
    }
}

fn has_pdf_extension(name: &str) -> bool {
    let name = name.trim();
    name.len() > ".pdf".len()
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// Read a local PDF for the CLI, applying the same name check as uploads.
pub async fn read_local_pdf(path: &Path) -> Result<Vec<u8>, Pdf2AnkiError> {
    let name = path.file_name().and_then(|n| n.to_str());
    validate_upload_name(name)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| Pdf2AnkiError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

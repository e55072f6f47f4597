//! Text extraction: PDF bytes → one raw text blob.
//!
//! The per-page text rendering comes from a [`PdfTextEngine`]. Production
//! code uses [`PdfiumTextEngine`]; tests plug in an engine that returns fixed
//! page strings so the rest of the pipeline can be exercised without a
//! pdfium library on the machine.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with blocking, CPU-bound calls. Running it on the
//! blocking thread pool keeps the async workers (and the HTTP server) free
//! while a large document is parsed.

use crate::error::Pdf2AnkiError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of per-page plain text.
///
/// Returns one entry per page in document order. `None` marks a page with no
/// extractable text (scanned image, blank page); it is not an error.
pub trait PdfTextEngine: Send + Sync {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<Option<String>>, Pdf2AnkiError>;
}

/// [`PdfTextEngine`] backed by pdfium via `pdfium-render`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumTextEngine {
    /// Bind to the system pdfium library on each call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to an explicit library file, or to the platform library name
    /// inside a directory.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, Pdf2AnkiError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(library_file(path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| Pdf2AnkiError::PdfiumBindingFailed(format!("{e:?}")))?;
        Ok(Pdfium::new(bindings))
    }
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(path))
    } else {
        path.to_path_buf()
    }
}

impl PdfTextEngine for PdfiumTextEngine {
    fn page_texts(&self, pdf: &[u8]) -> Result<Vec<Option<String>>, Pdf2AnkiError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| Pdf2AnkiError::CorruptPdf {
                detail: format!("{e:?}"),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let texts = pages
            .iter()
            .enumerate()
            .map(|(idx, page)| match page.text() {
                Ok(text) => Some(text.all()),
                Err(e) => {
                    warn!("Page {}: no extractable text ({:?})", idx + 1, e);
                    None
                }
            })
            .collect();

        Ok(texts)
    }
}

/// Check the `%PDF` magic before handing bytes to the engine.
pub fn check_pdf_magic(pdf: &[u8]) -> Result<(), Pdf2AnkiError> {
    if pdf.len() < 4 || &pdf[..4] != b"%PDF" {
        return Err(Pdf2AnkiError::NotAPdf {
            magic: pdf.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Join page texts with a newline, treating `None` as an empty page, and trim.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extract the raw text of a whole document.
///
/// Runs the engine inside `spawn_blocking`.
pub async fn extract_text(
    engine: Arc<dyn PdfTextEngine>,
    pdf: Arc<[u8]>,
) -> Result<String, Pdf2AnkiError> {
    check_pdf_magic(&pdf)?;

    let pages = tokio::task::spawn_blocking(move || engine.page_texts(&pdf))
        .await
        .map_err(|e| Pdf2AnkiError::Internal(format!("Extraction task panicked: {e}")))??;

    let empty = pages.iter().filter(|p| p.is_none()).count();
    if empty > 0 {
        debug!("{} of {} pages had no extractable text", empty, pages.len());
    }

    let raw = join_pages(pages);
    debug!("Extracted {} chars of raw text", raw.len());
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<Option<String>>);

    impl PdfTextEngine for FixedPages {
        fn page_texts(&self, _pdf: &[u8]) -> Result<Vec<Option<String>>, Pdf2AnkiError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl PdfTextEngine for Broken {
        fn page_texts(&self, _pdf: &[u8]) -> Result<Vec<Option<String>>, Pdf2AnkiError> {
            Err(Pdf2AnkiError::CorruptPdf {
                detail: "xref table missing".into(),
            })
        }
    }

    fn pdf_bytes() -> Arc<[u8]> {
        Arc::from(&b"%PDF-1.7\n%fake body"[..])
    }

    #[test]
    fn test_join_pages_uses_newlines_and_trims() {
        let joined = join_pages(vec![
            Some("  first".to_string()),
            None,
            Some("third  ".to_string()),
        ]);
        assert_eq!(joined, "first\n\nthird");
    }

    #[test]
    fn test_join_pages_empty_document() {
        assert_eq!(join_pages(Vec::new()), "");
        assert_eq!(join_pages(vec![None, None]), "");
    }

    #[test]
    fn test_magic_check() {
        assert!(check_pdf_magic(b"%PDF-1.4").is_ok());
        let err = check_pdf_magic(b"PK\x03\x04zip").unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NotAPdf { ref magic } if magic == b"PK\x03\x04"));
        assert!(check_pdf_magic(b"%P").is_err());
    }

    #[tokio::test]
    async fn test_extract_text_joins_engine_pages() {
        let engine = Arc::new(FixedPages(vec![
            Some("Page 1\nHello world.".into()),
            Some("Page 2\n© 2020-2021 Foo".into()),
        ]));
        let raw = extract_text(engine, pdf_bytes()).await.unwrap();
        assert_eq!(raw, "Page 1\nHello world.\nPage 2\n© 2020-2021 Foo");
    }

    #[tokio::test]
    async fn test_extract_text_rejects_non_pdf_before_engine() {
        let engine = Arc::new(Broken);
        let err = extract_text(engine, Arc::from(&b"hello"[..])).await.unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn test_extract_text_propagates_engine_error() {
        let err = extract_text(Arc::new(Broken), pdf_bytes()).await.unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::CorruptPdf { .. }));
    }
}

//! Fakes shared by the integration tests: a PDF engine with fixed pages and
//! a generation service with a canned answer. Neither needs pdfium or the
//! network.

#![allow(dead_code)]

use async_trait::async_trait;
use edgequake_pdf2anki::{
    CompletionRequest, CompletionService, FlashcardConfig, FlashcardPipeline, PdfTextEngine,
    Pdf2AnkiError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MINIMAL_PDF: &[u8] = b"%PDF-1.7\n1 0 obj <<>> endobj\n%%EOF";

pub const TWO_CARDS: &str = r#"[{"front":"Q1","back":"A1"},{"front":"Q2","back":"A2"}]"#;

/// Returns the same pages for any input and counts its calls.
pub struct FixedPages {
    pages: Vec<Option<String>>,
    pub calls: AtomicUsize,
}

impl FixedPages {
    pub fn new(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|p| Some(p.to_string())).collect(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PdfTextEngine for FixedPages {
    fn page_texts(&self, _pdf: &[u8]) -> Result<Vec<Option<String>>, Pdf2AnkiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.clone())
    }
}

/// Answers every request with a fixed body and remembers the last request.
pub struct CannedService {
    body: String,
    delay: Option<Duration>,
    pub last_request: Mutex<Option<CompletionRequest>>,
}

impl CannedService {
    pub fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_string(),
            delay: None,
            last_request: Mutex::new(None),
        })
    }

    pub fn slow(body: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_string(),
            delay: Some(delay),
            last_request: Mutex::new(None),
        })
    }

    pub fn last_user_text(&self) -> Option<String> {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.user.clone())
    }
}

#[async_trait]
impl CompletionService for CannedService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Pdf2AnkiError> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.body.clone())
    }
}

pub fn test_config() -> FlashcardConfig {
    FlashcardConfig::builder()
        .system_prompt("Make flashcards as a JSON array.")
        .deck_id_seed(2024)
        .build()
        .unwrap()
}

pub fn pipeline_with(
    config: FlashcardConfig,
    engine: Arc<FixedPages>,
    service: Arc<CannedService>,
) -> Arc<FlashcardPipeline> {
    Arc::new(FlashcardPipeline::new(config, engine, service))
}

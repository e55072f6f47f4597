//! Pipeline driver: PDF bytes → validated cards → `.apkg`.
//!
//! [`FlashcardPipeline`] owns the three collaborators a run needs (the PDF
//! text engine, the generation service and the deck-id RNG) and runs the
//! four stages strictly in order. One pipeline is built at startup and shared
//! by every request; each run only borrows it.
//!
//! ```text
//! bytes ─▶ extract ─▶ normalize ─▶ generate ─▶ package ─▶ DeckOutput
//!          (pdfium)   (regex)      (LLM+JSON)  (sqlite+zip)
//! ```

use crate::config::FlashcardConfig;
use crate::error::Pdf2AnkiError;
use crate::output::{DeckOutput, PipelineStats};
use crate::pipeline::cards::{save_cards_json, CardList};
use crate::pipeline::extract::{extract_text, PdfTextEngine, PdfiumTextEngine};
use crate::pipeline::llm::{generate_cards, resolve_service, CompletionService};
use crate::pipeline::normalize::normalize_text;
use crate::pipeline::{input, package};
use crate::progress::PipelineStage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cards produced from one document, before packaging.
#[derive(Debug, Clone)]
pub struct GeneratedCards {
    pub cards: CardList,
    pub stats: PipelineStats,
}

/// The configured PDF-to-deck pipeline.
pub struct FlashcardPipeline {
    config: FlashcardConfig,
    engine: Arc<dyn PdfTextEngine>,
    service: Arc<dyn CompletionService>,
    rng: Mutex<StdRng>,
}

impl FlashcardPipeline {
    /// Assemble a pipeline from explicit collaborators.
    pub fn new(
        config: FlashcardConfig,
        engine: Arc<dyn PdfTextEngine>,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        let rng = match config.deck_id_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            engine,
            service,
            rng: Mutex::new(rng),
        }
    }

    /// Build the production pipeline: pdfium for text, the backend chosen by
    /// [`resolve_service`] for generation.
    pub fn from_config(config: FlashcardConfig) -> Result<Self, Pdf2AnkiError> {
        let engine: Arc<dyn PdfTextEngine> = match &config.pdfium_lib_path {
            Some(path) => Arc::new(PdfiumTextEngine::with_library_path(path)),
            None => Arc::new(PdfiumTextEngine::new()),
        };
        let service = resolve_service(&config)?;
        Ok(Self::new(config, engine, service))
    }

    pub fn config(&self) -> &FlashcardConfig {
        &self.config
    }

    /// Draw the id for the next deck.
    pub fn next_deck_id(&self) -> i64 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        package::random_deck_id(&mut *rng)
    }

    /// Run extract → normalize → generate and return the validated cards.
    ///
    /// Writes the cards to `config.cards_json_path` when one is set.
    pub async fn cards_from_pdf(&self, pdf: &[u8]) -> Result<GeneratedCards, Pdf2AnkiError> {
        let total_start = Instant::now();

        let bytes: Arc<[u8]> = Arc::from(pdf);
        let (raw, extract_ms) = self
            .stage(
                PipelineStage::Extracting,
                extract_text(Arc::clone(&self.engine), bytes),
            )
            .await?;

        let (cleaned, normalize_ms) = self
            .stage(PipelineStage::Normalizing, async { Ok(normalize_text(&raw)) })
            .await?;
        if cleaned.is_empty() {
            warn!("No text left after cleaning; the model will see an empty document");
        }

        let (cards, generate_ms) = self
            .stage(
                PipelineStage::Generating,
                generate_cards(self.service.as_ref(), &cleaned, &self.config),
            )
            .await?;

        if let Some(ref path) = self.config.cards_json_path {
            save_cards_json(&cards, path).await?;
        }

        let stats = PipelineStats {
            raw_chars: raw.chars().count(),
            cleaned_chars: cleaned.chars().count(),
            extract_duration_ms: extract_ms,
            normalize_duration_ms: normalize_ms,
            generate_duration_ms: generate_ms,
            package_duration_ms: 0,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        debug!(
            "Text {} → {} chars ({:.0}% noise)",
            stats.raw_chars,
            stats.cleaned_chars,
            stats.noise_ratio() * 100.0
        );

        Ok(GeneratedCards { cards, stats })
    }

    /// Full run: PDF bytes in, `.apkg` written to `out_dir`.
    ///
    /// `deck_name` overrides `config.deck_name` for this run.
    pub async fn run(
        &self,
        pdf: &[u8],
        deck_name: Option<&str>,
        out_dir: &Path,
    ) -> Result<DeckOutput, Pdf2AnkiError> {
        let total_start = Instant::now();
        let deck_name = deck_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.config.deck_name.as_str())
            .to_string();
        info!("Starting deck '{}' ({} bytes of PDF)", deck_name, pdf.len());

        let GeneratedCards { cards, mut stats } = self.cards_from_pdf(pdf).await?;

        let deck_id = self.next_deck_id();
        let (package_path, package_ms) = {
            let cards = cards.clone();
            let deck_name = deck_name.clone();
            let out_dir = out_dir.to_path_buf();
            self.stage(PipelineStage::Packaging, async move {
                tokio::task::spawn_blocking(move || {
                    package::package_deck(&cards, &deck_name, deck_id, &out_dir)
                })
                .await
                .map_err(|e| Pdf2AnkiError::Internal(format!("Packaging task panicked: {e}")))?
            })
            .await?
        };

        stats.package_duration_ms = package_ms;
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

        info!(
            "Deck '{}' ready: {} cards in {}ms",
            deck_name,
            cards.len(),
            stats.total_duration_ms
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pipeline_complete(cards.len());
        }

        Ok(DeckOutput {
            package_path,
            deck_name,
            deck_id,
            cards,
            stats,
        })
    }

    /// Read a local `.pdf` file and run the pipeline on it.
    pub async fn run_file(
        &self,
        pdf_path: &Path,
        deck_name: Option<&str>,
        out_dir: &Path,
    ) -> Result<DeckOutput, Pdf2AnkiError> {
        let bytes = input::read_local_pdf(pdf_path).await?;
        self.run(&bytes, deck_name, out_dir).await
    }

    /// Time one stage and report it to the progress callback.
    async fn stage<T, F>(&self, stage: PipelineStage, fut: F) -> Result<(T, u64), Pdf2AnkiError>
    where
        F: Future<Output = Result<T, Pdf2AnkiError>>,
    {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();

        match fut.await {
            Ok(value) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!("{} finished in {}ms", stage, elapsed_ms);
                if let Some(cb) = cb {
                    cb.on_stage_complete(stage, elapsed_ms);
                }
                Ok((value, elapsed_ms))
            }
            Err(e) => {
                warn!("{} failed: {}", stage, e);
                if let Some(cb) = cb {
                    cb.on_stage_error(stage, &e.to_string());
                }
                Err(e)
            }
        }
    }
}

/// Synchronous wrapper around [`FlashcardPipeline::run_file`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from async code: inside a runtime it returns [`Pdf2AnkiError::Internal`]
/// instead of blocking.
pub fn convert_file_sync(
    pipeline: &FlashcardPipeline,
    pdf_path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
) -> Result<PathBuf, Pdf2AnkiError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Pdf2AnkiError::Internal(
            "convert_file_sync called from inside a tokio runtime; use run_file".into(),
        ));
    }
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to create tokio runtime: {e}")))?;
    let output = runtime.block_on(pipeline.run_file(pdf_path.as_ref(), None, out_dir.as_ref()))?;
    Ok(output.package_path)
}

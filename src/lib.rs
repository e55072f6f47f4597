//! # edgequake-pdf2anki
//!
//! Turn PDF documents into Anki flashcard decks with a language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    per-page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 2. Normalize  collapse whitespace, drop page markers / © lines / year ranges
//!  ├─ 3. Generate   one chat call → JSON array of {"front", "back"}
//!  ├─ 4. Validate   strict schema check; bad batches are rejected whole
//!  └─ 5. Package    SQLite collection + zip → <deck>.apkg
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2anki::{FlashcardConfig, FlashcardPipeline};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FlashcardConfig::builder()
//!         .api_key(std::fs::read_to_string("apikey.txt")?.trim())
//!         .deck_name("Biology")
//!         .build()?;
//!     let pipeline = FlashcardPipeline::from_config(config)?;
//!     let deck = pipeline
//!         .run_file(Path::new("chapter1.pdf"), None, Path::new("."))
//!         .await?;
//!     eprintln!("{} cards → {}", deck.card_count(), deck.package_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2anki` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2anki = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{read_config_file, FlashcardConfig, FlashcardConfigBuilder};
pub use convert::{convert_file_sync, FlashcardPipeline, GeneratedCards};
pub use error::{CardIssue, ErrorKind, IssueProblem, Pdf2AnkiError};
pub use output::{DeckOutput, PipelineStats};
pub use pipeline::cards::{parse_cards, CardList, Flashcard};
pub use pipeline::extract::{PdfTextEngine, PdfiumTextEngine};
pub use pipeline::llm::{CompletionRequest, CompletionService, OpenAiChatService, ProviderService};
pub use pipeline::normalize::normalize_text;
pub use pipeline::package::{inspect_package, package_deck, PackageSummary};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, PipelineStage, ProgressCallback};

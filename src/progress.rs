//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::FlashcardConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The CLI uses it to drive a spinner;
//! the HTTP server leaves it unset.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2anki::{FlashcardConfig, PipelineProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: PipelineStage) {
//!         eprintln!("{stage}…");
//!     }
//! }
//!
//! let config = FlashcardConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The four stages of one run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extracting,
    Normalizing,
    Generating,
    Packaging,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::Extracting => "Extracting text",
            PipelineStage::Normalizing => "Cleaning text",
            PipelineStage::Generating => "Generating flashcards",
            PipelineStage::Packaging => "Packaging deck",
        })
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// HTTP server shares one pipeline across request tasks.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when a stage finished successfully.
    ///
    /// # Arguments
    /// * `stage`      — the stage that finished
    /// * `elapsed_ms` — wall-clock time spent in it
    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when a stage failed; no further stage runs.
    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after the package file has been written.
    fn on_pipeline_complete(&self, card_count: usize) {
        let _ = card_count;
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FlashcardConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

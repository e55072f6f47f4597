//! Error types for the edgequake-pdf2anki library.
//!
//! Every failure is a variant of [`Pdf2AnkiError`]. The variants are grouped
//! by pipeline stage, and [`Pdf2AnkiError::kind`] folds them into the small
//! [`ErrorKind`] taxonomy callers actually branch on (the HTTP handler maps a
//! kind to a status code, the CLI only prints the message).
//!
//! Nothing here is retried. A stage either hands a valid value to the next
//! stage or the whole run stops with one of these errors.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2anki library.
#[derive(Debug, Error)]
pub enum Pdf2AnkiError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// The uploaded file name does not end in `.pdf`.
    #[error("Invalid file format. Please upload a PDF file.")]
    InvalidUpload { filename: Option<String> },

    /// A local input file could not be read.
    #[error("Cannot read input '{path}': {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` magic.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// pdfium could not open the document.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium system-wide or point --pdfium-lib / PDFIUM_LIB_PATH at a copy."
    )]
    PdfiumBindingFailed(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// No text-generation backend could be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The text-generation call itself failed (network, auth, rate limit).
    #[error("Text generation failed: {message}")]
    GenerationService { message: String },

    /// The text-generation call did not answer in time.
    #[error("Text generation timed out after {secs}s")]
    GenerationTimeout { secs: u64 },

    /// The model answered, but not with a JSON list of flashcard objects.
    ///
    /// `raw` keeps the offending response for diagnostics; it is not part of
    /// the display message.
    #[error("Model response is not a valid flashcard list: {detail}")]
    GenerationFormat { detail: String, raw: String },

    /// The model answered with a list of objects but some entries are invalid.
    #[error("Model returned invalid flashcard entries ({})", CardIssues(.issues))]
    InvalidCards { issues: Vec<CardIssue>, raw: String },

    // ── Packaging errors ──────────────────────────────────────────────────
    /// Refusing to package a deck without cards.
    #[error("Cannot create a deck without flashcards")]
    EmptyDeck,

    /// Building the collection database or archive failed.
    #[error("Failed to build deck package: {0}")]
    Packaging(String),

    /// Could not create or write a file on disk.
    #[error("Failed to write '{path}': {source}")]
    PackageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A startup file (API key, prompt) could not be read.
    #[error("Cannot read '{path}': {source}")]
    ConfigFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration values are missing or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of [`Pdf2AnkiError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Upload,
    Extraction,
    GenerationFormat,
    GenerationService,
    GenerationTimeout,
    Packaging,
    Configuration,
    Internal,
}

impl Pdf2AnkiError {
    /// Which stage of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUpload { .. } | Self::InputUnreadable { .. } => ErrorKind::Upload,
            Self::NotAPdf { .. } | Self::CorruptPdf { .. } | Self::PdfiumBindingFailed(_) => {
                ErrorKind::Extraction
            }
            Self::GenerationFormat { .. } | Self::InvalidCards { .. } => {
                ErrorKind::GenerationFormat
            }
            Self::GenerationService { .. } | Self::ProviderNotConfigured { .. } => {
                ErrorKind::GenerationService
            }
            Self::GenerationTimeout { .. } => ErrorKind::GenerationTimeout,
            Self::EmptyDeck | Self::Packaging(_) | Self::PackageWriteFailed { .. } => {
                ErrorKind::Packaging
            }
            Self::ConfigFileUnreadable { .. } | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The raw model response attached to format errors, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::GenerationFormat { raw, .. } | Self::InvalidCards { raw, .. } => Some(raw.as_str()),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Pdf2AnkiError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Packaging(format!("sqlite: {e}"))
    }
}

impl From<zip::result::ZipError> for Pdf2AnkiError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Packaging(format!("zip: {e}"))
    }
}

/// One rejected field of one generated flashcard entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CardIssue {
    /// 0-based position of the entry in the model's list.
    pub index: usize,
    /// `"front"`, `"back"`, or `"entry"` when the element is not an object.
    pub field: String,
    pub problem: IssueProblem,
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueProblem {
    Missing,
    NotAString,
    Empty,
    /// Holds a control character other than tab or a line break; Anki
    /// separates note fields with `\x1f`.
    ControlCharacter,
    NotAnObject,
}

impl fmt::Display for CardIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problem = match self.problem {
            IssueProblem::Missing => "missing",
            IssueProblem::NotAString => "not a string",
            IssueProblem::Empty => "empty",
            IssueProblem::ControlCharacter => "contains a control character",
            IssueProblem::NotAnObject => "not an object",
        };
        write!(f, "#{} {} {}", self.index, self.field, problem)
    }
}

/// Display helper: `"<n> rejected: <issue>; <issue>"`.
struct CardIssues<'a>(&'a [CardIssue]);

impl fmt::Display for CardIssues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rejected: ", self.0.len())?;
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

//! Pipeline stages for PDF-to-deck conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the PDF engine or the generation backend can be
//! swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ normalize ──▶ llm ──▶ cards ──▶ package
//! (.pdf?)   (pdfium)    (regex)       (chat)  (JSON)    (.apkg)
//! ```
//!
//! 1. [`input`]     — accept or reject an upload by file name
//! 2. [`extract`]   — per-page text via pdfium; runs in `spawn_blocking`
//! 3. [`normalize`] — strip whitespace runs, page markers, copyright lines
//!    and year ranges
//! 4. [`llm`]       — the only stage with network I/O, bounded by a timeout
//! 5. [`cards`]     — schema check of the model's JSON
//! 6. [`package`]   — SQLite collection + zip archive

pub mod cards;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod package;

//! Text normalisation: strip PDF layout noise before the text reaches the model.
//!
//! Extracted PDF text is full of line breaks from the page layout, running
//! headers such as `Page 12`, copyright footers, and year ranges from
//! citation lines. None of it helps the model write flashcards and all of it
//! costs input tokens.
//!
//! ## Rule Order
//!
//! 1. Collapse whitespace runs into a single space
//! 2. Remove page markers (`Page` + whitespace + digits)
//! 3. Remove copyright notices (`©` up to the end of the segment)
//! 4. Remove year ranges (`dddd-dddd`)
//! 5. Trim
//!
//! Whitespace is collapsed first so that a page marker split across a line
//! break (`Page\n3`) still matches, and so the copyright rule, which runs to
//! the end of the segment, sees the text as a single line.
//!
//! A removal can leave two spaces behind or glue two fragments into a new
//! artefact (`PaPage 1ge 2` becomes `Page 2`). [`normalize_text`] therefore
//! repeats the rules until the text no longer changes. Every round that
//! changes anything makes the text shorter, so this terminates, and the
//! result is a fixpoint: normalising it again is a no-op.
//!
//! Each nesting level of spliced artefacts costs one round, so the loop is
//! bounded by [`MAX_ROUNDS`]. Past that bound the text is returned as it
//! stands and may still contain artefacts.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Upper bound on rule rounds per call.
pub const MAX_ROUNDS: usize = 32;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page\s+\d+").unwrap());
static RE_COPYRIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"©.*").unwrap());
static RE_YEAR_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{4}").unwrap());

/// Normalise raw extracted text into model-ready prose.
///
/// Pure and infallible: text without artefacts only has its whitespace
/// collapsed and trimmed.
pub fn normalize_text(raw: &str) -> String {
    normalize_rounds(raw).0
}

/// Normalise and report how many rounds it took.
fn normalize_rounds(raw: &str) -> (String, usize) {
    let mut current = apply_rules(raw);
    let mut rounds = 1;
    loop {
        if rounds == MAX_ROUNDS {
            warn!("Normalisation stopped after {} rounds", MAX_ROUNDS);
            break;
        }
        let next = apply_rules(&current);
        if next == current {
            break;
        }
        current = next;
        rounds += 1;
    }
    debug!(
        "Normalised {} → {} chars in {} round(s)",
        raw.len(),
        current.len(),
        rounds
    );
    (current, rounds)
}

/// One pass of all five rules.
fn apply_rules(input: &str) -> String {
    let s = collapse_whitespace(input);
    let s = remove_page_markers(&s);
    let s = remove_copyright(&s);
    let s = remove_year_ranges(&s);
    s.trim().to_string()
}

// ── Rule 1: Collapse whitespace ──────────────────────────────────────────────

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input, " ").into_owned()
}

// ── Rule 2: Page markers ─────────────────────────────────────────────────────

fn remove_page_markers(input: &str) -> String {
    RE_PAGE_MARKER.replace_all(input, "").into_owned()
}

// ── Rule 3: Copyright notices ────────────────────────────────────────────────

fn remove_copyright(input: &str) -> String {
    RE_COPYRIGHT.replace_all(input, "").into_owned()
}

// ── Rule 4: Year ranges ──────────────────────────────────────────────────────

fn remove_year_ranges(input: &str) -> String {
    RE_YEAR_RANGE.replace_all(input, "").into_owned()
}

/// True if `text` still contains something the rules would remove or collapse.
pub fn has_artifacts(text: &str) -> bool {
    RE_PAGE_MARKER.is_match(text)
        || RE_COPYRIGHT.is_match(text)
        || RE_YEAR_RANGE.is_match(text)
        || text
            .chars()
            .zip(text.chars().skip(1))
            .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
        || text.chars().any(|c| c.is_whitespace() && c != ' ')
}

// ── Tests ────────────────────────────────────────────────────────────────────

//! Flashcard data model and validation of model output.
//!
//! The model is asked for a bare JSON array of `{"front", "back"}` objects.
//! [`parse_cards`] is the schema check between that untrusted text and the
//! packager: it either returns a [`CardList`] in which every card has two
//! non-empty sides, or an error that says exactly what was wrong.
//!
//! Policy for partially valid output: reject the whole batch. A deck that is
//! silently missing cards is worse than a clear failure the user can retry.

use crate::error::{CardIssue, IssueProblem, Pdf2AnkiError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Question side.
    pub front: String,
    /// Answer side.
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// Ordered flashcards produced by one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardList(Vec<Flashcard>);

impl CardList {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self(cards)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Flashcard> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Flashcard] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Flashcard> {
        self.0
    }
}

impl From<Vec<Flashcard>> for CardList {
    fn from(cards: Vec<Flashcard>) -> Self {
        Self(cards)
    }
}

impl<'a> IntoIterator for &'a CardList {
    type Item = &'a Flashcard;
    type IntoIter = std::slice::Iter<'a, Flashcard>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").unwrap());

/// Remove one markdown code fence wrapping the whole response, on one line
/// or several.
fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str().trim()),
        None => trimmed,
    }
}

/// Parse and validate a model response into a [`CardList`].
///
/// # Errors
/// * [`Pdf2AnkiError::GenerationFormat`] — not JSON, or not an array of objects
/// * [`Pdf2AnkiError::InvalidCards`] — an array of objects where at least one
///   entry lacks a string `front`/`back`, has an empty one, or one holding a
///   control character other than tab or a line break
pub fn parse_cards(raw: &str) -> Result<CardList, Pdf2AnkiError> {
    let body = strip_code_fence(raw);

    let value: Value = serde_json::from_str(body).map_err(|e| {
        warn!("Model response is not JSON: {}", e);
        debug!("Rejected model response:\n{}", raw);
        Pdf2AnkiError::GenerationFormat {
            detail: format!("not valid JSON ({e})"),
            raw: raw.to_string(),
        }
    })?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            warn!("Model response is JSON but not an array");
            debug!("Rejected model response:\n{}", raw);
            return Err(Pdf2AnkiError::GenerationFormat {
                detail: format!("expected a JSON array, got {}", json_type(&other)),
                raw: raw.to_string(),
            });
        }
    };

    if let Some(first) = entries.iter().find(|e| !e.is_object()) {
        if entries.iter().all(|e| !e.is_object()) {
            warn!("Model response is an array without objects");
            debug!("Rejected model response:\n{}", raw);
            return Err(Pdf2AnkiError::GenerationFormat {
                detail: format!(
                    "expected an array of objects, got an array of {}",
                    json_type(first)
                ),
                raw: raw.to_string(),
            });
        }
    }

    let mut cards = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            issues.push(CardIssue {
                index,
                field: "entry".into(),
                problem: IssueProblem::NotAnObject,
            });
            continue;
        };

        let front = required_text(obj.get("front"), index, "front", &mut issues);
        let back = required_text(obj.get("back"), index, "back", &mut issues);
        if let (Some(front), Some(back)) = (front, back) {
            cards.push(Flashcard { front, back });
        }
    }

    if !issues.is_empty() {
        warn!(
            "Rejecting model response: {} of {} entries invalid",
            issues.len(),
            entries.len()
        );
        debug!("Rejected model response:\n{}", raw);
        return Err(Pdf2AnkiError::InvalidCards {
            issues,
            raw: raw.to_string(),
        });
    }

    debug!("Validated {} flashcards", cards.len());
    Ok(CardList(cards))
}

fn required_text(
    value: Option<&Value>,
    index: usize,
    field: &str,
    issues: &mut Vec<CardIssue>,
) -> Option<String> {
    let problem = match value {
        None | Some(Value::Null) => IssueProblem::Missing,
        Some(Value::String(s)) if s.trim().is_empty() => IssueProblem::Empty,
        Some(Value::String(s)) if s.chars().any(is_forbidden_control) => {
            IssueProblem::ControlCharacter
        }
        Some(Value::String(s)) => return Some(s.trim().to_string()),
        Some(_) => IssueProblem::NotAString,
    };
    issues.push(CardIssue {
        index,
        field: field.to_string(),
        problem,
    });
    None
}

fn is_forbidden_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\n' | '\r' | '\t')
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "booleans",
        Value::Number(_) => "numbers",
        Value::String(_) => "strings",
        Value::Array(_) => "arrays",
        Value::Object(_) => "an object",
    }
}

/// Write the validated cards as pretty JSON, atomically (temp file + rename).
pub async fn save_cards_json(cards: &CardList, path: &Path) -> Result<(), Pdf2AnkiError> {
    let json = serde_json::to_string_pretty(cards)
        .map_err(|e| Pdf2AnkiError::Internal(format!("serialise cards: {e}")))?;

    let write_err = |source: std::io::Error| Pdf2AnkiError::PackageWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Saved {} cards to {}", cards.len(), path.display());
    Ok(())
}

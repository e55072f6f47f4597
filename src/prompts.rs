//! Instructional prompt for flashcard generation.
//!
//! The deployed binary reads its prompt from a file at startup
//! (`--prompt-file`); this constant is what library users get when they do
//! not set [`crate::config::FlashcardConfig::system_prompt`]. Whatever prompt
//! is used, the response contract is fixed by [`crate::pipeline::cards`]: a
//! bare JSON array of `{"front", "back"}` objects.

/// Default system prompt asking for a JSON array of question/answer pairs.
pub const DEFAULT_FLASHCARD_PROMPT: &str = r#"You are an expert teacher who writes Anki flashcards from study notes.

The user message contains text extracted from a PDF. Write flashcards that
cover its key facts, definitions, and ideas.

Rules:
1. One fact or concept per card. Questions must be answerable without
   seeing the source text.
2. Keep answers short: a word, a phrase, or at most two sentences.
3. Do not invent information that is not in the text.
4. Skip page numbers, headers, footers, and bibliography entries.

Output format:
- Output ONLY a JSON array, nothing before or after it.
- Every element is an object with exactly two string fields:
  "front" (the question) and "back" (the answer).
- Example: [{"front": "What is the powerhouse of the cell?", "back": "The mitochondrion"}]"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_both_fields() {
        assert!(DEFAULT_FLASHCARD_PROMPT.contains("\"front\""));
        assert!(DEFAULT_FLASHCARD_PROMPT.contains("\"back\""));
        assert!(DEFAULT_FLASHCARD_PROMPT.contains("JSON array"));
    }
}

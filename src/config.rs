//! Configuration for the PDF → flashcard pipeline.
//!
//! All behaviour is controlled through one [`FlashcardConfig`], built once at
//! startup via [`FlashcardConfigBuilder`] and passed by reference to the
//! pipeline. The API credential and the instructional prompt are plain
//! fields: the binary reads them from files with [`read_config_file`], tests
//! inject fake values directly.

use crate::error::Pdf2AnkiError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_FLASHCARD_PROMPT;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Deck name used when the caller does not supply one.
pub const DEFAULT_DECK_NAME: &str = "Deck_generated";

/// Chat model used by the OpenAI-compatible backend when none is set.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base URL of the OpenAI-compatible chat completions API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for a PDF-to-deck run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2anki::FlashcardConfig;
///
/// let config = FlashcardConfig::builder()
///     .api_key("sk-test")
///     .deck_name("Biology")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.deck_name, "Biology");
/// ```
#[derive(Clone)]
pub struct FlashcardConfig {
    /// Credential for the OpenAI-compatible backend.
    ///
    /// When set, generation goes through [`crate::pipeline::llm::OpenAiChatService`];
    /// when `None`, an `edgequake-llm` provider is resolved instead.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// LLM model identifier. If None, [`DEFAULT_MODEL`] (or the provider default).
    pub model: Option<String>,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed `edgequake-llm` provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Instructional (system) prompt. If None, uses [`DEFAULT_FLASHCARD_PROMPT`].
    pub system_prompt: Option<String>,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Deterministic enough that the JSON shape is stable, loose enough that
    /// questions are not copied verbatim from the source text.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A long chapter yields a few hundred cards; truncating mid-array makes
    /// the whole response invalid JSON, so the ceiling is generous.
    pub max_tokens: usize,

    /// Nucleus sampling. Default: 1.0 (disabled).
    pub top_p: f32,

    /// Timeout for one generation call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Human-readable deck name. Default: [`DEFAULT_DECK_NAME`].
    pub deck_name: String,

    /// Where to write the validated card list as JSON, for diagnostics. Default: None.
    pub cards_json_path: Option<PathBuf>,

    /// Explicit pdfium shared library. Default: None (system library).
    pub pdfium_lib_path: Option<PathBuf>,

    /// Seed for the deck-id generator. Default: None (seeded from entropy).
    pub deck_id_seed: Option<u64>,

    /// Largest accepted upload in bytes for the HTTP endpoint. Default: 32 MiB.
    pub max_upload_bytes: usize,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FlashcardConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
            provider_name: None,
            provider: None,
            system_prompt: None,
            temperature: 0.7,
            max_tokens: 8192,
            top_p: 1.0,
            api_timeout_secs: 120,
            deck_name: DEFAULT_DECK_NAME.to_string(),
            cards_json_path: None,
            pdfium_lib_path: None,
            deck_id_seed: None,
            max_upload_bytes: 32 * 1024 * 1024,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FlashcardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashcardConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "system_prompt",
                &self.system_prompt.as_ref().map(|p| format!("<{} chars>", p.len())),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("deck_name", &self.deck_name)
            .field("cards_json_path", &self.cards_json_path)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("deck_id_seed", &self.deck_id_seed)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl FlashcardConfig {
    /// Create a new builder for `FlashcardConfig`.
    pub fn builder() -> FlashcardConfigBuilder {
        FlashcardConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instructional prompt actually sent to the model.
    pub fn prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_FLASHCARD_PROMPT)
    }

    /// The model actually requested from the OpenAI-compatible backend.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`FlashcardConfig`].
#[derive(Debug)]
pub struct FlashcardConfigBuilder {
    config: FlashcardConfig,
}

impl FlashcardConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn deck_name(mut self, name: impl Into<String>) -> Self {
        self.config.deck_name = name.into();
        self
    }

    pub fn cards_json_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cards_json_path = Some(path.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn deck_id_seed(mut self, seed: u64) -> Self {
        self.config.deck_id_seed = Some(seed);
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FlashcardConfig, Pdf2AnkiError> {
        let c = &self.config;
        if c.deck_name.trim().is_empty() {
            return Err(Pdf2AnkiError::InvalidConfig(
                "Deck name must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2AnkiError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Pdf2AnkiError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if matches!(c.api_key.as_deref(), Some(k) if k.trim().is_empty()) {
            return Err(Pdf2AnkiError::InvalidConfig("API key is empty".into()));
        }
        if matches!(c.system_prompt.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(Pdf2AnkiError::InvalidConfig(
                "Instructional prompt is empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Read a startup file (API key, prompt) and return its trimmed content.
///
/// Fails when the file cannot be read or holds only whitespace.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<String, Pdf2AnkiError> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|source| Pdf2AnkiError::ConfigFileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(Pdf2AnkiError::InvalidConfig(format!(
            "'{}' is empty",
            path.display()
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_generation_parameters() {
        let c = FlashcardConfig::default();
        assert_eq!(c.temperature, 0.7);
        assert_eq!(c.max_tokens, 8192);
        assert_eq!(c.top_p, 1.0);
        assert_eq!(c.deck_name, DEFAULT_DECK_NAME);
        assert_eq!(c.model_or_default(), DEFAULT_MODEL);
        assert_eq!(c.prompt(), DEFAULT_FLASHCARD_PROMPT);
    }

    #[test]
    fn test_builder_clamps_and_trims() {
        let c = FlashcardConfig::builder()
            .temperature(9.0)
            .top_p(-1.0)
            .base_url("http://localhost:8080/v1/")
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.top_p, 0.0);
        assert_eq!(c.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_builder_rejects_blank_values() {
        assert!(FlashcardConfig::builder().deck_name("  ").build().is_err());
        assert!(FlashcardConfig::builder().api_key("").build().is_err());
        assert!(FlashcardConfig::builder().system_prompt("\n").build().is_err());
        assert!(FlashcardConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let c = FlashcardConfig::builder().api_key("sk-very-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_read_config_file_trims() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "  sk-abc  \n").unwrap();
        assert_eq!(read_config_file(f.path()).unwrap(), "sk-abc");
    }

    #[test]
    fn test_read_config_file_missing_or_empty() {
        let err = read_config_file("/definitely/not/here/apikey.txt").unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::ConfigFileUnreadable { .. }));

        let f = tempfile::NamedTempFile::new().unwrap();
        let err = read_config_file(f.path()).unwrap_err();
        assert!(matches!(err, Pdf2AnkiError::InvalidConfig(_)));
    }
}

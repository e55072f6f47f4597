//! Text generation: send cleaned text to a chat model and validate the reply.
//!
//! The pipeline only needs "system prompt + user text in, one string out",
//! so the backend sits behind the small [`CompletionService`] trait:
//!
//! * [`OpenAiChatService`] — OpenAI-compatible `/chat/completions` over
//!   `reqwest`, authenticated with the API key read from the key file.
//! * [`ProviderService`] — any `edgequake-llm` provider (OpenAI, Anthropic,
//!   Gemini, Ollama, …) resolved from the environment.
//!
//! Tests implement the trait with canned responses.
//!
//! There is no retry loop: a failed call fails the run. Every call is bounded
//! by `api_timeout_secs`.

use crate::config::FlashcardConfig;
use crate::error::Pdf2AnkiError;
use crate::pipeline::cards::{parse_cards, CardList};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Environment variable naming the `edgequake-llm` provider.
pub const PROVIDER_ENV: &str = "EDGEQUAKE_LLM_PROVIDER";
/// Environment variable naming the model for [`PROVIDER_ENV`].
pub const MODEL_ENV: &str = "EDGEQUAKE_MODEL";

/// One generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructional prompt, sent as the system message.
    pub system: String,
    /// Cleaned document text, sent as the user message.
    pub user: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl CompletionRequest {
    /// Build the fixed-parameter request for `text` from the configuration.
    pub fn from_config(config: &FlashcardConfig, text: &str) -> Self {
        Self {
            system: config.prompt().to_string(),
            user: text.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// A text-generation backend: prompt in, one text response out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Pdf2AnkiError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "completion-service"
    }
}

/// Ask the model for flashcards covering `text` and validate its answer.
///
/// # Errors
/// * [`Pdf2AnkiError::GenerationTimeout`] — no answer within `api_timeout_secs`
/// * [`Pdf2AnkiError::GenerationService`] — the backend call failed
/// * [`Pdf2AnkiError::GenerationFormat`] / [`Pdf2AnkiError::InvalidCards`] —
///   the answer is not a valid flashcard list
pub async fn generate_cards(
    service: &dyn CompletionService,
    text: &str,
    config: &FlashcardConfig,
) -> Result<CardList, Pdf2AnkiError> {
    let request = CompletionRequest::from_config(config, text);
    let start = Instant::now();
    info!(
        "Requesting flashcards from {} ({} chars of input)",
        service.name(),
        text.len()
    );

    let response = tokio::time::timeout(
        Duration::from_secs(config.api_timeout_secs),
        service.complete(&request),
    )
    .await
    .map_err(|_| {
        warn!("Generation timed out after {}s", config.api_timeout_secs);
        Pdf2AnkiError::GenerationTimeout {
            secs: config.api_timeout_secs,
        }
    })??;

    debug!(
        "Model answered with {} chars in {:?}",
        response.len(),
        start.elapsed()
    );

    parse_cards(&response)
}

// ── OpenAI-compatible backend ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    temperature: f32,
    max_tokens: usize,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl<'a> ChatCompletionBody<'a> {
    fn new(model: &'a str, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            messages: [
                WireMessage {
                    role: "system",
                    content: &request.system,
                },
                WireMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            frequency_penalty: request.frequency_penalty,
            presence_penalty: request.presence_penalty,
        }
    }
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiChatService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiChatService {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, Pdf2AnkiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pdf2AnkiError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> Pdf2AnkiError {
        if e.is_timeout() {
            Pdf2AnkiError::GenerationTimeout {
                secs: self.timeout_secs,
            }
        } else {
            Pdf2AnkiError::GenerationService {
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiChatService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Pdf2AnkiError> {
        let body = ChatCompletionBody::new(&self.model, request);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let excerpt: String = text.chars().take(300).collect();
            let message = match status.as_u16() {
                401 | 403 => format!("authentication rejected (HTTP {status}): {excerpt}"),
                429 => format!("rate limit exceeded (HTTP {status}): {excerpt}"),
                _ => format!("HTTP {status}: {excerpt}"),
            };
            return Err(Pdf2AnkiError::GenerationService { message });
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| Pdf2AnkiError::GenerationService {
                message: format!("unreadable API response: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Pdf2AnkiError::GenerationFormat {
                detail: "API response contained no message content".into(),
                raw: String::new(),
            })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ── edgequake-llm backend ────────────────────────────────────────────────────

/// Adapter from an `edgequake-llm` provider to [`CompletionService`].
pub struct ProviderService {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderService {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionService for ProviderService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Pdf2AnkiError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = completion_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| Pdf2AnkiError::GenerationService {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }

    fn name(&self) -> &str {
        "edgequake-llm"
    }
}

/// Sampling parameters of `request` in `edgequake-llm` form.
fn completion_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        top_p: Some(request.top_p),
        frequency_penalty: Some(request.frequency_penalty),
        presence_penalty: Some(request.presence_penalty),
        ..Default::default()
    }
}

/// Pick the generation backend for `config`, from most to least specific.
///
/// 1. **API key** (`config.api_key`) — OpenAI-compatible client on `base_url`.
/// 2. **Pre-built provider** (`config.provider`).
/// 3. **Named provider** (`config.provider_name`) + model.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_service(
    config: &FlashcardConfig,
) -> Result<Arc<dyn CompletionService>, Pdf2AnkiError> {
    if let Some(ref key) = config.api_key {
        let service = OpenAiChatService::new(
            key.clone(),
            config.base_url.clone(),
            config.model_or_default(),
            config.api_timeout_secs,
        )?;
        return Ok(Arc::new(service));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderService::new(Arc::clone(provider))));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider_service(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var(PROVIDER_ENV),
        std::env::var(MODEL_ENV),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider_service(&prov, &model);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pdf2AnkiError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No API key file given and no LLM provider could be auto-detected.\n\
                Provide --api-key-file, or set OPENAI_API_KEY / ANTHROPIC_API_KEY.\n\
                Error: {e}"
            ),
        })?;
    Ok(Arc::new(ProviderService::new(provider)))
}

fn create_provider_service(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn CompletionService>, Pdf2AnkiError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2AnkiError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderService::new(provider)))
}

//! CLI binary for edgequake-pdf2anki.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `FlashcardConfig`, then converts a file, serves the upload form, or
//! inspects an existing deck.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2anki::pipeline::llm::{MODEL_ENV, PROVIDER_ENV};
use edgequake_pdf2anki::{
    inspect_package, read_config_file, server, FlashcardConfig, FlashcardPipeline,
    PipelineProgressCallback, PipelineStage, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading PDF");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: PipelineStage) {
        self.bar.set_prefix(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: PipelineStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: PipelineStage, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<22} {}", red("✗"), stage.to_string(), red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_pipeline_complete(&self, _card_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF into Deck_generated.apkg in the current directory
  pdf2anki convert notes.pdf

  # Name the deck and keep the generated cards as JSON
  pdf2anki convert chapter3.pdf --deck-name "Biology ch.3" --cards-json cards.json -o decks/

  # Serve the upload form on http://127.0.0.1:5000
  pdf2anki serve

  # List the cards in an existing deck
  pdf2anki inspect decks/Deck_generated.apkg

CONFIGURATION FILES:
  apikey.txt   OpenAI API key (--api-key-file). When the default file is absent
               the provider is detected from the environment instead.
  prompt.txt   Instructional prompt (--prompt-file). When the default file is
               absent the built-in prompt is used.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          Used when no API key file is present
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Turn PDF documents into Anki flashcard decks using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2anki",
    version,
    about = "Turn PDF documents into Anki flashcard decks using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF into an .apkg deck.
    Convert(ConvertArgs),
    /// Serve the upload form and endpoint.
    Serve(ServeArgs),
    /// Print the deck and cards stored in an .apkg.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// File holding the API key.
    #[arg(long, global = true, env = "PDF2ANKI_API_KEY_FILE")]
    api_key_file: Option<PathBuf>,

    /// File holding the instructional prompt.
    #[arg(long, global = true, env = "PDF2ANKI_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, global = true, env = MODEL_ENV)]
    model: Option<String>,

    /// edgequake-llm provider used when no API key file is present.
    #[arg(long, global = true, env = PROVIDER_ENV)]
    provider: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, global = true, env = "PDF2ANKI_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDF2ANKI_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max output tokens of the generation call.
    #[arg(long, global = true, env = "PDF2ANKI_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Generation call timeout in seconds.
    #[arg(long, global = true, env = "PDF2ANKI_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to libpdfium (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2ANKI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2ANKI_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF file to convert.
    input: PathBuf,

    /// Directory for the .apkg file.
    #[arg(short, long, env = "PDF2ANKI_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Deck name shown in Anki (also the file name).
    #[arg(long, env = "PDF2ANKI_DECK_NAME", default_value = "Deck_generated")]
    deck_name: String,

    /// Also write the validated cards as JSON.
    #[arg(long, env = "PDF2ANKI_CARDS_JSON")]
    cards_json: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2ANKI_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PDF2ANKI_ADDR", default_value = "127.0.0.1:5000")]
    addr: SocketAddr,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "PDF2ANKI_MAX_UPLOAD_MB", default_value_t = 32)]
    max_upload_mb: usize,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// .apkg file to read.
    package: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

const DEFAULT_API_KEY_FILE: &str = "apikey.txt";
const DEFAULT_PROMPT_FILE: &str = "prompt.txt";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs during `convert`.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.common.quiet && !args.no_progress && !args.json,
        _ => false,
    };
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Convert(args) => run_convert(&cli.common, args, show_progress).await,
        Command::Serve(args) => run_serve(&cli.common, args).await,
        Command::Inspect(args) => run_inspect(args),
    }
}

async fn run_convert(common: &CommonArgs, args: &ConvertArgs, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn PipelineProgressCallback>)
    } else {
        None
    };

    let mut builder = base_builder(common)?.deck_name(args.deck_name.clone());
    if let Some(ref path) = args.cards_json {
        builder = builder.cards_json_path(path);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let pipeline = FlashcardPipeline::from_config(config).context("Failed to set up pipeline")?;
    let output = pipeline
        .run_file(&args.input, None, &args.output_dir)
        .await
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !common.quiet {
        eprintln!(
            "{}  {} cards  {}ms  →  {}",
            green("✔"),
            bold(&output.card_count().to_string()),
            output.stats.total_duration_ms,
            bold(&output.package_path.display().to_string()),
        );
        eprintln!(
            "   deck '{}' (id {})  {}",
            output.deck_name,
            output.deck_id,
            dim(&format!(
                "{} → {} chars after cleaning",
                output.stats.raw_chars, output.stats.cleaned_chars
            )),
        );
    }
    Ok(())
}

async fn run_serve(common: &CommonArgs, args: &ServeArgs) -> Result<()> {
    let config = base_builder(common)?
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid configuration")?;
    let pipeline = FlashcardPipeline::from_config(config).context("Failed to set up pipeline")?;

    if !common.quiet {
        eprintln!("{} Serving on {}", green("◆"), bold(&format!("http://{}", args.addr)));
    }
    server::serve(Arc::new(pipeline), args.addr)
        .await
        .context("Server failed")
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let summary = inspect_package(&args.package)
        .with_context(|| format!("Failed to read {}", args.package.display()))?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
        return Ok(());
    }

    println!("File:      {}", args.package.display());
    println!("Deck:      {} (id {})", summary.deck_name, summary.deck_id);
    println!("Model id:  {}", summary.model_id);
    println!("Cards:     {}", summary.cards.len());
    for (i, card) in summary.cards.iter().enumerate() {
        println!();
        println!("{} {}", bold(&format!("#{:<3}", i + 1)), card.front);
        println!("     {}", dim(&card.back));
    }
    Ok(())
}

/// Map shared flags and the two startup files onto a config builder.
fn base_builder(common: &CommonArgs) -> Result<edgequake_pdf2anki::FlashcardConfigBuilder> {
    let mut builder = FlashcardConfig::builder()
        .temperature(common.temperature)
        .max_tokens(common.max_tokens)
        .api_timeout_secs(common.api_timeout);

    if let Some(key) = load_startup_file(common.api_key_file.as_deref(), DEFAULT_API_KEY_FILE)? {
        builder = builder.api_key(key);
    } else {
        warn!(
            "No {} found; resolving the LLM provider from the environment",
            DEFAULT_API_KEY_FILE
        );
    }
    match load_startup_file(common.prompt_file.as_deref(), DEFAULT_PROMPT_FILE)? {
        Some(prompt) => builder = builder.system_prompt(prompt),
        None => info!("No {} found; using the built-in prompt", DEFAULT_PROMPT_FILE),
    }

    if let Some(ref model) = common.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = common.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref url) = common.base_url {
        builder = builder.base_url(url.clone());
    }
    if let Some(ref lib) = common.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    Ok(builder)
}

/// Read an explicitly requested file (must succeed), or the default file if
/// it exists.
fn load_startup_file(explicit: Option<&Path>, default: &str) -> Result<Option<String>> {
    let path = match explicit {
        Some(path) => path,
        None if Path::new(default).exists() => Path::new(default),
        None => return Ok(None),
    };
    let content =
        read_config_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(Some(content))
}

//! CLI binary for scansort.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RenameConfig` and prints the per-document results.

use anyhow::{Context, Result};
use clap::Parser;
use scansort::{run, DocumentReport, RenameConfig};
use std::io::{self, Write};
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rename everything in the "Scans" folder (prompts for the folder if omitted)
  scansort Scans

  # Preview without touching Drive
  scansort Scans --dry-run

  # German letters, local model via Ollama
  scansort Scans --provider ollama --model llama3:8b --ocr-language deu+eng

  # Machine-readable report
  scansort Scans --json > report.json

SETUP:
  1. Run an OAuth consent flow once (e.g. with the gdrive helper of your
     choice) and save the result as token.json:
       { "access_token": ..., "refresh_token": ..., "client_id": ...,
         "client_secret": ..., "expires_at": ... }
  2. Install tesseract:   apt install tesseract-ocr  (plus language packs)
  3. Start your model:    ollama pull llama3:8b && ollama serve
  4. Sort:                scansort Scans

ENVIRONMENT VARIABLES:
  SCANSORT_LLM_PROVIDER   Override provider (ollama, openai, anthropic, ...)
  SCANSORT_MODEL          Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Rename scanned PDFs in a Google Drive folder after their content.
#[derive(Parser, Debug)]
#[command(
    name = "scansort",
    version,
    about = "Rename scanned PDFs in a Google Drive folder after their content",
    long_about = "Downloads each PDF in a Google Drive folder, OCRs it with tesseract, asks a \
language model for the sender and topic, and renames the remote file accordingly \
(e.g. scan_20240117.pdf → Acme_Corp_-_Invoice_Payment.pdf).",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Drive folder to process. Prompted for interactively when omitted.
    folder: Option<String>,

    /// LLM model ID (e.g. llama3:8b, gpt-4.1-nano).
    #[arg(long, env = "SCANSORT_MODEL")]
    model: Option<String>,

    /// LLM provider: ollama, openai, anthropic, gemini, azure.
    #[arg(
        long,
        env = "SCANSORT_LLM_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          A local ollama with llama3:8b is the intended default setup."
    )]
    provider: Option<String>,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, env = "SCANSORT_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Tesseract language code(s), e.g. eng or deu+eng.
    #[arg(long, env = "SCANSORT_OCR_LANGUAGE", default_value = "eng")]
    ocr_language: String,

    /// Path to the tesseract binary.
    #[arg(long, env = "SCANSORT_TESSERACT", default_value = "tesseract")]
    tesseract_path: String,

    /// Max characters of OCR text forwarded to the model.
    #[arg(long, env = "SCANSORT_TEXT_BUDGET", default_value_t = 4000)]
    text_budget: usize,

    /// Max length of the new base name, in characters.
    #[arg(long, env = "SCANSORT_MAX_NAME_LENGTH", default_value_t = 150)]
    max_name_length: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "SCANSORT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Path to the persisted OAuth token file.
    #[arg(long, env = "SCANSORT_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,

    /// HTTP timeout for Drive requests in seconds.
    #[arg(long, env = "SCANSORT_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Report what would be renamed without renaming anything.
    #[arg(short = 'n', long, env = "SCANSORT_DRY_RUN")]
    dry_run: bool,

    /// Output the structured report as JSON instead of text.
    #[arg(long, env = "SCANSORT_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SCANSORT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the summary.
    #[arg(short, long, env = "SCANSORT_QUIET")]
    quiet: bool,
}

/// One result line per document, coloured by outcome.
fn print_document(doc: &DocumentReport, dry_run: bool) {
    match (&doc.error, doc.renamed, &doc.new_name) {
        (Some(e), _, _) => eprintln!("  {} {}", red("✗"), e),
        (None, true, Some(new_name)) => eprintln!(
            "  {} {}  →  {}",
            green("✓"),
            dim(&doc.original_name),
            bold(new_name)
        ),
        (None, false, Some(new_name)) if dry_run && *new_name != doc.original_name => eprintln!(
            "  {} {}  →  {}  {}",
            cyan("→"),
            dim(&doc.original_name),
            bold(new_name),
            dim("(dry run)")
        ),
        _ => eprintln!("  {} {}  {}", dim("="), doc.original_name, dim("(unchanged)")),
    }
}

fn prompt_for_folder() -> Result<String> {
    eprint!("Enter the folder name: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read folder name from stdin")?;
    let folder = line.trim().to_string();
    anyhow::ensure!(!folder.is_empty(), "No folder name given");
    Ok(folder)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let folder = match cli.folder {
        Some(ref folder) => folder.clone(),
        None => prompt_for_folder()?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = RenameConfig::builder()
        .dpi(cli.dpi)
        .ocr_language(cli.ocr_language.as_str())
        .tesseract_path(cli.tesseract_path.as_str())
        .text_budget(cli.text_budget)
        .max_name_length(cli.max_name_length)
        .temperature(cli.temperature)
        .token_file(&cli.token_file)
        .request_timeout_secs(cli.timeout)
        .dry_run(cli.dry_run);
    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run(&folder, &config)
        .await
        .with_context(|| format!("Processing folder '{folder}' failed"))?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        for doc in &report.documents {
            print_document(doc, cli.dry_run);
        }
    }

    let s = &report.stats;
    let failed = s.skipped + s.rename_failures;
    let renamed_part = if cli.dry_run {
        cyan(&format!("{} would be renamed", s.would_rename))
    } else {
        green(&format!("{} renamed", s.renamed))
    };
    eprintln!(
        "{}  {} documents  {}  {} unchanged  {} failed  {}",
        if failed == 0 { green("✔") } else { cyan("⚠") },
        bold(&s.total_documents.to_string()),
        renamed_part,
        dim(&s.unchanged.to_string()),
        if failed == 0 {
            dim(&failed.to_string())
        } else {
            red(&failed.to_string())
        },
        dim(&format!("{}ms", s.total_duration_ms)),
    );

    Ok(())
}

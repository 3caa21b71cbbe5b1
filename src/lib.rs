//! # scansort
//!
//! Rename scanned PDFs in a Google Drive folder after their content.
//!
//! ## Why this crate?
//!
//! Document scanners upload files named `scan_20240117_093214.pdf`. Finding
//! last year's insurance letter among two hundred of those means opening
//! them one by one. This crate reads each scan the way a human filing clerk
//! would: look at the page, note who sent it and what it is about, and
//! rename the file accordingly, e.g. `Acme_Corp_-_Invoice_Payment.pdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Drive folder
//!  │
//!  ├─ 1. List      PDFs in the named folder (Drive REST v3)
//!  └─ per document, strictly in sequence:
//!      ├─ 2. Download   file content to a temp PDF
//!      ├─ 3. Render     rasterise pages via pdfium (spawn_blocking)
//!      ├─ 4. OCR        tesseract over each page's temp PNG
//!      ├─ 5. Topic      LLM turns the text into "SENDER - TOPIC"
//!      ├─ 6. Sanitise   topic line → safe file name stem
//!      └─ 7. Rename     PATCH the new name back to Drive
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scansort::{run, RenameConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider resolved from config or environment; token.json must
//!     // exist from a prior OAuth consent.
//!     let config = RenameConfig::builder()
//!         .provider_name("ollama")
//!         .model("llama3:8b")
//!         .build()?;
//!     let report = run("Scans", &config).await?;
//!     println!(
//!         "{} renamed, {} unchanged, {} skipped",
//!         report.stats.renamed, report.stats.unchanged, report.stats.skipped
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Tiers
//!
//! | Tier | Example | Effect |
//! |------|---------|--------|
//! | Fatal | bad token, folder not found | run aborts with [`ScanSortError`] |
//! | Document | download error, no topic | [`DocError`] in the report, next document runs |
//! | Page | one page won't render or OCR | page skipped, document continues |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `scansort` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! scansort = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod drive;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RenameConfig, RenameConfigBuilder};
pub use drive::{Drive, DriveFile, GoogleDrive, StoredToken};
pub use error::{DocError, ScanSortError};
pub use pipeline::llm::{CompletionClient, ProviderClient, TopicInferencer};
pub use pipeline::ocr::{OcrEngine, OcrExtractor, TesseractOcr, TextExtractor};
pub use pipeline::sanitize::sanitize_topic;
pub use process::{run, run_with_drive, DocumentProcessor};
pub use report::{DocumentReport, RunReport, RunStats};

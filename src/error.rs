//! Error types for the scansort library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ScanSortError`] — **Fatal**: the run cannot proceed at all
//!   (authentication failed, target folder not found, invalid config).
//!   Returned as `Err(ScanSortError)` from [`crate::process::run`].
//!
//! * [`DocError`] — **Document-fatal**: one document failed (download error,
//!   unreadable PDF, no usable text, no topic, rename rejected) but every
//!   other document in the folder is unaffected. Stored inside
//!   [`crate::report::DocumentReport`] so callers can inspect partial
//!   success rather than losing the whole run to one bad scan.
//!
//! A third tier exists but has no public type: per-page rasterisation and
//! OCR failures are absorbed inside the text extractor. They degrade
//! extraction quality, not correctness, and never surface past it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the scansort library.
///
/// Document-level failures use [`DocError`] and are stored in
/// [`crate::report::DocumentReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ScanSortError {
    // ── Drive errors ──────────────────────────────────────────────────────
    /// No usable Drive session could be established.
    #[error("Drive authentication failed: {reason}\nProvision a token file (see --token-file) and try again.")]
    AuthFailed { reason: String },

    /// The requested folder does not exist (or is trashed).
    #[error("Drive folder '{name}' not found")]
    FolderNotFound { name: String },

    /// A Drive API request failed.
    #[error("Drive request failed while {context}: {reason}")]
    DriveApi { context: String, reason: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The downloaded file could not be opened as a PDF at all.
    #[error("Cannot open PDF '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR engine could not be invoked or rejected the image.
    #[error("OCR failed: {detail}")]
    Ocr { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing daemon, key, etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The inference service returned an error.
    #[error("LLM error: {message}")]
    Llm { message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Recorded in [`crate::report::DocumentReport`] when a document fails.
/// The loop over documents continues regardless.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocError {
    /// Downloading the file's content from Drive failed.
    #[error("'{name}': download failed: {detail}")]
    Download { name: String, detail: String },

    /// The downloaded bytes could not be opened as a PDF.
    #[error("'{name}': unreadable PDF: {detail}")]
    UnreadablePdf { name: String, detail: String },

    /// OCR produced no usable text (all pages empty or failed).
    #[error("'{name}': no text could be extracted")]
    EmptyText { name: String },

    /// The language model produced no topic.
    #[error("'{name}': no topic could be inferred")]
    NoTopic { name: String },

    /// The Drive rename request was rejected.
    #[error("'{name}': rename to '{new_name}' failed: {detail}")]
    RenameFailed {
        name: String,
        new_name: String,
        detail: String,
    },
}

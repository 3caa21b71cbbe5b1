//! Result types for a rename run.
//!
//! A run never fails because individual documents fail; instead each document
//! gets a [`DocumentReport`] and the whole run is summarised in [`RunStats`].
//! Everything serialises to JSON so the CLI's `--json` mode and downstream
//! tooling can consume it directly.

use crate::error::DocError;
use serde::{Deserialize, Serialize};

/// Outcome of processing a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Drive file identifier.
    pub file_id: String,
    /// Display name before processing.
    pub original_name: String,
    /// The candidate name produced by the pipeline, when it got that far.
    /// Present for renamed, unchanged, and dry-run documents.
    pub new_name: Option<String>,
    /// Whether a rename request was issued and accepted.
    pub renamed: bool,
    /// Set when the document was skipped or its rename failed.
    pub error: Option<DocError>,
    /// Wall-clock time spent on this document.
    pub duration_ms: u64,
}

impl DocumentReport {
    /// The document reached the end of the pipeline without an error
    /// (renamed, unchanged, or dry-run).
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Documents found in the folder listing.
    pub total_documents: usize,
    /// Rename requests issued and accepted.
    pub renamed: usize,
    /// Candidate name equalled the original; no request issued.
    pub unchanged: usize,
    /// Dry run only: candidate differed but no request was issued.
    pub would_rename: usize,
    /// Skipped before the rename step (download/OCR/topic failures).
    pub skipped: usize,
    /// Rename requests issued and rejected.
    pub rename_failures: usize,
    /// Total wall-clock duration of the run.
    pub total_duration_ms: u64,
}

/// Full output of one run: per-document outcomes plus aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// One entry per listed document, in listing order.
    pub documents: Vec<DocumentReport>,
    pub stats: RunStats,
}

impl RunReport {
    /// Build a report from per-document outcomes, deriving the aggregates.
    pub fn from_documents(documents: Vec<DocumentReport>, total_duration_ms: u64) -> Self {
        let mut stats = RunStats {
            total_documents: documents.len(),
            total_duration_ms,
            ..RunStats::default()
        };
        for doc in &documents {
            match (&doc.error, doc.renamed, &doc.new_name) {
                (Some(DocError::RenameFailed { .. }), _, _) => stats.rename_failures += 1,
                (Some(_), _, _) => stats.skipped += 1,
                (None, true, _) => stats.renamed += 1,
                // A differing candidate without a rename request only occurs
                // in a dry run; an equal candidate is a genuine no-op.
                (None, false, Some(new_name)) if *new_name != doc.original_name => {
                    stats.would_rename += 1
                }
                (None, false, _) => stats.unchanged += 1,
            }
        }
        Self { documents, stats }
    }
}

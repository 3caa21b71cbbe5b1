//! Orchestration: walk a Drive folder and rename each PDF after its content.
//!
//! [`run`] is the library entry point; [`DocumentProcessor`] carries the
//! pipeline pieces and processes documents strictly one at a time. The
//! sequential loop is deliberate: tesseract saturates a core per page, the
//! typical target is a local model that serialises requests anyway, and a
//! shoebox of scans has tens of documents, not thousands.
//!
//! Per-document failures become [`DocError`] entries in the report and the
//! loop moves on; only setup failures (auth, missing folder, unconfigured
//! provider) abort the run.

use crate::config::RenameConfig;
use crate::drive::{Drive, DriveFile, GoogleDrive};
use crate::error::{DocError, ScanSortError};
use crate::pipeline::llm::{resolve_provider, ProviderClient, TopicInferencer};
use crate::pipeline::ocr::{OcrExtractor, TextExtractor};
use crate::pipeline::sanitize::sanitize_topic;
use crate::report::{DocumentReport, RunReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Rename every PDF in the named Drive folder after its sender and topic.
///
/// Fatal setup problems (bad token, unknown folder, unconfigured provider)
/// return `Err`; everything after that is reported per document in the
/// returned [`RunReport`].
pub async fn run(folder_name: &str, config: &RenameConfig) -> Result<RunReport, ScanSortError> {
    let processor = DocumentProcessor::from_config(config)?;
    let drive = GoogleDrive::connect(config).await?;
    run_with_drive(folder_name, &drive, &processor).await
}

/// [`run`] against an already-connected [`Drive`].
///
/// This is the whole run minus construction: look up the folder, list its
/// PDFs, process them. An unknown folder is the one fatal error past this
/// point; per-document failures land in the report.
pub async fn run_with_drive(
    folder_name: &str,
    drive: &dyn Drive,
    processor: &DocumentProcessor,
) -> Result<RunReport, ScanSortError> {
    let folder_id = drive
        .find_folder(folder_name)
        .await?
        .ok_or_else(|| ScanSortError::FolderNotFound {
            name: folder_name.to_string(),
        })?;

    let files = drive.list_pdfs(&folder_id).await?;
    info!("Found {} PDF files in '{}'", files.len(), folder_name);

    Ok(processor.process_all(drive, &files).await)
}

/// What a successfully completed document looked like.
struct Outcome {
    new_name: Option<String>,
    renamed: bool,
}

/// The per-document pipeline: download, OCR, topic, sanitise, rename.
pub struct DocumentProcessor {
    extractor: Arc<dyn TextExtractor>,
    inferencer: TopicInferencer,
    max_name_length: usize,
    dry_run: bool,
}

impl DocumentProcessor {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        inferencer: TopicInferencer,
        max_name_length: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            extractor,
            inferencer,
            max_name_length,
            dry_run,
        }
    }

    /// Wire up the real pipeline from a config: tesseract-backed extraction
    /// and a resolved LLM provider. Fails fast if no provider is available,
    /// before any Drive traffic happens.
    pub fn from_config(config: &RenameConfig) -> Result<Self, ScanSortError> {
        let provider = resolve_provider(config)?;
        let client = Arc::new(ProviderClient::new(
            provider,
            config.temperature,
            config.max_tokens,
        ));
        let inferencer =
            TopicInferencer::new(client, config.prompt_template.clone(), config.text_budget);
        let extractor = Arc::new(OcrExtractor::from_config(config));

        Ok(Self::new(
            extractor,
            inferencer,
            config.max_name_length,
            config.dry_run,
        ))
    }

    /// Process every file in listing order, one at a time.
    pub async fn process_all(&self, drive: &dyn Drive, files: &[DriveFile]) -> RunReport {
        let start = Instant::now();
        let total = files.len();
        let mut documents = Vec::with_capacity(total);

        for (idx, file) in files.iter().enumerate() {
            info!("Processing '{}' ({}/{})", file.name, idx + 1, total);
            documents.push(self.process_one(drive, file).await);
        }

        RunReport::from_documents(documents, start.elapsed().as_millis() as u64)
    }

    /// Process a single document. Never fails; failures land in the report.
    pub async fn process_one(&self, drive: &dyn Drive, file: &DriveFile) -> DocumentReport {
        let start = Instant::now();

        let (new_name, renamed, error) = match self.pipeline(drive, file).await {
            Ok(outcome) => (outcome.new_name, outcome.renamed, None),
            Err(e) => {
                warn!("{}", e);
                (None, false, Some(e))
            }
        };

        DocumentReport {
            file_id: file.id.clone(),
            original_name: file.name.clone(),
            new_name,
            renamed,
            error,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn pipeline(&self, drive: &dyn Drive, file: &DriveFile) -> Result<Outcome, DocError> {
        let name = file.name.clone();

        // The temp PDF lives for exactly this function; the drop at any
        // early return deletes it.
        let tmp = tempfile::Builder::new()
            .prefix("scansort-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| DocError::Download {
                name: name.clone(),
                detail: format!("temp file: {}", e),
            })?;

        drive
            .download_to(&file.id, tmp.path())
            .await
            .map_err(|e| DocError::Download {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        let text = self
            .extractor
            .extract(tmp.path())
            .await
            .map_err(|e| DocError::UnreadablePdf {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        if text.is_empty() {
            return Err(DocError::EmptyText { name });
        }

        let topic = self
            .inferencer
            .infer(&text)
            .await
            .ok_or(DocError::NoTopic { name: name.clone() })?;

        let stem = sanitize_topic(&topic, self.max_name_length);
        let candidate = with_original_extension(&file.name, &stem);

        if candidate == file.name {
            info!("'{}' already has its target name", file.name);
            return Ok(Outcome {
                new_name: Some(candidate),
                renamed: false,
            });
        }

        if self.dry_run {
            info!("Would rename '{}' to '{}'", file.name, candidate);
            return Ok(Outcome {
                new_name: Some(candidate),
                renamed: false,
            });
        }

        drive
            .rename(&file.id, &candidate)
            .await
            .map_err(|e| DocError::RenameFailed {
                name: name.clone(),
                new_name: candidate.clone(),
                detail: e.to_string(),
            })?;

        info!("Renamed '{}' to '{}'", file.name, candidate);
        Ok(Outcome {
            new_name: Some(candidate),
            renamed: true,
        })
    }
}

/// Attach the original file's extension to the sanitised stem.
fn with_original_extension(original_name: &str, stem: &str) -> String {
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

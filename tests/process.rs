//! Orchestration tests against in-memory Drive, extraction, and completion
//! fakes. The real pdfium/tesseract/HTTP layers have their own unit tests;
//! here we verify the document loop: what gets renamed, what gets skipped,
//! and that one bad document never takes its neighbours down.

use async_trait::async_trait;
use scansort::{
    run_with_drive, CompletionClient, DocError, DocumentProcessor, Drive, DriveFile,
    ScanSortError, TextExtractor, TopicInferencer,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Drive fake: files with fixed content, scriptable rename outcomes, and a
/// record of every rename request.
struct MockDrive {
    files: Vec<DriveFile>,
    contents: HashMap<String, Result<String, String>>,
    rename_results: HashMap<String, Result<(), String>>,
    renames: Mutex<Vec<(String, String)>>,
}

impl MockDrive {
    fn new(docs: Vec<(&str, &str, &str)>) -> Self {
        let files = docs
            .iter()
            .map(|(id, name, _)| DriveFile {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        let contents = docs
            .iter()
            .map(|(id, _, content)| (id.to_string(), Ok(content.to_string())))
            .collect();
        Self {
            files,
            contents,
            rename_results: HashMap::new(),
            renames: Mutex::new(Vec::new()),
        }
    }

    fn failing_download(mut self, id: &str, detail: &str) -> Self {
        self.contents
            .insert(id.to_string(), Err(detail.to_string()));
        self
    }

    fn failing_rename(mut self, id: &str, detail: &str) -> Self {
        self.rename_results
            .insert(id.to_string(), Err(detail.to_string()));
        self
    }

    fn renames(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }
}

#[async_trait]
impl Drive for MockDrive {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, ScanSortError> {
        Ok((name == "Scans").then(|| "folder-1".to_string()))
    }

    async fn list_pdfs(&self, _folder_id: &str) -> Result<Vec<DriveFile>, ScanSortError> {
        Ok(self.files.clone())
    }

    async fn download_to(&self, file_id: &str, dest: &Path) -> Result<(), ScanSortError> {
        match self.contents.get(file_id) {
            Some(Ok(content)) => {
                std::fs::write(dest, content).unwrap();
                Ok(())
            }
            Some(Err(detail)) => Err(ScanSortError::DriveApi {
                context: "file download".into(),
                reason: detail.clone(),
            }),
            None => Err(ScanSortError::DriveApi {
                context: "file download".into(),
                reason: "no such file".into(),
            }),
        }
    }

    async fn rename(&self, file_id: &str, new_name: &str) -> Result<(), ScanSortError> {
        self.renames
            .lock()
            .unwrap()
            .push((file_id.to_string(), new_name.to_string()));
        match self.rename_results.get(file_id) {
            Some(Err(detail)) => Err(ScanSortError::DriveApi {
                context: "file rename".into(),
                reason: detail.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Extractor fake: the "OCR result" is simply the downloaded file's content.
/// Content starting with `CORRUPT` simulates a PDF that won't open.
struct FileTextExtractor;

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, pdf_path: &Path) -> Result<String, ScanSortError> {
        let content = std::fs::read_to_string(pdf_path).unwrap();
        if let Some(detail) = content.strip_prefix("CORRUPT:") {
            return Err(ScanSortError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: detail.to_string(),
            });
        }
        Ok(content)
    }
}

/// Completion fake: answers with the first response whose keyword appears in
/// the prompt, blank otherwise. Counts calls.
struct KeywordClient {
    responses: Vec<(&'static str, &'static str)>,
    calls: Mutex<usize>,
}

impl KeywordClient {
    fn new(responses: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            responses,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CompletionClient for KeywordClient {
    async fn complete(&self, prompt: &str) -> Result<String, ScanSortError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .responses
            .iter()
            .find(|(keyword, _)| prompt.contains(keyword))
            .map(|(_, response)| response.to_string())
            .unwrap_or_default())
    }
}

fn processor(client: Arc<KeywordClient>, dry_run: bool) -> DocumentProcessor {
    DocumentProcessor::new(
        Arc::new(FileTextExtractor),
        TopicInferencer::new(client, None, 4000),
        150,
        dry_run,
    )
}

#[tokio::test]
async fn renames_a_document_after_its_content() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "Invoice #123\nAcme Corp")]);
    let client = Arc::new(KeywordClient::new(vec![(
        "Acme",
        "Acme Corp - Invoice Payment",
    )]));

    let report = processor(Arc::clone(&client), false)
        .process_all(&drive, &drive.files)
        .await;

    assert_eq!(
        drive.renames(),
        vec![("id1".to_string(), "Acme_Corp_-_Invoice_Payment.pdf".to_string())]
    );
    assert_eq!(report.stats.renamed, 1);
    assert!(report.documents[0].renamed);
    assert_eq!(
        report.documents[0].new_name.as_deref(),
        Some("Acme_Corp_-_Invoice_Payment.pdf")
    );
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn already_named_document_issues_no_rename() {
    let drive = MockDrive::new(vec![(
        "id1",
        "Acme_Corp_-_Invoice_Payment.pdf",
        "Invoice #123\nAcme Corp",
    )]);
    let client = Arc::new(KeywordClient::new(vec![(
        "Acme",
        "Acme Corp - Invoice Payment",
    )]));

    let report = processor(client, false)
        .process_all(&drive, &drive.files)
        .await;

    assert!(drive.renames().is_empty());
    assert_eq!(report.stats.unchanged, 1);
    assert!(report.documents[0].is_ok());
    assert!(!report.documents[0].renamed);
}

#[tokio::test]
async fn dry_run_reports_the_candidate_without_renaming() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "Invoice #123\nAcme Corp")]);
    let client = Arc::new(KeywordClient::new(vec![(
        "Acme",
        "Acme Corp - Invoice Payment",
    )]));

    let report = processor(client, true)
        .process_all(&drive, &drive.files)
        .await;

    assert!(drive.renames().is_empty());
    assert!(!report.documents[0].renamed);
    assert_eq!(
        report.documents[0].new_name.as_deref(),
        Some("Acme_Corp_-_Invoice_Payment.pdf")
    );
    assert_eq!(report.stats.would_rename, 1);
    assert_eq!(report.stats.unchanged, 0);
}

#[tokio::test]
async fn unknown_folder_aborts_the_run() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "Acme reminder")]);
    let client = Arc::new(KeywordClient::new(vec![("Acme", "Acme - Reminder")]));

    let result = run_with_drive("Holidays", &drive, &processor(client, false)).await;

    match result {
        Err(ScanSortError::FolderNotFound { name }) => assert_eq!(name, "Holidays"),
        other => panic!("expected FolderNotFound, got {other:?}"),
    }
    assert!(drive.renames().is_empty());
}

#[tokio::test]
async fn document_failures_do_not_abort_the_run() {
    // The fatal tier stops at folder lookup; past it, even a folder where
    // every document fails still completes with an Ok report.
    let drive = MockDrive::new(vec![
        ("id1", "scan_001.pdf", "unused"),
        ("id2", "scan_002.pdf", "Acme reminder"),
    ])
    .failing_download("id1", "connection reset")
    .failing_rename("id2", "HTTP 500");
    let client = Arc::new(KeywordClient::new(vec![("Acme", "Acme - Reminder")]));

    let report = run_with_drive("Scans", &drive, &processor(client, false))
        .await
        .expect("per-document failures must not abort the run");

    assert_eq!(report.stats.total_documents, 2);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.rename_failures, 1);
}

#[tokio::test]
async fn rename_failure_is_recorded_and_does_not_block_the_next_document() {
    let drive = MockDrive::new(vec![
        ("id1", "scan_001.pdf", "Acme reminder"),
        ("id2", "scan_002.pdf", "Globex offer"),
    ])
    .failing_rename("id1", "HTTP 500");
    let client = Arc::new(KeywordClient::new(vec![
        ("Acme", "Acme - Reminder"),
        ("Globex", "Globex - Offer"),
    ]));

    let report = processor(client, false)
        .process_all(&drive, &drive.files)
        .await;

    // Both renames were attempted, in listing order.
    let renames = drive.renames();
    assert_eq!(renames.len(), 2);
    assert_eq!(renames[1], ("id2".to_string(), "Globex_-_Offer.pdf".to_string()));

    assert!(matches!(
        report.documents[0].error,
        Some(DocError::RenameFailed { .. })
    ));
    assert!(report.documents[1].renamed);
    assert_eq!(report.stats.rename_failures, 1);
    assert_eq!(report.stats.renamed, 1);
}

#[tokio::test]
async fn download_failure_skips_the_document() {
    let drive = MockDrive::new(vec![
        ("id1", "scan_001.pdf", "unused"),
        ("id2", "scan_002.pdf", "Globex offer"),
    ])
    .failing_download("id1", "connection reset");
    let client = Arc::new(KeywordClient::new(vec![("Globex", "Globex - Offer")]));

    let report = processor(client, false)
        .process_all(&drive, &drive.files)
        .await;

    assert!(matches!(
        report.documents[0].error,
        Some(DocError::Download { .. })
    ));
    assert!(report.documents[1].renamed);
    assert_eq!(report.stats.skipped, 1);
}

#[tokio::test]
async fn empty_text_skips_the_document_without_calling_the_model() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "")]);
    let client = Arc::new(KeywordClient::new(vec![]));

    let report = processor(Arc::clone(&client), false)
        .process_all(&drive, &drive.files)
        .await;

    assert!(matches!(
        report.documents[0].error,
        Some(DocError::EmptyText { .. })
    ));
    assert_eq!(client.calls(), 0);
    assert!(drive.renames().is_empty());
}

#[tokio::test]
async fn unreadable_pdf_skips_the_document() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "CORRUPT:bad xref")]);
    let client = Arc::new(KeywordClient::new(vec![]));

    let report = processor(Arc::clone(&client), false)
        .process_all(&drive, &drive.files)
        .await;

    assert!(matches!(
        report.documents[0].error,
        Some(DocError::UnreadablePdf { .. })
    ));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn blank_model_response_means_no_topic() {
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "illegible smudges")]);
    let client = Arc::new(KeywordClient::new(vec![]));

    let report = processor(Arc::clone(&client), false)
        .process_all(&drive, &drive.files)
        .await;

    assert!(matches!(
        report.documents[0].error,
        Some(DocError::NoTopic { .. })
    ));
    assert_eq!(client.calls(), 1);
    assert!(drive.renames().is_empty());
    assert_eq!(report.stats.skipped, 1);
}

#[tokio::test]
async fn garbage_topic_still_produces_a_usable_name() {
    // The sanitiser falls back to "Untitled" when the model's answer
    // contains nothing usable.
    let drive = MockDrive::new(vec![("id1", "scan_001.pdf", "Acme something")]);
    let client = Arc::new(KeywordClient::new(vec![("Acme", "???///***")]));

    let report = processor(client, false)
        .process_all(&drive, &drive.files)
        .await;

    assert_eq!(
        drive.renames(),
        vec![("id1".to_string(), "Untitled.pdf".to_string())]
    );
    assert!(report.documents[0].renamed);
}

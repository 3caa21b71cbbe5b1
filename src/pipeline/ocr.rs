//! Text extraction: rasterised PDF pages → OCR'd text blob.
//!
//! The extractor writes each rendered page to its own temporary PNG, hands
//! that file to the OCR engine, and joins the per-page results. Two traits
//! form the seams:
//!
//! * [`TextExtractor`] — the whole-document contract the processor depends
//!   on, so orchestration tests don't need pdfium or tesseract.
//! * [`OcrEngine`] — one image in, text out. [`TesseractOcr`] shells out to
//!   the tesseract CLI; tests script the engine instead.
//!
//! ## Failure model
//!
//! A page that fails to render or OCR contributes nothing to the output and
//! the next page still runs; only failure to open the PDF aborts extraction.
//! Every page gets a temp image slot and every slot is deleted before this
//! module returns, whether or not its page succeeded.

use crate::config::RenameConfig;
use crate::error::ScanSortError;
use crate::pipeline::render::{self, PageRaster};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Whole-document text extraction.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Produce the OCR'd text of a local PDF.
    ///
    /// `Err` means the PDF could not be opened at all. An unreadable page
    /// set yields `Ok("")`, which callers must treat as "no usable text".
    async fn extract(&self, pdf_path: &Path) -> Result<String, ScanSortError>;
}

/// One raster image in, plain text out.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_path: &Path) -> Result<String, ScanSortError>;
}

/// OCR engine backed by the tesseract CLI.
///
/// Invokes `tesseract <image> stdout -l <language>`; requires tesseract to
/// be installed and reachable via the configured binary path.
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image_path: &Path) -> Result<String, ScanSortError> {
        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| ScanSortError::Ocr {
                detail: format!(
                    "failed to run '{}' (is tesseract installed?): {}",
                    self.binary, e
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanSortError::Ocr {
                detail: format!(
                    "tesseract exited with {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// [`TextExtractor`] that rasterises via pdfium and OCRs every page.
pub struct OcrExtractor {
    ocr: Arc<dyn OcrEngine>,
    dpi: u32,
}

impl OcrExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>, dpi: u32) -> Self {
        Self { ocr, dpi }
    }

    /// Build an extractor with a [`TesseractOcr`] engine from the config.
    pub fn from_config(config: &RenameConfig) -> Self {
        Self::new(
            Arc::new(TesseractOcr::new(
                config.tesseract_path.clone(),
                config.ocr_language.clone(),
            )),
            config.dpi,
        )
    }
}

#[async_trait]
impl TextExtractor for OcrExtractor {
    async fn extract(&self, pdf_path: &Path) -> Result<String, ScanSortError> {
        let pages = render::rasterize_pages(pdf_path, self.dpi).await?;
        info!("Running OCR over {} pages", pages.len());

        let work_dir = tempfile::tempdir()
            .map_err(|e| ScanSortError::Internal(format!("temp image directory: {}", e)))?;

        // The TempDir drop after this call is a backstop; ocr_page_images
        // deletes every page image itself before returning.
        ocr_page_images(self.ocr.as_ref(), pages, work_dir.path()).await
    }
}

/// OCR a set of rendered page slots, isolating per-page failures.
///
/// Every slot gets a temp image file in `work_dir`, created before we know
/// whether its page rendered; all of them are deleted before returning.
/// Pages that fail anywhere contribute no entry to the joined output, so the
/// result is the successful pages' text joined by `"\n"` in page order,
/// trimmed.
async fn ocr_page_images(
    ocr: &dyn OcrEngine,
    pages: Vec<PageRaster>,
    work_dir: &Path,
) -> Result<String, ScanSortError> {
    let total = pages.len();
    let mut image_paths = Vec::with_capacity(total);
    let mut texts: Vec<String> = Vec::new();

    for page in pages {
        let page_no = page.index + 1;
        let img_path = work_dir.join(format!("page-{page_no:04}.png"));

        if let Err(e) = std::fs::File::create(&img_path) {
            warn!("Skipping page {}/{}: temp image: {}", page_no, total, e);
            continue;
        }
        image_paths.push(img_path.clone());

        let image = match page.image {
            Ok(image) => image,
            Err(detail) => {
                warn!(
                    "Skipping page {}/{}: rasterisation failed: {}",
                    page_no, total, detail
                );
                continue;
            }
        };

        if let Err(e) = image.save(&img_path) {
            warn!("Skipping page {}/{}: PNG encoding failed: {}", page_no, total, e);
            continue;
        }

        match ocr.recognize(&img_path).await {
            Ok(text) => {
                debug!("Page {}/{} processed", page_no, total);
                texts.push(text);
            }
            Err(e) => warn!("OCR failed for page {}/{}: {}", page_no, total, e),
        }
    }

    for path in &image_paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to clean up temp image {}: {}", path.display(), e);
        }
    }

    Ok(texts.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// OCR engine that replays a script, one entry per call, and records
    /// the path (and its existence at call time) it was handed.
    struct ScriptedOcr {
        script: Mutex<VecDeque<Result<String, String>>>,
        calls: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl ScriptedOcr {
        fn new(script: Vec<Result<&str, &str>>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|r| r.map(String::from).map_err(String::from))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(PathBuf, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OcrEngine for ScriptedOcr {
        async fn recognize(&self, image_path: &Path) -> Result<String, ScanSortError> {
            self.calls
                .lock()
                .unwrap()
                .push((image_path.to_path_buf(), image_path.exists()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("more OCR calls than scripted")
                .map_err(|detail| ScanSortError::Ocr { detail })
        }
    }

    fn page(index: usize) -> PageRaster {
        PageRaster {
            index,
            image: Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                4,
                4,
                Rgba([255, 255, 255, 255]),
            ))),
        }
    }

    fn failed_page(index: usize) -> PageRaster {
        PageRaster {
            index,
            image: Err("render glitch".into()),
        }
    }

    fn files_in(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn joins_pages_in_order_and_cleans_up() {
        let ocr = ScriptedOcr::new(vec![Ok("first"), Ok("second"), Ok("third")]);
        let dir = tempfile::tempdir().unwrap();

        let text = ocr_page_images(&ocr, vec![page(0), page(1), page(2)], dir.path())
            .await
            .unwrap();

        assert_eq!(text, "first\nsecond\nthird");
        let calls = ocr.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(path, existed)| {
            *existed && path.starts_with(dir.path())
        }));
        assert_eq!(files_in(dir.path()), 0, "all page images must be deleted");
    }

    #[tokio::test]
    async fn ocr_failure_skips_page_but_keeps_the_rest() {
        // 3 pages, page 2 fails OCR: output from exactly the other 2 pages,
        // in page order, and all 3 temp images are created and deleted.
        let ocr = ScriptedOcr::new(vec![Ok("p1"), Err("engine crashed"), Ok("p3")]);
        let dir = tempfile::tempdir().unwrap();

        let text = ocr_page_images(&ocr, vec![page(0), page(1), page(2)], dir.path())
            .await
            .unwrap();

        assert_eq!(text, "p1\np3");
        assert_eq!(ocr.calls().len(), 3, "failed page was still attempted");
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn raster_failure_skips_page_but_keeps_the_rest() {
        // Page 2 of 3 never rendered: pages 1 and 3 still contribute, OCR is
        // never invoked for the dead slot, and its temp image is cleaned up
        // with the others.
        let ocr = ScriptedOcr::new(vec![Ok("p1"), Ok("p3")]);
        let dir = tempfile::tempdir().unwrap();

        let text = ocr_page_images(
            &ocr,
            vec![page(0), failed_page(1), page(2)],
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(text, "p1\np3");
        assert_eq!(ocr.calls().len(), 2);
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn all_pages_failing_yields_empty_string() {
        let ocr = ScriptedOcr::new(vec![Err("a"), Err("b")]);
        let dir = tempfile::tempdir().unwrap();

        let text = ocr_page_images(&ocr, vec![page(0), page(1)], dir.path())
            .await
            .unwrap();

        assert_eq!(text, "");
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn successful_empty_page_is_included_then_trimmed() {
        // A page that OCRs to "" is a successful page: it joins with "\n"
        // and the trailing separator is trimmed from the final result.
        let ocr = ScriptedOcr::new(vec![Ok("Invoice #123\nAcme Corp"), Ok("")]);
        let dir = tempfile::tempdir().unwrap();

        let text = ocr_page_images(&ocr, vec![page(0), page(1)], dir.path())
            .await
            .unwrap();

        assert_eq!(text, "Invoice #123\nAcme Corp");
    }

    #[tokio::test]
    async fn no_pages_yields_empty_string() {
        let ocr = ScriptedOcr::new(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let text = ocr_page_images(&ocr, vec![], dir.path()).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn tesseract_missing_binary_is_an_ocr_error() {
        let engine = TesseractOcr::new("/nonexistent/tesseract", "eng");
        let err = engine.recognize(Path::new("whatever.png")).await;
        assert!(matches!(err, Err(ScanSortError::Ocr { .. })));
    }
}

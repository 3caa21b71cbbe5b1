//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations.
//!
//! ## Failure model
//!
//! Failing to open the PDF at all is document-fatal and returned as
//! `Err(CorruptPdf)`. A single page failing to render is page-fatal only:
//! its slot carries the error string and the remaining pages still render,
//! so partial documents keep their partial text.

use crate::error::ScanSortError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// One page slot of a rasterised PDF, in page order.
pub struct PageRaster {
    /// 0-based page index.
    pub index: usize,
    /// The rendered image, or the render error for this page.
    pub image: Result<DynamicImage, String>,
}

/// Rasterise all pages of a PDF at the given DPI.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// The returned vector has exactly one slot per page, in page order.
pub async fn rasterize_pages(
    pdf_path: &Path,
    dpi: u32,
) -> Result<Vec<PageRaster>, ScanSortError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || rasterize_pages_blocking(&path, dpi))
        .await
        .map_err(|e| ScanSortError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rasterisation.
fn rasterize_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
) -> Result<Vec<PageRaster>, ScanSortError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| ScanSortError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        results.push(PageRaster {
            index: idx,
            image: render_one_page(&pages, idx, dpi),
        });
    }

    Ok(results)
}

/// Render one page at a fixed scale regardless of its physical size.
fn render_one_page(
    pages: &PdfPages<'_>,
    idx: usize,
    dpi: u32,
) -> Result<DynamicImage, String> {
    let page = pages.get(idx as u16).map_err(|e| format!("{:?}", e))?;

    // Page dimensions are in points (1/72 inch); scale to the target DPI.
    let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
    let render_config = PdfRenderConfig::new().set_target_width(width_px.max(1));

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| format!("{:?}", e))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        idx + 1,
        image.width(),
        image.height()
    );

    Ok(image)
}

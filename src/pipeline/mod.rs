//! The per-document pipeline, stage by stage:
//!
//! 1. [`render`] — rasterise the downloaded PDF's pages via pdfium.
//! 2. [`ocr`] — write each page to a temp PNG and run tesseract over it.
//! 3. [`llm`] — ask the model for a "SENDER - TOPIC" line for the text.
//! 4. [`sanitize`] — turn that line into a safe file name.
//!
//! Stages 1–2 sit behind the [`ocr::TextExtractor`] trait and stage 3 behind
//! [`llm::CompletionClient`], so [`crate::process`] can be tested without
//! pdfium, tesseract, or a live model.

pub mod llm;
pub mod ocr;
pub mod render;
pub mod sanitize;

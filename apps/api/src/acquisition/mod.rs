//! Text acquisition: native text layer vs optical recognition, per page.
//!
//! Flow for a PDF: native text for all pages → per page, density and
//! symbol-ratio checks → pages that fail either check are rasterized and
//! re-read by the OCR engine. Word-processor files bypass the decision and
//! go through the structured reader.
//!
//! Everything here is blocking; callers run it inside `spawn_blocking`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::models::{Document, DocumentKind, ExtractedText, PageProvenance, PageText};

pub mod docx;
pub mod normalize;
pub mod ocr;
pub mod pdf;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("native text extraction failed: {0}")]
    Native(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("rasterization failed for page {page}: {message}")]
    Rasterize { page: usize, message: String },

    #[error("recognition failed for page {page}: {message}")]
    Recognition { page: usize, message: String },

    #[error("word-processor document unreadable: {0}")]
    Docx(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads the embedded text layer, one string per page.
pub trait NativeTextBackend: Send + Sync {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, AcquisitionError>;
}

/// Re-derives the text of one page (0-based index) from a rendered image.
pub trait OcrEngine: Send + Sync {
    fn recognize_page(&self, document: &Document, page_index: usize)
        -> Result<String, AcquisitionError>;
}

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_chars: usize,
    pub max_symbol_ratio: f64,
}

impl From<&OcrConfig> for Thresholds {
    fn from(config: &OcrConfig) -> Self {
        Self {
            min_chars: config.min_chars,
            max_symbol_ratio: config.max_symbol_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageDecision {
    KeepNative,
    LowDensity { chars: usize },
    Garbled { symbol_ratio: f64 },
}

/// Share of non-whitespace characters that are neither letters nor digits.
/// A high share usually means a broken font encoding.
pub fn symbol_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut symbols = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if !c.is_alphanumeric() {
            symbols += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    symbols as f64 / total as f64
}

pub fn assess_page(text: &str, thresholds: &Thresholds) -> PageDecision {
    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    if chars < thresholds.min_chars {
        return PageDecision::LowDensity { chars };
    }
    let ratio = symbol_ratio(text);
    if ratio > thresholds.max_symbol_ratio {
        return PageDecision::Garbled {
            symbol_ratio: ratio,
        };
    }
    PageDecision::KeepNative
}

pub struct TextAcquisitionSelector {
    native: Arc<dyn NativeTextBackend>,
    ocr: Arc<dyn OcrEngine>,
    thresholds: Thresholds,
}

impl TextAcquisitionSelector {
    pub fn new(
        native: Arc<dyn NativeTextBackend>,
        ocr: Arc<dyn OcrEngine>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            native,
            ocr,
            thresholds,
        }
    }

    /// Produces text for every page. Never fails: unreadable pages contribute
    /// an empty string and say so in their provenance.
    pub fn acquire(&self, document: Document) -> ExtractedText {
        match document.kind() {
            DocumentKind::Docx => Self::acquire_docx(&document),
            DocumentKind::Pdf => self.acquire_pdf(&document),
        }
    }

    fn acquire_docx(document: &Document) -> ExtractedText {
        let text = docx::read_docx_text(document.bytes()).unwrap_or_else(|e| {
            warn!(error = %e, "Word-processor reader failed; document contributes no text");
            String::new()
        });
        ExtractedText::new(vec![PageText::new(text, PageProvenance::Structured)])
    }

    fn acquire_pdf(&self, document: &Document) -> ExtractedText {
        let native_pages = self.native.page_texts(document.bytes()).unwrap_or_else(|e| {
            warn!(error = %e, "Native text layer unreadable; every page goes to OCR");
            Vec::new()
        });

        let page_total = document.page_count().max(native_pages.len());
        let mut pages = Vec::with_capacity(page_total);
        let mut ocr_pages = 0usize;

        for index in 0..page_total {
            let native = native_pages.get(index).map(String::as_str).unwrap_or("");
            let decision = assess_page(native, &self.thresholds);
            debug!(page = index + 1, ?decision, "Page acquisition decision");

            let page = match decision {
                PageDecision::KeepNative => {
                    PageText::new(native.to_string(), PageProvenance::Native)
                }
                _ => {
                    ocr_pages += 1;
                    match self.ocr.recognize_page(document, index) {
                        Ok(text) => PageText::new(text, PageProvenance::Ocr),
                        Err(e) => {
                            warn!(page = index + 1, error = %e, "OCR failed; page left empty");
                            PageText::new(String::new(), PageProvenance::OcrFailed)
                        }
                    }
                }
            };
            pages.push(page);
        }

        if ocr_pages > 0 {
            info!(ocr_pages, page_total, "Optical recognition used");
        }
        ExtractedText::new(pages)
    }
}

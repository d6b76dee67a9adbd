use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::bytes::Regex as BytesRegex;
use serde::{Deserialize, Serialize};

static PDF_PAGE_OBJECT: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"/Type\s*/Page\b").unwrap());

/// Declared format of an incoming document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves the kind from a file name extension or a MIME type.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".pdf") {
            return Some(DocumentKind::Pdf);
        }
        if lower.ends_with(".docx") {
            return Some(DocumentKind::Docx);
        }
        match content_type {
            Some("application/pdf") => Some(DocumentKind::Pdf),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                Some(DocumentKind::Docx)
            }
            _ => None,
        }
    }
}

/// Raw document bytes as handed over by the storage collaborator.
///
/// Immutable once built. The acquisition step takes ownership and drops it
/// when text has been produced.
#[derive(Debug)]
pub struct Document {
    bytes: Vec<u8>,
    kind: DocumentKind,
    page_count: usize,
}

impl Document {
    pub fn new(bytes: Vec<u8>, kind: DocumentKind) -> Self {
        let page_count = match kind {
            DocumentKind::Pdf => count_pdf_pages(&bytes),
            DocumentKind::Docx => count_docx_pages(&bytes),
        };
        Self {
            bytes,
            kind,
            page_count,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

fn count_pdf_pages(bytes: &[u8]) -> usize {
    PDF_PAGE_OBJECT.find_iter(bytes).count()
}

/// Word-processor files carry their page count in `docProps/app.xml`.
fn count_docx_pages(bytes: &[u8]) -> usize {
    let mut archive = match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(a) => a,
        Err(_) => return 1,
    };
    let mut xml = String::new();
    match archive.by_name("docProps/app.xml") {
        Ok(mut file) => {
            if file.read_to_string(&mut xml).is_err() {
                return 1;
            }
        }
        Err(_) => return 1,
    }
    xml.split("<Pages>")
        .nth(1)
        .and_then(|rest| rest.split("</Pages>").next())
        .and_then(|n| n.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// How the text of one page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageProvenance {
    /// Embedded text layer kept as-is.
    Native,
    /// Text re-derived by optical recognition.
    Ocr,
    /// Recognition was attempted and failed; the page contributes no text.
    OcrFailed,
    /// Structured word-processor reader.
    Structured,
}

impl PageProvenance {
    pub fn used_ocr(self) -> bool {
        matches!(self, PageProvenance::Ocr | PageProvenance::OcrFailed)
    }
}

/// Text of a single page. Counts are computed once at construction.
#[derive(Debug, Clone)]
pub struct PageText {
    text: String,
    provenance: PageProvenance,
    char_count: usize,
    word_count: usize,
}

impl PageText {
    pub fn new(text: String, provenance: PageProvenance) -> Self {
        let char_count = text.chars().filter(|c| !c.is_whitespace()).count();
        let word_count = text.split_whitespace().count();
        Self {
            text,
            provenance,
            char_count,
            word_count,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn provenance(&self) -> PageProvenance {
        self.provenance
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

/// Output of text acquisition: one entry per page, in page order.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pages: Vec<PageText>,
}

impl ExtractedText {
    pub fn new(pages: Vec<PageText>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    pub fn used_ocr(&self) -> bool {
        self.pages.iter().any(|p| p.provenance().used_ocr())
    }

    /// Concatenates page texts with a blank line between pages.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(PageText::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kind_by_extension() {
        assert_eq!(DocumentKind::detect("cv.PDF", None), Some(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::detect("cv.docx", None),
            Some(DocumentKind::Docx)
        );
        assert_eq!(DocumentKind::detect("cv.txt", None), None);
    }

    #[test]
    fn test_detect_kind_by_mime() {
        assert_eq!(
            DocumentKind::detect("upload", Some("application/pdf")),
            Some(DocumentKind::Pdf)
        );
    }

    #[test]
    fn test_pdf_page_count_ignores_pages_tree() {
        let bytes = b"1 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] >> \
                      2 0 obj << /Type /Page >> 3 0 obj << /Type/Page >>"
            .to_vec();
        let doc = Document::new(bytes, DocumentKind::Pdf);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_docx_page_count_defaults_to_one_for_garbage() {
        let doc = Document::new(b"not a zip".to_vec(), DocumentKind::Docx);
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_page_counts() {
        let page = PageText::new("Hello  world\n42".to_string(), PageProvenance::Native);
        assert_eq!(page.char_count(), 12);
        assert_eq!(page.word_count(), 3);
    }

    #[test]
    fn test_used_ocr_includes_failed_attempts() {
        let text = ExtractedText::new(vec![
            PageText::new("a".into(), PageProvenance::Native),
            PageText::new(String::new(), PageProvenance::OcrFailed),
        ]);
        assert!(text.used_ocr());
    }
}

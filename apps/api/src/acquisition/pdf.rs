use std::panic;

use super::{AcquisitionError, NativeTextBackend};

/// Native text layer via `pdf-extract`, one string per page.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl NativeTextBackend for PdfExtractBackend {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, AcquisitionError> {
        if bytes.len() < 5 || &bytes[..5] != b"%PDF-" {
            return Err(AcquisitionError::Native("missing %PDF- header".to_string()));
        }

        // pdf-extract panics on some malformed font tables instead of erroring.
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes)) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(AcquisitionError::Native(e.to_string())),
            Err(_) => Err(AcquisitionError::Native(
                "pdf-extract panicked while reading the text layer".to_string(),
            )),
        }
    }
}

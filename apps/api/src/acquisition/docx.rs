use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use super::AcquisitionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the paragraph text of a `.docx` body. One line per paragraph,
/// tabs and line breaks kept.
pub fn read_docx_text(bytes: &[u8]) -> Result<String, AcquisitionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AcquisitionError::Docx(format!("not a zip container: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| AcquisitionError::Docx(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> Result<String, AcquisitionError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut out = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let text = t
                    .unescape()
                    .map_err(|e| AcquisitionError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AcquisitionError::Docx(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(out.trim_end().to_string())
}

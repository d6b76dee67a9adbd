//! Optical recognition through the `pdftoppm` and `tesseract` command-line
//! tools. Each page is rendered into a private scratch directory that is
//! removed when recognition returns, whether it succeeded or not.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;
use tracing::debug;

use super::{AcquisitionError, OcrEngine};
use crate::config::OcrConfig;
use crate::models::Document;

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    dpi: u32,
    lang: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            dpi: config.dpi,
            lang: config.lang.clone(),
        }
    }

    /// True when both tools answer `-v`. Used at startup to log a warning;
    /// a missing engine is not fatal.
    pub fn tools_available() -> bool {
        ["pdftoppm", "tesseract"].iter().all(|tool| {
            Command::new(tool)
                .arg("-v")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
    }

    fn rasterize(
        &self,
        pdf_path: &Path,
        out_prefix: &Path,
        page: usize,
    ) -> Result<std::path::PathBuf, AcquisitionError> {
        let page_arg = page.to_string();
        let output = Command::new("pdftoppm")
            .args(["-f", &page_arg, "-l", &page_arg])
            .args(["-r", &self.dpi.to_string()])
            .args(["-png", "-singlefile"])
            .arg(pdf_path)
            .arg(out_prefix)
            .output()
            .map_err(|e| AcquisitionError::EngineUnavailable(format!("pdftoppm: {e}")))?;
        check_status(&output).map_err(|message| AcquisitionError::Rasterize { page, message })?;

        let image = out_prefix.with_extension("png");
        if !image.exists() {
            return Err(AcquisitionError::Rasterize {
                page,
                message: "pdftoppm produced no image".to_string(),
            });
        }
        Ok(image)
    }

    fn recognize_image(&self, image: &Path, page: usize) -> Result<String, AcquisitionError> {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .args(["-l", &self.lang])
            .args(["--dpi", &self.dpi.to_string()])
            .output()
            .map_err(|e| AcquisitionError::EngineUnavailable(format!("tesseract: {e}")))?;
        check_status(&output)
            .map_err(|message| AcquisitionError::Recognition { page, message })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_page(
        &self,
        document: &Document,
        page_index: usize,
    ) -> Result<String, AcquisitionError> {
        let page = page_index + 1;
        with_scratch_dir(|dir| {
            let pdf_path = dir.join("source.pdf");
            fs::write(&pdf_path, document.bytes())?;
            let image = self.rasterize(&pdf_path, &dir.join("page"), page)?;
            let text = self.recognize_image(&image, page)?;
            debug!(page, chars = text.len(), "Page recognized");
            Ok(text)
        })
    }
}

/// Runs `work` inside a fresh temporary directory. The directory and every
/// file in it are deleted when this returns, including on error or panic.
pub fn with_scratch_dir<T, F>(work: F) -> Result<T, AcquisitionError>
where
    F: FnOnce(&Path) -> Result<T, AcquisitionError>,
{
    let dir = TempDir::new()?;
    work(dir.path())
}

fn check_status(output: &Output) -> Result<(), String> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = stderr.trim();
    Err(if message.is_empty() {
        format!("exited with {}", output.status)
    } else {
        message.to_string()
    })
}

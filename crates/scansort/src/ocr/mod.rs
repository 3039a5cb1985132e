//! OCR text extraction via local tools (tesseract, pdftoppm)
//!
//! The routing pipeline only depends on the [`TextExtractor`] trait;
//! extraction accuracy and preprocessing live behind it. Extraction
//! failure is not fatal to routing; the router treats it as "no text".

use std::path::Path;
use std::process::Command;

use crate::config::OcrConfig;
use crate::error::{Error, Result};

/// Capability the router needs from the OCR engine
pub trait TextExtractor: Send + Sync {
    /// Recognize text from a document file. An empty string is a valid
    /// result (blank or unreadable page).
    fn extract_text(&self, path: &Path) -> Result<String>;
}

/// Tesseract-backed extractor; PDFs are rasterized with pdftoppm first
pub struct TesseractExtractor {
    config: OcrConfig,
}

impl TesseractExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Check if the tesseract binary is available
    pub fn has_tesseract() -> bool {
        Command::new("tesseract")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Check if pdftoppm (poppler-utils) is available
    pub fn has_pdftoppm() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output()
            .map_err(|e| Error::extraction(image_path.display().to_string(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(
                image_path.display().to_string(),
                format!("tesseract exited with {}: {}", output.status, stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn extract_from_pdf(&self, path: &Path) -> Result<String> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| Error::extraction(path.display().to_string(), e.to_string()))?;

        let output = Command::new("pdftoppm")
            .arg("-png")
            .args(["-r", &self.config.dpi.to_string()])
            .arg(path)
            .arg(temp_dir.path().join("page"))
            .output()
            .map_err(|e| Error::extraction(path.display().to_string(), e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::extraction(
                path.display().to_string(),
                format!("pdftoppm exited with {}: {}", output.status, stderr),
            ));
        }

        let mut pages: Vec<_> = std::fs::read_dir(temp_dir.path())
            .map_err(|e| Error::extraction(path.display().to_string(), e.to_string()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        pages.sort();

        let mut text = String::new();
        for page in &pages {
            let page_text = self.ocr_image(page)?;
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&page_text);
        }

        tracing::debug!(
            "OCR extracted {} characters from {} pages of {:?}",
            text.len(),
            pages.len(),
            path
        );
        Ok(text)
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if ext == "pdf" {
            self.extract_from_pdf(path)
        } else {
            self.ocr_image(path)
        }
    }
}

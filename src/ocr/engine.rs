//! Recognition engines.
//!
//! [`TextRecognizer`] is the seam between the recognizer's strategy loop and
//! a concrete OCR engine. [`TesseractCli`] drives the `tesseract` binary.

use crate::error::{Error, Result};
use async_trait::async_trait;
use image::GrayImage;
use std::path::PathBuf;
use std::process::Stdio;

/// Page segmentation strategy requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationMode {
    /// A single uniform block of text
    Block,
    /// A single column of text of variable sizes
    SingleColumn,
    /// As much text as possible in no particular order
    SparseText,
}

impl SegmentationMode {
    /// Tesseract `--psm` value.
    pub fn psm(self) -> u8 {
        match self {
            SegmentationMode::Block => 6,
            SegmentationMode::SingleColumn => 4,
            SegmentationMode::SparseText => 11,
        }
    }
}

/// An OCR engine that turns a binarized image into raw text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in `image` using `mode`.
    async fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<String>;
}

/// Tesseract command-line engine.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    language: String,
}

impl TesseractCli {
    /// Find `tesseract` on `PATH`.
    pub fn locate() -> Result<Self> {
        let binary = which::which("tesseract").map_err(|_| {
            Error::EngineUnavailable("tesseract not found (install tesseract-ocr)".to_string())
        })?;
        log::debug!("using tesseract at {}", binary.display());
        Ok(Self::with_binary(binary))
    }

    /// Use an explicit binary path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: "eng".to_string(),
        }
    }

    /// Tesseract language code, `eng` by default.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, image: &GrayImage, mode: SegmentationMode) -> Result<String> {
        let file = tempfile::Builder::new()
            .prefix("study-oxide-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(file.path(), image::ImageFormat::Png)?;

        let output = tokio::process::Command::new(&self.binary)
            .arg(file.path())
            .arg("stdout")
            .args(["--psm", &mode.psm().to_string()])
            .args(["-l", &self.language])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::Ocr(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::EngineUnavailable(
                format!("{} not found", self.binary.display()),
            )),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

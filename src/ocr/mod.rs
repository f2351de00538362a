//! OCR for pages without a usable text layer.
//!
//! [`Preprocessor`] turns a page image into clean binarized blocks,
//! [`OcrRecognizer`] runs a [`TextRecognizer`] over them under a time budget
//! and keeps the most plausible transcript, and [`corrections`] repairs the
//! usual engine confusions.
//!
//! # Example
//!
//! ```ignore
//! use study_oxide::ocr::{OcrRecognizer, Preprocessor, TesseractCli};
//! use std::time::Duration;
//!
//! let engine = TesseractCli::locate()?;
//! let page = Preprocessor::default().preprocess(&image::open("scan.png")?);
//! let transcript = OcrRecognizer::default()
//!     .recognize(&engine, &page.blocks, Duration::from_secs(10))
//!     .await;
//! println!("{} ({:.2})", transcript.text, transcript.score);
//! ```

pub mod columns;
pub mod corrections;
pub mod engine;
pub mod preprocess;
pub mod quality;
pub mod recognizer;
pub mod remote;

pub use engine::{SegmentationMode, TesseractCli, TextRecognizer};
pub use preprocess::{PreprocessedPage, Preprocessor};
pub use quality::plausibility;
pub use recognizer::{OcrRecognizer, Transcript};
#[cfg(feature = "remote-ocr")]
pub use remote::HttpRemoteOcr;
pub use remote::{RemoteOcr, RemoteOcrRequest};

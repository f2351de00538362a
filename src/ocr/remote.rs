//! Network OCR fallback for whole documents.
//!
//! Used only when no on-device engine is available and the original file is
//! at hand. Failures surface as [`Error::Upstream`] and are treated by the
//! pipeline as an empty transcript.

use crate::error::Result;
#[cfg(feature = "remote-ocr")]
use crate::error::Error;
use async_trait::async_trait;

/// Label used for errors reported by the OCR service.
pub const SERVICE_NAME: &str = "OCR service";

/// A document sent for remote recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOcrRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Pages the service should read at most
    pub max_pages: usize,
    /// Render scale used by the service before recognition
    pub scale: f32,
}

/// Out-of-process OCR over a whole document.
#[async_trait]
pub trait RemoteOcr: Send + Sync {
    /// Recognize the document and return its text.
    async fn recognize_document(&self, request: RemoteOcrRequest) -> Result<String>;
}

/// HTTP client for an OCR service exposing `POST /ocr/pdf`.
#[cfg(feature = "remote-ocr")]
#[derive(Debug, Clone)]
pub struct HttpRemoteOcr {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "remote-ocr")]
impl HttpRemoteOcr {
    /// Request timeout.
    pub const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/ocr/pdf", self.base_url)
    }
}

#[cfg(feature = "remote-ocr")]
fn upstream(message: String) -> Error {
    Error::Upstream {
        service: SERVICE_NAME.to_string(),
        message,
    }
}

#[cfg(feature = "remote-ocr")]
#[async_trait]
impl RemoteOcr for HttpRemoteOcr {
    async fn recognize_document(&self, request: RemoteOcrRequest) -> Result<String> {
        use reqwest::multipart::{Form, Part};

        let file = Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str("application/pdf")
            .map_err(|e| upstream(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("max_pages", request.max_pages.to_string())
            .text("scale", request.scale.to_string());

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(upstream(message));
        }

        Ok(body
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

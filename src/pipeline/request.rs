//! Generation requests.

use crate::config::Difficulty;
use crate::document::{Document, PageSource, SourceFile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub difficulty: Difficulty,
}

/// Input to [`crate::KitGenerator::generate`].
///
/// At least one of `text` or `pages` must carry content.
#[derive(Clone, Default)]
pub struct KitRequest {
    pub text: Option<String>,
    pub pages: Option<Arc<dyn PageSource>>,
    /// Original upload, used only by the network OCR fallback
    pub source_file: Option<SourceFile>,
    pub title: Option<String>,
    pub options: GenerateOptions,
}

impl std::fmt::Debug for KitRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitRequest")
            .field("text_len", &self.text.as_ref().map(String::len))
            .field("pages", &self.pages.as_ref().map(|p| p.page_count()))
            .field("source_file", &self.source_file.as_ref().map(|s| &s.name))
            .field("title", &self.title)
            .field("options", &self.options)
            .finish()
    }
}

impl KitRequest {
    /// Request for pasted text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Request for a page source.
    pub fn from_pages(pages: Arc<dyn PageSource>) -> Self {
        Self {
            pages: Some(pages),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_pages(mut self, pages: Arc<dyn PageSource>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_source_file(mut self, file: SourceFile) -> Self {
        self.source_file = Some(file);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.options.difficulty = difficulty;
        self
    }

    /// The document part of the request.
    pub fn document(&self) -> Document {
        let mut document = Document::new();
        if let Some(text) = &self.text {
            document = document.with_text(text.clone());
        }
        if let Some(pages) = &self.pages {
            document = document.with_pages(Arc::clone(pages));
        }
        if let Some(file) = &self.source_file {
            document = document.with_source_file(file.clone());
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImagePages;

    #[test]
    fn test_builder() {
        let request = KitRequest::from_text("notes")
            .with_title("Biology")
            .with_difficulty(Difficulty::Harder);
        assert_eq!(request.title.as_deref(), Some("Biology"));
        assert_eq!(request.options.difficulty, Difficulty::Harder);
        assert!(!request.document().is_empty());
    }

    #[test]
    fn test_empty_requests() {
        assert!(KitRequest::default().document().is_empty());
        assert!(KitRequest::from_text("   ").document().is_empty());
        assert!(KitRequest::from_pages(Arc::new(ImagePages::default()))
            .document()
            .is_empty());
    }
}

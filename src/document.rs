//! Input document model.
//!
//! A [`Document`] bundles whatever the caller has: pasted text, a
//! [`PageSource`] for page images and text layers, and the original file for
//! the network OCR fallback. Decoding real PDF pages is left to the
//! implementor of [`PageSource`]; [`ImagePages`] covers scans and tests.

use crate::error::{Error, Result};
use async_trait::async_trait;
use image::{imageops::FilterType, DynamicImage};
use std::path::Path;
use std::sync::Arc;

/// Page access: text layer and rasterization.
///
/// Pages are indexed from zero.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Embedded text of a page, `None` when the page has no text layer.
    async fn text_layer(&self, page: usize) -> Result<Option<String>>;

    /// Render a page about `width` pixels wide.
    async fn rasterize(&self, page: usize, width: u32) -> Result<DynamicImage>;
}

/// One in-memory page.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub image: DynamicImage,
    pub text_layer: Option<String>,
}

impl PageImage {
    /// Image-only page.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            text_layer: None,
        }
    }

    /// Attach an embedded text layer.
    pub fn with_text_layer(mut self, text: impl Into<String>) -> Self {
        self.text_layer = Some(text.into());
        self
    }
}

/// [`PageSource`] over in-memory page images.
#[derive(Debug, Clone, Default)]
pub struct ImagePages {
    pages: Vec<PageImage>,
}

impl ImagePages {
    pub fn new(pages: Vec<PageImage>) -> Self {
        Self { pages }
    }

    /// Image-only pages.
    pub fn from_images(images: impl IntoIterator<Item = DynamicImage>) -> Self {
        Self::new(images.into_iter().map(PageImage::new).collect())
    }

    /// Decode image files into pages.
    pub fn open<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        let images = paths
            .into_iter()
            .map(|p| image::open(p.as_ref()).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_images(images))
    }

    pub fn with_page(mut self, page: PageImage) -> Self {
        self.pages.push(page);
        self
    }

    fn page(&self, page: usize) -> Result<&PageImage> {
        self.pages.get(page).ok_or_else(|| {
            Error::InvalidImage(format!("page {} out of range (0..{})", page, self.pages.len()))
        })
    }
}

#[async_trait]
impl PageSource for ImagePages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn text_layer(&self, page: usize) -> Result<Option<String>> {
        Ok(self.page(page)?.text_layer.clone())
    }

    /// Scans wider than `width` are downscaled; narrower ones are returned
    /// as they are.
    async fn rasterize(&self, page: usize, width: u32) -> Result<DynamicImage> {
        let image = &self.page(page)?.image;
        if width == 0 || image.width() <= width {
            return Ok(image.clone());
        }
        let height = (image.height() as u64 * width as u64 / image.width() as u64).max(1) as u32;
        Ok(image.resize_exact(width, height, FilterType::Triangle))
    }
}

/// The original uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, named after its file name.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self { name, bytes })
    }
}

/// Everything known about one input.
#[derive(Clone, Default)]
pub struct Document {
    /// Pasted or pre-extracted text, in order
    pub text_blocks: Vec<String>,
    pub pages: Option<Arc<dyn PageSource>>,
    pub source_file: Option<SourceFile>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("text_blocks", &self.text_blocks.len())
            .field("pages", &self.pages.as_ref().map(|p| p.page_count()))
            .field("source_file", &self.source_file.as_ref().map(|s| &s.name))
            .finish()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block of text. Whitespace-only blocks are ignored.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.text_blocks.push(text);
        }
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

    /// Number of pages, zero without a page source.
    pub fn page_count(&self) -> usize {
        self.pages.as_ref().map_or(0, |p| p.page_count())
    }

    /// True when there is neither text nor a page.
    pub fn is_empty(&self) -> bool {
        self.text_blocks.is_empty() && self.page_count() == 0
    }
}

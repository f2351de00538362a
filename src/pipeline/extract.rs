//! Text extraction from a [`Document`].
//!
//! Pasted text is taken as is. Pages contribute their text layer; pages whose
//! layer is too short are rasterized, preprocessed and recognized within the
//! document OCR budget. When no on-device engine can be loaded, the original
//! file may be sent to a remote OCR service instead.

use crate::config::KitConfig;
use crate::document::{Document, PageSource};
use crate::ocr::{OcrRecognizer, Preprocessor, RemoteOcr, RemoteOcrRequest, TextRecognizer};
use crate::service::LazyModel;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Text gathered from a document, with a summary of how it was obtained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Combined text, at most `max_chars` characters
    pub text: String,
    /// Pages read from the page source
    pub pages_read: usize,
    /// Pages whose text came from on-device OCR
    pub ocr_pages: usize,
    /// Whether the remote OCR service contributed text
    pub remote_used: bool,
}

/// Engine state for one extraction, resolved on first need.
enum Engine {
    Unresolved,
    Ready(Arc<dyn TextRecognizer>),
    Unavailable,
}

pub(crate) struct Extractor<'a> {
    pub config: &'a KitConfig,
    pub engine: Option<&'a LazyModel<dyn TextRecognizer>>,
    pub remote: Option<&'a dyn RemoteOcr>,
}

impl Extractor<'_> {
    pub async fn extract(&self, document: &Document) -> Extraction {
        let mut extraction = Extraction::default();
        let mut parts: Vec<String> = document.text_blocks.clone();

        let mut engine = Engine::Unresolved;
        let mut wanted_ocr = false;
        if let Some(pages) = &document.pages {
            let (page_texts, stats) = self.read_pages(pages.as_ref(), &mut engine).await;
            parts.extend(page_texts);
            extraction.pages_read = stats.pages_read;
            extraction.ocr_pages = stats.ocr_pages;
            wanted_ocr = stats.wanted_ocr;
        }

        let engine_missing = matches!(engine, Engine::Unavailable);
        if wanted_ocr && engine_missing {
            if let Some(text) = self.remote_fallback(document).await {
                parts.push(text);
                extraction.remote_used = true;
            }
        }

        let combined = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        extraction.text = truncate_chars(combined, self.config.extraction.max_chars);
        extraction
    }

    async fn read_pages(&self, pages: &dyn PageSource, engine: &mut Engine) -> (Vec<String>, PageStats) {
        let cfg = &self.config.extraction;
        let budget = cfg.effective_budget();
        let hard_stop = budget + cfg.grace;
        let count = pages.page_count().min(cfg.max_pages);
        let started = Instant::now();

        let mut stats = PageStats::default();
        let mut texts = Vec::with_capacity(count);
        for page in 0..count {
            stats.pages_read += 1;
            let layer = if cfg.force_ocr {
                String::new()
            } else {
                text_layer(pages, page).await
            };

            let elapsed = started.elapsed();
            let needs_ocr =
                cfg.ocr_enabled && (cfg.force_ocr || layer.chars().count() < cfg.text_layer_min_chars);
            if !needs_ocr {
                texts.push(layer);
                continue;
            }
            stats.wanted_ocr = true;

            if elapsed > hard_stop {
                log::debug!("page {}: OCR budget spent, text layer only", page);
                texts.push(self.fallback_layer(pages, page, layer).await);
                continue;
            }
            let remaining = budget.saturating_sub(elapsed);
            if remaining <= self.config.ocr.skip_below {
                log::debug!("page {}: {:?} left, skipping OCR", page, remaining);
                texts.push(self.fallback_layer(pages, page, layer).await);
                continue;
            }
            let Some(recognizer) = self.resolve_engine(engine).await else {
                texts.push(self.fallback_layer(pages, page, layer).await);
                continue;
            };

            let page_budget = self.config.ocr.page_cap.min(remaining);
            match self.ocr_page(pages, page, recognizer.as_ref(), page_budget).await {
                Some(ocr) if ocr.chars().count() > layer.chars().count() => {
                    stats.ocr_pages += 1;
                    if layer.is_empty() {
                        texts.push(ocr);
                    } else {
                        texts.push(format!("{}\n{}", layer, ocr));
                    }
                }
                _ => texts.push(self.fallback_layer(pages, page, layer).await),
            }
        }

        log::debug!(
            "read {} pages ({} via OCR) in {:?}",
            stats.pages_read,
            stats.ocr_pages,
            started.elapsed()
        );
        (texts, stats)
    }

    /// With forced OCR the text layer was never read; read it now so a page
    /// that could not be recognized still contributes something.
    async fn fallback_layer(&self, pages: &dyn PageSource, page: usize, layer: String) -> String {
        if self.config.extraction.force_ocr {
            text_layer(pages, page).await
        } else {
            layer
        }
    }

    async fn resolve_engine(&self, engine: &mut Engine) -> Option<Arc<dyn TextRecognizer>> {
        if let Engine::Unresolved = engine {
            *engine = match self.engine {
                Some(lazy) => match lazy.get(self.config.ocr.engine_load_timeout).await {
                    Some(ready) => Engine::Ready(ready),
                    None => {
                        log::warn!("OCR engine {} unavailable", lazy.name());
                        Engine::Unavailable
                    }
                },
                None => {
                    log::debug!("no OCR engine configured");
                    Engine::Unavailable
                }
            };
        }
        match engine {
            Engine::Ready(ready) => Some(Arc::clone(ready)),
            _ => None,
        }
    }

    async fn ocr_page(
        &self,
        pages: &dyn PageSource,
        page: usize,
        engine: &dyn TextRecognizer,
        budget: Duration,
    ) -> Option<String> {
        let image = match pages.rasterize(page, self.config.ocr.target_width).await {
            Ok(image) => image,
            Err(e) => {
                log::warn!("page {}: rasterization failed: {}", page, e);
                return None;
            }
        };

        let preprocessor = Preprocessor::new(self.config.preprocess.clone());
        let preprocessed = match tokio::task::spawn_blocking(move || preprocessor.preprocess(&image)).await {
            Ok(preprocessed) => preprocessed,
            Err(e) => {
                log::warn!("page {}: preprocessing task failed: {}", page, e);
                return None;
            }
        };
        if preprocessed.blocks.is_empty() {
            log::debug!("page {}: no text blocks after preprocessing", page);
            return None;
        }

        let transcript = OcrRecognizer::new(self.config.ocr.clone())
            .recognize(engine, &preprocessed.blocks, budget)
            .await;
        log::debug!(
            "page {}: {} blocks, deskew {:.1}°, score {:.2}",
            page,
            preprocessed.blocks.len(),
            preprocessed.deskew_angle,
            transcript.score
        );
        (!transcript.is_empty()).then_some(transcript.text)
    }

    async fn remote_fallback(&self, document: &Document) -> Option<String> {
        let (remote, file) = match (self.remote, &document.source_file) {
            (Some(remote), Some(file)) => (remote, file),
            _ => return None,
        };
        let request = RemoteOcrRequest {
            file_name: file.name.clone(),
            bytes: file.bytes.clone(),
            max_pages: self.config.extraction.remote_max_pages,
            scale: self.config.extraction.remote_scale,
        };
        match remote.recognize_document(request).await {
            Ok(text) if !text.trim().is_empty() => {
                log::info!("remote OCR returned {} chars for {}", text.len(), file.name);
                Some(crate::ocr::corrections::correct(&text))
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("remote OCR failed: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Default)]
struct PageStats {
    pages_read: usize,
    ocr_pages: usize,
    wanted_ocr: bool,
}

/// Text layer of a page, empty when missing or unreadable.
async fn text_layer(pages: &dyn PageSource, page: usize) -> String {
    match pages.text_layer(page).await {
        Ok(layer) => layer.unwrap_or_default().trim().to_string(),
        Err(e) => {
            log::debug!("page {}: no text layer: {}", page, e);
            String::new()
        }
    }
}

/// Keep at most `max` characters.
pub fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((cut, _)) = text.char_indices().nth(max) {
        log::debug!("input truncated to {} characters", max);
        text.truncate(cut);
    }
    text
}

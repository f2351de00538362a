//! Budgeted multi-strategy recognition.
//!
//! Each block is recognized with several segmentation modes under a shared
//! deadline; the most plausible transcript wins. Blocks that still read
//! poorly are re-segmented into horizontal stripes.

use super::corrections;
use super::engine::{SegmentationMode, TextRecognizer};
use super::quality::plausibility;
use crate::config::OcrConfig;
use image::{imageops, GrayImage};
use std::time::{Duration, Instant};

/// Score at which no further modes are tried for a block.
const GOOD_ENOUGH: f32 = 0.85;

/// Modes tried on every block, in order.
const BLOCK_MODES: [SegmentationMode; 3] = [
    SegmentationMode::Block,
    SegmentationMode::SingleColumn,
    SegmentationMode::SparseText,
];

/// Recognized text for a page with its plausibility.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub score: f32,
}

impl Transcript {
    fn scored(text: String, config: &OcrConfig) -> Self {
        let score = plausibility(&text, &config.quality);
        Self { text, score }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Strategy loop around a [`TextRecognizer`].
#[derive(Debug, Clone, Default)]
pub struct OcrRecognizer {
    config: OcrConfig,
}

impl OcrRecognizer {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Recognize `blocks` in order within `budget`.
    ///
    /// Never fails: engine errors and timeouts skip the attempt, and an
    /// exhausted budget returns whatever was recognized so far.
    pub async fn recognize(
        &self,
        engine: &dyn TextRecognizer,
        blocks: &[GrayImage],
        budget: Duration,
    ) -> Transcript {
        if blocks.is_empty() {
            return Transcript::default();
        }
        let deadline = Instant::now() + budget;
        let attempt_cap = self
            .config
            .min_attempt
            .max(budget / (blocks.len() as u32 * 3));

        let mut texts = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            let best = self.recognize_block(engine, block, deadline, attempt_cap).await;
            match best {
                Some(best) if !best.is_empty() => {
                    log::debug!("block {} recognized (score {:.2})", index, best.score);
                    texts.push(best.text);
                }
                _ => log::debug!("block {} produced no text", index),
            }
        }

        Transcript::scored(texts.join("\n\n"), &self.config)
    }

    async fn recognize_block(
        &self,
        engine: &dyn TextRecognizer,
        block: &GrayImage,
        deadline: Instant,
        attempt_cap: Duration,
    ) -> Option<Transcript> {
        let mut best: Option<Transcript> = None;
        for mode in BLOCK_MODES {
            let Some(raw) = attempt(engine, block, mode, deadline, attempt_cap).await else {
                continue;
            };
            let candidate = Transcript::scored(corrections::correct(&raw), &self.config);
            if best.as_ref().is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
            if best.as_ref().is_some_and(|b| b.score >= GOOD_ENOUGH) {
                break;
            }
        }

        let weak = best.as_ref().is_none_or(|b| b.score < self.config.min_quality);
        if weak && Instant::now() < deadline {
            if let Some(striped) = self.recognize_stripes(engine, block, deadline, attempt_cap).await {
                if best.as_ref().is_none_or(|b| striped.score > b.score) {
                    log::debug!("stripe re-segmentation improved block to {:.2}", striped.score);
                    best = Some(striped);
                }
            }
        }
        best
    }

    async fn recognize_stripes(
        &self,
        engine: &dyn TextRecognizer,
        block: &GrayImage,
        deadline: Instant,
        attempt_cap: Duration,
    ) -> Option<Transcript> {
        let stripes = stripes(block, self.config.stripe_height);
        if stripes.len() < 2 {
            return None;
        }
        let mut lines = Vec::new();
        for stripe in &stripes {
            if Instant::now() >= deadline {
                break;
            }
            if let Some(raw) =
                attempt(engine, stripe, SegmentationMode::SparseText, deadline, attempt_cap).await
            {
                let text = corrections::correct(&raw);
                if !text.is_empty() {
                    lines.push(text);
                }
            }
        }
        if lines.is_empty() {
            return None;
        }
        Some(Transcript::scored(lines.join("\n"), &self.config))
    }
}

/// One engine call under a hard timeout. Errors and timeouts are logged and
/// yield `None`.
async fn attempt(
    engine: &dyn TextRecognizer,
    image: &GrayImage,
    mode: SegmentationMode,
    deadline: Instant,
    attempt_cap: Duration,
) -> Option<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return None;
    }
    match tokio::time::timeout(attempt_cap.min(remaining), engine.recognize(image, mode)).await {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            log::debug!("{:?} attempt failed: {}", mode, e);
            None
        }
        Err(_) => {
            log::debug!("{:?} attempt timed out", mode);
            None
        }
    }
}

/// Horizontal stripes of at most `height` pixels, top to bottom.
pub fn stripes(block: &GrayImage, height: u32) -> Vec<GrayImage> {
    let (width, total) = block.dimensions();
    if height == 0 || width == 0 {
        return Vec::new();
    }
    (0..total)
        .step_by(height as usize)
        .map(|y| imageops::crop_imm(block, 0, y, width, height.min(total - y)).to_image())
        .collect()
}

//! Image cleanup ahead of recognition.
//!
//! The pipeline runs in a fixed order:
//!
//! 1. deskew, chosen on a small contrast-stretched probe
//! 2. contrast stretch between luminance percentiles
//! 3. background estimate and inversion of dark pages
//! 4. adaptive binarization against bilinearly blended tile means
//! 5. 3×3 closing of ink
//! 6. despeckle
//! 7. two-column split
//!
//! Output pixels are ink `0` on paper `255`.

use super::columns;
use crate::config::PreprocessConfig;
use crate::error::{Error, Result};
use image::{imageops, DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::morphology;

/// Pages smaller than this on either side are not preprocessed.
pub const MIN_DIMENSION: u32 = 16;

const WHITE: Luma<u8> = Luma([255]);

/// Result of preprocessing one page image.
#[derive(Debug, Clone)]
pub struct PreprocessedPage {
    /// Binarized blocks in reading order
    pub blocks: Vec<GrayImage>,
    /// Applied rotation in degrees
    pub deskew_angle: f32,
    /// Whether the page was inverted (light text on dark background)
    pub inverted: bool,
}

/// Deterministic page cleanup.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    /// Preprocessor with the given parameters.
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Preprocess, falling back to the grayscale page (inverted if dark) as a
    /// single block when the page cannot be processed.
    pub fn preprocess(&self, image: &DynamicImage) -> PreprocessedPage {
        let gray = image.to_luma8();
        match self.try_preprocess(&gray) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("preprocessing failed, using raw page: {}", e);
                let mut fallback = gray;
                let inverted = background_mean(&fallback) < self.config.dark_background;
                if inverted {
                    imageops::invert(&mut fallback);
                }
                PreprocessedPage {
                    blocks: vec![fallback],
                    deskew_angle: 0.0,
                    inverted,
                }
            }
        }
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImage`] when either side is below [`MIN_DIMENSION`].
    pub fn try_preprocess(&self, gray: &GrayImage) -> Result<PreprocessedPage> {
        let (width, height) = gray.dimensions();
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(Error::InvalidImage(format!(
                "page too small to preprocess: {}x{}",
                width, height
            )));
        }

        let angle = self.estimate_skew(gray);
        let rotated = if angle == 0.0 {
            gray.clone()
        } else {
            rotate_about_center(gray, angle.to_radians(), Interpolation::Bilinear, WHITE)
        };

        let mut work = contrast_stretch(&rotated, self.config.stretch_low, self.config.stretch_high);
        let mut background = background_mean(&work);
        let inverted = background < self.config.dark_background;
        if inverted {
            imageops::invert(&mut work);
            background = 255.0 - background;
        }

        let offset = if background > self.config.bright_background {
            self.config.offset_bright
        } else {
            self.config.offset_default
        };
        let binary = adaptive_threshold(&work, self.config.tile_size, offset);
        let closed = morphology::open(&binary, Norm::LInf, 1);
        let cleaned = despeckle(&closed);
        let blocks = columns::split_columns(&cleaned, &self.config);

        log::debug!(
            "preprocessed {}x{} page: angle {}, inverted {}, {} blocks",
            width,
            height,
            angle,
            inverted,
            blocks.len()
        );
        Ok(PreprocessedPage {
            blocks,
            deskew_angle: angle,
            inverted,
        })
    }

    /// Candidate angle with the highest row-wise ink variance on a probe
    /// image. The first candidate (zero) wins ties.
    pub fn estimate_skew(&self, gray: &GrayImage) -> f32 {
        let (width, height) = gray.dimensions();
        let probe = if width > self.config.probe_width {
            let probe_height = (height as u64 * self.config.probe_width as u64 / width as u64).max(1);
            imageops::resize(
                gray,
                self.config.probe_width,
                probe_height as u32,
                imageops::FilterType::Triangle,
            )
        } else {
            gray.clone()
        };
        let probe = contrast_stretch(&probe, self.config.stretch_low, self.config.stretch_high);

        let mut best: Option<(f32, f32)> = None;
        for &angle in &self.config.deskew_angles {
            let candidate = if angle == 0.0 {
                row_ink_variance(&probe)
            } else {
                let rotated =
                    rotate_about_center(&probe, angle.to_radians(), Interpolation::Bilinear, WHITE);
                row_ink_variance(&rotated)
            };
            if best.is_none_or(|(_, score)| candidate > score) {
                best = Some((angle, candidate));
            }
        }
        best.map(|(angle, _)| angle).unwrap_or(0.0)
    }
}

/// Variance across rows of the count of below-mean pixels.
fn row_ink_variance(image: &GrayImage) -> f32 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let mean = image.pixels().map(|p| p[0] as f64).sum::<f64>() / (width * height) as f64;
    let rows: Vec<f64> = image
        .rows()
        .map(|row| row.filter(|p| (p[0] as f64) < mean).count() as f64)
        .collect();
    let row_mean = rows.iter().sum::<f64>() / rows.len() as f64;
    let variance = rows.iter().map(|r| (r - row_mean).powi(2)).sum::<f64>() / rows.len() as f64;
    variance as f32
}

/// Linearly stretch luminance so the `low` and `high` percentiles map to
/// 0 and 255.
pub fn contrast_stretch(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let mut histogram = [0u64; 256];
    for p in image.pixels() {
        histogram[p[0] as usize] += 1;
    }
    let total = image.pixels().len() as f64;
    let percentile = |fraction: f32| {
        let target = (fraction as f64 * total).ceil().max(1.0);
        let mut seen = 0.0;
        for (value, count) in histogram.iter().enumerate() {
            seen += *count as f64;
            if seen >= target {
                return value as f32;
            }
        }
        255.0
    };
    let (lo, hi) = (percentile(low), percentile(high));
    if hi <= lo {
        return image.clone();
    }
    let scale = 255.0 / (hi - lo);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0] as f32;
        Luma([((v - lo) * scale).clamp(0.0, 255.0).round() as u8])
    })
}

/// Mean luminance sampled every `max(4, n / 50000)` pixels.
pub fn background_mean(image: &GrayImage) -> f32 {
    let raw = image.as_raw();
    if raw.is_empty() {
        return 255.0;
    }
    let step = (raw.len() / 50_000).max(4);
    let (sum, count) = raw
        .iter()
        .step_by(step)
        .fold((0u64, 0u64), |(s, c), v| (s + *v as u64, c + 1));
    sum as f32 / count as f32
}

/// Binarize against a local mean bilinearly blended between tile centres.
/// Pixels darker than `mean - offset` become ink.
pub fn adaptive_threshold(image: &GrayImage, tile: u32, offset: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let tile = tile.max(1);
    let tiles_x = width.div_ceil(tile).max(1) as usize;
    let tiles_y = height.div_ceil(tile).max(1) as usize;

    let mut sums = vec![0.0f64; tiles_x * tiles_y];
    let mut counts = vec![0u32; tiles_x * tiles_y];
    for (x, y, p) in image.enumerate_pixels() {
        let i = (y / tile) as usize * tiles_x + (x / tile) as usize;
        sums[i] += p[0] as f64;
        counts[i] += 1;
    }
    let means: Vec<f32> = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| if *c == 0 { 255.0 } else { (*s / *c as f64) as f32 })
        .collect();

    // tile index pair and blend weight for a pixel coordinate
    let axis = |coord: u32, tiles: usize| {
        let f = (coord as f32 + 0.5) / tile as f32 - 0.5;
        let t0 = (f.floor().max(0.0) as usize).min(tiles - 1);
        let t1 = (t0 + 1).min(tiles - 1);
        let w = (f - t0 as f32).clamp(0.0, 1.0);
        (t0, t1, w)
    };

    GrayImage::from_fn(width, height, |x, y| {
        let (x0, x1, wx) = axis(x, tiles_x);
        let (y0, y1, wy) = axis(y, tiles_y);
        let at = |tx: usize, ty: usize| means[ty * tiles_x + tx];
        let top = at(x0, y0) * (1.0 - wx) + at(x1, y0) * wx;
        let bottom = at(x0, y1) * (1.0 - wx) + at(x1, y1) * wx;
        let local = top * (1.0 - wy) + bottom * wy;
        if (image.get_pixel(x, y)[0] as f32) < local - offset {
            Luma([0])
        } else {
            WHITE
        }
    })
}

/// Remove ink pixels with at most one ink neighbour.
pub fn despeckle(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let is_ink = |x: i64, y: i64| {
        x >= 0
            && y >= 0
            && x < width as i64
            && y < height as i64
            && image.get_pixel(x as u32, y as u32)[0] == 0
    };
    GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as i64, y as i64);
        if !is_ink(x, y) {
            return WHITE;
        }
        let mut neighbours = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx != 0 || dy != 0) && is_ink(x + dx, y + dy) {
                    neighbours += 1;
                }
            }
        }
        if neighbours <= 1 {
            WHITE
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_page(width: u32, height: u32, paper: u8, ink: u8) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let inked = x > 20 && x < width - 20 && y % 12 < 4 && y > 10 && y < height - 10;
            Luma([if inked { ink } else { paper }])
        })
    }

    #[test]
    fn test_tiny_page_rejected() {
        let pre = Preprocessor::default();
        let tiny = GrayImage::from_pixel(4, 4, Luma([255]));
        assert!(matches!(pre.try_preprocess(&tiny), Err(Error::InvalidImage(_))));

        let page = pre.preprocess(&DynamicImage::ImageLuma8(tiny));
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.deskew_angle, 0.0);
    }

    #[test]
    fn test_output_is_binary() {
        let pre = Preprocessor::default();
        let page = pre.try_preprocess(&text_page(300, 200, 235, 40)).unwrap();
        assert!(!page.blocks.is_empty());
        assert!(!page.inverted);
        for block in &page.blocks {
            assert!(block.pixels().all(|p| p[0] == 0 || p[0] == 255));
            assert!(block.pixels().any(|p| p[0] == 0));
        }
    }

    #[test]
    fn test_dark_page_inverted() {
        let pre = Preprocessor::default();
        let page = pre.try_preprocess(&text_page(300, 200, 20, 230)).unwrap();
        assert!(page.inverted);
    }

    #[test]
    fn test_straight_text_not_rotated() {
        let pre = Preprocessor::default();
        assert_eq!(pre.estimate_skew(&text_page(300, 200, 250, 10)), 0.0);
    }

    #[test]
    fn test_deterministic() {
        let pre = Preprocessor::default();
        let img = text_page(240, 160, 230, 30);
        let a = pre.try_preprocess(&img).unwrap();
        let b = pre.try_preprocess(&img).unwrap();
        assert_eq!(a.blocks, b.blocks);
        assert_eq!(a.deskew_angle, b.deskew_angle);
    }

    #[test]
    fn test_contrast_stretch_expands_range() {
        let img = GrayImage::from_fn(100, 1, |x, _| Luma([100 + (x as u8) / 2]));
        let out = contrast_stretch(&img, 0.02, 0.98);
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!(min, 0);
        assert_eq!(max, 255);
    }

    #[test]
    fn test_background_mean() {
        let img = GrayImage::from_pixel(50, 50, Luma([200]));
        assert_eq!(background_mean(&img), 200.0);
    }

    #[test]
    fn test_despeckle_removes_isolated_pixels() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255]));
        img.put_pixel(5, 5, Luma([0]));
        for x in 1..4 {
            img.put_pixel(x, 1, Luma([0]));
        }
        let out = despeckle(&img);
        assert_eq!(out.get_pixel(5, 5)[0], 255);
        assert_eq!(out.get_pixel(2, 1)[0], 0);
    }

    #[test]
    fn test_adaptive_threshold_flat_page_is_white() {
        let img = GrayImage::from_pixel(64, 64, Luma([180]));
        let out = adaptive_threshold(&img, 24, 8.0);
        assert!(out.pixels().all(|p| p[0] == 255));
    }
}

//! Two-column detection on binarized pages.
//!
//! A vertical ink-density projection is smoothed and searched for a valley
//! in the central third of the page. A valley that is much emptier than
//! both sides splits the page into two blocks.

use crate::config::PreprocessConfig;
use image::{imageops, GrayImage};

/// Gaussian sigma applied to the ink projection.
pub const PROFILE_SIGMA: f32 = 2.0;

/// Fraction of ink (value 0) pixels in each pixel column.
pub fn ink_profile(image: &GrayImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    if height == 0 {
        return vec![0.0; width as usize];
    }
    let mut profile = vec![0.0f32; width as usize];
    for (x, _, pixel) in image.enumerate_pixels() {
        if pixel[0] == 0 {
            profile[x as usize] += 1.0;
        }
    }
    profile.iter_mut().for_each(|v| *v /= height as f32);
    profile
}

/// Column at which to split, if the smoothed profile has a deep enough
/// valley in its central third.
pub fn find_split(profile: &[f32], config: &PreprocessConfig) -> Option<usize> {
    let n = profile.len();
    if n < 3 {
        return None;
    }
    let mut smoothed = profile.to_vec();
    gaussian_smooth(&mut smoothed, PROFILE_SIGMA);

    let (start, end) = (n / 3, 2 * n / 3);
    let mut valley = start;
    for x in start..end {
        if smoothed[x] < smoothed[valley] {
            valley = x;
        }
    }

    let mean = |s: &[f32]| {
        if s.is_empty() {
            0.0
        } else {
            s.iter().sum::<f32>() / s.len() as f32
        }
    };
    let left = mean(&smoothed[..valley]);
    let right = mean(&smoothed[valley..]);
    let weaker = left.min(right);

    if weaker >= config.min_side_density && smoothed[valley] <= config.valley_ratio * weaker {
        log::debug!(
            "column split at x={} (valley {:.3}, sides {:.3}/{:.3})",
            valley,
            smoothed[valley],
            left,
            right
        );
        Some(valley)
    } else {
        None
    }
}

/// Split a page into column blocks, dropping blocks smaller than
/// `min_block_size` on either side.
pub fn split_columns(image: &GrayImage, config: &PreprocessConfig) -> Vec<GrayImage> {
    let (width, height) = image.dimensions();
    let blocks = match find_split(&ink_profile(image), config) {
        Some(x) => {
            let x = x as u32;
            vec![
                imageops::crop_imm(image, 0, 0, x, height).to_image(),
                imageops::crop_imm(image, x, 0, width - x, height).to_image(),
            ]
        }
        None => vec![image.clone()],
    };
    blocks
        .into_iter()
        .filter(|b| b.width() >= config.min_block_size && b.height() >= config.min_block_size)
        .collect()
}

/// Smooth a profile in place with a normalized Gaussian kernel, clamping at
/// the edges.
fn gaussian_smooth(profile: &mut [f32], sigma: f32) {
    if profile.len() <= 2 || sigma <= 0.0 {
        return;
    }

    let radius = (3.0 * sigma).ceil() as usize;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    let original = profile.to_vec();
    let last = original.len() as isize - 1;
    for (i, value) in profile.iter_mut().enumerate() {
        *value = kernel
            .iter()
            .enumerate()
            .map(|(j, k)| {
                let index = (i as isize + j as isize - radius as isize).clamp(0, last) as usize;
                original[index] * k
            })
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// White page with text-like stripes inside the given column ranges.
    fn page(width: u32, height: u32, columns: &[(u32, u32)]) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let inked = columns.iter().any(|&(a, b)| x >= a && x < b) && y % 4 < 2;
            if inked {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_ink_profile() {
        let img = page(10, 4, &[(0, 5)]);
        let profile = ink_profile(&img);
        assert_eq!(profile[0], 0.5);
        assert_eq!(profile[9], 0.0);
    }

    #[test]
    fn test_two_columns_split() {
        let img = page(400, 200, &[(20, 180), (220, 380)]);
        let blocks = split_columns(&img, &PreprocessConfig::default());
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].width() > 150 && blocks[0].width() < 230);
        assert_eq!(blocks[0].width() + blocks[1].width(), 400);
    }

    #[test]
    fn test_single_column_kept_whole() {
        let img = page(400, 200, &[(20, 380)]);
        let blocks = split_columns(&img, &PreprocessConfig::default());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].dimensions(), (400, 200));
    }

    #[test]
    fn test_sparse_sides_not_split() {
        let img = page(400, 200, &[(20, 22), (378, 380)]);
        assert_eq!(split_columns(&img, &PreprocessConfig::default()).len(), 1);
    }

    #[test]
    fn test_small_blocks_dropped() {
        let img = page(60, 60, &[(5, 55)]);
        assert!(split_columns(&img, &PreprocessConfig::default()).is_empty());
    }

    #[test]
    fn test_gaussian_smooth_preserves_mass() {
        let mut profile = vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        gaussian_smooth(&mut profile, 1.0);
        assert!(profile[3] < 10.0);
        assert!(profile[2] > 0.0 && profile[4] > 0.0);
    }
}

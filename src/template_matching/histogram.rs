//! Color histogram comparison used to re-verify geometric matches
//!
//! The correlation scores are insensitive to recoloring, so an enabled and a
//! disabled button can score the same. Histograms are compared per horizontal
//! third to tolerate vertical gradients.

use image::{GrayImage, RgbImage};
use imageproc::stats::histogram;

use crate::error::{VisionError, VisionResult};

/// Default number of bins per channel after folding the 256-level histogram
pub const HISTOGRAM_BINS: usize = 32;

const BANDS: u32 = 3;

/// Average histogram correlation of `a` and `b` over three horizontal bands
/// and the three RGB channels.
///
/// Images may differ in size but both need at least one pixel per band.
pub fn hist_similarity(a: &RgbImage, b: &RgbImage, bins: usize) -> VisionResult<f32> {
    hist_similarity_masked(a, b, None, bins)
}

/// Like `hist_similarity`, counting only pixels where `mask` is non-zero.
///
/// With a mask both images must have the mask's size.
pub fn hist_similarity_masked(
    a: &RgbImage,
    b: &RgbImage,
    mask: Option<&GrayImage>,
    bins: usize,
) -> VisionResult<f32> {
    for img in [a, b] {
        if img.width() == 0 || img.height() < BANDS {
            return Err(VisionError::invalid_input(format!(
                "histogram comparison needs an image at least 1x{BANDS}, got {}x{}",
                img.width(),
                img.height()
            )));
        }
        if let Some(mask) = mask
            && mask.dimensions() != img.dimensions()
        {
            return Err(VisionError::invalid_input(format!(
                "histogram mask is {}x{} but image is {}x{}",
                mask.width(),
                mask.height(),
                img.width(),
                img.height()
            )));
        }
    }
    if bins == 0 || bins > 256 {
        return Err(VisionError::invalid_input(format!(
            "histogram bins must be in 1..=256, got {bins}"
        )));
    }

    let mut total = 0.0;
    for band in 0..BANDS {
        let hist_a = band_histograms(a, mask, band, bins);
        let hist_b = band_histograms(b, mask, band, bins);
        for (ha, hb) in hist_a.iter().zip(&hist_b) {
            total += correlation(ha, hb);
        }
    }
    Ok((total / (BANDS as f64 * 3.0)) as f32)
}

/// Check whether `a` and `b` have matching color distributions
pub fn hist_match(a: &RgbImage, b: &RgbImage, threshold: f32) -> VisionResult<bool> {
    hist_match_with_bins(a, b, None, threshold, HISTOGRAM_BINS)
}

pub fn hist_match_with_bins(
    a: &RgbImage,
    b: &RgbImage,
    mask: Option<&GrayImage>,
    threshold: f32,
    bins: usize,
) -> VisionResult<bool> {
    let similarity = hist_similarity_masked(a, b, mask, bins)?;
    log::trace!("histogram similarity {:.4} (threshold {:.4})", similarity, threshold);
    Ok(similarity >= threshold)
}

/// Folded per-channel histograms of one horizontal band
fn band_histograms(image: &RgbImage, mask: Option<&GrayImage>, band: u32, bins: usize) -> Vec<Vec<f64>> {
    let h = image.height();
    let y0 = band * h / BANDS;
    let y1 = (band + 1) * h / BANDS;
    let fold = |levels: &[u32; 256]| {
        let mut folded = vec![0.0; bins];
        for (level, count) in levels.iter().enumerate() {
            folded[level * bins / 256] += *count as f64;
        }
        folded
    };

    let Some(mask) = mask else {
        let strip = image::imageops::crop_imm(image, 0, y0, image.width(), y1 - y0).to_image();
        return histogram(&strip).channels.iter().map(fold).collect();
    };

    let mut levels = [[0u32; 256]; 3];
    for y in y0..y1 {
        for x in 0..image.width() {
            if mask.get_pixel(x, y)[0] == 0 {
                continue;
            }
            let px = image.get_pixel(x, y);
            for c in 0..3 {
                levels[c][px[c] as usize] += 1;
            }
        }
    }
    levels.iter().map(fold).collect()
}

/// Pearson correlation of two histograms; two flat histograms correlate fully
fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        num += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom > f64::EPSILON { num / denom } else { 1.0 }
}

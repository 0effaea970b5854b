//! Template scoring functions
//!
//! Produces a score for every top-left offset where the template fits inside
//! the image:
//! - correlation coefficient (mean-subtracted, normalized) without a mask
//! - masked normalized cross-correlation with a binary mask
//!
//! Both work on all three color channels at once. Flat windows and flat
//! templates score 0.
use image::{GrayImage, RgbImage};

/// Scores laid out row-major, one per template offset
#[derive(Clone, Debug)]
pub struct ScoreMap {
    pub width: u32,
    pub height: u32,
    pub scores: Vec<f32>,
}

impl ScoreMap {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            scores: Vec::new(),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.scores[(y * self.width + x) as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Offsets scoring at least `threshold`, in raster order
    pub fn above(&self, threshold: f32) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        self.scores
            .iter()
            .enumerate()
            .filter(move |(_, score)| **score >= threshold)
            .map(move |(i, score)| (i as u32 % self.width, i as u32 / self.width, *score))
    }
}

/// Score every offset of `template` inside `image`
///
/// # Arguments
/// * `image` - The image to search in
/// * `template` - The template to look for
/// * `mask` - Optional binary mask, same size as the template; 0 pixels are ignored
///
/// # Returns
/// An empty map when the template does not fit inside the image
pub fn score_map(image: &RgbImage, template: &RgbImage, mask: Option<&GrayImage>) -> ScoreMap {
    let (iw, ih) = image.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > iw || th > ih {
        return ScoreMap::empty();
    }
    match mask {
        Some(mask) => masked_ccorr_normed(image, template, mask),
        None => ccoeff_normed(image, template),
    }
}

/// Per-channel summed-area tables of values and squared values
struct IntegralImage {
    stride: usize,
    sum: Vec<[f64; 3]>,
    sq_sum: Vec<[f64; 3]>,
}

impl IntegralImage {
    fn new(image: &RgbImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![[0.0; 3]; stride * (h + 1)];
        let mut sq_sum = vec![[0.0; 3]; stride * (h + 1)];
        let raw = image.as_raw();
        for y in 0..h {
            let mut row = [0.0f64; 3];
            let mut row_sq = [0.0f64; 3];
            for x in 0..w {
                let base = (y * w + x) * 3;
                for c in 0..3 {
                    let v = raw[base + c] as f64;
                    row[c] += v;
                    row_sq[c] += v * v;
                    let above = (y * stride) + x + 1;
                    let here = ((y + 1) * stride) + x + 1;
                    sum[here][c] = sum[above][c] + row[c];
                    sq_sum[here][c] = sq_sum[above][c] + row_sq[c];
                }
            }
        }
        Self { stride, sum, sq_sum }
    }

    fn window(table: &[[f64; 3]], stride: usize, x: usize, y: usize, w: usize, h: usize) -> [f64; 3] {
        let a = table[y * stride + x];
        let b = table[y * stride + x + w];
        let c = table[(y + h) * stride + x];
        let d = table[(y + h) * stride + x + w];
        [
            d[0] - b[0] - c[0] + a[0],
            d[1] - b[1] - c[1] + a[1],
            d[2] - b[2] - c[2] + a[2],
        ]
    }
}

fn progress_interval(total: usize) -> usize {
    (total / 10).max(1)
}

fn ccoeff_normed(image: &RgbImage, template: &RgbImage) -> ScoreMap {
    let (iw, ih) = (image.width() as usize, image.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);
    let n = (tw * th) as f64;

    // Mean-subtracted template
    let t_raw = template.as_raw();
    let mut mean = [0.0f64; 3];
    for px in t_raw.chunks_exact(3) {
        for c in 0..3 {
            mean[c] += px[c] as f64;
        }
    }
    for m in mean.iter_mut() {
        *m /= n;
    }
    let centered: Vec<f64> = t_raw
        .iter()
        .enumerate()
        .map(|(i, &v)| v as f64 - mean[i % 3])
        .collect();
    let template_norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();

    let out_w = iw - tw + 1;
    let out_h = ih - th + 1;
    if template_norm <= f64::EPSILON {
        return ScoreMap {
            width: out_w as u32,
            height: out_h as u32,
            scores: vec![0.0; out_w * out_h],
        };
    }

    let integral = IntegralImage::new(image);
    let i_raw = image.as_raw();
    let mut scores = Vec::with_capacity(out_w * out_h);
    let report_interval = progress_interval(out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let sums = IntegralImage::window(&integral.sum, integral.stride, x, y, tw, th);
            let sq = IntegralImage::window(&integral.sq_sum, integral.stride, x, y, tw, th);
            let mut variance = 0.0;
            let mut sq_total = 0.0;
            for c in 0..3 {
                variance += sq[c] - sums[c] * sums[c] / n;
                sq_total += sq[c];
            }
            if variance <= (10.0 * f32::EPSILON as f64 * sq_total).min(0.5) {
                scores.push(0.0);
                continue;
            }

            // Σ T'·I equals Σ T'·(I - mean(I)) because Σ T' is 0
            let mut num = 0.0;
            for ty in 0..th {
                let img_row = ((y + ty) * iw + x) * 3;
                let tpl_row = ty * tw * 3;
                let img = &i_raw[img_row..img_row + tw * 3];
                let tpl = &centered[tpl_row..tpl_row + tw * 3];
                num += img
                    .iter()
                    .zip(tpl)
                    .map(|(&i, &t)| i as f64 * t)
                    .sum::<f64>();
            }
            let score = num / (template_norm * variance.sqrt());
            scores.push(score.clamp(-1.0, 1.0) as f32);
        }
        if y % report_interval == 0 {
            log::trace!("  ⏳ Correlation scanning: {}%", y * 100 / out_h);
        }
    }

    ScoreMap {
        width: out_w as u32,
        height: out_h as u32,
        scores,
    }
}

fn masked_ccorr_normed(image: &RgbImage, template: &RgbImage, mask: &GrayImage) -> ScoreMap {
    let iw = image.width() as usize;
    let (tw, th) = (template.width() as usize, template.height() as usize);
    let out_w = image.width() as usize - tw + 1;
    let out_h = image.height() as usize - th + 1;

    // Only pixels with the mask on take part: (offset into image row-space, template rgb)
    let mut active: Vec<(usize, usize, [f64; 3])> = Vec::new();
    let mut template_sq = 0.0;
    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let px = template.get_pixel(x, y);
        let rgb = [px[0] as f64, px[1] as f64, px[2] as f64];
        template_sq += rgb.iter().map(|v| v * v).sum::<f64>();
        active.push((x as usize, y as usize, rgb));
    }

    if active.is_empty() || template_sq <= f64::EPSILON {
        return ScoreMap {
            width: out_w as u32,
            height: out_h as u32,
            scores: vec![0.0; out_w * out_h],
        };
    }

    let i_raw = image.as_raw();
    let mut scores = Vec::with_capacity(out_w * out_h);
    let report_interval = progress_interval(out_h);

    for y in 0..out_h {
        for x in 0..out_w {
            let mut num = 0.0;
            let mut image_sq = 0.0;
            for &(dx, dy, t) in &active {
                let base = ((y + dy) * iw + x + dx) * 3;
                for c in 0..3 {
                    let v = i_raw[base + c] as f64;
                    num += v * t[c];
                    image_sq += v * v;
                }
            }
            let denom = (template_sq * image_sq).sqrt();
            let score = if denom > f64::EPSILON { num / denom } else { 0.0 };
            scores.push(score.clamp(-1.0, 1.0) as f32);
        }
        if y % report_interval == 0 {
            log::trace!("  ⏳ Masked correlation scanning: {}%", y * 100 / out_h);
        }
    }

    ScoreMap {
        width: out_w as u32,
        height: out_h as u32,
        scores,
    }
}

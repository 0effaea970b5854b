//! Dominant colors via k-means clustering in RGB space

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use super::types::Color;
use crate::error::{VisionError, VisionResult};
use crate::geometry::Rect;
use crate::loader::{ImageSource, crop_rect, load_rgb};

const ATTEMPTS: usize = 10;
const MAX_ITERATIONS: usize = 200;
/// Stop once no center moves further than this
const EPSILON: f32 = 0.1;
const SEED: u64 = 0x6b6d_6561_6e73;

type Rgb3 = [f32; 3];

struct Clustering {
    centers: Vec<Rgb3>,
    counts: Vec<usize>,
    compactness: f64,
}

/// Extract up to `count` dominant colors of `image` (or of `rect` within it)
/// as `#rrggbb` strings, most common first.
///
/// Clusters that end up empty are dropped, so fewer than `count` colors may
/// be returned. Results are deterministic for a given input.
pub fn dominant_color(
    image: &ImageSource,
    count: usize,
    rect: Option<Rect>,
) -> VisionResult<Vec<String>> {
    if count == 0 {
        return Err(VisionError::invalid_input("dominant_color needs count >= 1"));
    }
    let mut image = load_rgb(image)?;
    if let Some(rect) = rect {
        image = crop_rect(&image, rect)?;
    }
    let pixels: Vec<Rgb3> = image
        .pixels()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    if pixels.is_empty() {
        return Err(VisionError::invalid_input("dominant_color needs a non-empty image"));
    }

    let k = count.min(pixels.len());
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut best: Option<Clustering> = None;
    for attempt in 0..ATTEMPTS {
        let initial = sample(&mut rng, pixels.len(), k)
            .into_iter()
            .map(|i| pixels[i])
            .collect();
        let clustering = kmeans(&pixels, initial);
        log::trace!("k-means attempt {} compactness {:.1}", attempt, clustering.compactness);
        if best
            .as_ref()
            .is_none_or(|b| clustering.compactness < b.compactness)
        {
            best = Some(clustering);
        }
    }
    let Some(best) = best else {
        return Ok(Vec::new());
    };

    let mut order: Vec<usize> = (0..best.centers.len())
        .filter(|&i| best.counts[i] > 0)
        .collect();
    // Most populated first
    order.sort_by(|&a, &b| best.counts[b].cmp(&best.counts[a]));

    let colors: Vec<String> = order
        .into_iter()
        .map(|i| {
            let [r, g, b] = best.centers[i];
            Color::new(r as u8, g as u8, b as u8).to_hex()
        })
        .collect();
    log::debug!("🎨 dominant colors (k={}): {:?}", k, colors);
    Ok(colors)
}

fn kmeans(pixels: &[Rgb3], mut centers: Vec<Rgb3>) -> Clustering {
    let k = centers.len();
    let mut labels = vec![0usize; pixels.len()];
    for _ in 0..MAX_ITERATIONS {
        for (label, p) in labels.iter_mut().zip(pixels) {
            *label = nearest(&centers, p).0;
        }

        let mut sums = vec![[0.0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (&label, p) in labels.iter().zip(pixels) {
            for c in 0..3 {
                sums[label][c] += p[c] as f64;
            }
            counts[label] += 1;
        }

        let mut max_shift = 0.0f32;
        for (i, center) in centers.iter_mut().enumerate() {
            // An empty cluster keeps its previous center
            if counts[i] == 0 {
                continue;
            }
            let n = counts[i] as f64;
            let updated = [
                (sums[i][0] / n) as f32,
                (sums[i][1] / n) as f32,
                (sums[i][2] / n) as f32,
            ];
            max_shift = max_shift.max(distance2(center, &updated).sqrt());
            *center = updated;
        }
        if max_shift <= EPSILON {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    let mut compactness = 0.0f64;
    for p in pixels {
        let (label, d2) = nearest(&centers, p);
        counts[label] += 1;
        compactness += d2 as f64;
    }
    Clustering {
        centers,
        counts,
        compactness,
    }
}

fn nearest(centers: &[Rgb3], p: &Rgb3) -> (usize, f32) {
    let mut best = (0, f32::INFINITY);
    for (i, c) in centers.iter().enumerate() {
        let d2 = distance2(c, p);
        if d2 < best.1 {
            best = (i, d2);
        }
    }
    best
}

fn distance2(a: &Rgb3, b: &Rgb3) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

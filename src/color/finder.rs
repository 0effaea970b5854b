//! Single-pixel color search in HLS space

use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::types::{Color, HlsColor, IntoColor};
use crate::debug::{DebugReporter, NoopReporter, RESULT_COLOR, SEARCH_AREA_COLOR, annotate};
use crate::error::VisionResult;
use crate::geometry::{Point, Rect};
use crate::loader::{ImageSource, load_rgb, resolve_rect};

/// Half-size of the box drawn around a found pixel in debug reports
const RESULT_MARKER: i32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Similarity (1 - distance) a pixel needs to be reported
    pub threshold: f32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { threshold: 0.95 }
    }
}

/// Finds the pixel closest to a target color
pub struct ColorMatcher {
    config: ColorConfig,
    reporter: Arc<dyn DebugReporter>,
}

impl ColorMatcher {
    pub fn new() -> Self {
        Self::with_config(ColorConfig::default(), Arc::new(NoopReporter))
    }

    pub fn with_config(config: ColorConfig, reporter: Arc<dyn DebugReporter>) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    /// `find_with_threshold` using the configured threshold
    pub fn find(
        &self,
        image: &ImageSource,
        color: impl IntoColor,
        rect: Option<Rect>,
    ) -> VisionResult<Option<Point>> {
        self.find_with_threshold(image, color, rect, self.config.threshold)
    }

    /// Find the pixel whose HLS distance to `color` is smallest, provided it is
    /// at most `1 - threshold`.
    ///
    /// `rect` limits the search; the returned point is always in the frame of
    /// the full image. Ties go to the first pixel in raster order.
    pub fn find_with_threshold(
        &self,
        image: &ImageSource,
        color: impl IntoColor,
        rect: Option<Rect>,
        threshold: f32,
    ) -> VisionResult<Option<Point>> {
        let target = color.into_color()?;
        let image = load_rgb(image)?;
        let area = match rect {
            Some(rect) => resolve_rect(rect, image.width(), image.height())?,
            None => Rect::full_image(image.width(), image.height()),
        };
        log::debug!(
            "🎨 find color {} in {} ({}x{} image) threshold: {}",
            target,
            area,
            image.width(),
            image.height(),
            threshold
        );

        let target_hls = target.to_hls();
        let max_distance = 1.0 - threshold;
        let mut best: Option<(Point, f32)> = None;
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let pixel = image.get_pixel(x as u32, y as u32);
                let distance = HlsColor::from_rgb(pixel[0], pixel[1], pixel[2]).distance(&target_hls);
                if distance <= max_distance && best.is_none_or(|(_, d)| distance < d) {
                    best = Some((Point::new(x, y), distance));
                }
            }
        }

        if let Some((point, distance)) = best {
            log::debug!("  found {} at ({}, {}) similarity {:.4}", target, point.x, point.y, 1.0 - distance);
        }
        self.report(&image, target, rect.map(|_| area), best);
        Ok(best.map(|(point, _)| point))
    }

    fn report(&self, image: &RgbImage, target: Color, area: Option<Rect>, best: Option<(Point, f32)>) {
        if !self.reporter.enabled() {
            return;
        }
        let mut annotated = image.clone();
        if let Some(area) = area {
            annotated = annotate(&annotated, &[area], SEARCH_AREA_COLOR);
        }
        let mut detail = format!("target={target}\nrect={area:?}\n");
        match best {
            Some((point, distance)) => {
                let marker = Rect::new(
                    point.x - RESULT_MARKER,
                    point.y - RESULT_MARKER,
                    (2 * RESULT_MARKER) as u32,
                    (2 * RESULT_MARKER) as u32,
                );
                if let Some(marker) = marker.clip_to(image.width(), image.height()) {
                    annotated = annotate(&annotated, &[marker], RESULT_COLOR);
                }
                let found = Color::from(*image.get_pixel(point.x as u32, point.y as u32));
                detail.push_str(&format!(
                    "result=({}, {})\nsimilarity={:.4}\nfound_color={}",
                    point.x,
                    point.y,
                    1.0 - distance,
                    found
                ));
            }
            None => detail.push_str("result=None"),
        }
        self.reporter.report("find_color", &[annotated, image.clone()], &detail);
    }
}

impl Default for ColorMatcher {
    fn default() -> Self {
        Self::new()
    }
}

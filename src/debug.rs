//! Optional debug side-channel for match results
//!
//! Matchers hold an `Arc<dyn DebugReporter>` and only build report images when
//! `enabled()` returns true, so a disabled reporter costs one virtual call.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;

use crate::geometry::Rect;

/// Sink for `(title, images, detail)` reports
pub trait DebugReporter: Send + Sync {
    fn enabled(&self) -> bool;

    fn report(&self, title: &str, images: &[RgbImage], detail: &str);
}

/// Reporter that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl DebugReporter for NoopReporter {
    fn enabled(&self) -> bool {
        false
    }

    fn report(&self, _title: &str, _images: &[RgbImage], _detail: &str) {}
}

/// Reporter that writes the title and detail text through `log::debug!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl DebugReporter for LogReporter {
    fn enabled(&self) -> bool {
        log::log_enabled!(log::Level::Debug)
    }

    fn report(&self, title: &str, images: &[RgbImage], detail: &str) {
        let sizes: Vec<String> = images
            .iter()
            .map(|img| format!("{}x{}", img.width(), img.height()))
            .collect();
        log::debug!("🔍 {} images=[{}]\n{}", title, sizes.join(", "), detail);
    }
}

pub const RESULT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const SEARCH_AREA_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Copy of `image` with each rect outlined
pub fn annotate(image: &RgbImage, rects: &[Rect], color: Rgb<u8>) -> RgbImage {
    let mut out = image.clone();
    for rect in rects.iter().filter(|r| !r.is_empty()) {
        draw_hollow_rect_mut(
            &mut out,
            imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width, rect.height),
            color,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_leaves_source_untouched() {
        let img = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let out = annotate(&img, &[Rect::new(2, 2, 5, 5)], RESULT_COLOR);
        assert_eq!(out.get_pixel(2, 2), &RESULT_COLOR);
        assert_eq!(img.get_pixel(2, 2), &Rgb([0, 0, 0]));
        // inside of the outline is not filled
        assert_eq!(out.get_pixel(4, 4), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_noop_reporter_is_disabled() {
        assert!(!NoopReporter.enabled());
    }
}

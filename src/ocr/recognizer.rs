//! OCR front end: cropping, padding, normalization and coordinate mapping
//! around an injected `TextRecognizer`

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::engine::{RecognizedText, TextRecognizer};
use super::pattern::TextPattern;
use super::types::{OcrResult, OcrResultList};
use crate::debug::{DebugReporter, NoopReporter, RESULT_COLOR, annotate};
use crate::error::{VisionError, VisionResult};
use crate::geometry::{Rect, Size, bounding_box};
use crate::loader::{ImageSource, crop_rect, load_rgb, resolve_rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Inputs smaller than this in either dimension are padded up to it
    pub min_canvas: Size,
    /// Fill color of the padding
    pub background: [u8; 3],
    /// Applied to the text after NFKC normalization, in order
    pub replacements: Vec<(String, String)>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_canvas: Size::new(631, 631),
            background: [0, 0, 0],
            replacements: vec![("ą".to_string(), "a".to_string())],
        }
    }
}

/// Where the engine's image sits relative to the source image
#[derive(Debug, Clone, Copy)]
struct FrameMapping {
    /// Top-left of the crop in the source image
    crop_x: i32,
    crop_y: i32,
    /// Top-left of the (scaled) crop on the padded canvas
    pad_x: i32,
    pad_y: i32,
    scale: f32,
}

impl FrameMapping {
    fn identity_at(crop_x: i32, crop_y: i32) -> Self {
        Self {
            crop_x,
            crop_y,
            pad_x: 0,
            pad_y: 0,
            scale: 1.0,
        }
    }

    fn to_source(&self, rect: Rect) -> Rect {
        let x = ((rect.x - self.pad_x) as f32 / self.scale).round() as i32;
        let y = ((rect.y - self.pad_y) as f32 / self.scale).round() as i32;
        Rect::new(
            self.crop_x + x,
            self.crop_y + y,
            (rect.width as f32 / self.scale).round() as u32,
            (rect.height as f32 / self.scale).round() as u32,
        )
    }
}

/// Text recognition over screenshots
pub struct Ocr {
    engine: Arc<dyn TextRecognizer>,
    config: OcrConfig,
    reporter: Arc<dyn DebugReporter>,
}

impl Ocr {
    pub fn new(engine: Arc<dyn TextRecognizer>) -> Self {
        Self::with_config(engine, OcrConfig::default(), Arc::new(NoopReporter))
    }

    pub fn with_config(
        engine: Arc<dyn TextRecognizer>,
        config: OcrConfig,
        reporter: Arc<dyn DebugReporter>,
    ) -> Self {
        Self {
            engine,
            config,
            reporter,
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Recognize all text in `image`, or in `rect` within it.
    ///
    /// With `pad`, inputs smaller than the minimum canvas are centered on a
    /// canvas of that size first. Every result carries both its rect on the
    /// image the engine saw and its rect in `image`.
    pub fn ocr(&self, image: &ImageSource, rect: Option<Rect>, pad: bool) -> VisionResult<OcrResultList> {
        let image = load_rgb(image)?;
        self.ocr_rgb(&image, rect, pad)
    }

    /// First result matching `pattern`.
    ///
    /// `hint` is searched first; on a miss the search is repeated over `rect`
    /// (the whole image if `None`).
    pub fn find(
        &self,
        image: &ImageSource,
        pattern: impl Into<TextPattern>,
        hint: Option<Rect>,
        rect: Option<Rect>,
    ) -> VisionResult<Option<OcrResult>> {
        let image = load_rgb(image)?;
        self.find_rgb(&image, &pattern.into(), hint, rect)
    }

    /// Like `find`, but a miss is an error carrying the pattern and the image
    pub fn expect(
        &self,
        image: &ImageSource,
        pattern: impl Into<TextPattern>,
        hint: Option<Rect>,
        rect: Option<Rect>,
    ) -> VisionResult<OcrResult> {
        let image = load_rgb(image)?;
        let pattern = pattern.into();
        match self.find_rgb(&image, &pattern, hint, rect)? {
            Some(found) => Ok(found),
            None => Err(VisionError::TextNotFound {
                pattern: pattern.to_string(),
                image: Box::new(image),
            }),
        }
    }

    fn find_rgb(
        &self,
        image: &RgbImage,
        pattern: &TextPattern,
        hint: Option<Rect>,
        rect: Option<Rect>,
    ) -> VisionResult<Option<OcrResult>> {
        if let Some(hint) = hint {
            let found = self.first_match(image, pattern, Some(hint))?;
            if found.is_some() {
                log::debug!("🔤 {} found inside hint {}", pattern, hint);
                return Ok(found);
            }
            log::debug!("🔤 {} not inside hint {}, searching {:?}", pattern, hint, rect);
        }
        self.first_match(image, pattern, rect)
    }

    fn first_match(
        &self,
        image: &RgbImage,
        pattern: &TextPattern,
        rect: Option<Rect>,
    ) -> VisionResult<Option<OcrResult>> {
        Ok(self
            .ocr_rgb(image, rect, true)?
            .into_iter()
            .find(|r| pattern.is_match(&r.text)))
    }

    fn ocr_rgb(&self, image: &RgbImage, rect: Option<Rect>, pad: bool) -> VisionResult<OcrResultList> {
        let (cropped, crop_x, crop_y) = match rect {
            Some(rect) => {
                let area = resolve_rect(rect, image.width(), image.height())?;
                (crop_rect(image, area)?, area.x, area.y)
            }
            None => (image.clone(), 0, 0),
        };

        let (input, mapping) = if pad {
            self.pad(cropped, crop_x, crop_y)
        } else {
            (cropped, FrameMapping::identity_at(crop_x, crop_y))
        };
        log::debug!(
            "🔤 ocr {}x{} (crop at {},{} pad at {},{} scale {:.3})",
            input.width(),
            input.height(),
            mapping.crop_x,
            mapping.crop_y,
            mapping.pad_x,
            mapping.pad_y,
            mapping.scale
        );

        let raw = self.engine.recognize(&imageops::grayscale(&input))?;
        let results: OcrResultList = raw
            .into_iter()
            .filter_map(|r| self.convert(r, &mapping))
            .collect();
        log::debug!("  {} text results", results.len());
        self.report(&input, &results);
        Ok(results)
    }

    /// Center `image` on a canvas of at least `min_canvas`, downscaling it
    /// first if it is larger than the canvas in one dimension
    fn pad(&self, image: RgbImage, crop_x: i32, crop_y: i32) -> (RgbImage, FrameMapping) {
        let Size {
            width: canvas_w,
            height: canvas_h,
        } = self.config.min_canvas;
        let (w, h) = image.dimensions();
        if w >= canvas_w && h >= canvas_h {
            return (image, FrameMapping::identity_at(crop_x, crop_y));
        }

        let (image, scale) = if w > canvas_w || h > canvas_h {
            let scale = (canvas_w as f32 / w as f32).min(canvas_h as f32 / h as f32);
            let new_w = ((w as f32 * scale).round() as u32).max(1);
            let new_h = ((h as f32 * scale).round() as u32).max(1);
            (imageops::resize(&image, new_w, new_h, FilterType::Lanczos3), scale)
        } else {
            (image, 1.0)
        };

        let pad_x = canvas_w.saturating_sub(image.width()) / 2;
        let pad_y = canvas_h.saturating_sub(image.height()) / 2;
        let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb(self.config.background));
        imageops::overlay(&mut canvas, &image, pad_x as i64, pad_y as i64);
        (
            canvas,
            FrameMapping {
                crop_x,
                crop_y,
                pad_x: pad_x as i32,
                pad_y: pad_y as i32,
                scale,
            },
        )
    }

    fn convert(&self, raw: RecognizedText, mapping: &FrameMapping) -> Option<OcrResult> {
        let Some(rect) = bounding_box(&raw.corners) else {
            log::trace!("dropping {:?}: no corners", raw.text);
            return None;
        };
        Some(OcrResult {
            text: self.normalize(&raw.text),
            rect,
            confidence: raw.confidence,
            original_rect: mapping.to_source(rect),
        })
    }

    /// Fold full-width forms to half-width and strip known artifacts
    fn normalize(&self, text: &str) -> String {
        let mut text: String = text.nfkc().collect();
        for (from, to) in &self.config.replacements {
            text = text.replace(from.as_str(), to);
        }
        text
    }

    fn report(&self, input: &RgbImage, results: &OcrResultList) {
        if !self.reporter.enabled() {
            return;
        }
        let rects: Vec<Rect> = results.iter().map(|r| r.rect).collect();
        let lines: Vec<String> = results.iter().map(|r| r.to_string()).collect();
        self.reporter.report(
            "ocr",
            &[annotate(input, &rects, RESULT_COLOR)],
            &lines.join("\n"),
        );
    }
}

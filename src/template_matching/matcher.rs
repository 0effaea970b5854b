//! Template matching engine: find, find-any, find-many, count, crop and expect
//! built on one scoring primitive and the shared deduplicator

use std::sync::Arc;

use image::{GrayImage, RgbImage};

use super::config::{MatchConfig, MatchOptions};
use super::dedup::ResultDeduplicator;
use super::histogram::hist_match_with_bins;
use super::scoring::score_map;
use super::types::{CropResult, MatchResult, MultiMatchResult};
use crate::debug::{DebugReporter, NoopReporter, RESULT_COLOR, annotate};
use crate::error::{VisionError, VisionResult};
use crate::geometry::{Point, Size};
use crate::loader::{ImageSource, alpha_mask, crop_rect, load_image, load_mask, load_rgb};

/// Template after loading, with its mask resolved
struct PreparedTemplate {
    name: String,
    rgb: RgbImage,
    mask: Option<GrayImage>,
}

impl PreparedTemplate {
    fn size(&self) -> Size {
        Size::new(self.rgb.width(), self.rgb.height())
    }
}

/// Template matcher for finding templates in screenshots
pub struct TemplateMatcher {
    config: MatchConfig,
    reporter: Arc<dyn DebugReporter>,
}

impl TemplateMatcher {
    /// Create a matcher with default settings and no debug output
    pub fn new() -> Self {
        Self::with_config(MatchConfig::default(), Arc::new(NoopReporter))
    }

    pub fn with_config(config: MatchConfig, reporter: Arc<dyn DebugReporter>) -> Self {
        Self { config, reporter }
    }

    /// Get current configuration
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Find every offset where `template` scores at least `options.threshold`
    ///
    /// # Arguments
    /// * `template` - The template to look for
    /// * `image` - The image to search in
    /// * `options` - Mask, transparency, threshold and color verification
    /// * `max_results` - Maximum number of results, 0 for unlimited
    ///
    /// # Returns
    /// Vec of matches sorted by score (highest first), not deduplicated
    pub fn match_template(
        &self,
        template: &ImageSource,
        image: &ImageSource,
        options: &MatchOptions,
        max_results: usize,
    ) -> VisionResult<Vec<MatchResult>> {
        let prepared = self.prepare(template, options.mask.as_ref(), options.transparent)?;
        let image = load_rgb(image)?;
        self.match_prepared(&prepared, &image, options, max_results)
    }

    /// Best match or `None`
    pub fn find(
        &self,
        image: &ImageSource,
        template: &ImageSource,
        options: &MatchOptions,
    ) -> VisionResult<Option<MatchResult>> {
        Ok(self
            .match_template(template, image, options, 1)?
            .into_iter()
            .next())
    }

    /// All deduplicated matches above the threshold
    pub fn find_many(
        &self,
        image: &ImageSource,
        template: &ImageSource,
        options: &MatchOptions,
    ) -> VisionResult<Vec<MatchResult>> {
        let prepared = self.prepare(template, options.mask.as_ref(), options.transparent)?;
        let image = load_rgb(image)?;
        self.find_many_prepared(&prepared, &image, options)
    }

    /// Number of deduplicated matches
    pub fn count(
        &self,
        image: &ImageSource,
        template: &ImageSource,
        options: &MatchOptions,
    ) -> VisionResult<usize> {
        Ok(self.find_many(image, template, options)?.len())
    }

    /// Try `templates` in order and return the first one that matches.
    ///
    /// `masks` runs parallel to `templates` and replaces `options.mask`;
    /// missing entries mean no mask.
    pub fn find_any(
        &self,
        image: &ImageSource,
        templates: &[ImageSource],
        masks: &[Option<ImageSource>],
        options: &MatchOptions,
    ) -> VisionResult<Option<MultiMatchResult>> {
        let image = load_rgb(image)?;
        for (index, template) in templates.iter().enumerate() {
            let mask = masks.get(index).and_then(Option::as_ref);
            let prepared = self.prepare(template, mask, options.transparent)?;
            let found = self.match_prepared(&prepared, &image, options, 1)?;
            if let Some(best) = found.into_iter().next() {
                log::debug!("✅ find_any: template #{} ({}) matched", index, prepared.name);
                return Ok(Some(MultiMatchResult::from_match(best, index)));
            }
        }
        Ok(None)
    }

    /// Like `find_many`, also copying out the matched pixels
    pub fn find_crop(
        &self,
        image: &ImageSource,
        template: &ImageSource,
        options: &MatchOptions,
    ) -> VisionResult<Vec<CropResult>> {
        let prepared = self.prepare(template, options.mask.as_ref(), options.transparent)?;
        let image = load_rgb(image)?;
        self.find_many_prepared(&prepared, &image, options)?
            .into_iter()
            .map(|m| crop_rect(&image, m.rect()).map(|pixels| CropResult::new(m, pixels)))
            .collect()
    }

    /// Like `find`, but a missing match is an error carrying both images
    pub fn expect(
        &self,
        image: &ImageSource,
        template: &ImageSource,
        options: &MatchOptions,
    ) -> VisionResult<MatchResult> {
        let prepared = self.prepare(template, options.mask.as_ref(), options.transparent)?;
        let image = load_rgb(image)?;
        match self.match_prepared(&prepared, &image, options, 1)?.into_iter().next() {
            Some(found) => Ok(found),
            None => Err(VisionError::TemplateNotFound {
                template: prepared.name,
                template_image: Box::new(prepared.rgb),
                image: Box::new(image),
            }),
        }
    }

    /// Load the template and build its mask
    fn prepare(
        &self,
        template: &ImageSource,
        mask: Option<&ImageSource>,
        transparent: bool,
    ) -> VisionResult<PreparedTemplate> {
        if mask.is_some() && transparent {
            return Err(VisionError::MaskConflict);
        }
        let name = template.display_name();
        let loaded = load_image(template)?;
        let rgb = loaded.to_rgb8();
        let mask = match mask {
            Some(source) => Some(load_mask(source, self.config.mask_level)?),
            None if transparent => Some(alpha_mask(&loaded.to_rgba8(), self.config.mask_level)),
            None => None,
        };
        if let Some(mask) = &mask
            && mask.dimensions() != rgb.dimensions()
        {
            return Err(VisionError::invalid_input(format!(
                "mask is {}x{} but template {} is {}x{}",
                mask.width(),
                mask.height(),
                name,
                rgb.width(),
                rgb.height()
            )));
        }
        Ok(PreparedTemplate { name, rgb, mask })
    }

    /// Candidates above threshold sorted by score, before color checks
    fn candidates(
        &self,
        template: &PreparedTemplate,
        image: &RgbImage,
        threshold: f32,
    ) -> Vec<MatchResult> {
        log::debug!(
            "🔍 match template: {} ({}x{}) in {}x{} threshold: {} masked: {}",
            template.name,
            template.rgb.width(),
            template.rgb.height(),
            image.width(),
            image.height(),
            threshold,
            template.mask.is_some()
        );
        let map = score_map(image, &template.rgb, template.mask.as_ref());
        let size = template.size();
        let mut matches: Vec<MatchResult> = map
            .above(threshold)
            .map(|(x, y, score)| MatchResult::new(score, Point::new(x as i32, y as i32), size))
            .collect();

        // Sort by score descending, raster order among ties
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        log::debug!("  {} raw candidates for {}", matches.len(), template.name);
        matches
    }

    fn match_prepared(
        &self,
        template: &PreparedTemplate,
        image: &RgbImage,
        options: &MatchOptions,
        max_results: usize,
    ) -> VisionResult<Vec<MatchResult>> {
        let mut accepted = Vec::new();
        for candidate in self.candidates(template, image, options.threshold) {
            if options.colored && !self.color_verified(template, image, &candidate, options.threshold)? {
                continue;
            }
            accepted.push(candidate);
            if max_results > 0 && accepted.len() >= max_results {
                break;
            }
        }
        self.report("template_match", template, image, &accepted, options);
        Ok(accepted)
    }

    fn find_many_prepared(
        &self,
        template: &PreparedTemplate,
        image: &RgbImage,
        options: &MatchOptions,
    ) -> VisionResult<Vec<MatchResult>> {
        let deduped = ResultDeduplicator::dedup(self.candidates(template, image, options.threshold));
        let mut results = Vec::with_capacity(deduped.len());
        for candidate in deduped {
            if options.colored && !self.color_verified(template, image, &candidate, options.threshold)? {
                continue;
            }
            results.push(candidate);
        }
        self.report("template_match_many", template, image, &results, options);
        Ok(results)
    }

    fn color_verified(
        &self,
        template: &PreparedTemplate,
        image: &RgbImage,
        candidate: &MatchResult,
        threshold: f32,
    ) -> VisionResult<bool> {
        let region = crop_rect(image, candidate.rect())?;
        hist_match_with_bins(
            &region,
            &template.rgb,
            template.mask.as_ref(),
            threshold,
            self.config.histogram_bins,
        )
    }

    fn report(
        &self,
        title: &str,
        template: &PreparedTemplate,
        image: &RgbImage,
        results: &[MatchResult],
        options: &MatchOptions,
    ) {
        if !self.reporter.enabled() {
            return;
        }
        let rects: Vec<_> = results.iter().map(MatchResult::rect).collect();
        let lines: Vec<String> = results.iter().map(|r| r.to_string()).collect();
        self.reporter.report(
            title,
            &[annotate(image, &rects, RESULT_COLOR), template.rgb.clone()],
            &format!(
                "template: {}\nthreshold: {}\ntransparent: {}\ncolored: {}\nmatches: {}\n{}",
                template.name,
                options.threshold,
                options.transparent,
                options.colored,
                results.len(),
                lines.join("\n")
            ),
        );
    }
}

impl Default for TemplateMatcher {
    fn default() -> Self {
        Self::new()
    }
}

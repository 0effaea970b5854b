//! Configuration for template matching operations

use serde::{Deserialize, Serialize};

use super::histogram::HISTOGRAM_BINS;
use crate::loader::{ImageSource, MASK_LEVEL};

/// Per-call matching options
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Explicit mask; pixels at or below the mask level are ignored
    pub mask: Option<ImageSource>,
    /// Derive the mask from the template's alpha channel
    pub transparent: bool,
    /// Minimum score (0.0 to 1.0) for a candidate
    pub threshold: f32,
    /// Re-verify matches by comparing color histograms
    pub colored: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            mask: None,
            transparent: false,
            threshold: 0.8,
            colored: false,
        }
    }
}

impl MatchOptions {
    /// Preset used for counting and for `expect`
    pub fn strict() -> Self {
        Self {
            threshold: 0.9,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_mask(mut self, mask: impl Into<ImageSource>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn colored(mut self) -> Self {
        self.colored = true;
        self
    }
}

/// Matcher-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Mask and alpha values above this level count as "on"
    pub mask_level: u8,
    /// Bins per channel for colored verification
    pub histogram_bins: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mask_level: MASK_LEVEL,
            histogram_bins: HISTOGRAM_BINS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_options_defaults() {
        let options = MatchOptions::default();
        assert_eq!(options.threshold, 0.8);
        assert!(options.mask.is_none());
        assert!(!options.transparent);
        assert!(!options.colored);
        assert_eq!(MatchOptions::strict().threshold, 0.9);
    }

    #[test]
    fn test_builder_chain() {
        let options = MatchOptions::default()
            .with_threshold(0.999)
            .transparent()
            .colored();
        assert_eq!(options.threshold, 0.999);
        assert!(options.transparent && options.colored);
    }

    #[test]
    fn test_match_config_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.mask_level, 127);
        assert_eq!(config.histogram_bins, 32);
    }
}

/// Template matching module for locating images inside screenshots
///
/// This module provides:
/// - Correlation-coefficient scoring, or masked cross-correlation for masks
///   and transparent templates
/// - Deduplication of overlapping candidates
/// - Optional color-histogram verification of geometric matches
pub mod config;
pub mod dedup;
pub mod histogram;
pub mod matcher;
pub mod scoring;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{MatchConfig, MatchOptions};
pub use dedup::{Detection, ResultDeduplicator};
pub use histogram::{hist_match, hist_similarity, hist_similarity_masked};
pub use matcher::TemplateMatcher;
pub use types::{CropResult, MatchResult, MultiMatchResult};

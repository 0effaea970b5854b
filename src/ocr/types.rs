use std::fmt;
use std::ops::Deref;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pattern::TextPattern;
use crate::geometry::Rect;

/// One recognized line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Normalized text
    pub text: String,
    /// Bounding rect in the frame of the image the engine saw
    pub rect: Rect,
    pub confidence: f32,
    /// Bounding rect in the frame of the source image
    pub original_rect: Rect,
}

impl OcrResult {
    /// All non-overlapping matches of `pattern` in the text
    pub fn regex(&self, pattern: &Regex) -> Vec<String> {
        pattern
            .find_iter(&self.text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Every run of decimal digits parsed as an integer
    pub fn numbers(&self) -> Vec<u64> {
        self.text
            .split(|c: char| !c.is_ascii_digit())
            .filter(|run| !run.is_empty())
            .filter_map(|run| run.parse().ok())
            .collect()
    }
}

impl fmt::Display for OcrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} at {} ({:.0}%)",
            self.text,
            self.original_rect,
            self.confidence * 100.0
        )
    }
}

/// Results of one OCR call, in engine order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResultList(Vec<OcrResult>);

impl OcrResultList {
    pub fn new(results: Vec<OcrResult>) -> Self {
        Self(results)
    }

    /// Results whose text matches `pattern`
    pub fn where_text(&self, pattern: impl Into<TextPattern>) -> OcrResultList {
        let pattern = pattern.into();
        self.0
            .iter()
            .filter(|r| pattern.is_match(&r.text))
            .cloned()
            .collect()
    }

    /// All texts joined with `sep`
    pub fn squash(&self, sep: &str) -> String {
        self.0
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(sep)
    }

    pub fn into_vec(self) -> Vec<OcrResult> {
        self.0
    }
}

impl Deref for OcrResultList {
    type Target = [OcrResult];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<OcrResult> for OcrResultList {
    fn from_iter<I: IntoIterator<Item = OcrResult>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for OcrResultList {
    type Item = OcrResult;
    type IntoIter = std::vec::IntoIter<OcrResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a OcrResultList {
    type Item = &'a OcrResult;
    type IntoIter = std::slice::Iter<'a, OcrResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

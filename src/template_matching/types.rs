//! Template matching data types
use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::dedup::Detection;
use crate::geometry::{Point, Rect, Size};

/// A single match result
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Correlation score, 1.0 is a perfect match
    pub score: f32,
    /// Top-left corner of the match in the searched image
    pub position: Point,
    /// Size of the template
    pub size: Size,
}

impl MatchResult {
    pub fn new(score: f32, position: Point, size: Size) -> Self {
        Self {
            score,
            position,
            size,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn right_bottom(&self) -> Point {
        self.rect().right_bottom()
    }

    /// Get tap coordinates at the center of this match
    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score_pct = (self.score * 100.0) as i32;
        write!(
            f,
            "match at ({},{}) {}x{} - {}%",
            self.position.x, self.position.y, self.size.width, self.size.height, score_pct
        )
    }
}

/// Match produced by one template out of a list
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiMatchResult {
    pub score: f32,
    pub position: Point,
    pub size: Size,
    /// Index of the template that produced this match
    pub index: usize,
}

impl MultiMatchResult {
    pub fn from_match(result: MatchResult, index: usize) -> Self {
        Self {
            score: result.score,
            position: result.position,
            size: result.size,
            index,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn right_bottom(&self) -> Point {
        self.rect().right_bottom()
    }

    pub fn as_match(&self) -> MatchResult {
        MatchResult::new(self.score, self.position, self.size)
    }
}

/// Match together with the pixels it covers
#[derive(Clone, Debug)]
pub struct CropResult {
    pub score: f32,
    pub position: Point,
    pub size: Size,
    pub image: RgbImage,
}

impl CropResult {
    pub fn new(result: MatchResult, image: RgbImage) -> Self {
        Self {
            score: result.score,
            position: result.position,
            size: result.size,
            image,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn right_bottom(&self) -> Point {
        self.rect().right_bottom()
    }
}

impl Detection for MatchResult {
    fn score(&self) -> f32 {
        self.score
    }

    fn rect(&self) -> Rect {
        MatchResult::rect(self)
    }
}

impl Detection for MultiMatchResult {
    fn score(&self) -> f32 {
        self.score
    }

    fn rect(&self) -> Rect {
        MultiMatchResult::rect(self)
    }
}

impl Detection for CropResult {
    fn score(&self) -> f32 {
        self.score
    }

    fn rect(&self) -> Rect {
        CropResult::rect(self)
    }
}

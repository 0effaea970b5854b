//! Rectangles, points and sizes shared by every matcher

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Axis-aligned rectangle, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect covering a whole image
    pub fn full_image(image_width: u32, image_height: u32) -> Self {
        Self::new(0, 0, image_width, image_height)
    }

    pub fn from_position_size(position: Point, size: Size) -> Self {
        Self::new(position.x, position.y, size.width, size.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        saturating_edge(self.x, self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        saturating_edge(self.y, self.height)
    }

    pub fn right_bottom(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Get the center point of this rect
    pub fn center(&self) -> Point {
        Point::new(
            saturating_edge(self.x, self.width / 2),
            saturating_edge(self.y, self.height / 2),
        )
    }

    /// Check if this rect contains a point
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// A rect with zero width or height covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Overlapping part of two rects, `None` when they do not overlap
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Rect::new(
            x1,
            y1,
            (x2 as i64 - x1 as i64) as u32,
            (y2 as i64 - y1 as i64) as u32,
        ))
    }

    /// Clip this rect to image boundaries
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> Option<Rect> {
        self.intersect(&Rect::full_image(image_width, image_height))
    }

    /// Grow (positive) or shrink (negative) each edge independently.
    ///
    /// Width and height saturate at zero when shrinking past the opposite edge.
    pub fn expand(&self, top: i32, right: i32, bottom: i32, left: i32) -> Rect {
        let width = (self.width as i64 + left as i64 + right as i64).max(0) as u32;
        let height = (self.height as i64 + top as i64 + bottom as i64).max(0) as u32;
        Rect::new(self.x - left, self.y - top, width, height)
    }

    /// Same amount on every edge
    pub fn expand_all(&self, amount: i32) -> Rect {
        self.expand(amount, amount, amount, amount)
    }
}

impl From<(i32, i32, u32, u32)> for Rect {
    fn from((x, y, width, height): (i32, i32, u32, u32)) -> Self {
        Rect::new(x, y, width, height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{},{}]", self.x, self.y, self.width, self.height)
    }
}

/// `start + length`, clamped to `i32::MAX`
fn saturating_edge(start: i32, length: u32) -> i32 {
    (start as i64 + length as i64).min(i32::MAX as i64) as i32
}

/// Smallest rect enclosing all points.
///
/// Coordinates are rounded to the nearest pixel first. Returns `None` for an
/// empty point list.
pub fn bounding_box(points: &[(f32, f32)]) -> Option<Rect> {
    let mut iter = points
        .iter()
        .map(|&(x, y)| (x.round() as i32, y.round() as i32));
    let (first_x, first_y) = iter.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);
    for (x, y) in iter {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some(Rect::new(
        min_x,
        min_y,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
    ))
}

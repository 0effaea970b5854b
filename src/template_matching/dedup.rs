//! Collapsing of overlapping candidates into one result per cluster
//!
//! Neighboring offsets around a true match usually clear the threshold too.
//! Candidates are visited best-first and a candidate survives only if its
//! center lands outside every rect kept so far.

use crate::geometry::{Point, Rect};

/// Anything with a score and a footprint
pub trait Detection {
    fn score(&self) -> f32;

    fn rect(&self) -> Rect;
}

/// Non-maximum suppression over match candidates
pub struct ResultDeduplicator;

impl ResultDeduplicator {
    /// Keep the best-scoring member of each spatial cluster.
    ///
    /// The output is sorted by score descending and is a fixed point: feeding
    /// it back in returns it unchanged.
    pub fn dedup<T: Detection>(mut candidates: Vec<T>) -> Vec<T> {
        if candidates.len() < 2 {
            return candidates;
        }
        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let mut grid = OccupancyGrid::covering(candidates.iter().map(Detection::rect));
        let mut kept = Vec::new();
        for candidate in candidates {
            let rect = candidate.rect();
            if grid.is_occupied(rect.center()) {
                continue;
            }
            grid.occupy(&rect);
            kept.push(candidate);
        }
        kept
    }
}

/// Bitmap over the union extent of all candidate rects
struct OccupancyGrid {
    origin: Point,
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    fn covering(rects: impl Iterator<Item = Rect>) -> Self {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for rect in rects {
            min_x = min_x.min(rect.x);
            min_y = min_y.min(rect.y);
            max_x = max_x.max(rect.right());
            max_y = max_y.max(rect.bottom());
        }
        if min_x > max_x || min_y > max_y {
            return Self {
                origin: Point::default(),
                width: 0,
                height: 0,
                cells: Vec::new(),
            };
        }
        let width = (max_x - min_x) as usize;
        let height = (max_y - min_y) as usize;
        Self {
            origin: Point::new(min_x, min_y),
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let dx = point.x - self.origin.x;
        let dy = point.y - self.origin.y;
        if dx < 0 || dy < 0 || dx as usize >= self.width || dy as usize >= self.height {
            return None;
        }
        Some(dy as usize * self.width + dx as usize)
    }

    fn is_occupied(&self, point: Point) -> bool {
        self.index(point).is_some_and(|i| self.cells[i])
    }

    fn occupy(&mut self, rect: &Rect) {
        let x0 = (rect.x - self.origin.x).max(0) as usize;
        let y0 = (rect.y - self.origin.y).max(0) as usize;
        let x1 = ((rect.right() - self.origin.x).max(0) as usize).min(self.width);
        let y1 = ((rect.bottom() - self.origin.y).max(0) as usize).min(self.height);
        for y in y0..y1 {
            self.cells[y * self.width + x0..y * self.width + x1].fill(true);
        }
    }
}

// filepath: src/geometry.rs
//! Rectangle type shared by the builder, the compositor and the native layer.

use serde::{Deserialize, Serialize};

/// Rectangle given by its four edges, in destination-surface pixels.
///
/// `right` and `bottom` are exclusive. The same rectangle sizes the
/// off-screen buffer and places it on the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle anchored at the origin with the given size
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Horizontal extent, widened so far-apart edges cannot overflow
    pub const fn span_x(&self) -> i64 {
        self.right as i64 - self.left as i64
    }

    pub const fn span_y(&self) -> i64 {
        self.bottom as i64 - self.top as i64
    }

    /// Width clamped into `i32`; see [`Rect::checked_size`] for the exact value
    pub fn width(&self) -> i32 {
        self.span_x().clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn height(&self) -> i32 {
        self.span_y().clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// `(width, height)` when both extents fit in `i32`
    pub fn checked_size(&self) -> Option<(i32, i32)> {
        Some((
            self.right.checked_sub(self.left)?,
            self.bottom.checked_sub(self.top)?,
        ))
    }

    /// True when either extent is negative
    pub const fn is_inverted(&self) -> bool {
        self.span_x() < 0 || self.span_y() < 0
    }

    /// True when the rectangle covers no pixels (including inverted rectangles)
    pub const fn is_empty(&self) -> bool {
        self.span_x() <= 0 || self.span_y() <= 0
    }

    /// Number of pixels covered, zero for empty rectangles
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.span_x() as u64).saturating_mul(self.span_y() as u64) as usize
        }
    }

    /// Intersection of two rectangles, `None` when they do not overlap
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if r.is_empty() {
            None
        } else {
            Some(r)
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

impl From<[i32; 4]> for Rect {
    fn from([left, top, right, bottom]: [i32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_follow_edges() {
        let r = Rect::new(2, 3, 6, 10);
        assert_eq!(r.width(), 4);
        assert_eq!(r.height(), 7);
        assert_eq!(r.area(), 28);
        assert!(!r.is_empty());
    }

    #[test]
    fn degenerate_rectangles() {
        assert!(Rect::new(4, 4, 4, 9).is_empty());
        assert!(!Rect::new(4, 4, 4, 9).is_inverted());
        assert!(Rect::new(5, 0, 1, 3).is_inverted());
        assert_eq!(Rect::new(5, 0, 1, 3).area(), 0);
    }

    #[test]
    fn far_apart_edges_do_not_overflow() {
        let r = Rect::new(i32::MIN, 0, i32::MAX, 1);
        assert_eq!(r.span_x(), u32::MAX as i64);
        assert_eq!(r.width(), i32::MAX);
        assert_eq!(r.checked_size(), None);
        assert!(!r.is_inverted());

        let r = Rect::new(i32::MAX, 0, i32::MIN, 1);
        assert!(r.is_inverted());
        assert_eq!(r.width(), i32::MIN);
        assert_eq!(Rect::new(1, 2, 4, 8).checked_size(), Some((3, 6)));
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = Rect::new(-3, -3, 4, 4);
        let b = Rect::from_size(10, 10);
        assert_eq!(a.intersect(&b), Some(Rect::new(0, 0, 4, 4)));
        assert_eq!(Rect::new(20, 20, 30, 30).intersect(&b), None);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 2, 6, 6);
        assert!(r.contains(2, 2));
        assert!(r.contains(5, 5));
        assert!(!r.contains(6, 5));
        assert!(!r.contains(1, 3));
    }
}

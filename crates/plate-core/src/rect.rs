//! Integer windows for display and data regions.
//!
//! Every image carries two windows:
//! - the **display window**, the nominal canvas
//! - the **data window**, the region for which samples are stored
//!
//! Both are [`Rect`] values with *inclusive* corners, so a 1920x1080 frame
//! starting at the origin spans `(0, 0)..=(1919, 1079)`.
//!
//! # Coordinate System
//!
//! ```text
//! (min_x,min_y) ────────► X
//!   │
//!   │   ┌──────────┐
//!   │   │  Window  │
//!   │   └──────────┘ (max_x,max_y)
//!   ▼
//!   Y
//! ```
//!
//! Rows are ordered top to bottom, columns left to right. Coordinates are
//! signed because data windows may start left of or above the display
//! window (overscan).
//!
//! # Usage
//!
//! ```rust
//! use plate_core::Rect;
//!
//! let display = Rect::from_size(640, 480);
//! let data = Rect::new(600, 400, 700, 500);
//!
//! let visible = display.intersect(&data);
//! assert_eq!(visible, Rect::new(600, 400, 639, 479));
//! assert_eq!(visible.width(), 40);
//! ```
//!
//! # Used By
//!
//! - [`crate::image::Image`] - display/data windows
//! - `plate-io` - per-channel read windows and writer regions

/// Rectangle with inclusive integer corners.
///
/// # Invariants
///
/// A rectangle is empty when `max_x < min_x` or `max_y < min_y`.
/// [`Rect::empty`] is the canonical empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge (inclusive)
    pub min_x: i32,
    /// Top edge (inclusive)
    pub min_y: i32,
    /// Right edge (inclusive)
    pub max_x: i32,
    /// Bottom edge (inclusive)
    pub max_y: i32,
}

impl Default for Rect {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rect {
    /// Creates a rectangle from inclusive corners.
    ///
    /// # Example
    ///
    /// ```rust
    /// use plate_core::Rect;
    ///
    /// let r = Rect::new(0, 0, 1, 1);
    /// assert_eq!(r.area(), 4);
    /// ```
    #[inline]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a rectangle anchored at the origin.
    ///
    /// A zero dimension yields an empty rectangle.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32 - 1, height as i32 - 1)
    }

    /// Creates a rectangle from an origin and a size.
    #[inline]
    pub const fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self::new(x, y, x + width as i32 - 1, y + height as i32 - 1)
    }

    /// The canonical empty rectangle.
    #[inline]
    pub const fn empty() -> Self {
        Self::new(0, 0, -1, -1)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Number of columns (0 when empty).
    #[inline]
    pub const fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_x as i64 - self.min_x as i64 + 1) as u32
        }
    }

    /// Number of rows (0 when empty).
    #[inline]
    pub const fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.max_y as i64 - self.min_y as i64 + 1) as u32
        }
    }

    /// Pixel count as `usize`, the length of a channel covering this window.
    #[inline]
    pub const fn area(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Returns `true` if `(x, y)` lies inside the rectangle.
    #[inline]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    ///
    /// An empty `other` is contained in everything.
    #[inline]
    pub const fn contains(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.min_x >= self.min_x
                && other.max_x <= self.max_x
                && other.min_y >= self.min_y
                && other.max_y <= self.max_y)
    }

    /// Returns the overlap of two rectangles, or an empty rectangle.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        if r.is_empty() { Rect::empty() } else { r }
    }

    /// Returns the smallest rectangle covering both inputs.
    pub fn union(&self, other: &Rect) -> Rect {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Rect::new(
                self.min_x.min(other.min_x),
                self.min_y.min(other.min_y),
                self.max_x.max(other.max_x),
                self.max_y.max(other.max_y),
            ),
        }
    }

    /// Moves the rectangle by `(dx, dy)`.
    #[inline]
    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Splits at column `x`: the left half ends at `x - 1`, the right half
    /// starts at `x`. Either half may be empty.
    pub fn split_x(&self, x: i32) -> (Rect, Rect) {
        let left = Rect::new(self.min_x, self.min_y, x - 1, self.max_y).intersect(self);
        let right = Rect::new(x, self.min_y, self.max_x, self.max_y).intersect(self);
        (left, right)
    }

    /// Splits at row `y`: the top half ends at `y - 1`, the bottom half
    /// starts at `y`. Either half may be empty.
    pub fn split_y(&self, y: i32) -> (Rect, Rect) {
        let top = Rect::new(self.min_x, self.min_y, self.max_x, y - 1).intersect(self);
        let bottom = Rect::new(self.min_x, y, self.max_x, self.max_y).intersect(self);
        (top, bottom)
    }

    /// Row-major index of `(x, y)` within this rectangle.
    ///
    /// The point must lie inside the rectangle.
    #[inline]
    pub const fn index_of(&self, x: i32, y: i32) -> usize {
        (y - self.min_y) as usize * self.width() as usize + (x - self.min_x) as usize
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}]-[{}, {}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size() {
        let r = Rect::from_size(1920, 1080);
        assert_eq!(r.max_x, 1919);
        assert_eq!(r.max_y, 1079);
        assert_eq!(r.area(), 1920 * 1080);
        assert!(Rect::from_size(0, 10).is_empty());
    }

    #[test]
    fn test_intersect() {
        let a = Rect::new(0, 0, 9, 9);
        let b = Rect::new(5, -3, 20, 4);
        assert_eq!(a.intersect(&b), Rect::new(5, 0, 9, 4));

        let far = Rect::new(100, 100, 110, 110);
        assert!(a.intersect(&far).is_empty());
        assert_eq!(a.intersect(&far).area(), 0);
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(2, 2, 3, 3);
        assert_eq!(a.union(&Rect::empty()), a);
        assert_eq!(a.union(&Rect::new(-1, 0, 0, 0)), Rect::new(-1, 0, 3, 3));
    }

    #[test]
    fn test_contains() {
        let a = Rect::new(0, 0, 3, 3);
        assert!(a.contains(&Rect::new(1, 1, 2, 2)));
        assert!(!a.contains(&Rect::new(1, 1, 4, 2)));
        assert!(a.contains(&Rect::empty()));
        assert!(a.contains_point(3, 0));
        assert!(!a.contains_point(4, 0));
    }

    #[test]
    fn test_split() {
        let a = Rect::new(0, 0, 7, 3);
        let (l, r) = a.split_x(3);
        assert_eq!(l, Rect::new(0, 0, 2, 3));
        assert_eq!(r, Rect::new(3, 0, 7, 3));
        assert_eq!(l.area() + r.area(), a.area());

        let (t, b) = a.split_y(0);
        assert!(t.is_empty());
        assert_eq!(b, a);
    }

    #[test]
    fn test_index_of() {
        let a = Rect::new(-2, 5, 1, 7);
        assert_eq!(a.index_of(-2, 5), 0);
        assert_eq!(a.index_of(1, 5), 3);
        assert_eq!(a.index_of(-2, 6), 4);
    }
}

#![forbid(unsafe_code)]

//! Geometric primitives: pixel rectangles and rectangle-union regions.
//!
//! [`Rect`] is an integer pixel rectangle in surface coordinates
//! (origin at top-left). [`Region`] is a union of rectangles used to
//! accumulate the dirty area of a frame: unions are associative, and
//! clipping a region against the surface rectangle correctly discards
//! pieces that fall entirely off-surface.
//!
//! # Usage
//!
//! ```
//! use paneldiff_core::geometry::{Rect, Region};
//!
//! let mut dirty = Region::new();
//! dirty.add(Rect::new(0, 0, 50, 50));
//! dirty.add(Rect::new(100, 100, 50, 50));
//!
//! assert!(dirty.intersects(&Rect::new(40, 40, 20, 20)));
//! assert_eq!(dirty.bounding(), Rect::new(0, 0, 150, 150));
//! ```

use smallvec::SmallVec;

/// A rectangle in surface pixel coordinates.
///
/// `x`/`y` may be negative (an element can hang off the left or top
/// edge of the surface); a rectangle with non-positive width or height
/// is treated as empty everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const ZERO: Rect = Rect::new(0, 0, 0, 0);

    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from the origin with the given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Area in pixels. Zero for empty rectangles.
    #[inline]
    pub const fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }

    /// Check if the rectangle has no area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    ///
    /// Every rectangle contains the empty rectangle.
    #[inline]
    pub const fn contains_rect(&self, other: &Rect) -> bool {
        if other.is_empty() {
            return true;
        }
        !self.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Check if this rectangle overlaps `other`.
    ///
    /// Empty rectangles overlap nothing.
    #[inline]
    pub const fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns [`Rect::ZERO`] if the rectangles do not overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        if !self.intersects(other) {
            return Rect::ZERO;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// The smallest rectangle containing both this one and `other`.
    ///
    /// An empty operand contributes nothing.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// A union of rectangles accumulated during a frame diff.
///
/// The region keeps the set small by absorbing rectangles that are
/// fully contained in one another, but makes no attempt at a general
/// rectangle decomposition: overlap between members is allowed. All
/// queries treat the region as the set-union of its members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    rects: SmallVec<[Rect; 8]>,
}

impl Region {
    /// Create an empty region.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a region covering a single rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Region::new();
        region.add(rect);
        region
    }

    /// Add a rectangle to the union.
    ///
    /// Empty rectangles are ignored; rectangles contained in an
    /// existing member are dropped, and existing members contained in
    /// the new rectangle are absorbed.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        if self.rects.iter().any(|r| r.contains_rect(&rect)) {
            return;
        }
        self.rects.retain(|r| !rect.contains_rect(r));
        self.rects.push(rect);
    }

    /// Add every rectangle of `other` to this region.
    pub fn union_with(&mut self, other: &Region) {
        for rect in other.rects() {
            self.add(*rect);
        }
    }

    /// Check if any member rectangle overlaps `rect`.
    #[inline]
    pub fn intersects(&self, rect: &Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(rect))
    }

    /// Check if a point lies inside the region.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }

    /// Clip the region against `bounds`, dropping pieces that fall
    /// entirely outside.
    pub fn clip(&mut self, bounds: &Rect) {
        let mut clipped: SmallVec<[Rect; 8]> = SmallVec::new();
        for rect in self.rects.drain(..) {
            let piece = rect.intersection(bounds);
            if !piece.is_empty() {
                clipped.push(piece);
            }
        }
        self.rects = clipped;
    }

    /// The bounding rectangle of the region, [`Rect::ZERO`] if empty.
    pub fn bounding(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::ZERO, |acc, rect| acc.union(rect))
    }

    /// Check if the region covers no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The member rectangles of the union.
    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Region::from_rect(rect)
    }
}

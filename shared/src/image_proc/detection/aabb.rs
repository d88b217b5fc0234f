//! Integer pixel boxes and points in parent-image coordinates.
//!
//! A [`BBox`] stores inclusive minimum and maximum pixel indices. The
//! half-open `begin`/`end` accessors are what plotting code wants for axis
//! extents, and what `ndarray` wants for slicing once the origin is removed.

use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point2I {
    pub x: i32,
    pub y: i32,
}

impl Point2I {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Floating-point pixel coordinate. Pixel centers sit on integer values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Build a point, rejecting NaN and infinite coordinates.
    pub fn try_new(x: f64, y: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ImageError::NonFinitePoint { x, y });
        }
        Ok(Self { x, y })
    }
}

/// Axis-aligned integer box with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BBox {
    /// Create an empty box, ready to be grown with [`BBox::expand_to_include`].
    pub fn empty() -> Self {
        Self {
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
        }
    }

    /// Create a box from inclusive corner coordinates.
    pub fn from_coords(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a box from its lower-left corner and dimensions.
    ///
    /// A zero width or height yields a box that is not valid.
    pub fn from_corner_size(corner: Point2I, width: usize, height: usize) -> Self {
        Self {
            min_x: corner.x,
            min_y: corner.y,
            max_x: corner.x + width as i32 - 1,
            max_y: corner.y + height as i32 - 1,
        }
    }

    pub fn begin_x(&self) -> i32 {
        self.min_x
    }

    /// One past the last column.
    pub fn end_x(&self) -> i32 {
        self.max_x + 1
    }

    pub fn begin_y(&self) -> i32 {
        self.min_y
    }

    /// One past the last row.
    pub fn end_y(&self) -> i32 {
        self.max_y + 1
    }

    /// Lower-left corner.
    pub fn min(&self) -> Point2I {
        Point2I::new(self.min_x, self.min_y)
    }

    /// Number of columns, zero for an invalid box.
    pub fn width(&self) -> usize {
        (self.max_x as i64 - self.min_x as i64 + 1).max(0) as usize
    }

    /// Number of rows, zero for an invalid box.
    pub fn height(&self) -> usize {
        (self.max_y as i64 - self.min_y as i64 + 1).max(0) as usize
    }

    /// Array shape `(rows, cols)` covered by this box.
    pub fn dim(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Check if the box covers at least one pixel.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Return the box unchanged, or an error if it has negative extent.
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ImageError::InvalidBBox(self))
        }
    }

    /// Half-open extent `(begin_x, end_x, begin_y, end_y)` used to label plot axes.
    pub fn extent(&self) -> (i32, i32, i32, i32) {
        (self.begin_x(), self.end_x(), self.begin_y(), self.end_y())
    }

    /// Check if an integer pixel lies inside the box.
    pub fn contains_point(&self, point: Point2I) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Check if a floating-point position falls on one of the box's pixels.
    ///
    /// Pixel `i` spans `[i - 0.5, i + 0.5)`, so positions are rounded to the
    /// nearest pixel center rather than truncated. With `max_x == 9`, `x = 9.4`
    /// is inside and `x = 9.7` is outside, while `x = -0.3` is inside.
    pub fn contains_point_f(&self, point: Point2D) -> bool {
        self.is_valid()
            && point.x >= self.min_x as f64 - 0.5
            && point.x < self.max_x as f64 + 0.5
            && point.y >= self.min_y as f64 - 0.5
            && point.y < self.max_y as f64 + 0.5
    }

    /// Check if this box completely contains another.
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Expand this box to include the given pixel.
    pub fn expand_to_include(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Smallest box containing both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Copy of this box grown by `margin` pixels on every side.
    ///
    /// Fails with `InvalidInput` when a grown corner would leave the `i32` range.
    pub fn grow(&self, margin: usize) -> Result<Self> {
        let overflow = || ImageError::InvalidInput(format!("cannot grow {self:?} by {margin}"));
        let m = i32::try_from(margin).map_err(|_| overflow())?;
        Ok(Self {
            min_x: self.min_x.checked_sub(m).ok_or_else(overflow)?,
            min_y: self.min_y.checked_sub(m).ok_or_else(overflow)?,
            max_x: self.max_x.checked_add(m).ok_or_else(overflow)?,
            max_y: self.max_y.checked_add(m).ok_or_else(overflow)?,
        })
    }

    /// Row/column offset of `point` relative to this box's corner.
    pub fn local_index(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if self.contains_point(Point2I::new(x, y)) {
            Some(((y - self.min_y) as usize, (x - self.min_x) as usize))
        } else {
            None
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D {
            x: (self.min_x as f64 + self.max_x as f64) / 2.0,
            y: (self.min_y as f64 + self.max_y as f64) / 2.0,
        }
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self::empty()
    }
}

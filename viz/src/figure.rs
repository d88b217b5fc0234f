//! Backend-independent figure description.
//!
//! A [`Figure`] is a grid of subplot slots, numbered from 1 like matplotlib's
//! `subplot(rows, cols, index)`. Slots can be left empty; a masked image shown
//! without its mask plane keeps the variance in slot 3.

use ndarray::{Array2, ArrayView2};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::image_proc::{zscale, BBox, DisplayRange};

use crate::{Result, VizError};

/// Axis limits `(x0, x1)` and `(y0, y1)` for one panel, in parent pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl From<BBox> for Extent {
    fn from(bbox: BBox) -> Self {
        let (x0, x1, y0, y1) = bbox.extent();
        Self {
            x0: x0 as f64,
            x1: x1 as f64,
            y0: y0 as f64,
            y1: y1 as f64,
        }
    }
}

/// Figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width: 8.0,
            height: 2.5,
        }
    }
}

/// One raster panel: lower-left origin, nearest-neighbour pixels, grayscale.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub data: Array2<f64>,
    pub range: DisplayRange,
    pub extent: Option<Extent>,
    pub show_colorbar: bool,
}

impl Panel {
    /// Build a panel, choosing the display range with zscale at `contrast`.
    pub fn new<T>(
        arr: &ArrayView2<T>,
        title: impl Into<String>,
        show_colorbar: bool,
        extent: Option<Extent>,
        contrast: f64,
    ) -> Result<Self>
    where
        T: ToPrimitive + Copy,
    {
        let range = zscale(arr, contrast)?;
        let data = arr.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
        Ok(Self {
            title: title.into(),
            data,
            range,
            extent,
            show_colorbar,
        })
    }

    /// Extent to draw at: the given one, or array indices when none was set.
    pub fn effective_extent(&self) -> Extent {
        self.extent.unwrap_or_else(|| {
            let (rows, cols) = self.data.dim();
            Extent {
                x0: 0.0,
                x1: cols as f64,
                y0: 0.0,
                y1: rows as f64,
            }
        })
    }

    /// Grayscale level in `0..=255` for `value`, or `None` for NaN pixels.
    pub fn gray_level(&self, value: f64) -> Option<u8> {
        if value.is_nan() {
            None
        } else {
            Some((self.range.normalize(value) * 255.0).round() as u8)
        }
    }
}

/// Panel placed in a subplot slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Subplot {
    /// 1-based slot index, row-major
    pub index: usize,
    pub panel: Panel,
}

/// A grid of panels drawn together.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub size: FigureSize,
    pub rows: usize,
    pub cols: usize,
    pub subplots: Vec<Subplot>,
}

impl Figure {
    pub fn new(size: FigureSize, rows: usize, cols: usize) -> Self {
        Self {
            size,
            rows,
            cols,
            subplots: Vec::new(),
        }
    }

    /// Single-slot figure holding `panel`.
    pub fn single(size: FigureSize, panel: Panel) -> Self {
        Self {
            size,
            rows: 1,
            cols: 1,
            subplots: vec![Subplot { index: 1, panel }],
        }
    }

    /// Place `panel` in slot `index`, replacing whatever was there.
    pub fn add(&mut self, index: usize, panel: Panel) -> Result<()> {
        if index == 0 || index > self.rows * self.cols {
            return Err(VizError::InvalidInput(format!(
                "subplot index {index} outside {}x{} grid",
                self.rows, self.cols
            )));
        }
        self.subplots.retain(|s| s.index != index);
        self.subplots.push(Subplot { index, panel });
        self.subplots.sort_by_key(|s| s.index);
        Ok(())
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.subplots
            .iter()
            .find(|s| s.index == index)
            .map(|s| &s.panel)
    }

    /// Titles of the occupied slots, in slot order.
    pub fn titles(&self) -> Vec<&str> {
        self.subplots.iter().map(|s| s.panel.title.as_str()).collect()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.subplots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subplots.is_empty()
    }
}

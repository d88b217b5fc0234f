//! Display settings shared by every figure a context draws.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::image_proc::DEFAULT_CONTRAST;

use crate::figure::FigureSize;
use crate::Result;

/// Settings for a [`crate::display::DisplayContext`] and its PNG backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Figure size in inches
    pub size: FigureSize,
    /// Output resolution, pixels per inch
    pub dpi: u32,
    /// zscale contrast
    pub contrast: f64,
    /// Draw a colorbar next to each panel
    pub show_bars: bool,
    /// Draw captions and axis labels (needs a system font)
    pub annotate: bool,
    /// File name prefix for rendered figures
    pub output_stem: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            size: FigureSize::default(),
            dpi: 100,
            contrast: DEFAULT_CONTRAST,
            show_bars: true,
            annotate: true,
            output_stem: "figure".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Pixel dimensions of a figure of `size` at this config's dpi.
    pub fn pixel_size(&self, size: FigureSize) -> (u32, u32) {
        let dpi = self.dpi.max(1) as f64;
        (
            ((size.width * dpi).round() as u32).max(1),
            ((size.height * dpi).round() as u32).max(1),
        )
    }

    /// Save as pretty-printed JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON; fields missing from the file keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

//! Rendering backends for [`Figure`]s.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::config::DisplayConfig;
use crate::figure::{Figure, Panel};
use crate::{Result, VizError};

/// Width of the colorbar strip to the right of a panel, in pixels.
const COLORBAR_WIDTH: u32 = 40;

/// Number of gray steps drawn in a colorbar.
const COLORBAR_STEPS: usize = 64;

/// Something that can put a figure in front of a person.
pub trait RenderBackend {
    fn render(&self, figure: &Figure) -> Result<()>;
}

/// Writes each figure to a numbered PNG file using plotters.
#[derive(Debug)]
pub struct PlotBackend {
    output_dir: PathBuf,
    config: DisplayConfig,
    counter: Cell<usize>,
    written: RefCell<Vec<PathBuf>>,
}

fn render_err<E: std::fmt::Display>(err: E) -> VizError {
    VizError::Render(err.to_string())
}

impl PlotBackend {
    /// Create a backend writing into `output_dir`, creating the directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>, config: DisplayConfig) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            config,
            counter: Cell::new(0),
            written: RefCell::new(Vec::new()),
        })
    }

    /// Backend for `output_dir`, or `None` when the directory is unusable.
    pub fn probe(output_dir: impl AsRef<Path>, config: &DisplayConfig) -> Option<Self> {
        let dir = output_dir.as_ref();
        match Self::new(dir, config.clone()) {
            Ok(backend) => Some(backend),
            Err(e) => {
                warn!("Cannot write figures to {}: {e}", dir.display());
                None
            }
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Paths of the files written so far, oldest first.
    pub fn written_files(&self) -> Vec<PathBuf> {
        self.written.borrow().clone()
    }

    fn next_path(&self) -> PathBuf {
        let n = self.counter.get();
        self.counter.set(n + 1);
        self.output_dir
            .join(format!("{}_{n:03}.png", self.config.output_stem))
    }

    fn draw_panel(&self, area: &DrawingArea<BitMapBackend, Shift>, panel: &Panel) -> Result<()> {
        let (width, _) = area.dim_in_pixel();
        let image_area = if panel.show_colorbar && width > 2 * COLORBAR_WIDTH {
            let (image_area, bar_area) =
                area.split_horizontally((width - COLORBAR_WIDTH) as i32);
            self.draw_colorbar(&bar_area, panel)?;
            image_area
        } else {
            area.clone()
        };

        let extent = panel.effective_extent();
        let mut builder = ChartBuilder::on(&image_area);
        builder.margin(5);
        if self.config.annotate {
            builder
                .caption(&panel.title, ("sans-serif", 16))
                .x_label_area_size(25)
                .y_label_area_size(35);
        }
        let mut chart = builder
            .build_cartesian_2d(extent.x0..extent.x1, extent.y0..extent.y1)
            .map_err(render_err)?;

        if self.config.annotate {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_label_formatter(&|x| format!("{x:.0}"))
                .y_label_formatter(&|y| format!("{y:.0}"))
                .draw()
                .map_err(render_err)?;
        }

        // Row 0 sits at y0, so the image has a lower-left origin.
        let (rows, cols) = panel.data.dim();
        let dx = (extent.x1 - extent.x0) / cols.max(1) as f64;
        let dy = (extent.y1 - extent.y0) / rows.max(1) as f64;
        let pixels = panel.data.indexed_iter().filter_map(|((row, col), &value)| {
            let level = panel.gray_level(value)?;
            let x = extent.x0 + col as f64 * dx;
            let y = extent.y0 + row as f64 * dy;
            Some(Rectangle::new(
                [(x, y), (x + dx, y + dy)],
                RGBColor(level, level, level).filled(),
            ))
        });
        chart.draw_series(pixels).map_err(render_err)?;
        Ok(())
    }

    fn draw_colorbar(&self, area: &DrawingArea<BitMapBackend, Shift>, panel: &Panel) -> Result<()> {
        let low = panel.range.low;
        let high = if panel.range.span() > 0.0 {
            panel.range.high
        } else {
            low + 1.0
        };

        let mut builder = ChartBuilder::on(area);
        builder.margin(5);
        if self.config.annotate {
            builder.y_label_area_size(30);
        }
        let mut chart = builder
            .build_cartesian_2d(0.0..1.0, low..high)
            .map_err(render_err)?;

        if self.config.annotate {
            chart
                .configure_mesh()
                .disable_mesh()
                .disable_x_axis()
                .y_labels(5)
                .draw()
                .map_err(render_err)?;
        }

        let step = (high - low) / COLORBAR_STEPS as f64;
        chart
            .draw_series((0..COLORBAR_STEPS).map(|i| {
                let level = ((i as f64 + 0.5) / COLORBAR_STEPS as f64 * 255.0).round() as u8;
                let y = low + i as f64 * step;
                Rectangle::new(
                    [(0.0, y), (1.0, y + step)],
                    RGBColor(level, level, level).filled(),
                )
            }))
            .map_err(render_err)?;
        Ok(())
    }
}

impl RenderBackend for PlotBackend {
    fn render(&self, figure: &Figure) -> Result<()> {
        let path = self.next_path();
        let dims = self.config.pixel_size(figure.size);
        {
            let root = BitMapBackend::new(&path, dims).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let areas = root.split_evenly((figure.rows.max(1), figure.cols.max(1)));
            for subplot in &figure.subplots {
                let area = areas.get(subplot.index - 1).ok_or_else(|| {
                    VizError::InvalidInput(format!("no subplot slot {}", subplot.index))
                })?;
                self.draw_panel(area, &subplot.panel)?;
            }

            root.present().map_err(render_err)?;
        }
        debug!("Figure with {} panels written to {}", figure.len(), path.display());
        self.written.borrow_mut().push(path);
        Ok(())
    }
}

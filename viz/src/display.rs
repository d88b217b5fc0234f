//! Display entry points.
//!
//! Every call composes a [`Figure`], renders it once through the context's
//! backend and returns what was drawn. A context without a backend returns
//! `Ok(None)` from every call and logs a single warning the first time.

use std::cell::Cell;
use std::path::Path;

use log::{debug, warn};
use ndarray::ArrayView2;
use num_traits::ToPrimitive;
use shared::image_proc::{
    DipoleTestImage, Exposure, HasArrayAndBBox, HasMaskedImageAndPsf, HasThreePlanesAndBBox,
    SourceRecord,
};

use crate::backend::{PlotBackend, RenderBackend};
use crate::config::DisplayConfig;
use crate::cutout::extract_cutout;
use crate::figure::{Extent, Figure, FigureSize, Panel};
use crate::{Result, VizError};

/// Most panels a single row of images may hold.
pub const MAX_PANELS: usize = 3;

/// Which planes to show and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    pub show_masks: bool,
    pub show_variance: bool,
    pub show_psf: bool,
    pub show_bars: bool,
    pub size: FigureSize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_masks: true,
            show_variance: false,
            show_psf: false,
            show_bars: true,
            size: FigureSize::default(),
        }
    }
}

/// Holds the rendering backend, if any, and the display settings.
pub struct DisplayContext {
    backend: Option<Box<dyn RenderBackend>>,
    config: DisplayConfig,
    warned: Cell<bool>,
}

impl std::fmt::Debug for DisplayContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayContext")
            .field("has_backend", &self.backend.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl DisplayContext {
    pub fn new(backend: Option<Box<dyn RenderBackend>>, config: DisplayConfig) -> Self {
        Self {
            backend,
            config,
            warned: Cell::new(false),
        }
    }

    /// Context that draws nothing.
    pub fn headless(config: DisplayConfig) -> Self {
        Self::new(None, config)
    }

    pub fn with_backend(backend: impl RenderBackend + 'static, config: DisplayConfig) -> Self {
        Self::new(Some(Box::new(backend)), config)
    }

    /// PNG output into `output_dir`, or a headless context when the directory is unusable.
    pub fn png(output_dir: impl AsRef<Path>, config: DisplayConfig) -> Self {
        let backend = PlotBackend::probe(output_dir, &config)
            .map(|b| Box::new(b) as Box<dyn RenderBackend>);
        Self::new(backend, config)
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Default options with this context's colorbar and size settings.
    pub fn options(&self) -> DisplayOptions {
        DisplayOptions {
            show_bars: self.config.show_bars,
            size: self.config.size,
            ..Default::default()
        }
    }

    fn backend(&self) -> Option<&dyn RenderBackend> {
        let backend = self.backend.as_deref();
        if backend.is_none() && !self.warned.replace(true) {
            warn!("No rendering backend available; display calls will be skipped");
        }
        backend
    }

    fn panel<T>(
        &self,
        arr: &ArrayView2<T>,
        title: &str,
        show_bar: bool,
        extent: Option<Extent>,
    ) -> Result<Panel>
    where
        T: ToPrimitive + Copy,
    {
        Panel::new(arr, title, show_bar, extent, self.config.contrast)
    }

    fn render(&self, backend: &dyn RenderBackend, figure: Figure) -> Result<Option<Figure>> {
        debug!("Rendering figure: {:?}", figure.titles());
        backend.render(&figure)?;
        Ok(Some(figure))
    }

    /// Show one array with a zscale stretch.
    pub fn display_2d_array<T>(
        &self,
        arr: &ArrayView2<T>,
        title: &str,
        show_bar: bool,
        extent: Option<Extent>,
    ) -> Result<Option<Panel>>
    where
        T: ToPrimitive + Copy,
    {
        let Some(backend) = self.backend() else {
            return Ok(None);
        };
        let panel = self.panel(arr, title, show_bar, extent)?;
        backend.render(&Figure::single(self.config.size, panel.clone()))?;
        Ok(Some(panel))
    }

    pub fn display_image<I: HasArrayAndBBox>(
        &self,
        image: &I,
        show_bars: bool,
        size: FigureSize,
    ) -> Result<Option<Figure>> {
        self.display_images(&[image as &dyn HasArrayAndBBox], show_bars, size)
    }

    /// Show up to three images side by side, each at its own parent coordinates.
    pub fn display_images(
        &self,
        images: &[&dyn HasArrayAndBBox],
        show_bars: bool,
        size: FigureSize,
    ) -> Result<Option<Figure>> {
        let Some(backend) = self.backend() else {
            return Ok(None);
        };
        if images.is_empty() || images.len() > MAX_PANELS {
            return Err(VizError::InvalidInput(format!(
                "can display 1 to {MAX_PANELS} images, got {}",
                images.len()
            )));
        }

        let mut figure = Figure::new(size, 1, images.len());
        for (i, image) in images.iter().enumerate() {
            let panel = self.panel(
                &image.array(),
                "Data",
                show_bars,
                Some(Extent::from(image.bbox())),
            )?;
            figure.add(i + 1, panel)?;
        }
        self.render(backend, figure)
    }

    fn masked_image_figure<M: HasThreePlanesAndBBox + ?Sized>(
        &self,
        mi: &M,
        show_masks: bool,
        show_variance: bool,
        show_bars: bool,
        size: FigureSize,
    ) -> Result<Figure> {
        let extent = Some(Extent::from(mi.bbox()));
        let mut figure = Figure::new(size, 1, MAX_PANELS);
        figure.add(1, self.panel(&mi.image_array(), "Data", show_bars, extent)?)?;
        if show_masks {
            let mask = mi.mask_array();
            figure.add(2, self.panel(&mask.view(), "Masks", show_bars, extent)?)?;
        }
        if show_variance {
            figure.add(
                3,
                self.panel(&mi.variance_array(), "Variance", show_bars, extent)?,
            )?;
        }
        Ok(figure)
    }

    /// Image, mask and variance planes in a 1x3 grid. Omitted planes leave their slot empty.
    pub fn display_masked_image<M: HasThreePlanesAndBBox + ?Sized>(
        &self,
        mi: &M,
        options: &DisplayOptions,
    ) -> Result<Option<Figure>> {
        let Some(backend) = self.backend() else {
            return Ok(None);
        };
        let figure = self.masked_image_figure(
            mi,
            options.show_masks,
            options.show_variance,
            options.show_bars,
            options.size,
        )?;
        self.render(backend, figure)
    }

    /// Like [`Self::display_masked_image`], with the PSF stamp taking the variance slot when requested.
    pub fn display_exposure<E: HasMaskedImageAndPsf + ?Sized>(
        &self,
        exposure: &E,
        options: &DisplayOptions,
    ) -> Result<Option<Figure>> {
        let Some(backend) = self.backend() else {
            return Ok(None);
        };
        let psf = if options.show_psf {
            Some(exposure.psf().ok_or(VizError::MissingPsf)?)
        } else {
            None
        };

        let mut figure = self.masked_image_figure(
            exposure.masked_image(),
            options.show_masks,
            options.show_variance && !options.show_psf,
            options.show_bars,
            options.size,
        )?;
        if let Some(psf) = psf {
            let stamp = psf.compute_image();
            let panel = self.panel(
                &stamp.array(),
                "PSF",
                options.show_bars,
                Some(Extent::from(stamp.bbox())),
            )?;
            figure.add(3, panel)?;
        }
        self.render(backend, figure)
    }

    /// Cut `source`'s footprint out of the difference image and, when given,
    /// its positive and negative components.
    #[allow(clippy::too_many_arguments)]
    pub fn display_cutouts(
        &self,
        source: &SourceRecord,
        exposure: &Exposure,
        pos_exposure: Option<&Exposure>,
        neg_exposure: Option<&Exposure>,
        as_heavy: bool,
        title: &str,
        size: FigureSize,
    ) -> Result<Option<Figure>> {
        let Some(backend) = self.backend() else {
            return Ok(None);
        };
        let footprint = source.footprint().footprint();
        let extent = Some(Extent::from(footprint.bbox()));
        let show_bars = self.config.show_bars;

        let slots = [
            (1, "Diffim", Some(exposure)),
            (2, "Pos", pos_exposure),
            (3, "Neg", neg_exposure),
        ];
        let mut figure = Figure::new(size, 1, MAX_PANELS);
        for (index, label, exp) in slots {
            let Some(exp) = exp else { continue };
            let cutout = extract_cutout(footprint, exp, as_heavy, 0)?;
            let panel_title = format!("{title} {label}");
            let panel = self.panel(&cutout.array(), panel_title.trim_start(), show_bars, extent)?;
            figure.add(index, panel)?;
        }
        self.render(backend, figure)
    }
}

/// Show the difference image and both components with default options.
pub fn dp_display_images(
    ctx: &DisplayContext,
    dipole: &DipoleTestImage,
) -> Result<Vec<Option<Figure>>> {
    let options = ctx.options();
    [&dipole.diffim, &dipole.pos_image, &dipole.neg_image]
        .into_iter()
        .map(|exposure| ctx.display_exposure(exposure, &options))
        .collect()
}

/// Show `source` cut out of the three exposures of `dipole`.
pub fn dp_display_cutouts(
    ctx: &DisplayContext,
    dipole: &DipoleTestImage,
    source: &SourceRecord,
    as_heavy: bool,
) -> Result<Option<Figure>> {
    ctx.display_cutouts(
        source,
        &dipole.diffim,
        Some(&dipole.pos_image),
        Some(&dipole.neg_image),
        as_heavy,
        "",
        ctx.config().size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use shared::image_proc::{DipoleSceneConfig, Image, Point2I};

    fn ramp_image() -> Image {
        let data = Array2::from_shape_fn((8, 8), |(r, c)| (r * 8 + c) as f32);
        Image::from_array(Point2I::new(3, 4), data)
    }

    #[test]
    fn test_headless_skips_everything() {
        let ctx = DisplayContext::headless(DisplayConfig::default());
        let scene = DipoleTestImage::generate(&DipoleSceneConfig::default()).unwrap();
        let image = ramp_image();

        assert!(!ctx.has_backend());
        assert!(ctx
            .display_2d_array(&image.array(), "x", true, None)
            .unwrap()
            .is_none());
        assert!(ctx
            .display_image(&image, true, FigureSize::default())
            .unwrap()
            .is_none());
        // Too many images would be an error with a backend.
        let many: Vec<&dyn HasArrayAndBBox> =
            (0..5).map(|_| &image as &dyn HasArrayAndBBox).collect();
        assert!(ctx
            .display_images(&many, true, FigureSize::default())
            .unwrap()
            .is_none());
        assert!(ctx
            .display_exposure(&scene.diffim, &ctx.options())
            .unwrap()
            .is_none());
        let record = scene.catalog.get(0).unwrap();
        assert!(dp_display_cutouts(&ctx, &scene, record, true)
            .unwrap()
            .is_none());
        assert_eq!(
            dp_display_images(&ctx, &scene).unwrap(),
            vec![None, None, None]
        );
    }

    #[test]
    fn test_warning_state_set_once() {
        let ctx = DisplayContext::headless(DisplayConfig::default());
        assert!(!ctx.warned.get());
        let image = ramp_image();
        ctx.display_image(&image, true, FigureSize::default())
            .unwrap();
        assert!(ctx.warned.get());
        ctx.display_image(&image, true, FigureSize::default())
            .unwrap();
        assert!(ctx.warned.get());
    }

    #[test]
    fn test_options_follow_config() {
        let config = DisplayConfig {
            show_bars: false,
            ..Default::default()
        };
        let ctx = DisplayContext::headless(config);
        let options = ctx.options();
        assert!(!options.show_bars);
        assert!(options.show_masks);
        assert!(!options.show_variance);
        assert!(!options.show_psf);
    }

    #[test]
    fn test_png_falls_back_to_headless() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(!DisplayContext::png(file.join("plots"), DisplayConfig::default()).has_backend());
        assert!(DisplayContext::png(dir.path(), DisplayConfig::default()).has_backend());
    }
}

//! Synthetic dipole scenes for exercising the inspection tools.
//!
//! A dipole is a pair of PSF-shaped lobes of equal flux and opposite sign, the
//! signature of a source that moved between the template and science images.
//! [`DipoleTestImage`] renders the positive and negative components as their
//! own exposures, subtracts them to form the difference image, and catalogs a
//! circular footprint around each dipole.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};
use crate::image_proc::detection::{
    BBox, Footprint, Point2D, Point2I, SourceCatalog, SourceRecord,
};
use crate::image_proc::image::{mask_planes, Exposure, Image, Mask, MaskedImage};
use crate::image_proc::psf::GaussianPsf;

/// One dipole in a synthetic scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DipoleSpec {
    /// Midpoint between the lobes (pixels)
    pub x: f64,
    pub y: f64,
    /// Flux of each lobe
    pub flux: f64,
    /// Distance between lobe centers (pixels)
    pub separation: f64,
    /// Direction from negative to positive lobe, degrees counter-clockwise from +x
    pub angle_degrees: f64,
}

/// Parameters of a synthetic dipole scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DipoleSceneConfig {
    pub width: usize,
    pub height: usize,
    /// Gaussian PSF sigma (pixels)
    pub psf_sigma: f64,
    /// Per-pixel noise sigma added to each component image
    pub noise_sigma: f64,
    /// Radius of the circular footprint drawn around each dipole
    pub footprint_radius: f64,
    pub seed: u64,
    pub dipoles: Vec<DipoleSpec>,
}

impl Default for DipoleSceneConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 50,
            psf_sigma: 2.0,
            noise_sigma: 2.0,
            footprint_radius: 9.0,
            seed: 42,
            dipoles: vec![
                DipoleSpec {
                    x: 30.0,
                    y: 25.0,
                    flux: 3000.0,
                    separation: 3.0,
                    angle_degrees: 0.0,
                },
                DipoleSpec {
                    x: 70.0,
                    y: 22.0,
                    flux: 2000.0,
                    separation: 4.0,
                    angle_degrees: 45.0,
                },
            ],
        }
    }
}

/// Difference image with its positive and negative components and a source catalog.
#[derive(Debug)]
pub struct DipoleTestImage {
    pub diffim: Exposure,
    pub pos_image: Exposure,
    pub neg_image: Exposure,
    pub catalog: SourceCatalog,
}

impl DipoleTestImage {
    /// Render the scene described by `config`.
    pub fn generate(config: &DipoleSceneConfig) -> Result<Self> {
        if config.noise_sigma < 0.0 || !config.noise_sigma.is_finite() {
            return Err(ImageError::InvalidInput(format!(
                "noise sigma must be non-negative, got {}",
                config.noise_sigma
            )));
        }
        let bbox = BBox::from_corner_size(Point2I::new(0, 0), config.width, config.height)
            .validated()?;
        let stamp_size = (config.psf_sigma * 8.0).ceil() as usize;
        let psf = GaussianPsf::new(config.psf_sigma, stamp_size)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let noise = Normal::new(0.0, config.noise_sigma)
            .map_err(|e| ImageError::InvalidInput(e.to_string()))?;

        let mut pos = Array2::<f64>::zeros(bbox.dim());
        let mut neg = Array2::<f64>::zeros(bbox.dim());
        for dipole in &config.dipoles {
            let (dx, dy) = lobe_offset(dipole);
            add_lobe(&mut pos, &psf, dipole.x + dx, dipole.y + dy, dipole.flux);
            add_lobe(&mut neg, &psf, dipole.x - dx, dipole.y - dy, dipole.flux);
        }
        if config.noise_sigma > 0.0 {
            pos.mapv_inplace(|v| v + noise.sample(&mut rng));
            neg.mapv_inplace(|v| v + noise.sample(&mut rng));
        }
        let diff = &pos - &neg;

        let variance = config.noise_sigma * config.noise_sigma;
        let mut catalog = SourceCatalog::new();
        let mut diff_mask = Mask::new(bbox, 0)?;

        for (id, dipole) in config.dipoles.iter().enumerate() {
            let center = Point2I::new(dipole.x.round() as i32, dipole.y.round() as i32);
            let footprint = Footprint::circle(center, config.footprint_radius)?;
            if !bbox.contains(&footprint.bbox()) {
                return Err(ImageError::OutOfBounds {
                    inner: footprint.bbox(),
                    outer: bbox,
                });
            }

            for (x, y) in footprint.pixels() {
                let (row, col) = ((y - bbox.min_y) as usize, (x - bbox.min_x) as usize);
                let bit = if diff[[row, col]] >= 0.0 {
                    mask_planes::DETECTED
                } else {
                    mask_planes::DETECTED_NEGATIVE
                };
                diff_mask.set_bits(x, y, bit);
            }

            catalog.push(
                SourceRecord::new(id as u64, footprint).with_centroid(Point2D {
                    x: dipole.x,
                    y: dipole.y,
                }),
            );
        }

        let exposure = |data: &Array2<f64>, mask: Mask, var: f64| -> Result<Exposure> {
            let masked = MaskedImage::new(
                Image::with_bbox(bbox, data.mapv(|v| v as f32))?,
                mask,
                Image::new(bbox, var as f32)?,
            )?;
            Ok(Exposure::new(masked).with_psf(Box::new(psf)))
        };

        Ok(Self {
            diffim: exposure(&diff, diff_mask, 2.0 * variance)?,
            pos_image: exposure(&pos, Mask::new(bbox, 0)?, variance)?,
            neg_image: exposure(&neg, Mask::new(bbox, 0)?, variance)?,
            catalog,
        })
    }
}

/// Offset from the dipole midpoint to the positive lobe.
fn lobe_offset(dipole: &DipoleSpec) -> (f64, f64) {
    let angle = dipole.angle_degrees.to_radians();
    let half = dipole.separation / 2.0;
    (half * angle.cos(), half * angle.sin())
}

fn add_lobe(image: &mut Array2<f64>, psf: &GaussianPsf, cx: f64, cy: f64, flux: f64) {
    for ((row, col), value) in image.indexed_iter_mut() {
        *value += flux * psf.evaluate(col as f64 - cx, row as f64 - cy);
    }
}

//! Point-spread-function models that can render their own image.

use std::f64::consts::PI;
use std::fmt::Debug;

use ndarray::Array2;

use crate::error::{ImageError, Result};
use crate::image_proc::detection::{BBox, Point2I};
use crate::image_proc::image::Image;

/// A PSF model able to draw itself as a small normalized stamp.
pub trait Psf: Debug {
    /// Render the PSF centered on pixel `(0, 0)`.
    fn compute_image(&self) -> Image;

    /// Box covered by [`Psf::compute_image`].
    fn bbox(&self) -> BBox {
        self.compute_image().bbox()
    }
}

/// Circular Gaussian PSF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPsf {
    sigma: f64,
    size: usize,
}

impl GaussianPsf {
    /// Create a Gaussian PSF whose stamp is `size` pixels on a side.
    ///
    /// Even sizes are bumped to the next odd size so the peak lands on a pixel.
    /// `sigma` must be positive and finite.
    pub fn new(sigma: f64, size: usize) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(ImageError::InvalidInput(format!(
                "PSF sigma must be positive, got {sigma}"
            )));
        }
        let size = if size % 2 == 0 { size + 1 } else { size };
        Ok(Self { sigma, size })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unit-flux surface density at offset `(dx, dy)` from the center.
    pub fn evaluate(&self, dx: f64, dy: f64) -> f64 {
        let s2 = self.sigma * self.sigma;
        (-(dx * dx + dy * dy) / (2.0 * s2)).exp() / (2.0 * PI * s2)
    }

    /// Discrete kernel summing to one.
    pub fn kernel(&self) -> Array2<f64> {
        let center = (self.size / 2) as f64;
        let mut kernel = Array2::from_shape_fn((self.size, self.size), |(i, j)| {
            self.evaluate(j as f64 - center, i as f64 - center)
        });

        let sum = kernel.sum();
        if sum > 0.0 {
            kernel.mapv_inplace(|x| x / sum);
        }
        kernel
    }
}

impl Psf for GaussianPsf {
    fn compute_image(&self) -> Image {
        let half = (self.size / 2) as i32;
        Image::from_array(
            Point2I::new(-half, -half),
            self.kernel().mapv(|v| v as f32),
        )
    }

    fn bbox(&self) -> BBox {
        let half = (self.size / 2) as i32;
        BBox::from_coords(-half, -half, half, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_is_normalized() {
        let psf = GaussianPsf::new(2.0, 15).unwrap();
        assert_relative_eq!(psf.kernel().sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bad_sigma_rejected() {
        for sigma in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                GaussianPsf::new(sigma, 9),
                Err(ImageError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_even_size_rounds_up() {
        let psf = GaussianPsf::new(1.0, 10).unwrap();
        assert_eq!(psf.size(), 11);
    }

    #[test]
    fn test_image_centered_on_origin() {
        let psf = GaussianPsf::new(1.5, 9).unwrap();
        let image = psf.compute_image();
        assert_eq!(image.bbox(), BBox::from_coords(-4, -4, 4, 4));
        assert_eq!(psf.bbox(), image.bbox());

        let peak = *image.get(0, 0).unwrap();
        for &v in image.array().iter() {
            assert!(v <= peak);
        }
        assert_relative_eq!(*image.get(1, 0).unwrap(), *image.get(0, -1).unwrap());
    }
}

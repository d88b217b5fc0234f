//! Display-range estimation in the style of ds9's "zscale".
//!
//! The estimator sorts the valid samples, throws away the brightest and
//! faintest tenth, and fits a straight line to what is left against sample
//! rank. The slope of that line, divided by a contrast factor, sets how far the
//! display limits extend either side of the median.

use ndarray::ArrayView2;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::{ImageError, Result};

/// Contrast used when the caller does not supply one.
pub const DEFAULT_CONTRAST: f64 = 0.25;

/// Fraction of sorted samples discarded at each end before the fit.
const TRIM_FRACTION: f64 = 0.10;

/// Intensity limits for mapping pixel values onto a color scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRange {
    pub low: f64,
    pub high: f64,
}

impl DisplayRange {
    /// Map `value` onto `[0, 1]`, clipping at the limits.
    ///
    /// A degenerate or inverted range maps everything at or above `low` to 1.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.high - self.low;
        if span <= 0.0 {
            return if value >= self.low { 1.0 } else { 0.0 };
        }
        ((value - self.low) / span).clamp(0.0, 1.0)
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }
}

/// Estimate display limits for an image, ignoring NaN pixels.
///
/// # Arguments
/// * `image` - Samples to scale; any numeric element type
/// * `contrast` - Larger values give a narrower range; must be positive
///
/// # Errors
/// `InvalidInput` if `contrast` is not a positive finite number, or if fewer
/// than two samples remain after NaN removal and trimming. Fewer than ten
/// valid samples leave nothing to trim from, which counts as an empty subset.
pub fn zscale<T>(image: &ArrayView2<T>, contrast: f64) -> Result<DisplayRange>
where
    T: ToPrimitive + Copy,
{
    zscale_samples(image.iter().filter_map(|v| v.to_f64()), contrast)
}

/// [`zscale`] over an arbitrary sample sequence.
pub fn zscale_samples<I>(samples: I, contrast: f64) -> Result<DisplayRange>
where
    I: IntoIterator<Item = f64>,
{
    if !contrast.is_finite() || contrast <= 0.0 {
        return Err(ImageError::InvalidInput(format!(
            "zscale contrast must be positive, got {contrast}"
        )));
    }

    let mut samples: Vec<f64> = samples.into_iter().filter(|v| !v.is_nan()).collect();
    samples.sort_by(|a, b| a.total_cmp(b));

    let chop = (TRIM_FRACTION * samples.len() as f64) as usize;
    let subset = if chop == 0 {
        &samples[..0]
    } else {
        &samples[chop..samples.len() - chop]
    };
    if subset.len() < 2 {
        return Err(ImageError::InvalidInput(format!(
            "zscale needs at least 2 samples after trimming, got {} of {}",
            subset.len(),
            samples.len()
        )));
    }

    let midpoint = subset.len() / 2;
    let center = subset[midpoint];
    let slope = fit_slope(subset, midpoint);

    let scale = slope / contrast;
    Ok(DisplayRange {
        low: center + scale * (1.0 - midpoint as f64),
        high: center + scale * (subset.len() as f64 - midpoint as f64),
    })
}

/// Least-squares slope of `values[i]` against `i - origin`.
fn fit_slope(values: &[f64], origin: usize) -> f64 {
    let n = values.len() as f64;
    let xs = || (0..values.len()).map(|i| i as f64 - origin as f64);

    let mean_x = xs().sum::<f64>() / n;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, &y) in xs().zip(values) {
        let dx = x - mean_x;
        cov += dx * (y - mean_y);
        var_x += dx * dx;
    }

    cov / var_x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_linear_ramp() {
        let image = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f64);
        let range = zscale(&image.view(), DEFAULT_CONTRAST).unwrap();

        // 80 samples survive the trim (10..=89), midpoint 40 holds 50.0,
        // slope is exactly one.
        assert_relative_eq!(range.low, 50.0 + 4.0 * (1.0 - 40.0), epsilon = 1e-9);
        assert_relative_eq!(range.high, 50.0 + 4.0 * (80.0 - 40.0), epsilon = 1e-9);
        assert!(range.low <= 10.0);
        assert!(range.high >= 89.0);
    }

    #[test]
    fn test_low_not_above_high_for_random_data() {
        let mut rng = StdRng::seed_from_u64(7);
        for trial in 0..20 {
            let n = 10 + trial * 13;
            let samples: Vec<f64> = (0..n).map(|_| rng.gen_range(-50.0..500.0)).collect();
            let range = zscale_samples(samples, DEFAULT_CONTRAST).unwrap();
            assert!(range.low <= range.high, "trial {trial}: {range:?}");
        }
    }

    #[test]
    fn test_nan_values_are_ignored() {
        let clean = Array2::from_shape_fn((8, 8), |(r, c)| ((r * 7 + c * 3) % 17) as f32);
        let mut dirty = Array2::from_elem((8, 10), f32::NAN);
        for ((r, c), &v) in clean.indexed_iter() {
            // Interleave NaN columns between valid samples.
            let col = if c < 5 { c } else { c + 2 };
            dirty[[r, col]] = v;
        }

        let a = zscale(&clean.view(), DEFAULT_CONTRAST).unwrap();
        let b = zscale(&dirty.view(), DEFAULT_CONTRAST).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_samples() {
        let image = Array2::from_shape_fn((5, 20), |(r, c)| (r * 20 + c) as u16);
        let range = zscale(&image.view(), 0.5).unwrap();
        assert!(range.low < range.high);
    }

    #[test]
    fn test_higher_contrast_narrows_range() {
        let image = Array2::from_shape_fn((10, 10), |(r, c)| ((r * 10 + c) as f64).sqrt());
        let wide = zscale(&image.view(), 0.1).unwrap();
        let narrow = zscale(&image.view(), 1.0).unwrap();
        assert!(narrow.span() < wide.span());
    }

    #[test]
    fn test_constant_image_gives_zero_span() {
        let image = Array2::from_elem((4, 4), 3.0f64);
        let range = zscale(&image.view(), DEFAULT_CONTRAST).unwrap();
        assert_eq!(range.low, 3.0);
        assert_eq!(range.high, 3.0);
    }

    #[test]
    fn test_all_nan_rejected() {
        let image = Array2::from_elem((4, 4), f64::NAN);
        assert!(matches!(
            zscale(&image.view(), DEFAULT_CONTRAST),
            Err(ImageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_too_few_samples_to_trim_rejected() {
        for n in 0..10 {
            assert!(
                matches!(
                    zscale_samples((0..n).map(f64::from), DEFAULT_CONTRAST),
                    Err(ImageError::InvalidInput(_))
                ),
                "{n} samples should be rejected"
            );
        }
        assert!(zscale_samples((0..10).map(f64::from), DEFAULT_CONTRAST).is_ok());

        let small = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f32);
        assert!(zscale(&small.view(), DEFAULT_CONTRAST).is_err());
    }

    #[test]
    fn test_bad_contrast_rejected() {
        let samples: Vec<f64> = (0..20).map(f64::from).collect();
        assert!(zscale_samples(samples.clone(), 0.0).is_err());
        assert!(zscale_samples(samples.clone(), -1.0).is_err());
        assert!(zscale_samples(samples, f64::NAN).is_err());
    }

    #[test]
    fn test_normalize_clips() {
        let range = DisplayRange {
            low: 10.0,
            high: 20.0,
        };
        assert_eq!(range.normalize(5.0), 0.0);
        assert_eq!(range.normalize(15.0), 0.5);
        assert_eq!(range.normalize(25.0), 1.0);

        let flat = DisplayRange {
            low: 3.0,
            high: 3.0,
        };
        assert_eq!(flat.normalize(3.0), 1.0);
        assert_eq!(flat.normalize(2.0), 0.0);
    }
}

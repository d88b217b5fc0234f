//! Footprint-sized crops of an exposure.

use shared::image_proc::{Exposure, Footprint, HeavyFootprint, Image};

use crate::Result;

/// Crop `exposure` to `footprint`, with its box grown by `grow` pixels.
///
/// With `heavy` false this is the rectangular image crop. With `heavy` true
/// only the footprint's own pixels are copied and the rest of the box is NaN.
pub fn extract_cutout(
    footprint: &Footprint,
    exposure: &Exposure,
    heavy: bool,
    grow: usize,
) -> Result<Image> {
    let image = if heavy {
        HeavyFootprint::from_masked_image(footprint, exposure.masked_image())?
            .subimage(f32::NAN, grow)?
    } else {
        let bbox = footprint.bbox().grow(grow)?;
        exposure.masked_image().image().subimage(bbox)?
    };
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VizError;
    use ndarray::Array2;
    use shared::image_proc::{BBox, MaskedImage, Point2I, Span};
    use shared::ImageError;

    fn ramp_exposure() -> Exposure {
        let bbox = BBox::from_coords(10, 20, 29, 34);
        let mut mi = MaskedImage::from_bbox(bbox).unwrap();
        let data = Array2::from_shape_fn(bbox.dim(), |(r, c)| (r * 100 + c) as f32);
        *mi.image_mut() = Image::with_bbox(bbox, data).unwrap();
        Exposure::new(mi)
    }

    /// An L shape: a full row plus one pixel above its left end.
    fn l_footprint() -> Footprint {
        Footprint::from_spans(vec![Span::new(25, 14, 17), Span::new(26, 14, 14)]).unwrap()
    }

    #[test]
    fn test_light_cutout_is_rectangular() {
        let exposure = ramp_exposure();
        let cutout = extract_cutout(&l_footprint(), &exposure, false, 0).unwrap();
        assert_eq!(cutout.bbox(), BBox::from_coords(14, 25, 17, 26));
        // Parent pixel (17, 26) lies outside the L but inside its box.
        assert_eq!(cutout.get(17, 26), exposure.masked_image().image().get(17, 26));
        assert!(cutout.array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_heavy_cutout_masks_outside_pixels() {
        let exposure = ramp_exposure();
        let cutout = extract_cutout(&l_footprint(), &exposure, true, 0).unwrap();
        assert_eq!(cutout.bbox(), BBox::from_coords(14, 25, 17, 26));
        assert!(cutout.get(17, 26).unwrap().is_nan());
        assert_eq!(cutout.get(14, 26), exposure.masked_image().image().get(14, 26));
        assert_eq!(cutout.array().iter().filter(|v| !v.is_nan()).count(), 5);
    }

    #[test]
    fn test_grow_applies_to_both_modes() {
        let exposure = ramp_exposure();
        let fp = Footprint::from_bbox(BBox::from_corner_size(Point2I::new(15, 25), 2, 2)).unwrap();
        for heavy in [false, true] {
            let cutout = extract_cutout(&fp, &exposure, heavy, 2).unwrap();
            assert_eq!(cutout.bbox(), BBox::from_coords(13, 23, 18, 28));
        }
    }

    #[test]
    fn test_footprint_outside_exposure() {
        let exposure = ramp_exposure();
        let fp = Footprint::from_bbox(BBox::from_coords(0, 0, 3, 3)).unwrap();
        assert!(matches!(
            extract_cutout(&fp, &exposure, true, 0),
            Err(VizError::Image(ImageError::OutOfBounds { .. }))
        ));
        assert!(extract_cutout(&fp, &exposure, false, 0).is_err());
    }
}

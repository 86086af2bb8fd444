use rayon::prelude::*;
use superpoint_geometry::{apply_homography, FlatHomography, ImageShape};

use crate::error::AdaptationError;
use crate::heatmap::Heatmap;
use crate::interpolation::{interpolate_value, InterpolationMode};

/// Applies a perspective transformation to a heatmap.
///
/// The homography maps destination pixels to source pixels, i.e.
/// `dst(x, y) = src(m * (x, y))`, which is the convention of the sampled
/// homographies. Destination pixels mapped outside of the source are set to
/// zero and flagged as invalid in the returned mask.
///
/// # Arguments
///
/// * `src` - The input heatmap.
/// * `dst_shape` - The shape of the output heatmap.
/// * `m` - The flattened homography from dst to src.
/// * `interpolation` - The interpolation mode to use.
///
/// # Returns
///
/// The warped heatmap and its validity mask.
///
/// # Example
///
/// ```
/// use superpoint_adaptation::{warp_perspective, Heatmap, InterpolationMode};
/// use superpoint_geometry::ImageShape;
///
/// let src = Heatmap::new(ImageShape::new(1, 3), vec![0.0f32, 1.0, 2.0]).unwrap();
///
/// // shift by one pixel to the right
/// let m = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0];
///
/// let (dst, mask) =
///     warp_perspective(&src, src.shape(), &m, InterpolationMode::Nearest).unwrap();
///
/// assert_eq!(dst.as_slice(), &[1.0, 2.0, 0.0]);
/// assert_eq!(mask.as_slice(), &[true, true, false]);
/// ```
pub fn warp_perspective(
    src: &Heatmap<f32>,
    dst_shape: ImageShape,
    m: &FlatHomography,
    interpolation: InterpolationMode,
) -> Result<(Heatmap<f32>, Heatmap<bool>), AdaptationError> {
    let mut dst = Heatmap::from_size_val(dst_shape, 0.0f32)?;
    let mut mask = Heatmap::from_size_val(dst_shape, false)?;

    let (src_rows, src_cols) = (src.rows() as f64, src.cols() as f64);
    let dst_cols = dst.cols();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols)
        .zip(mask.as_slice_mut().par_chunks_exact_mut(dst_cols))
        .enumerate()
        .for_each(|(y, (dst_row, mask_row))| {
            for (x, (dst_val, mask_val)) in dst_row.iter_mut().zip(mask_row.iter_mut()).enumerate()
            {
                let Some([u, v]) = apply_homography(m, &[x as f64, y as f64]) else {
                    continue;
                };
                // check if the position is within the bounds of the src heatmap
                if u >= 0.0 && u < src_cols && v >= 0.0 && v < src_rows {
                    *dst_val = interpolate_value(src, u as f32, v as f32, interpolation);
                    *mask_val = true;
                }
            }
        });

    Ok((dst, mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use superpoint_geometry::invert_homography;

    const IDENTITY: FlatHomography = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

    #[test]
    fn warp_perspective_identity() -> Result<(), AdaptationError> {
        let src = Heatmap::new(ImageShape::new(4, 5), (0..20).map(|x| x as f32).collect())?;
        let (dst, mask) =
            warp_perspective(&src, src.shape(), &IDENTITY, InterpolationMode::Nearest)?;
        assert_eq!(dst, src);
        assert!(mask.as_slice().iter().all(|&v| v));
        Ok(())
    }

    #[test]
    fn warp_perspective_hflip() -> Result<(), AdaptationError> {
        let src = Heatmap::new(ImageShape::new(3, 2), vec![0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0])?;

        // flip matrix
        let m = [-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let (dst, _) = warp_perspective(&src, src.shape(), &m, InterpolationMode::Nearest)?;

        assert_eq!(dst.as_slice(), &[1.0, 0.0, 3.0, 2.0, 5.0, 4.0]);
        Ok(())
    }

    #[test]
    fn warp_perspective_zoom_roundtrip() -> Result<(), AdaptationError> {
        let shape = ImageShape::new(8, 8);
        let src = Heatmap::new(shape, (0..64).map(|x| x as f32).collect())?;

        // the central half of the image blown up to the full frame
        let h = [0.5, 0.0, 2.0, 0.0, 0.5, 2.0, 0.0, 0.0];
        let (zoomed, mask) = warp_perspective(&src, shape, &h, InterpolationMode::Nearest)?;
        assert!(mask.as_slice().iter().all(|&v| v));

        // only the central half maps back inside the zoomed frame
        let h_inv = invert_homography(&h)?;
        let (back, back_mask) =
            warp_perspective(&zoomed, shape, &h_inv, InterpolationMode::Nearest)?;
        for y in 0..8 {
            for x in 0..8 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                assert_eq!(back_mask.get(x, y), Some(&inside));
                if inside {
                    assert_eq!(back.get(x, y), src.get(x, y));
                }
            }
        }
        Ok(())
    }
}

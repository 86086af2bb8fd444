use serde::{Deserialize, Serialize};

use crate::heatmap::Heatmap;

/// Interpolation mode for the warp operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Bilinear interpolation
    #[default]
    Bilinear,
    /// Nearest neighbor interpolation
    Nearest,
}

/// Interpolate the heatmap value at the sub-pixel position `(u, v)`.
///
/// PRECONDITION: `0 <= u < cols` and `0 <= v < rows`.
pub fn interpolate_value(
    heatmap: &Heatmap<f32>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> f32 {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(heatmap, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(heatmap, u, v),
    }
}

fn bilinear_interpolation(heatmap: &Heatmap<f32>, u: f32, v: f32) -> f32 {
    let (rows, cols) = (heatmap.rows(), heatmap.cols());

    let iu0 = (u.trunc() as usize).min(cols - 1);
    let iv0 = (v.trunc() as usize).min(rows - 1);
    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let frac_u = u.fract();
    let frac_v = v.fract();
    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let data = heatmap.as_slice();
    let p00 = data[iv0 * cols + iu0];
    let p01 = data[iv0 * cols + iu1];
    let p10 = data[iv1 * cols + iu0];
    let p11 = data[iv1 * cols + iu1];

    p00 * frac_uu * frac_vv
        + p01 * frac_u * frac_vv
        + p10 * frac_uu * frac_v
        + p11 * frac_u * frac_v
}

fn nearest_neighbor_interpolation(heatmap: &Heatmap<f32>, u: f32, v: f32) -> f32 {
    let (rows, cols) = (heatmap.rows(), heatmap.cols());

    let iu = (u.round() as usize).min(cols - 1);
    let iv = (v.round() as usize).min(rows - 1);

    heatmap.as_slice()[iv * cols + iu]
}

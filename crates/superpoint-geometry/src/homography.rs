use crate::error::GeometryError;
use crate::linalg::{self, NUM_UNKNOWNS};
use crate::types::{FlatHomography, HomographyMatrix, Point2, Quad};

/// Convert a flattened homography to its 3x3 matrix.
///
/// The 8 parameters fill the matrix in row-major order and the last entry is
/// set to 1.
///
/// # Example
///
/// ```
/// use superpoint_geometry::flatten_to_matrix;
///
/// let m = flatten_to_matrix(&[1.0, 0.0, 5.0, 0.0, 1.0, -3.0, 0.0, 0.0]);
/// assert_eq!(m, [[1.0, 0.0, 5.0], [0.0, 1.0, -3.0], [0.0, 0.0, 1.0]]);
/// ```
pub fn flatten_to_matrix(h: &FlatHomography) -> HomographyMatrix {
    [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], 1.0]]
}

/// Convert a 3x3 homography matrix to its flattened form.
///
/// The matrix is normalized by its last entry, which is then dropped.
///
/// # Errors
///
/// [`GeometryError::DegenerateHomography`] if `m[2][2]` is zero (within
/// `f64::EPSILON`) or not finite.
pub fn matrix_to_flatten(m: &HomographyMatrix) -> Result<FlatHomography, GeometryError> {
    let w = m[2][2];
    if !w.is_finite() || w.abs() <= f64::EPSILON {
        return Err(GeometryError::DegenerateHomography);
    }

    let mut h = [0.0; 8];
    for (i, h_i) in h.iter_mut().enumerate() {
        *h_i = m[i / 3][i % 3] / w;
    }

    Ok(h)
}

/// Compute the inverse of a flattened homography.
///
/// # Errors
///
/// [`GeometryError::DegenerateHomography`] if the matrix is singular or its
/// inverse cannot be normalized.
pub fn invert_homography(h: &FlatHomography) -> Result<FlatHomography, GeometryError> {
    let inv_m = linalg::inverse_mat33(&flatten_to_matrix(h))?;
    matrix_to_flatten(&inv_m)
}

/// Apply a flattened homography to a point.
///
/// Returns `None` when the point is mapped to infinity.
pub fn apply_homography(h: &FlatHomography, p: &Point2) -> Option<Point2> {
    let [x, y, w] = linalg::mat33_mul_vec3(&flatten_to_matrix(h), &[p[0], p[1], 1.0]);
    if w.abs() <= f64::EPSILON {
        return None;
    }
    Some([x / w, y / w])
}

/// Compute the flattened homography mapping `pts1[i]` onto `pts2[i]`.
///
/// Each correspondence `(p, q)` contributes the two equations
///
/// ```text
/// [p.x, p.y, 1, 0, 0, 0, -p.x * q.x, -p.y * q.x] . h = q.x
/// [0, 0, 0, p.x, p.y, 1, -p.x * q.y, -p.y * q.y] . h = q.y
/// ```
///
/// and the resulting 8x8 system is solved in the least-squares sense.
///
/// # Errors
///
/// [`GeometryError::SingularSystem`] when the corners are degenerate, e.g.
/// three of them are collinear.
pub fn homography_from_quads(pts1: &Quad, pts2: &Quad) -> Result<FlatHomography, GeometryError> {
    let mut mat_a = [[0.0; NUM_UNKNOWNS]; 8];
    let mut vec_b = [0.0; 8];

    for (i, (p, q)) in pts1.iter().zip(pts2.iter()).enumerate() {
        mat_a[2 * i] = [p[0], p[1], 1.0, 0.0, 0.0, 0.0, -p[0] * q[0], -p[1] * q[0]];
        mat_a[2 * i + 1] = [0.0, 0.0, 0.0, p[0], p[1], 1.0, -p[0] * q[1], -p[1] * q[1]];
        vec_b[2 * i] = q[0];
        vec_b[2 * i + 1] = q[1];
    }

    linalg::solve_least_squares(&mat_a, &vec_b)
}

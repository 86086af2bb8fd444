use faer::prelude::SpSolverLstsq;
use crate::error::GeometryError;
use crate::types::HomographyMatrix;

/// Number of unknowns of a flattened homography.
pub const NUM_UNKNOWNS: usize = 8;

/// Solve the linear system `A x = b` in the least-squares sense.
///
/// The numerical rank of `A` is checked on its singular values, then the
/// system is solved with a QR decomposition, so over-determined systems return
/// the solution minimizing `||A x - b||`. Rank-deficient systems are rejected
/// instead of returning a minimum-norm solution.
///
/// # Arguments
///
/// * `a` - The coefficient matrix with shape (N, 8), N >= 8.
/// * `b` - The target vector with shape (N,).
///
/// # Errors
///
/// * [`GeometryError::MismatchedLengths`] if `a` and `b` have different lengths.
/// * [`GeometryError::InsufficientEquations`] if N < 8.
/// * [`GeometryError::SingularSystem`] if the numerical rank of `a` is below 8.
///
/// # Example
///
/// ```
/// use superpoint_geometry::linalg::solve_least_squares;
///
/// let mut a = [[0.0; 8]; 8];
/// for (i, row) in a.iter_mut().enumerate() {
///     row[i] = 2.0;
/// }
/// let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0];
/// let x = solve_least_squares(&a, &b).unwrap();
/// assert!((x[3] - 4.0).abs() < 1e-12);
/// ```
pub fn solve_least_squares(
    a: &[[f64; NUM_UNKNOWNS]],
    b: &[f64],
) -> Result<[f64; NUM_UNKNOWNS], GeometryError> {
    if a.len() != b.len() {
        return Err(GeometryError::MismatchedLengths {
            equations: a.len(),
            targets: b.len(),
        });
    }
    if a.len() < NUM_UNKNOWNS {
        return Err(GeometryError::InsufficientEquations {
            required: NUM_UNKNOWNS,
            actual: a.len(),
        });
    }

    let num_rows = a.len();
    let mat_a = faer::Mat::<f64>::from_fn(num_rows, NUM_UNKNOWNS, |i, j| a[i][j]);

    // singular values are sorted in non-increasing order
    let svd = mat_a.svd();
    let s = svd.s_diagonal();
    let tol = s.read(0) * num_rows as f64 * f64::EPSILON;
    let rank = (0..NUM_UNKNOWNS).filter(|&k| s.read(k) > tol).count();
    if rank < NUM_UNKNOWNS {
        return Err(GeometryError::SingularSystem {
            rank,
            required: NUM_UNKNOWNS,
        });
    }

    let mat_b = faer::Mat::<f64>::from_fn(num_rows, 1, |i, _| b[i]);
    let params = mat_a.qr().solve_lstsq(mat_b);
    let col = params.col(0);

    let mut x = [0.0; NUM_UNKNOWNS];
    for (j, x_j) in x.iter_mut().enumerate() {
        *x_j = col[j];
    }

    Ok(x)
}

/// Compute the determinant of a 3x3 matrix.
#[rustfmt::skip]
pub fn det_mat33(m: &HomographyMatrix) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[rustfmt::skip]
fn adjugate_mat33(m: &HomographyMatrix) -> HomographyMatrix {
    [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],
            m[0][2] * m[2][1] - m[0][1] * m[2][2],
            m[0][1] * m[1][2] - m[0][2] * m[1][1],
        ],
        [
            m[1][2] * m[2][0] - m[1][0] * m[2][2],
            m[0][0] * m[2][2] - m[0][2] * m[2][0],
            m[0][2] * m[1][0] - m[0][0] * m[1][2],
        ],
        [
            m[1][0] * m[2][1] - m[1][1] * m[2][0],
            m[0][1] * m[2][0] - m[0][0] * m[2][1],
            m[0][0] * m[1][1] - m[0][1] * m[1][0],
        ],
    ]
}

/// Invert a 3x3 matrix through its adjugate.
///
/// Returns [`GeometryError::DegenerateHomography`] when the determinant is
/// below `1e-12` in absolute value.
pub fn inverse_mat33(m: &HomographyMatrix) -> Result<HomographyMatrix, GeometryError> {
    let det = det_mat33(m);
    if !det.is_finite() || det.abs() < 1e-12 {
        return Err(GeometryError::DegenerateHomography);
    }

    let inv_det = 1.0 / det;
    let mut inv_m = adjugate_mat33(m);
    inv_m
        .iter_mut()
        .flat_map(|row| row.iter_mut())
        .for_each(|v| *v *= inv_det);

    Ok(inv_m)
}

/// Multiply a 3x3 matrix by a 3d vector.
pub fn mat33_mul_vec3(m: &HomographyMatrix, v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (out_i, row) in out.iter_mut().zip(m.iter()) {
        *out_i = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

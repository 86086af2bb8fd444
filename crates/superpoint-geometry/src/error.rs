/// Errors returned by the geometry routines.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeometryError {
    /// An image dimension is zero.
    #[error("Invalid image shape: height {height}, width {width}")]
    InvalidShape {
        /// Height of the image in pixels.
        height: usize,
        /// Width of the image in pixels.
        width: usize,
    },

    /// The linear system does not determine all the unknowns.
    #[error("Singular linear system: rank {rank} is below {required}")]
    SingularSystem {
        /// Numerical rank of the coefficient matrix.
        rank: usize,
        /// Number of unknowns to determine.
        required: usize,
    },

    /// A sampler parameter is outside of its valid range.
    #[error("Invalid sampler parameter {name} = {value}, expected {expected}")]
    InvalidConfig {
        /// Name of the parameter.
        name: &'static str,
        /// Value of the parameter.
        value: f64,
        /// Valid range of the parameter.
        expected: &'static str,
    },

    /// The homography cannot be normalized or inverted.
    #[error("Degenerate homography")]
    DegenerateHomography,

    /// A perturbation stage produced no valid candidate.
    #[error("No valid candidate left in the {stage} stage")]
    SamplingExhausted {
        /// Name of the perturbation stage.
        stage: &'static str,
    },

    /// The equations and the targets have different lengths.
    #[error("Mismatched lengths: {equations} equations and {targets} targets")]
    MismatchedLengths {
        /// Number of rows in the coefficient matrix.
        equations: usize,
        /// Number of target values.
        targets: usize,
    },

    /// The system has fewer equations than unknowns.
    #[error("At least {required} equations are required, got {actual}")]
    InsufficientEquations {
        /// Minimum number of equations.
        required: usize,
        /// Actual number of equations.
        actual: usize,
    },
}

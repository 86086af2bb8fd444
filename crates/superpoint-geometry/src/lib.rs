#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the geometry module.
pub mod error;

/// Flattened homography conversions and inversion.
pub mod homography;

/// Linear algebra utilities.
pub mod linalg;

/// Random draws used by the sampler.
pub mod random;

/// Random homography sampling.
pub mod sampler;

/// Candidate filtering and selection.
pub mod selection;

/// Point, quadrilateral and homography types.
pub mod types;

pub use error::GeometryError;
pub use homography::{
    apply_homography, flatten_to_matrix, homography_from_quads, invert_homography,
    matrix_to_flatten,
};
pub use sampler::{
    sample_homography, sample_homography_with_patch, HomographySample, HomographySampler,
    SamplerConfig,
};
pub use types::{FlatHomography, HomographyMatrix, ImageShape, Point2, Quad};

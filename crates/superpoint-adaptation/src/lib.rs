#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Homography adaptation driver and its collaborators.
pub mod adaptation;

/// Error types for the adaptation module.
pub mod error;

/// Dense single channel maps.
pub mod heatmap;

/// utilities for interpolation.
pub mod interpolation;

/// Perspective warping of heatmaps.
pub mod warp;

pub use adaptation::{
    Accumulator, AdaptationConfig, AdaptationOutput, AdaptationSample, Detector, Fuse,
    HomographyAdaptation,
};
pub use error::AdaptationError;
pub use heatmap::Heatmap;
pub use interpolation::InterpolationMode;
pub use warp::warp_perspective;

use superpoint_geometry::{GeometryError, ImageShape};

/// Errors returned by homography adaptation.
#[derive(thiserror::Error, Debug)]
pub enum AdaptationError {
    /// Error when sampling or inverting a homography.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Error when the data length does not match the heatmap shape.
    #[error("Data length ({0}) does not match the heatmap size ({1})")]
    InvalidHeatmapSize(usize, usize),

    /// Error when two heatmaps are expected to have the same shape.
    #[error("Heatmap shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// The expected shape.
        expected: ImageShape,
        /// The actual shape.
        actual: ImageShape,
    },

    /// Error reported by the detector.
    #[error("Detector failed: {0}")]
    Detector(String),
}

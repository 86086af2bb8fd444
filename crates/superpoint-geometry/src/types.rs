use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A 2d point stored as `[x, y]`.
pub type Point2 = [f64; 2];

/// Four corners ordered as top-left, bottom-left, bottom-right, top-right.
pub type Quad = [Point2; 4];

/// The first 8 entries of a row-major homography matrix whose last entry is 1.
pub type FlatHomography = [f64; 8];

/// A row-major 3x3 homography matrix.
pub type HomographyMatrix = [[f64; 3]; 3];

/// The size of an image in pixels.
///
/// Points are stored as `[x, y]`, so normalized coordinates are rescaled with
/// `x * width` and `y * height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    /// Height of the image in pixels.
    pub height: usize,
    /// Width of the image in pixels.
    pub width: usize,
}

impl ImageShape {
    /// Create a new shape from its height and width.
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Check that both dimensions are positive.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.height == 0 || self.width == 0 {
            return Err(GeometryError::InvalidShape {
                height: self.height,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Map a point from normalized [0, 1) coordinates to pixel coordinates.
    pub fn to_pixels(&self, point: &Point2) -> Point2 {
        [point[0] * self.width as f64, point[1] * self.height as f64]
    }
}

impl std::fmt::Display for ImageShape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageShape {{ height: {}, width: {} }}",
            self.height, self.width
        )
    }
}

/// Build a shape from a `(height, width)` pair.
impl From<(usize, usize)> for ImageShape {
    fn from((height, width): (usize, usize)) -> Self {
        Self { height, width }
    }
}

use superpoint_geometry::ImageShape;

use crate::error::AdaptationError;

/// A dense single channel map stored in row-major order.
///
/// Used for input images, detection probabilities, validity masks and counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap<T> {
    shape: ImageShape,
    data: Vec<T>,
}

impl<T> Heatmap<T> {
    /// Create a new heatmap from its shape and row-major data.
    ///
    /// # Errors
    ///
    /// * [`AdaptationError::Geometry`] if a dimension of the shape is zero.
    /// * [`AdaptationError::InvalidHeatmapSize`] if the data length does not
    ///   match the shape.
    ///
    /// # Example
    ///
    /// ```
    /// use superpoint_adaptation::Heatmap;
    /// use superpoint_geometry::ImageShape;
    ///
    /// let heatmap = Heatmap::new(ImageShape::new(2, 3), vec![0.0f32; 6]).unwrap();
    /// assert_eq!(heatmap.rows(), 2);
    /// assert_eq!(heatmap.cols(), 3);
    /// ```
    pub fn new(shape: ImageShape, data: Vec<T>) -> Result<Self, AdaptationError> {
        shape.validate()?;
        if data.len() != shape.height * shape.width {
            return Err(AdaptationError::InvalidHeatmapSize(
                data.len(),
                shape.height * shape.width,
            ));
        }
        Ok(Self { shape, data })
    }

    /// Create a new heatmap filled with a value.
    pub fn from_size_val(shape: ImageShape, val: T) -> Result<Self, AdaptationError>
    where
        T: Clone,
    {
        Self::new(shape, vec![val; shape.height * shape.width])
    }

    /// The shape of the heatmap.
    pub fn shape(&self) -> ImageShape {
        self.shape
    }

    /// The number of rows, i.e. the height.
    pub fn rows(&self) -> usize {
        self.shape.height
    }

    /// The number of columns, i.e. the width.
    pub fn cols(&self) -> usize {
        self.shape.width
    }

    /// The underlying data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The underlying data, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get the value at column `x` and row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.cols() || y >= self.rows() {
            return None;
        }
        self.data.get(y * self.cols() + x)
    }

    /// Apply a function to every value.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Heatmap<U> {
        Heatmap {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Fail unless `other` has the same shape.
    pub fn check_same_shape<U>(&self, other: &Heatmap<U>) -> Result<(), AdaptationError> {
        if self.shape != other.shape {
            return Err(AdaptationError::ShapeMismatch {
                expected: self.shape,
                actual: other.shape,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heatmap_new_checks_length() {
        let shape = ImageShape::new(2, 2);
        assert!(Heatmap::new(shape, vec![0u8; 4]).is_ok());
        assert!(matches!(
            Heatmap::new(shape, vec![0u8; 3]),
            Err(AdaptationError::InvalidHeatmapSize(3, 4))
        ));
        assert!(matches!(
            Heatmap::new(ImageShape::new(0, 2), Vec::<u8>::new()),
            Err(AdaptationError::Geometry(_))
        ));
    }

    #[test]
    fn heatmap_get_and_map() -> Result<(), AdaptationError> {
        let heatmap = Heatmap::new(ImageShape::new(2, 3), (0..6).collect::<Vec<u32>>())?;
        assert_eq!(heatmap.get(2, 1), Some(&5));
        assert_eq!(heatmap.get(3, 0), None);

        let doubled = heatmap.map(|v| v * 2);
        assert_eq!(doubled.as_slice(), &[0, 2, 4, 6, 8, 10]);
        assert_eq!(doubled.shape(), heatmap.shape());
        Ok(())
    }

    #[test]
    fn heatmap_shape_mismatch() -> Result<(), AdaptationError> {
        let a = Heatmap::from_size_val(ImageShape::new(2, 3), 0.0f32)?;
        let b = Heatmap::from_size_val(ImageShape::new(3, 2), false)?;
        assert!(a.check_same_shape(&a).is_ok());
        assert!(matches!(
            a.check_same_shape(&b),
            Err(AdaptationError::ShapeMismatch { .. })
        ));
        Ok(())
    }
}

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::homography::homography_from_quads;
use crate::random::truncated_normal;
use crate::selection::{quad_in_unit_square, select_valid};
use crate::types::{FlatHomography, ImageShape, Point2, Quad};

/// Corners of the output image in normalized coordinates.
pub const UNIT_SQUARE: Quad = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

/// Initial corners of the input patch: a half-size centered crop.
pub const CENTERED_HALF_SQUARE: Quad = [[0.25, 0.25], [0.25, 0.75], [0.75, 0.75], [0.75, 0.25]];

/// Parameters of the random homography sampler.
///
/// The patch starts as [`CENTERED_HALF_SQUARE`] and each enabled stage moves
/// its corners in the order perspective, scaling, rotation, translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Add truncated normal noise to each corner coordinate of the patch.
    pub perspective: bool,
    /// Scale the patch about its centroid by a random factor.
    pub scaling: bool,
    /// Rotate the patch about its centroid by a random angle.
    pub rotation: bool,
    /// Translate the patch by a random offset within the image.
    pub translation: bool,
    /// Number of random scales drawn before filtering the ones leaving the image.
    pub n_scales: usize,
    /// Number of evenly spaced angles tried before filtering the ones leaving the image.
    pub n_angles: usize,
    /// Standard deviation of the corner noise of the perspective stage.
    pub perspective_amplitude: f64,
    /// Standard deviation of the scale factors around 1.
    pub scaling_amplitude: f64,
    /// Keep the unchanged patch as a candidate of the scaling and rotation stages.
    ///
    /// When disabled, a stage without any valid candidate fails with
    /// [`GeometryError::SamplingExhausted`].
    pub identity_fallback: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            perspective: true,
            scaling: true,
            rotation: true,
            translation: true,
            n_scales: 10,
            n_angles: 10,
            perspective_amplitude: 0.25 / 2.0,
            scaling_amplitude: 0.75 / 2.0,
            identity_fallback: true,
        }
    }
}

impl SamplerConfig {
    /// Largest perspective amplitude keeping the jittered patch inside the image.
    ///
    /// The corners of [`CENTERED_HALF_SQUARE`] are 0.25 away from the borders
    /// and the jitter is truncated at twice the amplitude.
    pub const MAX_PERSPECTIVE_AMPLITUDE: f64 = 0.125;

    /// Bound on the scaling amplitude keeping every scale factor positive.
    pub const MAX_SCALING_AMPLITUDE: f64 = 0.5;

    /// Check that the amplitudes of the configuration are in range.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidConfig`] if `perspective_amplitude` is outside
    /// `[0, 0.125]` or `scaling_amplitude` is outside `[0, 0.5)`.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(0.0..=Self::MAX_PERSPECTIVE_AMPLITUDE).contains(&self.perspective_amplitude) {
            return Err(GeometryError::InvalidConfig {
                name: "perspective_amplitude",
                value: self.perspective_amplitude,
                expected: "[0, 0.125]",
            });
        }
        if !(0.0..Self::MAX_SCALING_AMPLITUDE).contains(&self.scaling_amplitude) {
            return Err(GeometryError::InvalidConfig {
                name: "scaling_amplitude",
                value: self.scaling_amplitude,
                expected: "[0, 0.5)",
            });
        }
        Ok(())
    }

    /// A configuration with every perturbation stage disabled.
    pub fn identity() -> Self {
        Self {
            perspective: false,
            scaling: false,
            rotation: false,
            translation: false,
            ..Default::default()
        }
    }
}

/// A sampled homography together with the patch it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomographySample {
    /// Flattened homography mapping the image corners to the patch corners.
    pub homography: FlatHomography,
    /// Corners of the patch in pixel coordinates.
    pub patch: Quad,
}

/// A reusable homography sampler.
///
/// # Example
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use superpoint_geometry::{HomographySampler, ImageShape, SamplerConfig};
///
/// let sampler = HomographySampler::new(SamplerConfig::default());
/// let mut rng = StdRng::seed_from_u64(0);
/// let h = sampler.sample(ImageShape::new(480, 640), &mut rng).unwrap();
/// assert_eq!(h.len(), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HomographySampler {
    config: SamplerConfig,
}

impl HomographySampler {
    /// Create a new sampler from its configuration.
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// The sampler configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample a homography for an image of the given shape.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        shape: ImageShape,
        rng: &mut R,
    ) -> Result<FlatHomography, GeometryError> {
        sample_homography(shape, &self.config, rng)
    }

    /// Sample a homography and return the patch it maps the image onto.
    pub fn sample_with_patch<R: Rng + ?Sized>(
        &self,
        shape: ImageShape,
        rng: &mut R,
    ) -> Result<HomographySample, GeometryError> {
        sample_homography_with_patch(shape, &self.config, rng)
    }
}

/// Sample a random valid homography.
///
/// Computes the homography between a random patch of the image and the full
/// image frame. The homography maps output points (full frame) to input points
/// (patch), which is the convention of inverse-mapped image warps.
///
/// # Arguments
///
/// * `shape` - The image size, `(height, width)` pairs are accepted.
/// * `config` - The enabled perturbation stages and their parameters.
/// * `rng` - The random source, only consumed by enabled stages.
///
/// # Errors
///
/// * [`GeometryError::InvalidShape`] if a dimension of `shape` is zero.
/// * [`GeometryError::InvalidConfig`] if an amplitude of `config` is out of range.
/// * [`GeometryError::SamplingExhausted`] if a stage has no valid candidate,
///   only possible with `identity_fallback` disabled.
pub fn sample_homography<R: Rng + ?Sized>(
    shape: impl Into<ImageShape>,
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<FlatHomography, GeometryError> {
    Ok(sample_homography_with_patch(shape, config, rng)?.homography)
}

/// Same as [`sample_homography`] but also returns the sampled patch corners.
pub fn sample_homography_with_patch<R: Rng + ?Sized>(
    shape: impl Into<ImageShape>,
    config: &SamplerConfig,
    rng: &mut R,
) -> Result<HomographySample, GeometryError> {
    let shape = shape.into();
    shape.validate()?;
    config.validate()?;

    let mut pts2 = CENTERED_HALF_SQUARE;

    if config.perspective {
        for v in pts2.iter_mut().flatten() {
            *v += truncated_normal(rng, 0.0, config.perspective_amplitude);
        }
    }

    // sample several scales, check collision with borders, randomly pick a valid one
    if config.scaling {
        let center = centroid(&pts2);
        let mut candidates = Vec::with_capacity(config.n_scales + 1);
        if config.identity_fallback {
            candidates.push(pts2);
        }
        for _ in 0..config.n_scales {
            let scale = truncated_normal(rng, 1.0, config.scaling_amplitude);
            candidates.push(pts2.map(|p| scale_about(&p, &center, scale)));
        }
        pts2 = pick_candidate("scaling", &candidates, rng)?;
    }

    // the first candidate angle is zero and keeps the patch unchanged
    if config.rotation {
        let center = centroid(&pts2);
        let n_angles = config.n_angles.max(1);
        let mut candidates = Vec::with_capacity(n_angles);
        if config.identity_fallback {
            candidates.push(pts2);
        }
        for i in 1..n_angles {
            let angle = 2.0 * PI * i as f64 / n_angles as f64;
            candidates.push(pts2.map(|p| rotate_about(&p, &center, angle)));
        }
        pts2 = pick_candidate("rotation", &candidates, rng)?;
    }

    if config.translation {
        let offset = [0, 1].map(|axis| {
            let (min, max) = pts2.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
                (lo.min(p[axis]), hi.max(p[axis]))
            });
            let (t_min, t_max) = (-min, 1.0 - max);
            if t_min < t_max {
                rng.random_range(t_min..t_max)
            } else {
                0.0
            }
        });
        for p in pts2.iter_mut() {
            p[0] += offset[0];
            p[1] += offset[1];
        }
    }

    // rescale to the actual image size
    let pts1 = UNIT_SQUARE.map(|p| shape.to_pixels(&p));
    let pts2 = pts2.map(|p| shape.to_pixels(&p));

    let homography = homography_from_quads(&pts1, &pts2)?;

    Ok(HomographySample {
        homography,
        patch: pts2,
    })
}

fn pick_candidate<R: Rng + ?Sized>(
    stage: &'static str,
    candidates: &[Quad],
    rng: &mut R,
) -> Result<Quad, GeometryError> {
    let idx = select_valid(candidates, quad_in_unit_square, rng)
        .ok_or(GeometryError::SamplingExhausted { stage })?;
    log::debug!("{stage}: picked candidate {idx} of {}", candidates.len());
    Ok(candidates[idx])
}

fn centroid(quad: &Quad) -> Point2 {
    let (sx, sy) = quad
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / 4.0, sy / 4.0]
}

fn scale_about(p: &Point2, center: &Point2, scale: f64) -> Point2 {
    [
        (p[0] - center[0]) * scale + center[0],
        (p[1] - center[1]) * scale + center[1],
    ]
}

fn rotate_about(p: &Point2, center: &Point2, angle: f64) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    let (dx, dy) = (p[0] - center[0], p[1] - center[1]);
    [
        cos * dx - sin * dy + center[0],
        sin * dx + cos * dy + center[1],
    ]
}

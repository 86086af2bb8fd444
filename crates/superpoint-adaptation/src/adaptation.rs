use rand::Rng;
use serde::{Deserialize, Serialize};
use superpoint_geometry::{invert_homography, FlatHomography, HomographySampler, SamplerConfig};

use crate::error::AdaptationError;
use crate::heatmap::Heatmap;
use crate::interpolation::InterpolationMode;
use crate::warp::warp_perspective;

/// Parameters of homography adaptation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    /// Total number of predictions, the unwarped image included.
    pub num: usize,
    /// Probability above which a pixel is predicted as an interest point.
    pub detection_threshold: f32,
    /// Interpolation used to warp the image and unwarp the predictions.
    pub interpolation: InterpolationMode,
    /// Parameters of the homography sampler.
    pub sampler: SamplerConfig,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            num: 1,
            detection_threshold: 0.015,
            interpolation: InterpolationMode::Bilinear,
            sampler: SamplerConfig::default(),
        }
    }
}

/// Network inference producing interest point probabilities.
pub trait Detector {
    /// Compute the probability map of an image, with the shape of the image.
    fn detect(&self, image: &Heatmap<f32>) -> Result<Heatmap<f32>, AdaptationError>;
}

/// The probabilities accumulated over the predictions and the number of
/// predictions contributing to each pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulator {
    /// Sum of the fused probabilities.
    pub prob: Heatmap<f32>,
    /// Number of predictions fused per pixel.
    pub counts: Heatmap<u32>,
}

/// A single prediction on a warped view, brought back to the image frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptationSample {
    /// Index of the sampled homography, starting at 1.
    pub index: usize,
    /// Homography from the image frame to the warped patch.
    pub homography: FlatHomography,
    /// Probabilities of the warped view unwarped to the image frame.
    pub prob: Heatmap<f32>,
    /// Pixels of the image frame covered by the warped view.
    pub mask: Heatmap<bool>,
}

/// Fusion rule combining a new prediction with the accumulated ones.
///
/// No rule is provided: callers decide how the unwarped predictions and their
/// masks update the probabilities and the counts.
pub trait Fuse {
    /// Fuse `sample` into `accumulated` and return the updated accumulator.
    fn fuse(&self, accumulated: Accumulator, sample: AdaptationSample) -> Accumulator;
}

/// The result of homography adaptation.
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptationOutput {
    /// Accumulated probabilities divided by the counts.
    pub prob: Heatmap<f32>,
    /// Pixels whose probability reaches the detection threshold.
    pub pred: Heatmap<bool>,
}

/// Inference over multiple randomly warped views of the same image.
///
/// # Example
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use superpoint_adaptation::{
///     Accumulator, AdaptationConfig, AdaptationError, AdaptationSample, Detector, Fuse,
///     Heatmap, HomographyAdaptation,
/// };
/// use superpoint_geometry::ImageShape;
///
/// struct Identity;
///
/// impl Detector for Identity {
///     fn detect(&self, image: &Heatmap<f32>) -> Result<Heatmap<f32>, AdaptationError> {
///         Ok(image.clone())
///     }
/// }
///
/// struct Keep;
///
/// impl Fuse for Keep {
///     fn fuse(&self, accumulated: Accumulator, _sample: AdaptationSample) -> Accumulator {
///         accumulated
///     }
/// }
///
/// let image = Heatmap::from_size_val(ImageShape::new(16, 16), 0.5f32).unwrap();
/// let adaptation = HomographyAdaptation::new(AdaptationConfig {
///     num: 4,
///     ..Default::default()
/// });
/// let mut rng = StdRng::seed_from_u64(0);
/// let output = adaptation.run(&image, &Identity, &Keep, &mut rng).unwrap();
/// assert_eq!(output.prob, image);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HomographyAdaptation {
    config: AdaptationConfig,
    sampler: HomographySampler,
}

impl HomographyAdaptation {
    /// Create a new homography adaptation from its configuration.
    pub fn new(config: AdaptationConfig) -> Self {
        let sampler = HomographySampler::new(config.sampler.clone());
        Self { config, sampler }
    }

    /// The adaptation configuration.
    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    /// Run the detector on the image and on `num - 1` warped views of it.
    ///
    /// For every view a homography `H` is sampled, the image is warped with
    /// `H`, the detector runs on the warped image and its probabilities are
    /// warped back with the inverse of `H` before being handed to `fuser`.
    ///
    /// # Errors
    ///
    /// Sampling, inversion and detector failures abort the run and are
    /// returned as they are; no view is retried.
    pub fn run<D, F, R>(
        &self,
        image: &Heatmap<f32>,
        detector: &D,
        fuser: &F,
        rng: &mut R,
    ) -> Result<AdaptationOutput, AdaptationError>
    where
        D: Detector + ?Sized,
        F: Fuse + ?Sized,
        R: Rng + ?Sized,
    {
        let shape = image.shape();
        let interpolation = self.config.interpolation;

        let prob = detector.detect(image)?;
        image.check_same_shape(&prob)?;

        let mut accumulated = Accumulator {
            counts: Heatmap::from_size_val(shape, 1u32)?,
            prob,
        };

        for index in 1..self.config.num {
            let homography = self.sampler.sample(shape, rng)?;
            log::debug!("homography adaptation {index}/{}: {homography:?}", self.config.num);

            let (warped, _) = warp_perspective(image, shape, &homography, interpolation)?;
            let warped_prob = detector.detect(&warped)?;
            warped.check_same_shape(&warped_prob)?;

            let homography_inv = invert_homography(&homography)?;
            let (prob, mask) =
                warp_perspective(&warped_prob, shape, &homography_inv, interpolation)?;

            accumulated = fuser.fuse(
                accumulated,
                AdaptationSample {
                    index,
                    homography,
                    prob,
                    mask,
                },
            );
            image.check_same_shape(&accumulated.prob)?;
            image.check_same_shape(&accumulated.counts)?;
        }

        let normalized = accumulated
            .prob
            .as_slice()
            .iter()
            .zip(accumulated.counts.as_slice())
            .map(|(&p, &c)| if c > 0 { p / c as f32 } else { 0.0 })
            .collect::<Vec<f32>>();
        let prob = Heatmap::new(shape, normalized)?;

        let threshold = self.config.detection_threshold;
        let pred = prob.map(|&p| p >= threshold);

        Ok(AdaptationOutput { prob, pred })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::cell::Cell;
    use superpoint_geometry::ImageShape;

    struct IdentityDetector;

    impl Detector for IdentityDetector {
        fn detect(&self, image: &Heatmap<f32>) -> Result<Heatmap<f32>, AdaptationError> {
            Ok(image.clone())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&self, _image: &Heatmap<f32>) -> Result<Heatmap<f32>, AdaptationError> {
            Err(AdaptationError::Detector("no weights loaded".to_string()))
        }
    }

    // adds every valid unwarped probability and counts it once
    #[derive(Default)]
    struct SumFuser {
        calls: Cell<usize>,
    }

    impl Fuse for SumFuser {
        fn fuse(&self, mut accumulated: Accumulator, sample: AdaptationSample) -> Accumulator {
            self.calls.set(self.calls.get() + 1);
            let values = sample.prob.as_slice().iter().zip(sample.mask.as_slice());
            let targets = accumulated
                .prob
                .as_slice_mut()
                .iter_mut()
                .zip(accumulated.counts.as_slice_mut().iter_mut());
            for ((p, c), (&v, &valid)) in targets.zip(values) {
                if valid {
                    *p += v;
                    *c += 1;
                }
            }
            accumulated
        }
    }

    #[test]
    fn single_prediction_is_thresholded() -> Result<(), AdaptationError> {
        let shape = ImageShape::new(2, 2);
        let image = Heatmap::new(shape, vec![0.0, 0.01, 0.015, 0.9])?;
        let fuser = SumFuser::default();
        let mut rng = StdRng::seed_from_u64(0);

        let output =
            HomographyAdaptation::default().run(&image, &IdentityDetector, &fuser, &mut rng)?;

        assert_eq!(output.prob, image);
        assert_eq!(output.pred.as_slice(), &[false, false, true, true]);
        assert_eq!(fuser.calls.get(), 0);
        Ok(())
    }

    #[test]
    fn constant_image_is_preserved() -> Result<(), AdaptationError> {
        let image = Heatmap::from_size_val(ImageShape::new(24, 32), 0.5f32)?;
        let fuser = SumFuser::default();
        // without perspective jitter the patch stays convex and covers whole pixels
        let adaptation = HomographyAdaptation::new(AdaptationConfig {
            num: 6,
            sampler: SamplerConfig {
                perspective: false,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(11);

        let output = adaptation.run(&image, &IdentityDetector, &fuser, &mut rng)?;

        assert_eq!(fuser.calls.get(), 5);
        for &p in output.prob.as_slice() {
            assert_relative_eq!(p, 0.5, epsilon = 1e-5);
        }
        assert!(output.pred.as_slice().iter().all(|&v| v));
        Ok(())
    }

    #[test]
    fn detector_error_is_propagated() {
        let image = Heatmap::from_size_val(ImageShape::new(4, 4), 0.0f32).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = HomographyAdaptation::default().run(
            &image,
            &FailingDetector,
            &SumFuser::default(),
            &mut rng,
        );
        assert!(matches!(result, Err(AdaptationError::Detector(_))));
    }

    #[test]
    fn sampler_error_is_propagated() {
        let image = Heatmap::from_size_val(ImageShape::new(4, 4), 0.0f32).unwrap();
        let adaptation = HomographyAdaptation::new(AdaptationConfig {
            num: 2,
            sampler: SamplerConfig {
                scaling: true,
                n_scales: 0,
                identity_fallback: false,
                ..SamplerConfig::identity()
            },
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        let result = adaptation.run(&image, &IdentityDetector, &SumFuser::default(), &mut rng);
        assert!(matches!(result, Err(AdaptationError::Geometry(_))));
    }

    #[test]
    fn config_from_json() -> Result<(), serde_json::Error> {
        let config: AdaptationConfig = serde_json::from_str(
            r#"{"num": 100, "interpolation": "nearest", "sampler": {"rotation": false}}"#,
        )?;
        assert_eq!(config.num, 100);
        assert_eq!(config.interpolation, InterpolationMode::Nearest);
        assert!(!config.sampler.rotation);
        assert_relative_eq!(config.detection_threshold, 0.015);

        let adaptation = HomographyAdaptation::new(config.clone());
        assert_eq!(adaptation.config(), &config);
        assert_eq!(adaptation.sampler.config(), &config.sampler);
        Ok(())
    }

    #[test]
    fn invalid_sampler_config_is_rejected() {
        let image = Heatmap::from_size_val(ImageShape::new(4, 4), 0.0f32).unwrap();
        let adaptation = HomographyAdaptation::new(AdaptationConfig {
            num: 2,
            sampler: SamplerConfig {
                perspective_amplitude: 0.3,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(0);
        let result = adaptation.run(&image, &IdentityDetector, &SumFuser::default(), &mut rng);
        assert!(matches!(
            result,
            Err(AdaptationError::Geometry(
                superpoint_geometry::GeometryError::InvalidConfig {
                    name: "perspective_amplitude",
                    ..
                }
            ))
        ));
    }
}

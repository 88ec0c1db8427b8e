//! Synthetic noise transforms applied when a patch is read.

use mbes_core::Point3;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::{DatasetConfig, NoiseTransformKind};
use crate::error::{DenoiseError, Result};

use super::PatchSample;

/// Closed range of noise standard deviations, `0 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseRange {
    min: f32,
    max: f32,
}

impl NoiseRange {
    /// Create a validated range.
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(DenoiseError::config(format!(
                "noise range [{}, {}] must be finite and non-negative",
                min, max
            )));
        }
        if min > max {
            return Err(DenoiseError::config(format!(
                "noise_std_min ({}) exceeds noise_std_max ({})",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Draw one standard deviation uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Noise transform, one variant per [`NoiseTransformKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseTransform {
    /// Leave the sample untouched.
    Identity,
    /// `noisy = clean + N(0, σ²)`.
    AddNoiseToClean(NoiseRange),
    /// `noisy = noisy + N(0, σ²)`.
    AddNoiseToNoisy(NoiseRange),
}

impl NoiseTransform {
    /// Build a transform, validating the range for the noise variants.
    pub fn new(kind: NoiseTransformKind, noise_std_min: f32, noise_std_max: f32) -> Result<Self> {
        match kind {
            NoiseTransformKind::None => Ok(NoiseTransform::Identity),
            NoiseTransformKind::AddNoiseToClean => Ok(NoiseTransform::AddNoiseToClean(
                NoiseRange::new(noise_std_min, noise_std_max)?,
            )),
            NoiseTransformKind::AddNoiseToNoisy => Ok(NoiseTransform::AddNoiseToNoisy(
                NoiseRange::new(noise_std_min, noise_std_max)?,
            )),
        }
    }

    /// Build the transform described by a dataset configuration.
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        Self::new(config.transform, config.noise_min, config.noise_max)
    }

    /// Build a transform from its configuration name.
    pub fn from_name(name: &str, noise_std_min: f32, noise_std_max: f32) -> Result<Self> {
        Self::new(name.parse()?, noise_std_min, noise_std_max)
    }

    /// The kind this transform was built from.
    pub fn kind(&self) -> NoiseTransformKind {
        match self {
            NoiseTransform::Identity => NoiseTransformKind::None,
            NoiseTransform::AddNoiseToClean(_) => NoiseTransformKind::AddNoiseToClean,
            NoiseTransform::AddNoiseToNoisy(_) => NoiseTransformKind::AddNoiseToNoisy,
        }
    }

    /// Apply the transform, returning a new sample.
    ///
    /// One σ is drawn per call and shared by every coordinate of every point.
    pub fn apply<R: Rng + ?Sized>(&self, sample: &PatchSample, rng: &mut R) -> PatchSample {
        match self {
            NoiseTransform::Identity => sample.clone(),
            NoiseTransform::AddNoiseToClean(range) => {
                let std = range.sample(rng);
                PatchSample {
                    pcl_clean: sample.pcl_clean.clone(),
                    pcl_noisy: add_gaussian_noise(&sample.pcl_clean, std, rng),
                    pcl_noisy_mean: sample.pcl_noisy_mean,
                }
            }
            NoiseTransform::AddNoiseToNoisy(range) => {
                let std = range.sample(rng);
                PatchSample {
                    pcl_clean: sample.pcl_clean.clone(),
                    pcl_noisy: add_gaussian_noise(&sample.pcl_noisy, std, rng),
                    pcl_noisy_mean: sample.pcl_noisy_mean,
                }
            }
        }
    }
}

/// Add i.i.d. `N(0, std²)` noise to every coordinate.
pub fn add_gaussian_noise<R: Rng + ?Sized>(points: &[Point3], std: f32, rng: &mut R) -> Vec<Point3> {
    points
        .iter()
        .map(|p| {
            let dx: f32 = rng.sample(StandardNormal);
            let dy: f32 = rng.sample(StandardNormal);
            let dz: f32 = rng.sample(StandardNormal);
            *p + Point3::new(dx, dy, dz) * std
        })
        .collect()
}

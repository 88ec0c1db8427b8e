//! Iterative Langevin-style denoising.

use burn::prelude::*;
use mbes_core::Point3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::config::LangevinConfig;
use crate::data::{points_to_tensor, tensor_to_points};
use crate::error::{DenoiseError, Result};

use super::StepSchedule;

/// A function predicting one displacement per point.
///
/// Input and output are `[num_points, 3]`.
pub trait DisplacementModel<B: Backend> {
    /// Predict the displacement towards the clean surface for every point.
    fn displacement(&self, points: Tensor<B, 2>) -> Tensor<B, 2>;
}

impl<B, F> DisplacementModel<B> for F
where
    B: Backend,
    F: Fn(Tensor<B, 2>) -> Tensor<B, 2>,
{
    fn displacement(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        self(points)
    }
}

/// Optional stochastic term `scale * sqrt(2 η_t) * z`, `z ~ N(0, I)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LangevinNoise {
    /// Multiplier on the Langevin noise.
    pub scale: f32,
    /// Seed for the noise stream; each call to `denoise` restarts it.
    pub seed: u64,
}

/// Refines a noisy cloud by repeatedly stepping along the predicted displacement.
///
/// `x_{t+1} = x_t + η_t * model(x_t)` for exactly `T` steps, where `T` is the
/// schedule length. No early exit, no clamping: non-finite model output
/// propagates into the result.
#[derive(Debug, Clone)]
pub struct LangevinDenoiser {
    schedule: StepSchedule,
    noise: Option<LangevinNoise>,
}

impl LangevinDenoiser {
    /// Deterministic denoiser over a schedule.
    pub fn new(schedule: StepSchedule) -> Self {
        Self {
            schedule,
            noise: None,
        }
    }

    /// Enable the stochastic term.
    pub fn with_noise(mut self, scale: f32, seed: u64) -> Self {
        self.noise = Some(LangevinNoise { scale, seed });
        self
    }

    /// Build from configuration, validating it first.
    pub fn from_config(config: &LangevinConfig) -> Result<Self> {
        config.validate().map_err(DenoiseError::config)?;
        let denoiser = Self::new(StepSchedule::from_config(config)?);
        Ok(if config.ld_noise {
            denoiser.with_noise(config.ld_noise_scale, config.ld_seed)
        } else {
            denoiser
        })
    }

    /// Step-size schedule.
    pub fn schedule(&self) -> &StepSchedule {
        &self.schedule
    }

    /// Stochastic term, if enabled.
    pub fn noise(&self) -> Option<LangevinNoise> {
        self.noise
    }

    /// Number of updates applied per call.
    pub fn num_steps(&self) -> usize {
        self.schedule.len()
    }

    /// Denoise a `[num_points, 3]` cloud.
    ///
    /// The output has the same shape and point order as the input. An empty
    /// cloud is returned unchanged without calling the model.
    pub fn denoise<B, M>(&self, model: &M, pcl_noisy: Tensor<B, 2>) -> Result<Tensor<B, 2>>
    where
        B: Backend,
        M: DisplacementModel<B> + ?Sized,
    {
        let dims = pcl_noisy.dims();
        if dims[1] != 3 {
            return Err(DenoiseError::ShapeMismatch {
                expected: vec![dims[0], 3],
                got: dims.to_vec(),
            });
        }
        if dims[0] == 0 {
            return Ok(pcl_noisy);
        }

        let device = pcl_noisy.device();
        let mut rng = self.noise.map(|n| ChaCha8Rng::seed_from_u64(n.seed));
        let mut x = pcl_noisy;

        for (t, &eta) in self.schedule.steps().iter().enumerate() {
            let d = model.displacement(x.clone());
            if d.dims() != dims {
                return Err(DenoiseError::ShapeMismatch {
                    expected: dims.to_vec(),
                    got: d.dims().to_vec(),
                });
            }
            x = x + d * eta;

            if let (Some(noise), Some(rng)) = (self.noise, rng.as_mut()) {
                let sigma = noise.scale * (2.0 * eta).sqrt();
                x = x + standard_normal::<B, _>(dims, rng, &device) * sigma;
            }
            log::trace!("Langevin step {} | eta {:.5}", t, eta);
        }

        Ok(x)
    }

    /// Denoise a point slice.
    pub fn denoise_points<B, M>(
        &self,
        model: &M,
        points: &[Point3],
        device: &B::Device,
    ) -> Result<Vec<Point3>>
    where
        B: Backend,
        M: DisplacementModel<B> + ?Sized,
    {
        let x = self.denoise(model, points_to_tensor::<B>(points, device))?;
        tensor_to_points(x)
    }
}

fn standard_normal<B: Backend, R: Rng>(
    dims: [usize; 2],
    rng: &mut R,
    device: &B::Device,
) -> Tensor<B, 2> {
    let data: Vec<f32> = (0..dims[0] * dims[1])
        .map(|_| rng.sample::<f32, _>(StandardNormal))
        .collect();
    Tensor::from_data(TensorData::new(data, dims), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn cloud(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2> {
        Tensor::from_data(
            [[0.0f32, 0.0, 1.0], [1.0, 0.0, 1.2], [0.0, 1.0, 0.9], [1.0, 1.0, 1.1]],
            device,
        )
    }

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.to_data().to_vec().unwrap()
    }

    #[test]
    fn test_zero_steps_returns_input() {
        let device = Default::default();
        let denoiser = LangevinDenoiser::new(StepSchedule::geometric(0.5, 0.5, 0).unwrap());
        let model = |x: Tensor<TestBackend, 2>| x.ones_like();

        let out = denoiser.denoise(&model, cloud(&device)).unwrap();
        assert_eq!(values(out), values(cloud(&device)));
    }

    #[test]
    fn test_constant_displacement_accumulates_schedule() {
        let device = Default::default();
        let denoiser = LangevinDenoiser::new(StepSchedule::explicit(vec![0.5, 0.25]).unwrap());
        let model = |x: Tensor<TestBackend, 2>| x.ones_like();

        let out = values(denoiser.denoise(&model, cloud(&device)).unwrap());
        let expected: Vec<f32> = values(cloud(&device)).iter().map(|v| v + 0.75).collect();
        for (a, b) in out.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_noise_is_reproducible_under_seed() {
        let device = Default::default();
        let model = |x: Tensor<TestBackend, 2>| x.zeros_like();
        let denoiser = LangevinDenoiser::new(StepSchedule::geometric(0.5, 0.9, 3).unwrap())
            .with_noise(0.1, 42);

        let a = values(denoiser.denoise(&model, cloud(&device)).unwrap());
        let b = values(denoiser.denoise(&model, cloud(&device)).unwrap());

        assert_eq!(a, b);
        assert_ne!(a, values(cloud(&device)));
    }

    #[test]
    fn test_nan_displacement_propagates() {
        let device = Default::default();
        let model = |x: Tensor<TestBackend, 2>| x.zeros_like() + f32::NAN;
        let denoiser = LangevinDenoiser::new(StepSchedule::geometric(0.5, 0.5, 1).unwrap());

        let out = values(denoiser.denoise(&model, cloud(&device)).unwrap());
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_bad_model_output_shape_is_reported() {
        let device = Default::default();
        let model = |_x: Tensor<TestBackend, 2>| Tensor::<TestBackend, 2>::zeros([2, 3], &Default::default());
        let denoiser = LangevinDenoiser::new(StepSchedule::geometric(0.5, 0.5, 1).unwrap());

        let err = denoiser.denoise(&model, cloud(&device)).unwrap_err();
        assert!(matches!(err, DenoiseError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_empty_cloud_is_returned_unchanged() {
        let device = Default::default();
        let denoiser = LangevinDenoiser::new(StepSchedule::geometric(0.5, 0.5, 3).unwrap())
            .with_noise(0.1, 7);
        let net = crate::config::DenoiseNetConfig::new()
            .with_encoder_dims(vec![16])
            .with_point_feature_dim(16)
            .with_decoder_dims(vec![32])
            .init::<TestBackend>(&device);

        let empty = Tensor::<TestBackend, 2>::empty([0, 3], &device);
        assert_eq!(denoiser.denoise(&net, empty).unwrap().dims(), [0, 3]);

        let points = denoiser
            .denoise_points::<TestBackend, _>(&net, &[], &device)
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_from_config_respects_noise_toggle() {
        let config = LangevinConfig::new().with_ld_num_steps(3);
        let denoiser = LangevinDenoiser::from_config(&config).unwrap();
        assert_eq!(denoiser.num_steps(), 3);
        assert!(denoiser.noise().is_none());

        let denoiser = LangevinDenoiser::from_config(&config.with_ld_noise(true)).unwrap();
        assert_eq!(denoiser.noise().map(|n| n.seed), Some(2024));
    }
}

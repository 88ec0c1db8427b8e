//! Displacement-predicting denoising network.

use burn::module::Module;
use burn::prelude::*;

use crate::config::{DenoiseNetConfig, LossNorm, SupervisedLossConfig};
use crate::denoise::DisplacementModel;
use crate::loss::SupervisedLoss;

use super::{Mlp, MlpConfig, PointEncoder};

impl DenoiseNetConfig {
    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DenoiseNet<B> {
        let encoder = PointEncoder::new(&self.encoder_dims, self.point_feature_dim, device);
        let decoder = MlpConfig::new(self.decoder_input_dim(), 3)
            .with_hidden_dims(self.decoder_dims.clone())
            .init(device);
        DenoiseNet { encoder, decoder }
    }
}

/// Predicts, for every noisy point, the displacement towards the clean surface.
///
/// Architecture:
/// 1. Shared per-point MLP features
/// 2. Max pool over valid points for a patch feature
/// 3. MLP decoder over `[xyz, point feature, patch feature]` to a 3D displacement
///
/// Padded positions neither influence valid predictions nor receive a
/// non-zero displacement.
#[derive(Module, Debug)]
pub struct DenoiseNet<B: Backend> {
    encoder: PointEncoder<B>,
    decoder: Mlp<B>,
}

impl<B: Backend> DenoiseNet<B> {
    /// Forward pass.
    ///
    /// Input: points [batch, num_points, 3], mask [batch, num_points]
    /// Output: displacement [batch, num_points, 3]
    pub fn forward(&self, points: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 3> {
        let [batch, num_points, _] = points.dims();

        let point_features = self.encoder.forward_per_point(points.clone());
        let patch_feature = self
            .encoder
            .masked_max_pool(point_features.clone(), mask.clone());
        let feature_dim = self.encoder.feature_dim();
        let patch_feature: Tensor<B, 3> = patch_feature
            .reshape([batch, 1, feature_dim])
            .repeat_dim(1, num_points);

        let input = Tensor::cat(vec![points, point_features, patch_feature], 2);
        let displacement = self.decoder.forward_3d(input);

        let mask: Tensor<B, 3> = mask.reshape([batch, num_points, 1]).repeat_dim(2, 3);
        displacement * mask
    }

    /// Supervised loss against `clean - noisy` with the given norm.
    pub fn supervised_loss(
        &self,
        pcl_noisy: Tensor<B, 3>,
        pcl_clean: Tensor<B, 3>,
        mask: Tensor<B, 2>,
        norm: LossNorm,
    ) -> Tensor<B, 1> {
        let pred = self.forward(pcl_noisy.clone(), mask.clone());
        SupervisedLoss::new(SupervisedLossConfig::new().with_norm(norm))
            .forward(pred, pcl_noisy, pcl_clean, mask)
    }

    /// Displacement for a single unpadded cloud.
    ///
    /// Input and output: [num_points, 3]
    pub fn predict_displacement(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let [num_points, _] = points.dims();
        let device = points.device();

        let mask = Tensor::ones([1, num_points], &device);
        self.forward(points.reshape([1, num_points, 3]), mask)
            .reshape([num_points, 3])
    }
}

impl<B: Backend> DisplacementModel<B> for DenoiseNet<B> {
    fn displacement(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        self.predict_displacement(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::length_mask;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> DenoiseNetConfig {
        DenoiseNetConfig::new()
            .with_encoder_dims(vec![16])
            .with_point_feature_dim(16)
            .with_decoder_dims(vec![32])
    }

    fn wavy_patch(n: usize) -> Vec<f32> {
        (0..n)
            .flat_map(|i| {
                let x = (i % 8) as f32 * 0.1;
                let y = (i / 8) as f32 * 0.1;
                [x, y, (x * 3.0).sin() * 0.05]
            })
            .collect()
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let net = small_config().init::<TestBackend>(&device);

        let points = Tensor::zeros([2, 10, 3], &device);
        let mask = Tensor::ones([2, 10], &device);

        assert_eq!(net.forward(points, mask).dims(), [2, 10, 3]);
    }

    #[test]
    fn test_padding_does_not_change_valid_predictions() {
        let device = Default::default();
        let net = small_config().init::<TestBackend>(&device);

        let valid = wavy_patch(12);
        let unpadded = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(valid.clone(), [1, 12, 3]),
            &device,
        );

        let mut padded_data = valid;
        padded_data.extend(std::iter::repeat(50.0f32).take(8 * 3));
        let padded = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(padded_data, [1, 20, 3]),
            &device,
        );

        let a: Vec<f32> = net
            .forward(unpadded, length_mask(&[12], 12, &device))
            .to_data()
            .to_vec()
            .unwrap();
        let b: Vec<f32> = net
            .forward(padded, length_mask(&[12], 20, &device))
            .to_data()
            .to_vec()
            .unwrap();

        for (x, y) in a.iter().zip(&b[..36]) {
            assert!((x - y).abs() < 1e-5, "{} vs {}", x, y);
        }
        assert!(b[36..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_single_cloud_matches_batched_forward() {
        let device = Default::default();
        let net = small_config().init::<TestBackend>(&device);
        let data = wavy_patch(16);

        let single = Tensor::<TestBackend, 2>::from_data(TensorData::new(data.clone(), [16, 3]), &device);
        let batched = Tensor::<TestBackend, 3>::from_data(TensorData::new(data, [1, 16, 3]), &device);

        let a: Vec<f32> = net.displacement(single).to_data().to_vec().unwrap();
        let b: Vec<f32> = net
            .forward(batched, Tensor::ones([1, 16], &device))
            .to_data()
            .to_vec()
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_supervised_loss_is_finite() {
        let device = Default::default();
        let net = small_config().init::<TestBackend>(&device);
        let noisy = Tensor::<TestBackend, 3>::from_data(TensorData::new(wavy_patch(16), [1, 16, 3]), &device);
        let clean = noisy.clone() * 0.9;

        let loss: f32 = net
            .supervised_loss(noisy, clean, Tensor::ones([1, 16], &device), LossNorm::SquaredL2)
            .to_data()
            .to_vec()
            .unwrap()[0];

        assert!(loss.is_finite() && loss >= 0.0);
    }

    #[test]
    fn test_supervised_loss_backward_through_padded_batch() {
        use burn::backend::Autodiff;

        type AdBackend = Autodiff<NdArray>;
        let device = Default::default();
        let net = small_config().init::<AdBackend>(&device);

        let noisy = Tensor::<AdBackend, 3>::from_data(TensorData::new(wavy_patch(10), [2, 5, 3]), &device)
            .require_grad();
        let clean = noisy.clone().detach() * 0.5 + 0.1;
        let mask = length_mask(&[5, 3], 5, &device);

        let loss = net.supervised_loss(noisy.clone(), clean, mask, LossNorm::SquaredL2);
        let grads = loss.backward();

        let grad: Vec<f32> = noisy.grad(&grads).unwrap().to_data().to_vec().unwrap();
        assert_eq!(grad.len(), 30);
        assert!(grad.iter().all(|v| v.is_finite()));
        assert!(grad[..24].iter().any(|v| *v != 0.0));
        // Padded rows of the second sample.
        assert!(grad[24..].iter().all(|v| *v == 0.0));
    }
}

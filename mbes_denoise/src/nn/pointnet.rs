//! PointNet-style per-point encoder with length-masked pooling.

use burn::module::Module;
use burn::nn::Relu;
use burn::prelude::*;

use super::{Mlp, MlpConfig};

/// Offset subtracted from padded features before max pooling.
const PAD_PENALTY: f32 = 1.0e6;

/// Shared per-point MLP.
///
/// Each point is encoded independently, so a valid point's feature never
/// depends on padding. [`PointEncoder::masked_max_pool`] keeps padding out of
/// the patch feature as well.
#[derive(Module, Debug)]
pub struct PointEncoder<B: Backend> {
    mlp: Mlp<B>,
    activation: Relu,
}

impl<B: Backend> PointEncoder<B> {
    /// Create an encoder mapping xyz to `feature_dim` features.
    pub fn new(hidden_dims: &[usize], feature_dim: usize, device: &B::Device) -> Self {
        let mlp = MlpConfig::new(3, feature_dim)
            .with_hidden_dims(hidden_dims.to_vec())
            .init(device);
        Self {
            mlp,
            activation: Relu::new(),
        }
    }

    /// Per-point features.
    ///
    /// Input: points tensor of shape [batch, num_points, 3]
    /// Output: features of shape [batch, num_points, feature_dim]
    pub fn forward_per_point(&self, points: Tensor<B, 3>) -> Tensor<B, 3> {
        self.activation.forward(self.mlp.forward_3d(points))
    }

    /// Max pool over valid points only.
    ///
    /// Input: features [batch, num_points, feature_dim], mask [batch, num_points]
    /// Output: [batch, feature_dim]
    pub fn masked_max_pool(&self, features: Tensor<B, 3>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, num_points, feature_dim] = features.dims();

        let penalty = (mask.neg() + 1.0) * PAD_PENALTY;
        let penalty: Tensor<B, 3> = penalty
            .reshape([batch, num_points, 1])
            .repeat_dim(2, feature_dim);

        // ndarray only supports max_dim backward over the last axis.
        (features - penalty)
            .swap_dims(1, 2)
            .max_dim(2)
            .reshape([batch, feature_dim])
    }

    /// Feature dimension.
    pub fn feature_dim(&self) -> usize {
        self.mlp.output_dim()
    }
}

//! Masked supervised displacement loss.

use burn::prelude::*;

use crate::config::{LossNorm, SupervisedLossConfig};

/// Supervised loss on predicted displacements.
///
/// The target for each point is `clean - noisy`. The per-point error is summed
/// over xyz, masked so that padding contributes nothing, summed over the batch
/// and divided by the number of valid points. A batch with no valid points
/// yields zero.
#[derive(Debug, Clone)]
pub struct SupervisedLoss {
    config: SupervisedLossConfig,
}

impl SupervisedLoss {
    /// Create a new loss calculator.
    pub fn new(config: SupervisedLossConfig) -> Self {
        Self { config }
    }

    /// Per-point error norm.
    pub fn norm(&self) -> LossNorm {
        self.config.norm
    }

    /// Compute the loss.
    ///
    /// Inputs:
    /// - pred: [batch, num_points, 3] predicted displacement
    /// - pcl_noisy, pcl_clean: [batch, num_points, 3]
    /// - mask: [batch, num_points], 1 for valid points and 0 for padding
    ///
    /// Output: scalar loss
    pub fn forward<B: Backend>(
        &self,
        pred: Tensor<B, 3>,
        pcl_noisy: Tensor<B, 3>,
        pcl_clean: Tensor<B, 3>,
        mask: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch, num_points, _] = pred.dims();

        let target = pcl_clean - pcl_noisy;
        let diff = pred - target;
        let per_coord = match self.config.norm {
            LossNorm::SquaredL2 => diff.clone() * diff,
            LossNorm::L1 => diff.abs(),
        };
        let per_point: Tensor<B, 2> = per_coord.sum_dim(2).reshape([batch, num_points]);

        let total = (per_point * mask.clone()).sum();
        let count = mask.sum().clamp_min(1.0);

        total / count
    }
}

impl Default for SupervisedLoss {
    fn default() -> Self {
        Self::new(SupervisedLossConfig::default())
    }
}

/// Build a `[batch, capacity]` validity mask from per-sample lengths.
pub fn length_mask<B: Backend>(lengths: &[usize], capacity: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut data = vec![0.0f32; lengths.len() * capacity];
    for (row, &len) in lengths.iter().enumerate() {
        let valid = len.min(capacity);
        data[row * capacity..row * capacity + valid].fill(1.0);
    }
    Tensor::from_data(TensorData::new(data, [lengths.len(), capacity]), device)
}

//! Integration tests for the supervised displacement loss.

use burn::backend::NdArray;
use burn::prelude::*;

use mbes_denoise::{
    config::{LossNorm, SupervisedLossConfig},
    loss::{length_mask, SupervisedLoss},
};

type TestBackend = NdArray;

fn value(loss: Tensor<TestBackend, 1>) -> f32 {
    loss.to_data().to_vec().unwrap()[0]
}

fn patch(n: usize, z: f32) -> Vec<f32> {
    (0..n)
        .flat_map(|i| [(i % 4) as f32 * 0.25, (i / 4) as f32 * 0.25, z])
        .collect()
}

#[test]
fn test_zero_loss_for_clean_input_and_zero_predictor() {
    let device = Default::default();
    let loss_fn = SupervisedLoss::default();

    let clean = Tensor::<TestBackend, 3>::from_data(TensorData::new(patch(16, -1.0), [1, 16, 3]), &device);
    let pred = Tensor::<TestBackend, 3>::zeros([1, 16, 3], &device);
    let mask = Tensor::<TestBackend, 2>::ones([1, 16], &device);

    let loss = value(loss_fn.forward(pred, clean.clone(), clean, mask));
    assert!(loss.abs() < 1e-7, "Expected zero loss, got {}", loss);
}

#[test]
fn test_perfect_prediction_gives_zero_loss() {
    let device = Default::default();
    let loss_fn = SupervisedLoss::default();

    let clean = Tensor::<TestBackend, 3>::from_data(TensorData::new(patch(8, 0.0), [1, 8, 3]), &device);
    let noisy = clean.clone() + 0.3;
    let pred = clean.clone() - noisy.clone();
    let mask = Tensor::<TestBackend, 2>::ones([1, 8], &device);

    let loss = value(loss_fn.forward(pred, noisy, clean, mask));
    assert!(loss.abs() < 1e-6, "Expected zero loss, got {}", loss);
}

#[test]
fn test_zero_predictor_loss_is_mean_squared_offset() {
    let device = Default::default();
    let loss_fn = SupervisedLoss::default();

    // Offset (0, 0, 0.2) on every point: squared norm 0.04 per point.
    let clean = Tensor::<TestBackend, 3>::from_data(TensorData::new(patch(8, 0.0), [1, 8, 3]), &device);
    let noisy = Tensor::<TestBackend, 3>::from_data(TensorData::new(patch(8, 0.2), [1, 8, 3]), &device);
    let pred = Tensor::<TestBackend, 3>::zeros([1, 8, 3], &device);
    let mask = Tensor::<TestBackend, 2>::ones([1, 8], &device);

    let loss = value(loss_fn.forward(pred, noisy, clean, mask));
    assert!((loss - 0.04).abs() < 1e-6, "Expected 0.04, got {}", loss);
}

#[test]
fn test_extra_padding_does_not_change_loss() {
    let device = Default::default();

    for norm in [LossNorm::SquaredL2, LossNorm::L1] {
        let loss_fn = SupervisedLoss::new(SupervisedLossConfig::new().with_norm(norm));

        let clean = patch(6, 0.0);
        let noisy = patch(6, 0.1);

        let short = {
            let c = Tensor::<TestBackend, 3>::from_data(TensorData::new(clean.clone(), [1, 6, 3]), &device);
            let n = Tensor::<TestBackend, 3>::from_data(TensorData::new(noisy.clone(), [1, 6, 3]), &device);
            let pred = Tensor::<TestBackend, 3>::zeros([1, 6, 3], &device);
            value(loss_fn.forward(pred, n, c, length_mask(&[6], 6, &device)))
        };

        let long = {
            let mut c = clean.clone();
            let mut n = noisy.clone();
            c.extend(std::iter::repeat(7.0f32).take(10 * 3));
            n.extend(std::iter::repeat(-7.0f32).take(10 * 3));
            let c = Tensor::<TestBackend, 3>::from_data(TensorData::new(c, [1, 16, 3]), &device);
            let n = Tensor::<TestBackend, 3>::from_data(TensorData::new(n, [1, 16, 3]), &device);
            let pred = Tensor::<TestBackend, 3>::full([1, 16, 3], 0.0, &device);
            value(loss_fn.forward(pred, n, c, length_mask(&[6], 16, &device)))
        };

        assert!((short - long).abs() < 1e-6, "{:?}: {} vs {}", norm, short, long);
    }
}

#[test]
fn test_loss_averages_over_valid_points_across_batch() {
    let device = Default::default();
    let loss_fn = SupervisedLoss::default();

    // Sample 0: 2 valid points with squared error 1; sample 1: 4 valid points with error 0.
    let mut pred_data = vec![0.0f32; 2 * 4 * 3];
    pred_data[2] = 1.0;
    pred_data[5] = 1.0;
    let pred = Tensor::<TestBackend, 3>::from_data(TensorData::new(pred_data, [2, 4, 3]), &device);
    let zeros = Tensor::<TestBackend, 3>::zeros([2, 4, 3], &device);

    let loss = value(loss_fn.forward(pred, zeros.clone(), zeros, length_mask(&[2, 4], 4, &device)));
    assert!((loss - 2.0 / 6.0).abs() < 1e-6, "Expected 1/3, got {}", loss);
}

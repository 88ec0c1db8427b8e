//! Conversions between point slices and tensors.

use burn::prelude::*;
use mbes_core::Point3;

use crate::error::{DenoiseError, Result};

/// Pack points into a `[num_points, 3]` tensor.
pub fn points_to_tensor<B: Backend>(points: &[Point3], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = points.iter().flat_map(|p| p.as_array()).collect();
    Tensor::from_data(TensorData::new(data, [points.len(), 3]), device)
}

/// Unpack a `[num_points, 3]` tensor into points.
pub fn tensor_to_points<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Point3>> {
    let [num_points, dim] = tensor.dims();
    if dim != 3 {
        return Err(DenoiseError::ShapeMismatch {
            expected: vec![num_points, 3],
            got: vec![num_points, dim],
        });
    }
    let values: Vec<f32> = tensor
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| DenoiseError::InvalidData(format!("{:?}", e)))?;
    Ok(values
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

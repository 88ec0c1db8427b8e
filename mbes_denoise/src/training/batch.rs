//! Collation and batch loading.

use burn::prelude::*;
use mbes_core::{valid_prefix, Point3};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::{MbesPatchDataset, PatchSample};
use crate::error::{DenoiseError, Result};
use crate::loss::length_mask;

/// A padded batch of patches.
#[derive(Debug, Clone)]
pub struct MbesBatch<B: Backend> {
    /// Clean clouds: [batch, capacity, 3]
    pub pcl_clean: Tensor<B, 3>,
    /// Noisy clouds: [batch, capacity, 3]
    pub pcl_noisy: Tensor<B, 3>,
    /// Normalisation centroids: [batch, 3]
    pub pcl_noisy_mean: Tensor<B, 2>,
    /// Valid lengths: [batch]
    pub pcl_length: Tensor<B, 1, Int>,
    /// Validity mask derived from the lengths: [batch, capacity]
    pub mask: Tensor<B, 2>,
    lengths: Vec<usize>,
}

impl<B: Backend> MbesBatch<B> {
    /// Number of samples.
    pub fn batch_size(&self) -> usize {
        self.lengths.len()
    }

    /// Padded length.
    pub fn capacity(&self) -> usize {
        self.mask.dims()[1]
    }

    /// Valid lengths on the host.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Total number of valid points.
    pub fn num_valid_points(&self) -> usize {
        self.lengths.iter().sum()
    }

    /// Unpad both clouds into per-sample `(noisy, clean)` pairs.
    pub fn unpad(&self) -> Result<Vec<(Vec<Point3>, Vec<Point3>)>> {
        let noisy = to_points(self.pcl_noisy.clone())?;
        let clean = to_points(self.pcl_clean.clone())?;
        let capacity = self.capacity();

        self.lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let rows = i * capacity..(i + 1) * capacity;
                let noisy = valid_prefix(&noisy[rows.clone()], len)?.to_vec();
                let clean = valid_prefix(&clean[rows], len)?.to_vec();
                Ok((noisy, clean))
            })
            .collect()
    }
}

fn to_points<B: Backend>(tensor: Tensor<B, 3>) -> Result<Vec<Point3>> {
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

/// Pad samples to the longest one in the batch.
pub fn collate<B: Backend>(samples: &[PatchSample], device: &B::Device) -> Result<MbesBatch<B>> {
    let capacity = samples.iter().map(PatchSample::len).max().unwrap_or(0);
    collate_with_capacity(samples, capacity, device)
}

/// Pad samples to a fixed capacity.
///
/// Fails on an empty sample list and on any sample longer than `capacity`.
pub fn collate_with_capacity<B: Backend>(
    samples: &[PatchSample],
    capacity: usize,
    device: &B::Device,
) -> Result<MbesBatch<B>> {
    if samples.is_empty() {
        return Err(DenoiseError::EmptyBatch);
    }

    let batch = samples.len();
    let mut clean = vec![0.0f32; batch * capacity * 3];
    let mut noisy = vec![0.0f32; batch * capacity * 3];
    let mut means = Vec::with_capacity(batch * 3);
    let mut lengths = Vec::with_capacity(batch);

    for (i, sample) in samples.iter().enumerate() {
        let len = sample.len();
        if len > capacity {
            return Err(mbes_core::MbesCoreError::LengthExceedsCapacity {
                length: len,
                capacity,
            }
            .into());
        }
        if sample.pcl_noisy.len() != len {
            return Err(DenoiseError::LengthMismatch {
                context: format!("batch sample {}", i),
                left: len,
                right: sample.pcl_noisy.len(),
            });
        }

        let offset = i * capacity * 3;
        for (j, (c, n)) in sample.pcl_clean.iter().zip(&sample.pcl_noisy).enumerate() {
            clean[offset + j * 3..offset + j * 3 + 3].copy_from_slice(&c.as_array());
            noisy[offset + j * 3..offset + j * 3 + 3].copy_from_slice(&n.as_array());
        }
        means.extend_from_slice(&sample.pcl_noisy_mean.as_array());
        lengths.push(len);
    }

    let lengths_i64: Vec<i64> = lengths.iter().map(|&l| l as i64).collect();

    Ok(MbesBatch {
        pcl_clean: Tensor::from_data(TensorData::new(clean, [batch, capacity, 3]), device),
        pcl_noisy: Tensor::from_data(TensorData::new(noisy, [batch, capacity, 3]), device),
        pcl_noisy_mean: Tensor::from_data(TensorData::new(means, [batch, 3]), device),
        pcl_length: Tensor::from_data(TensorData::new(lengths_i64, [batch]), device),
        mask: length_mask(&lengths, capacity, device),
        lengths,
    })
}

/// Iterates a dataset in batches, shuffled or in order.
///
/// The dataset transform is applied on every read, drawing from the loader's
/// seeded generator.
pub struct PatchLoader {
    dataset: MbesPatchDataset,
    batch_size: usize,
    shuffle: bool,
    rng: ChaCha8Rng,
}

impl PatchLoader {
    /// Create a loader.
    pub fn new(dataset: MbesPatchDataset, batch_size: usize, shuffle: bool, seed: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(DenoiseError::config("batch size must be positive"));
        }
        Ok(Self {
            dataset,
            batch_size,
            shuffle,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Underlying dataset.
    pub fn dataset(&self) -> &MbesPatchDataset {
        &self.dataset
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches per epoch, the last one possibly short.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Index groups for one epoch.
    pub fn epoch_indices(&mut self) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            indices.shuffle(&mut self.rng);
        }
        indices
            .chunks(self.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Read samples with the transform applied.
    pub fn load(&mut self, indices: &[usize]) -> Vec<PatchSample> {
        indices
            .iter()
            .filter_map(|&i| self.dataset.get(i, &mut self.rng))
            .collect()
    }

    /// Read and collate one batch.
    pub fn load_batch<B: Backend>(&mut self, indices: &[usize], device: &B::Device) -> Result<MbesBatch<B>> {
        let samples = self.load(indices);
        collate(&samples, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NoiseTransform;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(n: usize, z: f32) -> PatchSample {
        let clean: Vec<Point3> = (0..n).map(|i| Point3::new(i as f32, 0.0, z)).collect();
        let noisy: Vec<Point3> = clean.iter().map(|p| *p + Point3::new(0.0, 0.0, 0.1)).collect();
        PatchSample::new(clean, noisy, Point3::new(100.0, 200.0, -z)).unwrap()
    }

    #[test]
    fn test_collate_pads_to_longest() {
        let device = Default::default();
        let batch = collate::<TestBackend>(&[sample(3, 1.0), sample(5, 2.0)], &device).unwrap();

        assert_eq!(batch.pcl_clean.dims(), [2, 5, 3]);
        assert_eq!(batch.pcl_noisy_mean.dims(), [2, 3]);
        assert_eq!(batch.lengths(), &[3, 5]);
        assert_eq!(batch.num_valid_points(), 8);

        let lengths: Vec<i64> = batch.pcl_length.to_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(lengths, vec![3, 5]);

        let mask: Vec<f32> = batch.mask.to_data().to_vec().unwrap();
        assert_eq!(&mask[..5], &[1.0, 1.0, 1.0, 0.0, 0.0]);
        assert!(mask[5..].iter().all(|m| *m == 1.0));
    }

    #[test]
    fn test_unpad_recovers_samples() {
        let device = Default::default();
        let samples = [sample(2, 1.0), sample(4, 2.0)];
        let batch = collate::<TestBackend>(&samples, &device).unwrap();

        let pairs = batch.unpad().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, samples[0].pcl_noisy);
        assert_eq!(pairs[1].1, samples[1].pcl_clean);
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let device = Default::default();
        let err = collate::<TestBackend>(&[], &device).unwrap_err();
        assert!(matches!(err, DenoiseError::EmptyBatch));
    }

    #[test]
    fn test_capacity_overflow_is_rejected() {
        let device = Default::default();
        let err = collate_with_capacity::<TestBackend>(&[sample(6, 0.0)], 4, &device).unwrap_err();
        assert!(matches!(err, DenoiseError::Metric(_)));
    }

    #[test]
    fn test_loader_covers_dataset_once_per_epoch() {
        let samples: Vec<PatchSample> = (0..7).map(|i| sample(2, i as f32)).collect();
        let dataset = MbesPatchDataset::from_samples(samples, NoiseTransform::Identity);
        let mut loader = PatchLoader::new(dataset, 3, true, 9).unwrap();

        let groups = loader.epoch_indices();
        assert_eq!(groups.len(), loader.num_batches());
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 1]);

        let mut seen: Vec<usize> = groups.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_ordered_loader_keeps_order() {
        let samples: Vec<PatchSample> = (0..4).map(|i| sample(2, i as f32)).collect();
        let dataset = MbesPatchDataset::from_samples(samples, NoiseTransform::Identity);
        let mut loader = PatchLoader::new(dataset, 2, false, 0).unwrap();

        assert_eq!(loader.epoch_indices(), vec![vec![0, 1], vec![2, 3]]);
    }
}

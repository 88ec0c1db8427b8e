//! MBES patch dataset.

use mbes_core::Point3;
use rand::Rng;

use crate::config::DatasetConfig;
use crate::error::{DenoiseError, Result};

use super::{load_pings, NoiseTransform, PatchSample, Ping};

/// Patches of consecutive pings, each centred on its noisy mean.
///
/// The stored samples are never modified; [`MbesPatchDataset::get`] applies the
/// noise transform to a copy on every read, so each epoch sees fresh noise.
#[derive(Debug, Clone)]
pub struct MbesPatchDataset {
    patches: Vec<PatchSample>,
    transform: NoiseTransform,
}

impl MbesPatchDataset {
    /// Build a dataset from pre-built samples.
    pub fn from_samples(patches: Vec<PatchSample>, transform: NoiseTransform) -> Self {
        Self { patches, transform }
    }

    /// Group index-aligned clean and noisy pings into patches.
    ///
    /// `pings_subset` is a half-open `[start, end)` range of ping indices and is
    /// clipped to the available pings. A trailing group shorter than
    /// `pings_per_patch` still forms a patch; patches with no soundings are dropped.
    pub fn from_pings(
        clean: &[Ping],
        noisy: &[Ping],
        pings_per_patch: usize,
        pings_subset: Option<[usize; 2]>,
        transform: NoiseTransform,
    ) -> Result<Self> {
        if pings_per_patch == 0 {
            return Err(DenoiseError::config("pings_per_patch must be positive"));
        }
        if clean.len() != noisy.len() {
            return Err(DenoiseError::LengthMismatch {
                context: "ping count".to_string(),
                left: clean.len(),
                right: noisy.len(),
            });
        }

        let (start, end) = match pings_subset {
            Some([start, end]) => (start.min(clean.len()), end.min(clean.len())),
            None => (0, clean.len()),
        };
        if start >= end {
            return Ok(Self::from_samples(Vec::new(), transform));
        }

        let mut patches = Vec::new();
        for first in (start..end).step_by(pings_per_patch) {
            let last = (first + pings_per_patch).min(end);
            let mut patch_clean: Vec<Point3> = Vec::new();
            let mut patch_noisy: Vec<Point3> = Vec::new();

            for idx in first..last {
                if clean[idx].len() != noisy[idx].len() {
                    return Err(DenoiseError::LengthMismatch {
                        context: format!("ping {}", idx),
                        left: clean[idx].len(),
                        right: noisy[idx].len(),
                    });
                }
                patch_clean.extend_from_slice(&clean[idx]);
                patch_noisy.extend_from_slice(&noisy[idx]);
            }

            if patch_clean.is_empty() {
                continue;
            }
            patches.push(PatchSample::from_raw(patch_clean, patch_noisy)?);
        }

        Ok(Self::from_samples(patches, transform))
    }

    /// Load the ping files named by a dataset configuration.
    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        config.validate().map_err(DenoiseError::config)?;
        let transform = NoiseTransform::from_config(config)?;
        let noisy = load_pings(&config.data_path)?;
        let clean = load_pings(&config.gt_path)?;

        let dataset = Self::from_pings(
            &clean,
            &noisy,
            config.pings_per_patch,
            config.pings_subset,
            transform,
        )?;
        log::info!(
            "Dataset {}: {} pings -> {} patches (transform: {})",
            config.data_path,
            clean.len(),
            dataset.len(),
            transform.kind()
        );
        Ok(dataset)
    }

    /// Number of patches.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// True when the dataset holds no patches.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Transform applied on read.
    pub fn transform(&self) -> NoiseTransform {
        self.transform
    }

    /// Stored sample without the transform applied.
    pub fn raw(&self, index: usize) -> Option<&PatchSample> {
        self.patches.get(index)
    }

    /// Read a sample with the transform applied.
    pub fn get<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Option<PatchSample> {
        self.patches
            .get(index)
            .map(|sample| self.transform.apply(sample, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseTransformKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn swath(num_pings: usize, beams: usize, depth_offset: f32) -> Vec<Ping> {
        (0..num_pings)
            .map(|p| {
                (0..beams)
                    .map(|b| Point3::new(b as f32, p as f32, -20.0 + depth_offset))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_pings_are_grouped_into_patches() {
        let clean = swath(10, 4, 0.0);
        let noisy = swath(10, 4, 0.05);

        let ds = MbesPatchDataset::from_pings(&clean, &noisy, 4, None, NoiseTransform::Identity)
            .unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.raw(0).unwrap().len(), 16);
        assert_eq!(ds.raw(2).unwrap().len(), 8);
    }

    #[test]
    fn test_patches_are_centred_on_noisy_mean() {
        let clean = swath(4, 3, 0.0);
        let noisy = swath(4, 3, 0.05);

        let ds = MbesPatchDataset::from_pings(&clean, &noisy, 4, None, NoiseTransform::Identity)
            .unwrap();
        let sample = ds.raw(0).unwrap();

        assert!((sample.pcl_noisy_mean.z - (-19.95)).abs() < 1e-5);
        let centroid = mbes_core::centroid(&sample.pcl_noisy).unwrap();
        assert!(centroid.length() < 1e-5);
        assert!((sample.pcl_clean[0].z - (-0.05)).abs() < 1e-5);
    }

    #[test]
    fn test_subset_is_half_open_and_clipped() {
        let clean = swath(10, 2, 0.0);
        let noisy = swath(10, 2, 0.0);

        let ds =
            MbesPatchDataset::from_pings(&clean, &noisy, 2, Some([4, 8]), NoiseTransform::Identity)
                .unwrap();
        assert_eq!(ds.len(), 2);
        assert!((ds.raw(0).unwrap().pcl_noisy_mean.y - 4.5).abs() < 1e-6);

        let ds = MbesPatchDataset::from_pings(
            &clean,
            &noisy,
            2,
            Some([8, 100]),
            NoiseTransform::Identity,
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_mismatched_ping_is_rejected() {
        let clean = swath(3, 4, 0.0);
        let mut noisy = swath(3, 4, 0.0);
        noisy[1].pop();

        let err = MbesPatchDataset::from_pings(&clean, &noisy, 2, None, NoiseTransform::Identity)
            .unwrap_err();
        assert!(matches!(err, DenoiseError::LengthMismatch { left: 4, right: 3, .. }));
    }

    #[test]
    fn test_transform_is_reapplied_on_every_read() {
        let clean = swath(2, 8, 0.0);
        let noisy = swath(2, 8, 0.0);
        let transform =
            NoiseTransform::new(NoiseTransformKind::AddNoiseToClean, 0.05, 0.05).unwrap();
        let ds = MbesPatchDataset::from_pings(&clean, &noisy, 2, None, transform).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let first = ds.get(0, &mut rng).unwrap();
        let second = ds.get(0, &mut rng).unwrap();

        assert_ne!(first.pcl_noisy, second.pcl_noisy);
        assert_eq!(first.pcl_clean, ds.raw(0).unwrap().pcl_clean);
        assert_eq!(ds.raw(0).unwrap().pcl_noisy, ds.raw(0).unwrap().pcl_clean);
    }

    #[test]
    fn test_out_of_range_index_returns_none() {
        let ds = MbesPatchDataset::from_samples(Vec::new(), NoiseTransform::Identity);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(ds.is_empty());
        assert!(ds.get(0, &mut rng).is_none());
    }
}

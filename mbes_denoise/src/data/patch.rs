//! Clean/noisy patch pairs.

use mbes_core::{centroid, subtract_offset_in_place, Point3};

use crate::error::{DenoiseError, Result};

/// One training or validation example.
///
/// `pcl_clean` and `pcl_noisy` are index-aligned: point `i` of the noisy cloud
/// is a corrupted observation of point `i` of the clean cloud. Both are
/// expressed relative to `pcl_noisy_mean`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSample {
    /// Ground-truth soundings.
    pub pcl_clean: Vec<Point3>,
    /// Observed (or synthetically corrupted) soundings.
    pub pcl_noisy: Vec<Point3>,
    /// Centroid of the raw noisy patch used to normalise both clouds.
    pub pcl_noisy_mean: Point3,
}

impl PatchSample {
    /// Create a sample from already normalised clouds.
    pub fn new(
        pcl_clean: Vec<Point3>,
        pcl_noisy: Vec<Point3>,
        pcl_noisy_mean: Point3,
    ) -> Result<Self> {
        if pcl_clean.len() != pcl_noisy.len() {
            return Err(DenoiseError::LengthMismatch {
                context: "patch clean/noisy".to_string(),
                left: pcl_clean.len(),
                right: pcl_noisy.len(),
            });
        }
        Ok(Self {
            pcl_clean,
            pcl_noisy,
            pcl_noisy_mean,
        })
    }

    /// Create a sample from raw world-frame clouds, centring both on the noisy mean.
    pub fn from_raw(mut pcl_clean: Vec<Point3>, mut pcl_noisy: Vec<Point3>) -> Result<Self> {
        let mean = centroid(&pcl_noisy).unwrap_or_default();
        subtract_offset_in_place(&mut pcl_clean, mean);
        subtract_offset_in_place(&mut pcl_noisy, mean);
        Self::new(pcl_clean, pcl_noisy, mean)
    }

    /// Number of points in the patch.
    pub fn len(&self) -> usize {
        self.pcl_clean.len()
    }

    /// True when the patch holds no points.
    pub fn is_empty(&self) -> bool {
        self.pcl_clean.is_empty()
    }

    /// Map normalised points back to the world frame.
    pub fn denormalize(&self, points: &[Point3]) -> Vec<Point3> {
        points.iter().map(|p| *p + self.pcl_noisy_mean).collect()
    }
}

//! Dataset and noise transform configuration.

use std::fmt;
use std::str::FromStr;

use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::error::DenoiseError;

/// Which synthetic noise, if any, is applied when a patch is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseTransformKind {
    /// Use the recorded noisy soundings as they are.
    None,
    /// Replace the noisy cloud by `clean + N(0, σ²)`.
    AddNoiseToClean,
    /// Perturb the recorded noisy cloud further: `noisy + N(0, σ²)`.
    AddNoiseToNoisy,
}

impl NoiseTransformKind {
    /// Name used in configuration files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseTransformKind::None => "none",
            NoiseTransformKind::AddNoiseToClean => "add_noise_to_clean",
            NoiseTransformKind::AddNoiseToNoisy => "add_noise_to_noisy",
        }
    }
}

impl fmt::Display for NoiseTransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseTransformKind {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(NoiseTransformKind::None),
            "add_noise_to_clean" => Ok(NoiseTransformKind::AddNoiseToClean),
            "add_noise_to_noisy" => Ok(NoiseTransformKind::AddNoiseToNoisy),
            other => Err(DenoiseError::UnknownTransform(other.to_string())),
        }
    }
}

/// Configuration for one MBES patch dataset (training or validation).
#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Ping file with the recorded (noisy) soundings.
    pub data_path: String,

    /// Ping file with the cleaned ground-truth soundings.
    pub gt_path: String,

    /// Noise transform applied on every read.
    #[config(default = "NoiseTransformKind::None")]
    pub transform: NoiseTransformKind,

    /// Lower bound of the sampled noise standard deviation.
    #[config(default = 0.0)]
    pub noise_min: f32,

    /// Upper bound of the sampled noise standard deviation.
    #[config(default = 0.0)]
    pub noise_max: f32,

    /// Half-open `[start, end)` range of ping indices to keep.
    pub pings_subset: Option<[usize; 2]>,

    /// Number of consecutive pings grouped into one patch.
    #[config(default = 32)]
    pub pings_per_patch: usize,
}

impl DatasetConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.noise_min.is_finite() || !self.noise_max.is_finite() {
            return Err("noise_min and noise_max must be finite".to_string());
        }
        if self.noise_min < 0.0 {
            return Err("noise_min must be non-negative".to_string());
        }
        if self.noise_min > self.noise_max {
            return Err(format!(
                "noise_min ({}) must not exceed noise_max ({})",
                self.noise_min, self.noise_max
            ));
        }
        if self.pings_per_patch == 0 {
            return Err("pings_per_patch must be positive".to_string());
        }
        if let Some([start, end]) = self.pings_subset {
            if start >= end {
                return Err(format!("pings_subset [{}, {}) is empty", start, end));
            }
        }
        Ok(())
    }
}

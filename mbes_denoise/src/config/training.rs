//! Training configuration types.

use burn::config::Config;
use serde::{Deserialize, Serialize};

use super::{DatasetConfig, DenoiseNetConfig, LangevinConfig};

/// Per-point error used by the supervised loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossNorm {
    /// Squared Euclidean error `|pred - target|²`.
    SquaredL2,
    /// Absolute error summed over xyz.
    L1,
}

/// Configuration for the supervised displacement loss.
#[derive(Config, Debug)]
pub struct SupervisedLossConfig {
    /// Per-point error norm.
    #[config(default = "LossNorm::SquaredL2")]
    pub norm: LossNorm,
}

impl Default for SupervisedLossConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a full training run.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Network configuration.
    pub model: DenoiseNetConfig,

    /// Training dataset.
    pub train_dataset: DatasetConfig,

    /// Validation dataset.
    pub val_dataset: DatasetConfig,

    /// Langevin denoiser used during validation.
    pub langevin: LangevinConfig,

    /// Supervised loss configuration.
    #[config(default = "SupervisedLossConfig::new()")]
    pub loss: SupervisedLossConfig,

    /// Seed for weight init, shuffling and noise sampling.
    #[config(default = 2024)]
    pub seed: u64,

    /// Learning rate.
    #[config(default = 1e-4)]
    pub lr: f64,

    /// Weight decay for regularization.
    #[config(default = 0.0)]
    pub weight_decay: f64,

    /// Gradient norm clipping threshold (0 = no clipping).
    #[config(default = 10.0)]
    pub max_grad_norm: f64,

    /// Exponential learning-rate decay applied after each epoch.
    #[config(default = 0.99)]
    pub lr_decay: f64,

    /// Batch size for training.
    #[config(default = 8)]
    pub train_batch_size: usize,

    /// Batch size for validation.
    #[config(default = 1)]
    pub val_batch_size: usize,

    /// Number of epochs.
    #[config(default = 100)]
    pub max_epochs: usize,

    /// Iterations between training log lines.
    #[config(default = 10)]
    pub log_interval: usize,

    /// Write run directory, telemetry and checkpoints.
    #[config(default = true)]
    pub logging: bool,

    /// Root directory for run directories.
    #[config(default = "String::from(\"./logs\")")]
    pub log_root: String,

    /// Suffix appended to the run directory name.
    pub tag: Option<String>,
}

impl TrainingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.model.validate()?;
        self.train_dataset
            .validate()
            .map_err(|e| format!("train_dataset: {}", e))?;
        self.val_dataset
            .validate()
            .map_err(|e| format!("val_dataset: {}", e))?;
        self.langevin.validate()?;

        if !(self.lr > 0.0 && self.lr <= 1.0) {
            return Err("lr must lie in (0, 1]".to_string());
        }
        if self.weight_decay < 0.0 {
            return Err("weight_decay must be non-negative".to_string());
        }
        if self.max_grad_norm < 0.0 {
            return Err("max_grad_norm must be non-negative".to_string());
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return Err("lr_decay must lie in (0, 1]".to_string());
        }
        if self.train_batch_size == 0 || self.val_batch_size == 0 {
            return Err("batch sizes must be positive".to_string());
        }
        if self.log_interval == 0 {
            return Err("log_interval must be positive".to_string());
        }

        Ok(())
    }
}

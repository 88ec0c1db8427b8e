//! # mbes_denoise
//!
//! Learned denoising of multibeam echosounder (MBES) point clouds with Burn.
//!
//! A network predicts, for every noisy sounding, the displacement towards the
//! clean seafloor. It is trained with a masked supervised loss against
//! `clean - noisy` and applied at validation time through an iterative,
//! decaying-step Langevin denoiser.
//!
//! ## Features
//!
//! - **Noise transforms**: `none`, `add_noise_to_clean`, `add_noise_to_noisy`
//! - **Padded batches**: per-sample lengths and a validity mask, padding never
//!   contributes to the loss or to valid predictions
//! - **Langevin denoiser**: geometric or explicit step schedules, optional
//!   seeded noise term
//! - **Training session**: Adam, exponential LR decay, Chamfer and
//!   point-correspondence validation, checkpoints, CSV telemetry,
//!   cooperative cancellation
//!
//! ## Quick Start
//!
//! ```ignore
//! use mbes_denoise::{config::TrainingConfig, training::session_from_config};
//! use burn::backend::{Autodiff, NdArray};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let config = TrainingConfig::load("train.json")?;
//! let device = Default::default();
//! let mut session = session_from_config::<MyBackend>(config, &device)?;
//! session.run()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! mbes_core (points, Chamfer, correspondence)
//!     │
//!     ▼
//! mbes_denoise
//!   data ──► training::collate ──► nn::DenoiseNet ──► loss::SupervisedLoss
//!                                        │
//!                                        ▼
//!                          denoise::LangevinDenoiser ──► metrics
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod data;
pub mod denoise;
pub mod error;
pub mod loss;
pub mod nn;
pub mod training;

pub use config::{DatasetConfig, LangevinConfig, NoiseTransformKind, TrainingConfig};
pub use denoise::{DisplacementModel, LangevinDenoiser, StepSchedule};
pub use error::{DenoiseError, Result};
pub use nn::DenoiseNet;
pub use training::{RunOutcome, TrainingSession};

pub use mbes_core::Point3;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        DatasetConfig, DenoiseNetConfig, LangevinConfig, LossNorm, NoiseTransformKind,
        SupervisedLossConfig, TrainingConfig,
    };
    pub use crate::data::{
        load_pings, points_to_tensor, tensor_to_points, MbesPatchDataset, NoiseTransform,
        PatchSample, Ping,
    };
    pub use crate::denoise::{DisplacementModel, LangevinDenoiser, StepSchedule};
    pub use crate::error::{DenoiseError, Result};
    pub use crate::loss::SupervisedLoss;
    pub use crate::nn::DenoiseNet;
    pub use crate::training::{
        collate, session_from_config, CancellationToken, CheckpointManager, MbesBatch,
        PatchLoader, RunOutcome, ScalarSink, TrainingSession, ValidationReport,
    };

    pub use mbes_core::Point3;
}

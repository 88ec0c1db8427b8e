//! Configuration types for mbes_denoise.
//!
//! Every struct here is a Burn `Config`: JSON load/save plus `with_*` builders.
//! The whole run is described by a single [`TrainingConfig`].

mod dataset;
mod langevin;
mod network;
mod training;

pub use dataset::{DatasetConfig, NoiseTransformKind};
pub use langevin::LangevinConfig;
pub use network::DenoiseNetConfig;
pub use training::{LossNorm, SupervisedLossConfig, TrainingConfig};

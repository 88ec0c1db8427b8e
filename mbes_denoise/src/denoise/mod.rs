//! Inference-time denoising.

mod langevin;
mod schedule;

pub use langevin::{DisplacementModel, LangevinDenoiser, LangevinNoise};
pub use schedule::StepSchedule;

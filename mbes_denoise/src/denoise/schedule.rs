//! Step-size schedules for the Langevin denoiser.

use crate::config::LangevinConfig;
use crate::error::{DenoiseError, Result};

/// Non-increasing, non-negative sequence of step sizes `η_0 >= η_1 >= ... >= 0`.
///
/// Its length is the number of denoising steps.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule {
    steps: Vec<f32>,
}

impl StepSchedule {
    /// Geometric schedule `η_t = step_size * decay^t` for `t < num_steps`.
    pub fn geometric(step_size: f32, decay: f32, num_steps: usize) -> Result<Self> {
        if !step_size.is_finite() || step_size < 0.0 {
            return Err(DenoiseError::config(format!(
                "step size must be finite and non-negative, got {}",
                step_size
            )));
        }
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(DenoiseError::config(format!(
                "step decay must lie in (0, 1], got {}",
                decay
            )));
        }

        let mut steps = Vec::with_capacity(num_steps);
        let mut eta = step_size;
        for _ in 0..num_steps {
            steps.push(eta);
            eta *= decay;
        }
        Ok(Self { steps })
    }

    /// Schedule described by a Langevin configuration.
    pub fn from_config(config: &LangevinConfig) -> Result<Self> {
        Self::geometric(config.ld_step_size, config.ld_step_decay, config.ld_num_steps)
    }

    /// Explicit schedule, validated as non-increasing and non-negative.
    pub fn explicit(steps: Vec<f32>) -> Result<Self> {
        if let Some(bad) = steps.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(DenoiseError::config(format!(
                "step sizes must be finite and non-negative, got {}",
                bad
            )));
        }
        if let Some(t) = steps.windows(2).position(|w| w[1] > w[0]) {
            return Err(DenoiseError::config(format!(
                "step schedule increases at step {}: {} -> {}",
                t + 1,
                steps[t],
                steps[t + 1]
            )));
        }
        Ok(Self { steps })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for a zero-step schedule.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step sizes in order.
    pub fn steps(&self) -> &[f32] {
        &self.steps
    }
}

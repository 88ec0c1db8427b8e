//! Langevin denoiser configuration.

use burn::config::Config;

/// Configuration for the iterative Langevin denoiser used at validation time.
///
/// The step size at step `t` is `ld_step_size * ld_step_decay^t`.
#[derive(Config, Debug)]
pub struct LangevinConfig {
    /// Step size of the first update.
    #[config(default = 0.5)]
    pub ld_step_size: f32,

    /// Number of updates; the denoiser always runs exactly this many.
    #[config(default = 5)]
    pub ld_num_steps: usize,

    /// Multiplicative decay applied to the step size after every update.
    #[config(default = 0.5)]
    pub ld_step_decay: f32,

    /// Inject Gaussian noise after each update.
    #[config(default = false)]
    pub ld_noise: bool,

    /// Scale of the injected noise, multiplied by `sqrt(2 * step_size)`.
    #[config(default = 0.01)]
    pub ld_noise_scale: f32,

    /// Seed for the injected noise.
    #[config(default = 2024)]
    pub ld_seed: u64,
}

impl Default for LangevinConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LangevinConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.ld_step_size.is_finite() || self.ld_step_size < 0.0 {
            return Err("ld_step_size must be finite and non-negative".to_string());
        }
        if !(self.ld_step_decay > 0.0 && self.ld_step_decay <= 1.0) {
            return Err("ld_step_decay must lie in (0, 1]".to_string());
        }
        if self.ld_noise && (!self.ld_noise_scale.is_finite() || self.ld_noise_scale < 0.0) {
            return Err("ld_noise_scale must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

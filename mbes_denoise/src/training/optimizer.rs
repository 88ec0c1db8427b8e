//! Optimizer construction, learning-rate schedule and gradient clipping.

use burn::lr_scheduler::exponential::{ExponentialLrScheduler, ExponentialLrSchedulerConfig};
use burn::lr_scheduler::LrScheduler;
use burn::module::{AutodiffModule, ModuleVisitor, ParamId};
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::LearningRate;

use crate::config::TrainingConfig;
use crate::error::{DenoiseError, Result};
use crate::nn::DenoiseNet;

/// Burn's exponential scheduler stepped once per epoch, `lr_e = initial * gamma^e`.
#[derive(Debug, Clone, Copy)]
pub struct EpochLrScheduler {
    scheduler: ExponentialLrScheduler,
    lr: LearningRate,
    epoch: usize,
}

impl EpochLrScheduler {
    /// Create a schedule at epoch 0. Both `initial` and `gamma` must lie in `(0, 1]`.
    pub fn new(initial: LearningRate, gamma: f64) -> Result<Self> {
        let mut scheduler = ExponentialLrSchedulerConfig::new(initial, gamma)
            .init()
            .map_err(DenoiseError::config)?;
        let lr = scheduler.step();
        Ok(Self {
            scheduler,
            lr,
            epoch: 0,
        })
    }

    /// Schedule described by `lr` and `lr_decay`.
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        Self::new(config.lr, config.lr_decay)
    }

    /// Learning rate of the current epoch.
    pub fn lr(&self) -> LearningRate {
        self.lr
    }

    /// Advance by one epoch.
    pub fn step(&mut self) {
        self.lr = self.scheduler.step();
        self.epoch += 1;
    }

    /// Epochs stepped so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Scheduler state to persist with a checkpoint.
    pub fn to_record<B: Backend>(&self) -> LearningRate {
        self.scheduler.to_record::<B>()
    }

    /// Restore the scheduler state and the epoch counter.
    pub fn load_record<B: Backend>(mut self, record: LearningRate, epoch: usize) -> Self {
        self.scheduler = self.scheduler.load_record::<B>(record);
        self.lr = record;
        self.epoch = epoch;
        self
    }
}

/// Adam configuration with weight decay.
///
/// Gradients are clipped by their global norm with [`clip_grad_norm`] before
/// the step, so no per-parameter clipping is configured here.
pub fn adam_config(config: &TrainingConfig) -> AdamConfig {
    let weight_decay = (config.weight_decay > 0.0)
        .then(|| WeightDecayConfig::new(config.weight_decay as f32));

    AdamConfig::new().with_weight_decay(weight_decay)
}

/// Build the optimizer for the denoising network.
pub fn build_optimizer<B: AutodiffBackend>(
    config: &TrainingConfig,
) -> impl Optimizer<DenoiseNet<B>, B> {
    adam_config(config).init::<B, DenoiseNet<B>>()
}

struct SquaredNorm<'a> {
    grads: &'a GradientsParams,
    sum: f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.sum += (grad.clone() * grad).sum().into_scalar().elem::<f64>();
        }
    }
}

struct ScaleGrads<'a> {
    grads: &'a mut GradientsParams,
    scale: f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for ScaleGrads<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register(id, grad.mul_scalar(self.scale));
        }
    }
}

/// L2 norm of all gradients of `module` taken together.
pub fn grad_norm<B, M>(module: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = SquaredNorm { grads, sum: 0.0 };
    module.visit(&mut visitor);
    visitor.sum.sqrt()
}

/// Rescale all gradients together so that their global norm is at most
/// `max_norm`. Returns the norm before clipping. `max_norm <= 0` disables clipping.
pub fn clip_grad_norm<B, M>(module: &M, grads: &mut GradientsParams, max_norm: f64) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm = grad_norm::<B, M>(module, grads);
    if max_norm > 0.0 && norm > max_norm {
        let mut visitor = ScaleGrads {
            grads,
            scale: max_norm / (norm + 1e-6),
        };
        module.visit(&mut visitor);
    }
    norm
}

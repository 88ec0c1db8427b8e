//! Training orchestrator.

use std::path::{Path, PathBuf};

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::config::TrainingConfig;
use crate::data::MbesPatchDataset;
use crate::denoise::LangevinDenoiser;
use crate::error::{DenoiseError, Result};
use crate::loss::SupervisedLoss;
use crate::nn::DenoiseNet;

use super::batch::{MbesBatch, PatchLoader};
use super::cancel::CancellationToken;
use super::checkpoint::{load_checkpoint, CheckpointManager, CheckpointMetadata};
use super::metrics::{SampleMetrics, TrainMetrics, TrainWindow, ValidationReport};
use super::optimizer::{build_optimizer, clip_grad_norm, EpochLrScheduler};
use super::run_dir::create_run_dir;
use super::telemetry::{BlackHole, CsvScalarWriter, ScalarSink};

/// How a call to [`TrainingSession::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All epochs finished.
    Completed,
    /// The cancellation token was observed.
    Interrupted,
}

/// All mutable training state: model, optimizer, schedule, loaders,
/// checkpointing and telemetry.
pub struct TrainingSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<DenoiseNet<B>, B>,
{
    config: TrainingConfig,
    model: DenoiseNet<B>,
    optim: O,
    scheduler: EpochLrScheduler,
    loss: SupervisedLoss,
    denoiser: LangevinDenoiser,
    train_loader: PatchLoader,
    val_loader: PatchLoader,
    checkpoints: Option<CheckpointManager>,
    sink: Box<dyn ScalarSink + Send>,
    cancel: CancellationToken,
    run_dir: Option<PathBuf>,
    step: usize,
    device: B::Device,
}

/// Build a session from configuration: load both datasets, initialize the
/// network and Adam, and when `config.logging` is set create the run
/// directory with its CSV telemetry and checkpoints.
pub fn session_from_config<B: AutodiffBackend>(
    config: TrainingConfig,
    device: &B::Device,
) -> Result<TrainingSession<B, impl Optimizer<DenoiseNet<B>, B>>> {
    config.validate().map_err(DenoiseError::config)?;

    log::info!("Loading datasets...");
    let train_set = MbesPatchDataset::from_config(&config.train_dataset)?;
    let val_set = MbesPatchDataset::from_config(&config.val_dataset)?;

    log::info!("Building model...");
    let model = config.model.init::<B>(device);
    let optim = build_optimizer::<B>(&config);

    let mut session = TrainingSession::new(config, model, optim, train_set, val_set, device)?;

    if session.config.logging {
        let run_dir = create_run_dir(&session.config)?;
        session = session
            .with_sink(CsvScalarWriter::create(&run_dir)?)
            .with_checkpoints(CheckpointManager::new(run_dir.join("checkpoints"))?);
        session.run_dir = Some(run_dir);
    } else {
        log::info!("Logging disabled; no run directory or checkpoints will be written");
    }

    Ok(session)
}

impl<B, O> TrainingSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<DenoiseNet<B>, B>,
{
    /// Create a session without telemetry or checkpoints.
    pub fn new(
        config: TrainingConfig,
        model: DenoiseNet<B>,
        optim: O,
        train_set: MbesPatchDataset,
        val_set: MbesPatchDataset,
        device: &B::Device,
    ) -> Result<Self> {
        config.validate().map_err(DenoiseError::config)?;

        let denoiser = LangevinDenoiser::from_config(&config.langevin)?;
        let train_loader =
            PatchLoader::new(train_set, config.train_batch_size, true, config.seed)?;
        let val_loader =
            PatchLoader::new(val_set, config.val_batch_size, false, config.seed.wrapping_add(1))?;

        Ok(Self {
            scheduler: EpochLrScheduler::from_config(&config)?,
            loss: SupervisedLoss::new(config.loss.clone()),
            denoiser,
            train_loader,
            val_loader,
            checkpoints: None,
            sink: Box::new(BlackHole),
            cancel: CancellationToken::new(),
            run_dir: None,
            step: 0,
            device: device.clone(),
            config,
            model,
            optim,
        })
    }

    /// Send scalars to `sink`.
    pub fn with_sink(mut self, sink: impl ScalarSink + Send + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Write checkpoints after every validation pass.
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    /// Observe `token` at iteration boundaries.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Restore model, optimizer, step and schedule from a checkpoint.
    pub fn resume(mut self, checkpoint_dir: &Path) -> Result<Self> {
        let (model, optim, scheduler, metadata) = load_checkpoint(
            checkpoint_dir,
            self.model,
            self.optim,
            self.scheduler,
            &self.device,
        )?;
        self.model = model;
        self.optim = optim;
        self.scheduler = scheduler;
        self.step = metadata.step;
        log::info!(
            "Resumed at step {} (epoch {}, lr {:.2e})",
            self.step,
            self.scheduler.epoch(),
            self.scheduler.lr()
        );
        Ok(self)
    }

    /// Configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Current model.
    pub fn model(&self) -> &DenoiseNet<B> {
        &self.model
    }

    /// Consume the session, returning the model.
    pub fn into_model(self) -> DenoiseNet<B> {
        self.model
    }

    /// Global optimizer step.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Learning-rate schedule.
    pub fn scheduler(&self) -> &EpochLrScheduler {
        &self.scheduler
    }

    /// Run directory, when logging is enabled.
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    /// Checkpoint manager, when checkpoints are enabled.
    pub fn checkpoints(&self) -> Option<&CheckpointManager> {
        self.checkpoints.as_ref()
    }

    /// One optimizer step on a batch; returns the loss and the gradient norm
    /// before the update. Gradients are clipped to `max_grad_norm` globally.
    pub fn train_step(&mut self, batch: &MbesBatch<B>) -> Result<TrainMetrics> {
        let pred = self
            .model
            .forward(batch.pcl_noisy.clone(), batch.mask.clone());
        let loss = self.loss.forward(
            pred,
            batch.pcl_noisy.clone(),
            batch.pcl_clean.clone(),
            batch.mask.clone(),
        );
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let lr = self.scheduler.lr();
        let grads = loss.backward();
        let mut grads = GradientsParams::from_grads(grads, &self.model);
        let grad_norm =
            clip_grad_norm::<B, _>(&self.model, &mut grads, self.config.max_grad_norm);
        self.model = self.optim.step(lr, self.model.clone(), grads);
        self.step += 1;

        Ok(TrainMetrics::new(self.step, loss_value, grad_norm, lr))
    }

    /// One pass over the training set.
    ///
    /// Every `log_interval` steps the loss and gradient norm averaged since
    /// the previous report are logged and sent to the sink. The window
    /// restarts with each epoch.
    ///
    /// Returns `false` if cancelled before the epoch finished.
    pub fn train_epoch(&mut self) -> Result<bool> {
        let mut window = TrainWindow::new();
        for indices in self.train_loader.epoch_indices() {
            if self.cancel.is_cancelled() {
                return Ok(false);
            }
            let batch = self.train_loader.load_batch::<B>(&indices, &self.device)?;
            let metrics = self.train_step(&batch)?;
            window.push(&metrics);

            if metrics.step % self.config.log_interval == 0 {
                if let Some(averaged) = window.take(&metrics) {
                    self.report_train(&averaged)?;
                }
            }
        }
        Ok(true)
    }

    fn report_train(&mut self, metrics: &TrainMetrics) -> Result<()> {
        metrics.log();
        self.sink.add_scalar("train/loss", metrics.loss as f64, metrics.step)?;
        self.sink.add_scalar("train/grad_norm", metrics.grad_norm, metrics.step)?;
        self.sink.add_scalar("train/lr", metrics.learning_rate, metrics.step)?;
        Ok(())
    }

    /// Denoise every validation patch with the Langevin denoiser and score it.
    ///
    /// Returns `None` if cancelled before the pass finished.
    pub fn validate(&mut self) -> Result<Option<ValidationReport>> {
        let model = self.model.valid();
        let mut samples = Vec::with_capacity(self.val_loader.dataset().len());

        for indices in self.val_loader.epoch_indices() {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            let batch = self
                .val_loader
                .load_batch::<B::InnerBackend>(&indices, &self.device)?;

            for (noisy, clean) in batch.unpad()? {
                let denoised = self
                    .denoiser
                    .denoise_points::<B::InnerBackend, _>(&model, &noisy, &self.device)?;
                samples.push(SampleMetrics::evaluate(&denoised, &clean)?);
            }
        }

        let report = ValidationReport::new(self.step, samples);
        if report.is_empty() {
            log::warn!("Validation set is empty");
        }
        report.log();
        self.sink.add_scalar("val/chamfer", report.chamfer() as f64, self.step)?;
        self.sink.add_scalar("val/diff", report.diff() as f64, self.step)?;
        Ok(Some(report))
    }

    fn save_checkpoint(&self, report: &ValidationReport) -> Result<()> {
        let Some(manager) = &self.checkpoints else {
            return Ok(());
        };
        let score = Some(report.score()).filter(|s| s.is_finite());
        let metadata = CheckpointMetadata::new(self.step, self.scheduler.lr(), self.scheduler.epoch())
            .with_score(score);
        manager.save(&self.model, &self.optim, &self.scheduler, &self.config, &metadata)?;
        Ok(())
    }

    fn terminate(&mut self) -> Result<RunOutcome> {
        log::info!("Terminating...");
        self.sink.flush()?;
        Ok(RunOutcome::Interrupted)
    }

    /// Train until `max_epochs`, validating and checkpointing after every epoch.
    pub fn run(&mut self) -> Result<RunOutcome> {
        log::info!(
            "Start training: {} train / {} val patches, {} epochs",
            self.train_loader.dataset().len(),
            self.val_loader.dataset().len(),
            self.config.max_epochs
        );

        while self.scheduler.epoch() < self.config.max_epochs {
            if self.cancel.is_cancelled() || !self.train_epoch()? {
                return self.terminate();
            }
            let Some(report) = self.validate()? else {
                return self.terminate();
            };
            self.scheduler.step();
            self.save_checkpoint(&report)?;
            self.sink.flush()?;

            log::info!(
                "Epoch {}/{} done | lr {:.2e}",
                self.scheduler.epoch(),
                self.config.max_epochs,
                self.scheduler.lr()
            );
        }

        self.sink.flush()?;
        log::info!("Training finished at step {}", self.step);
        Ok(RunOutcome::Completed)
    }
}

//! Checkpoint save/load for training resumption.
//!
//! Each checkpoint is a `checkpoint_<step>` directory holding
//! `metadata.json`, `config.json`, `model.bin`, `optimizer.bin` and
//! `scheduler.bin`.

use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use burn::module::Module;
use burn::optim::Optimizer;
use burn::record::{BinFileRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::AutodiffBackend;

use crate::config::TrainingConfig;
use crate::error::{self, DenoiseError};
use crate::nn::DenoiseNet;

use super::optimizer::EpochLrScheduler;

const METADATA_FILE: &str = "metadata.json";
const CONFIG_FILE: &str = "config.json";
const MODEL_FILE: &str = "model";
const OPTIMIZER_FILE: &str = "optimizer";
const SCHEDULER_FILE: &str = "scheduler";

/// Checkpoint metadata stored as JSON.
#[derive(Config, Debug)]
pub struct CheckpointMetadata {
    /// Global optimizer step.
    pub step: usize,
    /// Learning rate at save time.
    pub learning_rate: f64,
    /// Completed epochs; training resumes at this epoch.
    pub epoch: usize,
    /// Validation score, lower is better. `None` if validation produced no finite value.
    pub score: Option<f32>,
    /// Checkpoint format version.
    #[config(default = 1)]
    pub version: u32,
}

type CheckpointRecorder = BinFileRecorder<FullPrecisionSettings>;

fn checkpoint_error(what: &str, dir: &Path, err: impl std::fmt::Debug) -> DenoiseError {
    DenoiseError::checkpoint(format!("{} in {}: {:?}", what, dir.display(), err))
}

/// Save a checkpoint into `dir`.
pub fn save_checkpoint<B, O>(
    dir: &Path,
    model: &DenoiseNet<B>,
    optim: &O,
    scheduler: &EpochLrScheduler,
    config: &TrainingConfig,
    metadata: &CheckpointMetadata,
) -> error::Result<()>
where
    B: AutodiffBackend,
    O: Optimizer<DenoiseNet<B>, B>,
{
    fs::create_dir_all(dir)?;

    let recorder = CheckpointRecorder::new();
    model
        .clone()
        .save_file(dir.join(MODEL_FILE), &recorder)
        .map_err(|e| checkpoint_error("saving model", dir, e))?;
    Recorder::<B>::record(&recorder, optim.to_record(), dir.join(OPTIMIZER_FILE))
        .map_err(|e| checkpoint_error("saving optimizer", dir, e))?;
    Recorder::<B>::record(&recorder, scheduler.to_record::<B>(), dir.join(SCHEDULER_FILE))
        .map_err(|e| checkpoint_error("saving scheduler", dir, e))?;
    config.save(dir.join(CONFIG_FILE))?;
    // Metadata last: its presence marks the checkpoint as complete.
    metadata.save(dir.join(METADATA_FILE))?;

    log::info!(
        "Saved checkpoint to {:?} (step {}, score {:?})",
        dir,
        metadata.step,
        metadata.score
    );
    Ok(())
}

/// Load a checkpoint into an existing model, optimizer and scheduler.
pub fn load_checkpoint<B, O>(
    dir: &Path,
    model: DenoiseNet<B>,
    optim: O,
    scheduler: EpochLrScheduler,
    device: &B::Device,
) -> error::Result<(DenoiseNet<B>, O, EpochLrScheduler, CheckpointMetadata)>
where
    B: AutodiffBackend,
    O: Optimizer<DenoiseNet<B>, B>,
{
    let metadata = load_metadata(dir)?;

    let recorder = CheckpointRecorder::new();
    let model = model
        .load_file(dir.join(MODEL_FILE), &recorder, device)
        .map_err(|e| checkpoint_error("loading model", dir, e))?;
    let record: O::Record = Recorder::<B>::load(&recorder, dir.join(OPTIMIZER_FILE), device)
        .map_err(|e| checkpoint_error("loading optimizer", dir, e))?;
    let optim = optim.load_record(record);
    let lr_record: f64 = Recorder::<B>::load(&recorder, dir.join(SCHEDULER_FILE), device)
        .map_err(|e| checkpoint_error("loading scheduler", dir, e))?;
    let scheduler = scheduler.load_record::<B>(lr_record, metadata.epoch);

    log::info!("Loaded checkpoint from {:?} (step {})", dir, metadata.step);
    Ok((model, optim, scheduler, metadata))
}

/// Read only the metadata of a checkpoint.
pub fn load_metadata(dir: &Path) -> error::Result<CheckpointMetadata> {
    CheckpointMetadata::load(dir.join(METADATA_FILE))
        .map_err(|e| checkpoint_error("reading metadata", dir, e))
}

/// Check if a complete checkpoint exists at the given path.
pub fn checkpoint_exists(dir: &Path) -> bool {
    dir.join(METADATA_FILE).exists()
        && dir.join(CONFIG_FILE).exists()
        && dir.join(format!("{}.bin", MODEL_FILE)).exists()
        && dir.join(format!("{}.bin", OPTIMIZER_FILE)).exists()
        && dir.join(format!("{}.bin", SCHEDULER_FILE)).exists()
}

/// Complete `checkpoint_<step>` directories under `base_dir`, sorted by step.
pub fn list_checkpoints(base_dir: &Path) -> Vec<(usize, PathBuf)> {
    let mut found = Vec::new();

    if let Ok(entries) = fs::read_dir(base_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let step = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("checkpoint_"))
                .and_then(|s| s.parse::<usize>().ok());
            if let Some(step) = step {
                if path.is_dir() && checkpoint_exists(&path) {
                    found.push((step, path));
                }
            }
        }
    }

    found.sort_by_key(|(step, _)| *step);
    found
}

/// Get the checkpoint with the highest step.
pub fn find_latest_checkpoint(base_dir: &Path) -> Option<PathBuf> {
    list_checkpoints(base_dir).pop().map(|(_, path)| path)
}

/// Get the checkpoint with the lowest score; ties go to the later step.
pub fn find_best_checkpoint(base_dir: &Path) -> Option<(PathBuf, CheckpointMetadata)> {
    let mut best: Option<(PathBuf, CheckpointMetadata)> = None;

    for (_, path) in list_checkpoints(base_dir) {
        let Ok(metadata) = load_metadata(&path) else {
            continue;
        };
        let Some(score) = metadata.score.filter(|s| s.is_finite()) else {
            continue;
        };
        let better = match best.as_ref().and_then(|(_, m)| m.score) {
            Some(best_score) => score <= best_score,
            None => true,
        };
        if better {
            best = Some((path, metadata));
        }
    }

    best
}

/// Writes numbered checkpoints under one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> error::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Base directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory used for a given step.
    pub fn checkpoint_dir(&self, step: usize) -> PathBuf {
        self.dir.join(format!("checkpoint_{}", step))
    }

    /// Save a checkpoint for `metadata.step`.
    pub fn save<B, O>(
        &self,
        model: &DenoiseNet<B>,
        optim: &O,
        scheduler: &EpochLrScheduler,
        config: &TrainingConfig,
        metadata: &CheckpointMetadata,
    ) -> error::Result<PathBuf>
    where
        B: AutodiffBackend,
        O: Optimizer<DenoiseNet<B>, B>,
    {
        let dir = self.checkpoint_dir(metadata.step);
        save_checkpoint(&dir, model, optim, scheduler, config, metadata)?;
        Ok(dir)
    }

    /// Latest checkpoint directory.
    pub fn latest(&self) -> Option<PathBuf> {
        find_latest_checkpoint(&self.dir)
    }

    /// Best-scoring checkpoint.
    pub fn best(&self) -> Option<(PathBuf, CheckpointMetadata)> {
        find_best_checkpoint(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_stub(dir: &Path, step: usize, score: Option<f32>) {
        fs::create_dir_all(dir).unwrap();
        CheckpointMetadata::new(step, 1e-4, 0)
            .with_score(score)
            .save(dir.join(METADATA_FILE))
            .unwrap();
        fs::write(dir.join(CONFIG_FILE), "{}").unwrap();
        fs::write(dir.join("model.bin"), "").unwrap();
        fs::write(dir.join("optimizer.bin"), "").unwrap();
        fs::write(dir.join("scheduler.bin"), "").unwrap();
    }

    #[test]
    fn test_metadata_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let metadata = CheckpointMetadata::new(1200, 5e-5, 3).with_score(Some(0.0125));
        metadata.save(dir.path().join(METADATA_FILE)).unwrap();

        let parsed = load_metadata(dir.path()).unwrap();
        assert_eq!(parsed.step, 1200);
        assert_eq!(parsed.epoch, 3);
        assert_eq!(parsed.score, Some(0.0125));
        assert_eq!(parsed.version, 1);
    }

    #[test]
    fn test_find_latest_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path();

        for step in [5, 10, 3, 15] {
            write_stub(&base_path.join(format!("checkpoint_{}", step)), step, Some(1.0));
        }
        // Incomplete checkpoint is skipped.
        fs::create_dir_all(base_path.join("checkpoint_20")).unwrap();

        let latest = find_latest_checkpoint(base_path);
        assert!(latest.unwrap().ends_with("checkpoint_15"));
        assert_eq!(list_checkpoints(base_path).len(), 4);
    }

    #[test]
    fn test_find_best_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let manager = CheckpointManager::new(temp_dir.path().join("ckpts")).unwrap();

        write_stub(&manager.checkpoint_dir(10), 10, Some(0.3));
        write_stub(&manager.checkpoint_dir(20), 20, Some(0.1));
        write_stub(&manager.checkpoint_dir(30), 30, None);
        write_stub(&manager.checkpoint_dir(40), 40, Some(0.2));

        let (path, metadata) = manager.best().unwrap();
        assert!(path.ends_with("checkpoint_20"));
        assert_eq!(metadata.step, 20);
        assert!(manager.latest().unwrap().ends_with("checkpoint_40"));
    }

    #[test]
    fn test_missing_metadata_is_checkpoint_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_metadata(temp_dir.path()).unwrap_err();
        assert!(matches!(err, DenoiseError::Checkpoint { .. }));
    }
}

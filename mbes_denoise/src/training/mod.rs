//! Training infrastructure for displacement learning.
//!
//! This module provides:
//! - `TrainingSession`: epochs, optimizer steps, validation and checkpointing
//! - Collation of padded batches and a seeded patch loader
//! - Training and validation metrics, scalar telemetry sinks
//! - Checkpoint save/load for training resumption
//! - Cooperative cancellation

mod batch;
mod cancel;
mod checkpoint;
mod metrics;
mod optimizer;
mod run_dir;
mod session;
mod telemetry;

pub use batch::{collate, collate_with_capacity, MbesBatch, PatchLoader};
pub use cancel::CancellationToken;
pub use checkpoint::{
    checkpoint_exists, find_best_checkpoint, find_latest_checkpoint, list_checkpoints,
    load_checkpoint, load_metadata, save_checkpoint, CheckpointManager,
    CheckpointMetadata,
};
pub use metrics::{SampleMetrics, TrainMetrics, TrainWindow, ValidationReport};
pub use optimizer::{adam_config, build_optimizer, clip_grad_norm, grad_norm, EpochLrScheduler};
pub use run_dir::{create_run_dir, create_run_dir_at, run_dir_name, RUN_PREFIX};
pub use session::{session_from_config, RunOutcome, TrainingSession};
pub use telemetry::{BlackHole, CsvScalarWriter, MemorySink, ScalarRecord, ScalarSink};

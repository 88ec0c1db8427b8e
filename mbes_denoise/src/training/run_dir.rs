//! Per-run log directories.

use std::fs;
use std::path::{Path, PathBuf};

use burn::config::Config;
use chrono::{DateTime, Local};

use crate::config::TrainingConfig;
use crate::error::Result;

/// Prefix of every run directory name.
pub const RUN_PREFIX: &str = "MBES";

/// Directory name `MBES_<timestamp>[_<tag>]`.
pub fn run_dir_name(timestamp: DateTime<Local>, tag: Option<&str>) -> String {
    let mut name = format!("{}_{}", RUN_PREFIX, timestamp.format("%Y_%m_%d__%H_%M_%S"));
    if let Some(tag) = tag.filter(|t| !t.is_empty()) {
        name.push('_');
        name.push_str(tag);
    }
    name
}

/// Create the run directory under `config.log_root` and save the configuration there.
pub fn create_run_dir(config: &TrainingConfig) -> Result<PathBuf> {
    create_run_dir_at(Path::new(&config.log_root), config, Local::now())
}

/// Create a run directory for an explicit timestamp.
pub fn create_run_dir_at(
    log_root: &Path,
    config: &TrainingConfig,
    timestamp: DateTime<Local>,
) -> Result<PathBuf> {
    let dir = log_root.join(run_dir_name(timestamp, config.tag.as_deref()));
    fs::create_dir_all(&dir)?;
    config.save(dir.join("config.json"))?;
    log::info!("Run directory: {}", dir.display());
    Ok(dir)
}

//! Train the MBES denoising network from a JSON configuration.
//!
//! ```text
//! RUST_LOG=info train_mbes --config configs/mbes.json --tag ppp32
//! ```
//!
//! Ctrl-C stops training at the next iteration boundary; the last written
//! checkpoint stays intact.

use std::path::PathBuf;

use anyhow::Context;
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use burn::tensor::backend::Backend;
use clap::Parser;

use mbes_denoise::config::TrainingConfig;
use mbes_denoise::training::{
    find_latest_checkpoint, session_from_config, CancellationToken, RunOutcome,
};

type TrainBackend = Autodiff<NdArray>;

/// Train the MBES denoising network.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Training configuration (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Override `max_epochs`.
    #[arg(long)]
    max_epochs: Option<usize>,

    /// Disable the run directory, telemetry and checkpoints.
    #[arg(long)]
    no_logging: bool,

    /// Suffix appended to the run directory name.
    #[arg(long)]
    tag: Option<String>,

    /// Resume from a checkpoint directory, or from the latest checkpoint
    /// under a `checkpoints` directory.
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<TrainingConfig> {
    let mut config = TrainingConfig::load(&args.config)
        .map_err(|e| anyhow::anyhow!("{:?}", e))
        .with_context(|| format!("reading {}", args.config.display()))?;

    if let Some(max_epochs) = args.max_epochs {
        config.max_epochs = max_epochs;
    }
    if args.no_logging {
        config.logging = false;
    }
    if args.tag.is_some() {
        config.tag = args.tag.clone();
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    log::info!("Config: {}", config);

    let device = NdArrayDevice::Cpu;
    TrainBackend::seed(config.seed);

    let token = CancellationToken::new();
    let mut session = session_from_config::<TrainBackend>(config, &device)?
        .with_cancellation(token.clone());

    if let Some(resume) = &args.resume {
        let dir = if resume.join("metadata.json").exists() {
            resume.clone()
        } else {
            find_latest_checkpoint(resume)
                .with_context(|| format!("no checkpoint under {}", resume.display()))?
        };
        session = session.resume(&dir)?;
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping at the next iteration");
            token.cancel();
        }
    });

    let outcome = tokio::task::spawn_blocking(move || session.run()).await??;
    match outcome {
        RunOutcome::Completed => log::info!("Done"),
        RunOutcome::Interrupted => log::info!("Stopped early"),
    }
    Ok(())
}

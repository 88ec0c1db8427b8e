//! Example: learning to denoise a synthetic MBES swath.
//!
//! 1. Simulate a rippled seafloor surveyed as a sequence of pings
//! 2. Train the displacement network on `add_noise_to_clean` patches
//! 3. Denoise a held-out noisy patch with the Langevin denoiser
//! 4. Compare Chamfer and point-correspondence distances before and after
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p mbes_denoise --example denoise_synthetic --release
//! ```

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use mbes_core::{chamfer_distance, point_correspondence_distance};
use mbes_denoise::prelude::*;
use mbes_denoise::training::build_optimizer;

type MyBackend = Autodiff<NdArray>;

const NUM_PINGS: usize = 64;
const BEAMS_PER_PING: usize = 24;
const NOISE_STD: f32 = 0.05;

/// Rippled seafloor at roughly 25 m depth, sounded across track.
fn simulate_swath(num_pings: usize, beams: usize) -> Vec<Ping> {
    (0..num_pings)
        .map(|p| {
            let y = p as f32 * 0.5;
            (0..beams)
                .map(|b| {
                    let x = (b as f32 - beams as f32 / 2.0) * 0.4;
                    let z = -25.0 + 0.3 * (0.6 * x).sin() + 0.2 * (0.15 * y).cos();
                    Point3::new(x, y, z)
                })
                .collect()
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = NdArrayDevice::Cpu;

    println!("═══════════════════════════════════════════════════════════════");
    println!("          MBES Denoising on a Synthetic Swath");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    // Survey
    let pings = simulate_swath(NUM_PINGS, BEAMS_PER_PING);
    let train_pings = &pings[..48];
    let val_pings = &pings[48..];

    println!("  Pings:           {} ({} train / {} val)", pings.len(), train_pings.len(), val_pings.len());
    println!("  Beams per ping:  {}", BEAMS_PER_PING);
    println!("  Noise sigma:     {:.3} m", NOISE_STD);
    println!();

    // Configuration
    let train_cfg = DatasetConfig::new("synthetic".into(), "synthetic".into())
        .with_transform(NoiseTransformKind::AddNoiseToClean)
        .with_noise_min(0.5 * NOISE_STD)
        .with_noise_max(1.5 * NOISE_STD)
        .with_pings_per_patch(8);
    let val_cfg = train_cfg
        .clone()
        .with_noise_min(NOISE_STD)
        .with_noise_max(NOISE_STD);

    let config = TrainingConfig::new(
        DenoiseNetConfig::new()
            .with_encoder_dims(vec![32, 64])
            .with_point_feature_dim(64)
            .with_decoder_dims(vec![64, 32]),
        train_cfg.clone(),
        val_cfg.clone(),
        LangevinConfig::new(),
    )
    .with_lr(1e-3)
    .with_train_batch_size(4)
    .with_max_epochs(20)
    .with_log_interval(12)
    .with_logging(false);

    let train_set = MbesPatchDataset::from_pings(
        train_pings,
        train_pings,
        train_cfg.pings_per_patch,
        None,
        NoiseTransform::from_config(&train_cfg)?,
    )?;
    let val_set = MbesPatchDataset::from_pings(
        val_pings,
        val_pings,
        val_cfg.pings_per_patch,
        None,
        NoiseTransform::from_config(&val_cfg)?,
    )?;

    // Training
    let model = config.model.init::<MyBackend>(&device);
    let optim = build_optimizer::<MyBackend>(&config);
    let mut session = TrainingSession::new(config.clone(), model, optim, train_set, val_set.clone(), &device)?;
    session.run()?;
    let steps = session.step();
    println!();

    // Held-out comparison
    let model = session.into_model().valid();
    let denoiser = LangevinDenoiser::from_config(&config.langevin)?;
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    println!("  {:>5}  {:>12} {:>12}  {:>12} {:>12}", "patch", "CD noisy", "CD denoised", "Diff noisy", "Diff denoised");
    for index in 0..val_set.len() {
        let Some(sample) = val_set.get(index, &mut rng) else {
            continue;
        };
        let denoised = denoiser.denoise_points::<NdArray, _>(&model, &sample.pcl_noisy, &device)?;

        println!(
            "  {:>5}  {:>12.6} {:>12.6}  {:>12.6} {:>12.6}",
            index,
            chamfer_distance(&sample.pcl_noisy, &sample.pcl_clean)?,
            chamfer_distance(&denoised, &sample.pcl_clean)?,
            point_correspondence_distance(&sample.pcl_noisy, &sample.pcl_clean)?,
            point_correspondence_distance(&denoised, &sample.pcl_clean)?,
        );
    }

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Done after {} steps", steps);
    println!("═══════════════════════════════════════════════════════════════");
    Ok(())
}

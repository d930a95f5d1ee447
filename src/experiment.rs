//! End-to-end sweep from an [`ExperimentConfig`]: load the checkpoint and
//! test split, run the schedule, write `results.json`.

use std::path::PathBuf;

use burn::nn::loss::CrossEntropyLossConfig;
use burn::prelude::*;
use tracing::info;

use crate::config::ExperimentConfig;
use crate::error::{NoiseError, Result};
use crate::neural::checkpoint::load_weights;
use crate::neural::data::batch::TestSet;
use crate::neural::data::open_test_split;
use crate::neural::model::{DigitLinear, DigitLinearConfig};
use crate::schedule::NoiseSchedule;
use crate::sweep::{NoiseSweep, SweepOutcome};
use crate::view::SweepObserver;

pub const RESULTS_FILE: &str = "results.json";

/// A finished experiment and where its results went.
pub struct ExperimentReport<B: Backend> {
    pub schedule: NoiseSchedule,
    pub outcome: SweepOutcome<DigitLinear<B>>,
    pub results_path: PathBuf,
}

/// Run the configured sweep on `device`.
pub fn run_experiment<B: Backend, O: SweepObserver>(
    config: &ExperimentConfig,
    device: &B::Device,
    observer: &mut O,
) -> Result<ExperimentReport<B>> {
    config.validate()?;
    let schedule = NoiseSchedule::from_config(&config.diffusion)?;

    let model = DigitLinearConfig::new().init::<B>(device);
    let model = load_weights(model, &config.weights_path(), device)?;
    info!(weights = %config.weights_path().display(), "loaded classifier");

    let data = TestSet::<B>::new(
        open_test_split(&config.data_path(), config.download)?,
        config.batch_size,
        device,
    )?;
    info!(
        examples = data.len(),
        batches = data.num_batches(),
        steps = schedule.len(),
        mode = ?config.noise_mode,
        "starting sweep"
    );

    let loss = CrossEntropyLossConfig::new().init::<B>(device);
    let outcome = NoiseSweep::new(model, loss, config.seed)
        .with_initial_noise(config.initial_noise)
        .with_mode(config.noise_mode)
        .run(&schedule, &data, observer)?;

    let dir = config.output_path();
    std::fs::create_dir_all(&dir).map_err(|e| NoiseError::io(&dir, e))?;
    let results_path = dir.join(RESULTS_FILE);
    outcome.series.write_json(&results_path)?;

    Ok(ExperimentReport {
        schedule,
        outcome,
        results_path,
    })
}

use std::path::PathBuf;

use burn::backend::NdArray;
use clap::Args;
use noiseprobe::neural::checkpoint::save_weights;
use noiseprobe::neural::model::{reinit_normal, DigitLinearConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args)]
pub struct InitArgs {
    /// Checkpoint to write (".mpk" is appended)
    #[arg(default_value = "datasets/MNIST_models/0")]
    pub output: PathBuf,
    /// Seed for the N(0, 1) weights
    #[arg(long, default_value = "0")]
    pub seed: u64,
}

/// Write an untrained checkpoint with standard-normal weights.
pub fn cmd_init(args: InitArgs) {
    let device = Default::default();
    let model = DigitLinearConfig::new().init::<NdArray>(&device);
    let model = match reinit_normal(model, &mut StdRng::seed_from_u64(args.seed)) {
        Ok(model) => model,
        Err(e) => super::fail(e),
    };
    match save_weights::<NdArray, _>(&model, &args.output) {
        Ok(path) => eprintln!("Wrote {}", path.display()),
        Err(e) => super::fail(e),
    }
}

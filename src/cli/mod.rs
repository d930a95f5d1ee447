pub mod config;
pub mod init;
pub mod run;
pub mod schedule;

use std::path::Path;
use std::process;

use clap::Args;
use noiseprobe::{ExperimentConfig, ScheduleConfig};

/// Schedule flags shared by `run` and `schedule`. Each one overrides the
/// matching config-file value when given.
#[derive(Args, Clone, Debug, Default)]
pub struct ScheduleArgs {
    /// Schedule kind (only "linear" is supported)
    #[arg(long, value_name = "KIND")]
    pub kind: Option<String>,
    /// First per-step standard deviation
    #[arg(long)]
    pub start: Option<f64>,
    /// Last per-step standard deviation
    #[arg(long)]
    pub end: Option<f64>,
    /// Number of perturb-evaluate steps
    #[arg(long)]
    pub steps: Option<usize>,
}

impl ScheduleArgs {
    /// Overlay the given flags on `base` and validate the result.
    pub fn apply(&self, base: &ScheduleConfig) -> noiseprobe::Result<ScheduleConfig> {
        ScheduleConfig::checked(
            self.kind.as_deref().unwrap_or(&base.noise_schedule_type),
            self.start.unwrap_or(base.noise_start),
            self.end.unwrap_or(base.noise_end),
            self.steps.unwrap_or(base.num_diffusion_timesteps),
        )
    }
}

/// Load the experiment config at `path`, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> ExperimentConfig {
    match path {
        Some(path) => match ExperimentConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => ExperimentConfig::new(ScheduleConfig::new()),
    }
}

/// Print `error: ...` and exit 1.
pub fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", e);
    process::exit(1);
}

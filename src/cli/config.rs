use std::path::PathBuf;

use burn::config::Config;
use clap::Args;
use noiseprobe::{ExperimentConfig, ScheduleConfig};

#[derive(Args)]
pub struct ConfigArgs {
    /// Where to write the default config
    #[arg(default_value = "noiseprobe.json")]
    pub output: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Write an experiment config holding every default.
pub fn cmd_config(args: ConfigArgs) {
    if args.output.exists() && !args.force {
        super::fail(format!(
            "'{}' already exists (pass --force to overwrite)",
            args.output.display()
        ));
    }
    let config = ExperimentConfig::new(ScheduleConfig::new());
    if let Err(e) = config.save(&args.output) {
        super::fail(format!("{}: {}", args.output.display(), e));
    }
    eprintln!("Wrote {}", args.output.display());
}

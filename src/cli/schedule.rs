use std::path::PathBuf;

use clap::Args;
use noiseprobe::NoiseSchedule;

use super::ScheduleArgs;

#[derive(Args)]
pub struct ScheduleCmdArgs {
    /// Experiment config to read the schedule from
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

/// Print each step's increment and the cumulative level it reaches.
pub fn cmd_schedule(args: ScheduleCmdArgs) {
    let config = super::load_config(args.config.as_deref());
    let schedule_config = match args.schedule.apply(&config.diffusion) {
        Ok(c) => c,
        Err(e) => super::fail(e),
    };
    let schedule = match NoiseSchedule::from_config(&schedule_config) {
        Ok(s) => s,
        Err(e) => super::fail(e),
    };

    println!("{:>4}  {:>12}  {:>12}", "step", "delta", "cumulative");
    let start = config.initial_noise;
    for (i, (delta, total)) in schedule.iter().zip(schedule.cumulative()).enumerate() {
        println!("{:>4}  {:>12.8}  {:>12.8}", i, delta, start + total);
    }
    if let Some(spacing) = schedule.spacing() {
        eprintln!(
            "{} {} step(s), spacing {:.8}",
            schedule.len(),
            schedule.kind(),
            spacing
        );
    }
}

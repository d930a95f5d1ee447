use std::path::PathBuf;
use std::time::Instant;

use burn::backend::wgpu::WgpuDevice;
use burn::backend::{NdArray, Wgpu};
use burn::prelude::Backend;
use clap::Args;
use noiseprobe::experiment::{run_experiment, ExperimentReport};
use noiseprobe::neural::noise::NoiseMode;
use noiseprobe::view::{ImageObserver, NullObserver};
use noiseprobe::{ExperimentConfig, Result};

use super::ScheduleArgs;

#[derive(Args)]
pub struct RunArgs {
    /// Experiment config (JSON, see `noiseprobe config`)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub schedule: ScheduleArgs,
    /// Checkpoint to corrupt (".mpk" is appended)
    #[arg(short, long, value_name = "PATH")]
    pub weights: Option<PathBuf>,
    /// Directory with the MNIST test split in IDX format
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Fetch the test split when the data directory lacks it
    #[arg(long)]
    pub download: bool,
    /// Directory for results.json and images
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Test examples per evaluation batch
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Noise generator seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Cumulative noise level before the first step
    #[arg(long)]
    pub initial_noise: Option<f64>,
    /// Draw each step's noise at the cumulative level instead of the increment
    #[arg(long)]
    pub cumulative: bool,
    /// Skip per-step weight heatmaps
    #[arg(long)]
    pub no_heatmaps: bool,
    /// Write no images at all
    #[arg(long)]
    pub headless: bool,
    /// Steps averaged at each end for the summary line
    #[arg(long, default_value = "5")]
    pub window: usize,
    /// Run on the GPU via wgpu (default: CPU ndarray)
    #[arg(long)]
    pub gpu: bool,
}

impl RunArgs {
    fn resolve(&self) -> ExperimentConfig {
        let mut config = super::load_config(self.config.as_deref());
        config.diffusion = match self.schedule.apply(&config.diffusion) {
            Ok(schedule) => schedule,
            Err(e) => super::fail(e),
        };
        if let Some(weights) = &self.weights {
            config.weights = weights.display().to_string();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.display().to_string();
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.display().to_string();
        }
        if self.download {
            config.download = true;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(level) = self.initial_noise {
            config.initial_noise = level;
        }
        if self.cumulative {
            config.noise_mode = NoiseMode::Cumulative;
        }
        if self.no_heatmaps {
            config.heatmaps = false;
        }
        config
    }
}

pub fn cmd_run(args: RunArgs) {
    let config = args.resolve();
    if let Err(e) = config.validate() {
        super::fail(e);
    }

    let start = Instant::now();
    let series = if args.gpu {
        execute::<Wgpu>(&config, &WgpuDevice::default(), args.headless)
    } else {
        execute::<NdArray>(&config, &Default::default(), args.headless)
    };
    let series = match series {
        Ok(series) => series,
        Err(e) => super::fail(e),
    };

    print!("{}", series.table());
    if let Some(summary) = series.summary(args.window) {
        eprintln!();
        eprintln!(
            "Accuracy {:.1}% -> {:.1}% (mean of first/last {} steps), drop {:.1} points, final noise {:.6}",
            summary.head_accuracy,
            summary.tail_accuracy,
            summary.window,
            summary.accuracy_drop,
            summary.final_noise,
        );
    }
    eprintln!("Done in {:.1}s", start.elapsed().as_secs_f64());
}

fn execute<B: Backend>(
    config: &ExperimentConfig,
    device: &B::Device,
    headless: bool,
) -> Result<noiseprobe::ResultSeries> {
    let report: ExperimentReport<B> = if headless {
        run_experiment(config, device, &mut NullObserver)?
    } else {
        let mut observer = ImageObserver::new(config.output_path())?;
        if !config.heatmaps {
            observer = observer.without_heatmaps();
        }
        let report = run_experiment(config, device, &mut observer)?;
        eprintln!(
            "Wrote {} image(s) to {}",
            observer.written().len(),
            observer.dir().display()
        );
        report
    };
    eprintln!("Results: {}", report.results_path.display());
    Ok(report.outcome.series)
}

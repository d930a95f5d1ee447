use std::path::{Path, PathBuf};

use burn::config::Config;

use crate::error::{self, NoiseError};
use crate::neural::noise::NoiseMode;
use crate::schedule::ScheduleKind;

/// The four recognised schedule options.
///
/// [`ScheduleConfig::checked`] builds a record that is known to be valid.
/// A record built through [`ScheduleConfig::new`] and the `with_*` setters,
/// or edited field by field, must pass [`ScheduleConfig::validate`] before
/// use. [`ExperimentConfig::from_file`] validates what it loads.
#[derive(Config, Debug)]
pub struct ScheduleConfig {
    /// Schedule shape. Only `linear` is accepted.
    #[config(default = "String::from(\"linear\")")]
    pub noise_schedule_type: String,
    /// First per-step standard deviation.
    #[config(default = 0.0001)]
    pub noise_start: f64,
    /// Last per-step standard deviation.
    #[config(default = 0.02)]
    pub noise_end: f64,
    /// Number of perturb-evaluate steps.
    #[config(default = 20)]
    pub num_diffusion_timesteps: usize,
}

impl ScheduleConfig {
    /// All four options at once, validated.
    pub fn checked(
        kind: impl Into<String>,
        start: f64,
        end: f64,
        steps: usize,
    ) -> error::Result<Self> {
        let config = Self::new()
            .with_noise_schedule_type(kind.into())
            .with_noise_start(start)
            .with_noise_end(end)
            .with_num_diffusion_timesteps(steps);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> error::Result<()> {
        self.noise_schedule_type.parse::<ScheduleKind>()?;
        if self.num_diffusion_timesteps == 0 {
            return Err(NoiseError::InvalidConfig(
                "num_diffusion_timesteps must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("noise_start", self.noise_start),
            ("noise_end", self.noise_end),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(NoiseError::InvalidConfig(format!(
                    "{} must be a finite, non-negative standard deviation (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Everything a sweep needs besides the model architecture.
#[derive(Config, Debug)]
pub struct ExperimentConfig {
    pub diffusion: ScheduleConfig,
    /// Test examples per evaluation batch.
    #[config(default = 128)]
    pub batch_size: usize,
    /// Seed for the noise generator.
    #[config(default = 0)]
    pub seed: u64,
    /// Cumulative noise level reported before the first step.
    #[config(default = 0.0)]
    pub initial_noise: f64,
    #[config(default = "NoiseMode::Increment")]
    pub noise_mode: NoiseMode,
    /// Checkpoint stem; `.mpk` is appended by the recorder.
    #[config(default = "String::from(\"datasets/MNIST_models/0\")")]
    pub weights: String,
    /// Directory holding the MNIST test split in IDX format.
    #[config(default = "String::from(\"datasets/MNIST\")")]
    pub data_dir: String,
    /// Fetch the test split into burn's dataset cache when `data_dir` lacks it.
    #[config(default = false)]
    pub download: bool,
    #[config(default = "String::from(\"noise_report\")")]
    pub output_dir: String,
    /// Write a weight heatmap after every step.
    #[config(default = true)]
    pub heatmaps: bool,
}

impl ExperimentConfig {
    /// Load a JSON config written by [`Config::save`] and validate it.
    pub fn from_file(path: &Path) -> error::Result<Self> {
        let config = Self::load(path).map_err(|e| NoiseError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> error::Result<()> {
        self.diffusion.validate()?;
        if self.batch_size == 0 {
            return Err(NoiseError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        if !self.initial_noise.is_finite() || self.initial_noise < 0.0 {
            return Err(NoiseError::InvalidConfig(format!(
                "initial_noise must be finite and non-negative (got {})",
                self.initial_noise
            )));
        }
        Ok(())
    }

    pub fn weights_path(&self) -> PathBuf {
        PathBuf::from(&self.weights)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

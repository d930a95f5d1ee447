//! Noise schedules borrowed from diffusion-model conventions.
//!
//! A schedule is the ordered list of per-step standard deviations the
//! sweep adds to the model. Only the linear schedule exists; any other
//! kind is rejected before any evaluation work begins.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::config::ScheduleConfig;
use crate::error::{NoiseError, Result};

/// Supported schedule shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    Linear,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
        }
    }
}

impl FromStr for ScheduleKind {
    type Err = NoiseError;

    fn from_str(kind: &str) -> Result<Self> {
        match kind {
            "linear" => Ok(Self::Linear),
            other => Err(NoiseError::UnsupportedScheduleKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered per-step noise increments. Immutable once generated.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSchedule {
    kind: ScheduleKind,
    values: Vec<f64>,
}

impl NoiseSchedule {
    /// Build a schedule of exactly `steps` values.
    ///
    /// For `linear` the values run from `start` to `end` inclusive. A
    /// single step yields `[start]`. Every value must be finite and
    /// non-negative; a decreasing schedule is accepted with a warning.
    pub fn generate(kind: &str, start: f64, end: f64, steps: usize) -> Result<Self> {
        let kind = kind.parse::<ScheduleKind>()?;
        if steps == 0 {
            return Err(NoiseError::InvalidConfig(
                "num_diffusion_timesteps must be at least 1".into(),
            ));
        }
        let values = match kind {
            ScheduleKind::Linear => linspace(start, end, steps),
        };

        if values.len() != steps {
            return Err(NoiseError::InternalInvariantViolation(format!(
                "{} schedule has {} values, expected {}",
                kind,
                values.len(),
                steps
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(NoiseError::InvalidConfig(format!(
                "noise schedule from {} to {} yields {}; every value must be finite and >= 0",
                start, end, bad
            )));
        }
        if start > end {
            warn!(start, end, "noise schedule decreases from start to end");
        }
        Ok(Self { kind, values })
    }

    /// Build the schedule described by a validated configuration record.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::generate(
            &config.noise_schedule_type,
            config.noise_start,
            config.noise_end,
            config.num_diffusion_timesteps,
        )
    }

    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Running totals, summed left to right: entry `k` is the noise level
    /// reported after `k + 1` steps starting from zero.
    pub fn cumulative(&self) -> Vec<f64> {
        self.values
            .iter()
            .scan(0.0f64, |total, &delta| {
                *total += delta;
                Some(*total)
            })
            .collect()
    }

    /// Distance between consecutive values, `None` for a single step.
    pub fn spacing(&self) -> Option<f64> {
        match self.values.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }
}

/// Evenly spaced values over `[start, end]`, endpoint included.
///
/// Matches numpy's `linspace`: `start + i * step`, with the final element
/// pinned to `end` so rounding never moves the endpoint.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let div = (steps - 1) as f64;
            let step = (end - start) / div;
            let mut values: Vec<f64> = (0..steps).map(|i| start + i as f64 * step).collect();
            values[steps - 1] = end;
            values
        }
    }
}

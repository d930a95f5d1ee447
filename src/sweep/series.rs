//! Per-step results of a sweep.

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use statrs::statistics::Statistics;

use super::evaluate::EvaluationMetrics;
use crate::error::{NoiseError, Result};

/// Three parallel sequences, one entry per completed step, in step order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResultSeries {
    noise_levels: Vec<f64>,
    losses: Vec<f64>,
    accuracies: Vec<f64>,
}

/// One row of a [`ResultSeries`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRecord {
    pub step: usize,
    pub noise: f64,
    pub loss: f64,
    pub accuracy: f64,
}

/// Accuracy at the start and end of a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Steps averaged at each end.
    pub window: usize,
    pub head_accuracy: f64,
    pub tail_accuracy: f64,
    /// `head_accuracy - tail_accuracy`
    pub accuracy_drop: f64,
    pub final_noise: f64,
    pub peak_loss: f64,
}

impl ResultSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, noise: f64, metrics: &EvaluationMetrics) {
        self.noise_levels.push(noise);
        self.losses.push(metrics.mean_loss);
        self.accuracies.push(metrics.accuracy);
    }

    pub fn len(&self) -> usize {
        self.noise_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.noise_levels.is_empty()
    }

    /// Cumulative noise level after each step.
    pub fn noise_levels(&self) -> &[f64] {
        &self.noise_levels
    }

    pub fn losses(&self) -> &[f64] {
        &self.losses
    }

    /// Accuracy percentages.
    pub fn accuracies(&self) -> &[f64] {
        &self.accuracies
    }

    pub fn records(&self) -> impl Iterator<Item = StepRecord> + '_ {
        (0..self.len()).map(move |step| StepRecord {
            step,
            noise: self.noise_levels[step],
            loss: self.losses[step],
            accuracy: self.accuracies[step],
        })
    }

    pub fn last(&self) -> Option<StepRecord> {
        self.len().checked_sub(1).and_then(|i| self.records().nth(i))
    }

    /// Compare the first and last `window` steps. `None` on an empty series.
    ///
    /// The window is clamped to the series length, so short runs compare
    /// overlapping spans.
    pub fn summary(&self, window: usize) -> Option<SeriesSummary> {
        if self.is_empty() {
            return None;
        }
        let window = window.clamp(1, self.len());
        let head_accuracy = self.accuracies[..window].iter().mean();
        let tail_accuracy = self.accuracies[self.len() - window..].iter().mean();
        Some(SeriesSummary {
            window,
            head_accuracy,
            tail_accuracy,
            accuracy_drop: head_accuracy - tail_accuracy,
            final_noise: self.noise_levels[self.len() - 1],
            peak_loss: Statistics::max(self.losses.iter()),
        })
    }

    /// Plain-text table, one row per step.
    pub fn table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>4}  {:>12}  {:>12}  {:>9}",
            "step", "noise", "loss", "accuracy"
        );
        for r in self.records() {
            let _ = writeln!(
                out,
                "{:>4}  {:>12.6}  {:>12.6}  {:>8.1}%",
                r.step, r.noise, r.loss, r.accuracy
            );
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NoiseError::InternalInvariantViolation(e.to_string()))
    }

    /// Write the series as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| NoiseError::io(path, e))
    }
}

//! The noise sweep: corrupt, evaluate, record, repeat.
//!
//! Each step reads the next schedule value `delta`, raises the cumulative
//! noise level by it, adds fresh Gaussian noise to every float parameter
//! in place and evaluates the corrupted model on the whole test split.
//! Perturbations compound; nothing is ever restored.

pub mod evaluate;
pub mod series;

pub use evaluate::{evaluate, EvalLoss, EvaluationMetrics};
pub use series::{ResultSeries, SeriesSummary, StepRecord};

use std::marker::PhantomData;

use burn::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::error::{NoiseError, Result};
use crate::neural::data::batch::TestSet;
use crate::neural::model::Classifier;
use crate::neural::noise::{perturb, NoiseMode};
use crate::neural::params::weight_snapshots;
use crate::schedule::NoiseSchedule;
use crate::view::SweepObserver;

/// Sweep state. Owns the model being corrupted.
pub struct NoiseSweep<B: Backend, M: Classifier<B>, L: EvalLoss<B>> {
    model: M,
    loss: L,
    cumulative: f64,
    mode: NoiseMode,
    rng: StdRng,
    series: ResultSeries,
    _backend: PhantomData<B>,
}

/// What a finished sweep hands back.
pub struct SweepOutcome<M> {
    /// The model with every step's noise applied.
    pub model: M,
    pub series: ResultSeries,
}

impl<B: Backend, M: Classifier<B>, L: EvalLoss<B>> NoiseSweep<B, M, L> {
    /// Start a sweep at cumulative level 0 with a seeded noise source.
    pub fn new(model: M, loss: L, seed: u64) -> Self {
        Self {
            model: model.no_grad(),
            loss,
            cumulative: 0.0,
            mode: NoiseMode::Increment,
            rng: StdRng::seed_from_u64(seed),
            series: ResultSeries::new(),
            _backend: PhantomData,
        }
    }

    /// Starting cumulative level. Recorded only; no noise is applied for it.
    pub fn with_initial_noise(mut self, level: f64) -> Self {
        self.cumulative = level;
        self
    }

    pub fn with_mode(mut self, mode: NoiseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn cumulative_noise(&self) -> f64 {
        self.cumulative
    }

    pub fn mode(&self) -> NoiseMode {
        self.mode
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn series(&self) -> &ResultSeries {
        &self.series
    }

    /// Apply one schedule value and evaluate.
    pub fn step(mut self, delta: f64, data: &TestSet<B>) -> Result<(Self, EvaluationMetrics)> {
        self.cumulative += delta;
        let std_dev = self.mode.std_dev(delta, self.cumulative);
        let (model, _) = perturb(self.model, &mut self.rng, std_dev)?;
        self.model = model;

        let metrics = evaluate(&self.model, data, &self.loss)?;
        self.series.push(self.cumulative, &metrics);
        info!(
            noise = self.cumulative,
            loss = metrics.mean_loss,
            accuracy = metrics.accuracy,
            "Current Noise: {:.6}, Test Error: {:>8.6}, Accuracy: {:>0.1}%",
            self.cumulative,
            metrics.mean_loss,
            metrics.accuracy
        );
        Ok((self, metrics))
    }

    /// Run every step of `schedule`, notifying `observer` after each one
    /// and once at the end.
    ///
    /// The schedule and the starting level are checked before the first
    /// step. Any later failure aborts the sweep; the partially corrupted
    /// model is dropped with it.
    pub fn run<O: SweepObserver>(
        self,
        schedule: &NoiseSchedule,
        data: &TestSet<B>,
        observer: &mut O,
    ) -> Result<SweepOutcome<M>> {
        if let Some((step, bad)) = schedule
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(NoiseError::InvalidConfig(format!(
                "schedule value {} at step {} must be finite and >= 0",
                bad, step
            )));
        }
        if !self.cumulative.is_finite() || self.cumulative < 0.0 {
            return Err(NoiseError::InvalidConfig(format!(
                "initial noise level must be finite and >= 0 (got {})",
                self.cumulative
            )));
        }

        let start = self.series.len();
        let mut sweep = self;
        for (step, delta) in schedule.iter().enumerate() {
            let (next, _) = sweep.step(delta, data)?;
            sweep = next;
            if observer.wants_weights() {
                let weights = weight_snapshots::<B, _>(&sweep.model);
                observer.on_step(step, &weights, sweep.cumulative)?;
            } else {
                observer.on_step(step, &[], sweep.cumulative)?;
            }
        }

        if sweep.series.len() != start + schedule.len() {
            return Err(NoiseError::InternalInvariantViolation(format!(
                "recorded {} steps for a schedule of {}",
                sweep.series.len() - start,
                schedule.len()
            )));
        }
        observer.on_finish(&sweep.series)?;
        Ok(SweepOutcome {
            model: sweep.model,
            series: sweep.series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::model::{DigitLinear, DigitLinearConfig};
    use crate::neural::params::WeightSnapshot;
    use crate::view::NullObserver;
    use burn::backend::NdArray;
    use burn::data::dataset::vision::MnistItem;
    use burn::data::dataset::InMemDataset;
    use burn::module::Param;
    use burn::nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig};
    use statrs::statistics::Statistics;

    type B = NdArray;

    /// Ten digits, each lighting its own 10-pixel band.
    fn banded_items(copies: usize) -> Vec<MnistItem> {
        let mut items = Vec::new();
        for _ in 0..copies {
            for label in 0..10usize {
                let mut image = [[0f32; 28]; 28];
                for p in label * 10..label * 10 + 10 {
                    image[p / 28][p % 28] = 255.0;
                }
                items.push(MnistItem {
                    image,
                    label: label as u8,
                });
            }
        }
        items
    }

    /// Reads each band with weight `margin`, so it starts fully accurate.
    fn banded_model(margin: f32, device: &<B as Backend>::Device) -> DigitLinear<B> {
        let mut model = DigitLinearConfig::new().init::<B>(device);
        let mut weights = vec![0f32; 784 * 10];
        for class in 0..10 {
            for p in class * 10..class * 10 + 10 {
                weights[p * 10 + class] = margin;
            }
        }
        model.net.weight = Param::from_tensor(Tensor::from_data(
            TensorData::new(weights, [784, 10]),
            device,
        ));
        model
    }

    fn test_set(device: &<B as Backend>::Device) -> TestSet<B> {
        TestSet::new(Box::new(InMemDataset::new(banded_items(3))), 8, device).unwrap()
    }

    fn sweep(seed: u64, margin: f32) -> NoiseSweep<B, DigitLinear<B>, CrossEntropyLoss<B>> {
        let device = Default::default();
        NoiseSweep::new(
            banded_model(margin, &device),
            CrossEntropyLossConfig::new().init::<B>(&device),
            seed,
        )
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<(usize, usize, f64)>,
        finished: Option<usize>,
    }

    impl SweepObserver for Recorder {
        fn on_step(&mut self, step: usize, weights: &[WeightSnapshot], noise: f64) -> Result<()> {
            self.steps.push((step, weights.len(), noise));
            Ok(())
        }

        fn on_finish(&mut self, series: &ResultSeries) -> Result<()> {
            self.finished = Some(series.len());
            Ok(())
        }
    }

    #[test]
    fn default_schedule_fills_series() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.0001, 0.02, 20).unwrap();
        let outcome = sweep(0, 0.02)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        let series = outcome.series;
        assert_eq!(series.len(), 20);
        assert!(series.noise_levels().windows(2).all(|w| w[0] <= w[1]));
        assert!(series.accuracies().iter().all(|a| (0.0..=100.0).contains(a)));
        assert!(series.losses().iter().all(|l| l.is_finite()));
    }

    #[test]
    fn cumulative_level_is_running_sum() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.001, 0.01, 5).unwrap();
        let outcome = sweep(1, 0.02)
            .with_initial_noise(0.5)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        let mut expected = 0.5;
        for (k, level) in outcome.series.noise_levels().iter().enumerate() {
            expected += schedule.values()[k];
            assert!((level - expected).abs() < 1e-12, "step {}", k);
        }
    }

    #[test]
    fn single_step_schedule_records_start_value() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.0001, 0.02, 1).unwrap();
        let outcome = sweep(2, 0.02)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        assert_eq!(outcome.series.noise_levels(), &[0.0001]);
    }

    #[test]
    fn zero_schedule_leaves_weights_alone() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.0, 0.0, 3).unwrap();
        let before = weight_snapshots::<B, _>(&banded_model(0.02, &device));
        let outcome = sweep(3, 0.02)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        let after = weight_snapshots::<B, _>(&outcome.model);
        assert_eq!(before[0].values, after[0].values);
        assert!(outcome.series.accuracies().iter().all(|&a| a == 100.0));
    }

    #[test]
    fn same_seed_same_results() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.01, 0.1, 4).unwrap();
        let a = sweep(9, 0.02)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        let b = sweep(9, 0.02)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        assert_eq!(a.series, b.series);
    }

    #[test]
    fn observer_sees_every_step_then_finish() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.001, 0.004, 4).unwrap();
        let mut recorder = Recorder::default();
        sweep(4, 0.02)
            .run(&schedule, &test_set(&device), &mut recorder)
            .unwrap();
        let steps: Vec<usize> = recorder.steps.iter().map(|s| s.0).collect();
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert!(recorder.steps.iter().all(|s| s.1 == 1));
        assert!((recorder.steps[3].2 - 0.01).abs() < 1e-12);
        assert_eq!(recorder.finished, Some(4));
    }

    #[test]
    fn schedule_crossing_zero_never_reaches_a_sweep() {
        assert!(matches!(
            NoiseSchedule::generate("linear", 0.01, -0.01, 3),
            Err(NoiseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn negative_start_level_runs_no_step() {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.01, 0.02, 3).unwrap();
        for mode in [NoiseMode::Increment, NoiseMode::Cumulative] {
            let mut recorder = Recorder::default();
            let result = sweep(5, 0.02)
                .with_initial_noise(-1.0)
                .with_mode(mode)
                .run(&schedule, &test_set(&device), &mut recorder);
            assert!(matches!(result, Err(NoiseError::InvalidConfig(_))));
            assert!(recorder.steps.is_empty());
            assert_eq!(recorder.finished, None);
        }
    }

    /// Variance of the weights after a `[0.1, 0.2]` sweep from all-zero weights.
    fn injected_variance(mode: NoiseMode, seed: u64) -> f64 {
        let device = Default::default();
        let schedule = NoiseSchedule::generate("linear", 0.1, 0.2, 2).unwrap();
        assert_eq!(schedule.values(), &[0.1, 0.2]);
        let outcome = sweep(seed, 0.0)
            .with_mode(mode)
            .run(&schedule, &test_set(&device), &mut NullObserver)
            .unwrap();
        let after = weight_snapshots::<B, _>(&outcome.model);
        let drift: Vec<f64> = after[0].values.iter().map(|&v| v as f64).collect();
        assert_eq!(drift.len(), 784 * 10);
        drift.iter().variance()
    }

    #[test]
    fn increment_mode_adds_per_step_variances() {
        // 0.1^2 + 0.2^2
        let variance = injected_variance(NoiseMode::Increment, 11);
        assert!((variance - 0.05).abs() < 0.005, "variance {}", variance);
    }

    #[test]
    fn cumulative_mode_draws_at_running_level() {
        // 0.1^2 + 0.3^2
        let variance = injected_variance(NoiseMode::Cumulative, 11);
        assert!((variance - 0.10).abs() < 0.01, "variance {}", variance);
    }

    #[test]
    fn accuracy_degrades_under_growing_noise() {
        let device = Default::default();
        let data = test_set(&device);
        let schedule = NoiseSchedule::generate("linear", 0.05, 1.0, 20).unwrap();
        let (mut head, mut tail) = (0.0, 0.0);
        for seed in 0..5 {
            let outcome = sweep(seed, 0.2)
                .run(&schedule, &data, &mut NullObserver)
                .unwrap();
            let summary = outcome.series.summary(5).unwrap();
            head += summary.head_accuracy;
            tail += summary.tail_accuracy;
        }
        assert!(tail <= head, "head {} tail {}", head, tail);
        assert!(head > tail + 50.0, "head {} tail {}", head, tail);
    }
}

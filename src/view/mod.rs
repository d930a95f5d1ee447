//! Optional visual output of a sweep.
//!
//! The sweep notifies a [`SweepObserver`] after every step and once at the
//! end. Observers only look; nothing they do feeds back into the sweep
//! except a failure, which aborts it.

pub mod colormap;
pub mod curves;
pub mod heatmap;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{NoiseError, Result};
use crate::neural::params::WeightSnapshot;
use crate::sweep::ResultSeries;

pub trait SweepObserver {
    /// Whether [`SweepObserver::on_step`] needs weight snapshots. Copying
    /// weights to the host is skipped when this is `false`.
    fn wants_weights(&self) -> bool {
        true
    }

    /// Called after step `step` with the corrupted weights and the
    /// cumulative noise level reached.
    fn on_step(&mut self, step: usize, weights: &[WeightSnapshot], noise: f64) -> Result<()>;

    /// Called once after the last step.
    fn on_finish(&mut self, series: &ResultSeries) -> Result<()>;
}

/// Headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl SweepObserver for NullObserver {
    fn wants_weights(&self) -> bool {
        false
    }

    fn on_step(&mut self, _step: usize, _weights: &[WeightSnapshot], _noise: f64) -> Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _series: &ResultSeries) -> Result<()> {
        Ok(())
    }
}

/// One image written by an [`ImageObserver`].
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub path: PathBuf,
    pub title: String,
}

/// Writes PNGs into a directory: `weights_step_NN.png` per step (one
/// `weights_step_NN_K.png` per matrix when a model has several) and
/// `curves.png` at the end.
#[derive(Debug)]
pub struct ImageObserver {
    dir: PathBuf,
    heatmaps: bool,
    written: Vec<Rendered>,
}

impl ImageObserver {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| NoiseError::io(&dir, e))?;
        Ok(Self {
            dir,
            heatmaps: true,
            written: Vec::new(),
        })
    }

    /// Only draw the final curves.
    pub fn without_heatmaps(mut self) -> Self {
        self.heatmaps = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Images written so far, in order.
    pub fn written(&self) -> &[Rendered] {
        &self.written
    }

    fn record(&mut self, path: PathBuf, title: String) {
        debug!(path = %path.display(), title = %title, "wrote image");
        self.written.push(Rendered { path, title });
    }
}

impl SweepObserver for ImageObserver {
    fn wants_weights(&self) -> bool {
        self.heatmaps
    }

    fn on_step(&mut self, step: usize, weights: &[WeightSnapshot], noise: f64) -> Result<()> {
        if !self.heatmaps {
            return Ok(());
        }
        debug!(step, noise, matrices = weights.len(), "drawing heatmaps");
        let title = heatmap::caption(noise);
        for (k, snapshot) in weights.iter().enumerate() {
            if snapshot.values.is_empty() {
                continue;
            }
            let name = if weights.len() == 1 {
                format!("weights_step_{:02}.png", step)
            } else {
                format!("weights_step_{:02}_{}.png", step, k)
            };
            let path = self.dir.join(name);
            // burn stores Linear weights as [inputs, outputs]; draw one row per output.
            heatmap::render_heatmap(&snapshot.transposed(), &title, &path)?;
            self.record(path, title.clone());
        }
        Ok(())
    }

    fn on_finish(&mut self, series: &ResultSeries) -> Result<()> {
        let path = self.dir.join("curves.png");
        curves::render_curves(series, &path)?;
        self.record(
            path,
            format!("{} / {}", curves::LOSS_TITLE, curves::ACCURACY_TITLE),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::EvaluationMetrics;

    fn snapshot() -> WeightSnapshot {
        WeightSnapshot {
            path: "net.weight".into(),
            dims: vec![6, 2],
            values: vec![-1.0, 1.0, -0.5, 0.5, 0.0, 0.0, 0.2, -0.2, 0.9, -0.9, 0.1, 0.3],
        }
    }

    #[test]
    fn null_observer_skips_weights() {
        let mut observer = NullObserver;
        assert!(!observer.wants_weights());
        observer.on_step(0, &[], 0.1).unwrap();
        observer.on_finish(&ResultSeries::new()).unwrap();
    }

    #[test]
    fn image_observer_writes_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let mut observer = ImageObserver::new(dir.path().join("report")).unwrap();
        observer.on_step(0, &[snapshot()], 0.01).unwrap();
        observer.on_step(1, &[snapshot()], 0.03).unwrap();

        let mut series = ResultSeries::new();
        let metrics = EvaluationMetrics {
            mean_loss: 0.4,
            accuracy: 88.0,
            correct: 88,
            examples: 100,
            batches: 1,
        };
        series.push(0.01, &metrics);
        series.push(0.03, &metrics);
        observer.on_finish(&series).unwrap();

        let names: Vec<String> = observer
            .written()
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["weights_step_00.png", "weights_step_01.png", "curves.png"]
        );

        let img = image::open(dir.path().join("report/weights_step_00.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(img.dimensions(), (heatmap::WIDTH, heatmap::HEIGHT));
    }

    #[test]
    fn heatmap_titles_carry_the_noise_level() {
        let dir = tempfile::tempdir().unwrap();
        let mut observer = ImageObserver::new(dir.path()).unwrap();
        observer.on_step(0, &[snapshot()], 0.01).unwrap();
        observer.on_step(1, &[snapshot(), snapshot()], 0.035).unwrap();

        let titles: Vec<&str> = observer.written().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Visualization with Noise: 0.01",
                "Visualization with Noise: 0.035",
                "Visualization with Noise: 0.035",
            ]
        );
        assert!(dir.path().join("weights_step_01_1.png").is_file());
    }

    #[test]
    fn heatmaps_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut observer = ImageObserver::new(dir.path()).unwrap().without_heatmaps();
        assert!(!observer.wants_weights());
        observer.on_step(0, &[snapshot()], 0.01).unwrap();
        observer.on_finish(&ResultSeries::new()).unwrap();
        assert_eq!(observer.written().len(), 1);
        assert!(dir.path().join("curves.png").is_file());
    }
}

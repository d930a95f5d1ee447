//! Additive Gaussian corruption of module parameters.
//!
//! Noise is drawn on the host from a caller-owned RNG so a seed fully
//! determines every perturbation, independent of the backend's own
//! generator.

use burn::config::Config;
use burn::module::{Module, ModuleMapper, Param};
use burn::prelude::*;
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::{self, NoiseError};

/// Which standard deviation a step draws its noise with.
#[derive(Config, Debug, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    /// Fresh noise at the step's schedule increment. Total injected
    /// variance is the sum of per-step variances.
    Increment,
    /// Fresh noise at the running cumulative level.
    Cumulative,
}

impl NoiseMode {
    /// Standard deviation for a step with schedule value `delta`, after the
    /// cumulative level has already been advanced to `cumulative`.
    pub fn std_dev(&self, delta: f64, cumulative: f64) -> f64 {
        match self {
            Self::Increment => delta,
            Self::Cumulative => cumulative,
        }
    }
}

/// What one perturbation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerturbStats {
    pub tensors: usize,
    pub elements: usize,
}

/// Module mapper adding `N(0, std_dev)` to every element of every float
/// parameter.
pub struct GaussianInjector<'a, R: Rng> {
    rng: &'a mut R,
    normal: Option<Normal>,
    stats: PerturbStats,
    violation: Option<String>,
}

impl<'a, R: Rng> GaussianInjector<'a, R> {
    pub fn new(rng: &'a mut R, std_dev: f64) -> error::Result<Self> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(NoiseError::InvalidConfig(format!(
                "noise standard deviation must be finite and non-negative (got {})",
                std_dev
            )));
        }
        // A zero deviation adds nothing; statrs rejects it as a distribution.
        let normal = if std_dev > 0.0 {
            Some(
                Normal::new(0.0, std_dev)
                    .map_err(|e| NoiseError::InvalidConfig(format!("N(0, {}): {}", std_dev, e)))?,
            )
        } else {
            None
        };
        Ok(Self {
            rng,
            normal,
            stats: PerturbStats::default(),
            violation: None,
        })
    }

    fn finish(self) -> error::Result<PerturbStats> {
        match self.violation {
            Some(message) => Err(NoiseError::InternalInvariantViolation(message)),
            None => Ok(self.stats),
        }
    }
}

impl<B: Backend, R: Rng> ModuleMapper<B> for GaussianInjector<'_, R> {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        let Some(normal) = self.normal else {
            return param;
        };
        param.map(|tensor| {
            let dims = tensor.dims();
            let count: usize = dims.iter().product();
            let samples: Vec<f32> = (0..count)
                .map(|_| normal.sample(&mut *self.rng) as f32)
                .collect();
            let noise =
                Tensor::<B, D>::from_data(TensorData::new(samples, dims), &tensor.device());
            if noise.dims() != dims {
                self.violation = Some(format!(
                    "noise shape {:?} does not match parameter shape {:?}",
                    noise.dims(),
                    dims
                ));
                return tensor;
            }
            self.stats.tensors += 1;
            self.stats.elements += count;
            tensor + noise
        })
    }
}

/// Add one independent Gaussian draw to every parameter element.
///
/// Consumes the module and hands back the perturbed one; there is no way
/// to undo the corruption.
pub fn perturb<B: Backend, M: Module<B>, R: Rng>(
    model: M,
    rng: &mut R,
    std_dev: f64,
) -> error::Result<(M, PerturbStats)> {
    let mut injector = GaussianInjector::new(rng, std_dev)?;
    let model = model.map(&mut injector);
    let stats = injector.finish()?;
    debug!(
        std_dev,
        tensors = stats.tensors,
        elements = stats.elements,
        "perturbed parameters"
    );
    Ok((model, stats))
}

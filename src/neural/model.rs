//! Classifiers the sweep can corrupt.
//!
//! `DigitLinear` is the reference model: one bias-free linear map from a
//! flattened 28x28 image to ten class scores.

use burn::config::Config;
use burn::module::{Module, ModuleMapper, Param};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use rand::Rng;

use super::noise::perturb;
use crate::error;

/// Anything the sweep can evaluate: a burn module with an inference
/// forward pass from image batches to per-class scores.
pub trait Classifier<B: Backend>: Module<B> {
    /// `[batch, height, width]` images to `[batch, classes]` scores.
    fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2>;
}

#[derive(Config, Debug)]
pub struct DigitLinearConfig {
    /// Image height times width.
    #[config(default = 784)]
    pub d_input: usize,
    #[config(default = 10)]
    pub num_classes: usize,
    #[config(default = false)]
    pub bias: bool,
}

#[derive(Module, Debug)]
pub struct DigitLinear<B: Backend> {
    pub net: Linear<B>,
}

impl DigitLinearConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitLinear<B> {
        DigitLinear {
            net: LinearConfig::new(self.d_input, self.num_classes)
                .with_bias(self.bias)
                .init(device),
        }
    }
}

impl<B: Backend> Classifier<B> for DigitLinear<B> {
    fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, height, width] = images.dims();
        self.net.forward(images.reshape([batch, height * width]))
    }
}

struct Zeroed;

impl<B: Backend> ModuleMapper<B> for Zeroed {
    fn map_float<const D: usize>(&mut self, param: Param<Tensor<B, D>>) -> Param<Tensor<B, D>> {
        param.map(|tensor| tensor.zeros_like())
    }
}

/// Redraw every float parameter from `N(0, 1)`.
pub fn reinit_normal<B: Backend, M: Module<B>, R: Rng>(model: M, rng: &mut R) -> error::Result<M> {
    let zeroed = model.map(&mut Zeroed);
    let (model, _) = perturb(zeroed, rng, 1.0)?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::params::weight_snapshots;
    use burn::backend::NdArray;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type B = NdArray;

    #[test]
    fn forward_produces_class_scores() {
        let device = Default::default();
        let model = DigitLinearConfig::new().init::<B>(&device);
        let images = Tensor::<B, 3>::ones([4, 28, 28], &device);
        let logits = model.forward(images);
        assert_eq!(logits.dims(), [4, 10]);
        assert_eq!(model.num_params(), 7840);
    }

    #[test]
    fn reinit_draws_standard_normal() {
        let device = Default::default();
        let model = DigitLinearConfig::new().init::<B>(&device);
        let model = reinit_normal(model, &mut StdRng::seed_from_u64(11)).unwrap();
        let values = weight_snapshots::<B, _>(&model).remove(0).values;
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = values
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        assert!(mean.abs() < 0.05, "mean {}", mean);
        assert!((var.sqrt() - 1.0).abs() < 0.05, "std {}", var.sqrt());
    }
}

//! One full pass over the held-out split.

use std::path::PathBuf;

use burn::nn::loss::CrossEntropyLoss;
use burn::prelude::*;
use serde::Serialize;

use crate::error::{NoiseError, Result};
use crate::neural::data::batch::TestSet;
use crate::neural::model::Classifier;

/// Per-batch scalar loss used during evaluation.
pub trait EvalLoss<B: Backend> {
    /// Loss for one batch, averaged over its examples.
    fn batch_loss(&self, logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f64;
}

impl<B: Backend> EvalLoss<B> for CrossEntropyLoss<B> {
    fn batch_loss(&self, logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> f64 {
        self.forward(logits, targets).into_scalar().elem::<f64>()
    }
}

/// Mean loss and accuracy of one evaluation pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Sum of batch losses divided by the number of batches.
    pub mean_loss: f64,
    /// Percentage of examples whose arg-max prediction equals the label.
    pub accuracy: f64,
    pub correct: usize,
    pub examples: usize,
    pub batches: usize,
}

#[derive(Default)]
struct Tally {
    loss_sum: f64,
    correct: usize,
    examples: usize,
    batches: usize,
}

impl Tally {
    fn record(&mut self, loss: f64, correct: usize, size: usize) {
        self.loss_sum += loss;
        self.correct += correct;
        self.examples += size;
        self.batches += 1;
    }

    fn finish(self, dataset_len: usize) -> Result<EvaluationMetrics> {
        if self.batches == 0 || dataset_len == 0 {
            return Err(NoiseError::dataset(
                PathBuf::from("<test set>"),
                "evaluation saw no examples",
            ));
        }
        if self.examples != dataset_len {
            return Err(NoiseError::InternalInvariantViolation(format!(
                "evaluated {} examples but the test set holds {}",
                self.examples, dataset_len
            )));
        }
        Ok(EvaluationMetrics {
            mean_loss: self.loss_sum / self.batches as f64,
            accuracy: 100.0 * self.correct as f64 / dataset_len as f64,
            correct: self.correct,
            examples: self.examples,
            batches: self.batches,
        })
    }
}

/// Evaluate `model` on every batch of `data`, in order.
///
/// The model is only read. Gradients are never tracked as long as the
/// backend is not an autodiff one or the module was passed through
/// `no_grad` first.
pub fn evaluate<B, M, L>(model: &M, data: &TestSet<B>, loss: &L) -> Result<EvaluationMetrics>
where
    B: Backend,
    M: Classifier<B>,
    L: EvalLoss<B>,
{
    let mut tally = Tally::default();
    for batch in data.batches() {
        let batch = batch?;
        let [n] = batch.targets.dims();
        let logits = model.forward(batch.images);
        let [rows, _] = logits.dims();
        if rows != n {
            return Err(NoiseError::InternalInvariantViolation(format!(
                "model produced {} score rows for a batch of {}",
                rows, n
            )));
        }

        let correct = logits
            .clone()
            .argmax(1)
            .reshape([n])
            .equal(batch.targets.clone())
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();
        let batch_loss = loss.batch_loss(logits, batch.targets);
        tally.record(batch_loss, correct as usize, n);
    }
    tally.finish(data.len())
}

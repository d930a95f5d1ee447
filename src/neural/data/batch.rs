//! Ordered batching of the held-out split.

use burn::data::dataset::vision::MnistItem;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use super::idx::{IMAGE_PIXELS, IMAGE_SIDE};
use crate::error::{NoiseError, Result};

/// One batch of images scaled to `[0, 1]` and their labels.
#[derive(Clone, Debug)]
pub struct DigitBatch<B: Backend> {
    /// `[batch, 28, 28]`
    pub images: Tensor<B, 3>,
    /// `[batch]`
    pub targets: Tensor<B, 1, Int>,
}

/// A fixed held-out dataset, read in order, `batch_size` items at a time.
///
/// Every call to [`TestSet::batches`] starts again from the first item, so
/// the same set can be evaluated once per sweep step.
pub struct TestSet<B: Backend> {
    items: Box<dyn Dataset<MnistItem>>,
    batch_size: usize,
    device: B::Device,
}

impl<B: Backend> TestSet<B> {
    pub fn new(
        items: Box<dyn Dataset<MnistItem>>,
        batch_size: usize,
        device: &B::Device,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(NoiseError::InvalidConfig(
                "batch_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            items,
            batch_size,
            device: device.clone(),
        })
    }

    /// Total number of examples.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches one pass yields; the last one may be short.
    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size)
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Batches in dataset order.
    pub fn batches(&self) -> impl Iterator<Item = Result<DigitBatch<B>>> + '_ {
        (0..self.num_batches()).map(move |b| {
            let start = b * self.batch_size;
            let end = (start + self.batch_size).min(self.len());
            self.batch(start, end)
        })
    }

    fn batch(&self, start: usize, end: usize) -> Result<DigitBatch<B>> {
        let n = end - start;
        let mut pixels = Vec::with_capacity(n * IMAGE_PIXELS);
        let mut labels = Vec::with_capacity(n);
        for index in start..end {
            let item = self.items.get(index).ok_or_else(|| {
                NoiseError::InternalInvariantViolation(format!(
                    "dataset of length {} has no item {}",
                    self.len(),
                    index
                ))
            })?;
            for row in item.image.iter() {
                pixels.extend(row.iter().map(|&p| p / 255.0));
            }
            labels.push(item.label as i32);
        }

        let images = Tensor::from_data(
            TensorData::new(pixels, [n, IMAGE_SIDE, IMAGE_SIDE]),
            &self.device,
        );
        let targets = Tensor::from_data(TensorData::new(labels, [n]), &self.device);
        Ok(DigitBatch { images, targets })
    }
}

//! Held-out data for evaluation.

pub mod batch;
pub mod idx;

use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};

use burn::data::dataset::vision::{MnistDataset, MnistItem};
use burn::data::dataset::Dataset;
use tracing::info;

use crate::error::{NoiseError, Result};

/// Open the MNIST test split.
///
/// Local IDX files in `dir` win. Without them, `download` falls back to
/// burn's `MnistDataset`, which fetches into `~/.cache/burn-dataset`. A
/// failed fetch surfaces as [`NoiseError::DatasetUnavailable`] for that
/// cache directory.
pub fn open_test_split(dir: &Path, download: bool) -> Result<Box<dyn Dataset<MnistItem>>> {
    let dataset: Box<dyn Dataset<MnistItem>> = if idx::has_test_split(dir) {
        info!(dir = %dir.display(), "loading MNIST test split");
        Box::new(idx::load_test_split(dir)?)
    } else if download {
        info!("test split not found locally, using burn's MNIST cache");
        Box::new(fetch_guarded(&mnist_cache_dir(), MnistDataset::test)?)
    } else {
        return Err(NoiseError::dataset(
            dir,
            format!(
                "missing {} / {} (pass --download to fetch them)",
                idx::TEST_IMAGES,
                idx::TEST_LABELS
            ),
        ));
    };

    if dataset.is_empty() {
        return Err(NoiseError::dataset(dir, "test split holds no examples"));
    }
    Ok(dataset)
}

/// Where burn keeps its MNIST download.
fn mnist_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".cache/burn-dataset/mnist")
}

/// Run a fetch that reports failure by panicking.
fn fetch_guarded<T>(cache: &Path, fetch: impl FnOnce() -> T + UnwindSafe) -> Result<T> {
    panic::catch_unwind(fetch).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".to_string());
        NoiseError::dataset(cache, format!("MNIST download failed: {}", reason))
    })
}

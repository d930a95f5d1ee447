//! Persisted classifier weights.
//!
//! Uses burn's native record format (NamedMpk, full precision). Paths may
//! be given with or without the `.mpk` extension; the recorder adds it.

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, RecorderError};

use super::params::{parameter_shapes, shape_mismatch};
use crate::error::{NoiseError, Result};

/// The file the recorder reads or writes for `path`.
pub fn checkpoint_file(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}

/// Save a model's weights, creating parent directories as needed.
///
/// Returns the full path of the written `.mpk` file.
pub fn save_weights<B: Backend, M: Module<B>>(model: &M, path: &Path) -> Result<PathBuf> {
    let full_path = checkpoint_file(path);
    if let Some(dir) = full_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| NoiseError::io(dir, e))?;
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(full_path.clone(), &recorder)
        .map_err(|e| NoiseError::WeightsUnavailable {
            path: full_path.clone(),
            reason: e.to_string(),
        })?;
    Ok(full_path)
}

/// Load persisted weights into `model`.
///
/// The live model fixes the architecture: a record that cannot be decoded
/// into it, or whose tensors differ in shape, is an
/// [`NoiseError::IncompatibleArchitecture`].
pub fn load_weights<B: Backend, M: Module<B>>(
    model: M,
    path: &Path,
    device: &B::Device,
) -> Result<M> {
    let full_path = checkpoint_file(path);
    if !full_path.exists() {
        return Err(NoiseError::WeightsUnavailable {
            path: full_path,
            reason: "no such file".into(),
        });
    }

    let expected = parameter_shapes::<B, _>(&model);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let loaded = model
        .load_file(full_path.clone(), &recorder, device)
        .map_err(|e| match e {
            RecorderError::FileNotFound(reason) => NoiseError::WeightsUnavailable {
                path: full_path.clone(),
                reason,
            },
            other => NoiseError::IncompatibleArchitecture(format!(
                "{}: {}",
                full_path.display(),
                other
            )),
        })?;

    let found = parameter_shapes::<B, _>(&loaded);
    if let Some(reason) = shape_mismatch(&expected, &found) {
        return Err(NoiseError::IncompatibleArchitecture(format!(
            "{}: {}",
            full_path.display(),
            reason
        )));
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::model::{DigitLinear, DigitLinearConfig};
    use crate::neural::params::weight_snapshots;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn checkpoint_file_appends_extension() {
        assert_eq!(
            checkpoint_file(Path::new("models/0")),
            PathBuf::from("models/0.mpk")
        );
        assert_eq!(
            checkpoint_file(Path::new("models/0.mpk")),
            PathBuf::from("models/0.mpk")
        );
    }

    #[test]
    fn save_then_load_restores_weights() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = DigitLinearConfig::new().init::<B>(&device);
        let written = save_weights::<B, _>(&model, &dir.path().join("nested/0")).unwrap();
        assert!(written.ends_with("nested/0.mpk"));

        let fresh: DigitLinear<B> = DigitLinearConfig::new().init(&device);
        let loaded = load_weights(fresh, &dir.path().join("nested/0"), &device).unwrap();
        assert_eq!(
            weight_snapshots::<B, _>(&loaded)[0].values,
            weight_snapshots::<B, _>(&model)[0].values
        );
    }

    #[test]
    fn missing_file_is_weights_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = DigitLinearConfig::new().init::<B>(&device);
        assert!(matches!(
            load_weights(model, &dir.path().join("absent"), &device),
            Err(NoiseError::WeightsUnavailable { .. })
        ));
    }

    #[test]
    fn wrong_shape_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let wide = DigitLinearConfig::new()
            .with_num_classes(12)
            .init::<B>(&device);
        save_weights::<B, _>(&wide, &dir.path().join("wide")).unwrap();

        let model = DigitLinearConfig::new().init::<B>(&device);
        match load_weights(model, &dir.path().join("wide"), &device) {
            Err(NoiseError::IncompatibleArchitecture(msg)) => {
                assert!(msg.contains("wide.mpk"), "{}", msg)
            }
            other => panic!("expected IncompatibleArchitecture, got {:?}", other.err()),
        }
    }

    #[test]
    fn garbage_file_is_incompatible() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("junk.mpk"), b"not a record").unwrap();
        let device = Default::default();
        let model = DigitLinearConfig::new().init::<B>(&device);
        assert!(matches!(
            load_weights(model, &dir.path().join("junk"), &device),
            Err(NoiseError::IncompatibleArchitecture(_))
        ));
    }
}

//! MNIST test split in the IDX file format.
//!
//! Layout: big-endian `u32` magic, `u32` count, then for images `u32`
//! rows and `u32` columns, then one byte per pixel or label.

use std::path::Path;

use burn::data::dataset::vision::MnistItem;
use burn::data::dataset::InMemDataset;
use rayon::prelude::*;

use crate::error::{NoiseError, Result};

pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

pub const IMAGE_SIDE: usize = 28;
pub const IMAGE_PIXELS: usize = IMAGE_SIDE * IMAGE_SIDE;

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

fn be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| NoiseError::dataset(path, e.to_string()))
}

/// Parse an IDX3 image file into `count` raw 28x28 byte images.
pub fn parse_images(bytes: &[u8], path: &Path) -> Result<Vec<Vec<u8>>> {
    if bytes.len() < 16 {
        return Err(NoiseError::dataset(path, "truncated image header"));
    }
    let magic = be_u32(bytes, 0);
    if magic != IMAGE_MAGIC {
        return Err(NoiseError::dataset(
            path,
            format!("bad image magic {} (expected {})", magic, IMAGE_MAGIC),
        ));
    }
    let count = be_u32(bytes, 4) as usize;
    let rows = be_u32(bytes, 8) as usize;
    let cols = be_u32(bytes, 12) as usize;
    if rows != IMAGE_SIDE || cols != IMAGE_SIDE {
        return Err(NoiseError::dataset(
            path,
            format!("images are {}x{}, expected 28x28", rows, cols),
        ));
    }
    let body = &bytes[16..];
    if body.len() != count * IMAGE_PIXELS {
        return Err(NoiseError::dataset(
            path,
            format!(
                "header declares {} images but body holds {} bytes",
                count,
                body.len()
            ),
        ));
    }
    Ok(body.chunks_exact(IMAGE_PIXELS).map(|c| c.to_vec()).collect())
}

/// Parse an IDX1 label file.
pub fn parse_labels(bytes: &[u8], path: &Path) -> Result<Vec<u8>> {
    if bytes.len() < 8 {
        return Err(NoiseError::dataset(path, "truncated label header"));
    }
    let magic = be_u32(bytes, 0);
    if magic != LABEL_MAGIC {
        return Err(NoiseError::dataset(
            path,
            format!("bad label magic {} (expected {})", magic, LABEL_MAGIC),
        ));
    }
    let count = be_u32(bytes, 4) as usize;
    let body = &bytes[8..];
    if body.len() != count {
        return Err(NoiseError::dataset(
            path,
            format!(
                "header declares {} labels but body holds {}",
                count,
                body.len()
            ),
        ));
    }
    if let Some(bad) = body.iter().find(|&&l| l > 9) {
        return Err(NoiseError::dataset(path, format!("label {} out of range", bad)));
    }
    Ok(body.to_vec())
}

fn to_item(pixels: &[u8], label: u8) -> MnistItem {
    let mut image = [[0f32; IMAGE_SIDE]; IMAGE_SIDE];
    for (i, &p) in pixels.iter().enumerate() {
        image[i / IMAGE_SIDE][i % IMAGE_SIDE] = p as f32;
    }
    MnistItem { image, label }
}

/// Whether `dir` holds both test split files.
pub fn has_test_split(dir: &Path) -> bool {
    dir.join(TEST_IMAGES).is_file() && dir.join(TEST_LABELS).is_file()
}

/// Load the test split from `dir` into memory.
///
/// Pixels stay in `0..=255`, matching burn's `MnistDataset`.
pub fn load_test_split(dir: &Path) -> Result<InMemDataset<MnistItem>> {
    let images_path = dir.join(TEST_IMAGES);
    let labels_path = dir.join(TEST_LABELS);
    let images = parse_images(&read_file(&images_path)?, &images_path)?;
    let labels = parse_labels(&read_file(&labels_path)?, &labels_path)?;
    if images.len() != labels.len() {
        return Err(NoiseError::dataset(
            dir,
            format!("{} images but {} labels", images.len(), labels.len()),
        ));
    }

    let items: Vec<MnistItem> = images
        .par_iter()
        .zip(labels.par_iter())
        .map(|(pixels, &label)| to_item(pixels, label))
        .collect();
    Ok(InMemDataset::new(items))
}

/// Write `(pixels, label)` pairs as a test split in `dir`.
pub fn write_test_split(dir: &Path, items: &[(Vec<u8>, u8)]) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| NoiseError::io(dir, e))?;

    let mut images = Vec::with_capacity(16 + items.len() * IMAGE_PIXELS);
    images.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    images.extend_from_slice(&(items.len() as u32).to_be_bytes());
    images.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
    images.extend_from_slice(&(IMAGE_SIDE as u32).to_be_bytes());
    let mut labels = Vec::with_capacity(8 + items.len());
    labels.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    labels.extend_from_slice(&(items.len() as u32).to_be_bytes());

    for (pixels, label) in items {
        if pixels.len() != IMAGE_PIXELS {
            return Err(NoiseError::InvalidConfig(format!(
                "image has {} pixels, expected {}",
                pixels.len(),
                IMAGE_PIXELS
            )));
        }
        images.extend_from_slice(pixels);
        labels.push(*label);
    }

    let images_path = dir.join(TEST_IMAGES);
    std::fs::write(&images_path, images).map_err(|e| NoiseError::io(&images_path, e))?;
    let labels_path = dir.join(TEST_LABELS);
    std::fs::write(&labels_path, labels).map_err(|e| NoiseError::io(&labels_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::Dataset;

    fn sample_items() -> Vec<(Vec<u8>, u8)> {
        (0..5u8)
            .map(|i| {
                let mut pixels = vec![0u8; IMAGE_PIXELS];
                pixels[i as usize] = 255;
                pixels[IMAGE_PIXELS - 1] = i;
                (pixels, i)
            })
            .collect()
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        write_test_split(dir.path(), &sample_items()).unwrap();
        assert!(has_test_split(dir.path()));

        let dataset = load_test_split(dir.path()).unwrap();
        assert_eq!(dataset.len(), 5);
        let item = dataset.get(3).unwrap();
        assert_eq!(item.label, 3);
        assert_eq!(item.image[0][3], 255.0);
        assert_eq!(item.image[27][27], 3.0);
        assert_eq!(item.image[0][0], 0.0);
    }

    #[test]
    fn missing_files_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_test_split(dir.path()));
        assert!(matches!(
            load_test_split(dir.path()),
            Err(NoiseError::DatasetUnavailable { .. })
        ));
    }

    #[test]
    fn corrupt_headers_are_unavailable() {
        let path = Path::new("t10k-images-idx3-ubyte");
        assert!(parse_images(&[0, 0, 8, 3], path).is_err());

        let mut wrong_magic = vec![0u8; 16];
        wrong_magic[3] = 1;
        match parse_images(&wrong_magic, path) {
            Err(NoiseError::DatasetUnavailable { reason, .. }) => {
                assert!(reason.contains("magic"), "{}", reason)
            }
            other => panic!("expected DatasetUnavailable, got {:?}", other),
        }

        let mut short_body = Vec::new();
        short_body.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
        short_body.extend_from_slice(&3u32.to_be_bytes());
        short_body.push(1);
        assert!(parse_labels(&short_body, path).is_err());
    }

    #[test]
    fn out_of_range_label_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.push(12);
        assert!(parse_labels(&bytes, Path::new("labels")).is_err());
    }
}

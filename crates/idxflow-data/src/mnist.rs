// MNIST — standard file layout on top of SampleDataset
//
// The MNIST database consists of 4 files:
//   - train-images-idx3-ubyte  (60,000  28×28 images)
//   - train-labels-idx1-ubyte  (60,000  labels 0-9)
//   - t10k-images-idx3-ubyte   (10,000  28×28 images)
//   - t10k-labels-idx1-ubyte   (10,000  labels 0-9)
//
// Each may be stored plain or with a `.gz` suffix; the plain file wins when
// both exist. Decompression happens while streaming, never up front.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use idxflow_core::IdxTensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::LoadConfig;
use crate::dataset::SampleDataset;
use crate::error::LoadError;
use crate::observer::{default_observer, NullObserver, Observer};

/// Which split of MNIST to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnistSplit {
    Train,
    Test,
}

impl MnistSplit {
    /// Base names of the (labels, images) files for this split.
    pub fn file_names(self) -> (&'static str, &'static str) {
        match self {
            MnistSplit::Train => ("train-labels-idx1-ubyte", "train-images-idx3-ubyte"),
            MnistSplit::Test => ("t10k-labels-idx1-ubyte", "t10k-images-idx3-ubyte"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MnistSplit::Train => "MNIST-train",
            MnistSplit::Test => "MNIST-test",
        }
    }
}

/// Load an MNIST split from `dir`, logging through `tracing`.
pub fn load_dir(dir: impl AsRef<Path>, split: MnistSplit) -> Result<SampleDataset, LoadError> {
    load_dir_with(dir, split, &LoadConfig::default(), default_observer())
}

/// Load an MNIST split with explicit configuration and observer.
pub fn load_dir_with(
    dir: impl AsRef<Path>,
    split: MnistSplit,
    config: &LoadConfig,
    observer: Arc<dyn Observer>,
) -> Result<SampleDataset, LoadError> {
    let dir = dir.as_ref();
    let (lbl_name, img_name) = split.file_names();
    let label_path = resolve_file(dir, lbl_name)?;
    let image_path = resolve_file(dir, img_name)?;

    let mut ds = SampleDataset::load_with(label_path, image_path, config, observer)?;
    if config.name.is_none() {
        ds.set_name(split.name());
    }
    Ok(ds)
}

/// Find `base_name` or `base_name.gz` in `dir`.
pub fn resolve_file(dir: &Path, base_name: &str) -> Result<PathBuf, LoadError> {
    let plain = dir.join(base_name);
    let gz = dir.join(format!("{base_name}.gz"));

    if plain.exists() {
        Ok(plain)
    } else if gz.exists() {
        Ok(gz)
    } else {
        Err(LoadError::MissingFile(plain))
    }
}

/// Create a small synthetic MNIST-like dataset for testing.
///
/// Generates `n` random `rows × cols` images with labels 0–9. The same seed
/// always yields the same dataset.
pub fn synthetic(n: usize, rows: usize, cols: usize, seed: u64) -> Result<SampleDataset, LoadError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut pixels = vec![0u8; n * rows * cols];
    rng.fill(pixels.as_mut_slice());
    let labels: Vec<u8> = (0..n).map(|_| rng.gen_range(0..10u8)).collect();

    let labels = IdxTensor::new(n, labels)?;
    let images = IdxTensor::new((n, rows, cols), pixels)?;
    let mut ds = SampleDataset::from_tensors(labels, images, Arc::new(NullObserver))?;
    ds.set_name("MNIST-synthetic");
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::encode::{build_idx1_bytes, build_idx3_bytes};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_file_names() {
        assert_eq!(
            MnistSplit::Test.file_names(),
            ("t10k-labels-idx1-ubyte", "t10k-images-idx3-ubyte")
        );
        assert_eq!(MnistSplit::Train.name(), "MNIST-train");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dir(dir.path(), MnistSplit::Train).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(p) if p.ends_with("train-labels-idx1-ubyte")));
    }

    #[test]
    fn test_load_dir_mixed_plain_and_gz() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("t10k-labels-idx1-ubyte"),
            build_idx1_bytes(&[3, 7]),
        )
        .unwrap();

        let images = build_idx3_bytes(&[&[128u8; 4], &[64u8; 4]], 2, 2);
        let file = std::fs::File::create(dir.path().join("t10k-images-idx3-ubyte.gz")).unwrap();
        let mut enc = GzEncoder::new(file, Compression::default());
        enc.write_all(&images).unwrap();
        enc.finish().unwrap();

        let ds = load_dir(dir.path(), MnistSplit::Test).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.name(), "MNIST-test");
        assert_eq!(ds.get_sample(1).label, Some(7));
        let img = ds.get_sample(0).image.unwrap();
        assert!((img.as_slice()[0] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_synthetic_is_seeded() {
        let a = synthetic(50, 28, 28, 42).unwrap();
        let b = synthetic(50, 28, 28, 42).unwrap();
        assert_eq!(a.len(), 50);
        assert_eq!(a.image_dims(), (28, 28));
        assert_eq!(a.images(), b.images());
        assert_eq!(a.labels(), b.labels());
        assert!(a.iter().all(|s| s.label.is_some_and(|l| l < 10)));
    }

    #[test]
    fn test_synthetic_take() {
        let ds = synthetic(100, 4, 4, 1).unwrap().take(10).unwrap();
        assert_eq!(Dataset::len(&ds), 10);
        assert_eq!(ds.name(), "MNIST-synthetic");
    }
}

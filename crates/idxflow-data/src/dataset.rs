// SampleDataset — labeled images from a pair of IDX tensors
//
// A dataset is two decoded tensors that agree on their outermost axis:
//   labels: [count]                  (rank 1)
//   images: [count, height, width]   (rank 3)
//
// A wrong rank fails the load. A count mismatch does not: it is reported as
// a warning and every index is checked against each tensor separately, so a
// caller can still ask for an index only one of them covers.

use std::path::Path;
use std::sync::Arc;

use bitflags::bitflags;
use idxflow_core::{IdxTensor, Matrix};

use crate::config::LoadConfig;
use crate::decoder::decode_source;
use crate::error::LoadError;
use crate::observer::{default_observer, Event, Observer, TensorRole};
use crate::reader::{ChunkSource, GzChunkReader};

bitflags! {
    /// Which parts of a sample were present at the requested index.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SampleFlags: u32 {
        const HAS_IMAGE = 1 << 0;
        const HAS_LABEL = 1 << 1;
        const HAS_ALL = Self::HAS_IMAGE.bits() | Self::HAS_LABEL.bits();
    }
}

/// One (image, label) pair, extracted on demand.
///
/// The image is a fresh `height × width` matrix with every pixel mapped to
/// `[0.0, 1.0]`; it shares nothing with the dataset's storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub flags: SampleFlags,
    pub image: Option<Matrix>,
    pub label: Option<u8>,
}

impl Sample {
    pub fn has_image(&self) -> bool {
        self.flags.contains(SampleFlags::HAS_IMAGE)
    }

    pub fn has_label(&self) -> bool {
        self.flags.contains(SampleFlags::HAS_LABEL)
    }

    /// Both image and label present.
    pub fn is_complete(&self) -> bool {
        self.flags.contains(SampleFlags::HAS_ALL)
    }
}

/// An indexed collection of labeled image samples.
///
/// Implementations must be `Send + Sync` so consumers can read from
/// multiple threads once loading is done.
pub trait Dataset: Send + Sync {
    /// Number of complete samples.
    fn len(&self) -> usize;

    /// Whether the dataset has no complete samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve whatever exists at position `index`. Never panics.
    fn get_sample(&self, index: usize) -> Sample;

    /// `(height, width)` of every image.
    fn image_dims(&self) -> (usize, usize);

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Labels and images decoded from IDX files, held in memory.
///
/// Every constructor goes through `check_rank`, so `labels` is rank 1 and
/// `images` is rank 3 for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    labels: IdxTensor,
    images: IdxTensor,
    name: String,
}

impl SampleDataset {
    /// Load a dataset from a label file and an image file (plain or gzip),
    /// logging through `tracing`.
    pub fn load(
        label_path: impl AsRef<Path>,
        image_path: impl AsRef<Path>,
    ) -> Result<Self, LoadError> {
        Self::load_with(
            label_path,
            image_path,
            &LoadConfig::default(),
            default_observer(),
        )
    }

    /// Load with explicit configuration and observer.
    ///
    /// Labels are opened, decoded and validated before the image file is
    /// touched.
    pub fn load_with(
        label_path: impl AsRef<Path>,
        image_path: impl AsRef<Path>,
        config: &LoadConfig,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, LoadError> {
        let labels = load_tensor(label_path.as_ref(), TensorRole::Labels, config, &observer)?;
        check_rank(&labels, TensorRole::Labels, &observer)?;
        let images = load_tensor(image_path.as_ref(), TensorRole::Images, config, &observer)?;
        Self::assemble(labels, images, config, &observer)
    }

    /// Load from already-decompressed chunk sources.
    pub fn from_sources<L, I>(
        labels: &mut L,
        images: &mut I,
        config: &LoadConfig,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, LoadError>
    where
        L: ChunkSource + ?Sized,
        I: ChunkSource + ?Sized,
    {
        let labels = decode_role(labels, TensorRole::Labels, config, &observer)?;
        check_rank(&labels, TensorRole::Labels, &observer)?;
        let images = decode_role(images, TensorRole::Images, config, &observer)?;
        Self::assemble(labels, images, config, &observer)
    }

    /// Build a dataset from tensors decoded elsewhere.
    pub fn from_tensors(
        labels: IdxTensor,
        images: IdxTensor,
        observer: Arc<dyn Observer>,
    ) -> Result<Self, LoadError> {
        check_rank(&labels, TensorRole::Labels, &observer)?;
        Self::assemble(labels, images, &LoadConfig::default(), &observer)
    }

    fn assemble(
        labels: IdxTensor,
        images: IdxTensor,
        config: &LoadConfig,
        observer: &Arc<dyn Observer>,
    ) -> Result<Self, LoadError> {
        check_rank(&images, TensorRole::Images, observer)?;
        let (image_count, label_count) = (images.outer_dim(), labels.outer_dim());
        if image_count != label_count {
            observer.on_event(&Event::CountMismatch {
                images: image_count,
                labels: label_count,
            });
        }
        Ok(Self {
            labels,
            images,
            name: config.name.clone().unwrap_or_else(|| "idx".to_string()),
        })
    }

    /// Number of images (outermost image dimension).
    pub fn image_count(&self) -> usize {
        self.images.outer_dim()
    }

    /// Number of labels.
    pub fn label_count(&self) -> usize {
        self.labels.outer_dim()
    }

    /// Image rows and columns.
    pub fn image_dims(&self) -> (usize, usize) {
        match self.images.dims() {
            [_, rows, cols] => (*rows, *cols),
            _ => (0, 0),
        }
    }

    /// Effective length: `min(image_count, label_count)`.
    pub fn len(&self) -> usize {
        self.image_count().min(self.label_count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> &IdxTensor {
        &self.labels
    }

    pub fn images(&self) -> &IdxTensor {
        &self.images
    }

    /// Extract the sample at `index`, checking images and labels separately.
    pub fn get_sample(&self, index: usize) -> Sample {
        let mut flags = SampleFlags::empty();

        let image = self.images.outer_slice(index).ok().and_then(|pixels| {
            let (rows, cols) = self.image_dims();
            Matrix::from_normalized_bytes(rows, cols, pixels).ok()
        });
        if image.is_some() {
            flags |= SampleFlags::HAS_IMAGE;
        }

        let label = self.labels.as_bytes().get(index).copied();
        if label.is_some() {
            flags |= SampleFlags::HAS_LABEL;
        }

        Sample {
            flags,
            image,
            label,
        }
    }

    /// Iterate over the complete samples, `0..len()`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Sample> + '_ {
        (0..self.len()).map(move |i| self.get_sample(i))
    }

    /// Keep only the first `n` images and labels.
    pub fn take(self, n: usize) -> Result<Self, LoadError> {
        let (rows, cols) = self.image_dims();
        let images_n = n.min(self.image_count());
        let labels_n = n.min(self.label_count());

        let mut image_bytes = self.images.into_bytes();
        image_bytes.truncate(images_n * rows * cols);
        let mut label_bytes = self.labels.into_bytes();
        label_bytes.truncate(labels_n);

        Ok(Self {
            labels: IdxTensor::new(labels_n, label_bytes)?,
            images: IdxTensor::new((images_n, rows, cols), image_bytes)?,
            name: self.name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Dataset for SampleDataset {
    fn len(&self) -> usize {
        SampleDataset::len(self)
    }

    fn get_sample(&self, index: usize) -> Sample {
        SampleDataset::get_sample(self, index)
    }

    fn image_dims(&self) -> (usize, usize) {
        SampleDataset::image_dims(self)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn load_tensor(
    path: &Path,
    role: TensorRole,
    config: &LoadConfig,
    observer: &Arc<dyn Observer>,
) -> Result<IdxTensor, LoadError> {
    observer.on_event(&Event::Loading {
        role,
        path: path.to_path_buf(),
    });
    let mut reader = GzChunkReader::open(path).map_err(|source| LoadError::SourceOpen {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    decode_role(&mut reader, role, config, observer)
}

fn decode_role<S: ChunkSource + ?Sized>(
    source: &mut S,
    role: TensorRole,
    config: &LoadConfig,
    observer: &Arc<dyn Observer>,
) -> Result<IdxTensor, LoadError> {
    decode_source(source, config.decoder.clone(), observer.clone())
        .map_err(|source| LoadError::Decode { role, source })
}

fn check_rank(
    tensor: &IdxTensor,
    role: TensorRole,
    observer: &Arc<dyn Observer>,
) -> Result<(), LoadError> {
    let rank = tensor.rank();
    let err = match role {
        TensorRole::Labels if rank != 1 => LoadError::InvalidLabelShape { rank },
        TensorRole::Images if rank != 3 => LoadError::InvalidImageShape { rank },
        _ => return Ok(()),
    };
    observer.on_event(&Event::InvalidShape { role, rank });
    Err(err)
}

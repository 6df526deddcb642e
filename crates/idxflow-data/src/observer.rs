// Observer — injected diagnostics sink
//
// The decoder and the dataset loader never log through process-wide state.
// They are handed an `Arc<dyn Observer>` and report structured events to it.
// The default observer forwards to `tracing`; tests use a recording closure.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use idxflow_core::Shape;

/// Which half of a dataset a tensor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorRole {
    Labels,
    Images,
}

impl fmt::Display for TensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorRole::Labels => write!(f, "label"),
            TensorRole::Images => write!(f, "image"),
        }
    }
}

/// Something worth reporting while decoding or loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The magic word was accepted.
    RankRead { rank: u8 },
    /// One dimension word was read.
    DimensionRead { index: usize, extent: u32 },
    /// The header is complete and the payload buffer is reserved.
    PayloadAllocated { bytes: usize },
    /// Bytes arrived after the payload was complete and were ignored.
    TrailingBytes { count: usize },
    /// The magic word was rejected.
    InvalidHeader { magic: u32 },
    /// The stream ended early; the partial tensor is discarded.
    Incomplete {
        header_values_read: usize,
        values_read: usize,
    },
    /// A tensor finished decoding.
    Complete { shape: Shape },
    /// A dataset load started reading one of its files.
    Loading { role: TensorRole, path: PathBuf },
    /// A decoded tensor had the wrong rank for its role.
    InvalidShape { role: TensorRole, rank: usize },
    /// Images and labels disagree in count; the dataset is still usable.
    CountMismatch { images: usize, labels: usize },
}

/// Receives decoder and dataset events.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> Observer for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &Event) {
        match event {
            Event::RankRead { rank } => tracing::debug!("{} matrix dimensions", rank),
            Event::DimensionRead { index, extent } => {
                tracing::debug!("dimension {}: {}", index, extent)
            }
            Event::PayloadAllocated { bytes } => {
                tracing::trace!("allocated {} payload bytes", bytes)
            }
            Event::TrailingBytes { count } => {
                tracing::debug!("ignoring {} bytes after payload", count)
            }
            Event::InvalidHeader { magic } if magic & 0xFFFF_FF00 == 0x800 => {
                tracing::error!("dimension byte set as 0")
            }
            Event::InvalidHeader { magic } => tracing::error!("invalid magic number: {:#x}", magic),
            Event::Incomplete {
                header_values_read,
                values_read,
            } => tracing::warn!(
                header_values_read,
                values_read,
                "data not complete; discarding"
            ),
            Event::Complete { shape } => tracing::debug!("decoded tensor {}", shape),
            Event::Loading { role, path } => {
                tracing::info!("loading {} file: {}", role, path.display())
            }
            Event::InvalidShape { role, rank } => {
                tracing::error!("{} file has {} dimensions", role, rank)
            }
            Event::CountMismatch { images, labels } => tracing::warn!(
                "images & labels do not match in number! ({} vs {})",
                images,
                labels
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&self, _event: &Event) {}
}

/// The observer used when none is supplied.
pub fn default_observer() -> Arc<dyn Observer> {
    Arc::new(TracingObserver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn Observer> =
            Arc::new(move |e: &Event| sink.lock().unwrap().push(e.clone()));

        observer.on_event(&Event::RankRead { rank: 3 });
        observer.on_event(&Event::TrailingBytes { count: 2 });

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![Event::RankRead { rank: 3 }, Event::TrailingBytes { count: 2 }]
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(TensorRole::Labels.to_string(), "label");
        assert_eq!(TensorRole::Images.to_string(), "image");
    }

    #[test]
    fn test_tracing_observer_accepts_every_event() {
        let observer = TracingObserver;
        for event in [
            Event::InvalidHeader { magic: 0x0800 },
            Event::InvalidHeader { magic: 0x0900 },
            Event::CountMismatch {
                images: 100,
                labels: 90,
            },
            Event::Complete {
                shape: Shape::from(5),
            },
        ] {
            observer.on_event(&event);
        }
    }
}

// Decoder and loader configuration

/// Tuning for [`IdxDecoder`](crate::IdxDecoder) and the stream drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Size of the buffer chunks are read into. Any size works, including 1;
    /// it only trades syscalls for memory.
    pub read_buffer_size: usize,
    /// Refuse payloads larger than this many bytes. `None` means no limit
    /// beyond what the allocator will hand out.
    pub max_payload_bytes: Option<usize>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 256,
            max_payload_bytes: None,
        }
    }
}

impl DecoderConfig {
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }
}

/// Configuration for [`SampleDataset`](crate::SampleDataset) loads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadConfig {
    /// Decoder settings applied to both the label and the image file.
    pub decoder: DecoderConfig,
    /// Human-readable dataset name.
    pub name: Option<String>,
}

impl LoadConfig {
    pub fn decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

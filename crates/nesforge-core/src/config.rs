//! Console configuration.
//!
//! Everything that would otherwise live in process-wide preferences (region
//! override, buffer sizing) is gathered into [`ConsoleConfig`], built once by
//! the host and handed to [`crate::Console::new`].

pub mod region;

pub use region::Region;

/// Default capacity of the expansion audio sample buffer.
pub const DEFAULT_SAMPLE_BUFFER_LEN: usize = 4096;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Region override; `Region::Auto` follows the cartridge header.
    pub region: Region,
    /// Maximum number of samples kept before the host drains them.
    pub sample_buffer_len: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            region: Region::Auto,
            sample_buffer_len: DEFAULT_SAMPLE_BUFFER_LEN,
        }
    }
}

impl ConsoleConfig {
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    pub fn with_sample_buffer_len(mut self, len: usize) -> Self {
        self.sample_buffer_len = len;
        self
    }
}

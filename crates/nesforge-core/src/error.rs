use thiserror::Error;

/// Errors raised while turning a cartridge image into a running console.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The header names a mapper the registry does not implement.
    #[error("unsupported mapper: {id}")]
    UnsupportedMapper { id: u16 },
    /// A ROM section violates the power-of-two sizing the bank tables rely on.
    #[error("{section} size {len} is not a non-zero power of two")]
    InvalidImage { section: &'static str, len: usize },
}

//! Fixed-layout binary save states.
//!
//! A blob is exactly [`STATE_CAPACITY`] bytes of big-endian fields, zero
//! padded at the end:
//!
//! | Section   | Contents                                                        |
//! |-----------|-----------------------------------------------------------------|
//! | header    | magic `NFST`, format version, mapper id, PRG CRC32              |
//! | cpu       | registers, interrupt lines, cycle counter                       |
//! | ppu       | last register writes (replayed), latches, OAM, palette          |
//! | cartridge | region, mirroring, PRG/CHR RAM, nametables, extra, board, audio |
//! | ram       | 2 KiB work RAM                                                  |
//!
//! Conditional fields (PRG RAM, CHR RAM, extra state, board registers,
//! expansion chip) are decided by querying the live console on both the save
//! and the load side, so the reader never needs stored presence flags.

pub mod cartridge;
pub mod console;
pub mod cpu;
pub mod ppu;

use std::ops::Deref;

use thiserror::Error;

/// Total size of every save-state blob.
pub const STATE_CAPACITY: usize = 0x10000;
/// Leading tag of every blob.
pub const STATE_MAGIC: [u8; 4] = *b"NFST";
/// Layout revision; bumped whenever the field order changes.
pub const STATE_FORMAT_VERSION: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("save state is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("save state magic does not match")]
    Magic,
    #[error("unsupported save state format version {found}")]
    Version { found: u16 },
    #[error("save state was taken on mapper {found}, cartridge uses mapper {expected}")]
    MapperMismatch { expected: u16, found: u16 },
    #[error("save state PRG checksum {found:#010x} does not match cartridge {expected:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },
    #[error("save state ended at offset {offset} while reading {field}")]
    Truncated { offset: usize, field: &'static str },
    #[error("save state needs more than {capacity} bytes")]
    Overflow { capacity: usize },
    #[error("invalid {field} code {value}")]
    InvalidField { field: &'static str, value: u8 },
}

/// A complete snapshot, always [`STATE_CAPACITY`] bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStateBlob(Box<[u8]>);

impl SaveStateBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0.into_vec()
    }
}

impl Deref for SaveStateBlob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for SaveStateBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Components that serialize themselves into a section of the blob.
///
/// Implementations must visit fields in the same order on both sides.
pub trait SaveState {
    fn save_state(&self, w: &mut StateWriter);

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError>;
}

/// Append-only big-endian field writer.
#[derive(Debug, Default)]
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(STATE_CAPACITY),
        }
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pad to [`STATE_CAPACITY`]; fails if the sections did not fit.
    pub fn finish(mut self) -> Result<SaveStateBlob, StateError> {
        if self.buf.len() > STATE_CAPACITY {
            return Err(StateError::Overflow {
                capacity: STATE_CAPACITY,
            });
        }
        self.buf.resize(STATE_CAPACITY, 0);
        Ok(SaveStateBlob(self.buf.into_boxed_slice()))
    }
}

/// Bounds-checked big-endian field reader.
#[derive(Debug)]
pub struct StateReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StateReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], StateError> {
        let truncated = StateError::Truncated {
            offset: self.pos,
            field,
        };
        let end = self.pos.checked_add(len).ok_or(truncated.clone())?;
        let bytes = self.data.get(self.pos..end).ok_or(truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], StateError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    pub fn u8(&mut self, field: &'static str) -> Result<u8, StateError> {
        Ok(self.array::<1>(field)?[0])
    }

    pub fn bool(&mut self, field: &'static str) -> Result<bool, StateError> {
        Ok(self.u8(field)? != 0)
    }

    pub fn u16(&mut self, field: &'static str) -> Result<u16, StateError> {
        self.array(field).map(u16::from_be_bytes)
    }

    pub fn u32(&mut self, field: &'static str) -> Result<u32, StateError> {
        self.array(field).map(u32::from_be_bytes)
    }

    pub fn i32(&mut self, field: &'static str) -> Result<i32, StateError> {
        self.array(field).map(i32::from_be_bytes)
    }

    pub fn u64(&mut self, field: &'static str) -> Result<u64, StateError> {
        self.array(field).map(u64::from_be_bytes)
    }

    /// Fill `out` from the next `out.len()` bytes.
    pub fn bytes_into(&mut self, out: &mut [u8], field: &'static str) -> Result<(), StateError> {
        out.copy_from_slice(self.take(out.len(), field)?);
        Ok(())
    }
}

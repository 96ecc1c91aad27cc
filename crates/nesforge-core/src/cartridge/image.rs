//! Immutable cartridge contents handed to the core by the ROM loader.

use std::sync::Arc;

use crate::{cartridge::header::Header, error::Error};

/// Size of the CHR RAM fitted to boards that ship without CHR ROM.
pub const CHR_RAM_SIZE: usize = 8 * 1024;

/// PRG checksums of boards that wire no PRG RAM even though their headers
/// claim otherwise. Mapping RAM there breaks their open-bus dependent code.
const NO_PRG_RAM_CRCS: &[u32] = &[
    0x4124_3492, // Low G Man (U)
    0x98CC_D385, // Low G Man (U) (Rev 1)
];

/// PRG/CHR data plus the decoded header, validated once at load time.
///
/// Backing arrays are reference counted so that cloning a console (for
/// transactional restores) never copies ROM contents.
#[derive(Debug, Clone)]
pub struct CartridgeImage {
    header: Header,
    prg: Arc<[u8]>,
    chr: Arc<[u8]>,
    prg_crc32: u32,
}

impl CartridgeImage {
    /// Validate and wrap the sections of a split ROM file.
    ///
    /// PRG must be a non-empty power of two; CHR must be empty (the board
    /// then carries [`CHR_RAM_SIZE`] bytes of CHR RAM) or a power of two.
    pub fn new(header: Header, prg: Vec<u8>, chr: Vec<u8>) -> Result<Self, Error> {
        if !prg.len().is_power_of_two() {
            tracing::warn!(len = prg.len(), "rejecting PRG section");
            return Err(Error::InvalidImage {
                section: "PRG",
                len: prg.len(),
            });
        }
        if !chr.is_empty() && !chr.len().is_power_of_two() {
            tracing::warn!(len = chr.len(), "rejecting CHR section");
            return Err(Error::InvalidImage {
                section: "CHR",
                len: chr.len(),
            });
        }

        let prg_crc32 = crc32fast::hash(&prg);
        Ok(Self {
            header,
            prg: prg.into(),
            chr: chr.into(),
            prg_crc32,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper_id(&self) -> u16 {
        self.header.mapper
    }

    pub fn prg(&self) -> &Arc<[u8]> {
        &self.prg
    }

    pub fn chr(&self) -> &Arc<[u8]> {
        &self.chr
    }

    /// `true` when the board carries writable CHR RAM instead of CHR ROM.
    pub fn has_chr_ram(&self) -> bool {
        self.chr.is_empty()
    }

    /// CRC32 of the PRG section, stamped into save states.
    pub fn prg_crc32(&self) -> u32 {
        self.prg_crc32
    }

    /// Whether `$6000-$7FFF` is backed by PRG RAM on this board.
    pub fn has_prg_ram(&self) -> bool {
        self.header.prg_ram_present && !NO_PRG_RAM_CRCS.contains(&self.prg_crc32)
    }
}

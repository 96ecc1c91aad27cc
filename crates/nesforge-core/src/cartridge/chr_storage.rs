//! CHR backing storage.
//!
//! A board exposes either CHR ROM (shared with the [`CartridgeImage`]) or a
//! private block of CHR RAM to the PPU. Bank tables index into whichever one
//! is present, so both variants expose a single flat byte array.
//!
//! [`CartridgeImage`]: crate::cartridge::image::CartridgeImage

use std::sync::Arc;

use crate::cartridge::image::CHR_RAM_SIZE;

#[derive(Debug, Clone)]
pub enum ChrStorage {
    /// Read-only CHR ROM from the cartridge image.
    Rom(Arc<[u8]>),
    /// Writable CHR RAM on the cartridge.
    Ram(Box<[u8]>),
}

impl ChrStorage {
    /// CHR ROM when the image carries any, otherwise 8 KiB of zeroed CHR RAM.
    pub fn from_image(chr: &Arc<[u8]>) -> Self {
        if chr.is_empty() {
            ChrStorage::Ram(vec![0; CHR_RAM_SIZE].into_boxed_slice())
        } else {
            ChrStorage::Rom(Arc::clone(chr))
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ram(&self) -> bool {
        matches!(self, ChrStorage::Ram(_))
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            ChrStorage::Rom(rom) => rom,
            ChrStorage::Ram(ram) => ram,
        }
    }

    /// Read a byte at an absolute offset (already resolved by the bank table).
    #[inline]
    pub fn read(&self, offset: usize) -> u8 {
        self.bytes().get(offset).copied().unwrap_or(0)
    }

    /// Write a byte at an absolute offset; ignored for CHR ROM.
    #[inline]
    pub fn write(&mut self, offset: usize, value: u8) {
        if let ChrStorage::Ram(ram) = self {
            if let Some(slot) = ram.get_mut(offset) {
                *slot = value;
            }
        }
    }

    pub fn as_ram(&self) -> Option<&[u8]> {
        match self {
            ChrStorage::Ram(ram) => Some(ram),
            ChrStorage::Rom(_) => None,
        }
    }

    pub fn as_ram_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            ChrStorage::Ram(ram) => Some(ram),
            ChrStorage::Rom(_) => None,
        }
    }
}

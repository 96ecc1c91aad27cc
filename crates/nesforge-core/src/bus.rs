//! Short-lived views that route one access to the part that owns it.
//!
//! Neither the PPU nor the cartridge holds a reference to the other; the
//! console builds a view borrowing the pieces it needs for the duration of
//! an access and drops it straight after.

pub mod cpu;
pub mod ppu;

pub use cpu::CpuBus;
pub use ppu::PpuBus;

/// Byte-wide address bus. Reads take `&mut self` because several devices
/// change state when read (PPU status, buffered VRAM data, CHR latches).
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);
}

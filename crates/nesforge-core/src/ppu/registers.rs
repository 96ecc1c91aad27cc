//! Bit layouts of `$2000-$2002` and the internal `v/t/x/w` scroll latches.

use bitflags::bitflags;

use crate::memory::ppu as ppu_mem;

bitflags! {
    /// `$2000` PPUCTRL.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N M S B s I n n
    /// ```
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Control: u8 {
        const NAMETABLE = 0b0000_0011;
        /// VRAM address step on `$2007`: 1 when clear, 32 when set.
        const INCREMENT_32 = 0b0000_0100;
        const SPRITE_TABLE = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16 = 0b0010_0000;
        const MASTER_SLAVE = 0b0100_0000;
        const GENERATE_NMI = 0b1000_0000;
    }
}

impl Control {
    pub fn nametable_index(self) -> u8 {
        self.bits() & 0b11
    }

    pub fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) { 32 } else { 1 }
    }

    pub fn sprite_pattern_table(self) -> u16 {
        if self.contains(Control::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    pub fn background_pattern_table(self) -> u16 {
        if self.contains(Control::BACKGROUND_TABLE) { 0x1000 } else { 0x0000 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}

bitflags! {
    /// `$2001` PPUMASK.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mask: u8 {
        const GRAYSCALE = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        const SHOW_BACKGROUND = 0b0000_1000;
        const SHOW_SPRITES = 0b0001_0000;
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl Mask {
    /// Either layer on means the PPU fetches patterns every visible line.
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }
}

bitflags! {
    /// `$2002` PPUSTATUS; only the top three bits are driven.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VERTICAL_BLANK = 0b1000_0000;
    }
}

/// Loopy's scroll latches: current address `v`, temporary address `t`, fine
/// X and the shared `$2005/$2006` write toggle.
///
/// ```text
/// yyy NN YYYYY XXXXX
/// |   |  |     +-- coarse X
/// |   |  +-------- coarse Y
/// |   +----------- nametable select
/// +--------------- fine Y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScrollRegisters {
    pub v: u16,
    pub t: u16,
    pub x: u8,
    pub w: bool,
}

const ADDR_MASK: u16 = 0x7FFF;
const NAMETABLE_BITS: u16 = 0x0C00;
const COARSE_X_BITS: u16 = 0x001F;
const COARSE_Y_BITS: u16 = 0x03E0;
const FINE_Y_BITS: u16 = 0x7000;

impl ScrollRegisters {
    pub fn set_nametable(&mut self, index: u8) {
        self.t = (self.t & !NAMETABLE_BITS) | (u16::from(index & 0b11) << 10);
    }

    /// `$2005`: coarse/fine X on the first write, coarse/fine Y on the second.
    pub fn write_scroll(&mut self, value: u8) {
        if self.w {
            self.t = (self.t & !(COARSE_Y_BITS | FINE_Y_BITS))
                | (u16::from(value >> 3) << 5)
                | (u16::from(value & 0b111) << 12);
        } else {
            self.t = (self.t & !COARSE_X_BITS) | u16::from(value >> 3);
            self.x = value & 0b111;
        }
        self.w = !self.w;
    }

    /// `$2006`: high six bits then low byte. Returns the new `v` once the
    /// second write copies `t` across.
    pub fn write_addr(&mut self, value: u8) -> Option<u16> {
        let complete = self.w;
        if complete {
            self.t = (self.t & 0x7F00) | u16::from(value);
            self.v = self.t;
        } else {
            self.t = (self.t & 0x00FF) | (u16::from(value & 0x3F) << 8);
        }
        self.w = !self.w;
        complete.then_some(self.v)
    }

    pub fn increment(&mut self, step: u16) {
        self.v = self.v.wrapping_add(step) & ADDR_MASK;
    }

    /// Address the PPU drives for a `$2007` access.
    pub fn bus_addr(&self) -> u16 {
        self.v & ppu_mem::VRAM_MIRROR_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut s = ScrollRegisters::default();
        s.write_scroll(0b0111_1101);
        s.write_scroll(0b0101_1110);
        assert_eq!(s.t & COARSE_X_BITS, 0b01111);
        assert_eq!(s.x, 0b101);
        assert_eq!((s.t & COARSE_Y_BITS) >> 5, 0b01011);
        assert_eq!((s.t & FINE_Y_BITS) >> 12, 0b110);
        assert!(!s.w);
    }

    #[test]
    fn addr_second_write_copies_t_into_v() {
        let mut s = ScrollRegisters::default();
        assert_eq!(s.write_addr(0xFF), None);
        assert_eq!(s.t, 0x3F00);
        assert_eq!(s.write_addr(0x10), Some(0x3F10));
        assert_eq!(s.v, 0x3F10);
    }

    #[test]
    fn control_helpers() {
        let c = Control::from_bits_retain(0b1001_0110);
        assert_eq!(c.nametable_index(), 2);
        assert_eq!(c.vram_increment(), 32);
        assert_eq!(c.background_pattern_table(), 0x1000);
        assert_eq!(c.sprite_pattern_table(), 0x0000);
        assert!(c.nmi_enabled());
    }
}

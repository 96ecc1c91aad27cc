use crate::{
    bus::Bus,
    cartridge::Mapper,
    mem_block::ppu::PaletteRam,
    memory::ppu as ppu_mem,
};

/// PPU address space (`$0000-$3FFF`).
///
/// Pattern and nametable accesses go to the cartridge; `$3F00-$3FFF` hits the
/// PPU's own palette store. Every access also drives the address lines the
/// board may be watching.
pub struct PpuBus<'a> {
    mapper: &'a mut dyn Mapper,
    palette: &'a mut PaletteRam,
    frame_dot: u32,
}

impl<'a> PpuBus<'a> {
    pub fn new(mapper: &'a mut dyn Mapper, palette: &'a mut PaletteRam, frame_dot: u32) -> Self {
        Self {
            mapper,
            palette,
            frame_dot,
        }
    }

    /// Put `addr` on the PPU address bus without a data transfer.
    pub fn drive(&mut self, addr: u16) {
        self.mapper
            .check_a12(addr & ppu_mem::VRAM_MIRROR_MASK, self.frame_dot);
    }

    /// Sprite backdrop entries `$3F10/$14/$18/$1C` alias the background ones.
    pub fn palette_index(addr: u16) -> usize {
        let index = usize::from(addr) & (ppu_mem::PALETTE_RAM_SIZE - 1);
        if index & 0x13 == 0x10 {
            index & !0x10
        } else {
            index
        }
    }
}

impl Bus for PpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        self.drive(addr);
        if addr >= ppu_mem::PALETTE_BASE {
            self.palette[Self::palette_index(addr)]
        } else {
            self.mapper.ppu_read(addr)
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        self.drive(addr);
        if addr >= ppu_mem::PALETTE_BASE {
            self.palette[Self::palette_index(addr)] = value & 0x3F;
        } else {
            self.mapper.ppu_write(addr, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{CartridgeImage, Header, Mirroring, create_mapper};

    fn mapper(mirroring: Mirroring) -> Box<dyn Mapper> {
        let image = CartridgeImage::new(
            Header::new(0).with_mirroring(mirroring),
            vec![0; 0x4000],
            Vec::new(),
        )
        .unwrap();
        create_mapper(&image).unwrap()
    }

    #[test]
    fn palette_backdrop_mirrors() {
        let mut m = mapper(Mirroring::Vertical);
        let mut palette = PaletteRam::new();
        let mut bus = PpuBus::new(m.as_mut(), &mut palette, 0);
        bus.write(0x3F10, 0xFF);
        assert_eq!(bus.read(0x3F00), 0x3F);
        bus.write(0x3F05, 0x12);
        assert_eq!(bus.read(0x3F25), 0x12);
        assert_eq!(bus.read(0x3F15), 0x00);
    }

    #[test]
    fn address_wraps_at_14_bits() {
        let mut m = mapper(Mirroring::Horizontal);
        let mut palette = PaletteRam::new();
        let mut bus = PpuBus::new(m.as_mut(), &mut palette, 0);
        bus.write(0x6000, 0x44);
        assert_eq!(bus.read(0x2000), 0x44);
    }

    #[test]
    fn nametable_mirroring_through_bus() {
        let mut m = mapper(Mirroring::Vertical);
        let mut palette = PaletteRam::new();
        let mut bus = PpuBus::new(m.as_mut(), &mut palette, 0);
        bus.write(0x2005, 0x77);
        assert_eq!(bus.read(0x2805), 0x77);
        assert_eq!(bus.read(0x2405), 0xB0);
        // $3000-$3EFF folds onto the nametables.
        assert_eq!(bus.read(0x3005), 0x77);
    }
}

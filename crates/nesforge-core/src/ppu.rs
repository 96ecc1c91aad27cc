//! Picture Processing Unit register layer and scanline timer.
//!
//! Pixels are not produced here. What the console keeps is the state the CPU
//! can observe through `$2000-$2007`, the vblank/NMI timing, and the pattern
//! fetch pattern the cartridge sees on the PPU address bus while rendering
//! (which is what A12-clocked boards count).
//!
//! Time advances in fifths of a PPU dot so PAL's 3.2 dots per CPU cycle stays
//! an integer ratio; one scanline is `341 * 5` fifth-dots.

pub mod registers;

use crate::{
    bus::{Bus, PpuBus},
    cartridge::Mapper,
    config::Region,
    mem_block::ppu::{OamRam, PaletteRam},
    memory::ppu::{self as ppu_mem, Register as PpuRegister},
};

pub use registers::{Control, Mask, ScrollRegisters, Status};

/// PPU dots per scanline.
pub const DOTS_PER_SCANLINE: u32 = 341;
/// Scanlines that fetch and output pixels.
pub const VISIBLE_SCANLINES: u16 = 240;

/// Dots within a rendered line at which the pattern fetches switch tables.
const SPRITE_FETCH_DOT: u32 = 257;
const PREFETCH_DOT: u32 = 321;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ppu {
    pub(crate) control: Control,
    pub(crate) mask: Mask,
    pub(crate) status: Status,
    pub(crate) oam_addr: u8,
    pub(crate) scroll: ScrollRegisters,
    /// `$2007` read buffer for non-palette addresses.
    pub(crate) read_buffer: u8,
    /// Last value driven on the CPU-facing data bus.
    pub(crate) open_bus: u8,
    pub(crate) odd_frame: bool,
    /// Level of the /NMI output (`GENERATE_NMI && VERTICAL_BLANK`).
    pub(crate) nmi_output: bool,
    /// Rising edge of `nmi_output` not yet handed to the CPU.
    nmi_edge: bool,
    pub(crate) oam: OamRam,
    pub(crate) palette: PaletteRam,
    /// Most recent value written to each of the eight registers.
    pub(crate) last_writes: [u8; ppu_mem::REGISTER_COUNT],
    pub(crate) scanline: u16,
    /// Progress into the current scanline, in fifth-dots.
    pub(crate) fifth_dots: u32,
    region: Region,
}

impl Ppu {
    pub fn new(region: Region) -> Self {
        Self {
            control: Control::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            oam_addr: 0,
            scroll: ScrollRegisters::default(),
            read_buffer: 0,
            open_bus: 0,
            odd_frame: false,
            nmi_output: false,
            nmi_edge: false,
            oam: OamRam::new(),
            palette: PaletteRam::new(),
            last_writes: [0; ppu_mem::REGISTER_COUNT],
            scanline: 0,
            fifth_dots: 0,
            region,
        }
    }

    /// Warm reset: `$2000/$2001` and the write toggle clear, timing and
    /// memories are kept.
    pub fn reset(&mut self) {
        self.control = Control::empty();
        self.mask = Mask::empty();
        self.scroll.w = false;
        self.read_buffer = 0;
        self.odd_frame = false;
        self.update_nmi();
        self.nmi_edge = false;
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn scroll(&self) -> &ScrollRegisters {
        &self.scroll
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    pub fn palette(&self) -> &[u8] {
        &self.palette
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn odd_frame(&self) -> bool {
        self.odd_frame
    }

    pub fn nmi_output(&self) -> bool {
        self.nmi_output
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub(crate) fn set_region(&mut self, region: Region) {
        self.region = region;
    }

    /// Dot within the frame, as seen by A12 watchers.
    pub fn frame_dot(&self) -> u32 {
        u32::from(self.scanline) * DOTS_PER_SCANLINE + self.fifth_dots / 5
    }

    /// Hand a pending NMI edge to the caller, clearing it.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_edge)
    }

    pub(crate) fn clear_nmi_edge(&mut self) {
        self.nmi_edge = false;
    }

    fn update_nmi(&mut self) {
        let output =
            self.control.nmi_enabled() && self.status.contains(Status::VERTICAL_BLANK);
        if output && !self.nmi_output {
            self.nmi_edge = true;
        }
        self.nmi_output = output;
    }

    /// CPU write to `$2000-$2007`. This is the only path that mutates the
    /// register file, for execution and for restoring snapshots alike.
    pub fn write_register(&mut self, reg: PpuRegister, value: u8, mapper: &mut dyn Mapper) {
        self.last_writes[reg.index()] = value;
        self.open_bus = value;

        match reg {
            PpuRegister::Control => {
                self.control = Control::from_bits_retain(value);
                self.scroll.set_nametable(self.control.nametable_index());
                self.update_nmi();
            }
            PpuRegister::Mask => self.mask = Mask::from_bits_retain(value),
            PpuRegister::Status => {}
            PpuRegister::OamAddr => self.oam_addr = value,
            PpuRegister::OamData => {
                self.oam[usize::from(self.oam_addr)] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            PpuRegister::Scroll => self.scroll.write_scroll(value),
            PpuRegister::Addr => {
                if let Some(v) = self.scroll.write_addr(value) {
                    let frame_dot = self.frame_dot();
                    PpuBus::new(mapper, &mut self.palette, frame_dot).drive(v);
                }
            }
            PpuRegister::Data => {
                let frame_dot = self.frame_dot();
                let addr = self.scroll.bus_addr();
                self.scroll.increment(self.control.vram_increment());
                let mut bus = PpuBus::new(mapper, &mut self.palette, frame_dot);
                bus.write(addr, value);
                bus.drive(self.scroll.bus_addr());
            }
        }
    }

    /// CPU read of `$2000-$2007`. Write-only registers return the open-bus
    /// latch.
    pub fn read_register(&mut self, reg: PpuRegister, mapper: &mut dyn Mapper) -> u8 {
        let value = match reg {
            PpuRegister::Status => {
                let value = (self.status.bits() & 0xE0) | (self.open_bus & 0x1F);
                self.status.remove(Status::VERTICAL_BLANK);
                self.scroll.w = false;
                self.update_nmi();
                value
            }
            PpuRegister::OamData => self.oam[usize::from(self.oam_addr)],
            PpuRegister::Data => {
                let frame_dot = self.frame_dot();
                let addr = self.scroll.bus_addr();
                self.scroll.increment(self.control.vram_increment());
                let mut bus = PpuBus::new(mapper, &mut self.palette, frame_dot);
                let value = if addr >= ppu_mem::PALETTE_BASE {
                    // Palette reads bypass the buffer, which picks up the
                    // nametable byte underneath instead.
                    let value = bus.read(addr) | (self.open_bus & 0xC0);
                    self.read_buffer = bus.read(addr & 0x2FFF);
                    value
                } else {
                    let value = self.read_buffer;
                    self.read_buffer = bus.read(addr);
                    value
                };
                bus.drive(self.scroll.bus_addr());
                value
            }
            _ => self.open_bus,
        };
        self.open_bus = value;
        value
    }

    /// Run the scanline timer forward by `fifth_dots`.
    pub fn advance(&mut self, fifth_dots: u32, mapper: &mut dyn Mapper) {
        self.fifth_dots += fifth_dots;
        while self.fifth_dots >= Region::scanline_fifth_dots() {
            self.fifth_dots -= Region::scanline_fifth_dots();
            self.finish_scanline(mapper);
        }
    }

    fn finish_scanline(&mut self, mapper: &mut dyn Mapper) {
        let line = self.scanline;
        let lines = self.region.scanlines_per_frame();
        let pre_render = lines - 1;

        if self.mask.rendering_enabled() && (line < VISIBLE_SCANLINES || line == pre_render) {
            let base = u32::from(line) * DOTS_PER_SCANLINE;
            let background = self.control.background_pattern_table();
            mapper.check_a12(background, base);
            mapper.check_a12(self.control.sprite_pattern_table(), base + SPRITE_FETCH_DOT);
            mapper.check_a12(background, base + PREFETCH_DOT);
            mapper.notify_scanline(line);
        }

        self.scanline += 1;
        if self.scanline == self.region.vblank_scanline() {
            self.status.insert(Status::VERTICAL_BLANK);
            self.update_nmi();
        } else if self.scanline == pre_render {
            self.status.remove(
                Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
            );
            self.update_nmi();
        } else if self.scanline >= lines {
            self.scanline = 0;
            self.odd_frame = !self.odd_frame;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{CartridgeImage, Header, create_mapper, mapper::paged_image};

    fn nrom() -> Box<dyn Mapper> {
        let image = CartridgeImage::new(Header::new(0), vec![0; 0x4000], Vec::new()).unwrap();
        create_mapper(&image).unwrap()
    }

    fn advance_lines(ppu: &mut Ppu, lines: u32, mapper: &mut dyn Mapper) {
        ppu.advance(lines * Region::scanline_fifth_dots(), mapper);
    }

    #[test]
    fn data_port_reads_are_buffered() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        m.ppu_write(0x2000, 0x11);
        m.ppu_write(0x2001, 0x22);

        ppu.write_register(PpuRegister::Addr, 0x20, m.as_mut());
        ppu.write_register(PpuRegister::Addr, 0x00, m.as_mut());
        let _ = ppu.read_register(PpuRegister::Data, m.as_mut());
        assert_eq!(ppu.read_register(PpuRegister::Data, m.as_mut()), 0x11);
        assert_eq!(ppu.read_register(PpuRegister::Data, m.as_mut()), 0x22);
        assert_eq!(ppu.scroll().v, 0x2003);
    }

    #[test]
    fn palette_reads_skip_the_buffer() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        m.ppu_write(0x2F10, 0x5A);

        ppu.write_register(PpuRegister::Addr, 0x3F, m.as_mut());
        ppu.write_register(PpuRegister::Addr, 0x00, m.as_mut());
        ppu.write_register(PpuRegister::Data, 0x2C, m.as_mut());

        ppu.write_register(PpuRegister::Addr, 0x3F, m.as_mut());
        ppu.write_register(PpuRegister::Addr, 0x10, m.as_mut());
        assert_eq!(ppu.read_register(PpuRegister::Data, m.as_mut()) & 0x3F, 0x2C);
        assert_eq!(ppu.read_buffer, 0x5A);
    }

    #[test]
    fn increment_32_steps_down_a_column() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        ppu.write_register(PpuRegister::Control, 0x04, m.as_mut());
        ppu.write_register(PpuRegister::Addr, 0x20, m.as_mut());
        ppu.write_register(PpuRegister::Addr, 0x00, m.as_mut());
        ppu.write_register(PpuRegister::Data, 0x01, m.as_mut());
        ppu.write_register(PpuRegister::Data, 0x02, m.as_mut());
        assert_eq!(m.ppu_read(0x2000), 0x01);
        assert_eq!(m.ppu_read(0x2020), 0x02);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        advance_lines(&mut ppu, 241, m.as_mut());
        assert!(ppu.status().contains(Status::VERTICAL_BLANK));

        ppu.write_register(PpuRegister::Scroll, 0x10, m.as_mut());
        assert!(ppu.scroll().w);
        let value = ppu.read_register(PpuRegister::Status, m.as_mut());
        assert_eq!(value & 0x80, 0x80);
        assert_eq!(value & 0x1F, 0x10);
        assert!(!ppu.status().contains(Status::VERTICAL_BLANK));
        assert!(!ppu.scroll().w);
    }

    #[test]
    fn nmi_edge_on_vblank_and_late_enable() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        ppu.write_register(PpuRegister::Control, 0x80, m.as_mut());
        advance_lines(&mut ppu, 240, m.as_mut());
        assert!(!ppu.take_nmi());
        advance_lines(&mut ppu, 1, m.as_mut());
        assert!(ppu.take_nmi());
        assert!(!ppu.take_nmi());

        // Toggling the enable bit inside vblank fires again.
        ppu.write_register(PpuRegister::Control, 0x00, m.as_mut());
        ppu.write_register(PpuRegister::Control, 0x80, m.as_mut());
        assert!(ppu.take_nmi());
    }

    #[test]
    fn frame_wraps_and_toggles_odd_frame() {
        for (region, lines) in [(Region::Ntsc, 262), (Region::Pal, 312), (Region::Dendy, 312)] {
            let mut ppu = Ppu::new(region);
            let mut m = nrom();
            advance_lines(&mut ppu, u32::from(region.vblank_scanline()), m.as_mut());
            assert!(ppu.status().contains(Status::VERTICAL_BLANK), "{region}");
            advance_lines(&mut ppu, u32::from(lines - region.vblank_scanline() - 1), m.as_mut());
            assert!(!ppu.status().contains(Status::VERTICAL_BLANK), "{region}");
            advance_lines(&mut ppu, 1, m.as_mut());
            assert_eq!(ppu.scanline(), 0);
            assert!(ppu.odd_frame());
        }
    }

    #[test]
    fn rendering_drives_mmc3_counter() {
        let image = paged_image(Header::new(4), 32, 8);
        let mut m = create_mapper(&image).unwrap();
        m.cpu_write(0xC000, 3);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        let mut ppu = Ppu::new(Region::Ntsc);
        // Background at $0000, sprites at $1000.
        ppu.write_register(PpuRegister::Control, 0x08, m.as_mut());
        advance_lines(&mut ppu, 4, m.as_mut());
        assert!(!m.irq_pending(), "rendering disabled");

        ppu.write_register(PpuRegister::Mask, 0x18, m.as_mut());
        advance_lines(&mut ppu, 3, m.as_mut());
        assert!(!m.irq_pending());
        advance_lines(&mut ppu, 1, m.as_mut());
        assert!(m.irq_pending());
    }

    #[test]
    fn partial_steps_accumulate() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        for _ in 0..113 {
            ppu.advance(15, m.as_mut());
        }
        assert_eq!(ppu.scanline(), 0);
        ppu.advance(15, m.as_mut());
        assert_eq!(ppu.scanline(), 1);
        assert_eq!(ppu.fifth_dots, 114 * 15 - 1705);
    }

    #[test]
    fn oam_data_auto_increments() {
        let mut ppu = Ppu::new(Region::Ntsc);
        let mut m = nrom();
        ppu.write_register(PpuRegister::OamAddr, 0xFF, m.as_mut());
        ppu.write_register(PpuRegister::OamData, 0xAA, m.as_mut());
        ppu.write_register(PpuRegister::OamData, 0xBB, m.as_mut());
        assert_eq!(ppu.oam()[0xFF], 0xAA);
        assert_eq!(ppu.oam()[0x00], 0xBB);
        assert_eq!(ppu.last_writes[4], 0xBB);
    }
}

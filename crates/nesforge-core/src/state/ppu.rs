use crate::{
    cartridge::Mapper,
    memory::{
        cpu as cpu_mem,
        ppu::{self as ppu_mem, Register as PpuRegister},
    },
    ppu::{Ppu, Status},
    state::{StateError, StateReader, StateWriter},
};

impl Ppu {
    pub(crate) fn save_state(&self, w: &mut StateWriter) {
        w.bytes(&self.last_writes);
        w.bool(self.odd_frame);
        w.u8(self.open_bus);
        w.u8(self.read_buffer);
        w.u8(self.status.bits());
        w.bool(self.nmi_output);
        w.u8(self.scroll.x);
        w.u16(self.scroll.v);
        w.u16(self.scroll.t);
        w.bool(self.scroll.w);
        w.u8(self.oam_addr);
        w.u16(self.scanline);
        w.u32(self.fifth_dots);
        w.bytes(&self.oam);
        w.bytes(&self.palette);
    }

    /// Replays the saved register writes through [`Ppu::write_register`] so
    /// the cartridge sees the same address-bus activity, then overwrites the
    /// latches with their saved values.
    pub(crate) fn load_state(
        &mut self,
        r: &mut StateReader<'_>,
        mapper: &mut dyn Mapper,
    ) -> Result<(), StateError> {
        let mut writes = [0u8; ppu_mem::REGISTER_COUNT];
        r.bytes_into(&mut writes, "ppu register writes")?;
        for (offset, value) in (0u16..).zip(writes) {
            let reg = PpuRegister::from_cpu_addr(cpu_mem::PPU_REGISTER_BASE + offset);
            self.write_register(reg, value, mapper);
        }

        self.odd_frame = r.bool("ppu odd frame")?;
        self.open_bus = r.u8("ppu open bus")?;
        self.read_buffer = r.u8("ppu read buffer")?;
        self.status = Status::from_bits_truncate(r.u8("ppu status")?);
        self.nmi_output = r.bool("ppu nmi output")?;
        self.scroll.x = r.u8("ppu fine x")? & 0x07;
        self.scroll.v = r.u16("ppu v")? & 0x7FFF;
        self.scroll.t = r.u16("ppu t")? & 0x7FFF;
        self.scroll.w = r.bool("ppu write toggle")?;
        self.oam_addr = r.u8("ppu oam address")?;
        self.scanline = r.u16("ppu scanline")?;
        self.fifth_dots = r.u32("ppu scanline progress")?;
        r.bytes_into(&mut self.oam, "ppu oam")?;
        r.bytes_into(&mut self.palette, "ppu palette")?;
        self.clear_nmi_edge();
        Ok(())
    }
}

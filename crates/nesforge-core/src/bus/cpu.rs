use crate::{
    bus::Bus,
    cartridge::{Mapper, banks::open_bus},
    mem_block::cpu as cpu_ram,
    memory::{cpu as cpu_mem, ppu::Register as PpuRegister},
    ppu::Ppu,
};

/// CPU-visible bus that bridges accesses to work RAM, the PPU register file
/// and the cartridge. It borrows the hardware from the owning console.
#[derive(Debug)]
pub struct CpuBus<'a> {
    ram: &'a mut cpu_ram::Ram,
    ppu: &'a mut Ppu,
    mapper: &'a mut dyn Mapper,
}

impl<'a> CpuBus<'a> {
    pub(crate) fn new(
        ram: &'a mut cpu_ram::Ram,
        ppu: &'a mut Ppu,
        mapper: &'a mut dyn Mapper,
    ) -> Self {
        Self { ram, ppu, mapper }
    }
}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[usize::from(addr & cpu_mem::INTERNAL_RAM_MASK)]
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => self
                .ppu
                .read_register(PpuRegister::from_cpu_addr(addr), self.mapper),
            cpu_mem::APU_REGISTER_BASE..=cpu_mem::APU_IO_END => open_bus(addr),
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => self.mapper.cpu_mem_read(addr),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[usize::from(addr & cpu_mem::INTERNAL_RAM_MASK)] = value;
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                self.ppu
                    .write_register(PpuRegister::from_cpu_addr(addr), value, self.mapper);
            }
            cpu_mem::APU_REGISTER_BASE..=cpu_mem::APU_IO_END => {
                tracing::trace!(addr = format_args!("{addr:#06X}"), value, "unmapped io write");
            }
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => {
                self.mapper.cpu_write(addr, value);
            }
        }
    }
}

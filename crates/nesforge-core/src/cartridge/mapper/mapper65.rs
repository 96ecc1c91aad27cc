//! Mapper 65 (Irem H3001).
//!
//! | Area | Address range | Behaviour                                     | IRQ/Audio     |
//! |------|---------------|-----------------------------------------------|---------------|
//! | CPU  | `$8000`       | PRG bank `$8000` (8 KiB)                      | None          |
//! | CPU  | `$9001`       | Mirroring (bit 7: 1 = horizontal)             | None          |
//! | CPU  | `$9003`       | IRQ enable (bit 7), acknowledge               | CPU-cycle IRQ |
//! | CPU  | `$9004`       | Reload counter from latch, acknowledge        | CPU-cycle IRQ |
//! | CPU  | `$9005-$9006` | IRQ latch high / low byte                     | CPU-cycle IRQ |
//! | CPU  | `$A000`       | PRG bank `$A000` (8 KiB)                      | None          |
//! | CPU  | `$B000-$B007` | Eight 1 KiB CHR banks                         | None          |
//! | CPU  | `$C000`       | PRG bank `$C000` (8 KiB)                      | None          |
//!
//! The 16-bit counter decrements every CPU cycle while enabled and raises
//! the IRQ once when it reaches zero.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::BankedAddressSpace,
        header::Mirroring,
        image::CartridgeImage,
        mapper::{CycleIrq, Mapper},
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

#[derive(Debug, Clone)]
pub struct Mapper65 {
    banks: BankedAddressSpace,
    prg_banks: [u8; 3],
    chr_banks: [u8; 8],
    irq_latch: u16,
    irq_counter: u16,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper65 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            prg_banks: [0, 1, 0xFE],
            chr_banks: [0, 1, 2, 3, 4, 5, 6, 7],
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            irq_pending: false,
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        for (slot, &bank) in self.prg_banks.iter().enumerate() {
            self.banks.map_prg_8k(slot, usize::from(bank));
        }
        let last = self.banks.last_prg_bank(8);
        self.banks.map_prg_8k(3, last);
        for (slot, &bank) in self.chr_banks.iter().enumerate() {
            self.banks.map_chr_1k(slot, usize::from(bank));
        }
    }
}

impl Mapper for Mapper65 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x8000 => self.prg_banks[0] = value,
            0xA000 => self.prg_banks[1] = value,
            0xC000 => self.prg_banks[2] = value,
            0x9001 => {
                self.banks
                    .set_mirroring(Mirroring::from_vh_bit(value & 0x80 != 0));
                return;
            }
            0x9003 => {
                self.irq_enabled = value & 0x80 != 0;
                self.irq_pending = false;
                return;
            }
            0x9004 => {
                self.irq_counter = self.irq_latch;
                self.irq_pending = false;
                return;
            }
            0x9005 => {
                self.irq_latch = (self.irq_latch & 0x00FF) | (u16::from(value) << 8);
                return;
            }
            0x9006 => {
                self.irq_latch = (self.irq_latch & 0xFF00) | u16::from(value);
                return;
            }
            0xB000..=0xB007 => self.chr_banks[usize::from(addr & 0x07)] = value,
            _ => {
                self.banks.cart_write(addr, value);
                return;
            }
        }
        self.update_banks();
    }

    fn mapper_id(&self) -> u16 {
        65
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Irem H3001")
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn reset(&mut self) {
        self.irq_enabled = false;
        self.irq_pending = false;
    }

    fn cycle_irq(&mut self) -> Option<&mut dyn CycleIrq> {
        Some(self)
    }

    fn board_state(&self) -> Option<&dyn SaveState> {
        Some(self)
    }

    fn board_state_mut(&mut self) -> Option<&mut dyn SaveState> {
        Some(self)
    }
}

impl SaveState for Mapper65 {
    fn save_state(&self, w: &mut StateWriter) {
        w.bytes(&self.prg_banks);
        w.bytes(&self.chr_banks);
        w.u16(self.irq_latch);
        w.u16(self.irq_counter);
        w.bool(self.irq_enabled);
        w.bool(self.irq_pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        r.bytes_into(&mut self.prg_banks, "h3001 prg banks")?;
        r.bytes_into(&mut self.chr_banks, "h3001 chr banks")?;
        self.irq_latch = r.u16("h3001 irq latch")?;
        self.irq_counter = r.u16("h3001 irq counter")?;
        self.irq_enabled = r.bool("h3001 irq enable")?;
        self.irq_pending = r.bool("h3001 irq pending")?;
        self.update_banks();
        Ok(())
    }
}

impl CycleIrq for Mapper65 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        if !self.irq_enabled || self.irq_counter == 0 {
            return;
        }
        let remaining = u32::from(self.irq_counter);
        if cycles >= remaining {
            self.irq_counter = 0;
            self.irq_pending = true;
        } else {
            self.irq_counter = (remaining - cycles) as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn h3001() -> Mapper65 {
        Mapper65::new(&paged_image(Header::new(65), 256, 256))
    }

    #[test]
    fn power_on_layout() {
        let m = h3001();
        assert_eq!(m.cpu_read(0x8000), 0);
        assert_eq!(m.cpu_read(0xA000), 8);
        assert_eq!(m.cpu_read(0xC000), 240);
        assert_eq!(m.cpu_read(0xE000), 248);
    }

    #[test]
    fn bank_registers() {
        let mut m = h3001();
        m.cpu_write(0x8000, 3);
        m.cpu_write(0xC000, 4);
        m.cpu_write(0xB005, 0x42);
        assert_eq!(m.cpu_read(0x8000), 24);
        assert_eq!(m.cpu_read(0xC000), 32);
        assert_eq!(m.ppu_read(0x1400), 0x42);

        m.cpu_write(0x9001, 0x00);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        m.cpu_write(0x9001, 0x80);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn irq_counts_down_once() {
        let mut m = h3001();
        m.cpu_write(0x9005, 0x01);
        m.cpu_write(0x9006, 0x00);
        m.cpu_write(0x9004, 0);
        m.cpu_write(0x9003, 0x80);

        m.cpu_cycle(255);
        assert!(!m.irq_pending());
        m.cpu_cycle(1);
        assert!(m.irq_pending());

        m.cpu_write(0x9003, 0x80);
        m.cpu_cycle(1000);
        assert!(!m.irq_pending());
    }
}

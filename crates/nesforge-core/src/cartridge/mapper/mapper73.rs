//! Mapper 73 (Konami VRC3).
//!
//! | Area | Address range | Behaviour                                     | IRQ/Audio     |
//! |------|---------------|-----------------------------------------------|---------------|
//! | CPU  | `$6000-$7FFF` | 8 KiB PRG RAM                                 | None          |
//! | CPU  | `$8000-$BFFF` | IRQ latch, one nibble per 4 KiB page          | CPU-cycle IRQ |
//! | CPU  | `$C000-$CFFF` | IRQ control                                   | CPU-cycle IRQ |
//! | CPU  | `$D000-$DFFF` | IRQ acknowledge                               | CPU-cycle IRQ |
//! | CPU  | `$F000-$FFFF` | 16 KiB PRG bank at `$8000`                    | None          |
//!
//! The counter counts up every CPU cycle; on overflow it reloads from the
//! latch and raises the IRQ. In 8-bit mode only the low byte counts and
//! reloads.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::BankedAddressSpace,
        image::CartridgeImage,
        mapper::{CycleIrq, Mapper},
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

#[derive(Debug, Clone)]
pub struct Mapper73 {
    banks: BankedAddressSpace,
    prg_bank: u8,
    irq_latch: u16,
    irq_counter: u16,
    irq_enabled: bool,
    enable_after_ack: bool,
    eight_bit: bool,
    irq_pending: bool,
}

impl Mapper73 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            prg_bank: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            enable_after_ack: false,
            eight_bit: false,
            irq_pending: false,
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        let last = self.banks.last_prg_bank(16);
        self.banks.map_prg_16k(0, usize::from(self.prg_bank & 0x07));
        self.banks.map_prg_16k(1, last);
    }

    fn write_latch_nibble(&mut self, index: u16, value: u8) {
        let shift = index * 4;
        self.irq_latch = (self.irq_latch & !(0x0F << shift)) | (u16::from(value & 0x0F) << shift);
    }

    fn clock(&mut self) {
        if self.eight_bit {
            let low = (self.irq_counter & 0x00FF) as u8;
            if low == 0xFF {
                self.irq_counter = (self.irq_counter & 0xFF00) | (self.irq_latch & 0x00FF);
                self.irq_pending = true;
            } else {
                self.irq_counter = (self.irq_counter & 0xFF00) | u16::from(low + 1);
            }
        } else if self.irq_counter == 0xFFFF {
            self.irq_counter = self.irq_latch;
            self.irq_pending = true;
        } else {
            self.irq_counter += 1;
        }
    }
}

impl Mapper for Mapper73 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr & 0xF000 {
            0x8000..=0xB000 => self.write_latch_nibble((addr >> 12) - 0x8, value),
            0xC000 => {
                self.enable_after_ack = value & 0x01 != 0;
                self.irq_enabled = value & 0x02 != 0;
                self.eight_bit = value & 0x04 != 0;
                if self.irq_enabled {
                    self.irq_counter = self.irq_latch;
                }
                self.irq_pending = false;
            }
            0xD000 => {
                self.irq_pending = false;
                self.irq_enabled = self.enable_after_ack;
            }
            0xF000 => {
                self.prg_bank = value;
                self.update_banks();
            }
            _ => self.banks.cart_write(addr, value),
        }
    }

    fn mapper_id(&self) -> u16 {
        73
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("VRC3")
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

impl SaveState for Mapper73 {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.prg_bank);
        w.u16(self.irq_latch);
        w.u16(self.irq_counter);
        w.bool(self.irq_enabled);
        w.bool(self.enable_after_ack);
        w.bool(self.eight_bit);
        w.bool(self.irq_pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.prg_bank = r.u8("vrc3 prg bank")?;
        self.irq_latch = r.u16("vrc3 irq latch")?;
        self.irq_counter = r.u16("vrc3 irq counter")?;
        self.irq_enabled = r.bool("vrc3 irq enable")?;
        self.enable_after_ack = r.bool("vrc3 irq enable after ack")?;
        self.eight_bit = r.bool("vrc3 irq 8-bit mode")?;
        self.irq_pending = r.bool("vrc3 irq pending")?;
        self.update_banks();
        Ok(())
    }
}

impl CycleIrq for Mapper73 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        if !self.irq_enabled {
            return;
        }
        for _ in 0..cycles {
            self.clock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn vrc3() -> Mapper73 {
        Mapper73::new(&paged_image(Header::new(73), 128, 0))
    }

    fn set_latch(m: &mut Mapper73, latch: u16) {
        for i in 0..4u16 {
            m.cpu_write(0x8000 + i * 0x1000, (latch >> (i * 4)) as u8);
        }
    }

    #[test]
    fn prg_bank_switch() {
        let mut m = vrc3();
        m.cpu_write(0xF000, 3);
        assert_eq!(m.cpu_read(0x8000), 48);
        assert_eq!(m.cpu_read(0xC000), 112);
    }

    #[test]
    fn sixteen_bit_counter_overflow() {
        let mut m = vrc3();
        set_latch(&mut m, 0xFFF0);
        m.cpu_write(0xC000, 0x02);

        m.cpu_cycle(15);
        assert!(!m.irq_pending());
        m.cpu_cycle(1);
        assert!(m.irq_pending());

        m.cpu_write(0xD000, 0);
        assert!(!m.irq_pending());
        // No enable-after-ack: the counter has stopped.
        m.cpu_cycle(100);
        assert!(!m.irq_pending());
    }

    #[test]
    fn eight_bit_mode_ignores_high_byte() {
        let mut m = vrc3();
        set_latch(&mut m, 0x12FE);
        m.cpu_write(0xC000, 0x07);

        m.cpu_cycle(1);
        assert!(!m.irq_pending());
        m.cpu_cycle(1);
        assert!(m.irq_pending());

        // Acknowledge with enable-after-ack keeps it counting.
        m.cpu_write(0xD000, 0);
        m.cpu_cycle(2);
        assert!(m.irq_pending());
    }
}

//! Mappers 33 and 48 (Taito TC0190 / TC0690).
//!
//! | Area | Address range | Behaviour                                          | IRQ/Audio        |
//! |------|---------------|----------------------------------------------------|------------------|
//! | CPU  | `$8000`       | PRG bank `$8000` (8 KiB); bit 6 mirroring on 33    | None             |
//! | CPU  | `$8001`       | PRG bank `$A000` (8 KiB)                           | None             |
//! | CPU  | `$8002-$8003` | 2 KiB CHR banks at `$0000` / `$0800`               | None             |
//! | CPU  | `$A000-$A003` | 1 KiB CHR banks at `$1000-$1C00`                   | None             |
//! | CPU  | `$C000-$C003` | IRQ latch, reload, enable, disable+ack (48 only)   | Scanline counter |
//! | CPU  | `$E000`       | Mirroring bit 6 (48 only)                          | None             |
//!
//! `$C000` and `$E000` are the last two PRG banks, fixed.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::BankedAddressSpace,
        header::Mirroring,
        image::CartridgeImage,
        mapper::{Mapper, ScanlineIrq},
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

const VISIBLE_SCANLINES: u16 = 240;

#[derive(Debug, Clone)]
pub struct Mapper33 {
    banks: BankedAddressSpace,
    /// TC0690 boards (48) move mirroring to `$E000` and add the IRQ.
    tc0690: bool,
    prg_banks: [u8; 2],
    chr_2k: [u8; 2],
    chr_1k: [u8; 4],
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper33 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            tc0690: image.mapper_id() == 48,
            prg_banks: [0, 1],
            chr_2k: [0, 1],
            chr_1k: [4, 5, 6, 7],
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        let second_last = self.banks.prg_bank_count(8).saturating_sub(2);
        let last = self.banks.last_prg_bank(8);
        self.banks.map_prg_8k(0, usize::from(self.prg_banks[0] & 0x3F));
        self.banks.map_prg_8k(1, usize::from(self.prg_banks[1] & 0x3F));
        self.banks.map_prg_8k(2, second_last);
        self.banks.map_prg_8k(3, last);

        for (slot, &bank) in self.chr_2k.iter().enumerate() {
            self.banks.map_chr_2k(slot, usize::from(bank));
        }
        for (i, &bank) in self.chr_1k.iter().enumerate() {
            self.banks.map_chr_1k(4 + i, usize::from(bank));
        }
    }

    fn set_mirroring_bit(&mut self, value: u8) {
        self.banks
            .set_mirroring(Mirroring::from_vh_bit(value & 0x40 != 0));
    }
}

impl Mapper for Mapper33 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr < 0x8000 {
            self.banks.cart_write(addr, value);
            return;
        }

        match (addr & 0xE003, self.tc0690) {
            (0x8000, false) => {
                self.prg_banks[0] = value;
                self.set_mirroring_bit(value);
            }
            (0x8000, true) => self.prg_banks[0] = value,
            (0x8001, _) => self.prg_banks[1] = value,
            (0x8002, _) => self.chr_2k[0] = value,
            (0x8003, _) => self.chr_2k[1] = value,
            (0xA000..=0xA003, _) => self.chr_1k[usize::from(addr & 0x03)] = value,
            // The TC0690 latch counts up from the inverted value.
            (0xC000, true) => self.irq_latch = value ^ 0xFF,
            (0xC001, true) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (0xC002, true) => self.irq_enabled = true,
            (0xC003, true) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (0xE000, true) => self.set_mirroring_bit(value),
            _ => return,
        }
        self.update_banks();
    }

    fn mapper_id(&self) -> u16 {
        if self.tc0690 { 48 } else { 33 }
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(if self.tc0690 { "Taito TC0690" } else { "Taito TC0190" })
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

    fn scanline_irq(&mut self) -> Option<&mut dyn ScanlineIrq> {
        if self.tc0690 { Some(self) } else { None }
    }

    fn board_state(&self) -> Option<&dyn SaveState> {
        Some(self)
    }

    fn board_state_mut(&mut self) -> Option<&mut dyn SaveState> {
        Some(self)
    }
}

impl SaveState for Mapper33 {
    fn save_state(&self, w: &mut StateWriter) {
        w.bytes(&self.prg_banks);
        w.bytes(&self.chr_2k);
        w.bytes(&self.chr_1k);
        w.u8(self.irq_latch);
        w.u8(self.irq_counter);
        w.bool(self.irq_reload);
        w.bool(self.irq_enabled);
        w.bool(self.irq_pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        r.bytes_into(&mut self.prg_banks, "taito prg banks")?;
        r.bytes_into(&mut self.chr_2k, "taito chr 2k banks")?;
        r.bytes_into(&mut self.chr_1k, "taito chr 1k banks")?;
        self.irq_latch = r.u8("taito irq latch")?;
        self.irq_counter = r.u8("taito irq counter")?;
        self.irq_reload = r.bool("taito irq reload")?;
        self.irq_enabled = r.bool("taito irq enable")?;
        self.irq_pending = r.bool("taito irq pending")?;
        self.update_banks();
        Ok(())
    }
}

impl ScanlineIrq for Mapper33 {
    fn on_scanline(&mut self, scanline: u16) {
        if scanline >= VISIBLE_SCANLINES {
            return;
        }
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

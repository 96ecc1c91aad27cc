//! Mappers 21, 22, 23 and 25 (Konami VRC2 / VRC4).
//!
//! One chip family, four ids: the boards differ only in which CPU address
//! lines are wired to the chip's two register-select pins, and VRC2a (22)
//! drops the low CHR bank bit. Decoding both candidate line pairs at once
//! covers every submapper of an id.
//!
//! | Id | Boards         | A0 pin        | A1 pin        |
//! |----|----------------|---------------|---------------|
//! | 21 | VRC4a / VRC4c  | A1 or A6      | A2 or A7      |
//! | 22 | VRC2a          | A1            | A0            |
//! | 23 | VRC2b / VRC4e  | A0 or A2      | A1 or A3      |
//! | 25 | VRC2c / VRC4b  | A1 or A3      | A0 or A2      |
//!
//! | Area | Address range | Behaviour                                            | IRQ/Audio |
//! |------|---------------|------------------------------------------------------|-----------|
//! | CPU  | `$8000-$8003` | PRG bank 0 (`$8000` or `$C000` by swap mode)         | None      |
//! | CPU  | `$9000-$9003` | Mirroring; `$9002` bit 1 PRG swap mode (VRC4)        | None      |
//! | CPU  | `$A000-$A003` | PRG bank 1 (`$A000`)                                 | None      |
//! | CPU  | `$B000-$E003` | Eight 1 KiB CHR banks, written as low/high nibbles   | None      |
//! | CPU  | `$F000-$F003` | IRQ latch low/high, control, acknowledge (VRC4)      | Cycle IRQ |

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

/// CPU cycles per emulated scanline, in thirds: 113.667 cycles = 341 / 3.
const PRESCALER_RELOAD: i16 = 341;
const PRESCALER_STEP: i16 = 3;

/// VRC-style IRQ counter shared by the Konami boards.
///
/// Counts up and fires on overflow, either every CPU cycle or every
/// scanline's worth of cycles through a /341 prescaler.
#[derive(Debug, Clone, Default)]
pub(crate) struct VrcIrq {
    latch: u8,
    counter: u8,
    prescaler: i16,
    enabled: bool,
    enable_after_ack: bool,
    cycle_mode: bool,
    pending: bool,
}

impl VrcIrq {
    pub(crate) fn write_latch_low(&mut self, value: u8) {
        self.latch = (self.latch & 0xF0) | (value & 0x0F);
    }

    pub(crate) fn write_latch_high(&mut self, value: u8) {
        self.latch = (self.latch & 0x0F) | ((value & 0x0F) << 4);
    }

    pub(crate) fn write_control(&mut self, value: u8) {
        self.enable_after_ack = value & 0x01 != 0;
        self.enabled = value & 0x02 != 0;
        self.cycle_mode = value & 0x04 != 0;
        if self.enabled {
            self.counter = self.latch;
            self.prescaler = PRESCALER_RELOAD;
        }
        self.pending = false;
    }

    pub(crate) fn acknowledge(&mut self) {
        self.pending = false;
        self.enabled = self.enable_after_ack;
    }

    pub(crate) fn pending(&self) -> bool {
        self.pending
    }

    fn clock_counter(&mut self) {
        if self.counter == 0xFF {
            self.counter = self.latch;
            self.pending = true;
        } else {
            self.counter += 1;
        }
    }

    pub(crate) fn clock(&mut self, cycles: u32) {
        if !self.enabled {
            return;
        }
        for _ in 0..cycles {
            if self.cycle_mode {
                self.clock_counter();
            } else {
                self.prescaler -= PRESCALER_STEP;
                if self.prescaler <= 0 {
                    self.prescaler += PRESCALER_RELOAD;
                    self.clock_counter();
                }
            }
        }
    }
}

impl SaveState for VrcIrq {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.latch);
        w.u8(self.counter);
        w.u16(self.prescaler as u16);
        w.bool(self.enabled);
        w.bool(self.enable_after_ack);
        w.bool(self.cycle_mode);
        w.bool(self.pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.latch = r.u8("vrc irq latch")?;
        self.counter = r.u8("vrc irq counter")?;
        self.prescaler = r.u16("vrc irq prescaler")? as i16;
        self.enabled = r.bool("vrc irq enable")?;
        self.enable_after_ack = r.bool("vrc irq enable after ack")?;
        self.cycle_mode = r.bool("vrc irq cycle mode")?;
        self.pending = r.bool("vrc irq pending")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Mapper21 {
    id: u16,
    banks: BankedAddressSpace,
    prg_banks: [u8; 2],
    prg_swap: bool,
    /// Eight 1 KiB CHR bank registers (9 bits each).
    chr_banks: [u16; 8],
    irq: VrcIrq,
}

impl Mapper21 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            id: image.mapper_id(),
            banks: BankedAddressSpace::new(image),
            prg_banks: [0, 0],
            prg_swap: false,
            chr_banks: [0; 8],
            irq: VrcIrq::default(),
        };
        mapper.update_banks();
        mapper
    }

    fn is_vrc2a(&self) -> bool {
        self.id == 22
    }

    /// Collapse the board's wiring into register-select bits `(a0, a1)`.
    fn register_lines(&self, addr: u16) -> (u16, u16) {
        let bit = |n: u16| (addr >> n) & 1;
        match self.id {
            21 => (bit(1) | bit(6), bit(2) | bit(7)),
            22 => (bit(1), bit(0)),
            23 => (bit(0) | bit(2), bit(1) | bit(3)),
            _ => (bit(1) | bit(3), bit(0) | bit(2)),
        }
    }

    fn update_banks(&mut self) {
        let second_last = self.banks.prg_bank_count(8).saturating_sub(2);
        let last = self.banks.last_prg_bank(8);
        let prg0 = usize::from(self.prg_banks[0] & 0x1F);
        let prg1 = usize::from(self.prg_banks[1] & 0x1F);

        if self.prg_swap {
            self.banks.map_prg_8k(0, second_last);
            self.banks.map_prg_8k(2, prg0);
        } else {
            self.banks.map_prg_8k(0, prg0);
            self.banks.map_prg_8k(2, second_last);
        }
        self.banks.map_prg_8k(1, prg1);
        self.banks.map_prg_8k(3, last);

        let shift = u32::from(self.is_vrc2a());
        for (slot, &bank) in self.chr_banks.iter().enumerate() {
            self.banks.map_chr_1k(slot, usize::from(bank >> shift));
        }
    }

    fn write_chr_nibble(&mut self, addr: u16, a0: u16, a1: u16, value: u8) {
        let slot = usize::from(((addr >> 12) - 0xB) * 2 + a1);
        let reg = &mut self.chr_banks[slot];
        if a0 == 0 {
            *reg = (*reg & 0x1F0) | u16::from(value & 0x0F);
        } else {
            *reg = (*reg & 0x00F) | (u16::from(value & 0x1F) << 4);
        }
    }
}

impl Mapper for Mapper21 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr < 0x8000 {
            self.banks.cart_write(addr, value);
            return;
        }

        let (a0, a1) = self.register_lines(addr);
        match (addr & 0xF000, a1, a0) {
            (0x8000, _, _) => self.prg_banks[0] = value,
            (0x9000, 0, _) => {
                let mirroring = match value & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                };
                self.banks.set_mirroring(mirroring);
            }
            (0x9000, 1, 0) => self.prg_swap = value & 0x02 != 0,
            (0x9000, _, _) => {}
            (0xA000, _, _) => self.prg_banks[1] = value,
            (0xB000..=0xE000, _, _) => self.write_chr_nibble(addr, a0, a1, value),
            (0xF000, 0, 0) => self.irq.write_latch_low(value),
            (0xF000, 0, 1) => self.irq.write_latch_high(value),
            (0xF000, 1, 0) => self.irq.write_control(value),
            (0xF000, _, _) => self.irq.acknowledge(),
            _ => {}
        }
        self.update_banks();
    }

    fn mapper_id(&self) -> u16 {
        self.id
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self.id {
            22 => "VRC2a",
            21 => "VRC4",
            _ => "VRC2/VRC4",
        })
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn irq_pending(&self) -> bool {
        self.irq.pending()
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

impl SaveState for Mapper21 {
    fn save_state(&self, w: &mut StateWriter) {
        w.bytes(&self.prg_banks);
        w.bool(self.prg_swap);
        for &bank in &self.chr_banks {
            w.u16(bank);
        }
        self.irq.save_state(w);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        r.bytes_into(&mut self.prg_banks, "vrc prg banks")?;
        self.prg_swap = r.bool("vrc prg swap")?;
        for bank in &mut self.chr_banks {
            *bank = r.u16("vrc chr bank")? & 0x1FF;
        }
        self.irq.load_state(r)?;
        self.update_banks();
        Ok(())
    }
}

impl CycleIrq for Mapper21 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        self.irq.clock(cycles);
    }
}

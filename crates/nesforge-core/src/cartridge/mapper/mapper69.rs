//! Mapper 69 (Sunsoft FME-7).
//!
//! | Area | Address range | Behaviour                                     | IRQ/Audio     |
//! |------|---------------|-----------------------------------------------|---------------|
//! | CPU  | `$6000-$7FFF` | PRG ROM bank or PRG RAM, chosen by command 8  | None          |
//! | CPU  | `$8000-$9FFF` | Command register (low 4 bits)                 | None          |
//! | CPU  | `$A000-$BFFF` | Parameter for the selected command            | CPU-cycle IRQ |
//! | CPU  | `$E000-$FFFF` | Fixed to the last 8 KiB PRG bank              | None          |
//!
//! Commands `0-7` set 1 KiB CHR banks, `8` the `$6000` window, `9-B` the
//! switchable 8 KiB PRG banks, `C` mirroring, `D` IRQ control and `E/F` the
//! low/high bytes of the 16-bit down counter.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::{BankedAddressSpace, open_bus},
        header::Mirroring,
        image::CartridgeImage,
        mapper::{CycleIrq, Mapper},
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

const PRG_BANK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct Mapper69 {
    banks: BankedAddressSpace,
    command: u8,
    chr_banks: [u8; 8],
    prg_banks: [u8; 3],
    /// Command 8: bits 0-5 bank, bit 6 RAM select, bit 7 RAM enable.
    low_window: u8,
    irq_counter: u16,
    irq_enabled: bool,
    counter_enabled: bool,
    irq_pending: bool,
}

impl Mapper69 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            command: 0,
            chr_banks: [0, 1, 2, 3, 4, 5, 6, 7],
            prg_banks: [0, 1, 2],
            low_window: 0,
            irq_counter: 0,
            irq_enabled: false,
            counter_enabled: false,
            irq_pending: false,
        };
        mapper.update_banks();
        mapper
    }

    fn ram_selected(&self) -> bool {
        self.low_window & 0x40 != 0
    }

    fn ram_enabled(&self) -> bool {
        self.low_window & 0x80 != 0
    }

    fn update_banks(&mut self) {
        for (slot, &bank) in self.prg_banks.iter().enumerate() {
            self.banks.map_prg_8k(slot, usize::from(bank & 0x3F));
        }
        let last = self.banks.last_prg_bank(8);
        self.banks.map_prg_8k(3, last);
        for (slot, &bank) in self.chr_banks.iter().enumerate() {
            self.banks.map_chr_1k(slot, usize::from(bank));
        }
    }

    fn write_parameter(&mut self, value: u8) {
        match self.command {
            0x0..=0x7 => self.chr_banks[usize::from(self.command)] = value,
            0x8 => self.low_window = value,
            0x9..=0xB => self.prg_banks[usize::from(self.command - 0x9)] = value,
            0xC => {
                let mirroring = match value & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                };
                self.banks.set_mirroring(mirroring);
            }
            0xD => {
                self.irq_enabled = value & 0x01 != 0;
                self.counter_enabled = value & 0x80 != 0;
                self.irq_pending = false;
            }
            0xE => self.irq_counter = (self.irq_counter & 0xFF00) | u16::from(value),
            _ => self.irq_counter = (self.irq_counter & 0x00FF) | (u16::from(value) << 8),
        }
        self.update_banks();
    }
}

impl Mapper for Mapper69 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.ram_selected() => {
                if self.ram_enabled() {
                    self.banks.cart_read(addr)
                } else {
                    open_bus(addr)
                }
            }
            0x6000..=0x7FFF => {
                let bank = usize::from(self.low_window & 0x3F);
                self.banks
                    .prg_byte(bank * PRG_BANK_SIZE + usize::from(addr & 0x1FFF))
            }
            _ => self.banks.cart_read(addr),
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.ram_selected() && self.ram_enabled() {
                    self.banks.cart_write(addr, value);
                }
            }
            0x8000..=0x9FFF => self.command = value & 0x0F,
            0xA000..=0xBFFF => self.write_parameter(value),
            _ => {}
        }
    }

    fn mapper_id(&self) -> u16 {
        69
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("Sunsoft FME-7")
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
        self.counter_enabled = false;
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

impl SaveState for Mapper69 {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.command);
        w.bytes(&self.chr_banks);
        w.bytes(&self.prg_banks);
        w.u8(self.low_window);
        w.u16(self.irq_counter);
        w.bool(self.irq_enabled);
        w.bool(self.counter_enabled);
        w.bool(self.irq_pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.command = r.u8("fme7 command")? & 0x0F;
        r.bytes_into(&mut self.chr_banks, "fme7 chr banks")?;
        r.bytes_into(&mut self.prg_banks, "fme7 prg banks")?;
        self.low_window = r.u8("fme7 low window")?;
        self.irq_counter = r.u16("fme7 irq counter")?;
        self.irq_enabled = r.bool("fme7 irq enable")?;
        self.counter_enabled = r.bool("fme7 counter enable")?;
        self.irq_pending = r.bool("fme7 irq pending")?;
        self.update_banks();
        Ok(())
    }
}

impl CycleIrq for Mapper69 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        if !self.counter_enabled {
            return;
        }
        let remaining = u32::from(self.irq_counter);
        if cycles > remaining {
            // Underflow from $0000 wraps to $FFFF.
            let wrapped = (cycles - remaining - 1) % 0x10000;
            self.irq_counter = (0xFFFF - wrapped) as u16;
            if self.irq_enabled {
                self.irq_pending = true;
            }
        } else {
            self.irq_counter = (remaining - cycles) as u16;
        }
    }
}

//! Mapper 1 (MMC1 / SxROM).
//!
//! Registers are loaded serially: five writes to `$8000-$FFFF` shift bit 0
//! into a 5-bit register, and the fifth write commits the value to the
//! register selected by address bits 13-14. Writing a value with bit 7 set
//! clears the shift register and forces PRG mode 3.
//!
//! | Area | Address range | Behaviour                                        | IRQ/Audio |
//! |------|---------------|--------------------------------------------------|-----------|
//! | CPU  | `$6000-$7FFF` | 8 KiB PRG RAM                                    | None      |
//! | CPU  | `$8000-$9FFF` | Control: mirroring, PRG mode, CHR mode           | None      |
//! | CPU  | `$A000-$BFFF` | CHR bank 0 (4 or 8 KiB), SUROM outer PRG bit     | None      |
//! | CPU  | `$C000-$DFFF` | CHR bank 1 (4 KiB mode only)                     | None      |
//! | CPU  | `$E000-$FFFF` | PRG bank (16 or 32 KiB)                          | None      |
//! | PPU  | `$0000-$1FFF` | Two 4 KiB or one 8 KiB CHR window                | None      |

use std::borrow::Cow;

use crate::cartridge::{
    banks::BankedAddressSpace,
    header::Mirroring,
    image::CartridgeImage,
    mapper::{ExtraState, Mapper},
};

/// Control value after power-on and after a reset write: PRG mode 3.
const CONTROL_POWER_ON: u8 = 0x0C;
/// Shift register sentinel; the commit happens when it reaches bit 0.
const SHIFT_EMPTY: u8 = 0x10;
/// Boards with more than 256 KiB of PRG take the outer bank from CHR bit 4.
const SUROM_THRESHOLD: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mmc1Register {
    Control,
    ChrBank0,
    ChrBank1,
    PrgBank,
}

impl Mmc1Register {
    fn from_addr(addr: u16) -> Self {
        match addr & 0xE000 {
            0x8000 => Mmc1Register::Control,
            0xA000 => Mmc1Register::ChrBank0,
            0xC000 => Mmc1Register::ChrBank1,
            _ => Mmc1Register::PrgBank,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mapper1 {
    banks: BankedAddressSpace,
    /// Serial load register; [`SHIFT_EMPTY`] marks how many bits remain.
    shift: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            shift: SHIFT_EMPTY,
            control: CONTROL_POWER_ON,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        };
        mapper.update_banks();
        mapper
    }

    fn write_serial(&mut self, addr: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift = SHIFT_EMPTY;
            self.control |= CONTROL_POWER_ON;
            self.update_banks();
            return;
        }

        let complete = self.shift & 1 != 0;
        self.shift = (self.shift >> 1) | ((value & 1) << 4);
        if !complete {
            return;
        }

        let data = self.shift & 0x1F;
        self.shift = SHIFT_EMPTY;
        let register = Mmc1Register::from_addr(addr);
        tracing::trace!(?register, data, "mmc1 register");
        match register {
            Mmc1Register::Control => self.control = data,
            Mmc1Register::ChrBank0 => self.chr_bank0 = data,
            Mmc1Register::ChrBank1 => self.chr_bank1 = data,
            Mmc1Register::PrgBank => self.prg_bank = data,
        }
        self.update_banks();
    }

    fn update_banks(&mut self) {
        let mirroring = match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
        self.banks.set_mirroring(mirroring);

        // 512 KiB SUROM boards reuse CHR bit 4 as PRG A18.
        let outer = if self.banks.prg_len() > SUROM_THRESHOLD {
            usize::from(self.chr_bank0 & 0x10)
        } else {
            0
        };
        let prg = usize::from(self.prg_bank & 0x0F);
        match (self.control >> 2) & 0x03 {
            0 | 1 => self.banks.map_prg_32k((outer | prg) >> 1),
            2 => {
                self.banks.map_prg_16k(0, outer);
                self.banks.map_prg_16k(1, outer | prg);
            }
            _ => {
                self.banks.map_prg_16k(0, outer | prg);
                self.banks.map_prg_16k(1, outer | 0x0F);
            }
        }

        if self.control & 0x10 == 0 {
            self.banks.map_chr_8k(usize::from(self.chr_bank0 >> 1));
        } else {
            self.banks.map_chr_4k(0, usize::from(self.chr_bank0));
            self.banks.map_chr_4k(1, usize::from(self.chr_bank1));
        }
    }
}

impl Mapper for Mapper1 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr >= 0x8000 {
            self.write_serial(addr, value);
        } else {
            self.banks.cart_write(addr, value);
        }
    }

    fn mapper_id(&self) -> u16 {
        1
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("MMC1")
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn reset(&mut self) {
        self.shift = SHIFT_EMPTY;
        self.control |= CONTROL_POWER_ON;
        self.update_banks();
    }

    fn extra_state(&self) -> Option<&dyn ExtraState> {
        Some(self)
    }

    fn extra_state_mut(&mut self) -> Option<&mut dyn ExtraState> {
        Some(self)
    }
}

impl ExtraState for Mapper1 {
    fn save_extra(&self) -> u32 {
        u32::from(self.control & 0x1F)
            | (u32::from(self.chr_bank0 & 0x1F) << 5)
            | (u32::from(self.chr_bank1 & 0x1F) << 10)
            | (u32::from(self.prg_bank & 0x1F) << 15)
            | (u32::from(self.shift & 0x1F) << 20)
    }

    fn load_extra(&mut self, value: u32) {
        let field = |shift: u32| ((value >> shift) & 0x1F) as u8;
        self.control = field(0);
        self.chr_bank0 = field(5);
        self.chr_bank1 = field(10);
        self.prg_bank = field(15);
        self.shift = field(20);
        self.update_banks();
    }
}

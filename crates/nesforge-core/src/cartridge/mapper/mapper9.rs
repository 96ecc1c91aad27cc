//! Mappers 9 and 10 (MMC2 / PxROM and MMC4 / FxROM).
//!
//! Both chips give each 4 KiB CHR half two candidate banks and pick between
//! them with a latch that flips when the PPU fetches tile `$FD` or `$FE`.
//! The fetch that trips the latch still uses the old bank.
//!
//! | Area | Address range | Behaviour                                              | IRQ/Audio |
//! |------|---------------|--------------------------------------------------------|-----------|
//! | CPU  | `$A000-$AFFF` | PRG bank: 8 KiB at `$8000` (MMC2), 16 KiB (MMC4)       | None      |
//! | CPU  | `$B000-$CFFF` | CHR `$0000` bank for latch `$FD` / `$FE`               | None      |
//! | CPU  | `$D000-$EFFF` | CHR `$1000` bank for latch `$FD` / `$FE`               | None      |
//! | CPU  | `$F000-$FFFF` | Mirroring (bit 0: 1 = horizontal)                      | None      |
//! | PPU  | `$0FD8/$0FE8` | Trip latch 0 (MMC4 matches the whole `$xFD8-$xFDF` row) | None      |
//! | PPU  | `$1FD8-$1FEF` | Trip latch 1                                           | None      |

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::BankedAddressSpace, header::Mirroring, image::CartridgeImage, mapper::Mapper,
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Fd,
    Fe,
}

#[derive(Debug, Clone)]
pub struct Mapper9 {
    banks: BankedAddressSpace,
    /// `true` for MMC4 (mapper 10).
    mmc4: bool,
    prg_bank: u8,
    /// `[half][latch]` CHR bank registers.
    chr_banks: [[u8; 2]; 2],
    latches: [Latch; 2],
}

impl Mapper9 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            mmc4: image.mapper_id() == 10,
            prg_bank: 0,
            chr_banks: [[0; 2]; 2],
            latches: [Latch::Fe, Latch::Fe],
        };
        mapper.update_prg();
        mapper.update_chr();
        mapper
    }

    fn update_prg(&mut self) {
        let bank = usize::from(self.prg_bank & 0x0F);
        if self.mmc4 {
            let last = self.banks.last_prg_bank(16);
            self.banks.map_prg_16k(0, bank);
            self.banks.map_prg_16k(1, last);
        } else {
            let count = self.banks.prg_bank_count(8);
            self.banks.map_prg_8k(0, bank);
            for slot in 1..4 {
                self.banks.map_prg_8k(slot, count.saturating_sub(4 - slot));
            }
        }
    }

    fn update_chr(&mut self) {
        for half in 0..2 {
            let index = match self.latches[half] {
                Latch::Fd => 0,
                Latch::Fe => 1,
            };
            let bank = usize::from(self.chr_banks[half][index] & 0x1F);
            self.banks.map_chr_4k(half, bank);
        }
    }

    fn trip_latch(&mut self, addr: u16) {
        let (half, tile) = match addr {
            0x0FD8 => (0, Latch::Fd),
            0x0FE8 => (0, Latch::Fe),
            0x0FD9..=0x0FDF if self.mmc4 => (0, Latch::Fd),
            0x0FE9..=0x0FEF if self.mmc4 => (0, Latch::Fe),
            0x1FD8..=0x1FDF => (1, Latch::Fd),
            0x1FE8..=0x1FEF => (1, Latch::Fe),
            _ => return,
        };
        if self.latches[half] != tile {
            self.latches[half] = tile;
            self.update_chr();
        }
    }
}

impl Mapper for Mapper9 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr & 0xF000 {
            0xA000 => {
                self.prg_bank = value;
                self.update_prg();
            }
            0xB000 => self.chr_banks[0][0] = value,
            0xC000 => self.chr_banks[0][1] = value,
            0xD000 => self.chr_banks[1][0] = value,
            0xE000 => self.chr_banks[1][1] = value,
            0xF000 => self
                .banks
                .set_mirroring(Mirroring::from_vh_bit(value & 0x01 != 0)),
            _ => {
                self.banks.cart_write(addr, value);
                return;
            }
        }
        self.update_chr();
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        let value = self.banks.ppu_read(addr);
        self.trip_latch(addr & 0x3FFF);
        value
    }

    fn mapper_id(&self) -> u16 {
        if self.mmc4 { 10 } else { 9 }
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(if self.mmc4 { "MMC4" } else { "MMC2" })
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn board_state(&self) -> Option<&dyn SaveState> {
        Some(self)
    }

    fn board_state_mut(&mut self) -> Option<&mut dyn SaveState> {
        Some(self)
    }
}

impl SaveState for Mapper9 {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.prg_bank);
        for half in &self.chr_banks {
            w.bytes(half);
        }
        for latch in self.latches {
            w.bool(latch == Latch::Fe);
        }
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.prg_bank = r.u8("mmc2 prg bank")?;
        for half in &mut self.chr_banks {
            r.bytes_into(half, "mmc2 chr banks")?;
        }
        for latch in &mut self.latches {
            *latch = if r.bool("mmc2 chr latch")? {
                Latch::Fe
            } else {
                Latch::Fd
            };
        }
        self.update_prg();
        self.update_chr();
        Ok(())
    }
}

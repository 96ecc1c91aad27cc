//! Namco 108 family (76, 88, 112, 154, 206).
//!
//! The Namco 108 is the MMC3's ancestor: the same bank-select / bank-data
//! pair at `$8000/$8001`, but with no PRG or CHR mode bits, no mirroring
//! register and no IRQ.
//!
//! | Register | Window                        |
//! |----------|-------------------------------|
//! | R0, R1   | 2 KiB CHR at `$0000`, `$0800` |
//! | R2-R5    | 1 KiB CHR at `$1000-$1C00`    |
//! | R6, R7   | 8 KiB PRG at `$8000`, `$A000` |
//!
//! Boards 88 and 154 wire CHR A16 to PPU A12, so the left pattern table can
//! only see the lower 64 KiB and the right one the upper 64 KiB. Board 154
//! adds a single-screen select on bit 6 of every `$8000-$FFFF` write.
//!
//! Board 76 (Namco 3446) widens R2-R5 to 2 KiB CHR banks covering the whole
//! pattern space and leaves R0/R1 unused. Board 112 (NTDEC) moves bank data
//! to `$A000`, adds a mirroring bit at `$E000` and reorders the file: R0/R1
//! are the PRG banks, R2/R3 the 2 KiB CHR banks and R4-R7 the 1 KiB ones.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::BankedAddressSpace, header::Mirroring, image::CartridgeImage, mapper::Mapper,
    },
    state::{SaveState, StateError, StateReader, StateWriter},
};

#[derive(Debug, Clone)]
pub struct Mapper206 {
    id: u16,
    banks: BankedAddressSpace,
    bank_select: u8,
    bank_regs: [u8; 8],
}

impl Mapper206 {
    pub fn new(image: &CartridgeImage) -> Self {
        let id = image.mapper_id();
        let bank_regs = if id == 112 {
            [0, 1, 0, 2, 4, 5, 6, 7]
        } else {
            [0, 2, 4, 5, 6, 7, 0, 1]
        };
        let mut mapper = Self {
            id,
            banks: BankedAddressSpace::new(image),
            bank_select: 0,
            bank_regs,
        };
        mapper.update_banks();
        mapper
    }

    fn splits_chr(&self) -> bool {
        matches!(self.id, 88 | 154)
    }

    fn update_banks(&mut self) {
        let r = self.bank_regs.map(usize::from);
        let second_last = self.banks.prg_bank_count(8).saturating_sub(2);
        let last = self.banks.last_prg_bank(8);

        // (PRG regs, 2 KiB CHR regs, 1 KiB CHR regs) in register-file order.
        let (prg, chr_2k, chr_1k) = match self.id {
            112 => ([r[0], r[1]], [r[2], r[3]], [r[4], r[5], r[6], r[7]]),
            _ => ([r[6] & 0x0F, r[7] & 0x0F], [r[0], r[1]], [r[2], r[3], r[4], r[5]]),
        };
        self.banks.map_prg_8k(0, prg[0]);
        self.banks.map_prg_8k(1, prg[1]);
        self.banks.map_prg_8k(2, second_last);
        self.banks.map_prg_8k(3, last);

        if self.id == 76 {
            for (slot, &bank) in chr_1k.iter().enumerate() {
                self.banks.map_chr_2k(slot, bank);
            }
            return;
        }

        let high_bit = if self.splits_chr() { 0x40 } else { 0x00 };
        for (pair, &bank) in chr_2k.iter().enumerate() {
            self.banks.map_chr_1k(pair * 2, bank & 0x3E);
            self.banks.map_chr_1k(pair * 2 + 1, (bank & 0x3E) | 1);
        }
        for (i, &bank) in chr_1k.iter().enumerate() {
            self.banks.map_chr_1k(4 + i, (bank & 0x3F) | high_bit);
        }
    }

    fn write_bank_data(&mut self, value: u8) {
        self.bank_regs[usize::from(self.bank_select)] = value;
        self.update_banks();
    }
}

impl Mapper for Mapper206 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr < 0x8000 {
            self.banks.cart_write(addr, value);
            return;
        }

        if self.id == 112 {
            match addr & 0xE000 {
                0x8000 => self.bank_select = value & 0x07,
                0xA000 => self.write_bank_data(value),
                0xE000 => self
                    .banks
                    .set_mirroring(Mirroring::from_vh_bit(value & 0x01 != 0)),
                _ => {}
            }
            return;
        }

        if self.id == 154 {
            self.banks
                .set_mirroring(Mirroring::single_screen(value & 0x40 != 0));
        }
        match addr & 0xE001 {
            0x8000 => self.bank_select = value & 0x07,
            0x8001 => self.write_bank_data(value),
            _ => {}
        }
    }

    fn mapper_id(&self) -> u16 {
        self.id
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self.id {
            76 => "Namco 3446 (76)",
            88 => "Namco 118 (88)",
            112 => "NTDEC ASDER (112)",
            154 => "Namco 129 (154)",
            _ => "Namco 108",
        })
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

impl SaveState for Mapper206 {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.bank_select);
        w.bytes(&self.bank_regs);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.bank_select = r.u8("namco bank select")? & 0x07;
        r.bytes_into(&mut self.bank_regs, "namco bank registers")?;
        self.update_banks();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn namco(id: u16) -> Mapper206 {
        Mapper206::new(&paged_image(Header::new(id), 128, 128))
    }

    fn set(m: &mut Mapper206, reg: u8, value: u8) {
        m.cpu_write(0x8000, reg);
        m.cpu_write(0x8001, value);
    }

    #[test]
    fn prg_registers_and_fixed_banks() {
        let mut m = namco(206);
        set(&mut m, 6, 3);
        set(&mut m, 7, 9);
        assert_eq!(m.cpu_read(0x8000), 24);
        assert_eq!(m.cpu_read(0xA000), 72);
        assert_eq!(m.cpu_read(0xC000), 112);
        assert_eq!(m.cpu_read(0xE000), 120);
    }

    #[test]
    fn two_k_registers_ignore_low_bit() {
        let mut m = namco(206);
        set(&mut m, 0, 11);
        set(&mut m, 2, 40);
        assert_eq!(m.ppu_read(0x0000), 10);
        assert_eq!(m.ppu_read(0x0400), 11);
        assert_eq!(m.ppu_read(0x1000), 40);
    }

    #[test]
    fn mapper_88_splits_chr_halves() {
        let mut m = namco(88);
        set(&mut m, 2, 3);
        set(&mut m, 0, 0x44);
        assert_eq!(m.ppu_read(0x1000), 0x43);
        assert_eq!(m.ppu_read(0x0000), 0x04);
    }

    #[test]
    fn mapper_76_uses_2k_chr_banks() {
        let mut m = namco(76);
        set(&mut m, 2, 5);
        set(&mut m, 5, 7);
        assert_eq!(m.ppu_read(0x0000), 10);
        assert_eq!(m.ppu_read(0x0400), 11);
        assert_eq!(m.ppu_read(0x1800), 14);
    }

    #[test]
    fn mapper_112_data_port_and_mirroring() {
        let mut m = namco(112);
        m.cpu_write(0x8000, 0);
        m.cpu_write(0xA000, 3);
        m.cpu_write(0x8000, 4);
        m.cpu_write(0xA000, 21);
        assert_eq!(m.cpu_read(0x8000), 24);
        assert_eq!(m.ppu_read(0x1000), 21);
        m.cpu_write(0xE000, 0x01);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn mapper_154_selects_single_screen() {
        let mut m = namco(154);
        m.cpu_write(0x8000, 0x40);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenUpper);
        m.cpu_write(0xA000, 0x00);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenLower);
    }
}

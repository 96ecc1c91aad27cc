//! Multicart boards that latch the written *address* instead of the data.
//!
//! Pirate multicarts saved a chip by wiring the CPU address lines straight
//! into the bank latch: a write anywhere in `$8000-$FFFF` selects a game by
//! where it lands, and the data byte is ignored. A few boards (41, 62, 203,
//! 228) mix in data bits as well, and 244 decodes two address ranges.
//!
//! | Id  | Board             | Latch source             | Mode bit         | Mirroring bit  |
//! |-----|-------------------|--------------------------|------------------|----------------|
//! | 41  | Caltron 6-in-1    | `$6000-$67FF` addr + data | -               | A5 (1 = H)     |
//! | 58  | 68-in-1           | address                  | A6 (1 = 16 KiB)  | A7 (1 = H)     |
//! | 61  | 20-in-1           | address                  | A4 (1 = 16 KiB)  | A7 (1 = H)     |
//! | 62  | Super 700-in-1    | address + data bits 0-1  | A5 (1 = 16 KiB)  | A7 (1 = H)     |
//! | 200 | 36-in-1           | address                  | always 16 KiB    | A3 (1 = H)     |
//! | 201 | 21-in-1           | address                  | always 32 KiB    | header         |
//! | 203 | 35-in-1           | data                     | always 16 KiB    | header         |
//! | 212 | Super HiK 300-in-1 | address                 | A14 (1 = 32 KiB) | A3 (1 = H)     |
//! | 213 | 9999999-in-1      | address                  | always 32 KiB    | header         |
//! | 214 | Super Gun 20-in-1 | address                  | always 16 KiB    | header         |
//! | 225 | 52/64-in-1        | address                  | A12 (1 = 16 KiB) | A13 (1 = H)    |
//! | 228 | Action 52         | address + data bits 0-1  | A5 (1 = 16 KiB)  | A13 (1 = H)    |
//! | 229 | 31-in-1           | address                  | A1-A4 nonzero    | A5 (1 = H)     |
//! | 231 | 20-in-1 (NTDEC)   | address                  | A5 picks `$C000` | A7 (1 = H)     |
//! | 242 | Wai Xing Zhan Shi | address                  | always 32 KiB    | A1 (1 = H)     |
//! | 244 | C&E Decathlon     | `$8065`/`$80A5` offsets  | always 32 KiB    | header         |
//! | 255 | 110-in-1          | address                  | A12 (1 = 16 KiB) | A13 (1 = H)    |

use std::borrow::Cow;

use crate::cartridge::{
    banks::BankedAddressSpace,
    header::Mirroring,
    image::CartridgeImage,
    mapper::{ExtraState, Mapper},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLatchBoard {
    Caltron41,
    Multicart58,
    Multicart61,
    Multicart62,
    Multicart200,
    Multicart201,
    Multicart203,
    Multicart212,
    Multicart213,
    Multicart214,
    Multicart225,
    Action52,
    Multicart229,
    Multicart231,
    WaiXing242,
    Decathlon244,
    Multicart255,
}

impl AddressLatchBoard {
    pub fn from_id(id: u16) -> Option<Self> {
        use AddressLatchBoard::*;

        Some(match id {
            41 => Caltron41,
            58 => Multicart58,
            61 => Multicart61,
            62 => Multicart62,
            200 => Multicart200,
            201 => Multicart201,
            203 => Multicart203,
            212 => Multicart212,
            213 => Multicart213,
            214 => Multicart214,
            225 => Multicart225,
            228 => Action52,
            229 => Multicart229,
            231 => Multicart231,
            242 => WaiXing242,
            244 => Decathlon244,
            255 => Multicart255,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        use AddressLatchBoard::*;

        match self {
            Caltron41 => "Caltron 6-in-1",
            Multicart58 => "68-in-1 (58)",
            Multicart61 => "20-in-1 (61)",
            Multicart62 => "Super 700-in-1 (62)",
            Multicart200 => "36-in-1 (200)",
            Multicart201 => "21-in-1 (201)",
            Multicart203 => "35-in-1 (203)",
            Multicart212 => "Super HiK 300-in-1 (212)",
            Multicart213 => "9999999-in-1 (213)",
            Multicart214 => "Super Gun 20-in-1 (214)",
            Multicart225 => "52-in-1 (225)",
            Action52 => "Action 52",
            Multicart229 => "31-in-1 (229)",
            Multicart231 => "20-in-1 (231)",
            WaiXing242 => "Wai Xing (242)",
            Decathlon244 => "C&E Decathlon (244)",
            Multicart255 => "110-in-1 (255)",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddressLatch {
    id: u16,
    board: AddressLatchBoard,
    banks: BankedAddressSpace,
    /// Latched address bits (or the data byte on board 203).
    latch: u16,
    /// Data-side bits: inner CHR on 41, the written byte on 62 and 228, the
    /// CHR offset on 244.
    data: u8,
}

impl AddressLatch {
    pub fn new(image: &CartridgeImage, board: AddressLatchBoard) -> Self {
        let mut mapper = Self {
            id: image.mapper_id(),
            board,
            banks: BankedAddressSpace::new(image),
            latch: 0,
            data: 0,
        };
        mapper.update_banks();
        mapper
    }

    fn map_prg(&mut self, bank: usize, mode_16k: bool) {
        if mode_16k {
            self.banks.map_prg_16k(0, bank);
            self.banks.map_prg_16k(1, bank);
        } else {
            self.banks.map_prg_32k(bank >> 1);
        }
    }

    fn set_hv(&mut self, horizontal: bool) {
        self.banks.set_mirroring(Mirroring::from_vh_bit(horizontal));
    }

    fn update_banks(&mut self) {
        use AddressLatchBoard::*;

        let a = usize::from(self.latch);
        let bit = |n: u32| self.latch & (1 << n) != 0;

        match self.board {
            Caltron41 => {
                self.banks.map_prg_32k(a & 0x07);
                self.banks
                    .map_chr_8k(((a >> 1) & 0x0C) | usize::from(self.data & 0x03));
                let horizontal = bit(5);
                self.set_hv(horizontal);
            }
            Multicart58 => {
                let mode_16k = bit(6);
                let horizontal = bit(7);
                // 16 KiB mode uses all three bits; 32 KiB mode drops bit 0.
                self.map_prg(a & 0x07, mode_16k);
                self.banks.map_chr_8k((a >> 3) & 0x07);
                self.set_hv(horizontal);
            }
            Multicart61 => {
                let mode_16k = bit(4);
                let horizontal = bit(7);
                let bank = ((a & 0x0F) << 1) | ((a >> 5) & 0x01);
                self.map_prg(bank, mode_16k);
                self.set_hv(horizontal);
            }
            Multicart62 => {
                let mode_16k = bit(5);
                let horizontal = bit(7);
                self.map_prg((a & 0x40) | ((a >> 8) & 0x3F), mode_16k);
                self.banks
                    .map_chr_8k(((a & 0x1F) << 2) | usize::from(self.data & 0x03));
                self.set_hv(horizontal);
            }
            Multicart200 => {
                let horizontal = bit(3);
                self.map_prg(a & 0x07, true);
                self.banks.map_chr_8k(a & 0x07);
                self.set_hv(horizontal);
            }
            Multicart201 => {
                self.banks.map_prg_32k(a & 0xFF);
                self.banks.map_chr_8k(a & 0xFF);
            }
            Multicart203 => {
                self.map_prg((a >> 2) & 0x3F, true);
                self.banks.map_chr_8k(a & 0x03);
            }
            Multicart212 => {
                let horizontal = bit(3);
                if bit(14) {
                    self.banks.map_prg_32k((a >> 1) & 0x03);
                } else {
                    self.map_prg(a & 0x07, true);
                }
                self.banks.map_chr_8k(a & 0x07);
                self.set_hv(horizontal);
            }
            Multicart214 => {
                self.map_prg((a >> 2) & 0x03, true);
                self.banks.map_chr_8k(a & 0x03);
            }
            Multicart213 => {
                self.banks.map_prg_32k((a >> 1) & 0x03);
                self.banks.map_chr_8k((a >> 3) & 0x07);
            }
            Multicart225 | Multicart255 => {
                let mode_16k = bit(12);
                let horizontal = bit(13);
                let high = (a >> 8) & 0x40;
                self.map_prg(((a >> 6) & 0x3F) | high, mode_16k);
                self.banks.map_chr_8k((a & 0x3F) | high);
                self.set_hv(horizontal);
            }
            Action52 => {
                let horizontal = bit(13);
                // Chip 3 is absent; its select aliases chip 2.
                let mut page = (a >> 7) & 0x3F;
                if page & 0x30 == 0x30 {
                    page -= 0x10;
                }
                let base = (page << 1) | ((a >> 6) & (a >> 5) & 0x01);
                self.banks.map_prg_16k(0, base);
                self.banks.map_prg_16k(1, base + (((a >> 5) & 0x01) ^ 0x01));
                self.banks
                    .map_chr_8k(((a & 0x0F) << 2) | usize::from(self.data & 0x03));
                self.set_hv(horizontal);
            }
            Multicart229 => {
                let horizontal = bit(5);
                if a & 0x1E != 0 {
                    self.map_prg(a & 0x1F, true);
                } else {
                    self.banks.map_prg_32k(0);
                }
                self.banks.map_chr_8k(a & 0x0F);
                self.set_hv(horizontal);
            }
            Multicart231 => {
                let horizontal = bit(7);
                let bank = a & 0x1E;
                self.banks.map_prg_16k(0, bank);
                self.banks.map_prg_16k(1, bank | ((a >> 5) & 0x01));
                self.set_hv(horizontal);
            }
            WaiXing242 => {
                let horizontal = bit(1);
                self.banks.map_prg_32k((a >> 3) & 0x0F);
                self.set_hv(horizontal);
            }
            Decathlon244 => {
                self.banks.map_prg_32k(a & 0x03);
                self.banks.map_chr_8k(usize::from(self.data & 0x07));
            }
        }
    }
}

impl Mapper for AddressLatch {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        use AddressLatchBoard::*;

        match (self.board, addr) {
            (Caltron41, 0x6000..=0x67FF) => {
                self.latch = addr & 0x3F;
                self.update_banks();
            }
            // Inner CHR select is only wired while the outer bank enables it.
            (Caltron41, 0x8000..=0xFFFF) => {
                if self.latch & 0x04 != 0 {
                    self.data = value & 0x03;
                    self.update_banks();
                }
            }
            (Caltron41, _) => self.banks.cart_write(addr, value),
            (Multicart203, 0x8000..=0xFFFF) => {
                self.latch = u16::from(value);
                self.update_banks();
            }
            (Multicart62 | Action52, 0x8000..=0xFFFF) => {
                self.latch = addr & 0x7FFF;
                self.data = value & 0x03;
                self.update_banks();
            }
            (Decathlon244, 0x8065..=0x80A4) => {
                self.latch = (addr - 0x8065) & 0x03;
                self.update_banks();
            }
            (Decathlon244, 0x80A5..=0x80E4) => {
                self.data = ((addr - 0x80A5) & 0x07) as u8;
                self.update_banks();
            }
            (Decathlon244, _) => self.banks.cart_write(addr, value),
            (_, 0x8000..=0xFFFF) => {
                tracing::trace!(id = self.id, addr, "address latch");
                self.latch = addr & 0x7FFF;
                self.update_banks();
            }
            _ => self.banks.cart_write(addr, value),
        }
    }

    fn mapper_id(&self) -> u16 {
        self.id
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.board.name())
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn reset(&mut self) {
        self.latch = 0;
        self.data = 0;
        self.update_banks();
    }

    fn extra_state(&self) -> Option<&dyn ExtraState> {
        Some(self)
    }

    fn extra_state_mut(&mut self) -> Option<&mut dyn ExtraState> {
        Some(self)
    }
}

impl ExtraState for AddressLatch {
    fn save_extra(&self) -> u32 {
        u32::from(self.latch) | (u32::from(self.data) << 16)
    }

    fn load_extra(&mut self, value: u32) {
        self.latch = value as u16;
        self.data = (value >> 16) as u8;
        self.update_banks();
    }
}

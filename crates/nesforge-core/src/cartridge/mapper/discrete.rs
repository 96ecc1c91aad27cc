//! Discrete-logic boards built around a single data latch.
//!
//! These boards have no ASIC: a 74-series latch captures the byte written to
//! some address window and its bits drive PRG/CHR address lines (and on a
//! few boards the nametable mirroring). They differ only in the register
//! window and in how the latched bits are split, so one struct with a board
//! discriminator covers the whole family.
//!
//! | Id  | Board              | Register      | PRG                  | CHR               | Mirroring     |
//! |-----|--------------------|---------------|----------------------|-------------------|---------------|
//! | 0   | NROM               | none          | fixed 16/32 KiB      | fixed 8 KiB       | header        |
//! | 2   | UxROM              | `$8000-$FFFF` | 16 KiB + fixed last  | fixed             | header        |
//! | 3   | CNROM              | `$8000-$FFFF` | fixed                | 8 KiB             | header        |
//! | 7   | AxROM              | `$8000-$FFFF` | 32 KiB (bits 0-2)    | fixed             | 1-screen bit4 |
//! | 11  | Color Dreams       | `$8000-$FFFF` | 32 KiB (bits 0-1)    | 8 KiB (bits 4-7)  | header        |
//! | 36  | TXC 01-22000-400   | `$4200` mask  | 32 KiB (`$4200` 4-5) | 8 KiB (bits 0-3)  | header        |
//! | 38  | Bit Corp PCI556    | `$7000-$7FFF` | 32 KiB (bits 0-1)    | 8 KiB (bits 2-3)  | header        |
//! | 60  | Reset-based 4-in-1 | none (reset)  | 16 KiB mirrored      | 8 KiB             | header        |
//! | 66  | GxROM              | `$8000-$FFFF` | 32 KiB (bits 4-5)    | 8 KiB (bits 0-1)  | header        |
//! | 70  | Bandai 74161       | `$8000-$FFFF` | 16 KiB (bits 4-7)    | 8 KiB (bits 0-3)  | header        |
//! | 71  | Camerica BF909x    | `$C000-$FFFF` | 16 KiB + fixed last  | fixed             | `$9000` bit4* |
//! | 72  | Jaleco JF-17       | `$8000-$FFFF` | 16 KiB + fixed last  | 8 KiB             | header        |
//! | 78  | Irem 74HC161       | `$8000-$FFFF` | 16 KiB (bits 0-2)    | 8 KiB (bits 4-7)  | bit 3         |
//! | 79  | NINA-003           | `$4100` mask  | 32 KiB (bit 3)       | 8 KiB (bits 0-2)  | header        |
//! | 86  | Jaleco JF-13       | `$6000-$6FFF` | 32 KiB (bits 4-5)    | 8 KiB (0-1, 6)    | header        |
//! | 87  | Jaleco JF-05..10   | `$6000-$7FFF` | fixed                | 8 KiB (swapped)   | header        |
//! | 89  | Sunsoft-2 (IC 3)   | `$8000-$FFFF` | 16 KiB (bits 4-6)    | 8 KiB (0-2, 7)    | 1-screen bit3 |
//! | 92  | Jaleco JF-19       | `$8000-$FFFF` | fixed first + 16 KiB | 8 KiB             | header        |
//! | 93  | Sunsoft-2 (IC 4)   | `$8000-$FFFF` | 16 KiB (bits 4-6)    | fixed             | header        |
//! | 94  | UN1ROM             | `$8000-$FFFF` | 16 KiB (bits 2-4)    | fixed             | header        |
//! | 97  | Irem TAM-S1        | `$8000-$BFFF` | fixed last + 16 KiB  | fixed             | bits 6-7      |
//! | 107 | Magic Dragon       | `$8000-$FFFF` | 32 KiB (bits 1-7)    | 8 KiB             | header        |
//! | 113 | NINA-006 (Sachen)  | `$4100` mask  | 32 KiB (bits 3-5)    | 8 KiB (0-2, 6)    | bit 7         |
//! | 140 | Jaleco JF-11/14    | `$6000-$7FFF` | 32 KiB (bits 4-5)    | 8 KiB (bits 0-3)  | header        |
//! | 152 | Bandai/Taito 74161 | `$8000-$FFFF` | 16 KiB (bits 4-6)    | 8 KiB (bits 0-3)  | 1-screen bit7 |
//! | 180 | UNROM (inverted)   | `$8000-$FFFF` | fixed first + 16 KiB | fixed             | header        |
//! | 184 | Sunsoft-1          | `$6000-$7FFF` | fixed                | 2x 4 KiB          | header        |
//! | 185 | CNROM copy protect | `$8000-$FFFF` | fixed                | enable key        | header        |
//! | 226 | 76-in-1            | `$8000/$8001` | 16/32 KiB (7 bits)   | fixed             | bit 6         |
//! | 240 | C&E                | `$4020-$5FFF` | 32 KiB (bits 4-7)    | 8 KiB (bits 0-3)  | header        |
//! | 241 | BxROM variant      | `$8000-$FFFF` | 32 KiB               | fixed             | header        |
//!
//! *Only on the Fire Hawk board (submapper 1).
//!
//! Jaleco JF-17/19 latch PRG when bit 7 of the written byte is set and CHR
//! when bit 6 is, both from the low nibble. Mapper 60 has no register at
//! all: each console reset advances to the next game.

use std::borrow::Cow;

use crate::cartridge::{
    banks::BankedAddressSpace,
    header::Mirroring,
    image::CartridgeImage,
    mapper::{ExtraState, Mapper},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscreteBoard {
    Nrom,
    Uxrom,
    Cnrom,
    Axrom,
    ColorDreams,
    Txc36,
    BitCorp,
    ResetMulticart60,
    Gxrom,
    Bandai74161,
    Camerica { fire_hawk: bool },
    Irem74161 { holy_diver: bool },
    JalecoJf17 { upper: bool },
    Nina003,
    JalecoJf13,
    Jaleco87,
    Sunsoft2 { chr_latch: bool },
    Un1rom,
    Irem97,
    MagicDragon,
    Nina006,
    JalecoJf11,
    Taito152,
    Unrom180,
    Sunsoft1,
    Cnrom185,
    Multicart226,
    Mapper240,
    Mapper241,
}

/// Which latch a CPU write lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LatchTarget {
    Bank,
    Aux,
}

impl DiscreteBoard {
    pub fn from_id(id: u16, submapper: u8) -> Option<Self> {
        use DiscreteBoard::*;

        let board = match id {
            0 => Nrom,
            2 => Uxrom,
            3 => Cnrom,
            7 => Axrom,
            11 => ColorDreams,
            36 => Txc36,
            38 => BitCorp,
            60 => ResetMulticart60,
            66 => Gxrom,
            70 => Bandai74161,
            71 => Camerica {
                fire_hawk: submapper == 1,
            },
            78 => Irem74161 {
                holy_diver: submapper == 3,
            },
            72 => JalecoJf17 { upper: false },
            79 => Nina003,
            86 => JalecoJf13,
            87 => Jaleco87,
            89 => Sunsoft2 { chr_latch: true },
            92 => JalecoJf17 { upper: true },
            93 => Sunsoft2 { chr_latch: false },
            94 => Un1rom,
            97 => Irem97,
            107 => MagicDragon,
            113 => Nina006,
            140 => JalecoJf11,
            152 => Taito152,
            180 => Unrom180,
            184 => Sunsoft1,
            185 => Cnrom185,
            226 => Multicart226,
            240 => Mapper240,
            241 => Mapper241,
            _ => return None,
        };
        Some(board)
    }

    fn name(self) -> &'static str {
        use DiscreteBoard::*;

        match self {
            Nrom => "NROM",
            Uxrom => "UxROM",
            Cnrom => "CNROM",
            Axrom => "AxROM",
            ColorDreams => "Color Dreams",
            Txc36 => "TXC 01-22000-400",
            BitCorp => "Bit Corp PCI556",
            ResetMulticart60 => "Reset-based 4-in-1",
            Gxrom => "GxROM",
            Bandai74161 => "Bandai 74161",
            Camerica { .. } => "Camerica BF909x",
            Irem74161 { .. } => "Irem 74HC161",
            JalecoJf17 { upper: false } => "Jaleco JF-17",
            JalecoJf17 { upper: true } => "Jaleco JF-19",
            Nina003 => "NINA-003",
            JalecoJf13 => "Jaleco JF-13",
            Jaleco87 => "Jaleco JF-87",
            Sunsoft2 { .. } => "Sunsoft-2",
            Un1rom => "UN1ROM",
            Irem97 => "Irem TAM-S1",
            MagicDragon => "Magic Dragon",
            Nina006 => "NINA-006",
            JalecoJf11 => "Jaleco JF-11",
            Taito152 => "Bandai 74161 (1-screen)",
            Unrom180 => "UNROM (Crazy Climber)",
            Sunsoft1 => "Sunsoft-1",
            Cnrom185 => "CNROM (185)",
            Multicart226 => "76-in-1 (226)",
            Mapper240 => "C&E 240",
            Mapper241 => "BxROM (241)",
        }
    }

    fn decode(self, addr: u16) -> Option<LatchTarget> {
        use DiscreteBoard::*;

        match self {
            Nrom | ResetMulticart60 => None,
            Txc36 => match addr {
                0x4020..=0x5FFF if addr & 0xE200 == 0x4200 => Some(LatchTarget::Aux),
                0x8000..=0xFFFF => Some(LatchTarget::Bank),
                _ => None,
            },
            Irem97 => matches!(addr, 0x8000..=0xBFFF).then_some(LatchTarget::Bank),
            Multicart226 => match addr {
                0x8000..=0xFFFF if addr & 0x01 == 0 => Some(LatchTarget::Bank),
                0x8000..=0xFFFF => Some(LatchTarget::Aux),
                _ => None,
            },
            BitCorp => matches!(addr, 0x7000..=0x7FFF).then_some(LatchTarget::Bank),
            JalecoJf13 => matches!(addr, 0x6000..=0x6FFF).then_some(LatchTarget::Bank),
            Jaleco87 | JalecoJf11 | Sunsoft1 => {
                matches!(addr, 0x6000..=0x7FFF).then_some(LatchTarget::Bank)
            }
            Nina003 | Nina006 => {
                (matches!(addr, 0x4020..=0x5FFF) && addr & 0xE100 == 0x4100)
                    .then_some(LatchTarget::Bank)
            }
            Mapper240 => matches!(addr, 0x4020..=0x5FFF).then_some(LatchTarget::Bank),
            Camerica { fire_hawk } => match addr {
                0xC000..=0xFFFF => Some(LatchTarget::Bank),
                0x9000..=0x9FFF if fire_hawk => Some(LatchTarget::Aux),
                _ => None,
            },
            _ => (addr >= 0x8000).then_some(LatchTarget::Bank),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscreteLatch {
    id: u16,
    board: DiscreteBoard,
    banks: BankedAddressSpace,
    latch: u8,
    /// Second latch, only wired on boards with a separate register or a
    /// split data byte.
    aux_latch: u8,
}

impl DiscreteLatch {
    pub fn new(image: &CartridgeImage, board: DiscreteBoard) -> Self {
        let mut mapper = Self {
            id: image.mapper_id(),
            board,
            banks: BankedAddressSpace::new(image),
            latch: 0,
            aux_latch: 0,
        };
        mapper.update_banks();
        mapper
    }

    pub fn board(&self) -> DiscreteBoard {
        self.board
    }

    fn write_latch(&mut self, target: LatchTarget, value: u8) {
        match (self.board, target) {
            (DiscreteBoard::JalecoJf17 { .. }, _) => {
                if value & 0x80 != 0 {
                    self.latch = value & 0x0F;
                }
                if value & 0x40 != 0 {
                    self.aux_latch = value & 0x0F;
                }
            }
            (_, LatchTarget::Bank) => self.latch = value,
            (_, LatchTarget::Aux) => self.aux_latch = value,
        }
        self.update_banks();
    }

    /// Pattern fetches are live only while the latch holds a key the
    /// protection chip accepts; otherwise the data lines float high.
    fn chr_enabled(&self) -> bool {
        self.board != DiscreteBoard::Cnrom185 || (self.latch & 0x0F != 0 && self.latch != 0x13)
    }

    /// Recompute the bank tables from the latched bits.
    fn update_banks(&mut self) {
        use DiscreteBoard::*;

        let v = usize::from(self.latch);
        let aux = usize::from(self.aux_latch);
        let bit = |mask: u8| self.latch & mask != 0;
        let banks = &mut self.banks;
        let last16 = banks.last_prg_bank(16);

        match self.board {
            Nrom => {}
            Uxrom => {
                banks.map_prg_16k(0, v);
                banks.map_prg_16k(1, last16);
            }
            Cnrom => banks.map_chr_8k(v),
            Axrom => {
                banks.map_prg_32k(v & 0x07);
                banks.set_mirroring(Mirroring::single_screen(bit(0x10)));
            }
            ColorDreams => {
                banks.map_prg_32k(v & 0x03);
                banks.map_chr_8k(v >> 4);
            }
            Txc36 => {
                banks.map_prg_32k((aux >> 4) & 0x03);
                banks.map_chr_8k(v & 0x0F);
            }
            ResetMulticart60 => {
                banks.map_prg_16k(0, v & 0x03);
                banks.map_prg_16k(1, v & 0x03);
                banks.map_chr_8k(v & 0x03);
            }
            JalecoJf17 { upper } => {
                if upper {
                    banks.map_prg_16k(0, 0);
                    banks.map_prg_16k(1, v);
                } else {
                    banks.map_prg_16k(0, v);
                    banks.map_prg_16k(1, last16);
                }
                banks.map_chr_8k(aux);
            }
            Irem97 => {
                banks.map_prg_16k(0, last16);
                banks.map_prg_16k(1, v & 0x1F);
                banks.set_mirroring(match v >> 6 {
                    0 => Mirroring::SingleScreenLower,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::Vertical,
                    _ => Mirroring::SingleScreenUpper,
                });
            }
            Cnrom185 => {}
            Multicart226 => {
                let bank = ((v >> 1) & 0x0F) | ((v >> 3) & 0x10) | ((aux & 0x01) << 5);
                if bit(0x20) {
                    let bank16 = (bank << 1) | (v & 0x01);
                    banks.map_prg_16k(0, bank16);
                    banks.map_prg_16k(1, bank16);
                } else {
                    banks.map_prg_32k(bank);
                }
                banks.set_mirroring(if bit(0x40) {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                });
            }
            BitCorp => {
                banks.map_prg_32k(v & 0x03);
                banks.map_chr_8k((v >> 2) & 0x03);
            }
            Gxrom => {
                banks.map_prg_32k((v >> 4) & 0x03);
                banks.map_chr_8k(v & 0x03);
            }
            Bandai74161 => {
                banks.map_prg_16k(0, v >> 4);
                banks.map_prg_16k(1, last16);
                banks.map_chr_8k(v & 0x0F);
            }
            Camerica { fire_hawk } => {
                banks.map_prg_16k(0, v & 0x0F);
                banks.map_prg_16k(1, last16);
                if fire_hawk {
                    banks.set_mirroring(Mirroring::single_screen(aux & 0x10 != 0));
                }
            }
            Irem74161 { holy_diver } => {
                banks.map_prg_16k(0, v & 0x07);
                banks.map_prg_16k(1, last16);
                banks.map_chr_8k(v >> 4);
                let mirroring = if holy_diver {
                    if bit(0x08) {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    }
                } else {
                    Mirroring::single_screen(bit(0x08))
                };
                banks.set_mirroring(mirroring);
            }
            Nina003 => {
                banks.map_prg_32k((v >> 3) & 0x01);
                banks.map_chr_8k(v & 0x07);
            }
            JalecoJf13 => {
                banks.map_prg_32k((v >> 4) & 0x03);
                banks.map_chr_8k((v & 0x03) | ((v >> 4) & 0x04));
            }
            Jaleco87 => banks.map_chr_8k(((v & 0x01) << 1) | ((v >> 1) & 0x01)),
            Sunsoft2 { chr_latch } => {
                banks.map_prg_16k(0, (v >> 4) & 0x07);
                banks.map_prg_16k(1, last16);
                if chr_latch {
                    banks.map_chr_8k((v & 0x07) | ((v & 0x80) >> 4));
                    banks.set_mirroring(Mirroring::single_screen(bit(0x08)));
                }
            }
            Un1rom => {
                banks.map_prg_16k(0, (v >> 2) & 0x07);
                banks.map_prg_16k(1, last16);
            }
            MagicDragon => {
                banks.map_prg_32k(v >> 1);
                banks.map_chr_8k(v);
            }
            Nina006 => {
                banks.map_prg_32k((v >> 3) & 0x07);
                banks.map_chr_8k((v & 0x07) | ((v >> 3) & 0x08));
                banks.set_mirroring(if bit(0x80) {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                });
            }
            JalecoJf11 => {
                banks.map_prg_32k((v >> 4) & 0x03);
                banks.map_chr_8k(v & 0x0F);
            }
            Taito152 => {
                banks.map_prg_16k(0, (v >> 4) & 0x07);
                banks.map_prg_16k(1, last16);
                banks.map_chr_8k(v & 0x0F);
                banks.set_mirroring(Mirroring::single_screen(bit(0x80)));
            }
            Unrom180 => {
                banks.map_prg_16k(0, 0);
                banks.map_prg_16k(1, v & 0x07);
            }
            Sunsoft1 => {
                banks.map_chr_4k(0, v & 0x07);
                banks.map_chr_4k(1, 0x04 | ((v >> 4) & 0x07));
            }
            Mapper240 => {
                banks.map_prg_32k(v >> 4);
                banks.map_chr_8k(v & 0x0F);
            }
            Mapper241 => banks.map_prg_32k(v),
        }
    }
}

impl Mapper for DiscreteLatch {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match self.board.decode(addr) {
            Some(target) => {
                tracing::trace!(id = self.id, addr, value, ?target, "bank latch");
                self.write_latch(target, value);
            }
            None => self.banks.cart_write(addr, value),
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        if addr < 0x2000 && !self.chr_enabled() {
            return 0xFF;
        }
        self.banks.ppu_read(addr)
    }

    fn reset(&mut self) {
        if self.board == DiscreteBoard::ResetMulticart60 {
            self.latch = self.latch.wrapping_add(1) & 0x03;
            tracing::debug!(game = self.latch, "multicart advanced on reset");
            self.update_banks();
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

    fn extra_state(&self) -> Option<&dyn ExtraState> {
        Some(self)
    }

    fn extra_state_mut(&mut self) -> Option<&mut dyn ExtraState> {
        Some(self)
    }
}

impl ExtraState for DiscreteLatch {
    fn save_extra(&self) -> u32 {
        u32::from(self.latch) | (u32::from(self.aux_latch) << 8)
    }

    fn load_extra(&mut self, value: u32) {
        self.latch = value as u8;
        self.aux_latch = (value >> 8) as u8;
        self.update_banks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn board(id: u16, prg_kb: usize, chr_kb: usize) -> DiscreteLatch {
        let image = paged_image(Header::new(id), prg_kb, chr_kb);
        let board = DiscreteBoard::from_id(id, 0).unwrap();
        DiscreteLatch::new(&image, board)
    }

    #[test]
    fn uxrom_switches_low_window_and_fixes_last() {
        let mut m = board(2, 128, 0);
        assert_eq!(m.cpu_read(0x8000), 0);
        assert_eq!(m.cpu_read(0xC000), 112);

        m.cpu_write(0x8000, 3);
        assert_eq!(m.cpu_read(0x8000), 48);
        assert_eq!(m.cpu_read(0xFFFF), 127);
    }

    #[test]
    fn cnrom_switches_chr() {
        let mut m = board(3, 32, 32);
        m.cpu_write(0xFFFF, 2);
        assert_eq!(m.ppu_read(0x0000), 16);
        assert_eq!(m.ppu_read(0x1C00), 23);
    }

    #[test]
    fn axrom_selects_single_screen() {
        let mut m = board(7, 256, 0);
        m.cpu_write(0x8000, 0x12);
        assert_eq!(m.cpu_read(0x8000), 64);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenUpper);
        m.cpu_write(0x8000, 0x00);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenLower);
    }

    #[test]
    fn gxrom_splits_nibbles() {
        let mut m = board(66, 128, 32);
        m.cpu_write(0x8000, 0x31);
        assert_eq!(m.cpu_read(0x8000), 96);
        assert_eq!(m.ppu_read(0x0000), 8);
    }

    #[test]
    fn nina_registers_need_address_match() {
        let mut m = board(113, 256, 128);
        m.cpu_write(0x4200, 0xFF);
        assert_eq!(m.cpu_read(0x8000), 0);

        m.cpu_write(0x4100, 0b1100_1001);
        // PRG bits 3-5 = 1, CHR = 1 | bit6 -> 9.
        assert_eq!(m.cpu_read(0x8000), 32);
        assert_eq!(m.ppu_read(0x0000), 72);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn mapper_180_switches_upper_window() {
        let mut m = board(180, 128, 0);
        m.cpu_write(0x8000, 5);
        assert_eq!(m.cpu_read(0x8000), 0);
        assert_eq!(m.cpu_read(0xC000), 80);
    }

    #[test]
    fn sunsoft1_forces_upper_chr_half() {
        let mut m = board(184, 32, 32);
        m.cpu_write(0x6000, 0x21);
        assert_eq!(m.ppu_read(0x0000), 4);
        assert_eq!(m.ppu_read(0x1000), 24);
    }

    #[test]
    fn fire_hawk_mirroring_register() {
        let image = paged_image(Header::new(71).with_submapper(1), 128, 0);
        let board = DiscreteBoard::from_id(71, 1).unwrap();
        let mut m = DiscreteLatch::new(&image, board);
        m.cpu_write(0x9000, 0x10);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenUpper);
        m.cpu_write(0xC000, 2);
        assert_eq!(m.cpu_read(0x8000), 32);
    }

    #[test]
    fn extra_state_restores_banks() {
        let mut m = board(11, 128, 128);
        m.cpu_write(0x8000, 0x52);
        let saved = m.save_extra();

        let mut fresh = board(11, 128, 128);
        fresh.load_extra(saved);
        assert_eq!(fresh.cpu_read(0x8000), m.cpu_read(0x8000));
        assert_eq!(fresh.ppu_read(0x0400), m.ppu_read(0x0400));
        assert_eq!(fresh.banks().prg_map(), m.banks().prg_map());
    }

    #[test]
    fn jaleco_jf17_latches_on_strobe_bits() {
        let mut m = board(72, 128, 64);
        m.cpu_write(0x8000, 0x83);
        assert_eq!(m.cpu_read(0x8000), 48);
        assert_eq!(m.cpu_read(0xC000), 112);
        assert_eq!(m.ppu_read(0x0000), 0);

        m.cpu_write(0x8000, 0x45);
        assert_eq!(m.ppu_read(0x0000), 40);
        // Without a strobe bit the latches hold.
        m.cpu_write(0x8000, 0x01);
        assert_eq!(m.cpu_read(0x8000), 48);
        assert_eq!(m.ppu_read(0x0000), 40);
    }

    #[test]
    fn jaleco_jf19_switches_upper_window() {
        let mut m = board(92, 128, 64);
        m.cpu_write(0x8000, 0x82);
        assert_eq!(m.cpu_read(0x8000), 0);
        assert_eq!(m.cpu_read(0xC000), 32);
    }

    #[test]
    fn txc_36_splits_prg_and_chr_registers() {
        let mut m = board(36, 128, 128);
        m.cpu_write(0x4200, 0x20);
        assert_eq!(m.cpu_read(0x8000), 64);
        m.cpu_write(0x8000, 0x03);
        assert_eq!(m.ppu_read(0x0000), 24);
        assert_eq!(m.cpu_read(0x8000), 64);
    }

    #[test]
    fn irem_97_fixes_last_bank_low() {
        let mut m = board(97, 256, 8);
        m.cpu_write(0x8000, 0x83);
        assert_eq!(m.cpu_read(0x8000), 240);
        assert_eq!(m.cpu_read(0xC000), 48);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        // $C000-$FFFF is not decoded.
        m.cpu_write(0xC000, 0x00);
        assert_eq!(m.cpu_read(0xC000), 48);
    }

    #[test]
    fn cnrom_185_floats_chr_without_key() {
        let mut m = board(185, 32, 8);
        assert_eq!(m.ppu_read(0x0000), 0xFF);
        m.cpu_write(0x8000, 0x21);
        assert_eq!(m.ppu_read(0x0400), 1);
        m.cpu_write(0x8000, 0x13);
        assert_eq!(m.ppu_read(0x0400), 0xFF);
        // Nametables are not gated.
        m.ppu_write(0x2000, 0x5A);
        assert_eq!(m.ppu_read(0x2000), 0x5A);
    }

    #[test]
    fn mapper_60_advances_on_reset() {
        let mut m = board(60, 64, 32);
        assert_eq!(m.cpu_read(0xC000), 0);
        m.reset();
        assert_eq!(m.cpu_read(0x8000), 16);
        assert_eq!(m.cpu_read(0xC000), 16);
        assert_eq!(m.ppu_read(0x0000), 8);
        for _ in 0..3 {
            m.reset();
        }
        assert_eq!(m.cpu_read(0x8000), 0);
    }

    #[test]
    fn multicart_226_combines_both_registers() {
        let mut m = board(226, 2048, 8);
        // 16 KiB mode, bank bits 1-4 = 3, low bit 1.
        m.cpu_write(0x8000, 0x27);
        assert_eq!(m.cpu_read(0x8000), 112);
        assert_eq!(m.cpu_read(0xC000), 112);
        m.cpu_write(0x8001, 0x01);
        // The second register supplies bank bit 5.
        assert_eq!(m.banks().prg_map()[0], 71 * 16 * 1024);
        assert_eq!(m.banks().prg_map()[16], 71 * 16 * 1024);
        m.cpu_write(0x8000, 0x40);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn nrom_writes_only_touch_prg_ram() {
        let mut m = board(0, 16, 8);
        m.cpu_write(0x8000, 0xFF);
        assert_eq!(m.cpu_read(0x8000), 0);
        m.cpu_write(0x6000, 0xAB);
        assert_eq!(m.cpu_read(0x6000), 0xAB);
    }
}

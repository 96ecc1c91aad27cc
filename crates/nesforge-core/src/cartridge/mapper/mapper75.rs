//! Mapper 75 (Konami VRC1).
//!
//! | Area | Address range | Behaviour                                              |
//! |------|---------------|--------------------------------------------------------|
//! | CPU  | `$8000-$8FFF` | PRG bank `$8000` (8 KiB, 4 bits)                       |
//! | CPU  | `$9000-$9FFF` | Bit 0 mirroring (1 = H); bits 1-2 CHR bank high bits   |
//! | CPU  | `$A000-$AFFF` | PRG bank `$A000`                                       |
//! | CPU  | `$C000-$CFFF` | PRG bank `$C000`                                       |
//! | CPU  | `$E000-$EFFF` | CHR bank `$0000` (4 KiB) low bits                      |
//! | CPU  | `$F000-$FFFF` | CHR bank `$1000` (4 KiB) low bits                      |

use std::borrow::Cow;

use crate::cartridge::{
    banks::BankedAddressSpace,
    header::Mirroring,
    image::CartridgeImage,
    mapper::{ExtraState, Mapper},
};

#[derive(Debug, Clone)]
pub struct Mapper75 {
    banks: BankedAddressSpace,
    four_screen: bool,
    prg_banks: [u8; 3],
    /// 5-bit CHR banks; bit 4 comes from `$9000`.
    chr_banks: [u8; 2],
    horizontal: bool,
}

impl Mapper75 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            four_screen: image.header().mirroring == Mirroring::FourScreen,
            prg_banks: [0, 1, 2],
            chr_banks: [0, 1],
            horizontal: image.header().mirroring == Mirroring::Horizontal,
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        for (slot, &bank) in self.prg_banks.iter().enumerate() {
            self.banks.map_prg_8k(slot, usize::from(bank & 0x0F));
        }
        let last = self.banks.last_prg_bank(8);
        self.banks.map_prg_8k(3, last);
        self.banks.map_chr_4k(0, usize::from(self.chr_banks[0]));
        self.banks.map_chr_4k(1, usize::from(self.chr_banks[1]));
        if !self.four_screen {
            self.banks
                .set_mirroring(Mirroring::from_vh_bit(self.horizontal));
        }
    }
}

impl Mapper for Mapper75 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr & 0xF000 {
            0x8000 => self.prg_banks[0] = value,
            0xA000 => self.prg_banks[1] = value,
            0xC000 => self.prg_banks[2] = value,
            0x9000 => {
                self.horizontal = value & 0x01 != 0;
                self.chr_banks[0] = (self.chr_banks[0] & 0x0F) | ((value & 0x02) << 3);
                self.chr_banks[1] = (self.chr_banks[1] & 0x0F) | ((value & 0x04) << 2);
            }
            0xE000 => self.chr_banks[0] = (self.chr_banks[0] & 0x10) | (value & 0x0F),
            0xF000 => self.chr_banks[1] = (self.chr_banks[1] & 0x10) | (value & 0x0F),
            _ => {
                self.banks.cart_write(addr, value);
                return;
            }
        }
        self.update_banks();
    }

    fn mapper_id(&self) -> u16 {
        75
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("VRC1")
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

impl ExtraState for Mapper75 {
    fn save_extra(&self) -> u32 {
        u32::from(self.prg_banks[0] & 0x0F)
            | (u32::from(self.prg_banks[1] & 0x0F) << 4)
            | (u32::from(self.prg_banks[2] & 0x0F) << 8)
            | (u32::from(self.chr_banks[0] & 0x1F) << 12)
            | (u32::from(self.chr_banks[1] & 0x1F) << 17)
            | (u32::from(self.horizontal) << 22)
    }

    fn load_extra(&mut self, value: u32) {
        let nibble = |shift: u32| ((value >> shift) & 0x0F) as u8;
        let five = |shift: u32| ((value >> shift) & 0x1F) as u8;
        self.prg_banks = [nibble(0), nibble(4), nibble(8)];
        self.chr_banks = [five(12), five(17)];
        self.horizontal = value & (1 << 22) != 0;
        self.update_banks();
    }
}

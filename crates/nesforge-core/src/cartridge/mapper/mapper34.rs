//! Mapper 34 (BNROM and NINA-001).
//!
//! Two unrelated boards share the id. BNROM carts ship CHR RAM and latch a
//! 32 KiB PRG bank on any `$8000-$FFFF` write; NINA-001 carts ship CHR ROM
//! and hide three registers at the top of PRG RAM.
//!
//! | Board    | Address  | Behaviour                               |
//! |----------|----------|-----------------------------------------|
//! | BNROM    | `$8000+` | 32 KiB PRG bank                         |
//! | NINA-001 | `$7FFD`  | 32 KiB PRG bank (bit 0)                 |
//! | NINA-001 | `$7FFE`  | 4 KiB CHR bank at `$0000`               |
//! | NINA-001 | `$7FFF`  | 4 KiB CHR bank at `$1000`               |

use std::borrow::Cow;

use crate::cartridge::{
    banks::BankedAddressSpace,
    image::CartridgeImage,
    mapper::{ExtraState, Mapper},
};

#[derive(Debug, Clone)]
pub struct Mapper34 {
    banks: BankedAddressSpace,
    nina: bool,
    prg_bank: u8,
    chr_banks: [u8; 2],
}

impl Mapper34 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::new(image),
            nina: !image.has_chr_ram(),
            prg_bank: 0,
            chr_banks: [0, 1],
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        self.banks.map_prg_32k(usize::from(self.prg_bank));
        if self.nina {
            self.banks.map_chr_4k(0, usize::from(self.chr_banks[0]));
            self.banks.map_chr_4k(1, usize::from(self.chr_banks[1]));
        }
    }
}

impl Mapper for Mapper34 {
    fn cpu_write(&mut self, addr: u16, value: u8) {
        match (self.nina, addr) {
            (false, 0x8000..=0xFFFF) => self.prg_bank = value,
            (true, 0x7FFD..=0x7FFF) => {
                // The registers sit on top of RAM, which keeps the byte too.
                self.banks.cart_write(addr, value);
                match addr {
                    0x7FFD => self.prg_bank = value & 0x01,
                    0x7FFE => self.chr_banks[0] = value & 0x0F,
                    _ => self.chr_banks[1] = value & 0x0F,
                }
            }
            _ => {
                self.banks.cart_write(addr, value);
                return;
            }
        }
        self.update_banks();
    }

    fn mapper_id(&self) -> u16 {
        34
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(if self.nina { "NINA-001" } else { "BNROM" })
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

impl ExtraState for Mapper34 {
    fn save_extra(&self) -> u32 {
        u32::from(self.prg_bank)
            | (u32::from(self.chr_banks[0]) << 8)
            | (u32::from(self.chr_banks[1]) << 16)
    }

    fn load_extra(&mut self, value: u32) {
        self.prg_bank = value as u8;
        self.chr_banks = [(value >> 8) as u8, (value >> 16) as u8];
        self.update_banks();
    }
}

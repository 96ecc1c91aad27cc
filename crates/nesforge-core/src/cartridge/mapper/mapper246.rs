//! Mapper 246 (G0151-1, Fong Shen Bang).
//!
//! | Area | Address range | Behaviour                                  | IRQ/Audio |
//! |------|---------------|--------------------------------------------|-----------|
//! | CPU  | `$6000-$6003` | 8 KiB PRG banks at `$8000/$A000/$C000/$E000` | None    |
//! | CPU  | `$6004-$6007` | 2 KiB CHR banks at `$0000-$1800`           | None      |
//! | CPU  | `$6800-$6FFF` | 2 KiB battery RAM                          | None      |
//!
//! The last PRG register powers on pointing at the final bank so the reset
//! vector is visible before the program has written anything.

use std::borrow::Cow;

use crate::{
    cartridge::{
        banks::{BankedAddressSpace, open_bus},
        image::CartridgeImage,
        mapper::Mapper,
    },
    memory::cpu as cpu_mem,
    state::{SaveState, StateError, StateReader, StateWriter},
};

const REGISTER_END: u16 = 0x6007;
const RAM_START: u16 = 0x6800;
const RAM_END: u16 = 0x6FFF;

#[derive(Debug, Clone)]
pub struct Mapper246 {
    banks: BankedAddressSpace,
    prg_banks: [u8; 4],
    chr_banks: [u8; 4],
}

impl Mapper246 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut mapper = Self {
            banks: BankedAddressSpace::with_prg_ram_len(image, cpu_mem::PRG_RAM_SIZE),
            prg_banks: [0, 1, 2, 0xFF],
            chr_banks: [0, 1, 2, 3],
        };
        mapper.update_banks();
        mapper
    }

    fn update_banks(&mut self) {
        for (slot, &bank) in self.prg_banks.iter().enumerate() {
            self.banks.map_prg_8k(slot, usize::from(bank));
        }
        for (slot, &bank) in self.chr_banks.iter().enumerate() {
            self.banks.map_chr_2k(slot, usize::from(bank));
        }
    }
}

impl Mapper for Mapper246 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            RAM_START..=RAM_END => self.banks.cart_read(addr),
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => open_bus(addr),
            _ => self.banks.cart_read(addr),
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            cpu_mem::PRG_RAM_START..=REGISTER_END => {
                let index = usize::from(addr & 0x03);
                if addr & 0x04 == 0 {
                    self.prg_banks[index] = value;
                } else {
                    self.chr_banks[index] = value;
                }
                self.update_banks();
            }
            RAM_START..=RAM_END => self.banks.cart_write(addr, value),
            _ => {}
        }
    }

    fn mapper_id(&self) -> u16 {
        246
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("G0151-1 (246)")
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

impl SaveState for Mapper246 {
    fn save_state(&self, w: &mut StateWriter) {
        w.bytes(&self.prg_banks);
        w.bytes(&self.chr_banks);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        r.bytes_into(&mut self.prg_banks, "246 prg banks")?;
        r.bytes_into(&mut self.chr_banks, "246 chr banks")?;
        self.update_banks();
        Ok(())
    }
}

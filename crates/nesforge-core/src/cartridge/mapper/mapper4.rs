//! Mapper 4 (MMC3 / TxROM) and the boards built on its bank file.
//!
//! | Area | Address range | Behaviour                                        | IRQ/Audio     |
//! |------|---------------|--------------------------------------------------|---------------|
//! | CPU  | `$6000-$7FFF` | PRG RAM with enable/write-protect                | None          |
//! | CPU  | `$8000-$9FFF` | Bank select (even) / bank data (odd)             | MMC3 scanline |
//! | CPU  | `$A000-$BFFF` | Mirroring (even) / PRG RAM protect (odd)         | MMC3 scanline |
//! | CPU  | `$C000-$DFFF` | IRQ latch (even) / IRQ reload (odd)              | MMC3 scanline |
//! | CPU  | `$E000-$FFFF` | IRQ disable+ack (even) / IRQ enable (odd)        | MMC3 scanline |
//! | PPU  | `$0000-$1FFF` | 2x 2 KiB + 4x 1 KiB CHR, halves swappable        | A12 edges     |
//!
//! The IRQ counter is clocked by debounced rising edges of PPU A12, which
//! happen once per rendered scanline with the usual pattern table layout.
//!
//! | Id  | Board    | Difference from TxROM                                          |
//! |-----|----------|----------------------------------------------------------------|
//! | 47  | NES-QJ   | `$6000-$7FFF` write bit 0 picks a 128 KiB PRG / CHR outer bank |
//! | 64  | RAMBO-1  | R8/R9/RF, full 1 KiB CHR mode, optional CPU-cycle IRQ (/4)     |
//! | 119 | TQROM    | CHR bank bit 6 selects 8 KiB of on-board CHR RAM               |
//! | 182 | 182      | Registers moved to `$A000/$C000`, bank indices scrambled       |

use std::borrow::Cow;

use crate::{
    cartridge::{
        a12_watcher::{A12Edge, A12Watcher},
        banks::{BankedAddressSpace, WINDOW_SIZE},
        header::Mirroring,
        image::{CHR_RAM_SIZE, CartridgeImage},
        mapper::{A12Irq, CycleIrq, Mapper},
    },
    memory::ppu as ppu_mem,
    state::{SaveState, StateError, StateReader, StateWriter},
};

/// CPU cycles per RAMBO-1 counter clock in cycle mode.
const RAMBO_PRESCALER: u8 = 4;
/// Bank-select index permutation of board 182.
const SCRAMBLED_INDEX: [u8; 8] = [0, 3, 1, 5, 6, 7, 2, 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Mmc3Board {
    Txrom,
    Qj,
    Rambo1,
    Tqrom,
    Scrambled,
}

impl Mmc3Board {
    fn from_id(id: u16) -> Self {
        match id {
            47 => Mmc3Board::Qj,
            64 => Mmc3Board::Rambo1,
            119 => Mmc3Board::Tqrom,
            182 => Mmc3Board::Scrambled,
            _ => Mmc3Board::Txrom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Mmc3Register {
    BankSelect,
    BankData,
    MirroringControl,
    PrgRamProtect,
    IrqLatch,
    IrqReload,
    IrqDisable,
    IrqEnable,
}

impl Mmc3Register {
    fn from_addr(addr: u16) -> Option<Self> {
        use Mmc3Register::*;

        let odd = addr & 1 != 0;
        let register = match (addr & 0xE000, odd) {
            (0x8000, false) => BankSelect,
            (0x8000, true) => BankData,
            (0xA000, false) => MirroringControl,
            (0xA000, true) => PrgRamProtect,
            (0xC000, false) => IrqLatch,
            (0xC000, true) => IrqReload,
            (0xE000, false) => IrqDisable,
            (0xE000, true) => IrqEnable,
            _ => return None,
        };
        Some(register)
    }
}

#[derive(Debug, Clone)]
pub struct Mapper4 {
    id: u16,
    board: Mmc3Board,
    banks: BankedAddressSpace,
    four_screen: bool,
    /// `$8000`: target register, bit 5 1 KiB CHR mode (RAMBO-1), bit 6 PRG
    /// mode, bit 7 CHR A12 inversion.
    bank_select: u8,
    /// R0-R7 written through `$8001`; RAMBO-1 also uses R8, R9 and RF.
    bank_regs: [u8; 16],
    /// NES-QJ outer 128 KiB bank.
    outer_bank: u8,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
    /// RAMBO-1 counts CPU cycles instead of A12 rises when set.
    irq_cycle_mode: bool,
    irq_prescaler: u8,
    a12: A12Watcher,
    /// TQROM on-board CHR RAM and the offset each CHR window reads from it.
    chr_ram: Option<Box<[u8]>>,
    chr_ram_map: [Option<usize>; 8],
}

impl Mapper4 {
    pub fn new(image: &CartridgeImage) -> Self {
        let board = Mmc3Board::from_id(image.mapper_id());
        let mut bank_regs = [0; 16];
        bank_regs[..8].copy_from_slice(&[0, 2, 4, 5, 6, 7, 0, 1]);
        let mut mapper = Self {
            id: image.mapper_id(),
            board,
            banks: BankedAddressSpace::new(image),
            four_screen: image.header().mirroring == Mirroring::FourScreen,
            bank_select: 0,
            bank_regs,
            outer_bank: 0,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            irq_cycle_mode: false,
            irq_prescaler: 0,
            a12: A12Watcher::default(),
            chr_ram: (board == Mmc3Board::Tqrom)
                .then(|| vec![0u8; CHR_RAM_SIZE].into_boxed_slice()),
            chr_ram_map: [None; 8],
        };
        mapper.update_banks();
        mapper
    }

    fn bank_index_mask(&self) -> u8 {
        if self.board == Mmc3Board::Rambo1 { 0x0F } else { 0x07 }
    }

    fn update_prg(&mut self) {
        let r = self.bank_regs.map(usize::from);
        let outer = usize::from(self.outer_bank) << 4;
        let qj = self.board == Mmc3Board::Qj;
        let (second_last, last) = if qj {
            (outer | 0x0E, outer | 0x0F)
        } else {
            let count = self.banks.prg_bank_count(8);
            (count.saturating_sub(2), count - 1)
        };
        let bank = |reg: usize| if qj { (reg & 0x0F) | outer } else { reg };
        let swapped = self.bank_select & 0x40 != 0;

        if self.board == Mmc3Board::Rambo1 {
            let (first, second, third) = if swapped {
                (r[15], r[6], r[7])
            } else {
                (r[6], r[7], r[15])
            };
            self.banks.map_prg_8k(0, first);
            self.banks.map_prg_8k(1, second);
            self.banks.map_prg_8k(2, third);
        } else {
            let (low, high) = if swapped {
                (second_last, bank(r[6]))
            } else {
                (bank(r[6]), second_last)
            };
            self.banks.map_prg_8k(0, low);
            self.banks.map_prg_8k(1, bank(r[7]));
            self.banks.map_prg_8k(2, high);
        }
        self.banks.map_prg_8k(3, last);
    }

    /// 1 KiB CHR page selected by each PPU window, before outer-bank and
    /// CHR RAM routing.
    fn chr_pages(&self) -> [usize; 8] {
        let r = self.bank_regs.map(usize::from);
        let full_1k = self.board == Mmc3Board::Rambo1 && self.bank_select & 0x20 != 0;
        let low_half = if full_1k {
            [r[0], r[8], r[1], r[9]]
        } else {
            [r[0] & !1, r[0] | 1, r[1] & !1, r[1] | 1]
        };
        let mut pages = [0; 8];
        pages[..4].copy_from_slice(&low_half);
        pages[4..].copy_from_slice(&r[2..6]);
        // With A12 inversion the 2 KiB pairs move to $1000.
        if self.bank_select & 0x80 != 0 {
            pages.rotate_left(4);
        }
        pages
    }

    fn update_chr(&mut self) {
        let outer = usize::from(self.outer_bank) << 7;
        for (slot, page) in self.chr_pages().into_iter().enumerate() {
            self.chr_ram_map[slot] = None;
            match self.board {
                Mmc3Board::Qj => self.banks.map_chr_1k(slot, (page & 0x7F) | outer),
                Mmc3Board::Tqrom if page & 0x40 != 0 => {
                    self.chr_ram_map[slot] = Some((page & 0x07) * WINDOW_SIZE);
                }
                Mmc3Board::Tqrom => self.banks.map_chr_1k(slot, page & 0x3F),
                _ => self.banks.map_chr_1k(slot, page),
            }
        }
    }

    fn update_banks(&mut self) {
        self.update_prg();
        self.update_chr();
    }

    /// Offset into the TQROM CHR RAM for a pattern-table address.
    fn chr_ram_offset(&self, addr: u16) -> Option<usize> {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr > ppu_mem::PATTERN_TABLE_END {
            return None;
        }
        let base = self.chr_ram_map[usize::from(addr >> 10)]?;
        Some(base + usize::from(addr & 0x03FF))
    }

    fn clock_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            // RAMBO-1 reloads one past the latch after a `$C001` write.
            let bump = u8::from(self.board == Mmc3Board::Rambo1 && self.irq_reload);
            self.irq_counter = self.irq_latch.wrapping_add(bump);
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn write_register(&mut self, register: Mmc3Register, value: u8) {
        tracing::trace!(id = self.id, ?register, value, "mmc3 register");
        match register {
            Mmc3Register::BankSelect => {
                self.bank_select = value;
                self.update_banks();
            }
            Mmc3Register::BankData => {
                let target = usize::from(self.bank_select & self.bank_index_mask());
                self.bank_regs[target] = value;
                self.update_banks();
            }
            Mmc3Register::MirroringControl => {
                if !self.four_screen {
                    self.banks
                        .set_mirroring(Mirroring::from_vh_bit(value & 0x01 != 0));
                }
            }
            Mmc3Register::PrgRamProtect => {
                self.prg_ram_enabled = value & 0x80 != 0;
                self.prg_ram_write_protect = value & 0x40 != 0;
            }
            Mmc3Register::IrqLatch => self.irq_latch = value,
            Mmc3Register::IrqReload => {
                self.irq_counter = 0;
                self.irq_reload = true;
                if self.board == Mmc3Board::Rambo1 {
                    self.irq_cycle_mode = value & 0x01 != 0;
                    self.irq_prescaler = 0;
                }
            }
            Mmc3Register::IrqDisable => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            Mmc3Register::IrqEnable => self.irq_enabled = true,
        }
    }

    /// Board 182 decodes its registers on `A15-A13` plus `A0`.
    fn write_scrambled(&mut self, addr: u16, value: u8) {
        match addr & 0xE001 {
            0x8001 => self.write_register(Mmc3Register::MirroringControl, value),
            0xA000 => {
                let index = SCRAMBLED_INDEX[usize::from(value & 0x07)];
                self.write_register(Mmc3Register::BankSelect, (value & 0xF8) | index);
            }
            0xC000 => self.write_register(Mmc3Register::BankData, value),
            0xC001 => {
                self.write_register(Mmc3Register::IrqLatch, value);
                self.write_register(Mmc3Register::IrqReload, value);
            }
            0xE000 => self.write_register(Mmc3Register::IrqDisable, value),
            0xE001 => self.write_register(Mmc3Register::IrqEnable, value),
            _ => {}
        }
    }

    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_enabled && !self.prg_ram_write_protect
    }
}

impl Mapper for Mapper4 {
    fn cpu_read(&self, addr: u16) -> u8 {
        if (0x6000..=0x7FFF).contains(&addr) && !self.prg_ram_enabled {
            return crate::cartridge::banks::open_bus(addr);
        }
        self.banks.cart_read(addr)
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr < 0x8000 {
            if !self.prg_ram_writable() {
                return;
            }
            if self.board == Mmc3Board::Qj && (0x6000..=0x7FFF).contains(&addr) {
                self.outer_bank = value & 0x01;
                self.update_banks();
            } else {
                self.banks.cart_write(addr, value);
            }
            return;
        }

        if self.board == Mmc3Board::Scrambled {
            self.write_scrambled(addr, value);
        } else if let Some(register) = Mmc3Register::from_addr(addr) {
            self.write_register(register, value);
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        match (self.chr_ram_offset(addr), &self.chr_ram) {
            (Some(offset), Some(ram)) => ram[offset],
            _ => self.banks.ppu_read(addr),
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        match (self.chr_ram_offset(addr), self.chr_ram.as_mut()) {
            (Some(offset), Some(ram)) => ram[offset] = value,
            _ => self.banks.ppu_write(addr, value),
        }
    }

    fn mapper_id(&self) -> u16 {
        self.id
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self.board {
            Mmc3Board::Txrom => "MMC3",
            Mmc3Board::Qj => "NES-QJ",
            Mmc3Board::Rambo1 => "Tengen RAMBO-1",
            Mmc3Board::Tqrom => "TQROM",
            Mmc3Board::Scrambled => "MMC3 (182)",
        })
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
        self.irq_pending = false;
        self.a12.reset();
    }

    fn a12_irq(&mut self) -> Option<&mut dyn A12Irq> {
        Some(self)
    }

    fn cycle_irq(&mut self) -> Option<&mut dyn CycleIrq> {
        if self.board == Mmc3Board::Rambo1 {
            Some(self)
        } else {
            None
        }
    }

    fn board_state(&self) -> Option<&dyn SaveState> {
        Some(self)
    }

    fn board_state_mut(&mut self) -> Option<&mut dyn SaveState> {
        Some(self)
    }
}

impl A12Irq for Mapper4 {
    fn on_ppu_address(&mut self, addr: u16, frame_dot: u32) {
        if self.a12.observe(addr, frame_dot) == A12Edge::Rise && !self.irq_cycle_mode {
            self.clock_counter();
        }
    }
}

impl CycleIrq for Mapper4 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        if !self.irq_cycle_mode {
            return;
        }
        for _ in 0..cycles {
            self.irq_prescaler += 1;
            if self.irq_prescaler == RAMBO_PRESCALER {
                self.irq_prescaler = 0;
                self.clock_counter();
            }
        }
    }
}

impl SaveState for Mapper4 {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.bank_select);
        w.bytes(&self.bank_regs);
        w.u8(self.outer_bank);
        w.bool(self.prg_ram_enabled);
        w.bool(self.prg_ram_write_protect);
        w.u8(self.irq_latch);
        w.u8(self.irq_counter);
        w.bool(self.irq_reload);
        w.bool(self.irq_enabled);
        w.bool(self.irq_pending);
        w.bool(self.irq_cycle_mode);
        w.u8(self.irq_prescaler);
        self.a12.save_state(w);
        if let Some(ram) = &self.chr_ram {
            w.bytes(ram);
        }
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.bank_select = r.u8("mmc3 bank select")?;
        r.bytes_into(&mut self.bank_regs, "mmc3 bank registers")?;
        self.outer_bank = r.u8("mmc3 outer bank")? & 0x01;
        self.prg_ram_enabled = r.bool("mmc3 prg ram enable")?;
        self.prg_ram_write_protect = r.bool("mmc3 prg ram protect")?;
        self.irq_latch = r.u8("mmc3 irq latch")?;
        self.irq_counter = r.u8("mmc3 irq counter")?;
        self.irq_reload = r.bool("mmc3 irq reload")?;
        self.irq_enabled = r.bool("mmc3 irq enable")?;
        self.irq_pending = r.bool("mmc3 irq pending")?;
        self.irq_cycle_mode = r.bool("mmc3 irq cycle mode")?;
        self.irq_prescaler = r.u8("mmc3 irq prescaler")? % RAMBO_PRESCALER;
        self.a12.load_state(r)?;
        if let Some(ram) = self.chr_ram.as_mut() {
            r.bytes_into(ram, "tqrom chr ram")?;
        }
        self.update_banks();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn board(id: u16) -> Mapper4 {
        Mapper4::new(&paged_image(Header::new(id), 256, 256))
    }

    fn mmc3() -> Mapper4 {
        board(4)
    }

    /// One rendered scanline: background at $0000, sprites at $1000.
    fn scanline(m: &mut Mapper4, line: u32) {
        let base = line * 341;
        m.check_a12(0x0000, base);
        m.check_a12(0x1000, base + 257);
        m.check_a12(0x0000, base + 321);
    }

    #[test]
    fn prg_mode_swaps_fixed_window() {
        let mut m = mmc3();
        m.cpu_write(0x8000, 6);
        m.cpu_write(0x8001, 3);
        assert_eq!(m.cpu_read(0x8000), 24);
        assert_eq!(m.cpu_read(0xC000), 240);
        assert_eq!(m.cpu_read(0xE000), 248);

        m.cpu_write(0x8000, 0x46);
        assert_eq!(m.cpu_read(0x8000), 240);
        assert_eq!(m.cpu_read(0xC000), 24);
    }

    #[test]
    fn chr_inversion_moves_pairs() {
        let mut m = mmc3();
        m.cpu_write(0x8000, 0);
        m.cpu_write(0x8001, 9);
        m.cpu_write(0x8000, 2);
        m.cpu_write(0x8001, 30);
        assert_eq!(m.ppu_read(0x0000), 8);
        assert_eq!(m.ppu_read(0x0400), 9);
        assert_eq!(m.ppu_read(0x1000), 30);

        m.cpu_write(0x8000, 0x80);
        assert_eq!(m.ppu_read(0x1000), 8);
        assert_eq!(m.ppu_read(0x0000), 30);
    }

    #[test]
    fn a12_rises_clock_the_irq_counter() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 3);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        for line in 0..3 {
            scanline(&mut m, line);
            assert!(!m.irq_pending(), "line {line}");
        }
        scanline(&mut m, 3);
        assert!(m.irq_pending());

        m.cpu_write(0xE000, 0);
        assert!(!m.irq_pending());
    }

    #[test]
    fn tight_a12_toggles_count_once() {
        let mut m = mmc3();
        m.cpu_write(0xC000, 1);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);

        // First rise reloads the counter from the latch.
        m.check_a12(0x0000, 0);
        m.check_a12(0x1000, 257);
        for dot in (258..280).step_by(2) {
            m.check_a12(0x0000, dot);
            m.check_a12(0x1000, dot + 1);
        }
        assert!(!m.irq_pending());

        m.check_a12(0x0000, 321);
        m.check_a12(0x1000, 341 + 257);
        assert!(m.irq_pending());
    }

    #[test]
    fn prg_ram_protect() {
        let mut m = mmc3();
        m.cpu_write(0x6000, 0x11);
        m.cpu_write(0xA001, 0xC0);
        m.cpu_write(0x6000, 0x22);
        assert_eq!(m.cpu_read(0x6000), 0x11);
        m.cpu_write(0xA001, 0x00);
        assert_eq!(m.cpu_read(0x6000), 0x60);
    }

    #[test]
    fn board_state_restores_banks_and_counter() {
        let mut m = mmc3();
        m.cpu_write(0x8000, 0x46);
        m.cpu_write(0x8001, 5);
        m.cpu_write(0xC000, 2);
        m.cpu_write(0xC001, 0);
        m.cpu_write(0xE001, 0);
        scanline(&mut m, 0);

        let mut w = StateWriter::new();
        m.save_state(&mut w);
        let blob = w.finish().unwrap();

        // Move the live board on so a partial restore would show.
        let mut restored = mmc3();
        restored.cpu_write(0x8000, 0x06);
        restored.cpu_write(0x8001, 9);
        restored
            .load_state(&mut StateReader::new(blob.as_bytes()))
            .unwrap();

        assert_eq!(restored.banks().prg_map(), m.banks().prg_map());
        assert_eq!(restored.cpu_read(0xC000), 40);
        for line in 1..3 {
            scanline(&mut m, line);
            scanline(&mut restored, line);
            assert_eq!(restored.irq_pending(), m.irq_pending(), "line {line}");
        }
        assert!(restored.irq_pending());
    }

    #[test]
    fn qj_outer_bank_from_prg_ram_window() {
        let mut m = board(47);
        m.cpu_write(0x8000, 6);
        m.cpu_write(0x8001, 2);
        assert_eq!(m.cpu_read(0x8000), 16);
        assert_eq!(m.cpu_read(0xE000), 15 * 8);

        m.cpu_write(0x6000, 0x01);
        assert_eq!(m.cpu_read(0x8000), (16 + 2) * 8);
        assert_eq!(m.cpu_read(0xE000), 31 * 8);
        assert_eq!(m.ppu_read(0x0000), 128);
    }

    #[test]
    fn rambo_full_chr_mode_and_third_prg_bank() {
        let mut m = board(64);
        m.cpu_write(0x8000, 0x28);
        m.cpu_write(0x8001, 17);
        m.cpu_write(0x8000, 0x2F);
        m.cpu_write(0x8001, 3);
        assert_eq!(m.ppu_read(0x0400), 17);
        assert_eq!(m.cpu_read(0xC000), 24);
        assert_eq!(m.cpu_read(0xE000), 248);
    }

    #[test]
    fn rambo_cycle_mode_divides_by_four() {
        let mut m = board(64);
        m.cpu_write(0xC000, 1);
        m.cpu_write(0xC001, 0x01);
        m.cpu_write(0xE001, 0);
        // Reload to latch + 1, then count down to zero.
        m.cpu_cycle(8);
        assert!(!m.irq_pending());
        m.cpu_cycle(3);
        assert!(!m.irq_pending());
        m.cpu_cycle(1);
        assert!(m.irq_pending());

        // A12 rises are ignored while counting cycles.
        m.cpu_write(0xE000, 0);
        m.cpu_write(0xE001, 0);
        for line in 0..4 {
            scanline(&mut m, line);
        }
        assert!(!m.irq_pending());
    }

    #[test]
    fn tqrom_routes_bit_6_to_chr_ram() {
        let mut m = board(119);
        m.cpu_write(0x8000, 2);
        m.cpu_write(0x8001, 0x41);
        m.ppu_write(0x1000, 0x5A);
        assert_eq!(m.ppu_read(0x1000), 0x5A);

        m.cpu_write(0x8001, 0x05);
        assert_eq!(m.ppu_read(0x1000), 5);
        m.cpu_write(0x8001, 0x41);
        assert_eq!(m.ppu_read(0x1000), 0x5A);
    }

    #[test]
    fn scrambled_board_permutes_bank_index() {
        let mut m = board(182);
        // Index 6 maps to R2.
        m.cpu_write(0xA000, 6);
        m.cpu_write(0xC000, 12);
        assert_eq!(m.ppu_read(0x1000), 12);
        m.cpu_write(0x8001, 0x01);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }
}

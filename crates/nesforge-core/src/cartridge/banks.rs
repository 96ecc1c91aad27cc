//! Banked view of the cartridge address space.
//!
//! Every board shares the same translation layer: the CPU sees `$8000-$FFFF`
//! as 32 windows of 1 KiB, the PPU sees `$0000-$1FFF` as 8 windows of 1 KiB,
//! and each window holds a byte offset into the PRG/CHR backing array. Boards
//! only ever repoint windows; reads never branch on the board type.
//!
//! | Area | Address range | Resolution                                     |
//! |------|---------------|------------------------------------------------|
//! | CPU  | `$6000-$7FFF` | PRG RAM when present, open bus otherwise       |
//! | CPU  | `$8000-$FFFF` | `prg[prg_map[(addr & 0x7FFF) >> 10] + low10]`  |
//! | PPU  | `$0000-$1FFF` | `chr[chr_map[addr >> 10] + low10]`             |
//! | PPU  | `$2000-$3EFF` | `nametables[nt_map[(addr & 0xC00) >> 10]]`     |
//!
//! Bank numbers are wrapped by masking with `len - 1`, which relies on the
//! power-of-two sizes enforced by [`CartridgeImage::new`].

use std::sync::Arc;

use crate::{
    cartridge::{chr_storage::ChrStorage, header::Mirroring, image::CartridgeImage},
    mem_block::ppu::Nametable,
    memory::{cpu as cpu_mem, ppu as ppu_mem},
};

/// Size of one bank-table window.
pub const WINDOW_SIZE: usize = 1024;
const WINDOW_MASK: u16 = (WINDOW_SIZE as u16) - 1;
/// 1 KiB windows covering `$8000-$FFFF`.
pub const PRG_WINDOWS: usize = 32;
/// 1 KiB windows covering `$0000-$1FFF` on the PPU bus.
pub const CHR_WINDOWS: usize = 8;

/// Power-on fill byte of each physical nametable buffer.
const NAMETABLE_FILL: [u8; ppu_mem::NAMETABLE_COUNT] = [0xA0, 0xB0, 0xC0, 0xD0];

#[derive(Debug, Clone)]
pub struct BankedAddressSpace {
    prg: Arc<[u8]>,
    chr: ChrStorage,
    prg_ram: Option<Box<[u8]>>,
    prg_map: [usize; PRG_WINDOWS],
    chr_map: [usize; CHR_WINDOWS],
    nametables: [Nametable; ppu_mem::NAMETABLE_COUNT],
    nt_map: [usize; 4],
    mirroring: Mirroring,
}

impl BankedAddressSpace {
    /// Bank tables in their identity layout with the header's mirroring and
    /// 8 KiB of PRG RAM when the image has any.
    pub fn new(image: &CartridgeImage) -> Self {
        let ram_len = if image.has_prg_ram() {
            cpu_mem::PRG_RAM_SIZE
        } else {
            0
        };
        Self::with_prg_ram_len(image, ram_len)
    }

    /// Like [`BankedAddressSpace::new`] with an explicit PRG RAM size; `0`
    /// leaves `$6000-$7FFF` unmapped.
    pub fn with_prg_ram_len(image: &CartridgeImage, ram_len: usize) -> Self {
        let prg = Arc::clone(image.prg());
        let chr = ChrStorage::from_image(image.chr());
        let prg_ram = (ram_len > 0).then(|| vec![0u8; ram_len].into_boxed_slice());

        let prg_map = std::array::from_fn(|window| (window * WINDOW_SIZE) & (prg.len() - 1));
        let chr_len = chr.len();
        let chr_map = std::array::from_fn(|window| (window * WINDOW_SIZE) & (chr_len - 1));
        let nametables = NAMETABLE_FILL.map(Nametable::filled);
        let mirroring = image.header().mirroring;

        Self {
            prg,
            chr,
            prg_ram,
            prg_map,
            chr_map,
            nametables,
            nt_map: mirroring.slots(),
            mirroring,
        }
    }

    pub fn prg_len(&self) -> usize {
        self.prg.len()
    }

    pub fn chr_len(&self) -> usize {
        self.chr.len()
    }

    /// Number of `size_kb` banks in PRG (at least one).
    pub fn prg_bank_count(&self, size_kb: usize) -> usize {
        (self.prg.len() / (size_kb * WINDOW_SIZE)).max(1)
    }

    /// Number of `size_kb` banks in CHR (at least one).
    pub fn chr_bank_count(&self, size_kb: usize) -> usize {
        (self.chr.len() / (size_kb * WINDOW_SIZE)).max(1)
    }

    /// Index of the final `size_kb` PRG bank.
    pub fn last_prg_bank(&self, size_kb: usize) -> usize {
        self.prg_bank_count(size_kb) - 1
    }

    // PRG banking ----------------------------------------------------------

    /// Point `size_kb` consecutive windows starting at `slot * size_kb` at
    /// bank `bank` of that size.
    fn map_prg(&mut self, size_kb: usize, slot: usize, bank: usize) {
        let mask = self.prg.len() - 1;
        for page in 0..size_kb {
            let window = slot * size_kb + page;
            if let Some(entry) = self.prg_map.get_mut(window) {
                *entry = ((bank * size_kb + page) * WINDOW_SIZE) & mask;
            }
        }
    }

    pub fn map_prg_32k(&mut self, bank: usize) {
        self.map_prg(32, 0, bank);
    }

    /// `slot` 0 is `$8000`, 1 is `$C000`.
    pub fn map_prg_16k(&mut self, slot: usize, bank: usize) {
        self.map_prg(16, slot, bank);
    }

    /// `slot` 0..=3 selects `$8000/$A000/$C000/$E000`.
    pub fn map_prg_8k(&mut self, slot: usize, bank: usize) {
        self.map_prg(8, slot, bank);
    }

    pub fn map_prg_4k(&mut self, slot: usize, bank: usize) {
        self.map_prg(4, slot, bank);
    }

    // CHR banking ----------------------------------------------------------

    fn map_chr(&mut self, size_kb: usize, slot: usize, bank: usize) {
        let mask = self.chr.len() - 1;
        for page in 0..size_kb {
            let window = slot * size_kb + page;
            if let Some(entry) = self.chr_map.get_mut(window) {
                *entry = ((bank * size_kb + page) * WINDOW_SIZE) & mask;
            }
        }
    }

    pub fn map_chr_8k(&mut self, bank: usize) {
        self.map_chr(8, 0, bank);
    }

    pub fn map_chr_4k(&mut self, slot: usize, bank: usize) {
        self.map_chr(4, slot, bank);
    }

    pub fn map_chr_2k(&mut self, slot: usize, bank: usize) {
        self.map_chr(2, slot, bank);
    }

    pub fn map_chr_1k(&mut self, slot: usize, bank: usize) {
        self.map_chr(1, slot, bank);
    }

    // Address resolution ---------------------------------------------------

    /// Offset into PRG for a CPU address in `$8000-$FFFF`.
    #[inline]
    pub fn prg_offset(&self, addr: u16) -> usize {
        let window = usize::from((addr & 0x7FFF) >> 10);
        self.prg_map[window] + usize::from(addr & WINDOW_MASK)
    }

    /// Offset into CHR for a PPU address in `$0000-$1FFF`.
    #[inline]
    pub fn chr_offset(&self, addr: u16) -> usize {
        let window = usize::from((addr & ppu_mem::PATTERN_TABLE_END) >> 10);
        self.chr_map[window] + usize::from(addr & WINDOW_MASK)
    }

    /// Byte from an absolute PRG offset, used by boards that map ROM outside
    /// the `$8000` window.
    pub fn prg_byte(&self, offset: usize) -> u8 {
        self.prg[offset & (self.prg.len() - 1)]
    }

    /// CPU read of the cartridge window (`$4020-$FFFF`).
    pub fn cart_read(&self, addr: u16) -> u8 {
        match addr {
            cpu_mem::PRG_ROM_START..=cpu_mem::CPU_ADDR_END => self.prg[self.prg_offset(addr)],
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => match &self.prg_ram {
                Some(ram) => ram[usize::from(addr - cpu_mem::PRG_RAM_START) & (ram.len() - 1)],
                None => open_bus(addr),
            },
            _ => open_bus(addr),
        }
    }

    /// CPU write to the cartridge window; only PRG RAM is affected here.
    pub fn cart_write(&mut self, addr: u16, value: u8) {
        if let (cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END, Some(ram)) =
            (addr, self.prg_ram.as_mut())
        {
            let len = ram.len();
            ram[usize::from(addr - cpu_mem::PRG_RAM_START) & (len - 1)] = value;
        }
    }

    /// PPU read of pattern or nametable space. Palette addresses never reach
    /// the cartridge; anything above `$2FFF` folds onto the nametables.
    pub fn ppu_read(&self, addr: u16) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr <= ppu_mem::PATTERN_TABLE_END {
            self.chr.read(self.chr_offset(addr))
        } else {
            let (table, offset) = self.nametable_index(addr);
            self.nametables[table][offset]
        }
    }

    /// PPU write; CHR writes only land when CHR is RAM.
    pub fn ppu_write(&mut self, addr: u16, value: u8) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr <= ppu_mem::PATTERN_TABLE_END {
            let offset = self.chr_offset(addr);
            self.chr.write(offset, value);
        } else {
            let (table, offset) = self.nametable_index(addr);
            self.nametables[table][offset] = value;
        }
    }

    #[inline]
    fn nametable_index(&self, addr: u16) -> (usize, usize) {
        let slot = usize::from((addr & 0x0C00) >> 10);
        (self.nt_map[slot], usize::from(addr & WINDOW_MASK))
    }

    // Mirroring ------------------------------------------------------------

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Repoint the four logical nametable slots; buffer contents are untouched.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
        self.nt_map = mirroring.slots();
    }

    /// Physical buffer behind each logical nametable slot.
    pub fn nt_map(&self) -> [usize; 4] {
        self.nt_map
    }

    // Backing storage ------------------------------------------------------

    pub fn nametable(&self, index: usize) -> &[u8] {
        &self.nametables[index]
    }

    pub fn nametable_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.nametables[index]
    }

    pub fn prg_ram(&self) -> Option<&[u8]> {
        self.prg_ram.as_deref()
    }

    pub fn prg_ram_mut(&mut self) -> Option<&mut [u8]> {
        self.prg_ram.as_deref_mut()
    }

    pub fn chr_ram(&self) -> Option<&[u8]> {
        self.chr.as_ram()
    }

    pub fn chr_ram_mut(&mut self) -> Option<&mut [u8]> {
        self.chr.as_ram_mut()
    }

    pub fn prg_map(&self) -> &[usize; PRG_WINDOWS] {
        &self.prg_map
    }

    pub fn chr_map(&self) -> &[usize; CHR_WINDOWS] {
        &self.chr_map
    }
}

/// Value floating on the CPU data bus when nothing drives it: the high byte
/// of the address, which is the last byte the CPU fetched for the operand.
#[inline]
pub fn open_bus(addr: u16) -> u8 {
    (addr >> 8) as u8
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::cartridge::header::Header;

    fn image(prg_kb: usize, chr_kb: usize) -> CartridgeImage {
        let prg = (0..prg_kb * WINDOW_SIZE)
            .map(|i| (i / WINDOW_SIZE) as u8)
            .collect();
        let chr = (0..chr_kb * WINDOW_SIZE)
            .map(|i| (i / WINDOW_SIZE) as u8)
            .collect();
        CartridgeImage::new(Header::new(0), prg, chr).unwrap()
    }

    #[test]
    fn identity_layout_mirrors_small_prg() {
        let banks = BankedAddressSpace::new(&image(16, 8));
        // 16 KiB PRG shows up twice.
        assert_eq!(banks.cart_read(0x8000), 0);
        assert_eq!(banks.cart_read(0xC000), 0);
        assert_eq!(banks.cart_read(0xFC00), 15);
        assert_eq!(banks.ppu_read(0x1C00), 7);
    }

    #[test]
    fn nametables_power_on_fill() {
        let mut banks = BankedAddressSpace::new(&image(16, 8));
        banks.set_mirroring(Mirroring::FourScreen);
        assert_eq!(banks.ppu_read(0x2000), 0xA0);
        assert_eq!(banks.ppu_read(0x2400), 0xB0);
        assert_eq!(banks.ppu_read(0x2800), 0xC0);
        assert_eq!(banks.ppu_read(0x2C00), 0xD0);
    }

    #[test]
    fn mirroring_alias_tables() {
        let mut banks = BankedAddressSpace::new(&image(16, 8));
        for (mode, expected) in [
            (Mirroring::Horizontal, [0, 0, 1, 1]),
            (Mirroring::Vertical, [0, 1, 0, 1]),
            (Mirroring::SingleScreenLower, [0, 0, 0, 0]),
            (Mirroring::SingleScreenUpper, [1, 1, 1, 1]),
            (Mirroring::FourScreen, [0, 1, 2, 3]),
        ] {
            banks.set_mirroring(mode);
            assert_eq!(banks.nt_map(), expected, "{mode:?}");
        }
    }

    #[test]
    fn switching_mirroring_preserves_contents() {
        let mut banks = BankedAddressSpace::new(&image(16, 8));
        banks.set_mirroring(Mirroring::Vertical);
        banks.ppu_write(0x2005, 0x11);
        banks.ppu_write(0x2405, 0x22);

        banks.set_mirroring(Mirroring::SingleScreenUpper);
        assert_eq!(banks.ppu_read(0x2005), 0x22);

        banks.set_mirroring(Mirroring::Vertical);
        assert_eq!(banks.ppu_read(0x2005), 0x11);
        assert_eq!(banks.ppu_read(0x2805), 0x11);
        assert_eq!(banks.ppu_read(0x2C05), 0x22);
        // $3000-$3EFF mirrors $2000-$2EFF.
        assert_eq!(banks.ppu_read(0x3005), 0x11);
    }

    #[test]
    fn prg_ram_and_open_bus() {
        let mut banks = BankedAddressSpace::new(&image(16, 8));
        banks.cart_write(0x6123, 0x5A);
        assert_eq!(banks.cart_read(0x6123), 0x5A);
        assert_eq!(banks.cart_read(0x5123), 0x51);

        let header = Header::new(0).with_prg_ram(false);
        let image = CartridgeImage::new(header, vec![0; 0x4000], vec![0; 0x2000]).unwrap();
        let mut banks = BankedAddressSpace::new(&image);
        banks.cart_write(0x6123, 0x5A);
        assert_eq!(banks.cart_read(0x6123), 0x61);
        assert!(banks.prg_ram().is_none());
    }

    #[test]
    fn chr_rom_is_read_only() {
        let mut banks = BankedAddressSpace::new(&image(16, 8));
        banks.ppu_write(0x0000, 0xEE);
        assert_eq!(banks.ppu_read(0x0000), 0);
        assert!(banks.chr_ram().is_none());
    }

    #[test]
    fn bank_helpers_place_windows() {
        let mut banks = BankedAddressSpace::new(&image(128, 64));
        banks.map_prg_16k(0, 3);
        banks.map_prg_8k(3, 1);
        assert_eq!(banks.cart_read(0x8000), 48);
        assert_eq!(banks.cart_read(0xBC00), 63);
        assert_eq!(banks.cart_read(0xE000), 8);

        banks.map_chr_2k(1, 5);
        banks.map_chr_1k(7, 60);
        assert_eq!(banks.ppu_read(0x0800), 10);
        assert_eq!(banks.ppu_read(0x0C00), 11);
        assert_eq!(banks.ppu_read(0x1C00), 60);

        // Out-of-range banks wrap.
        banks.map_prg_32k(5);
        assert_eq!(banks.cart_read(0x8000), 32);
    }

    proptest! {
        #[test]
        fn prg_offsets_stay_in_bounds(
            size_pow in 13u32..20,
            size_kb in prop::sample::select(vec![4usize, 8, 16, 32]),
            slot in 0usize..8,
            bank in 0usize..1024,
            addr in 0x8000u16..=0xFFFF,
        ) {
            let prg = vec![0u8; 1 << size_pow];
            let image = CartridgeImage::new(Header::new(0), prg, vec![]).unwrap();
            let mut banks = BankedAddressSpace::new(&image);
            banks.map_prg(size_kb, slot % (32 / size_kb), bank);

            let len = banks.prg_len();
            for &offset in banks.prg_map() {
                prop_assert!(offset < len);
                prop_assert_eq!(offset & (len - 1), offset);
            }
            prop_assert!(banks.prg_offset(addr) < len);
        }

        #[test]
        fn chr_offsets_stay_in_bounds(
            size_pow in 13u32..18,
            size_kb in prop::sample::select(vec![1usize, 2, 4, 8]),
            slot in 0usize..8,
            bank in 0usize..1024,
            addr in 0u16..0x2000,
        ) {
            let chr = vec![0u8; 1 << size_pow];
            let image = CartridgeImage::new(Header::new(0), vec![0; 0x4000], chr).unwrap();
            let mut banks = BankedAddressSpace::new(&image);
            banks.map_chr(size_kb, slot % (8 / size_kb), bank);

            let len = banks.chr_len();
            for &offset in banks.chr_map() {
                prop_assert!(offset < len);
                prop_assert_eq!(offset & (len - 1), offset);
            }
            prop_assert!(banks.chr_offset(addr) < len);
        }
    }
}

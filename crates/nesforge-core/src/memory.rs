//! Shared definitions for the console memory map.
//!
//! Address constants live here so that the bus views, the banked address
//! space and the individual boards all decode against the same layout.

/// CPU memory map details.
pub mod cpu {
    /// Last mirrored internal RAM address visible to the CPU (`$1FFF`).
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;
    /// Size of the CPU internal RAM block (2 KiB mirrored through `$1FFF`).
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    /// Mask applied to mirror CPU RAM accesses within `$0000-$1FFF`.
    pub const INTERNAL_RAM_MASK: u16 = (INTERNAL_RAM_SIZE as u16) - 1;

    /// First CPU address mapped to the PPU register mirror.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    /// Last CPU address mirrored to the PPU register set.
    pub const PPU_REGISTER_END: u16 = 0x3FFF;

    /// First CPU-visible APU / I/O register.
    pub const APU_REGISTER_BASE: u16 = 0x4000;
    /// End of the APU / I/O window (including the test-mode registers).
    pub const APU_IO_END: u16 = 0x401F;

    /// First address handled by the cartridge expansion / PRG window.
    pub const CARTRIDGE_SPACE_BASE: u16 = 0x4020;
    /// PRG RAM window start address (`$6000`).
    pub const PRG_RAM_START: u16 = 0x6000;
    /// PRG RAM window end address (inclusive).
    pub const PRG_RAM_END: u16 = 0x7FFF;
    /// Bytes of cartridge PRG RAM behind `$6000-$7FFF`.
    pub const PRG_RAM_SIZE: usize = 0x2000;
    /// PRG ROM window start address (`$8000`).
    pub const PRG_ROM_START: u16 = 0x8000;
    /// Final CPU-visible address (`$FFFF`).
    pub const CPU_ADDR_END: u16 = 0xFFFF;
}

/// PPU register layout and VRAM mirror rules.
pub mod ppu {
    /// Mask for decoding register mirrors (`addr & 0x0007`).
    pub const REGISTER_SELECT_MASK: u16 = 0x0007;
    /// Number of CPU-visible PPU registers.
    pub const REGISTER_COUNT: usize = 8;

    /// Address mask applied to every PPU bus access (14-bit bus).
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

    /// End of the pattern table space (`$0000-$1FFF`).
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;
    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Number of physical nametable buffers a cartridge can expose.
    pub const NAMETABLE_COUNT: usize = 4;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette RAM byte count (32 bytes mirrored every 32 bytes).
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// Primary Object Attribute Memory (OAM) byte count.
    pub const OAM_RAM_SIZE: usize = 0x100;

    /// PPU address line A12; MMC3-style counters clock on its rising edge.
    pub const A12_MASK: u16 = 0x1000;

    /// CPU-visible PPU register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` - PPUCTRL
        Control = 0x2000,
        /// `$2001` - PPUMASK
        Mask = 0x2001,
        /// `$2002` - PPUSTATUS
        Status = 0x2002,
        /// `$2003` - OAMADDR
        OamAddr = 0x2003,
        /// `$2004` - OAMDATA
        OamData = 0x2004,
        /// `$2005` - PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` - PPUADDR
        Addr = 0x2006,
        /// `$2007` - PPUDATA
        Data = 0x2007,
    }

    impl Register {
        /// Raw address backing the register.
        pub const fn addr(self) -> u16 {
            self as u16
        }

        /// Index of the register within the eight-entry block.
        pub const fn index(self) -> usize {
            (self as u16 & REGISTER_SELECT_MASK) as usize
        }

        /// Resolves the canonical register for a CPU address in `$2000-$3FFF`.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}

/// Disk-system expansion audio register window.
pub mod fds {
    /// Timer IRQ reload value, low byte.
    pub const TIMER_RELOAD_LOW: u16 = 0x4020;
    /// Timer IRQ reload value, high byte.
    pub const TIMER_RELOAD_HIGH: u16 = 0x4021;
    /// Timer IRQ control: bit 0 repeat, bit 1 enable.
    pub const TIMER_CONTROL: u16 = 0x4022;
    /// Drive control; bit 3 selects horizontal mirroring.
    pub const DISK_CONTROL: u16 = 0x4025;
    /// Disk status; bit 0 reports a timer interrupt.
    pub const DISK_STATUS: u16 = 0x4030;
    /// I/O enable register; bit 0 gates every other audio register.
    pub const IO_ENABLE: u16 = 0x4023;
    /// Start of the 64-byte wavetable RAM window.
    pub const WAVE_RAM_START: u16 = 0x4040;
    /// End (inclusive) of the wavetable RAM window.
    pub const WAVE_RAM_END: u16 = 0x407F;
    /// Volume envelope control.
    pub const VOLUME_ENVELOPE: u16 = 0x4080;
    /// Wave frequency, low 8 bits.
    pub const FREQ_LOW: u16 = 0x4082;
    /// Wave frequency high nibble, halt/reset and envelope disable.
    pub const FREQ_HIGH: u16 = 0x4083;
    /// Modulation envelope control.
    pub const MOD_ENVELOPE: u16 = 0x4084;
    /// Modulation counter (7-bit signed).
    pub const MOD_COUNTER: u16 = 0x4085;
    /// Modulation frequency, low 8 bits.
    pub const MOD_FREQ_LOW: u16 = 0x4086;
    /// Modulation frequency high nibble and modulation disable.
    pub const MOD_FREQ_HIGH: u16 = 0x4087;
    /// Modulation table write port.
    pub const MOD_TABLE_WRITE: u16 = 0x4088;
    /// Wave write-enable and master volume.
    pub const MASTER_VOLUME: u16 = 0x4089;
    /// Envelope clock multiplier.
    pub const ENVELOPE_SPEED: u16 = 0x408A;
    /// Volume gain readback.
    pub const VOLUME_GAIN_READ: u16 = 0x4090;
    /// Modulation gain readback.
    pub const MOD_GAIN_READ: u16 = 0x4092;
}

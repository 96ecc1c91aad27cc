use bitflags::bitflags;

bitflags! {
    /// Processor status register (P).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N V _ B D I Z C
    /// ```
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        const CARRY     = 0b0000_0001;
        const ZERO      = 0b0000_0010;
        /// When set, maskable interrupts (IRQ) are ignored.
        const INTERRUPT = 0b0000_0100;
        /// Present for 6502 compatibility; the console CPU has no decimal mode.
        const DECIMAL   = 0b0000_1000;
        const BREAK     = 0b0001_0000;
        /// Reads back as 1.
        const UNUSED    = 0b0010_0000;
        const OVERFLOW  = 0b0100_0000;
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Default for Status {
    /// Power-up value `$24`: interrupts disabled, unused bit set.
    fn default() -> Self {
        Status::INTERRUPT | Status::UNUSED
    }
}

bitflags! {
    /// Sources currently asserting the shared /IRQ line.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IrqSource: u8 {
        /// Cartridge mapper counter (scanline, A12 or cycle based).
        const MAPPER        = 0b0000_0001;
        /// APU frame counter.
        const FRAME_COUNTER = 0b0000_0010;
        /// APU DMC channel.
        const DMC           = 0b0000_0100;
        /// Expansion hardware such as the disk-system timer.
        const EXTERNAL      = 0b0000_1000;
    }
}

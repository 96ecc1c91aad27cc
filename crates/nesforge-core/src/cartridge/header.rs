//! Header-derived cartridge metadata.
//!
//! Splitting a ROM file into header, PRG and CHR sections happens outside
//! the core; what arrives here is the decoded [`Header`] describing which
//! board to build and how it is wired.

/// Layout mirroring type for the PPU nametables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mirroring {
    /// Two horizontal nametables that mirror vertically (slots 0,0,1,1).
    #[default]
    Horizontal,
    /// Two vertical nametables that mirror horizontally (slots 0,1,0,1).
    Vertical,
    /// Single-screen mirroring using the first physical nametable.
    SingleScreenLower,
    /// Single-screen mirroring using the second physical nametable.
    SingleScreenUpper,
    /// Cartridge supplies its own four nametables.
    FourScreen,
}

impl Mirroring {
    /// Physical buffer aliased by each of the four logical nametable slots.
    pub const fn slots(self) -> [usize; 4] {
        match self {
            Mirroring::Horizontal => [0, 0, 1, 1],
            Mirroring::Vertical => [0, 1, 0, 1],
            Mirroring::SingleScreenLower => [0, 0, 0, 0],
            Mirroring::SingleScreenUpper => [1, 1, 1, 1],
            Mirroring::FourScreen => [0, 1, 2, 3],
        }
    }

    /// Stable numeric code used by the save-state layout.
    pub(crate) fn code(self) -> u8 {
        match self {
            Mirroring::Horizontal => 0,
            Mirroring::Vertical => 1,
            Mirroring::SingleScreenLower => 2,
            Mirroring::SingleScreenUpper => 3,
            Mirroring::FourScreen => 4,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Mirroring::Horizontal),
            1 => Some(Mirroring::Vertical),
            2 => Some(Mirroring::SingleScreenLower),
            3 => Some(Mirroring::SingleScreenUpper),
            4 => Some(Mirroring::FourScreen),
            _ => None,
        }
    }

    /// Decode the common one-bit "0 = vertical, 1 = horizontal" register layout.
    pub(crate) fn from_vh_bit(horizontal: bool) -> Self {
        if horizontal {
            Mirroring::Horizontal
        } else {
            Mirroring::Vertical
        }
    }

    /// Decode the common one-bit single-screen select.
    pub(crate) fn single_screen(upper: bool) -> Self {
        if upper {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        }
    }
}

/// Video timing hints embedded in the header.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TvSystem {
    /// NTSC (60Hz) timing.
    #[default]
    Ntsc,
    /// PAL (50Hz) timing.
    Pal,
    /// Region free: runs on either timing.
    Dual,
    /// Hybrid timing used by some Famiclones.
    Dendy,
}

/// Decoded cartridge header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Mapper number.
    pub mapper: u16,
    /// NES 2.0 submapper; `0` when unspecified.
    pub submapper: u8,
    /// Nametable arrangement soldered on the board.
    pub mirroring: Mirroring,
    /// Whether PRG RAM is battery backed.
    pub battery_backed_ram: bool,
    /// Whether the board carries PRG RAM at `$6000-$7FFF`.
    pub prg_ram_present: bool,
    /// Timing hint.
    pub tv_system: TvSystem,
}

impl Header {
    /// Header with the defaults most boards use: horizontal mirroring, PRG
    /// RAM present, no battery, NTSC.
    pub fn new(mapper: u16) -> Self {
        Self {
            mapper,
            submapper: 0,
            mirroring: Mirroring::Horizontal,
            battery_backed_ram: false,
            prg_ram_present: true,
            tv_system: TvSystem::Ntsc,
        }
    }

    pub fn with_submapper(mut self, submapper: u8) -> Self {
        self.submapper = submapper;
        self
    }

    pub fn with_mirroring(mut self, mirroring: Mirroring) -> Self {
        self.mirroring = mirroring;
        self
    }

    pub fn with_battery(mut self, battery: bool) -> Self {
        self.battery_backed_ram = battery;
        self
    }

    pub fn with_prg_ram(mut self, present: bool) -> Self {
        self.prg_ram_present = present;
        self
    }

    pub fn with_tv_system(mut self, tv_system: TvSystem) -> Self {
        self.tv_system = tv_system;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirroring_codes_round_trip() {
        for mode in [
            Mirroring::Horizontal,
            Mirroring::Vertical,
            Mirroring::SingleScreenLower,
            Mirroring::SingleScreenUpper,
            Mirroring::FourScreen,
        ] {
            assert_eq!(Mirroring::from_code(mode.code()), Some(mode));
        }
        assert_eq!(Mirroring::from_code(5), None);
    }
}

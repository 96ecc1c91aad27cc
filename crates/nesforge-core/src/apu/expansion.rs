use core::fmt::Debug;

use crate::state::SaveState;

/// Sound generator carried on the cartridge and mixed after the console's
/// own channels.
///
/// The scheduler clocks the chip by whole CPU cycles once per quantum and
/// reads one sample afterwards. Register access arrives through the owning
/// mapper, which decodes the chip's address window. Implementations persist
/// their full register file through [`SaveState`].
pub trait ExpansionAudio: SaveState + Debug + Send {
    /// Advance the chip by `cycles` CPU cycles.
    fn clock(&mut self, cycles: u32);

    /// Current output level after the chip's own filtering.
    fn output(&self) -> i32;

    fn write_register(&mut self, addr: u16, value: u8);

    /// Readable registers; `None` leaves the bus to the caller.
    fn read_register(&self, addr: u16) -> Option<u8>;
}

//! Cartridge expansion audio.
//!
//! The console's own APU channels are not modelled; only sound chips that
//! ride on the cartridge are, behind the [`ExpansionAudio`] trait.

pub mod expansion;
pub mod fds;

pub use expansion::ExpansionAudio;
pub use fds::FdsAudio;

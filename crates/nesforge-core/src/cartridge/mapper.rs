//! Mapper trait, optional board capabilities and the id registry.
//!
//! Every board owns a [`BankedAddressSpace`] and only overrides what its
//! hardware changes: which writes reprogram the bank tables, and which of the
//! optional capabilities (IRQ sources, extra persisted state, expansion
//! audio) it carries. The [`Mapper`] hook methods forward to a capability
//! when the board exposes one, so the bus and the scheduler never need to
//! know which board is plugged in.

use std::{borrow::Cow, fmt::Debug};

use dyn_clone::DynClone;

use crate::{
    apu::expansion::ExpansionAudio,
    cartridge::{banks::BankedAddressSpace, header::Mirroring, image::CartridgeImage},
    error::Error,
    state::SaveState,
};

pub mod address_latch;
pub mod discrete;
pub mod mapper1;
pub mod mapper20;
pub mod mapper206;
pub mod mapper21;
pub mod mapper246;
pub mod mapper33;
pub mod mapper34;
pub mod mapper4;
pub mod mapper65;
pub mod mapper69;
pub mod mapper73;
pub mod mapper75;
pub mod mapper9;

pub use address_latch::{AddressLatch, AddressLatchBoard};
pub use discrete::{DiscreteBoard, DiscreteLatch};
pub use mapper1::Mapper1;
pub use mapper4::Mapper4;
pub use mapper9::Mapper9;
pub use mapper20::Mapper20;
pub use mapper21::Mapper21;
pub use mapper33::Mapper33;
pub use mapper34::Mapper34;
pub use mapper65::Mapper65;
pub use mapper69::Mapper69;
pub use mapper73::Mapper73;
pub use mapper75::Mapper75;
pub use mapper206::Mapper206;
pub use mapper246::Mapper246;

/// Counter clocked once per PPU scanline.
pub trait ScanlineIrq {
    fn on_scanline(&mut self, scanline: u16);
}

/// Counter clocked by debounced rises of PPU address line A12.
pub trait A12Irq {
    /// `frame_dot` is the PPU dot within the frame when `addr` was driven.
    fn on_ppu_address(&mut self, addr: u16, frame_dot: u32);
}

/// Counter clocked by CPU cycles.
pub trait CycleIrq {
    fn on_cpu_cycles(&mut self, cycles: u32);
}

/// Board registers that fit one opaque 32-bit value in a save state.
///
/// `load_extra` must leave the bank tables consistent with the restored
/// registers.
pub trait ExtraState {
    fn save_extra(&self) -> u32;

    fn load_extra(&mut self, value: u32);
}

pub trait Mapper: DynClone + Debug + Send {
    fn mapper_id(&self) -> u16;

    fn name(&self) -> Cow<'static, str>;

    fn banks(&self) -> &BankedAddressSpace;

    fn banks_mut(&mut self) -> &mut BankedAddressSpace;

    /// CPU read in `$4020-$FFFF` without side effects.
    fn cpu_read(&self, addr: u16) -> u8 {
        self.banks().cart_read(addr)
    }

    /// CPU read issued by the running program. Boards whose registers react
    /// to being read (status flags that clear on read) override this.
    fn cpu_mem_read(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    /// CPU write in `$4020-$FFFF`; boards decode their registers here.
    fn cpu_write(&mut self, addr: u16, value: u8) {
        self.banks_mut().cart_write(addr, value);
    }

    /// PPU read in `$0000-$3EFF`. Takes `&mut self` because some boards latch
    /// on pattern fetches.
    fn ppu_read(&mut self, addr: u16) -> u8 {
        self.banks().ppu_read(addr)
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        self.banks_mut().ppu_write(addr, value);
    }

    fn notify_scanline(&mut self, scanline: u16) {
        if let Some(irq) = self.scanline_irq() {
            irq.on_scanline(scanline);
        }
    }

    /// Observe the address the PPU drives onto its bus.
    fn check_a12(&mut self, addr: u16, frame_dot: u32) {
        if let Some(irq) = self.a12_irq() {
            irq.on_ppu_address(addr, frame_dot);
        }
    }

    fn cpu_cycle(&mut self, cycles: u32) {
        if let Some(irq) = self.cycle_irq() {
            irq.on_cpu_cycles(cycles);
        }
    }

    /// Level of the board's /IRQ output.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Warm reset hook.
    fn reset(&mut self) {}

    fn mirroring(&self) -> Mirroring {
        self.banks().mirroring()
    }

    fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.banks_mut().set_mirroring(mirroring);
    }

    fn scanline_irq(&mut self) -> Option<&mut dyn ScanlineIrq> {
        None
    }

    fn a12_irq(&mut self) -> Option<&mut dyn A12Irq> {
        None
    }

    fn cycle_irq(&mut self) -> Option<&mut dyn CycleIrq> {
        None
    }

    fn extra_state(&self) -> Option<&dyn ExtraState> {
        None
    }

    fn extra_state_mut(&mut self) -> Option<&mut dyn ExtraState> {
        None
    }

    /// Full register file of boards whose state does not fit
    /// [`ExtraState`]. Restoring it must leave the bank tables consistent.
    fn board_state(&self) -> Option<&dyn SaveState> {
        None
    }

    fn board_state_mut(&mut self) -> Option<&mut dyn SaveState> {
        None
    }

    fn expansion_audio(&self) -> Option<&dyn ExpansionAudio> {
        None
    }

    fn expansion_audio_mut(&mut self) -> Option<&mut dyn ExpansionAudio> {
        None
    }
}

dyn_clone::clone_trait_object!(Mapper);

/// Build the board named by the image header.
///
/// Unknown ids abort the load; there is no fallback board.
pub fn create_mapper(image: &CartridgeImage) -> Result<Box<dyn Mapper>, Error> {
    let header = image.header();
    let id = header.mapper;

    let mapper: Box<dyn Mapper> = match id {
        1 => Box::new(Mapper1::new(image)),
        4 | 47 | 64 | 119 | 182 => Box::new(Mapper4::new(image)),
        9 | 10 => Box::new(Mapper9::new(image)),
        20 => Box::new(Mapper20::new(image)),
        21 | 22 | 23 | 25 => Box::new(Mapper21::new(image)),
        33 | 48 => Box::new(Mapper33::new(image)),
        34 => Box::new(Mapper34::new(image)),
        65 => Box::new(Mapper65::new(image)),
        69 => Box::new(Mapper69::new(image)),
        73 => Box::new(Mapper73::new(image)),
        75 => Box::new(Mapper75::new(image)),
        76 | 88 | 112 | 154 | 206 => Box::new(Mapper206::new(image)),
        246 => Box::new(Mapper246::new(image)),
        _ => {
            if let Some(board) = DiscreteBoard::from_id(id, header.submapper) {
                Box::new(DiscreteLatch::new(image, board))
            } else if let Some(board) = AddressLatchBoard::from_id(id) {
                Box::new(AddressLatch::new(image, board))
            } else {
                tracing::warn!(id, "unsupported mapper");
                return Err(Error::UnsupportedMapper { id });
            }
        }
    };

    tracing::debug!(
        id,
        name = %mapper.name(),
        prg_len = image.prg().len(),
        chr_ram = image.has_chr_ram(),
        "mapper selected"
    );
    Ok(mapper)
}

/// Images whose every 1 KiB page is filled with its own page number, so a
/// read reveals which bank a window points at.
#[cfg(test)]
pub(crate) fn paged_image(
    header: crate::cartridge::header::Header,
    prg_kb: usize,
    chr_kb: usize,
) -> CartridgeImage {
    let pages = |kb: usize| -> Vec<u8> { (0..kb * 1024).map(|i| (i / 1024) as u8).collect() };
    CartridgeImage::new(header, pages(prg_kb), pages(chr_kb)).unwrap()
}

//! Debounced PPU A12 edge detection for MMC3-style IRQ counters.
//!
//! MMC3 clocks its scanline counter when PPU address line A12 rises, but only
//! after the line has been low for a little while; the rapid toggles inside
//! one row of sprite fetches must count once. The watcher measures how long
//! A12 stayed low in PPU dots and reports a rise only past the threshold.

use crate::{
    memory::ppu::A12_MASK,
    state::{SaveState, StateError, StateReader, StateWriter},
};

/// Minimum number of PPU dots A12 must stay low before a rise counts.
pub const MIN_LOW_DOTS: u32 = 10;

/// Edge reported by [`A12Watcher::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A12Edge {
    None,
    /// Low to high after a long enough low phase.
    Rise,
    /// High to low.
    Fall,
}

#[derive(Debug, Clone)]
pub struct A12Watcher {
    high: bool,
    /// Frame dot at which A12 last went low.
    low_since: u32,
    /// Dots per frame, used to measure low phases spanning a frame wrap.
    frame_len: u32,
}

impl A12Watcher {
    pub const fn new(frame_len: u32) -> Self {
        Self {
            high: false,
            low_since: 0,
            frame_len,
        }
    }

    pub fn reset(&mut self) {
        self.high = false;
        self.low_since = 0;
    }

    /// Feed the address currently driven on the PPU bus at `frame_dot`.
    pub fn observe(&mut self, addr: u16, frame_dot: u32) -> A12Edge {
        let high = addr & A12_MASK != 0;
        match (self.high, high) {
            (false, true) => {
                self.high = true;
                if self.low_duration(frame_dot) >= MIN_LOW_DOTS {
                    A12Edge::Rise
                } else {
                    A12Edge::None
                }
            }
            (true, false) => {
                self.high = false;
                self.low_since = frame_dot;
                A12Edge::Fall
            }
            _ => A12Edge::None,
        }
    }

    fn low_duration(&self, now: u32) -> u32 {
        if now >= self.low_since {
            now - self.low_since
        } else {
            // Wrapped into the next frame.
            self.frame_len.saturating_sub(self.low_since) + now
        }
    }
}

impl SaveState for A12Watcher {
    fn save_state(&self, w: &mut StateWriter) {
        w.bool(self.high);
        w.u32(self.low_since);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.high = r.bool("a12 level")?;
        self.low_since = r.u32("a12 low since")?;
        Ok(())
    }
}

impl Default for A12Watcher {
    fn default() -> Self {
        // NTSC: 262 lines of 341 dots.
        Self::new(262 * 341)
    }
}

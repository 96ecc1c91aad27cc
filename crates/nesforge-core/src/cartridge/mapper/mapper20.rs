//! Mapper 20 (disk-system RAM adapter).
//!
//! The adapter turns the cartridge port into 32 KiB of program RAM, the
//! 8 KiB BIOS ROM, a 16-bit timer IRQ and the RP2C33 wavetable channel. Disk
//! transport is not modelled; only the registers that shape memory, IRQs and
//! audio are.
//!
//! | Area | Address range | Behaviour                                          | IRQ/Audio |
//! |------|---------------|----------------------------------------------------|-----------|
//! | CPU  | `$4020-$4021` | Timer reload low / high                            | Timer IRQ |
//! | CPU  | `$4022`       | Timer control (bit 0 repeat, bit 1 enable), ack    | Timer IRQ |
//! | CPU  | `$4023`       | I/O enable (bit 0)                                 | FDS audio |
//! | CPU  | `$4025`       | Mirroring (bit 3: 1 = horizontal)                  | None      |
//! | CPU  | `$4030`       | Status read (bit 0 timer IRQ, read acknowledges)   | Timer IRQ |
//! | CPU  | `$4040-$4092` | Wavetable channel registers                        | FDS audio |
//! | CPU  | `$6000-$DFFF` | 32 KiB program RAM                                 | None      |
//! | CPU  | `$E000-$FFFF` | BIOS ROM                                           | None      |

use std::borrow::Cow;

use crate::{
    apu::{expansion::ExpansionAudio, fds::FdsAudio},
    cartridge::{
        banks::{BankedAddressSpace, open_bus},
        header::Mirroring,
        image::CartridgeImage,
        mapper::{CycleIrq, Mapper},
    },
    memory::fds as fds_mem,
    state::{SaveState, StateError, StateReader, StateWriter},
};

pub const RAM_SIZE: usize = 32 * 1024;
const RAM_START: u16 = 0x6000;
const RAM_END: u16 = 0xDFFF;

#[derive(Debug, Clone, Default)]
struct DiskTimer {
    reload: u16,
    counter: u16,
    repeat: bool,
    enabled: bool,
    pending: bool,
}

impl DiskTimer {
    fn write_control(&mut self, value: u8, io_enabled: bool) {
        self.repeat = value & 0x01 != 0;
        self.enabled = value & 0x02 != 0 && io_enabled;
        if self.enabled {
            self.counter = self.reload;
        }
        self.pending = false;
    }

    fn clock(&mut self, cycles: u32) {
        for _ in 0..cycles {
            if !self.enabled {
                return;
            }
            if self.counter == 0 {
                self.pending = true;
                if self.repeat {
                    self.counter = self.reload;
                } else {
                    self.enabled = false;
                }
            } else {
                self.counter -= 1;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mapper20 {
    banks: BankedAddressSpace,
    io_enabled: bool,
    timer: DiskTimer,
    audio: FdsAudio,
}

impl Mapper20 {
    pub fn new(image: &CartridgeImage) -> Self {
        let mut banks = BankedAddressSpace::with_prg_ram_len(image, RAM_SIZE);
        banks.map_prg_8k(3, 0);
        Self {
            banks,
            io_enabled: true,
            timer: DiskTimer::default(),
            audio: FdsAudio::new(),
        }
    }

    fn ram_index(addr: u16) -> usize {
        usize::from(addr - RAM_START)
    }

    fn status(&self) -> u8 {
        u8::from(self.timer.pending) | 0x80
    }
}

impl Mapper for Mapper20 {
    fn cpu_read(&self, addr: u16) -> u8 {
        match addr {
            fds_mem::DISK_STATUS => self.status(),
            RAM_START..=RAM_END => match self.banks.prg_ram() {
                Some(ram) => ram[Self::ram_index(addr)],
                None => open_bus(addr),
            },
            0xE000..=0xFFFF => self.banks.cart_read(addr),
            _ => self
                .audio
                .read_register(addr)
                .unwrap_or_else(|| open_bus(addr)),
        }
    }

    fn cpu_mem_read(&mut self, addr: u16) -> u8 {
        let value = self.cpu_read(addr);
        if addr == fds_mem::DISK_STATUS {
            self.timer.pending = false;
        }
        value
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            fds_mem::TIMER_RELOAD_LOW => {
                self.timer.reload = (self.timer.reload & 0xFF00) | u16::from(value);
            }
            fds_mem::TIMER_RELOAD_HIGH => {
                self.timer.reload = (self.timer.reload & 0x00FF) | (u16::from(value) << 8);
            }
            fds_mem::TIMER_CONTROL => self.timer.write_control(value, self.io_enabled),
            fds_mem::IO_ENABLE => {
                self.io_enabled = value & 0x01 != 0;
                if !self.io_enabled {
                    self.timer.enabled = false;
                    self.timer.pending = false;
                }
                self.audio.write_register(addr, value);
            }
            fds_mem::DISK_CONTROL => {
                if self.io_enabled {
                    self.banks
                        .set_mirroring(Mirroring::from_vh_bit(value & 0x08 != 0));
                }
            }
            fds_mem::WAVE_RAM_START..=fds_mem::ENVELOPE_SPEED => {
                self.audio.write_register(addr, value);
            }
            RAM_START..=RAM_END => {
                let index = Self::ram_index(addr);
                if let Some(ram) = self.banks.prg_ram_mut() {
                    ram[index] = value;
                }
            }
            _ => {}
        }
    }

    fn mapper_id(&self) -> u16 {
        20
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("FDS RAM adapter")
    }

    fn banks(&self) -> &BankedAddressSpace {
        &self.banks
    }

    fn banks_mut(&mut self) -> &mut BankedAddressSpace {
        &mut self.banks
    }

    fn irq_pending(&self) -> bool {
        self.timer.pending
    }

    fn reset(&mut self) {
        self.timer.enabled = false;
        self.timer.pending = false;
    }

    fn cycle_irq(&mut self) -> Option<&mut dyn CycleIrq> {
        Some(self)
    }

    fn expansion_audio(&self) -> Option<&dyn ExpansionAudio> {
        Some(self)
    }

    fn expansion_audio_mut(&mut self) -> Option<&mut dyn ExpansionAudio> {
        Some(self)
    }
}

impl CycleIrq for Mapper20 {
    fn on_cpu_cycles(&mut self, cycles: u32) {
        self.timer.clock(cycles);
    }
}

/// The audio channel and the timer share the RP2C33, so they are saved as
/// one expansion record.
impl ExpansionAudio for Mapper20 {
    fn clock(&mut self, cycles: u32) {
        self.audio.clock(cycles);
    }

    fn output(&self) -> i32 {
        self.audio.output()
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        self.cpu_write(addr, value);
    }

    fn read_register(&self, addr: u16) -> Option<u8> {
        self.audio.read_register(addr)
    }
}

impl SaveState for Mapper20 {
    fn save_state(&self, w: &mut StateWriter) {
        self.audio.save_state(w);
        w.bool(self.io_enabled);
        w.u16(self.timer.reload);
        w.u16(self.timer.counter);
        w.bool(self.timer.repeat);
        w.bool(self.timer.enabled);
        w.bool(self.timer.pending);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.audio.load_state(r)?;
        self.io_enabled = r.bool("disk io enable")?;
        self.timer.reload = r.u16("disk timer reload")?;
        self.timer.counter = r.u16("disk timer counter")?;
        self.timer.repeat = r.bool("disk timer repeat")?;
        self.timer.enabled = r.bool("disk timer enable")?;
        self.timer.pending = r.bool("disk timer pending")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::paged_image};

    fn adapter() -> Mapper20 {
        Mapper20::new(&paged_image(Header::new(20), 8, 0))
    }

    #[test]
    fn ram_spans_6000_to_dfff() {
        let mut m = adapter();
        m.cpu_write(0x6000, 0x11);
        m.cpu_write(0xDFFF, 0x22);
        assert_eq!(m.cpu_read(0x6000), 0x11);
        assert_eq!(m.cpu_read(0xDFFF), 0x22);
        assert_eq!(m.banks().prg_ram().map(<[u8]>::len), Some(RAM_SIZE));
        // BIOS is read-only.
        m.cpu_write(0xE000, 0x33);
        assert_eq!(m.cpu_read(0xE000), 0);
        assert_eq!(m.cpu_read(0xFFFC), 7);
    }

    #[test]
    fn timer_fires_after_reload_cycles() {
        let mut m = adapter();
        m.cpu_write(0x4020, 10);
        m.cpu_write(0x4021, 0);
        m.cpu_write(0x4022, 0x03);

        m.cpu_cycle(10);
        assert!(!m.irq_pending());
        m.cpu_cycle(1);
        assert!(m.irq_pending());
        assert_eq!(m.cpu_read(0x4030) & 0x01, 0x01);

        // Writing control acknowledges; repeat mode keeps it running.
        m.cpu_write(0x4022, 0x03);
        m.cpu_cycle(11);
        assert!(m.irq_pending());
    }

    #[test]
    fn status_read_acknowledges_timer() {
        let mut m = adapter();
        m.cpu_write(0x4020, 4);
        m.cpu_write(0x4022, 0x02);
        m.cpu_cycle(5);
        assert!(m.irq_pending());

        // Side-effect-free reads leave the flag alone.
        assert_eq!(m.cpu_read(0x4030), 0x81);
        assert!(m.irq_pending());
        assert_eq!(m.cpu_mem_read(0x4030), 0x81);
        assert!(!m.irq_pending());
        assert_eq!(m.cpu_mem_read(0x4030), 0x80);
    }

    #[test]
    fn io_disable_stops_timer() {
        let mut m = adapter();
        m.cpu_write(0x4020, 5);
        m.cpu_write(0x4022, 0x02);
        m.cpu_write(0x4023, 0x00);
        m.cpu_cycle(100);
        assert!(!m.irq_pending());
    }

    #[test]
    fn mirroring_and_audio_window() {
        let mut m = adapter();
        m.cpu_write(0x4025, 0x08);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
        m.cpu_write(0x4025, 0x00);
        assert_eq!(m.mirroring(), Mirroring::Vertical);

        m.cpu_write(0x4080, 0x80 | 0x12);
        assert_eq!(m.cpu_read(0x4090), 0x12);
        assert!(m.expansion_audio().is_some());
    }

    #[test]
    fn expansion_record_carries_timer() {
        let mut m = adapter();
        m.cpu_write(0x4020, 50);
        m.cpu_write(0x4022, 0x03);
        m.cpu_cycle(20);

        let mut w = StateWriter::new();
        m.save_state(&mut w);
        let blob = w.finish().unwrap();
        let mut restored = adapter();
        restored
            .load_state(&mut StateReader::new(blob.as_bytes()))
            .unwrap();

        m.cpu_cycle(31);
        restored.cpu_cycle(31);
        assert!(m.irq_pending());
        assert!(restored.irq_pending());
    }
}

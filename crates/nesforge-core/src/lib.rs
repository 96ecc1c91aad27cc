//! Cartridge-side core of an NES-family console.
//!
//! [`Console`] owns the CPU register file, the PPU register layer, work RAM
//! and the inserted [`Cartridge`], and advances them in lockstep in quanta of
//! CPU cycles. Instruction decoding and pixel output live with the host; the
//! core covers the parts whose behaviour is dictated by the cartridge board:
//! bank switching, mapper IRQs, expansion audio and save states.

use crate::{
    audio::SampleBuffer,
    bus::{Bus, CpuBus},
    cartridge::{Cartridge, CartridgeImage},
    config::{ConsoleConfig, Region},
    cpu::{Cpu, IrqSource, RESET_VECTOR},
    error::Error,
    mem_block::cpu as cpu_ram,
    ppu::Ppu,
};

pub mod apu;
pub mod audio;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod cpu;
pub mod error;
pub mod mem_block;
pub mod memory;
pub mod ppu;
pub mod state;

pub use state::{SaveStateBlob, StateError};

#[derive(Debug, Clone)]
pub struct Console {
    cpu: Cpu,
    ppu: Ppu,
    ram: cpu_ram::Ram,
    cartridge: Cartridge,
    samples: SampleBuffer,
    config: ConsoleConfig,
    /// Effective timing after resolving `config.region` against the header.
    region: Region,
}

impl Console {
    /// Power on with `image` inserted. Fails when the board is not supported.
    pub fn new(image: CartridgeImage, config: ConsoleConfig) -> Result<Self, Error> {
        let region = Region::resolve(config.region, image.header().tv_system);
        let cartridge = Cartridge::new(image)?;

        let mut console = Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(region),
            ram: cpu_ram::Ram::new(),
            cartridge,
            samples: SampleBuffer::new(config.sample_buffer_len),
            config,
            region,
        };
        console.cpu.pc = console.reset_vector();

        tracing::info!(
            mapper = console.cartridge.header().mapper,
            name = %console.cartridge.mapper().name(),
            %region,
            "console powered on"
        );
        Ok(console)
    }

    fn reset_vector(&self) -> u16 {
        let lo = self.cartridge.cpu_read(RESET_VECTOR);
        let hi = self.cartridge.cpu_read(RESET_VECTOR + 1);
        u16::from_le_bytes([lo, hi])
    }

    /// Warm reset: CPU and PPU registers, mapper IRQ state. Memory survives.
    pub fn reset(&mut self) {
        self.cartridge.mapper_mut().reset();
        self.ppu.reset();
        let vector = self.reset_vector();
        self.cpu.reset(vector);
        tracing::debug!(pc = format_args!("{vector:#06X}"), "console reset");
    }

    /// Advance every clocked part by `cpu_cycles`.
    ///
    /// Order within one quantum: CPU-cycle IRQ counters, expansion audio (one
    /// sample appended per call), the PPU scanline timer, then the CPU's
    /// interrupt inputs.
    pub fn step(&mut self, cpu_cycles: u32) {
        self.cpu.add_cycles(cpu_cycles);

        let mapper = self.cartridge.mapper_mut();
        mapper.cpu_cycle(cpu_cycles);
        if let Some(audio) = mapper.expansion_audio_mut() {
            audio.clock(cpu_cycles);
            self.samples.push(audio.output());
        }
        self.ppu
            .advance(cpu_cycles * self.region.fifth_dots_per_cpu_cycle(), mapper);

        self.sync_interrupts();
    }

    /// Step just far enough for the PPU to finish its current scanline.
    /// Returns the number of CPU cycles run.
    pub fn run_scanline(&mut self) -> u32 {
        let remaining = Region::scanline_fifth_dots() - self.ppu.fifth_dots;
        let cycles = remaining.div_ceil(self.region.fifth_dots_per_cpu_cycle());
        self.step(cycles);
        cycles
    }

    /// Step until the PPU wraps back to scanline 0.
    pub fn run_frame(&mut self) {
        loop {
            self.run_scanline();
            if self.ppu.scanline() == 0 {
                break;
            }
        }
    }

    fn sync_interrupts(&mut self) {
        if self.ppu.take_nmi() {
            self.cpu.raise_nmi();
        }
        self.cpu
            .set_irq(IrqSource::MAPPER, self.cartridge.irq_pending());
    }

    fn cpu_bus(&mut self) -> CpuBus<'_> {
        CpuBus::new(&mut self.ram, &mut self.ppu, self.cartridge.mapper_mut())
    }

    /// CPU read through the console's address decoding.
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        let value = self.cpu_bus().read(addr);
        self.sync_interrupts();
        value
    }

    /// CPU write through the console's address decoding.
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        self.cpu_bus().write(addr, value);
        self.sync_interrupts();
    }

    /// Drain the expansion audio samples produced since the last call.
    pub fn take_samples(&mut self) -> Vec<i32> {
        self.samples.take()
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub(crate) fn set_region(&mut self, region: Region) {
        self.region = region;
        self.ppu.set_region(region);
    }
}

#[cfg(test)]
#[ctor::ctor]
unsafe fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{Header, mapper::paged_image};

    fn console(id: u16) -> Console {
        Console::new(paged_image(Header::new(id), 32, 8), ConsoleConfig::default()).unwrap()
    }

    #[test]
    fn power_on_reads_reset_vector() {
        let mut prg = vec![0u8; 0x8000];
        prg[0x7FFC] = 0x34;
        prg[0x7FFD] = 0x92;
        let image = CartridgeImage::new(Header::new(0), prg, Vec::new()).unwrap();
        let console = Console::new(image, ConsoleConfig::default()).unwrap();
        assert_eq!(console.cpu().pc, 0x9234);
    }

    #[test]
    fn unsupported_mapper_never_builds() {
        let image = CartridgeImage::new(Header::new(500), vec![0; 0x4000], Vec::new()).unwrap();
        let err = Console::new(image, ConsoleConfig::default()).unwrap_err();
        assert_eq!(err, Error::UnsupportedMapper { id: 500 });
    }

    #[test]
    fn scanlines_follow_region_timing() {
        let mut ntsc = console(0);
        let cycles: u32 = (0..3).map(|_| ntsc.run_scanline()).sum();
        // 341 dots / 3 per cycle = 113.67 cycles per line.
        assert_eq!(cycles, 341);
        assert_eq!(ntsc.ppu().scanline(), 3);

        let mut pal = Console::new(
            paged_image(Header::new(0), 32, 8),
            ConsoleConfig::default().with_region(Region::Pal),
        )
        .unwrap();
        let cycles: u32 = (0..5).map(|_| pal.run_scanline()).sum();
        // 341 dots / 3.2 per cycle = 106.5625 cycles per line.
        assert_eq!(cycles, 533);
        assert_eq!(pal.ppu().scanline(), 5);
    }

    #[test]
    fn vblank_nmi_reaches_the_cpu() {
        let mut c = console(0);
        c.cpu_write(0x2000, 0x80);
        for _ in 0..240 {
            c.run_scanline();
        }
        assert!(!c.cpu().nmi_pending());
        c.run_scanline();
        assert!(c.cpu().nmi_pending());
    }

    #[test]
    fn mapper_irq_drives_cpu_line() {
        // FME-7 counter with IRQ and counting enabled.
        let mut c = console(69);
        c.cpu_write(0x8000, 0x0E);
        c.cpu_write(0xA000, 0x10);
        c.cpu_write(0x8000, 0x0F);
        c.cpu_write(0xA000, 0x00);
        c.cpu_write(0x8000, 0x0D);
        c.cpu_write(0xA000, 0x81);
        c.step(16);
        assert!(!c.cpu().irq_lines().contains(IrqSource::MAPPER));
        c.step(1);
        assert!(c.cpu().irq_lines().contains(IrqSource::MAPPER));

        c.cpu_write(0xA000, 0x00);
        assert!(!c.cpu().irq_lines().contains(IrqSource::MAPPER));
    }

    #[test]
    fn frame_takes_one_frame_of_scanlines() {
        let mut c = console(0);
        c.run_frame();
        assert_eq!(c.ppu().scanline(), 0);
        assert!(c.ppu().odd_frame());
        assert_eq!(c.cpu().cycles(), 29781);
    }
}

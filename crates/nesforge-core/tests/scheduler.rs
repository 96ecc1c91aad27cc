mod common;

use anyhow::Result;
use nesforge_core::{
    Console,
    cartridge::Header,
    config::ConsoleConfig,
    cpu::IrqSource,
};

fn mapper_irq(console: &Console) -> bool {
    console.cpu().irq_lines().contains(IrqSource::MAPPER)
}

#[test]
fn mmc3_counts_rendered_scanlines() -> Result<()> {
    let mut c = common::console(Header::new(4), 128, 128)?;
    c.cpu_write(0xC000, 7);
    c.cpu_write(0xC001, 0);
    c.cpu_write(0xE001, 0);
    // Sprites from $1000, both layers on.
    c.cpu_write(0x2000, 0x08);
    c.cpu_write(0x2001, 0x18);

    for line in 0..7 {
        c.run_scanline();
        assert!(!mapper_irq(&c), "line {line}");
    }
    c.run_scanline();
    assert!(mapper_irq(&c));

    c.cpu_write(0xE000, 0);
    assert!(!mapper_irq(&c));
    Ok(())
}

#[test]
fn vrc4_prescaler_tracks_scanlines() -> Result<()> {
    let mut c = common::console(Header::new(21), 128, 128)?;
    c.cpu_write(0xF000, 0x0E);
    c.cpu_write(0xF002, 0x0F);
    c.cpu_write(0xF004, 0x02);

    c.run_scanline();
    assert!(!mapper_irq(&c));
    c.run_scanline();
    assert!(mapper_irq(&c));

    c.cpu_write(0xF006, 0);
    assert!(!mapper_irq(&c));
    Ok(())
}

#[test]
fn disk_timer_fires_once_without_repeat() -> Result<()> {
    let mut c = common::console(Header::new(20), 8, 0)?;
    c.cpu_write(0x4023, 0x01);
    c.cpu_write(0x4020, 0x10);
    c.cpu_write(0x4021, 0x00);
    c.cpu_write(0x4022, 0x02);

    c.step(16);
    assert!(!mapper_irq(&c));
    c.step(1);
    assert!(mapper_irq(&c));
    assert_eq!(c.cpu_read(0x4030) & 0x01, 0x01);

    c.cpu_write(0x4022, 0x00);
    assert!(!mapper_irq(&c));
    c.step(100);
    assert!(!mapper_irq(&c));
    Ok(())
}

#[test]
fn disk_status_read_acknowledges_timer() -> Result<()> {
    let mut c = common::console(Header::new(20), 8, 0)?;
    c.cpu_write(0x4023, 0x01);
    c.cpu_write(0x4020, 0x08);
    c.cpu_write(0x4022, 0x02);
    c.step(9);
    assert!(mapper_irq(&c));

    assert_eq!(c.cpu_read(0x4030) & 0x01, 0x01);
    assert!(!mapper_irq(&c));
    assert_eq!(c.cpu_read(0x4030) & 0x01, 0x00);
    Ok(())
}

#[test]
fn sample_buffer_keeps_newest_samples() -> Result<()> {
    let image = common::paged_image(Header::new(20), 8, 0)?;
    let mut c = Console::new(image, ConsoleConfig::default().with_sample_buffer_len(8))?;
    for _ in 0..20 {
        c.step(10);
    }
    assert_eq!(c.samples().len(), 8);
    assert_eq!(c.samples().dropped(), 12);
    assert_eq!(c.take_samples().len(), 8);
    assert!(c.samples().is_empty());
    Ok(())
}

#[test]
fn boards_without_audio_produce_no_samples() -> Result<()> {
    let mut c = common::console(Header::new(4), 128, 128)?;
    c.run_frame();
    assert!(c.take_samples().is_empty());
    Ok(())
}

#[test]
fn warm_reset_keeps_memory() -> Result<()> {
    let mut c = common::console(Header::new(2), 128, 0)?;
    c.cpu_write(0x0300, 0x5A);
    c.cpu_write(0x2000, 0x80);
    c.cpu_mut().a = 0x33;
    c.reset();
    assert_eq!(c.cpu_read(0x0300), 0x5A);
    assert_eq!(c.cpu().a, 0x33);
    assert!(!c.ppu().control().nmi_enabled());
    Ok(())
}

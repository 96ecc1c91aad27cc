mod common;

use anyhow::Result;
use nesforge_core::{
    Console,
    cartridge::{Header, Mirroring, create_mapper},
    config::ConsoleConfig,
    error::Error,
};

const SUPPORTED: &[u16] = &[
    0, 1, 2, 3, 4, 7, 9, 10, 11, 20, 21, 22, 23, 25, 33, 34, 36, 38, 41, 47, 48, 58, 60, 61, 62,
    64, 65, 66, 69, 70, 71, 72, 73, 75, 76, 78, 79, 86, 87, 88, 89, 92, 93, 94, 97, 107, 112, 113,
    119, 140, 152, 154, 180, 182, 184, 185, 200, 201, 203, 206, 212, 213, 214, 225, 226, 228, 229,
    231, 240, 241, 242, 244, 246, 255,
];

#[test]
fn every_registered_id_builds() -> Result<()> {
    for &id in SUPPORTED {
        let image = common::paged_image(Header::new(id), 256, 128)?;
        let mapper = create_mapper(&image)?;
        assert_eq!(mapper.mapper_id(), id);
        assert!(!mapper.name().is_empty(), "mapper {id}");
        assert!(!mapper.irq_pending(), "mapper {id} powers on with IRQ asserted");
    }
    Ok(())
}

#[test]
fn unknown_ids_fail_console_construction() -> Result<()> {
    for id in [5, 19, 85, 250, 4095] {
        let image = common::paged_image(Header::new(id), 32, 8)?;
        let err = Console::new(image, ConsoleConfig::default()).unwrap_err();
        assert_eq!(err, Error::UnsupportedMapper { id });
    }
    Ok(())
}

#[test]
fn capabilities_match_the_board() -> Result<()> {
    let build = |id: u16, chr_kb: usize| -> Result<_> {
        Ok(create_mapper(&common::paged_image(
            Header::new(id),
            128,
            chr_kb,
        )?)?)
    };

    let mut mmc3 = build(4, 128)?;
    assert!(mmc3.a12_irq().is_some());
    assert!(mmc3.cycle_irq().is_none());
    assert!(mmc3.extra_state().is_none());
    assert!(mmc3.board_state().is_some());

    let mut rambo = build(64, 128)?;
    assert!(rambo.cycle_irq().is_some());

    let mut vrc4 = build(21, 128)?;
    assert!(vrc4.cycle_irq().is_some());

    let mut taito = build(48, 128)?;
    assert!(taito.scanline_irq().is_some());
    let mut tc0190 = build(33, 128)?;
    assert!(tc0190.scanline_irq().is_none());

    let mmc1 = build(1, 128)?;
    assert!(mmc1.extra_state().is_some());
    assert!(mmc1.board_state().is_none());

    let mut disk = create_mapper(&common::paged_image(Header::new(20), 8, 0)?)?;
    assert!(disk.expansion_audio().is_some());
    assert!(disk.cycle_irq().is_some());
    assert_eq!(
        disk.banks().prg_ram().map(<[u8]>::len),
        Some(32 * 1024)
    );
    Ok(())
}

#[test]
fn state_goes_through_one_channel_per_board() -> Result<()> {
    for &id in SUPPORTED {
        let mapper = create_mapper(&common::paged_image(Header::new(id), 256, 128)?)?;
        assert!(
            !(mapper.extra_state().is_some() && mapper.board_state().is_some()),
            "mapper {id} saves registers twice"
        );
    }
    Ok(())
}

#[test]
fn header_mirroring_reaches_the_nametables() -> Result<()> {
    let image = common::paged_image(Header::new(0).with_mirroring(Mirroring::Vertical), 32, 8)?;
    let mut mapper = create_mapper(&image)?;
    mapper.ppu_write(0x2000, 0x12);
    assert_eq!(mapper.ppu_read(0x2800), 0x12);
    assert_eq!(mapper.banks().nt_map(), [0, 1, 0, 1]);

    mapper.set_mirroring(Mirroring::SingleScreenUpper);
    assert_eq!(mapper.ppu_read(0x2000), 0xB0);
    mapper.set_mirroring(Mirroring::Vertical);
    assert_eq!(mapper.ppu_read(0x2800), 0x12);
    Ok(())
}

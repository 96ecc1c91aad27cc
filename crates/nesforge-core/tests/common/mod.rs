#![allow(dead_code)]

use anyhow::Result;
use nesforge_core::{
    Console,
    cartridge::{CartridgeImage, Header},
    config::ConsoleConfig,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[ctor::ctor]
unsafe fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Image whose every 1 KiB page is filled with its page number.
pub fn paged_image(header: Header, prg_kb: usize, chr_kb: usize) -> Result<CartridgeImage> {
    let pages = |kb: usize| -> Vec<u8> { (0..kb * 1024).map(|i| (i / 1024) as u8).collect() };
    Ok(CartridgeImage::new(header, pages(prg_kb), pages(chr_kb))?)
}

pub fn console(header: Header, prg_kb: usize, chr_kb: usize) -> Result<Console> {
    Ok(Console::new(
        paged_image(header, prg_kb, chr_kb)?,
        ConsoleConfig::default(),
    )?)
}

/// Register pokes for one board: CPU address range and how many writes to
/// issue per quantum.
#[derive(Debug, Clone, Copy)]
pub struct WritePlan {
    pub low: u16,
    pub high: u16,
    pub per_quantum: usize,
}

impl WritePlan {
    pub const CARTRIDGE: WritePlan = WritePlan {
        low: 0x8000,
        high: 0xFFFF,
        per_quantum: 2,
    };
}

/// Drive `console` for `quanta` steps of `cycles`, issuing random register
/// writes from `rng` before each step.
pub fn drive(
    console: &mut Console,
    rng: &mut StdRng,
    plan: WritePlan,
    quanta: usize,
    cycles: u32,
) {
    for _ in 0..quanta {
        for _ in 0..plan.per_quantum {
            let addr = rng.random_range(plan.low..=plan.high);
            let value: u8 = rng.random();
            console.cpu_write(addr, value);
        }
        console.step(cycles);
    }
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Byte visible at the start of every 1 KiB CPU window from `$6000` up.
pub fn cpu_windows(console: &mut Console) -> Vec<u8> {
    (0x6000u32..0x10000)
        .step_by(0x400)
        .map(|addr| console.cpu_read(addr as u16))
        .collect()
}

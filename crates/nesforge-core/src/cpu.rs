//! CPU register file and interrupt lines.
//!
//! Instruction decoding lives outside the core; what the console keeps is
//! the architectural state a snapshot must capture plus the interrupt inputs
//! the rest of the machine drives.

mod status;

pub use status::{IrqSource, Status};

/// Reset vector location.
pub const RESET_VECTOR: u16 = 0xFFFC;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer (offset into page `$01`).
    pub s: u8,
    pub pc: u16,
    pub p: Status,
    irq_lines: IrqSource,
    /// One-instruction delay after CLI/SEI/PLP before IRQ polling sees the
    /// new I flag.
    interrupt_delay: bool,
    nmi_pending: bool,
    /// CPU cycles since power-on.
    cycles: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: Status::default(),
            irq_lines: IrqSource::empty(),
            interrupt_delay: false,
            nmi_pending: false,
            cycles: 0,
        }
    }

    /// Warm reset: registers keep their values, S drops by three and I is set.
    pub fn reset(&mut self, reset_vector: u16) {
        self.s = self.s.wrapping_sub(3);
        self.p.insert(Status::INTERRUPT);
        self.pc = reset_vector;
        self.irq_lines = IrqSource::empty();
        self.nmi_pending = false;
        self.interrupt_delay = false;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub(crate) fn add_cycles(&mut self, cycles: u32) {
        self.cycles = self.cycles.wrapping_add(u64::from(cycles));
    }

    pub fn irq_lines(&self) -> IrqSource {
        self.irq_lines
    }

    pub fn set_irq(&mut self, source: IrqSource, active: bool) {
        self.irq_lines.set(source, active);
    }

    /// Whether an IRQ would be taken at the next instruction boundary.
    pub fn irq_pending(&self) -> bool {
        !self.irq_lines.is_empty() && !self.p.contains(Status::INTERRUPT) && !self.interrupt_delay
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    pub(crate) fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Consume a pending NMI, as the instruction core does when servicing it.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    pub fn set_interrupt_delay(&mut self, delay: bool) {
        self.interrupt_delay = delay;
    }

    pub fn interrupt_delay(&self) -> bool {
        self.interrupt_delay
    }

    pub(crate) fn restore_lines(
        &mut self,
        irq_lines: IrqSource,
        interrupt_delay: bool,
        nmi_pending: bool,
        cycles: u64,
    ) {
        self.irq_lines = irq_lines;
        self.interrupt_delay = interrupt_delay;
        self.nmi_pending = nmi_pending;
        self.cycles = cycles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn irq_is_masked_by_interrupt_flag() {
        let mut cpu = Cpu::new();
        cpu.set_irq(IrqSource::MAPPER, true);
        assert!(!cpu.irq_pending());

        cpu.p.remove(Status::INTERRUPT);
        assert!(cpu.irq_pending());

        cpu.set_interrupt_delay(true);
        assert!(!cpu.irq_pending());
        cpu.set_interrupt_delay(false);

        cpu.set_irq(IrqSource::MAPPER, false);
        assert!(!cpu.irq_pending());
    }

    #[test]
    fn reset_keeps_registers() {
        let mut cpu = Cpu::new();
        cpu.a = 0x42;
        cpu.reset(0xC000);
        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.s, 0xFA);
        assert_eq!(cpu.pc, 0xC000);
    }
}

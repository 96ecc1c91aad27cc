use crate::{
    cpu::{Cpu, IrqSource, Status},
    state::{SaveState, StateError, StateReader, StateWriter},
};

impl SaveState for Cpu {
    fn save_state(&self, w: &mut StateWriter) {
        w.u8(self.a);
        w.u8(self.x);
        w.u8(self.y);
        w.u8(self.s);
        w.u16(self.pc);
        w.u8(self.p.bits());
        w.u8(self.irq_lines().bits());
        w.bool(self.interrupt_delay());
        w.bool(self.nmi_pending());
        w.u64(self.cycles());
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.a = r.u8("cpu a")?;
        self.x = r.u8("cpu x")?;
        self.y = r.u8("cpu y")?;
        self.s = r.u8("cpu s")?;
        self.pc = r.u16("cpu pc")?;
        self.p = Status::from_bits_retain(r.u8("cpu status")?);
        let irq_lines = IrqSource::from_bits_retain(r.u8("cpu irq lines")?);
        let interrupt_delay = r.bool("cpu interrupt delay")?;
        let nmi_pending = r.bool("cpu nmi pending")?;
        let cycles = r.u64("cpu cycles")?;
        self.restore_lines(irq_lines, interrupt_delay, nmi_pending, cycles);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_lines_survive() {
        let mut cpu = Cpu::new();
        cpu.a = 1;
        cpu.x = 2;
        cpu.y = 3;
        cpu.pc = 0xC123;
        cpu.set_irq(IrqSource::MAPPER, true);
        cpu.set_interrupt_delay(true);
        cpu.raise_nmi();
        cpu.add_cycles(12345);

        let mut w = StateWriter::new();
        cpu.save_state(&mut w);
        assert_eq!(w.len(), 18);
        let blob = w.finish().unwrap();

        let mut restored = Cpu::new();
        restored.load_state(&mut StateReader::new(&blob)).unwrap();
        assert_eq!(restored, cpu);
    }
}

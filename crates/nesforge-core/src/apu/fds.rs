//! Disk-system wavetable channel (RP2C33 audio).
//!
//! One 64-step, 6-bit wavetable voice whose pitch is bent by a second
//! 64-step modulation table, with two ramp envelopes and a one-pole output
//! filter.
//!
//! | Address       | Behaviour                                                  |
//! |---------------|------------------------------------------------------------|
//! | `$4023`       | Bit 0: register enable; every other write is ignored while clear |
//! | `$4040-$407F` | Wavetable RAM (writable while bit 7 of `$4089` is set)     |
//! | `$4080`       | Volume envelope: bit 7 off, bit 6 increase, bits 0-5 speed/gain |
//! | `$4082-$4083` | Pitch low / high; `$4083` bit 7 halt, bit 6 envelope disable |
//! | `$4084`       | Modulation envelope, same layout as `$4080`                |
//! | `$4085`       | Modulation counter (7-bit signed)                          |
//! | `$4086-$4087` | Modulation frequency low / high; `$4087` bit 7 disables it  |
//! | `$4088`       | Modulation table write (two entries per write)             |
//! | `$4089`       | Bit 7 wave write enable, bits 0-1 master volume            |
//! | `$408A`       | Envelope clock multiplier                                  |
//! | `$4090/$4092` | Read back volume / modulation gain                         |

use crate::{
    apu::expansion::ExpansionAudio,
    memory::fds as fds_mem,
    state::{SaveState, StateError, StateReader, StateWriter},
};

const TABLE_LEN: usize = 64;
const TABLE_MASK: u8 = (TABLE_LEN as u8) - 1;
const ACCUM_LIMIT: u32 = 0x1_0000;
const MAX_GAIN: u8 = 32;
const MAX_PITCH: i32 = 0xFFFF;
const ENV_CLOCK_POWER_ON: u8 = 0xFF;

/// Counter adjustments selected by a modulation table entry; `None` resets.
const MOD_STEPS: [Option<i32>; 8] = [
    Some(0),
    Some(1),
    Some(2),
    Some(4),
    None,
    Some(-4),
    Some(-2),
    Some(-1),
];

/// One ramp envelope: `$4080` for volume, `$4084` for modulation depth.
#[derive(Debug, Clone, Default)]
struct Envelope {
    enabled: bool,
    increase: bool,
    speed: u8,
    gain: u8,
    accum: u32,
}

impl Envelope {
    fn write(&mut self, value: u8) {
        self.enabled = value & 0x80 == 0;
        self.increase = value & 0x40 != 0;
        self.speed = value & 0x3F;
        if !self.enabled {
            self.gain = value & 0x3F;
        }
    }

    fn tick(&mut self, multiplier: u8) {
        if !self.enabled {
            return;
        }
        self.accum += 1;
        let threshold = 8 * u32::from(multiplier) * (u32::from(self.speed) + 1);
        if self.accum > threshold {
            self.accum = 0;
            if self.increase {
                if self.gain < MAX_GAIN {
                    self.gain += 1;
                }
            } else if self.gain > 0 {
                self.gain -= 1;
            }
        }
    }

    fn save(&self, w: &mut StateWriter) {
        w.bool(self.enabled);
        w.bool(self.increase);
        w.u8(self.speed);
        w.u8(self.gain);
        w.u32(self.accum);
    }

    fn load(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.enabled = r.bool("envelope enabled")?;
        self.increase = r.bool("envelope direction")?;
        self.speed = r.u8("envelope speed")? & 0x3F;
        self.gain = r.u8("envelope gain")? & 0x3F;
        self.accum = r.u32("envelope accumulator")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FdsAudio {
    registers_enabled: bool,
    wavetable: [u8; TABLE_LEN],
    wave_index: u8,
    wave_accum: u32,
    wave_out: u8,
    wave_write_enabled: bool,
    /// 12 bits from the registers, widened to 16 by modulation.
    pitch: i32,
    halted: bool,
    envelopes_disabled: bool,
    volume: Envelope,
    modulation: Envelope,
    env_clock_multiplier: u8,
    mod_table: [u8; TABLE_LEN],
    mod_index: u8,
    mod_accum: u32,
    mod_freq: u16,
    mod_disabled: bool,
    /// Signed 7-bit.
    mod_counter: i32,
    master_volume: u8,
    lowpass: i32,
}

impl Default for FdsAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl FdsAudio {
    pub fn new() -> Self {
        Self {
            registers_enabled: true,
            wavetable: [0; TABLE_LEN],
            wave_index: 0,
            wave_accum: 0,
            wave_out: 0,
            wave_write_enabled: false,
            pitch: 0,
            halted: false,
            envelopes_disabled: false,
            volume: Envelope::default(),
            modulation: Envelope::default(),
            env_clock_multiplier: ENV_CLOCK_POWER_ON,
            mod_table: [0; TABLE_LEN],
            mod_index: 0,
            mod_accum: 0,
            mod_freq: 0,
            mod_disabled: false,
            mod_counter: 0,
            master_volume: 0,
            lowpass: 0,
        }
    }

    /// Current (possibly modulated) wave pitch.
    pub fn pitch(&self) -> u16 {
        self.pitch as u16
    }

    pub fn volume_gain(&self) -> u8 {
        self.volume.gain
    }

    pub fn mod_counter(&self) -> i8 {
        self.mod_counter as i8
    }

    fn sign_extend_7(value: i32) -> i32 {
        (value << 25) >> 25
    }

    fn step_modulator(&mut self) {
        match MOD_STEPS[usize::from(self.mod_table[usize::from(self.mod_index)] & 0x07)] {
            Some(delta) => self.mod_counter += delta,
            None => self.mod_counter = 0,
        }
        self.mod_counter = Self::sign_extend_7(self.mod_counter);
        self.bend_pitch();
    }

    /// Apply the modulation counter to the pitch, rounding the way the chip's
    /// multiplier does.
    fn bend_pitch(&mut self) {
        let mut temp = self.mod_counter * i32::from(self.modulation.gain);
        let remainder = temp & 0x0F;
        temp >>= 4;
        if remainder > 0 && temp & 0x80 == 0 {
            temp += if self.mod_counter < 0 { -1 } else { 2 };
        }

        if temp >= 192 {
            temp -= 256;
        } else if temp < -64 {
            temp += 256;
        }

        temp *= self.pitch;
        let remainder = temp & 0x3F;
        temp >>= 6;
        if remainder >= 32 {
            temp += 1;
        }

        self.pitch = (self.pitch + temp).clamp(0, MAX_PITCH);
    }

    fn clock_cycle(&mut self) {
        if self.mod_disabled {
            self.mod_accum = 0;
        } else if self.mod_freq > 0 {
            self.mod_accum += u32::from(self.mod_freq);
            if self.mod_accum >= ACCUM_LIMIT {
                self.mod_accum &= ACCUM_LIMIT - 1;
                self.mod_index = (self.mod_index + 1) & TABLE_MASK;
                self.step_modulator();
            }
        }

        if self.pitch > 0 && !self.wave_write_enabled && !self.halted {
            self.wave_accum += self.pitch as u32;
            if self.wave_accum >= ACCUM_LIMIT {
                self.wave_accum &= ACCUM_LIMIT - 1;
                self.wave_index = (self.wave_index + 1) & TABLE_MASK;
            }
        }
    }

    fn mixed_sample(&self) -> i32 {
        let sample = (i32::from(self.wave_out) * i32::from(self.volume.gain)) << 4;
        match self.master_volume & 0x03 {
            0 => sample,
            1 => sample * 20 / 30,
            2 => sample * 15 / 30,
            _ => sample * 12 / 30,
        }
    }
}

impl ExpansionAudio for FdsAudio {
    fn clock(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.clock_cycle();
        }

        if !self.halted && !self.envelopes_disabled && self.env_clock_multiplier != 0 {
            self.modulation.tick(self.env_clock_multiplier);
            self.volume.tick(self.env_clock_multiplier);
        }

        if !self.wave_write_enabled {
            self.wave_out = self.wavetable[usize::from(self.wave_index)];
        }

        self.lowpass += self.mixed_sample();
        self.lowpass -= self.lowpass / 16;
    }

    fn output(&self) -> i32 {
        self.lowpass
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        if addr == fds_mem::IO_ENABLE {
            self.registers_enabled = value & 0x01 != 0;
            return;
        }
        if !self.registers_enabled {
            return;
        }

        tracing::trace!(addr, value, "fds audio register");
        match addr {
            fds_mem::WAVE_RAM_START..=fds_mem::WAVE_RAM_END => {
                if self.wave_write_enabled {
                    let index = usize::from(addr - fds_mem::WAVE_RAM_START) & (TABLE_LEN - 1);
                    self.wavetable[index] = value & 0x3F;
                }
            }
            fds_mem::VOLUME_ENVELOPE => self.volume.write(value),
            fds_mem::FREQ_LOW => self.pitch = (self.pitch & 0x0F00) | i32::from(value),
            fds_mem::FREQ_HIGH => {
                self.pitch = (self.pitch & 0x00FF) | (i32::from(value & 0x0F) << 8);
                self.halted = value & 0x80 != 0;
                self.envelopes_disabled = value & 0x40 != 0;
                if self.halted {
                    self.wave_accum = 0;
                    self.wave_index = 0;
                }
            }
            fds_mem::MOD_ENVELOPE => self.modulation.write(value),
            fds_mem::MOD_COUNTER => self.mod_counter = Self::sign_extend_7(i32::from(value & 0x7F)),
            fds_mem::MOD_FREQ_LOW => self.mod_freq = (self.mod_freq & 0x0F00) | u16::from(value),
            fds_mem::MOD_FREQ_HIGH => {
                self.mod_freq = (self.mod_freq & 0x00FF) | (u16::from(value & 0x0F) << 8);
                self.mod_disabled = value & 0x80 != 0;
            }
            fds_mem::MOD_TABLE_WRITE => {
                if self.mod_disabled {
                    for _ in 0..2 {
                        self.mod_table[usize::from(self.mod_index)] = value & 0x07;
                        self.mod_index = (self.mod_index + 1) & TABLE_MASK;
                    }
                }
            }
            fds_mem::MASTER_VOLUME => {
                self.master_volume = value & 0x03;
                self.wave_write_enabled = value & 0x80 != 0;
            }
            fds_mem::ENVELOPE_SPEED => self.env_clock_multiplier = value,
            _ => {}
        }
    }

    fn read_register(&self, addr: u16) -> Option<u8> {
        match addr {
            fds_mem::VOLUME_GAIN_READ => Some(self.volume.gain),
            fds_mem::MOD_GAIN_READ => Some(self.modulation.gain),
            _ => None,
        }
    }
}

impl SaveState for FdsAudio {
    fn save_state(&self, w: &mut StateWriter) {
        w.bool(self.registers_enabled);
        w.bytes(&self.wavetable);
        w.u8(self.wave_index);
        w.u16(self.wave_accum as u16);
        w.u8(self.wave_out);
        w.bool(self.wave_write_enabled);
        w.u16(self.pitch as u16);
        w.bool(self.halted);
        w.bool(self.envelopes_disabled);
        self.volume.save(w);
        self.modulation.save(w);
        w.u8(self.env_clock_multiplier);
        w.bytes(&self.mod_table);
        w.u8(self.mod_index);
        w.u16(self.mod_accum as u16);
        w.u16(self.mod_freq);
        w.bool(self.mod_disabled);
        w.u8(self.mod_counter as u8);
        w.u8(self.master_volume);
        w.i32(self.lowpass);
    }

    fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<(), StateError> {
        self.registers_enabled = r.bool("fds enable")?;
        r.bytes_into(&mut self.wavetable, "fds wavetable")?;
        self.wavetable.iter_mut().for_each(|v| *v &= 0x3F);
        self.wave_index = r.u8("fds wave index")? & TABLE_MASK;
        self.wave_accum = u32::from(r.u16("fds wave accumulator")?);
        self.wave_out = r.u8("fds wave output")? & 0x3F;
        self.wave_write_enabled = r.bool("fds wave write")?;
        self.pitch = i32::from(r.u16("fds pitch")?);
        self.halted = r.bool("fds halt")?;
        self.envelopes_disabled = r.bool("fds envelope disable")?;
        self.volume.load(r)?;
        self.modulation.load(r)?;
        self.env_clock_multiplier = r.u8("fds envelope multiplier")?;
        r.bytes_into(&mut self.mod_table, "fds modulation table")?;
        self.mod_table.iter_mut().for_each(|v| *v &= 0x07);
        self.mod_index = r.u8("fds modulation index")? & TABLE_MASK;
        self.mod_accum = u32::from(r.u16("fds modulation accumulator")?);
        self.mod_freq = r.u16("fds modulation frequency")? & 0x0FFF;
        self.mod_disabled = r.bool("fds modulation disable")?;
        self.mod_counter = Self::sign_extend_7(i32::from(r.u8("fds modulation counter")?));
        self.master_volume = r.u8("fds master volume")? & 0x03;
        self.lowpass = r.i32("fds lowpass")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat modulation table, halted wave, modulation clocked as fast as the
    /// 12-bit frequency allows.
    fn modulation_rig(counter: u8, gain: u8, pitch: u16) -> FdsAudio {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4087, 0x80);
        for _ in 0..32 {
            fds.write_register(0x4088, 0);
        }
        fds.write_register(0x4084, 0x80 | gain);
        fds.write_register(0x4085, counter);
        fds.write_register(0x4082, pitch as u8);
        fds.write_register(0x4083, 0x80 | ((pitch >> 8) as u8 & 0x0F));
        fds.write_register(0x4086, 0xFF);
        fds.write_register(0x4087, 0x0F);
        fds
    }

    #[test]
    fn pitch_bend_golden_value() {
        let mut fds = modulation_rig(10, 16, 1000);
        // 17 * 0xFFF is the first multiple to pass 0x10000.
        fds.clock(16);
        assert_eq!(fds.pitch(), 1000);
        fds.clock(1);
        assert_eq!(fds.pitch(), 1156);
    }

    #[test]
    fn negative_counter_rounds_down() {
        let mut fds = FdsAudio::new();
        fds.modulation.gain = 3;
        fds.mod_counter = -5;
        fds.pitch = 1000;
        fds.bend_pitch();
        // -15 >> 4 = -1 with bit 7 set, so no rounding; -1000 >> 6 floors to -16.
        assert_eq!(fds.pitch(), 984);
    }

    #[test]
    fn mod_counter_wraps_to_seven_bits() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4085, 0x3F);
        assert_eq!(fds.mod_counter(), 63);
        fds.mod_table[1] = 1;
        fds.mod_index = 1;
        fds.step_modulator();
        assert_eq!(fds.mod_counter(), -64);
    }

    #[test]
    fn envelope_ramps_after_threshold_and_saturates() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x408A, 1);
        fds.write_register(0x4080, 0x40);
        for _ in 0..8 {
            fds.clock(1);
        }
        assert_eq!(fds.volume_gain(), 0);
        fds.clock(1);
        assert_eq!(fds.volume_gain(), 1);

        for _ in 0..9 * 40 {
            fds.clock(1);
        }
        assert_eq!(fds.volume_gain(), 32);
        assert_eq!(fds.read_register(0x4090), Some(32));
    }

    #[test]
    fn envelope_off_sets_gain_directly() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4080, 0x80 | 0x25);
        assert_eq!(fds.volume_gain(), 0x25);
        for _ in 0..100 {
            fds.clock(1);
        }
        assert_eq!(fds.volume_gain(), 0x25);
    }

    #[test]
    fn enable_gate_drops_writes() {
        let mut gated = FdsAudio::new();
        gated.write_register(0x4023, 0x00);
        gated.write_register(0x4080, 0x80 | 0x10);
        gated.write_register(0x4082, 0x34);
        assert_eq!(gated.volume_gain(), 0);
        assert_eq!(gated.pitch(), 0);

        gated.write_register(0x4023, 0x01);
        gated.write_register(0x4080, 0x80 | 0x10);
        gated.write_register(0x4082, 0x34);
        assert_eq!(gated.volume_gain(), 0x10);
        assert_eq!(gated.pitch(), 0x34);
    }

    #[test]
    fn mod_table_writes_need_modulation_disabled() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4088, 3);
        assert_eq!(fds.mod_table[0], 0);

        fds.write_register(0x4087, 0x80);
        fds.write_register(0x4088, 3);
        fds.write_register(0x4088, 0x0D);
        assert_eq!(&fds.mod_table[..4], &[3, 3, 5, 5]);
        assert_eq!(fds.mod_index, 4);
    }

    #[test]
    fn wavetable_output_and_filter() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4089, 0x80);
        for i in 0..64u16 {
            fds.write_register(0x4040 + i, 0x3F);
        }
        fds.write_register(0x4089, 0x00);
        fds.write_register(0x4080, 0x80 | 0x20);
        fds.clock(1);
        // (63 * 32) << 4 = 32256; 32256 - 32256 / 16 = 30240.
        assert_eq!(fds.output(), 30240);

        fds.write_register(0x4089, 0x02);
        fds.clock(1);
        // 30240 + 16128 = 46368; minus 2898.
        assert_eq!(fds.output(), 43470);
    }

    #[test]
    fn halt_resets_wave_position() {
        let mut fds = FdsAudio::new();
        fds.write_register(0x4082, 0xFF);
        fds.write_register(0x4083, 0x0F);
        fds.clock(100);
        assert_ne!(fds.wave_index, 0);
        fds.write_register(0x4083, 0x8F);
        assert_eq!(fds.wave_index, 0);
        fds.clock(100);
        assert_eq!(fds.wave_index, 0);
    }

    #[test]
    fn state_round_trip_keeps_running_identically() {
        let mut fds = modulation_rig(7, 20, 600);
        fds.write_register(0x4083, 0x02);
        fds.write_register(0x4080, 0x45);
        fds.clock(500);

        let mut w = StateWriter::new();
        fds.save_state(&mut w);
        let blob = w.finish().unwrap();
        let mut restored = FdsAudio::new();
        restored
            .load_state(&mut StateReader::new(blob.as_bytes()))
            .unwrap();

        for _ in 0..50 {
            fds.clock(37);
            restored.clock(37);
            assert_eq!(fds.output(), restored.output());
        }
        assert_eq!(fds.pitch(), restored.pitch());
    }
}

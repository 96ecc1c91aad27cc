use crate::{
    Console,
    state::{
        STATE_CAPACITY, STATE_FORMAT_VERSION, STATE_MAGIC, SaveState, SaveStateBlob, StateError,
        StateReader, StateWriter,
    },
};

impl Console {
    /// Capture the whole machine. Only call between quanta.
    pub fn save_state(&self) -> Result<SaveStateBlob, StateError> {
        let mut w = StateWriter::new();
        w.bytes(&STATE_MAGIC);
        w.u16(STATE_FORMAT_VERSION);
        w.u16(self.cartridge.header().mapper);
        w.u32(self.cartridge.image().prg_crc32());

        self.cpu.save_state(&mut w);
        self.ppu.save_state(&mut w);
        self.cartridge.save_state(self.region, &mut w);
        w.bytes(&self.ram);

        let used = w.len();
        let blob = w.finish()?;
        tracing::debug!(used, "save state captured");
        Ok(blob)
    }

    /// Restore a blob produced by [`Console::save_state`].
    ///
    /// The header is checked before anything is touched, and the sections are
    /// decoded into a copy that replaces `self` only once every field has
    /// been read, so a failed load leaves the console as it was.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), StateError> {
        if data.len() != STATE_CAPACITY {
            return Err(StateError::Length {
                expected: STATE_CAPACITY,
                actual: data.len(),
            });
        }

        let mut r = StateReader::new(data);
        let mut magic = [0u8; 4];
        r.bytes_into(&mut magic, "magic")?;
        if magic != STATE_MAGIC {
            return Err(StateError::Magic);
        }
        let version = r.u16("format version")?;
        if version != STATE_FORMAT_VERSION {
            return Err(StateError::Version { found: version });
        }
        let mapper = r.u16("mapper id")?;
        let expected_mapper = self.cartridge.header().mapper;
        if mapper != expected_mapper {
            return Err(StateError::MapperMismatch {
                expected: expected_mapper,
                found: mapper,
            });
        }
        let crc = r.u32("prg checksum")?;
        let expected_crc = self.cartridge.image().prg_crc32();
        if crc != expected_crc {
            return Err(StateError::ChecksumMismatch {
                expected: expected_crc,
                found: crc,
            });
        }

        let mut next = self.clone();
        next.cpu.load_state(&mut r)?;
        next.ppu.load_state(&mut r, next.cartridge.mapper_mut())?;
        let region = next.cartridge.load_state(&mut r)?;
        next.set_region(region);
        r.bytes_into(&mut next.ram, "work ram")?;

        *self = next;
        tracing::info!(mapper, %region, read = r.position(), "save state loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Console,
        cartridge::{Header, mapper::paged_image},
        config::ConsoleConfig,
        state::{STATE_CAPACITY, StateError},
    };

    fn console() -> Console {
        Console::new(paged_image(Header::new(2), 64, 0), ConsoleConfig::default()).unwrap()
    }

    #[test]
    fn header_is_magic_version_mapper_crc() {
        let c = console();
        let blob = c.save_state().unwrap();
        assert_eq!(blob.len(), STATE_CAPACITY);
        assert_eq!(&blob[..4], b"NFST");
        assert_eq!(&blob[4..6], &[0, 2]);
        assert_eq!(&blob[6..8], &[0, 2]);
        assert_eq!(
            &blob[8..12],
            &c.cartridge().image().prg_crc32().to_be_bytes()
        );
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut c = console();
        assert_eq!(
            c.load_state(&[0u8; 16]),
            Err(StateError::Length {
                expected: STATE_CAPACITY,
                actual: 16
            })
        );
    }

    #[test]
    fn restore_brings_back_memory_and_banks() {
        let mut c = console();
        c.cpu_write(0x0042, 0x99);
        c.cpu_write(0x6000, 0x55);
        c.cpu_write(0x8000, 3);
        c.step(1000);
        let blob = c.save_state().unwrap();

        c.cpu_write(0x0042, 0x00);
        c.cpu_write(0x6000, 0x00);
        c.cpu_write(0x8000, 1);
        c.step(5000);

        c.load_state(&blob).unwrap();
        assert_eq!(c.cpu_read(0x0042), 0x99);
        assert_eq!(c.cpu_read(0x6000), 0x55);
        assert_eq!(c.cpu_read(0x8000), 48);
        assert_eq!(c.cpu().cycles(), 1000);
    }
}

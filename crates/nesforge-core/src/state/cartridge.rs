use crate::{
    cartridge::{Cartridge, header::Mirroring},
    config::Region,
    memory::ppu as ppu_mem,
    state::{StateError, StateReader, StateWriter},
};

impl Cartridge {
    /// Mapper section. Which optional blocks are present is decided by the
    /// live board, so both sides agree without stored flags.
    pub(crate) fn save_state(&self, region: Region, w: &mut StateWriter) {
        let mapper = self.mapper();
        let banks = mapper.banks();

        w.u8(region.code());
        w.u8(mapper.mirroring().code());
        if let Some(ram) = banks.prg_ram() {
            w.bytes(ram);
        }
        if let Some(ram) = banks.chr_ram() {
            w.bytes(ram);
        }
        for index in 0..ppu_mem::NAMETABLE_COUNT {
            w.bytes(banks.nametable(index));
        }
        if let Some(extra) = mapper.extra_state() {
            w.u32(extra.save_extra());
        }
        if let Some(board) = mapper.board_state() {
            board.save_state(w);
        }
        if let Some(audio) = mapper.expansion_audio() {
            audio.save_state(w);
        }
    }

    /// Restores the mapper section and returns the saved region.
    pub(crate) fn load_state(&mut self, r: &mut StateReader<'_>) -> Result<Region, StateError> {
        let region_code = r.u8("region")?;
        let region = Region::from_code(region_code).ok_or(StateError::InvalidField {
            field: "region",
            value: region_code,
        })?;
        let mirroring_code = r.u8("mirroring")?;
        let mirroring = Mirroring::from_code(mirroring_code).ok_or(StateError::InvalidField {
            field: "mirroring",
            value: mirroring_code,
        })?;

        let mapper = self.mapper_mut();
        let banks = mapper.banks_mut();
        if let Some(ram) = banks.prg_ram_mut() {
            r.bytes_into(ram, "prg ram")?;
        }
        if let Some(ram) = banks.chr_ram_mut() {
            r.bytes_into(ram, "chr ram")?;
        }
        for index in 0..ppu_mem::NAMETABLE_COUNT {
            r.bytes_into(banks.nametable_mut(index), "nametable")?;
        }
        if let Some(extra) = mapper.extra_state_mut() {
            extra.load_extra(r.u32("mapper extra state")?);
        }
        if let Some(board) = mapper.board_state_mut() {
            board.load_state(r)?;
        }
        if let Some(audio) = mapper.expansion_audio_mut() {
            audio.load_state(r)?;
        }
        // Board registers may rewrite the bank tables; the saved mirroring wins.
        mapper.set_mirroring(mirroring);
        Ok(region)
    }
}

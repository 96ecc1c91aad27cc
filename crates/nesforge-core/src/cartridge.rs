use crate::error::Error;

pub mod a12_watcher;
pub mod banks;
pub mod chr_storage;
pub mod header;
pub mod image;
pub mod mapper;

pub use banks::BankedAddressSpace;
pub use header::{Header, Mirroring, TvSystem};
pub use image::CartridgeImage;
pub use mapper::{Mapper, create_mapper};

/// An inserted cartridge: the immutable image plus the board wired around it.
#[derive(Debug, Clone)]
pub struct Cartridge {
    image: CartridgeImage,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Build the board the header names. Fails for unknown mapper ids.
    pub fn new(image: CartridgeImage) -> Result<Self, Error> {
        let mapper = create_mapper(&image)?;
        Ok(Self { image, mapper })
    }

    pub fn image(&self) -> &CartridgeImage {
        &self.image
    }

    pub fn header(&self) -> &Header {
        self.image.header()
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn mapper_mut(&mut self) -> &mut dyn Mapper {
        self.mapper.as_mut()
    }

    pub fn cpu_read(&self, addr: u16) -> u8 {
        self.mapper.cpu_read(addr)
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        self.mapper.cpu_write(addr, data);
    }

    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }
}

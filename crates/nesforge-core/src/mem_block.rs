use core::ops::{Deref, DerefMut};

#[cfg(feature = "boxed-memblock")]
type MemBlockStorage<T, const N: usize> = Box<[T; N]>;

#[cfg(not(feature = "boxed-memblock"))]
type MemBlockStorage<T, const N: usize> = [T; N];

/// Fixed-size memory array used for RAM, nametables, OAM and chip tables.
///
/// Stored inline by default; the `boxed-memblock` feature moves the storage
/// to the heap for targets with small stacks.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemBlock<T, const N: usize>(MemBlockStorage<T, N>);

/// Convenience alias for a `MemBlock` of bytes.
pub type ByteBlock<const N: usize> = MemBlock<u8, N>;

pub mod cpu {
    use crate::memory::cpu as cpu_mem;

    pub type Ram = super::ByteBlock<{ cpu_mem::INTERNAL_RAM_SIZE }>;
}

pub mod ppu {
    use crate::memory::ppu as ppu_mem;

    /// One physical 1 KiB nametable buffer.
    pub type Nametable = super::ByteBlock<{ ppu_mem::NAMETABLE_SIZE as usize }>;
    pub type PaletteRam = super::ByteBlock<{ ppu_mem::PALETTE_RAM_SIZE }>;
    pub type OamRam = super::ByteBlock<{ ppu_mem::OAM_RAM_SIZE }>;
}

impl<T, const N: usize> MemBlock<T, N> {
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        #[cfg(feature = "boxed-memblock")]
        {
            &*self.0
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            &self.0
        }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        #[cfg(feature = "boxed-memblock")]
        {
            &mut *self.0
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            &mut self.0
        }
    }
}

impl<T: Copy + Default, const N: usize> MemBlock<T, N> {
    pub fn new() -> Self {
        Self::filled(T::default())
    }
}

impl<T: Copy, const N: usize> MemBlock<T, N> {
    /// Create a `MemBlock` where every element is initialized to `value`.
    #[inline]
    pub fn filled(value: T) -> Self {
        #[cfg(feature = "boxed-memblock")]
        {
            Self(Box::new([value; N]))
        }
        #[cfg(not(feature = "boxed-memblock"))]
        {
            Self([value; N])
        }
    }
}

impl<T: Copy + Default, const N: usize> Default for MemBlock<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for MemBlock<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for MemBlock<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

//! Byte-addressable main memory.

use crate::{RuntimeFault, Word};

/// Linear byte store covering `[base, base + size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainMemory {
    base: u32,
    bytes: Box<[u8]>,
}

impl MainMemory {
    /// Allocates `size` zeroed bytes starting at address `base`.
    #[must_use]
    pub fn new(base: u32, size: u32) -> Self {
        Self {
            base,
            bytes: vec![0; size as usize].into_boxed_slice(),
        }
    }

    /// First addressable byte.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Number of addressable bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if `address..address + length` lies inside memory.
    #[must_use]
    pub fn contains(&self, address: u32, length: usize) -> bool {
        self.offset(address, length).is_some()
    }

    fn offset(&self, address: u32, length: usize) -> Option<usize> {
        let start = address.checked_sub(self.base)? as usize;
        let end = start.checked_add(length)?;
        (end <= self.bytes.len()).then_some(start)
    }

    fn checked_range(&self, address: u32, length: usize) -> Result<usize, RuntimeFault> {
        self.offset(address, length)
            .ok_or(RuntimeFault::MemoryOutOfRange { address, length })
    }

    /// Borrows `length` raw bytes at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] if any byte lies outside
    /// memory.
    pub fn read_bytes(&self, address: u32, length: usize) -> Result<&[u8], RuntimeFault> {
        let start = self.checked_range(address, length)?;
        Ok(&self.bytes[start..start + length])
    }

    /// Reads `length` bytes (1, 2 or 4) and sign-extends them into a word.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] if any byte lies outside
    /// memory.
    pub fn read(&self, address: u32, length: usize) -> Result<Word, RuntimeFault> {
        self.read_bytes(address, length).map(Word::from_bytes)
    }

    /// Reads `length` bytes and zero-extends them into a word.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] if any byte lies outside
    /// memory.
    pub fn read_unsigned(&self, address: u32, length: usize) -> Result<Word, RuntimeFault> {
        self.read_bytes(address, length)
            .map(Word::from_bytes_unsigned)
    }

    /// Stores `bytes` at `address`. Nothing is written if any byte would land
    /// outside memory.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeFault::MemoryOutOfRange`] if any byte lies outside
    /// memory.
    pub fn write(&mut self, address: u32, bytes: &[u8]) -> Result<(), RuntimeFault> {
        let start = self.checked_range(address, bytes.len())?;
        self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

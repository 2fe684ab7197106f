use crate::error::MemoryError;
use crate::utils::{get_u64, put_u64};

/// Size of the memory that is used to store instructions and data (stack).
/// Object files address it with three hex digits.
pub const MEM_SIZE: usize = 0x1000;

/// Byte addressable memory shared by the fetch and memory stages.
#[derive(Clone, PartialEq, Eq)]
pub struct Memory {
    bytes: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            bytes: Box::new([0; MEM_SIZE]),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.bytes.iter().filter(|b| **b != 0).count();
        write!(f, "Memory {{ size: {MEM_SIZE:#x}, nonzero: {used} }}")
    }
}

impl Memory {
    /// Bounds-checked range `addr..addr + len` as usize indices.
    fn range(addr: u64, len: usize) -> Result<std::ops::Range<usize>, MemoryError> {
        let start = usize::try_from(addr).map_err(|_| MemoryError::OutOfBounds(addr))?;
        match start.checked_add(len) {
            Some(end) if end <= MEM_SIZE => Ok(start..end),
            _ => Err(MemoryError::OutOfBounds(addr)),
        }
    }

    pub fn get_byte(&self, addr: u64) -> Result<u8, MemoryError> {
        let r = Self::range(addr, 1)?;
        Ok(self.bytes[r.start])
    }

    pub fn put_byte(&mut self, addr: u64, byte: u8) -> Result<(), MemoryError> {
        let r = Self::range(addr, 1)?;
        self.bytes[r.start] = byte;
        Ok(())
    }

    /// Read a little-endian quad word. Fails without reading anything if
    /// any of the eight bytes is out of bounds.
    pub fn get_long(&self, addr: u64) -> Result<u64, MemoryError> {
        let r = Self::range(addr, 8)?;
        Ok(get_u64(&self.bytes[r]))
    }

    /// Write a little-endian quad word. Fails without writing anything if
    /// any of the eight bytes is out of bounds.
    pub fn put_long(&mut self, addr: u64, val: u64) -> Result<(), MemoryError> {
        let r = Self::range(addr, 8)?;
        put_u64(&mut self.bytes[r], val);
        Ok(())
    }

    pub fn read_range(&self, addr: u64, len: usize) -> Result<&[u8], MemoryError> {
        let r = Self::range(addr, len)?;
        Ok(&self.bytes[r])
    }

    pub fn as_bytes(&self) -> &[u8; MEM_SIZE] {
        &self.bytes
    }
}

// Tue Jan 13 2026 - Alex

use crate::memory::{MemoryAccessor, MemoryError, NativeSize, NativeWord};
use std::fmt;
use std::sync::Arc;

/// Bounds-checked window over a memory accessor.
#[derive(Clone)]
pub struct MemoryView {
    accessor: Option<Arc<dyn MemoryAccessor>>,
    offset: u64,
    size: u64,
}

impl MemoryView {
    pub fn new(accessor: Arc<dyn MemoryAccessor>, offset: u64, size: u64) -> Result<Self, MemoryError> {
        accessor.check_range(offset, size)?;
        Ok(Self {
            accessor: Some(accessor),
            offset,
            size,
        })
    }

    /// View over the whole backing store.
    pub fn whole(accessor: Arc<dyn MemoryAccessor>) -> Self {
        let size = accessor.size();
        Self {
            accessor: Some(accessor),
            offset: 0,
            size,
        }
    }

    pub fn invalid() -> Self {
        Self {
            accessor: None,
            offset: 0,
            size: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.accessor.is_some()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    fn accessor(&self) -> Result<&Arc<dyn MemoryAccessor>, MemoryError> {
        self.accessor.as_ref().ok_or(MemoryError::InvalidView)
    }

    fn check(&self, position: u64, size: u64) -> Result<(), MemoryError> {
        self.accessor()?;
        match position.checked_add(size) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(MemoryError::OutOfRange {
                offset: position,
                size,
                limit: self.size,
            }),
        }
    }

    pub fn get_range(&self, position: u64, size: u64) -> Result<MemoryView, MemoryError> {
        self.check(position, size)?;
        Ok(Self {
            accessor: self.accessor.clone(),
            offset: self.offset + position,
            size,
        })
    }

    /// Sub-view from `position` to the end of this view.
    pub fn get_tail(&self, position: u64) -> Result<MemoryView, MemoryError> {
        self.check(position, 0)?;
        self.get_range(position, self.size - position)
    }

    pub fn read_into(&self, position: u64, buffer: &mut [u8]) -> Result<(), MemoryError> {
        self.check(position, buffer.len() as u64)?;
        self.accessor()?.read_into(self.offset + position, buffer)
    }

    pub fn read_bytes(&self, position: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut bytes = vec![0u8; len];
        self.read_into(position, &mut bytes)?;
        Ok(bytes)
    }

    pub fn read_u8(&self, position: u64) -> Result<u8, MemoryError> {
        let mut bytes = [0u8; 1];
        self.read_into(position, &mut bytes)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&self, position: u64) -> Result<u16, MemoryError> {
        let mut bytes = [0u8; 2];
        self.read_into(position, &mut bytes)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32(&self, position: u64) -> Result<u32, MemoryError> {
        let mut bytes = [0u8; 4];
        self.read_into(position, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u64(&self, position: u64) -> Result<u64, MemoryError> {
        let mut bytes = [0u8; 8];
        self.read_into(position, &mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    pub fn read_native(&self, position: u64, native: NativeSize) -> Result<NativeWord, MemoryError> {
        let mut bytes = [0u8; 8];
        self.read_into(position, &mut bytes[..native.size()])?;
        Ok(native.decode(&bytes))
    }

    /// Reads an unsigned integer of `width` bytes and widens it to a native
    /// word. Widths other than 1, 2, 4 or 8 read a full native word.
    pub fn read_widened(&self, position: u64, width: usize, native: NativeSize) -> Result<NativeWord, MemoryError> {
        let value = match width {
            1 => self.read_u8(position)? as u64,
            2 => self.read_u16(position)? as u64,
            4 => self.read_u32(position)? as u64,
            8 => self.read_u64(position)?,
            _ => return self.read_native(position, native),
        };
        Ok(NativeWord::new(value, native))
    }
}

impl fmt::Debug for MemoryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryView")
            .field("valid", &self.is_valid())
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

impl Default for MemoryView {
    fn default() -> Self {
        Self::invalid()
    }
}

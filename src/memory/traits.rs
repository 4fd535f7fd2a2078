// Thu Jan 15 2026 - Alex

use crate::memory::MemoryError;

/// Read-only random access to snapshot bytes. Implemented by the loader's
/// backing store; views never own the bytes themselves.
pub trait MemoryAccessor: Send + Sync {
    fn size(&self) -> u64;

    fn read_into(&self, offset: u64, buffer: &mut [u8]) -> Result<(), MemoryError>;

    fn check_range(&self, offset: u64, size: u64) -> Result<(), MemoryError> {
        let limit = self.size();
        match offset.checked_add(size) {
            Some(end) if end <= limit => Ok(()),
            _ => Err(MemoryError::OutOfRange { offset, size, limit }),
        }
    }
}

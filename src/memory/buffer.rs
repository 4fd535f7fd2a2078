// Tue Jan 13 2026 - Alex

use crate::memory::{MemoryAccessor, MemoryError};
use bytes::Bytes;

/// In-memory backing store, cheap to clone and share between segments.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Bytes,
}

impl ByteBuffer {
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data: Bytes::from(data) }
    }
}

impl MemoryAccessor for ByteBuffer {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_into(&self, offset: u64, buffer: &mut [u8]) -> Result<(), MemoryError> {
        self.check_range(offset, buffer.len() as u64)?;
        let start = offset as usize;
        buffer.copy_from_slice(&self.data[start..start + buffer.len()]);
        Ok(())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

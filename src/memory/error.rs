// Tue Jan 13 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Out of range: {size} bytes at offset {offset:#x} exceed backing store of {limit} bytes")]
    OutOfRange { offset: u64, size: u64, limit: u64 },
    #[error("Read from an invalid memory view")]
    InvalidView,
    #[error("Native word width mismatch: {0} vs {1} bytes")]
    WidthMismatch(usize, usize),
    #[error("Unsupported native size: {0} bytes")]
    UnsupportedNativeSize(usize),
}

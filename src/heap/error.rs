// Tue Jan 13 2026 - Alex

use crate::memory::MemoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeapError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Segment at {start:#x} is not ordered after segment at {previous:#x}")]
    UnorderedSegments { previous: u64, start: u64 },
    #[error("Segment at {start:#x} overlaps segment [{previous_start:#x}, {previous_end:#x})")]
    OverlappingSegments {
        previous_start: u64,
        previous_end: u64,
        start: u64,
    },
    #[error("Segment at {0:#x} extends past the end of the address space")]
    SegmentOverflow(u64),
    #[error("Invalid type index {0}")]
    InvalidTypeIndex(i32),
}

// Tue Jan 13 2026 - Alex

use crate::memory::MemoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypeSystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Type {type_index} references unknown type index {referenced}")]
    UnknownTypeIndex { type_index: i32, referenced: i32 },
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

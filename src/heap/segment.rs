// Tue Jan 13 2026 - Alex

use crate::memory::{MemoryView, NativeWord};
use std::fmt;

/// Contiguous range of snapshot memory: managed heap or runtime type
/// information.
#[derive(Debug, Clone)]
pub struct HeapSegment {
    start: NativeWord,
    view: MemoryView,
    is_runtime_type_information: bool,
}

impl HeapSegment {
    pub fn new(start: NativeWord, view: MemoryView, is_runtime_type_information: bool) -> Self {
        Self {
            start,
            view,
            is_runtime_type_information,
        }
    }

    pub fn start(&self) -> NativeWord {
        self.start
    }

    /// Exclusive end of the segment.
    pub fn end(&self) -> NativeWord {
        self.start + self.view.size()
    }

    pub fn size(&self) -> u64 {
        self.view.size()
    }

    pub fn view(&self) -> &MemoryView {
        &self.view
    }

    pub fn is_runtime_type_information(&self) -> bool {
        self.is_runtime_type_information
    }

    pub fn contains(&self, address: NativeWord) -> bool {
        address.value() >= self.start.value() && address.value() - self.start.value() < self.size()
    }
}

impl fmt::Display for HeapSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_runtime_type_information { "rtti" } else { "heap" };
        write!(f, "[{}, {}) {} ({} bytes)", self.start, self.end(), kind, self.size())
    }
}

// Fri Jan 16 2026 - Alex

use crate::memory::{MemoryError, MemoryView, NativeSize};
use ahash::AHashMap;

/// Format-specific facts about objects in the heap that the type system
/// cannot answer: array lengths and the runtime type of an object.
pub trait HeapLayout: Send + Sync {
    /// Element count of the array object whose bytes start at `view`.
    fn read_array_size(&self, view: &MemoryView, type_index: i32) -> Result<u64, MemoryError>;

    /// Runtime type of the object whose bytes start at `view`.
    fn type_index_of(&self, view: &MemoryView) -> Option<i32>;
}

/// Objects start with a type-information word at a fixed offset; arrays
/// store their length as a native word at a fixed offset.
#[derive(Debug, Clone)]
pub struct FixedHeaderLayout {
    native: NativeSize,
    type_word_offset: u64,
    array_length_offset: u64,
    types_by_word: AHashMap<u64, i32>,
}

impl FixedHeaderLayout {
    pub fn new(native: NativeSize, type_word_offset: u64, array_length_offset: u64) -> Self {
        Self {
            native,
            type_word_offset,
            array_length_offset,
            types_by_word: AHashMap::new(),
        }
    }

    pub fn with_type(mut self, type_word: u64, type_index: i32) -> Self {
        self.types_by_word.insert(type_word, type_index);
        self
    }

    pub fn register_type(&mut self, type_word: u64, type_index: i32) {
        self.types_by_word.insert(type_word, type_index);
    }
}

impl HeapLayout for FixedHeaderLayout {
    fn read_array_size(&self, view: &MemoryView, _type_index: i32) -> Result<u64, MemoryError> {
        Ok(view.read_native(self.array_length_offset, self.native)?.value())
    }

    fn type_index_of(&self, view: &MemoryView) -> Option<i32> {
        let word = view.read_native(self.type_word_offset, self.native).ok()?;
        self.types_by_word.get(&word.value()).copied()
    }
}

// Tue Jan 13 2026 - Alex

use crate::memory::MemoryError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

/// Width of a pointer in the snapshot's process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeSize {
    Four,
    Eight,
}

impl NativeSize {
    pub fn from_bytes(size: usize) -> Result<Self, MemoryError> {
        match size {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(MemoryError::UnsupportedNativeSize(other)),
        }
    }

    pub fn size(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    pub fn mask(self) -> u64 {
        match self {
            Self::Four => u32::MAX as u64,
            Self::Eight => u64::MAX,
        }
    }

    pub fn word(self, value: u64) -> NativeWord {
        NativeWord::new(value, self)
    }

    /// Decodes a little-endian native word from the first `size()` bytes.
    pub fn decode(self, bytes: &[u8]) -> NativeWord {
        let value = match self {
            Self::Four => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64,
            Self::Eight => u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        };
        NativeWord::new(value, self)
    }
}

impl fmt::Display for NativeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-byte", self.size())
    }
}

/// Pointer-sized unsigned integer. Comparisons look at the value only;
/// arithmetic between two words requires the same width.
#[derive(Debug, Clone, Copy)]
pub struct NativeWord {
    value: u64,
    size: NativeSize,
}

impl NativeWord {
    pub fn new(value: u64, size: NativeSize) -> Self {
        Self { value: value & size.mask(), size }
    }

    pub fn zero(size: NativeSize) -> Self {
        Self { value: 0, size }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn size(&self) -> NativeSize {
        self.size
    }

    pub fn is_null(&self) -> bool {
        self.value == 0
    }

    pub fn checked_add(self, other: NativeWord) -> Option<NativeWord> {
        if self.size != other.size {
            return None;
        }
        let sum = self.value.checked_add(other.value)?;
        if sum > self.size.mask() {
            return None;
        }
        Some(Self::new(sum, self.size))
    }

    pub fn try_sub(self, other: NativeWord) -> Result<NativeWord, MemoryError> {
        if self.size != other.size {
            return Err(MemoryError::WidthMismatch(self.size.size(), other.size.size()));
        }
        Ok(Self::new(self.value.wrapping_sub(other.value), self.size))
    }

    /// Distance in bytes from `base` to `self`, if `self` is not below `base`.
    pub fn offset_from(&self, base: NativeWord) -> Option<u64> {
        self.value.checked_sub(base.value)
    }
}

impl PartialEq for NativeWord {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for NativeWord {}

impl PartialOrd for NativeWord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NativeWord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for NativeWord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Add<u64> for NativeWord {
    type Output = Self;
    fn add(self, rhs: u64) -> Self::Output {
        Self::new(self.value.wrapping_add(rhs), self.size)
    }
}

impl Sub<u64> for NativeWord {
    type Output = Self;
    fn sub(self, rhs: u64) -> Self::Output {
        Self::new(self.value.wrapping_sub(rhs), self.size)
    }
}

impl fmt::Display for NativeWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            NativeSize::Four => write!(f, "0x{:08x}", self.value),
            NativeSize::Eight => write!(f, "0x{:016x}", self.value),
        }
    }
}

impl fmt::LowerHex for NativeWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl From<NativeWord> for u64 {
    fn from(word: NativeWord) -> Self {
        word.value
    }
}

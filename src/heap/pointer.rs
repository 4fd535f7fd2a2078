// Wed Jan 14 2026 - Alex

use bitflags::bitflags;
use std::fmt;

/// Field number of an array element slot.
pub const ARRAY_ELEMENT: i32 = -1;

/// Selector hop meaning "every element of this array". Never a real field.
pub const ARRAY_SENTINEL: i32 = i32::MAX;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointerKind: u16 {
        /// Narrow integer slot read at its declared width, not traced.
        const UNTRACED = 1 << 0;
        const IS_EXTERNAL_REFERENCE = 1 << 1;
        const IS_CONDITION_ANCHOR = 1 << 2;
        const IS_WEIGHT_ANCHOR = 1 << 3;
        const IS_TAG_ANCHOR = 1 << 4;
        const TAG_IF_ZERO = 1 << 5;
        const TAG_IF_NONZERO = 1 << 6;
    }
}

/// Classification of one pointer slot: kind bits plus a signed weight.
/// Positive weights own the target, negative weights mark weak references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PointerFlags {
    kind: PointerKind,
    weight: i8,
}

impl PointerFlags {
    pub const NONE: Self = Self::from_kind(PointerKind::empty());
    /// No kind bits; only meaningful together with a weight.
    pub const WEIGHTED: Self = Self::NONE;
    pub const UNTRACED: Self = Self::from_kind(PointerKind::UNTRACED);
    pub const IS_EXTERNAL_REFERENCE: Self = Self::from_kind(PointerKind::IS_EXTERNAL_REFERENCE);
    pub const IS_CONDITION_ANCHOR: Self = Self::from_kind(PointerKind::IS_CONDITION_ANCHOR);
    pub const IS_WEIGHT_ANCHOR: Self = Self::from_kind(PointerKind::IS_WEIGHT_ANCHOR);
    pub const IS_TAG_ANCHOR: Self = Self::from_kind(PointerKind::IS_TAG_ANCHOR);
    pub const TAG_IF_ZERO: Self = Self::from_kind(PointerKind::TAG_IF_ZERO);
    pub const TAG_IF_NONZERO: Self = Self::from_kind(PointerKind::TAG_IF_NONZERO);

    pub const MAX_WEIGHT: i32 = i8::MAX as i32;
    pub const MIN_WEIGHT: i32 = -(i8::MAX as i32);

    pub const fn from_kind(kind: PointerKind) -> Self {
        Self { kind, weight: 0 }
    }

    /// Weights are clamped to `MIN_WEIGHT..=MAX_WEIGHT`.
    pub fn with_weight(self, weight: i32) -> Self {
        Self {
            kind: self.kind,
            weight: weight.clamp(Self::MIN_WEIGHT, Self::MAX_WEIGHT) as i8,
        }
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    pub fn weight(&self) -> i32 {
        self.weight as i32
    }

    pub fn is_default(&self) -> bool {
        self.kind.is_empty() && self.weight == 0
    }

    pub fn is_owning(&self) -> bool {
        self.weight > 0
    }

    pub fn is_weak(&self) -> bool {
        self.weight < 0
    }

    pub fn contains(&self, other: PointerFlags) -> bool {
        self.kind.contains(other.kind)
    }

    pub fn insert(&mut self, kind: PointerKind) {
        self.kind.insert(kind);
    }

    pub fn without_weight(self) -> Self {
        Self::from_kind(self.kind)
    }

    /// Union of kind bits; the weight with the larger magnitude wins, and on
    /// equal magnitude `self` keeps its weight.
    pub fn combine_with(self, other: PointerFlags) -> Self {
        let weight = if other.weight.unsigned_abs() > self.weight.unsigned_abs() {
            other.weight
        } else {
            self.weight
        };
        Self {
            kind: self.kind | other.kind,
            weight,
        }
    }
}

impl std::ops::BitOr for PointerFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.combine_with(rhs)
    }
}

impl fmt::Display for PointerFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.kind.iter_names().map(|(name, _)| name.to_string()).collect();
        if self.weight != 0 {
            parts.push(format!("weight({})", self.weight));
        }
        if parts.is_empty() {
            write!(f, "NONE")
        } else {
            write!(f, "{}", parts.join("|"))
        }
    }
}

/// A classified slot. `value` is a byte offset for layout tables and a
/// resolved pointer value when read from the heap. `position` is the slot's
/// byte offset from the start of the object (or array) holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerInfo<T> {
    pub value: T,
    pub flags: PointerFlags,
    pub type_index: i32,
    pub field_number: i32,
    pub position: u64,
}

impl<T> PointerInfo<T> {
    pub fn new(value: T, flags: PointerFlags, type_index: i32, field_number: i32) -> Self {
        Self {
            value,
            flags,
            type_index,
            field_number,
            position: 0,
        }
    }

    pub fn at(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    pub fn with_value<U>(&self, value: U) -> PointerInfo<U> {
        PointerInfo {
            value,
            flags: self.flags,
            type_index: self.type_index,
            field_number: self.field_number,
            position: self.position,
        }
    }

    pub fn is_array_element(&self) -> bool {
        self.field_number == ARRAY_ELEMENT
    }
}

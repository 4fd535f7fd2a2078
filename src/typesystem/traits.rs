// Thu Jan 15 2026 - Alex

use crate::memory::{MemoryView, NativeSize};

/// Per-type layout facts of a snapshot. Any snapshot format can implement
/// this; queries are by type index and must stay stable for the session.
///
/// Field offsets of reference types include the object header when
/// `with_header` is set. Value types are always laid out without a header.
pub trait TypeSystem: Send + Sync {
    fn pointer_size(&self) -> NativeSize;

    fn number_of_types(&self) -> i32;

    fn assembly(&self, type_index: i32) -> &str;

    fn qualified_name(&self, type_index: i32) -> &str;

    /// Base type for classes and value types, element type for arrays.
    fn base_or_element_type_index(&self, type_index: i32) -> Option<i32>;

    /// Instance size of value types; size of the object for reference types.
    fn base_size(&self, type_index: i32) -> i32;

    fn is_value_type(&self, type_index: i32) -> bool;

    fn is_array(&self, type_index: i32) -> bool;

    fn number_of_fields(&self, type_index: i32) -> i32;

    fn field_type(&self, type_index: i32, field_number: i32) -> i32;

    fn field_offset(&self, type_index: i32, field_number: i32, with_header: bool) -> i32;

    fn field_name(&self, type_index: i32, field_number: i32) -> &str;

    fn field_is_static(&self, type_index: i32, field_number: i32) -> bool;

    /// Storage of a static field, outside the managed heap.
    fn static_field_bytes(&self, type_index: i32, field_number: i32) -> Option<MemoryView>;

    fn object_header_size(&self) -> i32;

    /// Offset from the start of an array object to its first element.
    fn array_first_element_offset(&self, type_index: i32) -> i32;

    fn array_element_size(&self, type_index: i32) -> i32 {
        match self.base_or_element_type_index(type_index) {
            Some(element) if self.is_value_type(element) => self.base_size(element),
            _ => self.pointer_size().size() as i32,
        }
    }

    fn is_reference_type(&self, type_index: i32) -> bool {
        !self.is_value_type(type_index)
    }

    fn base_type_index(&self, type_index: i32) -> Option<i32> {
        if self.is_array(type_index) {
            None
        } else {
            self.base_or_element_type_index(type_index)
        }
    }

    fn element_type_index(&self, type_index: i32) -> Option<i32> {
        if self.is_array(type_index) {
            self.base_or_element_type_index(type_index)
        } else {
            None
        }
    }

    fn find_declared_field(&self, type_index: i32, name: &str) -> Option<i32> {
        (0..self.number_of_fields(type_index)).find(|&field| self.field_name(type_index, field) == name)
    }

    /// Looks `name` up on the type and then along its base chain. Returns the
    /// declaring type with the field number. A chain longer than the number
    /// of types is cyclic and ends the search.
    fn find_field(&self, type_index: i32, name: &str) -> Option<(i32, i32)> {
        let mut current = Some(type_index);
        for _ in 0..=self.number_of_types() {
            let ty = current?;
            if let Some(field) = self.find_declared_field(ty, name) {
                return Some((ty, field));
            }
            current = self.base_type_index(ty);
        }
        None
    }

    fn describe_field(&self, type_index: i32, field_number: i32) -> String {
        if field_number < 0 || field_number >= self.number_of_fields(type_index) {
            return format!("{}[]", self.qualified_name(type_index));
        }
        format!("{}.{}", self.qualified_name(type_index), self.field_name(type_index, field_number))
    }
}

// Fri Jan 16 2026 - Alex

use crate::heap::{PointerInfo, ARRAY_ELEMENT};
use crate::rules::BoundRuleset;
use crate::typesystem::TypeSystem;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Per-type pointer slots, computed on first request and kept for the
/// lifetime of the table. Offsets of reference types include the object
/// header.
pub struct PointerOffsetTable {
    type_system: Arc<dyn TypeSystem>,
    ruleset: Arc<BoundRuleset>,
    tables: Vec<OnceCell<Vec<PointerInfo<i32>>>>,
}

impl PointerOffsetTable {
    pub fn new(type_system: Arc<dyn TypeSystem>, ruleset: Arc<BoundRuleset>) -> Self {
        let count = type_system.number_of_types().max(0) as usize;
        Self {
            type_system,
            ruleset,
            tables: (0..count).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn type_system(&self) -> &Arc<dyn TypeSystem> {
        &self.type_system
    }

    pub fn ruleset(&self) -> &Arc<BoundRuleset> {
        &self.ruleset
    }

    fn table(&self, type_index: i32) -> &[PointerInfo<i32>] {
        if type_index < 0 {
            return &[];
        }
        match self.tables.get(type_index as usize) {
            Some(cell) => cell.get_or_init(|| self.compute(type_index)),
            None => &[],
        }
    }

    /// Slots of an instance of `type_index`, shifted by `base_offset`.
    pub fn get_pointer_offsets(&self, type_index: i32, base_offset: i32) -> impl Iterator<Item = PointerInfo<i32>> + '_ {
        self.table(type_index).iter().map(move |slot| {
            let offset = slot.value + base_offset;
            slot.with_value(offset).at(offset.max(0) as u64)
        })
    }

    /// Slots of one element of an array type: the expanded layout of a
    /// value-type element, or a single synthetic slot for a reference.
    pub fn get_array_element_pointer_offsets(&self, array_type: i32, base_offset: i32) -> Vec<PointerInfo<i32>> {
        let ts = &self.type_system;
        match ts.element_type_index(array_type) {
            Some(element) if ts.is_value_type(element) => self.get_pointer_offsets(element, base_offset).collect(),
            Some(_) => vec![PointerInfo::new(
                base_offset,
                self.ruleset.get_pointer_flags(array_type, ARRAY_ELEMENT),
                array_type,
                ARRAY_ELEMENT,
            )
            .at(base_offset.max(0) as u64)],
            None => Vec::new(),
        }
    }

    /// Number of types whose table has been built so far.
    pub fn computed(&self) -> usize {
        self.tables.iter().filter(|cell| cell.get().is_some()).count()
    }

    fn compute(&self, type_index: i32) -> Vec<PointerInfo<i32>> {
        let mut slots = Vec::new();
        let mut visiting = Vec::new();
        self.collect(type_index, 0, &mut visiting, &mut slots);
        log::trace!(
            "{}: {} pointer slots",
            self.type_system.qualified_name(type_index),
            slots.len()
        );
        slots
    }

    fn collect(&self, type_index: i32, base: i32, visiting: &mut Vec<i32>, out: &mut Vec<PointerInfo<i32>>) {
        let ts = &self.type_system;
        visiting.push(type_index);

        if let Some(base_type) = ts.base_type_index(type_index) {
            if !visiting.contains(&base_type) {
                self.collect(base_type, base, visiting, out);
            }
        }

        for field in 0..ts.number_of_fields(type_index) {
            if ts.field_is_static(type_index, field) {
                continue;
            }
            let field_type = ts.field_type(type_index, field);
            let offset = base + ts.field_offset(type_index, field, true);
            let flags = self.ruleset.get_pointer_flags(type_index, field);

            if ts.is_value_type(field_type) {
                if !flags.is_default() {
                    out.push(PointerInfo::new(offset, flags, type_index, field).at(offset as u64));
                }
                // Primitives declare a field of their own type.
                if !visiting.contains(&field_type) {
                    self.collect(field_type, offset, visiting, out);
                }
            } else {
                out.push(PointerInfo::new(offset, flags, type_index, field).at(offset as u64));
            }
        }

        visiting.pop();
    }
}

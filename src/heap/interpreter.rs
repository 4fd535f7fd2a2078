// Fri Jan 16 2026 - Alex

use crate::heap::{HeapError, HeapLayout, PointerFlags, PointerInfo, SegmentedHeap, ARRAY_SENTINEL};
use crate::memory::{MemoryView, NativeWord};
use crate::rules::{RuleLocation, Selector, ARRAY_HOP};
use crate::typesystem::{PointerOffsetTable, TypeSystem};
use std::sync::Arc;

/// Target of a weight anchor, owned by (or weakly held from) `parent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedReference {
    pub child: NativeWord,
    pub parent: NativeWord,
    pub weight: i32,
    pub location: RuleLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedReference {
    pub target: NativeWord,
    pub tags: Vec<String>,
    pub location: RuleLocation,
}

enum Step<'s> {
    Hop(i32, i32),
    Named(&'s str),
}

/// Bytes of an object (with header) or of an embedded value (without).
struct Cursor {
    view: MemoryView,
    type_index: i32,
    has_header: bool,
}

enum Target {
    Object(Cursor),
    Pointer(NativeWord, i32),
}

/// Reads typed pointer slots out of heap memory.
pub struct HeapInterpreter {
    type_system: Arc<dyn TypeSystem>,
    heap: Arc<SegmentedHeap>,
    layout: Arc<dyn HeapLayout>,
    offsets: Arc<PointerOffsetTable>,
}

impl HeapInterpreter {
    pub fn new(heap: Arc<SegmentedHeap>, layout: Arc<dyn HeapLayout>, offsets: Arc<PointerOffsetTable>) -> Self {
        Self {
            type_system: offsets.type_system().clone(),
            heap,
            layout,
            offsets,
        }
    }

    pub fn heap(&self) -> &SegmentedHeap {
        &self.heap
    }

    pub fn offsets(&self) -> &PointerOffsetTable {
        &self.offsets
    }

    fn check_type(&self, type_index: i32) -> Result<(), HeapError> {
        if type_index < 0 || type_index >= self.type_system.number_of_types() {
            return Err(HeapError::InvalidTypeIndex(type_index));
        }
        Ok(())
    }

    /// Bytes to read for a slot: untraced integers use the declared size of
    /// their field type, everything else a native pointer.
    fn slot_width(&self, slot: &PointerInfo<i32>) -> usize {
        let native = self.heap.native().size();
        if !slot.flags.contains(PointerFlags::UNTRACED) || slot.field_number < 0 {
            return native;
        }
        let field_type = self.type_system.field_type(slot.type_index, slot.field_number);
        match self.type_system.base_size(field_type) {
            size @ (1 | 2 | 4 | 8) => size as usize,
            _ => native,
        }
    }

    /// Pointer slots of the object at `address`. Unmapped addresses yield
    /// nothing; array elements past the committed memory are skipped. Boxed
    /// value types are read after the object header.
    pub fn get_pointers(&self, address: NativeWord, type_index: i32) -> Result<Vec<PointerInfo<NativeWord>>, HeapError> {
        self.check_type(type_index)?;
        let view = match self.heap.get_memory_view_for_address(address) {
            Some(view) => view,
            None => return Ok(Vec::new()),
        };
        let native = self.heap.native();
        let ts = &self.type_system;
        let mut pointers = Vec::new();

        if !ts.is_array(type_index) {
            let base = if ts.is_value_type(type_index) { ts.object_header_size() } else { 0 };
            for slot in self.offsets.get_pointer_offsets(type_index, base) {
                let value = view.read_widened(slot.value as u64, self.slot_width(&slot), native)?;
                pointers.push(slot.with_value(value));
            }
            return Ok(pointers);
        }

        let slots = self.offsets.get_array_element_pointer_offsets(type_index, 0);
        if slots.is_empty() {
            return Ok(pointers);
        }
        let length = self.layout.read_array_size(&view, type_index)?;
        let first = ts.array_first_element_offset(type_index) as u64;
        let stride = ts.array_element_size(type_index) as u64;

        'elements: for index in 0..length {
            let element = match index.checked_mul(stride).and_then(|o| o.checked_add(first)) {
                Some(element) => element,
                None => break,
            };
            for slot in &slots {
                let width = self.slot_width(slot);
                let position = element + slot.value as u64;
                match position.checked_add(width as u64) {
                    Some(end) if end <= view.size() => {}
                    _ => {
                        log::trace!("Array at {} committed up to element {} of {}", address, index, length);
                        break 'elements;
                    }
                }
                let value = view.read_widened(position, width, native)?;
                pointers.push(slot.with_value(value).at(position));
            }
        }
        Ok(pointers)
    }

    /// Tags that apply to a tag-condition slot given the value it holds.
    pub fn conditional_tags(&self, pointer: &PointerInfo<NativeWord>) -> Vec<String> {
        let (zero, nonzero) = self
            .offsets
            .ruleset()
            .get_tags(pointer.type_index, pointer.field_number);
        if pointer.value.is_null() && pointer.flags.contains(PointerFlags::TAG_IF_ZERO) {
            zero.to_vec()
        } else if !pointer.value.is_null() && pointer.flags.contains(PointerFlags::TAG_IF_NONZERO) {
            nonzero.to_vec()
        } else {
            Vec::new()
        }
    }

    /// `(child, anchor)` pairs reached through the condition anchors of the
    /// slot described by `pointer`.
    pub fn get_owning_references_from_anchor(
        &self,
        anchor: NativeWord,
        pointer: &PointerInfo<NativeWord>,
    ) -> Result<Vec<(NativeWord, NativeWord)>, HeapError> {
        let mut pairs = Vec::new();
        let ruleset = self.offsets.ruleset();
        for condition in ruleset.get_condition_anchor_selectors(pointer.type_index, pointer.field_number) {
            for child in self.resolve_from_slot(anchor, pointer, &condition.selector)? {
                pairs.push((child, anchor));
            }
        }
        Ok(pairs)
    }

    pub fn get_weighted_references_from_anchor(
        &self,
        anchor: NativeWord,
        pointer: &PointerInfo<NativeWord>,
    ) -> Result<Vec<WeightedReference>, HeapError> {
        let mut references = Vec::new();
        let ruleset = self.offsets.ruleset();
        for weighted in ruleset.get_weight_anchor_selectors(pointer.type_index, pointer.field_number) {
            for child in self.resolve_from_slot(anchor, pointer, &weighted.selector)? {
                references.push(WeightedReference {
                    child,
                    parent: anchor,
                    weight: weighted.weight,
                    location: weighted.location.clone(),
                });
            }
        }
        Ok(references)
    }

    pub fn get_tags_from_anchor(
        &self,
        anchor: NativeWord,
        pointer: &PointerInfo<NativeWord>,
    ) -> Result<Vec<TaggedReference>, HeapError> {
        let mut references = Vec::new();
        let ruleset = self.offsets.ruleset();
        for tagged in ruleset.get_tag_anchor_selectors(pointer.type_index, pointer.field_number) {
            for target in self.resolve_from_slot(anchor, pointer, &tagged.selector)? {
                references.push(TaggedReference {
                    target,
                    tags: tagged.tags.clone(),
                    location: tagged.location.clone(),
                });
            }
        }
        Ok(references)
    }

    /// Non-null pointers at the end of `selector`, walked from the object at
    /// `anchor`. A value-type root is read as a boxed object.
    pub fn resolve_selector(&self, anchor: NativeWord, selector: &Selector) -> Result<Vec<NativeWord>, HeapError> {
        let (type_index, _) = match selector.anchor() {
            Some(hop) => hop,
            None => return Ok(Vec::new()),
        };
        self.check_type(type_index)?;
        let start = if self.type_system.is_value_type(type_index) {
            self.type_system.object_header_size() as u64
        } else {
            0
        };
        self.resolve_at(anchor, start, selector)
    }

    /// Walks `selector` from the struct that declares the slot `pointer`: the
    /// object at `anchor` itself, or a value embedded in it.
    fn resolve_from_slot(
        &self,
        anchor: NativeWord,
        pointer: &PointerInfo<NativeWord>,
        selector: &Selector,
    ) -> Result<Vec<NativeWord>, HeapError> {
        let (type_index, field) = match selector.anchor() {
            Some(hop) => hop,
            None => return Ok(Vec::new()),
        };
        self.check_type(type_index)?;
        let ts = &self.type_system;
        let with_header = !ts.is_value_type(type_index);
        let field_offset = ts.field_offset(type_index, field, with_header).max(0) as u64;
        match pointer.position.checked_sub(field_offset) {
            Some(start) => self.resolve_at(anchor, start, selector),
            None => Ok(Vec::new()),
        }
    }

    /// Root of the walk is `start` bytes into the object at `anchor`. Fields
    /// of a value-type root are laid out without a header.
    fn resolve_at(&self, anchor: NativeWord, start: u64, selector: &Selector) -> Result<Vec<NativeWord>, HeapError> {
        let (type_index, field) = match selector.anchor() {
            Some(hop) => hop,
            None => return Ok(Vec::new()),
        };
        let ts = &self.type_system;

        let view = match self.heap.get_memory_view_for_address(anchor) {
            Some(view) => match view.get_tail(start) {
                Ok(view) => view,
                Err(_) => return Ok(Vec::new()),
            },
            None if ts.field_is_static(type_index, field) => MemoryView::invalid(),
            None => return Ok(Vec::new()),
        };

        let mut steps: Vec<Step> = selector
            .static_prefix
            .iter()
            .map(|&(type_index, field)| Step::Hop(type_index, field))
            .collect();
        if let Some(tail) = &selector.dynamic_tail {
            steps.extend(tail.iter().map(|name| Step::Named(name.as_str())));
        }

        let mut found = Vec::new();
        let cursor = Cursor {
            view,
            type_index,
            has_header: !ts.is_value_type(type_index),
        };
        self.walk(cursor, &steps, &mut found);
        Ok(found)
    }

    fn walk(&self, cursor: Cursor, steps: &[Step], found: &mut Vec<NativeWord>) {
        let (step, rest) = match steps.split_first() {
            Some(split) => split,
            None => return,
        };
        for target in self.step(&cursor, step) {
            match target {
                Target::Pointer(value, _) if value.is_null() => {}
                Target::Pointer(value, _) if rest.is_empty() => found.push(value),
                Target::Pointer(value, declared) => {
                    if let Some(view) = self.heap.get_memory_view_for_address(value) {
                        let type_index = self.layout.type_index_of(&view).unwrap_or(declared);
                        let next = Cursor {
                            view,
                            type_index,
                            has_header: true,
                        };
                        self.walk(next, rest, found);
                    }
                }
                Target::Object(next) if !rest.is_empty() => self.walk(next, rest, found),
                Target::Object(_) => {}
            }
        }
    }

    fn step(&self, cursor: &Cursor, step: &Step) -> Vec<Target> {
        let ts = &self.type_system;
        let native = self.heap.native();

        let (type_index, field) = match *step {
            Step::Hop(type_index, field) => (type_index, field),
            Step::Named(name) if name == ARRAY_HOP => (cursor.type_index, ARRAY_SENTINEL),
            Step::Named(name) => match ts.find_field(cursor.type_index, name) {
                Some(hop) => hop,
                None => {
                    log::debug!("No field '{}' on {}", name, ts.qualified_name(cursor.type_index));
                    return Vec::new();
                }
            },
        };
        if field == ARRAY_SENTINEL {
            return self.array_elements(cursor, type_index);
        }

        let field_type = ts.field_type(type_index, field);
        let value_type = ts.is_value_type(field_type);

        if ts.field_is_static(type_index, field) {
            let view = match ts.static_field_bytes(type_index, field) {
                Some(view) => view,
                None => return Vec::new(),
            };
            return if value_type {
                vec![Target::Object(Cursor {
                    view,
                    type_index: field_type,
                    has_header: false,
                })]
            } else {
                view.read_native(0, native)
                    .map(|value| Target::Pointer(value, field_type))
                    .into_iter()
                    .collect()
            };
        }

        let position = ts.field_offset(type_index, field, cursor.has_header) as u64;
        let target = if value_type {
            cursor
                .view
                .get_range(position, ts.base_size(field_type) as u64)
                .map(|view| {
                    Target::Object(Cursor {
                        view,
                        type_index: field_type,
                        has_header: false,
                    })
                })
        } else {
            cursor
                .view
                .read_native(position, native)
                .map(|value| Target::Pointer(value, field_type))
        };
        target.into_iter().collect()
    }

    /// Committed elements of the array under `cursor`.
    fn array_elements(&self, cursor: &Cursor, array_type: i32) -> Vec<Target> {
        let ts = &self.type_system;
        let element = match ts.element_type_index(array_type) {
            Some(element) => element,
            None => return Vec::new(),
        };
        let length = match self.layout.read_array_size(&cursor.view, array_type) {
            Ok(length) => length,
            Err(_) => return Vec::new(),
        };
        let first = ts.array_first_element_offset(array_type) as u64;
        let stride = ts.array_element_size(array_type) as u64;
        if stride == 0 {
            return Vec::new();
        }

        let native = self.heap.native();
        let value_elements = ts.is_value_type(element);
        let mut targets = Vec::new();
        for index in 0..length {
            let position = match index.checked_mul(stride).and_then(|o| o.checked_add(first)) {
                Some(position) => position,
                None => break,
            };
            let target = if value_elements {
                cursor.view.get_range(position, stride).map(|view| {
                    Target::Object(Cursor {
                        view,
                        type_index: element,
                        has_header: false,
                    })
                })
            } else {
                cursor
                    .view
                    .read_native(position, native)
                    .map(|value| Target::Pointer(value, element))
            };
            match target {
                Ok(target) => targets.push(target),
                Err(_) => break,
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::{FixedHeaderLayout, HeapSegment};
    use crate::memory::{ByteBuffer, NativeSize};
    use crate::rules::RuleGroupStore;
    use crate::typesystem::LayoutBuilder;
    use crate::utils::WarningLog;
    use std::path::Path;

    const RULES: &str = r#"
        "Game.Holder" OWNS(5) "items[].next";
        "Game.Holder" FUSE_WITH "target.next";
        "Game.Holder" TAG_DYNAMIC(hot) "target.next";
        "Game.Holder" FUSE_WITH "stale.next";
        "Game.Holder" WEAK "s_default.next";
        "Game.Node" EXTERNAL "count";
        "Game.Node" TAG_IF_ZERO(leaf) "next";
        "Game.Node" TAG_IF_NONZERO(linked) "next";
    "#;

    struct Fixture {
        interpreter: HeapInterpreter,
        node: i32,
        nodes: i32,
        holder: i32,
    }

    fn put(bytes: &mut [u8], offset: usize, value: u64) {
        bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn word(value: u64) -> NativeWord {
        NativeSize::Eight.word(value)
    }

    fn fixture() -> Fixture {
        let mut builder = LayoutBuilder::new(NativeSize::Eight, 16, 24);
        let object = builder.class("mscorlib", "System.Object", None, 16);
        let int32 = builder.value_type("mscorlib", "System.Int32", 4);
        builder.field(int32, "m_value", int32, 0);
        let node = builder.class("Game", "Game.Node", Some(object), 32);
        builder.field(node, "next", node, 0);
        builder.field(node, "count", int32, 8);
        let nodes = builder.array("Game", node);
        let holder = builder.class("Game", "Game.Holder", Some(object), 40);
        builder.field(holder, "items", nodes, 0);
        builder.field(holder, "target", node, 8);
        builder.field(holder, "stale", node, 16);
        builder.static_field(holder, "s_default", node, 0x1000u64.to_le_bytes().to_vec());
        let ts: Arc<dyn TypeSystem> = Arc::new(builder.build().unwrap());

        let mut objects = vec![0u8; 0x100];
        put(&mut objects, 0x00, 0x51);
        put(&mut objects, 0x10, 0x1020);
        put(&mut objects, 0x18, 7);
        put(&mut objects, 0x20, 0x51);
        put(&mut objects, 0x60, 0x54);
        put(&mut objects, 0x70, 0x2000);
        put(&mut objects, 0x78, 0x1000);
        put(&mut objects, 0x80, 0x7000);

        // Declares five elements, only two are committed.
        let mut array = vec![0u8; 40];
        put(&mut array, 0, 0x53);
        put(&mut array, 8, 5);
        put(&mut array, 24, 0x1000);
        put(&mut array, 32, 0x1020);

        let segment = |start: u64, bytes: Vec<u8>| {
            HeapSegment::new(word(start), MemoryView::whole(Arc::new(ByteBuffer::from_vec(bytes))), false)
        };
        let heap = SegmentedHeap::new(NativeSize::Eight, vec![segment(0x1000, objects), segment(0x2000, array)]).unwrap();
        let layout = FixedHeaderLayout::new(NativeSize::Eight, 0, 8)
            .with_type(0x51, node)
            .with_type(0x53, nodes)
            .with_type(0x54, holder);

        let mut store = RuleGroupStore::new();
        store.load_str(Path::new("heap.rcl"), RULES).unwrap();
        let warnings = WarningLog::new();
        let ruleset = store.bind_enabled(ts.as_ref(), &warnings);
        assert!(warnings.is_empty(), "{:?}", warnings.all());

        let offsets = Arc::new(PointerOffsetTable::new(ts, Arc::new(ruleset)));
        Fixture {
            interpreter: HeapInterpreter::new(Arc::new(heap), Arc::new(layout), offsets),
            node,
            nodes,
            holder,
        }
    }

    fn slot(f: &Fixture, address: u64, type_index: i32, field: i32) -> PointerInfo<NativeWord> {
        f.interpreter
            .get_pointers(word(address), type_index)
            .unwrap()
            .into_iter()
            .find(|p| p.field_number == field)
            .unwrap()
    }

    #[test]
    fn test_object_slots_and_untraced_width() {
        let f = fixture();
        let pointers = f.interpreter.get_pointers(word(0x1000), f.node).unwrap();
        assert_eq!(pointers.len(), 2);
        assert_eq!(pointers[0].value, word(0x1020));
        assert_eq!(pointers[1].value.value(), 7);
        assert!(pointers[1].flags.contains(PointerFlags::UNTRACED));
    }

    #[test]
    fn test_partially_committed_array() {
        let f = fixture();
        let pointers = f.interpreter.get_pointers(word(0x2000), f.nodes).unwrap();
        let values: Vec<u64> = pointers.iter().map(|p| p.value.value()).collect();
        assert_eq!(values, vec![0x1000, 0x1020]);
        assert!(pointers.iter().all(|p| p.is_array_element()));
    }

    #[test]
    fn test_unmapped_and_invalid_inputs() {
        let f = fixture();
        assert!(f.interpreter.get_pointers(word(0x7000), f.node).unwrap().is_empty());
        assert!(matches!(
            f.interpreter.get_pointers(word(0x1000), 99),
            Err(HeapError::InvalidTypeIndex(99))
        ));
    }

    #[test]
    fn test_conditional_tags_follow_value() {
        let f = fixture();
        let linked = slot(&f, 0x1000, f.node, 0);
        let leaf = slot(&f, 0x1020, f.node, 0);
        assert_eq!(f.interpreter.conditional_tags(&linked), vec!["linked".to_string()]);
        assert_eq!(f.interpreter.conditional_tags(&leaf), vec!["leaf".to_string()]);
    }

    #[test]
    fn test_weighted_references_through_array() {
        let f = fixture();
        let items = slot(&f, 0x1060, f.holder, 0);
        assert!(items.flags.contains(PointerFlags::IS_WEIGHT_ANCHOR));
        let references = f.interpreter.get_weighted_references_from_anchor(word(0x1060), &items).unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].child, word(0x1020));
        assert_eq!(references[0].parent, word(0x1060));
        assert_eq!(references[0].weight, 5);
        assert_eq!(references[0].location.to_string(), "heap.rcl:2");
    }

    #[test]
    fn test_owning_references_from_anchor() {
        let f = fixture();
        let target = slot(&f, 0x1060, f.holder, 1);
        let pairs = f.interpreter.get_owning_references_from_anchor(word(0x1060), &target).unwrap();
        assert_eq!(pairs, vec![(word(0x1020), word(0x1060))]);

        let stale = slot(&f, 0x1060, f.holder, 2);
        assert!(f
            .interpreter
            .get_owning_references_from_anchor(word(0x1060), &stale)
            .unwrap()
            .is_empty());
        assert!(f
            .interpreter
            .get_owning_references_from_anchor(word(0x9000), &target)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_dynamic_tail_and_static_root() {
        let f = fixture();
        let target = slot(&f, 0x1060, f.holder, 1);
        let tagged = f.interpreter.get_tags_from_anchor(word(0x1060), &target).unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].target, word(0x1020));
        assert_eq!(tagged[0].tags, vec!["hot".to_string()]);

        let selector = &f.interpreter.offsets().ruleset().get_weight_anchor_selectors(f.holder, 3)[0].selector;
        let found = f.interpreter.resolve_selector(word(0xdead_0000), selector).unwrap();
        assert_eq!(found, vec![word(0x1020)]);
    }

    struct ValueFixture {
        interpreter: HeapInterpreter,
        pair: i32,
        outer: i32,
        pairs: i32,
    }

    /// Boxed `Game.Pair` at 0x1000, nodes at 0x1040 -> 0x1080, `Game.Outer`
    /// embedding a pair at 0x10c0, and a pair array at 0x2000 whose second
    /// element is cut off after its first field.
    fn value_fixture() -> ValueFixture {
        let mut builder = LayoutBuilder::new(NativeSize::Eight, 16, 24);
        let object = builder.class("mscorlib", "System.Object", None, 16);
        let node = builder.class("Game", "Game.Node", Some(object), 24);
        builder.field(node, "next", node, 0);
        let pair = builder.value_type("Game", "Game.Pair", 16);
        builder.field(pair, "first", node, 0);
        builder.field(pair, "second", node, 8);
        let outer = builder.class("Game", "Game.Outer", Some(object), 40);
        builder.field(outer, "pad", object, 0);
        builder.field(outer, "pair", pair, 8);
        let pairs = builder.array("Game", pair);
        let ts: Arc<dyn TypeSystem> = Arc::new(builder.build().unwrap());

        let mut objects = vec![0u8; 0x100];
        put(&mut objects, 0x00, 0xaaaa);
        put(&mut objects, 0x08, 0xbbbb);
        put(&mut objects, 0x10, 0x1040);
        put(&mut objects, 0x18, 0x1080);
        put(&mut objects, 0x40, 0x51);
        put(&mut objects, 0x50, 0x1080);
        put(&mut objects, 0x80, 0x51);
        put(&mut objects, 0xc0, 0x55);
        put(&mut objects, 0xd8, 0x1040);

        let mut array = vec![0u8; 48];
        put(&mut array, 0, 0x56);
        put(&mut array, 8, 3);
        put(&mut array, 24, 0x1040);
        put(&mut array, 32, 0x1080);
        put(&mut array, 40, 0x1080);

        let segment = |start: u64, bytes: Vec<u8>| {
            HeapSegment::new(word(start), MemoryView::whole(Arc::new(ByteBuffer::from_vec(bytes))), false)
        };
        let heap = SegmentedHeap::new(NativeSize::Eight, vec![segment(0x1000, objects), segment(0x2000, array)]).unwrap();
        let layout = FixedHeaderLayout::new(NativeSize::Eight, 0, 8)
            .with_type(0x51, node)
            .with_type(0x55, outer)
            .with_type(0x56, pairs);

        let mut store = RuleGroupStore::new();
        store.load_str(Path::new("pair.rcl"), "\"Game.Pair\" OWNS(3) \"first.next\";\n").unwrap();
        let warnings = WarningLog::new();
        let ruleset = store.bind_enabled(ts.as_ref(), &warnings);
        assert!(warnings.is_empty(), "{:?}", warnings.all());

        let offsets = Arc::new(PointerOffsetTable::new(ts, Arc::new(ruleset)));
        ValueFixture {
            interpreter: HeapInterpreter::new(Arc::new(heap), Arc::new(layout), offsets),
            pair,
            outer,
            pairs,
        }
    }

    fn children(f: &ValueFixture, anchor: u64, slot: &PointerInfo<NativeWord>) -> Vec<u64> {
        f.interpreter
            .get_weighted_references_from_anchor(word(anchor), slot)
            .unwrap()
            .iter()
            .map(|r| r.child.value())
            .collect()
    }

    #[test]
    fn test_boxed_value_type_skips_header() {
        let f = value_fixture();
        let pointers = f.interpreter.get_pointers(word(0x1000), f.pair).unwrap();
        let values: Vec<u64> = pointers.iter().map(|p| p.value.value()).collect();
        assert_eq!(values, vec![0x1040, 0x1080]);
        assert_eq!(pointers[0].position, 16);

        assert_eq!(children(&f, 0x1000, &pointers[0]), vec![0x1080]);
        let selector = &f.interpreter.offsets().ruleset().get_weight_anchor_selectors(f.pair, 0)[0].selector;
        let found = f.interpreter.resolve_selector(word(0x1000), selector).unwrap();
        assert_eq!(found, vec![word(0x1080)]);
    }

    #[test]
    fn test_anchor_inside_embedded_value() {
        let f = value_fixture();
        let pointers = f.interpreter.get_pointers(word(0x10c0), f.outer).unwrap();
        let first = pointers
            .iter()
            .find(|p| p.type_index == f.pair && p.field_number == 0)
            .unwrap();
        assert_eq!((first.value, first.position), (word(0x1040), 24));
        assert!(first.flags.contains(PointerFlags::IS_WEIGHT_ANCHOR));

        let references = f.interpreter.get_weighted_references_from_anchor(word(0x10c0), first).unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].child, word(0x1080));
        assert_eq!(references[0].parent, word(0x10c0));
        assert_eq!(references[0].weight, 3);
    }

    #[test]
    fn test_value_array_cut_between_fields() {
        let f = value_fixture();
        let pointers = f.interpreter.get_pointers(word(0x2000), f.pairs).unwrap();
        let read: Vec<(u64, u64)> = pointers.iter().map(|p| (p.value.value(), p.position)).collect();
        assert_eq!(read, vec![(0x1040, 24), (0x1080, 32), (0x1080, 40)]);
        assert!(pointers.iter().all(|p| p.type_index == f.pair));

        assert_eq!(children(&f, 0x2000, &pointers[0]), vec![0x1080]);
        assert!(children(&f, 0x2000, &pointers[2]).is_empty());
    }
}

// Fri Jan 16 2026 - Alex

use crate::heap::{PointerFlags, ARRAY_SENTINEL};
use crate::rules::{FieldSelector, Hop, Matcher, Rule, RuleKind, RuleLocation, Selector, ARRAY_HOP};
use crate::typesystem::TypeSystem;
use crate::utils::{WarningLog, BIND_PHASE};
use ahash::AHashMap;

type Slot = (i32, i32);

/// Selector whose targets are fused with the anchor object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionAnchor {
    pub selector: Selector,
    pub location: RuleLocation,
}

/// Selector whose targets are owned (or weakly held) with `weight`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightAnchor {
    pub selector: Selector,
    pub weight: i32,
    pub location: RuleLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAnchor {
    pub selector: Selector,
    pub tags: Vec<String>,
    pub location: RuleLocation,
}

#[derive(Debug, Clone, Copy)]
pub struct BindOptions {
    pub warn_unmatched_rules: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            warn_unmatched_rules: true,
        }
    }
}

/// Rules compiled against one type system, keyed by
/// `(type_index, field_number)`. Read-only once bound; rebinding builds a new
/// ruleset.
#[derive(Debug, Default)]
pub struct BoundRuleset {
    flags: AHashMap<Slot, PointerFlags>,
    locations: AHashMap<Slot, RuleLocation>,
    condition_anchors: AHashMap<Slot, Vec<ConditionAnchor>>,
    weight_anchors: AHashMap<Slot, Vec<WeightAnchor>>,
    tag_anchors: AHashMap<Slot, Vec<TagAnchor>>,
    zero_tags: AHashMap<Slot, Vec<String>>,
    nonzero_tags: AHashMap<Slot, Vec<String>>,
}

impl BoundRuleset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bind(type_system: &dyn TypeSystem, rules: &[&Rule], warnings: &WarningLog) -> Self {
        Self::bind_with_options(type_system, rules, warnings, BindOptions::default())
    }

    pub fn bind_with_options(
        type_system: &dyn TypeSystem,
        rules: &[&Rule],
        warnings: &WarningLog,
        options: BindOptions,
    ) -> Self {
        let mut bound = Self::default();
        let mut matched = vec![false; rules.len()];
        let mut matcher = Matcher::new(type_system, rules);

        for type_index in 0..type_system.number_of_types() {
            for index in matcher.rules_for_type(type_system, type_index) {
                let rule = rules[index];
                let hit = match rule.selector.field_pattern() {
                    Some(pattern) => bound.bind_pattern(type_system, type_index, rule, pattern, warnings),
                    None => {
                        bound.bind_path(type_system, type_index, rule, warnings);
                        true
                    }
                };
                matched[index] |= hit;
            }
        }

        if options.warn_unmatched_rules {
            for (rule, hit) in rules.iter().zip(&matched) {
                if !hit {
                    warnings.warn(BIND_PHASE, format!("{}: rule {} never matched any field", rule.location, rule));
                }
            }
        }

        log::debug!(
            "Bound {} rules: {} classified slots, {} anchors",
            rules.len(),
            bound.flags.len(),
            bound.condition_anchors.len() + bound.weight_anchors.len() + bound.tag_anchors.len()
        );
        bound
    }

    /// Single-field pattern rule on the declared fields of `type_index`.
    fn bind_pattern(
        &mut self,
        type_system: &dyn TypeSystem,
        type_index: i32,
        rule: &Rule,
        pattern: &str,
        warnings: &WarningLog,
    ) -> bool {
        let exact = !pattern.ends_with('*');
        let mut hit = false;
        for field in 0..type_system.number_of_fields(type_index) {
            if FieldSelector::matches_field(pattern, type_system.field_name(type_index, field)) {
                hit = true;
                self.classify_field(type_system, (type_index, field), rule, exact, warnings);
            }
        }
        hit
    }

    fn classify_field(
        &mut self,
        type_system: &dyn TypeSystem,
        slot: Slot,
        rule: &Rule,
        exact: bool,
        warnings: &WarningLog,
    ) {
        let value_field = type_system.is_value_type(type_system.field_type(slot.0, slot.1));
        let location = &rule.location;

        let flags = match &rule.kind {
            RuleKind::Owns { weight, .. } => PointerFlags::WEIGHTED.with_weight(*weight),
            RuleKind::Weak => PointerFlags::WEIGHTED.with_weight(-1),
            RuleKind::External => PointerFlags::IS_EXTERNAL_REFERENCE,
            RuleKind::TagCondition { tags, if_zero } => {
                let lists = if *if_zero { &mut self.zero_tags } else { &mut self.nonzero_tags };
                merge_tags(lists.entry(slot).or_default(), tags);
                if *if_zero {
                    PointerFlags::TAG_IF_ZERO
                } else {
                    PointerFlags::TAG_IF_NONZERO
                }
            }
            RuleKind::Tag { .. } | RuleKind::FuseWith if value_field => {
                // Prefix patterns sweep over scalar fields too; only an exact
                // name pointing at a value type is a mistake.
                if exact {
                    warnings.warn(
                        BIND_PHASE,
                        format!(
                            "{}: {} needs a reference field, {} is a value type",
                            location,
                            rule.kind.verb(),
                            type_system.describe_field(slot.0, slot.1)
                        ),
                    );
                }
                return;
            }
            RuleKind::Tag { tags, .. } => {
                self.tag_anchors.entry(slot).or_default().push(TagAnchor {
                    selector: Selector::new(vec![slot]),
                    tags: tags.clone(),
                    location: location.clone(),
                });
                PointerFlags::IS_TAG_ANCHOR
            }
            RuleKind::FuseWith => {
                self.condition_anchors.entry(slot).or_default().push(ConditionAnchor {
                    selector: Selector::new(vec![slot]),
                    location: location.clone(),
                });
                PointerFlags::IS_CONDITION_ANCHOR
            }
        };

        let flags = if value_field { flags | PointerFlags::UNTRACED } else { flags };
        self.merge_flags(slot, flags, location);
    }

    /// Multi-hop selector rule rooted at a declared field of `type_index`.
    fn bind_path(&mut self, type_system: &dyn TypeSystem, type_index: i32, rule: &Rule, warnings: &WarningLog) {
        let location = &rule.location;
        let warn = |message: String| {
            warnings.warn(BIND_PHASE, format!("{}: {} (selector '{}')", location, message, rule.selector));
        };

        let hops = rule.selector.hops();
        let first = match hops.first() {
            Some(Hop::Field(name)) => name,
            _ => {
                warn("selector must start with a field name".to_string());
                return;
            }
        };
        let anchor_field = match type_system.find_declared_field(type_index, first) {
            Some(field) => field,
            None => {
                warn(format!(
                    "field '{}' not found on {}",
                    first,
                    type_system.qualified_name(type_index)
                ));
                return;
            }
        };
        let anchor = (type_index, anchor_field);

        let selector = if rule.kind.is_dynamic() {
            let tail = hops[1..]
                .iter()
                .map(|hop| match hop {
                    Hop::Field(name) => name.clone(),
                    Hop::ArrayElements => ARRAY_HOP.to_string(),
                })
                .collect();
            Selector::new(vec![anchor]).with_dynamic_tail(tail)
        } else {
            let mut prefix = vec![anchor];
            let mut current = type_system.field_type(type_index, anchor_field);
            for hop in &hops[1..] {
                match hop {
                    Hop::ArrayElements => match type_system.element_type_index(current) {
                        Some(element) => {
                            prefix.push((current, ARRAY_SENTINEL));
                            current = element;
                        }
                        None => {
                            warn(format!("'[]' used on non-array type {}", type_system.qualified_name(current)));
                            return;
                        }
                    },
                    Hop::Field(name) => match type_system.find_field(current, name) {
                        Some((declaring, field)) => {
                            prefix.push((declaring, field));
                            current = type_system.field_type(declaring, field);
                        }
                        None => {
                            warn(format!(
                                "field '{}' not found on {}",
                                name,
                                type_system.qualified_name(current)
                            ));
                            return;
                        }
                    },
                }
            }
            if type_system.is_value_type(current) {
                warn(format!(
                    "selector ends on value type {}",
                    type_system.qualified_name(current)
                ));
                return;
            }
            Selector::new(prefix)
        };

        let flags = match &rule.kind {
            RuleKind::Owns { weight, .. } => {
                self.push_weight_anchor(anchor, selector, *weight, location);
                PointerFlags::IS_WEIGHT_ANCHOR
            }
            RuleKind::Weak => {
                self.push_weight_anchor(anchor, selector, -1, location);
                PointerFlags::IS_WEIGHT_ANCHOR
            }
            RuleKind::Tag { tags, .. } => {
                self.tag_anchors.entry(anchor).or_default().push(TagAnchor {
                    selector,
                    tags: tags.clone(),
                    location: location.clone(),
                });
                PointerFlags::IS_TAG_ANCHOR
            }
            RuleKind::FuseWith => {
                self.condition_anchors.entry(anchor).or_default().push(ConditionAnchor {
                    selector,
                    location: location.clone(),
                });
                PointerFlags::IS_CONDITION_ANCHOR
            }
            RuleKind::External | RuleKind::TagCondition { .. } => {
                warn(format!("{} applies to a single field", rule.kind.verb()));
                return;
            }
        };

        let anchor_type = type_system.field_type(type_index, anchor_field);
        let flags = if type_system.is_value_type(anchor_type) {
            flags | PointerFlags::UNTRACED
        } else {
            flags
        };
        self.merge_flags(anchor, flags, location);
    }

    fn push_weight_anchor(&mut self, anchor: Slot, selector: Selector, weight: i32, location: &RuleLocation) {
        self.weight_anchors.entry(anchor).or_default().push(WeightAnchor {
            selector,
            weight,
            location: location.clone(),
        });
    }

    /// Merges into the slot's flags. The recorded location follows whichever
    /// rule supplied the surviving weight.
    fn merge_flags(&mut self, slot: Slot, flags: PointerFlags, location: &RuleLocation) {
        let entry = self.flags.entry(slot).or_insert(PointerFlags::NONE);
        let previous = *entry;
        *entry = previous.combine_with(flags);
        if !self.locations.contains_key(&slot) || entry.weight() != previous.weight() {
            self.locations.insert(slot, location.clone());
        }
    }

    pub fn get_pointer_flags(&self, type_index: i32, field_number: i32) -> PointerFlags {
        self.flags
            .get(&(type_index, field_number))
            .copied()
            .unwrap_or(PointerFlags::NONE)
    }

    pub fn get_condition_anchor_selectors(&self, type_index: i32, field_number: i32) -> &[ConditionAnchor] {
        self.condition_anchors
            .get(&(type_index, field_number))
            .map_or(&[], Vec::as_slice)
    }

    pub fn get_weight_anchor_selectors(&self, type_index: i32, field_number: i32) -> &[WeightAnchor] {
        self.weight_anchors
            .get(&(type_index, field_number))
            .map_or(&[], Vec::as_slice)
    }

    pub fn get_tag_anchor_selectors(&self, type_index: i32, field_number: i32) -> &[TagAnchor] {
        self.tag_anchors
            .get(&(type_index, field_number))
            .map_or(&[], Vec::as_slice)
    }

    /// `(zero_tags, nonzero_tags)` of a tag-condition slot.
    pub fn get_tags(&self, type_index: i32, field_number: i32) -> (&[String], &[String]) {
        let slot = (type_index, field_number);
        (
            self.zero_tags.get(&slot).map_or(&[], Vec::as_slice),
            self.nonzero_tags.get(&slot).map_or(&[], Vec::as_slice),
        )
    }

    /// Provenance of the rule that set the slot's weight, or of the first
    /// rule that touched it.
    pub fn get_location(&self, type_index: i32, field_number: i32) -> Option<&RuleLocation> {
        self.locations.get(&(type_index, field_number))
    }

    /// Classified slots ordered by type index and field number.
    pub fn slots(&self) -> Vec<((i32, i32), PointerFlags)> {
        let mut slots: Vec<_> = self.flags.iter().map(|(&slot, &flags)| (slot, flags)).collect();
        slots.sort_unstable_by_key(|&(slot, _)| slot);
        slots
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

fn merge_tags(into: &mut Vec<String>, tags: &[String]) {
    for tag in tags {
        if !into.contains(tag) {
            into.push(tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NativeSize;
    use crate::rules::RuleGroupStore;
    use crate::typesystem::{DescribedTypeSystem, LayoutBuilder};
    use std::path::Path;

    struct Fixture {
        ts: DescribedTypeSystem,
        player: i32,
        holder: i32,
    }

    fn fixture() -> Fixture {
        let mut builder = LayoutBuilder::new(NativeSize::Eight, 16, 24);
        let object = builder.class("mscorlib", "System.Object", None, 16);
        let int64 = builder.value_type("mscorlib", "System.Int64", 8);
        let item = builder.class("Game", "Game.Item", Some(object), 16);
        let holder = builder.class("Game", "Game.Holder", Some(object), 24);
        builder.field(holder, "b", item, 0);
        let items = builder.array("Game", item);
        let player = builder.class("Game", "Game.Player", Some(object), 56);
        builder.field(player, "a", holder, 0);
        builder.field(player, "inventory", items, 8);
        builder.field(player, "m_cachedA", item, 16);
        builder.field(player, "m_cachedB", item, 24);
        builder.field(player, "handle", int64, 32);
        Fixture {
            ts: builder.build().unwrap(),
            player,
            holder,
        }
    }

    fn bind(ts: &DescribedTypeSystem, text: &str) -> (BoundRuleset, WarningLog) {
        let mut store = RuleGroupStore::new();
        store.load_str(Path::new("test.rcl"), text).unwrap();
        let warnings = WarningLog::new();
        let bound = store.bind_enabled(ts, &warnings);
        (bound, warnings)
    }

    #[test]
    fn test_owns_weights_merge_regardless_of_order() {
        let f = fixture();
        for text in [
            "\"Game.Player\" OWNS(4) \"m_cachedA\";\n\"Game.Player\" OWNS(8) \"m_cachedA\";\n",
            "\"Game.Player\" OWNS(8) \"m_cachedA\";\n\"Game.Player\" OWNS(4) \"m_cachedA\";\n",
        ] {
            let (bound, warnings) = bind(&f.ts, text);
            assert_eq!(bound.get_pointer_flags(f.player, 2).weight(), 8);
            assert!(warnings.is_empty());
        }

        let (bound, _) = bind(
            &f.ts,
            "\"Game.Player\" OWNS(4) \"m_cachedA\";\n\"Game.Player\" OWNS(8) \"m_cachedA\";\n",
        );
        assert_eq!(bound.get_location(f.player, 2).unwrap().to_string(), "test.rcl:2");
    }

    #[test]
    fn test_equal_weights_keep_first_rule() {
        let f = fixture();
        let (bound, _) = bind(
            &f.ts,
            "\"Game.Player\" OWNS(2) \"m_cachedA\";\n\"Game.Player\" OWNS(-2) \"m_cachedA\";\n",
        );
        assert_eq!(bound.get_pointer_flags(f.player, 2).weight(), 2);
        assert_eq!(bound.get_location(f.player, 2).unwrap().line, 1);
    }

    #[test]
    fn test_array_hop_on_non_array_warns_once() {
        let f = fixture();
        let (bound, warnings) = bind(
            &f.ts,
            "\"Game.Player\" FUSE_WITH \"a.b[]\";\n\"Game.Player\" OWNS \"a\";\n",
        );
        assert!(bound.get_condition_anchor_selectors(f.player, 0).is_empty());
        assert_eq!(bound.get_pointer_flags(f.player, 0).weight(), 1);
        assert!(!bound.get_pointer_flags(f.player, 0).contains(PointerFlags::IS_CONDITION_ANCHOR));

        let messages = warnings.warnings(BIND_PHASE);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("non-array"));
        assert!(messages[0].starts_with("test.rcl:1"));
    }

    #[test]
    fn test_tag_conditions() {
        let f = fixture();
        let (bound, _) = bind(&f.ts, "\"Game.Player\" TAG_IF_NONZERO(tag) \"m_cachedA\";\n");
        let (zero, nonzero) = bound.get_tags(f.player, 2);
        assert!(zero.is_empty());
        assert_eq!(nonzero, ["tag".to_string()]);

        let (bound, _) = bind(
            &f.ts,
            concat!(
                "\"Game.Player\" TAG_IF_ZERO(empty, idle) \"m_cachedB\";\n",
                "\"Game.Player\" TAG_IF_NONZERO(busy) \"m_cachedB\";\n",
                "\"Game.Player\" TAG_IF_ZERO(idle) \"m_cachedB\";\n",
            ),
        );
        let (zero, nonzero) = bound.get_tags(f.player, 3);
        assert_eq!(zero, ["empty".to_string(), "idle".to_string()]);
        assert_eq!(nonzero, ["busy".to_string()]);
        let flags = bound.get_pointer_flags(f.player, 3);
        assert!(flags.contains(PointerFlags::TAG_IF_ZERO | PointerFlags::TAG_IF_NONZERO));
    }

    #[test]
    fn test_prefix_pattern_and_value_fields() {
        let f = fixture();
        let (bound, warnings) = bind(
            &f.ts,
            "\"Game:Game.Player\" WEAK \"m_cached*\";\n\"Game.Player\" EXTERNAL \"handle\";\n",
        );
        assert_eq!(bound.get_pointer_flags(f.player, 2).weight(), -1);
        assert_eq!(bound.get_pointer_flags(f.player, 3).weight(), -1);
        assert!(bound.get_pointer_flags(f.player, 0).is_default());

        let handle = bound.get_pointer_flags(f.player, 4);
        assert!(handle.contains(PointerFlags::UNTRACED));
        assert!(handle.contains(PointerFlags::IS_EXTERNAL_REFERENCE));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_multi_hop_and_dynamic_selectors() {
        let f = fixture();
        let (bound, warnings) = bind(
            &f.ts,
            concat!(
                "\"Game.Player\" OWNS(3) \"a.b\";\n",
                "\"Game.Player\" TAG(loot) \"inventory[]\";\n",
                "\"Game.Player\" OWNS_DYNAMIC \"a.target.owner\";\n",
            ),
        );
        assert!(warnings.is_empty(), "{:?}", warnings.all());

        let weights = bound.get_weight_anchor_selectors(f.player, 0);
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].selector, Selector::new(vec![(f.player, 0), (f.holder, 0)]));
        assert_eq!(weights[0].weight, 3);
        assert_eq!(
            weights[1].selector.dynamic_tail,
            Some(vec!["target".to_string(), "owner".to_string()])
        );
        assert_eq!(weights[1].location.line, 3);

        let tags = bound.get_tag_anchor_selectors(f.player, 1);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].selector.static_prefix[1].1, ARRAY_SENTINEL);
        assert_eq!(tags[0].tags, vec!["loot".to_string()]);

        let flags = bound.get_pointer_flags(f.player, 0);
        assert!(flags.contains(PointerFlags::IS_WEIGHT_ANCHOR));
        assert_eq!(flags.weight(), 0);
    }

    #[test]
    fn test_unresolved_rules_warn_without_blocking_others() {
        let f = fixture();
        let (bound, warnings) = bind(
            &f.ts,
            concat!(
                "\"Game.Player\" WEAK \"missing\";\n",
                "\"Game.Player\" OWNS \"a.nothing\";\n",
                "\"Game.Player\" TAG(x) \"handle\";\n",
                "\"Game.Player\" OWNS \"m_cachedA\";\n",
            ),
        );
        let messages = warnings.warnings(BIND_PHASE);
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().any(|m| m.contains("never matched")));
        assert!(messages.iter().any(|m| m.contains("'nothing' not found")));
        assert!(messages.iter().any(|m| m.contains("value type")));
        assert_eq!(bound.get_pointer_flags(f.player, 2).weight(), 1);
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn test_selector_ending_on_value_type_is_dropped() {
        let mut builder = LayoutBuilder::new(NativeSize::Four, 8, 12);
        let int32 = builder.value_type("mscorlib", "System.Int32", 4);
        let node = builder.class("Game", "Game.Node", None, 16);
        builder.field(node, "next", node, 0);
        builder.field(node, "count", int32, 4);
        let ts = builder.build().unwrap();

        let (bound, warnings) = bind(&ts, "\"Game.Node\" FUSE_WITH \"next.count\";\n");
        assert!(bound.is_empty());
        assert_eq!(warnings.count(), 1);
    }
}

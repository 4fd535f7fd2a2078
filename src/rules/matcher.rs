// Fri Jan 16 2026 - Alex

use crate::rules::spec::{normalize_assembly, TypeNamePattern};
use crate::rules::Rule;
use crate::typesystem::TypeSystem;
use ahash::AHashMap;

/// Finds the rules whose type spec matches a type.
///
/// Exact-name rules are bucketed per normalized assembly the first time that
/// assembly is seen, then by type name. Regex rules are run once over every
/// type when the matcher is created.
pub struct Matcher<'a> {
    rules: &'a [&'a Rule],
    by_assembly: AHashMap<String, AHashMap<&'a str, Vec<usize>>>,
    regex_matches: AHashMap<i32, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    pub fn new(type_system: &dyn TypeSystem, rules: &'a [&'a Rule]) -> Self {
        let mut regex_matches: AHashMap<i32, Vec<usize>> = AHashMap::new();
        let regex_rules: Vec<usize> = (0..rules.len()).filter(|&i| rules[i].type_spec.is_regex()).collect();

        if !regex_rules.is_empty() {
            for type_index in 0..type_system.number_of_types() {
                let assembly = type_system.assembly(type_index);
                let name = type_system.qualified_name(type_index);
                for &index in &regex_rules {
                    if rules[index].type_spec.matches(assembly, name) {
                        regex_matches.entry(type_index).or_default().push(index);
                    }
                }
            }
            log::debug!(
                "{} regex rules matched {} types",
                regex_rules.len(),
                regex_matches.len()
            );
        }

        Self {
            rules,
            by_assembly: AHashMap::new(),
            regex_matches,
        }
    }

    fn bucket(&mut self, assembly: &str) -> &AHashMap<&'a str, Vec<usize>> {
        let key = normalize_assembly(assembly);
        let rules = self.rules;
        self.by_assembly.entry(key).or_insert_with_key(|key| {
            let mut names: AHashMap<&'a str, Vec<usize>> = AHashMap::new();
            for (index, rule) in rules.iter().enumerate() {
                let spec = &rule.type_spec;
                if let TypeNamePattern::Exact(name) = spec.name() {
                    if spec.assembly().map_or(true, |a| a == key.as_str()) {
                        names.entry(name.as_str()).or_default().push(index);
                    }
                }
            }
            names
        })
    }

    /// Indices of matching rules in registration order.
    pub fn rules_for_type(&mut self, type_system: &dyn TypeSystem, type_index: i32) -> Vec<usize> {
        let name = type_system.qualified_name(type_index);
        let mut matched: Vec<usize> = self
            .bucket(type_system.assembly(type_index))
            .get(name)
            .cloned()
            .unwrap_or_default();

        if let Some(regex) = self.regex_matches.get(&type_index) {
            matched.extend_from_slice(regex);
            matched.sort_unstable();
        }
        matched
    }

    pub fn cached_assemblies(&self) -> usize {
        self.by_assembly.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NativeSize;
    use crate::rules::RuleGroupStore;
    use crate::typesystem::LayoutBuilder;
    use std::path::Path;

    #[test]
    fn test_exact_and_regex_in_registration_order() {
        let mut builder = LayoutBuilder::new(NativeSize::Eight, 16, 24);
        let player = builder.class("Game.dll", "Game.Player", None, 32);
        let enemy = builder.class("Game", "Game.Enemy", None, 32);
        let other = builder.class("Engine", "Game.Player", None, 32);
        let ts = builder.build().unwrap();

        let mut store = RuleGroupStore::new();
        store
            .load_str(
                Path::new("m.rcl"),
                concat!(
                    "\"game:/Game[.].*/\" WEAK \"a\";\n",
                    "\"GAME.DLL:Game.Player\" OWNS \"b\";\n",
                    "\"Game.Player\" OWNS \"c\";\n",
                ),
            )
            .unwrap();
        let rules = store.rules_for(&store.enabled_group_names());
        let mut matcher = Matcher::new(&ts, &rules);

        assert_eq!(matcher.rules_for_type(&ts, player), vec![0, 1, 2]);
        assert_eq!(matcher.rules_for_type(&ts, enemy), vec![0]);
        assert_eq!(matcher.rules_for_type(&ts, other), vec![2]);
        assert_eq!(matcher.cached_assemblies(), 2);
    }
}

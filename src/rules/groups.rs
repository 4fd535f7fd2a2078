// Thu Jan 15 2026 - Alex

use crate::rules::parser::{FileSystemSource, ParsedRules, RuleParser, RuleSource};
use crate::rules::{BoundRuleset, Rule, RuleError};
use crate::typesystem::TypeSystem;
use crate::utils::WarningLog;
use indexmap::IndexMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RuleGroup {
    name: String,
    rules: Vec<Rule>,
    enabled: bool,
}

impl RuleGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Named rule groups in first-seen order. New groups start enabled.
#[derive(Debug, Clone, Default)]
pub struct RuleGroupStore {
    groups: IndexMap<String, RuleGroup>,
}

impl RuleGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>, RuleError> {
        self.load_from(&FileSystemSource, path.as_ref())
    }

    pub fn load_from(&mut self, source: &dyn RuleSource, path: &Path) -> Result<Vec<String>, RuleError> {
        let parsed = RuleParser::new(source).parse_file(path)?;
        Ok(self.add_parsed(parsed))
    }

    /// Loads rules from `text` as if read from `path`.
    pub fn load_str(&mut self, path: &Path, text: &str) -> Result<Vec<String>, RuleError> {
        let parsed = RuleParser::new(&FileSystemSource).parse_str(path, text)?;
        Ok(self.add_parsed(parsed))
    }

    /// Appends parsed rules, merging into groups that already exist.
    pub fn add_parsed(&mut self, parsed: ParsedRules) -> Vec<String> {
        let mut names = Vec::with_capacity(parsed.len());
        for (name, rules) in parsed {
            let group = self.groups.entry(name.clone()).or_insert_with(|| RuleGroup::new(&name));
            log::debug!("Group {}: {} rules", name, rules.len());
            group.rules.extend(rules);
            names.push(name);
        }
        names
    }

    pub fn groups(&self) -> impl Iterator<Item = &RuleGroup> {
        self.groups.values()
    }

    pub fn group(&self, name: &str) -> Option<&RuleGroup> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.values().map(|g| g.rules.len()).sum()
    }

    pub fn enable(&mut self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.groups.get_mut(name) {
            Some(group) => {
                group.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enables exactly the named groups. Returns names that do not exist.
    pub fn enable_only<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        let names: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
        for group in self.groups.values_mut() {
            group.enabled = names.contains(&group.name.as_str());
        }
        names
            .into_iter()
            .filter(|n| !self.groups.contains_key(*n))
            .map(str::to_string)
            .collect()
    }

    pub fn enabled_group_names(&self) -> Vec<String> {
        self.groups.values().filter(|g| g.enabled).map(|g| g.name.clone()).collect()
    }

    /// Rules of the named groups, in store order.
    pub fn rules_for<S: AsRef<str>>(&self, active: &[S]) -> Vec<&Rule> {
        let active: Vec<&str> = active.iter().map(|n| n.as_ref()).collect();
        self.groups
            .values()
            .filter(|g| active.contains(&g.name.as_str()))
            .flat_map(|g| g.rules.iter())
            .collect()
    }

    pub fn bind<S: AsRef<str>>(&self, type_system: &dyn TypeSystem, active: &[S], warnings: &WarningLog) -> BoundRuleset {
        let rules = self.rules_for(active);
        BoundRuleset::bind(type_system, &rules, warnings)
    }

    pub fn bind_enabled(&self, type_system: &dyn TypeSystem, warnings: &WarningLog) -> BoundRuleset {
        self.bind(type_system, &self.enabled_group_names(), warnings)
    }
}

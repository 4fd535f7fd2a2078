// Sat Jan 17 2026 - Alex

use crate::config::Config;
use crate::heap::{HeapInterpreter, HeapLayout, SegmentedHeap};
use crate::rules::{BindOptions, BoundRuleset, RuleError, RuleGroupStore};
use crate::typesystem::{PointerOffsetTable, TypeSystem};
use crate::utils::{ScopedTimer, WarningLog, BIND_PHASE};
use std::path::Path;
use std::sync::Arc;

/// One snapshot's type system with its rule groups. The bound ruleset and
/// the offset table are derived on demand and dropped whenever the rules or
/// the active groups change.
pub struct AnalysisSession {
    type_system: Arc<dyn TypeSystem>,
    groups: RuleGroupStore,
    warnings: Arc<WarningLog>,
    options: BindOptions,
    ruleset: Option<Arc<BoundRuleset>>,
    offsets: Option<Arc<PointerOffsetTable>>,
}

impl AnalysisSession {
    pub fn new(type_system: Arc<dyn TypeSystem>) -> Self {
        Self {
            type_system,
            groups: RuleGroupStore::new(),
            warnings: Arc::new(WarningLog::new()),
            options: BindOptions::default(),
            ruleset: None,
            offsets: None,
        }
    }

    /// Loads the configured rule files and applies the active group list.
    pub fn from_config(type_system: Arc<dyn TypeSystem>, config: &Config) -> Result<Self, RuleError> {
        let mut session = Self::new(type_system).with_bind_options(BindOptions {
            warn_unmatched_rules: config.warn_unmatched_rules,
        });
        for path in &config.rule_files {
            session.load_rule_file(path)?;
        }
        if !config.active_groups.is_empty() {
            for missing in session.enable_only(&config.active_groups) {
                session
                    .warnings
                    .warn("config", format!("active group '{}' is not defined by any rule file", missing));
            }
        }
        Ok(session)
    }

    pub fn with_bind_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn type_system(&self) -> &Arc<dyn TypeSystem> {
        &self.type_system
    }

    pub fn groups(&self) -> &RuleGroupStore {
        &self.groups
    }

    pub fn warnings(&self) -> &Arc<WarningLog> {
        &self.warnings
    }

    fn invalidate(&mut self) {
        self.ruleset = None;
        self.offsets = None;
    }

    pub fn load_rule_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<String>, RuleError> {
        let names = self.groups.load_file(path)?;
        self.invalidate();
        Ok(names)
    }

    pub fn load_rules_str(&mut self, path: &Path, text: &str) -> Result<Vec<String>, RuleError> {
        let names = self.groups.load_str(path, text)?;
        self.invalidate();
        Ok(names)
    }

    pub fn enable_group(&mut self, name: &str) -> bool {
        let found = self.groups.enable(name);
        if found {
            self.invalidate();
        }
        found
    }

    pub fn disable_group(&mut self, name: &str) -> bool {
        let found = self.groups.disable(name);
        if found {
            self.invalidate();
        }
        found
    }

    /// Enables exactly `names`; returns the ones no rule file defines.
    pub fn enable_only<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        self.invalidate();
        self.groups.enable_only(names)
    }

    pub fn is_bound(&self) -> bool {
        self.ruleset.is_some()
    }

    /// Ruleset of the enabled groups, binding it first if needed. Warnings
    /// of a previous bind are cleared before rebinding.
    pub fn ruleset(&mut self) -> Arc<BoundRuleset> {
        if let Some(ruleset) = &self.ruleset {
            return ruleset.clone();
        }

        let _timer = ScopedTimer::new("bind");
        self.warnings.reset_phase(BIND_PHASE);
        let active = self.groups.enabled_group_names();
        let rules = self.groups.rules_for(&active);
        let ruleset = Arc::new(BoundRuleset::bind_with_options(
            self.type_system.as_ref(),
            &rules,
            &self.warnings,
            self.options,
        ));
        log::info!(
            "Bound {} rules from {} groups into {} slots",
            rules.len(),
            active.len(),
            ruleset.len()
        );
        self.ruleset = Some(ruleset.clone());
        ruleset
    }

    pub fn offsets(&mut self) -> Arc<PointerOffsetTable> {
        if let Some(offsets) = &self.offsets {
            return offsets.clone();
        }
        let ruleset = self.ruleset();
        let offsets = Arc::new(PointerOffsetTable::new(self.type_system.clone(), ruleset));
        self.offsets = Some(offsets.clone());
        offsets
    }

    pub fn interpreter(&mut self, heap: Arc<SegmentedHeap>, layout: Arc<dyn HeapLayout>) -> HeapInterpreter {
        HeapInterpreter::new(heap, layout, self.offsets())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NativeSize;
    use crate::typesystem::LayoutBuilder;

    fn session() -> AnalysisSession {
        let mut builder = LayoutBuilder::new(NativeSize::Eight, 16, 24);
        let object = builder.class("mscorlib", "System.Object", None, 16);
        let player = builder.class("Game", "Game.Player", Some(object), 32);
        builder.field(player, "target", object, 0);
        let mut session = AnalysisSession::new(Arc::new(builder.build().unwrap()));
        session
            .load_rules_str(
                Path::new("s.rcl"),
                "\"Game.Player\" OWNS \"target\";\n#debug\n\"Game.Player\" WEAK \"missing\";\n",
            )
            .unwrap();
        session
    }

    #[test]
    fn test_ruleset_is_cached_until_groups_change() {
        let mut session = session();
        let first = session.ruleset();
        assert!(Arc::ptr_eq(&first, &session.ruleset()));
        assert_eq!(session.warnings().warnings(BIND_PHASE).len(), 1);

        assert!(session.disable_group("debug"));
        assert!(!session.is_bound());
        let second = session.ruleset();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(session.warnings().warnings(BIND_PHASE).is_empty());
        assert_eq!(second.get_pointer_flags(1, 0).weight(), 1);
    }

    #[test]
    fn test_offsets_follow_ruleset() {
        let mut session = session();
        let offsets = session.offsets();
        assert!(Arc::ptr_eq(offsets.ruleset(), &session.ruleset()));
        session.enable_only(&["debug"]);
        let rebuilt = session.offsets();
        assert!(!Arc::ptr_eq(&offsets, &rebuilt));
        assert!(rebuilt.ruleset().get_pointer_flags(1, 0).is_default());
    }

    #[test]
    fn test_from_config_reports_unknown_groups() {
        let mut builder = LayoutBuilder::new(NativeSize::Four, 8, 12);
        builder.class("mscorlib", "System.Object", None, 8);
        let config = Config::new().with_active_groups(vec!["nope".to_string()]);
        let session = AnalysisSession::from_config(Arc::new(builder.build().unwrap()), &config).unwrap();
        assert_eq!(session.warnings().warnings("config").len(), 1);
    }
}

// Fri Jan 16 2026 - Alex

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;

pub const BIND_PHASE: &str = "bind";

/// Session-wide warnings, deduplicated per phase. A phase that is rerun
/// (for instance rebinding after the active groups changed) resets its own
/// entries first.
#[derive(Debug, Default)]
pub struct WarningLog {
    phases: Mutex<IndexMap<String, IndexSet<String>>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning; returns `false` if the phase already saw it.
    pub fn warn(&self, phase: &str, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut phases = self.phases.lock();
        let entries = phases.entry(phase.to_string()).or_default();
        if entries.contains(&message) {
            return false;
        }
        log::warn!("[{}] {}", phase, message);
        entries.insert(message);
        true
    }

    pub fn reset_phase(&self, phase: &str) {
        self.phases.lock().shift_remove(phase);
    }

    pub fn warnings(&self, phase: &str) -> Vec<String> {
        self.phases
            .lock()
            .get(phase)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<(String, String)> {
        self.phases
            .lock()
            .iter()
            .flat_map(|(phase, entries)| entries.iter().map(move |m| (phase.clone(), m.clone())))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.phases.lock().values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplicates_within_phase() {
        let log = WarningLog::new();
        assert!(log.warn(BIND_PHASE, "field 'x' not found"));
        assert!(!log.warn(BIND_PHASE, "field 'x' not found"));
        assert!(log.warn("walk", "field 'x' not found"));
        assert_eq!(log.count(), 2);
        assert_eq!(log.warnings(BIND_PHASE).len(), 1);
    }

    #[test]
    fn test_reset_phase() {
        let log = WarningLog::new();
        log.warn(BIND_PHASE, "a");
        log.warn("walk", "b");
        log.reset_phase(BIND_PHASE);
        assert!(log.warnings(BIND_PHASE).is_empty());
        assert_eq!(log.all(), vec![("walk".to_string(), "b".to_string())]);
        assert!(log.warn(BIND_PHASE, "a"));
    }
}

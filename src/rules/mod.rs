// Tue Jan 13 2026 - Alex

pub mod bound;
pub mod error;
pub mod groups;
pub mod matcher;
pub mod parser;
pub mod rule;
pub mod selector;
pub mod spec;
pub mod tokenizer;

pub use bound::{BindOptions, BoundRuleset, ConditionAnchor, TagAnchor, WeightAnchor};
pub use error::RuleError;
pub use groups::{RuleGroup, RuleGroupStore};
pub use matcher::Matcher;
pub use parser::{FileSystemSource, ParsedRules, RuleParser, RuleSource};
pub use rule::{Rule, RuleKind, RuleLocation, RuleVerb, ANONYMOUS_GROUP};
pub use selector::{FieldSelector, Hop, Selector, ARRAY_HOP};
pub use spec::{normalize_assembly, RegexCache, TypeNamePattern, TypeSpec};

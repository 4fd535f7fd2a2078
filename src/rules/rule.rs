// Wed Jan 14 2026 - Alex

use crate::rules::{FieldSelector, TypeSpec};
use std::fmt;

pub const ANONYMOUS_GROUP: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleVerb {
    Owns,
    OwnsDynamic,
    Weak,
    External,
    Tag,
    TagDynamic,
    TagIfZero,
    TagIfNonzero,
    FuseWith,
}

impl RuleVerb {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "OWNS" => Some(Self::Owns),
            "OWNS_DYNAMIC" => Some(Self::OwnsDynamic),
            "WEAK" => Some(Self::Weak),
            "EXTERNAL" => Some(Self::External),
            "TAG" => Some(Self::Tag),
            "TAG_DYNAMIC" => Some(Self::TagDynamic),
            "TAG_IF_ZERO" => Some(Self::TagIfZero),
            "TAG_IF_NONZERO" => Some(Self::TagIfNonzero),
            "FUSE_WITH" => Some(Self::FuseWith),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Owns => "OWNS",
            Self::OwnsDynamic => "OWNS_DYNAMIC",
            Self::Weak => "WEAK",
            Self::External => "EXTERNAL",
            Self::Tag => "TAG",
            Self::TagDynamic => "TAG_DYNAMIC",
            Self::TagIfZero => "TAG_IF_ZERO",
            Self::TagIfNonzero => "TAG_IF_NONZERO",
            Self::FuseWith => "FUSE_WITH",
        }
    }
}

impl fmt::Display for RuleVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    Owns { weight: i32, dynamic: bool },
    Weak,
    External,
    Tag { tags: Vec<String>, dynamic: bool },
    TagCondition { tags: Vec<String>, if_zero: bool },
    FuseWith,
}

impl RuleKind {
    pub fn verb(&self) -> RuleVerb {
        match self {
            Self::Owns { dynamic: false, .. } => RuleVerb::Owns,
            Self::Owns { dynamic: true, .. } => RuleVerb::OwnsDynamic,
            Self::Weak => RuleVerb::Weak,
            Self::External => RuleVerb::External,
            Self::Tag { dynamic: false, .. } => RuleVerb::Tag,
            Self::Tag { dynamic: true, .. } => RuleVerb::TagDynamic,
            Self::TagCondition { if_zero: true, .. } => RuleVerb::TagIfZero,
            Self::TagCondition { if_zero: false, .. } => RuleVerb::TagIfNonzero,
            Self::FuseWith => RuleVerb::FuseWith,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Owns { dynamic: true, .. } | Self::Tag { dynamic: true, .. })
    }

    /// Kinds that only classify the matched field itself.
    pub fn requires_single_field(&self) -> bool {
        matches!(self, Self::External | Self::TagCondition { .. })
    }
}

/// Where a rule was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleLocation {
    pub file: String,
    pub line: usize,
}

impl RuleLocation {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for RuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub type_spec: TypeSpec,
    pub kind: RuleKind,
    pub selector: FieldSelector,
    pub location: RuleLocation,
    pub group: String,
}

impl Rule {
    pub fn new(type_spec: TypeSpec, kind: RuleKind, selector: FieldSelector, location: RuleLocation, group: &str) -> Self {
        Self {
            type_spec,
            kind,
            selector,
            location,
            group: group.to_string(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.type_spec, self.kind.verb())?;
        match &self.kind {
            RuleKind::Owns { weight, .. } if *weight != 1 => write!(f, "({})", weight)?,
            RuleKind::Tag { tags, .. } | RuleKind::TagCondition { tags, .. } => write!(f, "({})", tags.join(", "))?,
            _ => {}
        }
        write!(f, " \"{}\";", self.selector)
    }
}

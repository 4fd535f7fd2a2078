// Wed Jan 14 2026 - Alex

use crate::heap::ARRAY_SENTINEL;
use crate::typesystem::TypeSystem;
use std::fmt;

pub const ARRAY_HOP: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hop {
    Field(String),
    ArrayElements,
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::ArrayElements => write!(f, "{}", ARRAY_HOP),
        }
    }
}

/// Field path as written in a rule: `a.b[].c`, or a single field pattern
/// that may end in `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelector {
    hops: Vec<Hop>,
}

impl FieldSelector {
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty field selector".to_string());
        }

        let mut hops = Vec::new();
        for part in text.split('.') {
            let mut name = part.trim();
            let mut arrays = 0;
            while let Some(stripped) = name.strip_suffix(ARRAY_HOP) {
                name = stripped;
                arrays += 1;
            }
            if name.is_empty() && arrays == 0 {
                return Err(format!("empty hop in selector '{}'", text));
            }
            if name.contains(['[', ']']) {
                return Err(format!("malformed array hop in selector '{}'", text));
            }
            if !name.is_empty() {
                hops.push(Hop::Field(name.to_string()));
            }
            hops.extend(std::iter::repeat(Hop::ArrayElements).take(arrays));
        }

        let wildcard = hops
            .iter()
            .position(|hop| matches!(hop, Hop::Field(name) if name.contains('*')));
        if let Some(index) = wildcard {
            let single_prefix = hops.len() == 1
                && matches!(&hops[0], Hop::Field(name) if name.find('*') == Some(name.len() - 1));
            if !single_prefix || index != 0 {
                return Err(format!(
                    "'*' is only allowed at the end of a single field pattern, found in '{}'",
                    text
                ));
            }
        }

        Ok(Self { hops })
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn is_single_field(&self) -> bool {
        self.hops.len() == 1 && matches!(self.hops[0], Hop::Field(_))
    }

    /// Field name pattern of a single-hop selector.
    pub fn field_pattern(&self) -> Option<&str> {
        match self.hops.as_slice() {
            [Hop::Field(name)] => Some(name),
            _ => None,
        }
    }

    /// Exact match, or prefix match when the pattern ends in `*`.
    pub fn matches_field(pattern: &str, field_name: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => field_name.starts_with(prefix),
            None => pattern == field_name,
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            match hop {
                Hop::Field(name) if i > 0 => write!(f, ".{}", name)?,
                hop => write!(f, "{}", hop)?,
            }
        }
        Ok(())
    }
}

/// Concrete field path bound against a type system. Hops are
/// `(type_index, field_number)` pairs where the field number may be
/// [`ARRAY_SENTINEL`]; the optional dynamic tail is resolved against runtime
/// types while walking the heap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub static_prefix: Vec<(i32, i32)>,
    pub dynamic_tail: Option<Vec<String>>,
}

impl Selector {
    pub fn new(static_prefix: Vec<(i32, i32)>) -> Self {
        Self {
            static_prefix,
            dynamic_tail: None,
        }
    }

    pub fn with_dynamic_tail(mut self, tail: Vec<String>) -> Self {
        self.dynamic_tail = if tail.is_empty() { None } else { Some(tail) };
        self
    }

    pub fn anchor(&self) -> Option<(i32, i32)> {
        self.static_prefix.first().copied()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic_tail.is_some()
    }

    pub fn describe(&self, type_system: &dyn TypeSystem) -> String {
        let mut out = String::new();
        for (i, &(type_index, field_number)) in self.static_prefix.iter().enumerate() {
            if field_number == ARRAY_SENTINEL {
                out.push_str(ARRAY_HOP);
                continue;
            }
            if i == 0 {
                out.push_str(type_system.qualified_name(type_index));
            }
            out.push('.');
            out.push_str(type_system.field_name(type_index, field_number));
        }
        if let Some(tail) = &self.dynamic_tail {
            for name in tail {
                if name == ARRAY_HOP {
                    out.push_str(ARRAY_HOP);
                } else {
                    out.push_str(" ~> ");
                    out.push_str(name);
                }
            }
        }
        out
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hops: Vec<String> = self
            .static_prefix
            .iter()
            .map(|&(type_index, field)| {
                if field == ARRAY_SENTINEL {
                    format!("{}:{}", type_index, ARRAY_HOP)
                } else {
                    format!("{}:{}", type_index, field)
                }
            })
            .collect();
        write!(f, "{}", hops.join("/"))?;
        if let Some(tail) = &self.dynamic_tail {
            write!(f, " ~> {}", tail.join("."))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_hop() {
        let selector = FieldSelector::parse("items.entries[].value").unwrap();
        assert_eq!(
            selector.hops(),
            &[
                Hop::Field("items".into()),
                Hop::Field("entries".into()),
                Hop::ArrayElements,
                Hop::Field("value".into()),
            ]
        );
        assert_eq!(selector.to_string(), "items.entries[].value");
        assert!(!selector.is_single_field());
    }

    #[test]
    fn test_parse_nested_arrays() {
        let selector = FieldSelector::parse("grid[][]").unwrap();
        assert_eq!(selector.hops().len(), 3);
        assert_eq!(selector.to_string(), "grid[][]");
    }

    #[test]
    fn test_prefix_pattern_only_in_single_hop() {
        let selector = FieldSelector::parse("m_cached*").unwrap();
        assert_eq!(selector.field_pattern(), Some("m_cached*"));
        assert!(FieldSelector::matches_field("m_cached*", "m_cachedRenderer"));
        assert!(!FieldSelector::matches_field("m_cached", "m_cachedRenderer"));
        assert!(FieldSelector::parse("a.b*").is_err());
        assert!(FieldSelector::parse("m_*x").is_err());
    }

    #[test]
    fn test_rejects_malformed_selectors() {
        assert!(FieldSelector::parse("").is_err());
        assert!(FieldSelector::parse("a..b").is_err());
        assert!(FieldSelector::parse("a[0]").is_err());
    }

    #[test]
    fn test_dynamic_tail() {
        let selector = Selector::new(vec![(3, 1)]).with_dynamic_tail(vec!["target".into()]);
        assert!(selector.is_dynamic());
        assert_eq!(selector.anchor(), Some((3, 1)));
        assert_eq!(selector.to_string(), "3:1 ~> target");
        assert!(!Selector::new(vec![(3, 1)]).with_dynamic_tail(Vec::new()).is_dynamic());
    }
}

// Tue Jan 13 2026 - Alex

use ahash::AHashMap;
use regex::Regex;
use std::fmt;

/// Name part of a type spec.
#[derive(Debug, Clone)]
pub enum TypeNamePattern {
    Exact(String),
    /// Matched against the whole qualified type name.
    Regex(Regex),
}

/// `assembly:type` or `assembly:/regex/`. Without an assembly part the spec
/// applies to types of every assembly.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    text: String,
    assembly: Option<String>,
    name: TypeNamePattern,
}

impl TypeSpec {
    pub fn parse(text: &str, regexes: &mut RegexCache) -> Result<Self, String> {
        let (assembly, name) = match text.split_once(':') {
            Some((assembly, name)) => (Some(assembly.trim()), name.trim()),
            None => (None, text.trim()),
        };
        let assembly = match assembly {
            Some("") | None => None,
            Some(assembly) => Some(normalize_assembly(assembly)),
        };
        if name.is_empty() {
            return Err(format!("type spec '{}' has no type name", text));
        }

        let name = if name.len() >= 2 && name.starts_with('/') && name.ends_with('/') {
            TypeNamePattern::Regex(regexes.get(&name[1..name.len() - 1])?)
        } else {
            TypeNamePattern::Exact(name.to_string())
        };

        Ok(Self {
            text: text.to_string(),
            assembly,
            name,
        })
    }

    pub fn exact(assembly: &str, type_name: &str) -> Self {
        let assembly = if assembly.is_empty() { None } else { Some(normalize_assembly(assembly)) };
        Self {
            text: format!("{}:{}", assembly.as_deref().unwrap_or(""), type_name),
            assembly,
            name: TypeNamePattern::Exact(type_name.to_string()),
        }
    }

    /// Normalized assembly name, `None` for any assembly.
    pub fn assembly(&self) -> Option<&str> {
        self.assembly.as_deref()
    }

    pub fn name(&self) -> &TypeNamePattern {
        &self.name
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.name, TypeNamePattern::Regex(_))
    }

    pub fn matches_assembly(&self, assembly: &str) -> bool {
        match &self.assembly {
            Some(expected) => *expected == normalize_assembly(assembly),
            None => true,
        }
    }

    pub fn matches(&self, assembly: &str, qualified_name: &str) -> bool {
        if !self.matches_assembly(assembly) {
            return false;
        }
        match &self.name {
            TypeNamePattern::Exact(name) => name == qualified_name,
            TypeNamePattern::Regex(regex) => regex.is_match(qualified_name),
        }
    }
}

impl PartialEq for TypeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for TypeSpec {}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Case-insensitive, `.dll` suffix stripped.
pub fn normalize_assembly(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_suffix(".dll") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Compiled type-name patterns keyed by pattern text.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: AHashMap<String, Regex>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, pattern: &str) -> Result<Regex, String> {
        if let Some(regex) = self.compiled.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| format!("invalid type name regex '{}': {}", pattern, e))?;
        self.compiled.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembly_normalization() {
        assert_eq!(normalize_assembly("UnityEngine.CoreModule.DLL"), "unityengine.coremodule");
        assert_eq!(normalize_assembly("mscorlib"), "mscorlib");
        let spec = TypeSpec::exact("Assembly-CSharp.dll", "Game.Player");
        assert!(spec.matches("assembly-csharp", "Game.Player"));
        assert!(spec.matches("ASSEMBLY-CSHARP.dll", "Game.Player"));
        assert!(!spec.matches("assembly-csharp", "game.player"));
    }

    #[test]
    fn test_parse_exact_and_any_assembly() {
        let mut cache = RegexCache::new();
        let spec = TypeSpec::parse("mscorlib:System.String", &mut cache).unwrap();
        assert_eq!(spec.assembly(), Some("mscorlib"));
        assert!(!spec.is_regex());

        let any = TypeSpec::parse("System.String", &mut cache).unwrap();
        assert_eq!(any.assembly(), None);
        assert!(any.matches("whatever", "System.String"));
        assert!(TypeSpec::parse("mscorlib:", &mut cache).is_err());
    }

    #[test]
    fn test_regex_spec_is_anchored_and_cached() {
        let mut cache = RegexCache::new();
        let spec = TypeSpec::parse("Game:/Game\\.Pool<.*>/", &mut cache).unwrap();
        assert!(spec.is_regex());
        assert!(spec.matches("Game.dll", "Game.Pool<Bullet>"));
        assert!(!spec.matches("Game", "Other.Game.Pool<Bullet>"));

        TypeSpec::parse("Other:/Game\\.Pool<.*>/", &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(TypeSpec::parse("Game:/(/", &mut cache).is_err());
    }
}

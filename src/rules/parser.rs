// Thu Jan 15 2026 - Alex

use crate::rules::tokenizer::{tokenize, Token, TokenKind};
use crate::rules::{
    FieldSelector, RegexCache, Rule, RuleError, RuleKind, RuleLocation, RuleVerb, TypeSpec, ANONYMOUS_GROUP,
};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Where rule files come from. Imports are resolved through the same source.
pub trait RuleSource {
    fn read(&self, path: &Path) -> std::io::Result<String>;
}

pub struct FileSystemSource;

impl RuleSource for FileSystemSource {
    fn read(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Rules grouped by (possibly composed) group name, in first-seen order.
pub type ParsedRules = IndexMap<String, Vec<Rule>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Argument {
    Integer(i64),
    Text(String),
}

enum ParseState {
    TopLevel,
    ExpectImportPath { line: usize },
    AfterTypeSpec { spec: TypeSpec, line: usize },
    AfterVerb { spec: TypeSpec, verb: RuleVerb, line: usize },
    InArguments { spec: TypeSpec, verb: RuleVerb, args: Vec<Argument>, expect_value: bool, line: usize },
    ExpectSelector { spec: TypeSpec, verb: RuleVerb, args: Vec<Argument>, line: usize },
    ExpectTerminator { rule: Rule },
}

pub struct RuleParser<'a> {
    source: &'a dyn RuleSource,
    regexes: RegexCache,
    import_stack: Vec<PathBuf>,
}

impl<'a> RuleParser<'a> {
    pub fn new(source: &'a dyn RuleSource) -> Self {
        Self {
            source,
            regexes: RegexCache::new(),
            import_stack: Vec::new(),
        }
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<ParsedRules, RuleError> {
        let mut parsed = ParsedRules::new();
        self.parse_file_into(path, None, &mut parsed)?;
        Ok(parsed)
    }

    /// Parses `text` as if it were the file `path`; imports resolve relative
    /// to its directory.
    pub fn parse_str(&mut self, path: &Path, text: &str) -> Result<ParsedRules, RuleError> {
        let mut parsed = ParsedRules::new();
        self.import_stack.push(path.to_path_buf());
        let result = self.parse_text(path, text, None, &mut parsed);
        self.import_stack.pop();
        result.map(|_| parsed)
    }

    fn parse_file_into(&mut self, path: &Path, prefix: Option<&str>, out: &mut ParsedRules) -> Result<(), RuleError> {
        let text = self.source.read(path).map_err(|source| RuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Parsing rule file {}", path.display());
        self.import_stack.push(path.to_path_buf());
        let result = self.parse_text(path, &text, prefix, out);
        self.import_stack.pop();
        result
    }

    fn parse_text(&mut self, path: &Path, text: &str, prefix: Option<&str>, out: &mut ParsedRules) -> Result<(), RuleError> {
        let file = path.display().to_string();
        let tokens = tokenize(&file, text)?;
        let mut group = prefix.unwrap_or(ANONYMOUS_GROUP).to_string();
        let mut state = ParseState::TopLevel;

        for Token { kind, line } in tokens {
            state = match (state, kind) {
                (ParseState::TopLevel, TokenKind::GroupHeader(name)) => {
                    group = compose_group(prefix, &name);
                    out.entry(group.clone()).or_default();
                    ParseState::TopLevel
                }
                (ParseState::TopLevel, TokenKind::Identifier(ident)) if ident == "IMPORT" => {
                    ParseState::ExpectImportPath { line }
                }
                (ParseState::TopLevel, TokenKind::String(text)) => {
                    let spec = TypeSpec::parse(&text, &mut self.regexes).map_err(|e| RuleError::parse(&file, line, e))?;
                    ParseState::AfterTypeSpec { spec, line }
                }
                (ParseState::ExpectImportPath { .. }, TokenKind::String(import)) => {
                    self.import(path, &import, &group, line, out)?;
                    ParseState::TopLevel
                }
                (ParseState::AfterTypeSpec { spec, line: start }, TokenKind::Identifier(keyword)) => {
                    let verb = RuleVerb::from_keyword(&keyword)
                        .ok_or_else(|| RuleError::parse(&file, line, format!("unknown rule keyword '{}'", keyword)))?;
                    ParseState::AfterVerb { spec, verb, line: start }
                }
                (ParseState::AfterVerb { spec, verb, line }, TokenKind::LParen) => ParseState::InArguments {
                    spec,
                    verb,
                    args: Vec::new(),
                    expect_value: true,
                    line,
                },
                (ParseState::AfterVerb { spec, verb, line: start }, TokenKind::String(selector)) => {
                    let rule = self.build_rule(&file, spec, verb, Vec::new(), &selector, start, &group)?;
                    ParseState::ExpectTerminator { rule }
                }
                (ParseState::InArguments { spec, verb, mut args, expect_value: true, line }, TokenKind::Integer(value)) => {
                    args.push(Argument::Integer(value));
                    ParseState::InArguments { spec, verb, args, expect_value: false, line }
                }
                (
                    ParseState::InArguments { spec, verb, mut args, expect_value: true, line },
                    TokenKind::String(text) | TokenKind::Identifier(text),
                ) => {
                    args.push(Argument::Text(text));
                    ParseState::InArguments { spec, verb, args, expect_value: false, line }
                }
                (ParseState::InArguments { spec, verb, args, expect_value: false, line }, TokenKind::Comma) => {
                    ParseState::InArguments { spec, verb, args, expect_value: true, line }
                }
                (ParseState::InArguments { spec, verb, args, expect_value, line }, TokenKind::RParen)
                    if !expect_value || args.is_empty() =>
                {
                    ParseState::ExpectSelector { spec, verb, args, line }
                }
                (ParseState::ExpectSelector { spec, verb, args, line: start }, TokenKind::String(selector)) => {
                    let rule = self.build_rule(&file, spec, verb, args, &selector, start, &group)?;
                    ParseState::ExpectTerminator { rule }
                }
                (ParseState::ExpectTerminator { rule }, TokenKind::Semicolon) => {
                    out.entry(rule.group.clone()).or_default().push(rule);
                    ParseState::TopLevel
                }
                (_, unexpected) => {
                    return Err(RuleError::parse(&file, line, format!("unexpected {}", unexpected)));
                }
            };
        }

        match state {
            ParseState::TopLevel => Ok(()),
            ParseState::ExpectImportPath { line } => Err(RuleError::parse(&file, line, "IMPORT without a file name")),
            ParseState::AfterTypeSpec { line, .. }
            | ParseState::AfterVerb { line, .. }
            | ParseState::InArguments { line, .. }
            | ParseState::ExpectSelector { line, .. } => Err(RuleError::parse(&file, line, "unterminated rule")),
            ParseState::ExpectTerminator { rule } => {
                Err(RuleError::parse(&file, rule.location.line, "unterminated rule, expected ';'"))
            }
        }
    }

    fn import(&mut self, path: &Path, import: &str, group: &str, line: usize, out: &mut ParsedRules) -> Result<(), RuleError> {
        let target = match path.parent() {
            Some(dir) => dir.join(import),
            None => PathBuf::from(import),
        };
        if self.import_stack.iter().any(|p| p == &target) {
            return Err(RuleError::ImportCycle {
                file: path.display().to_string(),
                line,
                path: target.display().to_string(),
            });
        }
        let prefix = if group == ANONYMOUS_GROUP { None } else { Some(group) };
        self.parse_file_into(&target, prefix, out)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_rule(
        &self,
        file: &str,
        spec: TypeSpec,
        verb: RuleVerb,
        args: Vec<Argument>,
        selector: &str,
        line: usize,
        group: &str,
    ) -> Result<Rule, RuleError> {
        let selector = FieldSelector::parse(selector).map_err(|e| RuleError::parse(file, line, e))?;
        let kind = match verb {
            RuleVerb::Owns | RuleVerb::OwnsDynamic => {
                let weight = match args.as_slice() {
                    [] => 1,
                    [Argument::Integer(weight)] => i32::try_from(*weight)
                        .map_err(|_| RuleError::parse(file, line, format!("{} weight {} is out of range", verb, weight)))?,
                    _ => return Err(RuleError::parse(file, line, format!("{} takes one integer weight", verb))),
                };
                RuleKind::Owns {
                    weight,
                    dynamic: verb == RuleVerb::OwnsDynamic,
                }
            }
            RuleVerb::Weak | RuleVerb::External | RuleVerb::FuseWith => {
                if !args.is_empty() {
                    return Err(RuleError::parse(file, line, format!("{} takes no arguments", verb)));
                }
                match verb {
                    RuleVerb::Weak => RuleKind::Weak,
                    RuleVerb::External => RuleKind::External,
                    _ => RuleKind::FuseWith,
                }
            }
            RuleVerb::Tag | RuleVerb::TagDynamic | RuleVerb::TagIfZero | RuleVerb::TagIfNonzero => {
                let tags = tag_list(&args).ok_or_else(|| RuleError::parse(file, line, format!("{} takes a list of tags", verb)))?;
                match verb {
                    RuleVerb::Tag | RuleVerb::TagDynamic => RuleKind::Tag {
                        tags,
                        dynamic: verb == RuleVerb::TagDynamic,
                    },
                    _ => RuleKind::TagCondition {
                        tags,
                        if_zero: verb == RuleVerb::TagIfZero,
                    },
                }
            }
        };

        if kind.requires_single_field() && !selector.is_single_field() {
            return Err(RuleError::parse(
                file,
                line,
                format!("{} applies to a single field, not '{}'", verb, selector),
            ));
        }

        Ok(Rule::new(spec, kind, selector, RuleLocation::new(file, line), group))
    }
}

fn tag_list(args: &[Argument]) -> Option<Vec<String>> {
    if args.is_empty() {
        return None;
    }
    args.iter()
        .map(|arg| match arg {
            Argument::Text(tag) if !tag.is_empty() => Some(tag.clone()),
            _ => None,
        })
        .collect()
}

fn compose_group(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}

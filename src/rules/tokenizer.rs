// Thu Jan 15 2026 - Alex

use crate::rules::RuleError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `#name` up to the end of the line.
    GroupHeader(String),
    String(String),
    Identifier(String),
    Integer(i64),
    LParen,
    RParen,
    Comma,
    Semicolon,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupHeader(name) => write!(f, "group header '#{}'", name),
            Self::String(s) => write!(f, "string \"{}\"", s),
            Self::Identifier(ident) => write!(f, "'{}'", ident),
            Self::Integer(value) => write!(f, "integer {}", value),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
            Self::Semicolon => write!(f, "';'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize) -> Self {
        Self { kind, line }
    }
}

pub fn tokenize(file: &str, source: &str) -> Result<Vec<Token>, RuleError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                line += 1;
            }

            '/' => {
                chars.next();
                if chars.peek() != Some(&'/') {
                    return Err(RuleError::parse(file, line, "unexpected '/'"));
                }
                while chars.peek().is_some_and(|&ch| ch != '\n') {
                    chars.next();
                }
            }

            '#' => {
                chars.next();
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '\n' {
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(RuleError::parse(file, line, "group header without a name"));
                }
                tokens.push(Token::new(TokenKind::GroupHeader(name.to_string()), line));
            }

            '"' => {
                chars.next();
                let start_line = line;
                let mut s = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some(esc) => s.push(esc),
                            None => break,
                        },
                        '\n' => break,
                        _ => s.push(ch),
                    }
                }
                if !closed {
                    return Err(RuleError::parse(file, start_line, "unterminated string"));
                }
                tokens.push(Token::new(TokenKind::String(s), start_line));
            }

            '0'..='9' | '-' => {
                let mut num = String::new();
                num.push(c);
                chars.next();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() {
                        num.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: i64 = num
                    .parse()
                    .map_err(|_| RuleError::parse(file, line, format!("invalid integer '{}'", num)))?;
                tokens.push(Token::new(TokenKind::Integer(value), line));
            }

            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '-' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(TokenKind::Identifier(ident), line));
            }

            '(' => {
                chars.next();
                tokens.push(Token::new(TokenKind::LParen, line));
            }
            ')' => {
                chars.next();
                tokens.push(Token::new(TokenKind::RParen, line));
            }
            ',' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Comma, line));
            }
            ';' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Semicolon, line));
            }

            other => {
                return Err(RuleError::parse(file, line, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize("test.rcl", source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_rule_statement() {
        assert_eq!(
            kinds(r#""Game:Game.Player" OWNS(-2) "m_items";"#),
            vec![
                TokenKind::String("Game:Game.Player".into()),
                TokenKind::Identifier("OWNS".into()),
                TokenKind::LParen,
                TokenKind::Integer(-2),
                TokenKind::RParen,
                TokenKind::String("m_items".into()),
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_headers_comments_and_lines() {
        let tokens = tokenize("test.rcl", "// header comment\n#  ui.widgets \nIMPORT \"x.rcl\"\n").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::GroupHeader("ui.widgets".into()), 2));
        assert_eq!(tokens[1], Token::new(TokenKind::Identifier("IMPORT".into()), 3));
        assert_eq!(tokens[2], Token::new(TokenKind::String("x.rcl".into()), 3));
    }

    #[test]
    fn test_errors_carry_line() {
        let err = tokenize("bad.rcl", "\n\n\"open").unwrap_err();
        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().starts_with("bad.rcl:3:"));
        assert!(tokenize("bad.rcl", "@").is_err());
        assert!(tokenize("bad.rcl", "#\n").is_err());
    }
}

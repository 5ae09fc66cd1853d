//! Expression lexer.

use compact_str::CompactString;

use crate::errors::ExpressionError;

/// Token kinds of the expression language
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(CompactString),
    Identifier(CompactString),
    /// Operators and punctuation
    Punct(&'static str),
}

/// A token and the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == punct)
    }

    /// Source-like rendering for diagnostics.
    pub fn text(&self) -> CompactString {
        match &self.kind {
            TokenKind::Number(n) => compact_str::format_compact!("{}", n),
            TokenKind::String(s) => compact_str::format_compact!("\"{}\"", s),
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Punct(p) => CompactString::const_new(*p),
        }
    }
}

/// Longest first, so `===` wins over `==` and `=`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!",
    "?", ":", ".", ",", "(", ")", "[", "]", "{", "}",
];

#[inline]
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

#[inline]
fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    Lexer { input, index: 0 }.run()
}

struct Lexer<'a> {
    input: &'a str,
    index: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.index..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input[self.index..].chars().nth(offset)
    }

    fn run(mut self) -> Result<Vec<Token>, ExpressionError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.index;

            if c.is_whitespace() {
                self.index += c.len_utf8();
                continue;
            }

            let kind = if c.is_ascii_digit()
                || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
            {
                self.scan_number()?
            } else if is_identifier_start(c) {
                self.scan_identifier()
            } else if c == '"' || c == '\'' {
                self.scan_string(c)?
            } else {
                self.scan_punctuator(c)?
            };

            tokens.push(Token {
                kind,
                offset: start,
            });
        }

        Ok(tokens)
    }

    fn scan_number(&mut self) -> Result<TokenKind, ExpressionError> {
        let start = self.index;
        let bytes = self.input.as_bytes();
        let mut seen_dot = false;
        let mut seen_exp = false;

        while self.index < bytes.len() {
            let b = bytes[self.index];
            match b {
                b'0'..=b'9' => self.index += 1,
                b'.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.index += 1;
                }
                b'e' | b'E' if !seen_exp => {
                    seen_exp = true;
                    self.index += 1;
                    if matches!(bytes.get(self.index), Some(b'+' | b'-')) {
                        self.index += 1;
                    }
                }
                _ => break,
            }
        }

        let text = &self.input[start..self.index];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExpressionError::InvalidNumber {
                text: text.into(),
                offset: start,
            })
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.index;
        while let Some(c) = self.peek() {
            if !is_identifier_part(c) {
                break;
            }
            self.index += c.len_utf8();
        }
        TokenKind::Identifier(self.input[start..self.index].into())
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind, ExpressionError> {
        let start = self.index;
        self.index += 1;
        let mut value = CompactString::default();

        loop {
            let Some(c) = self.peek() else {
                return Err(ExpressionError::UnterminatedString { offset: start });
            };
            self.index += c.len_utf8();

            if c == quote {
                return Ok(TokenKind::String(value));
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some(escaped) = self.peek() else {
                return Err(ExpressionError::UnterminatedString { offset: start });
            };
            self.index += escaped.len_utf8();
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                'u' => {
                    let hex = self.input.get(self.index..self.index + 4).unwrap_or("");
                    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                        Some(ch) => {
                            value.push(ch);
                            self.index += 4;
                        }
                        None => value.push('u'),
                    }
                }
                other => value.push(other),
            }
        }
    }

    fn scan_punctuator(&mut self, c: char) -> Result<TokenKind, ExpressionError> {
        let rest = &self.input[self.index..];
        match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            Some(&punct) => {
                self.index += punct.len();
                Ok(TokenKind::Punct(punct))
            }
            None => Err(ExpressionError::UnexpectedCharacter {
                ch: c,
                offset: self.index,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_member_access() {
        assert_eq!(
            kinds("item.name"),
            vec![
                TokenKind::Identifier("item".into()),
                TokenKind::Punct("."),
                TokenKind::Identifier("name".into()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 1e3"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.5),
                TokenKind::Number(0.5),
                TokenKind::Number(1000.0),
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb""#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("a\nb".into()),
            ]
        );
    }

    #[test]
    fn test_longest_operator_wins() {
        assert_eq!(
            kinds("a !== b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct("!=="),
                TokenKind::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            tokenize("'open"),
            Err(ExpressionError::UnterminatedString { offset: 0 })
        );
        assert_eq!(
            tokenize("a # b"),
            Err(ExpressionError::UnexpectedCharacter { ch: '#', offset: 2 })
        );
    }
}

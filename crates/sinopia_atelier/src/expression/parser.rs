//! Expression parser.
//!
//! Recursive descent, one function per precedence level:
//!
//! ```text
//! conditional  := logical_or ( "?" conditional ":" conditional )?
//! logical_or   := logical_and ( "||" logical_and )*
//! logical_and  := equality ( "&&" equality )*
//! equality     := relational ( ("==" | "!=" | "===" | "!==") relational )*
//! relational   := additive ( ("<" | "<=" | ">" | ">=") additive )*
//! additive     := multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative := prefix ( ("*" | "/" | "%") prefix )*
//! prefix       := ("!" | "-" | "+") prefix | postfix
//! postfix      := primary ( "." ident | "[" conditional "]" )*
//! ```

use compact_str::CompactString;

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::lexer::{tokenize, Token, TokenKind};
use crate::errors::ExpressionError;

/// Parse a complete expression.
pub fn parse_expression(input: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, index: 0 };
    let expr = parser.parse_conditional()?;

    match parser.current() {
        None => Ok(expr),
        Some(token) => Err(unexpected(token)),
    }
}

fn unexpected(token: &Token) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        found: token.text(),
        offset: token.offset,
    }
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn current_punct(&self) -> Option<&'static str> {
        match self.current()?.kind {
            TokenKind::Punct(p) => Some(p),
            _ => None,
        }
    }

    fn consume_optional_punct(&mut self, punct: &str) -> bool {
        if self.current().is_some_and(|t| t.is_punct(punct)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ExpressionError> {
        match self.current() {
            Some(token) if token.is_punct(punct) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(unexpected(token)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    /// Parse conditional (ternary) expression
    fn parse_conditional(&mut self) -> Result<Expr, ExpressionError> {
        let test = self.parse_logical_or()?;
        if !self.consume_optional_punct("?") {
            return Ok(test);
        }
        let consequent = self.parse_conditional()?;
        self.expect_punct(":")?;
        let alternate = self.parse_conditional()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut result = self.parse_logical_and()?;
        while self.consume_optional_punct("||") {
            let right = self.parse_logical_and()?;
            result = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(result),
                right: Box::new(right),
            };
        }
        Ok(result)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut result = self.parse_equality()?;
        while self.consume_optional_punct("&&") {
            let right = self.parse_equality()?;
            result = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(result),
                right: Box::new(right),
            };
        }
        Ok(result)
    }

    /// Parse equality operators (==, !=, ===, !==)
    fn parse_equality(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_binary_level(&["==", "!=", "===", "!=="], Self::parse_relational)
    }

    /// Parse relational operators (<, >, <=, >=)
    fn parse_relational(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_binary_level(&["<", "<=", ">", ">="], Self::parse_additive)
    }

    /// Parse additive operators (+, -)
    fn parse_additive(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    /// Parse multiplicative operators (*, /, %)
    fn parse_multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_prefix)
    }

    /// Left-associative binary level over `operators`.
    fn parse_binary_level(
        &mut self,
        operators: &[&str],
        next: fn(&mut Self) -> Result<Expr, ExpressionError>,
    ) -> Result<Expr, ExpressionError> {
        let mut result = next(self)?;

        while let Some(punct) = self.current_punct() {
            if !operators.contains(&punct) {
                break;
            }
            let Some(op) = BinaryOp::from_punct(punct) else {
                break;
            };
            self.advance();
            let right = next(self)?;
            result = Expr::Binary {
                op,
                left: Box::new(result),
                right: Box::new(right),
            };
        }

        Ok(result)
    }

    /// Parse prefix operators (!, -, +)
    fn parse_prefix(&mut self) -> Result<Expr, ExpressionError> {
        let op = match self.current_punct() {
            Some("!") => UnaryOp::Not,
            Some("-") => UnaryOp::Minus,
            Some("+") => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_prefix()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parse member and index access chains
    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut result = self.parse_primary()?;

        loop {
            if self.consume_optional_punct(".") {
                let property = self.expect_identifier()?;
                result = Expr::Member {
                    object: Box::new(result),
                    property,
                };
            } else if self.consume_optional_punct("[") {
                let index = self.parse_conditional()?;
                self.expect_punct("]")?;
                result = Expr::Index {
                    object: Box::new(result),
                    index: Box::new(index),
                };
            } else {
                return Ok(result);
            }
        }
    }

    fn expect_identifier(&mut self) -> Result<CompactString, ExpressionError> {
        let token = self.current().ok_or(ExpressionError::UnexpectedEnd)?;
        match &token.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(unexpected(token)),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self.current().ok_or(ExpressionError::UnexpectedEnd)?;

        let expr = match &token.kind {
            TokenKind::Number(n) => Expr::Number(*n),
            TokenKind::String(s) => Expr::String(s.clone()),
            TokenKind::Identifier(name) => match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Identifier(name.clone()),
            },
            TokenKind::Punct("(") => {
                self.advance();
                let inner = self.parse_conditional()?;
                self.expect_punct(")")?;
                return Ok(inner);
            }
            TokenKind::Punct("[") => {
                self.advance();
                return self.parse_literal_array();
            }
            TokenKind::Punct("{") => {
                self.advance();
                return self.parse_literal_map();
            }
            TokenKind::Punct(_) => return Err(unexpected(token)),
        };

        self.advance();
        Ok(expr)
    }

    /// `[` already consumed
    fn parse_literal_array(&mut self) -> Result<Expr, ExpressionError> {
        let mut items = Vec::new();
        if self.consume_optional_punct("]") {
            return Ok(Expr::Array(items));
        }
        loop {
            items.push(self.parse_conditional()?);
            if self.consume_optional_punct(",") {
                // trailing comma
                if self.consume_optional_punct("]") {
                    break;
                }
                continue;
            }
            self.expect_punct("]")?;
            break;
        }
        Ok(Expr::Array(items))
    }

    /// `{` already consumed
    fn parse_literal_map(&mut self) -> Result<Expr, ExpressionError> {
        let mut entries = Vec::new();
        if self.consume_optional_punct("}") {
            return Ok(Expr::Object(entries));
        }
        loop {
            let token = self.current().ok_or(ExpressionError::UnexpectedEnd)?;
            let (key, is_identifier) = match &token.kind {
                TokenKind::Identifier(name) => (name.clone(), true),
                TokenKind::String(s) => (s.clone(), false),
                TokenKind::Number(n) => (compact_str::format_compact!("{}", n), false),
                TokenKind::Punct(_) => return Err(unexpected(token)),
            };
            self.advance();

            let value = if self.consume_optional_punct(":") {
                self.parse_conditional()?
            } else if is_identifier {
                // shorthand `{ name }`
                Expr::Identifier(key.clone())
            } else {
                return Err(match self.current() {
                    Some(token) => unexpected(token),
                    None => ExpressionError::UnexpectedEnd,
                });
            };
            entries.push((key, value));

            if self.consume_optional_punct(",") {
                if self.consume_optional_punct("}") {
                    break;
                }
                continue;
            }
            self.expect_punct("}")?;
            break;
        }
        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.into()))
    }

    #[test]
    fn test_parse_simple_expression() {
        assert_eq!(parse_expression("name").unwrap(), Expr::Identifier("name".into()));
    }

    #[test]
    fn test_parse_property_access() {
        assert_eq!(
            parse_expression("item.user['name']").unwrap(),
            Expr::Index {
                object: Box::new(Expr::Member {
                    object: ident("item"),
                    property: "user".into(),
                }),
                index: Box::new(Expr::String("name".into())),
            }
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_expression("a + b * 2").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: Box::new(Expr::Number(2.0)),
                }),
            }
        );
    }

    #[test]
    fn test_parse_ternary() {
        let expr = parse_expression("ok ? 'yes' : done ? 1 : 2").unwrap();
        let Expr::Conditional { alternate, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*alternate, Expr::Conditional { .. }));
    }

    #[test]
    fn test_parse_object_literal() {
        assert_eq!(
            parse_expression("{ color: c, 'font-size': size, width, }").unwrap(),
            Expr::Object(vec![
                ("color".into(), Expr::Identifier("c".into())),
                ("font-size".into(), Expr::Identifier("size".into())),
                ("width".into(), Expr::Identifier("width".into())),
            ])
        );
    }

    #[test]
    fn test_parse_array_literal() {
        assert_eq!(
            parse_expression("[1, x]").unwrap(),
            Expr::Array(vec![Expr::Number(1.0), Expr::Identifier("x".into())])
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_expression(""), Err(ExpressionError::UnexpectedEnd));
        assert_eq!(parse_expression("a +"), Err(ExpressionError::UnexpectedEnd));
        assert_eq!(
            parse_expression("a b"),
            Err(ExpressionError::UnexpectedToken {
                found: "b".into(),
                offset: 2
            })
        );
    }

    #[test]
    fn test_free_identifiers() {
        let expr = parse_expression("a.b + c[a] + !d").unwrap();
        assert_eq!(expr.free_identifiers(), vec!["a", "c", "d"]);
    }
}

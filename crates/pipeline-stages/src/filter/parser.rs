//! A hand-rolled recursive-descent parser for the filter grammar (spec
//! §4.6):
//!
//! ```text
//! EXPR  := AND ('||' AND)*
//! AND   := TERM ('&&' TERM)*
//! TERM  := '.' FIELD OP VALUE | '.' FIELD 'exists' | '(' EXPR ')'
//! FIELD := dotted identifier path
//! VALUE := quoted-string | number | '[' VALUE (',' VALUE)* ']'
//! ```
//!
//! `&&` binds tighter than `||`, expressed here as two grammar levels
//! rather than precedence climbing, since there are only two operators.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use super::ast::{Expr, Literal, Op};

/// A failure to parse a filter predicate string.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("filter parse error at byte {position}: {message}")]
pub struct FilterParseError {
    pub message: String,
    pub position: usize,
}

/// Parses a filter predicate string into an [`Expr`] tree, once, at stage
/// construction.
pub fn parse_filter(input: &str) -> Result<Expr, FilterParseError> {
    let mut parser = Parser { input, pos: 0 };
    let expr = parser.parse_or()?;
    parser.skip_ws();
    if !parser.is_end() {
        return Err(parser.error(format!("unexpected trailing input: {:?}", parser.rest())));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn is_end(&self) -> bool {
        self.rest().is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, message: impl Into<String>) -> FilterParseError {
        FilterParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Consumes `literal` if the remaining input starts with it, returning
    /// whether it matched.
    fn eat(&mut self, literal: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FilterParseError> {
        let mut lhs = self.parse_and()?;
        loop {
            self.skip_ws();
            if self.eat("||") {
                let rhs = self.parse_and()?;
                lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FilterParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            self.skip_ws();
            if self.eat("&&") {
                let rhs = self.parse_term()?;
                lhs = Expr::And(Box::new(lhs), Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, FilterParseError> {
        self.skip_ws();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_or()?;
                self.skip_ws();
                if !self.eat(")") {
                    return Err(self.error("expected closing ')'"));
                }
                Ok(inner)
            }
            Some('.') => {
                self.pos += 1;
                let field = self.parse_field()?;
                self.skip_ws();
                if self.eat_word("exists") {
                    return Ok(Expr::Exists(field));
                }
                let op = self.parse_op()?;
                self.skip_ws();
                let value = self.parse_value()?;
                Ok(Expr::Compare { field, op, value })
            }
            Some(c) => Err(self.error(format!("expected '.' or '(', found '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_field(&mut self) -> Result<String, FilterParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected a field path after '.'"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Consumes a bare word only if it is not immediately followed by more
    /// identifier characters (so `.exists_flag` does not get mistaken for
    /// `.exists` followed by garbage).
    fn eat_word(&mut self, word: &str) -> bool {
        if self.rest().starts_with(word) {
            let after = &self.rest()[word.len()..];
            let boundary = after
                .chars()
                .next()
                .map(|c| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(true);
            if boundary {
                self.pos += word.len();
                return true;
            }
        }
        false
    }

    fn parse_op(&mut self) -> Result<Op, FilterParseError> {
        self.skip_ws();
        // Multi-character symbolic operators first, longest match.
        for (symbol, op) in [
            ("==", Op::Eq),
            ("!=", Op::Ne),
            (">=", Op::Ge),
            ("<=", Op::Le),
            ("~=", Op::RegexMatch),
            (">", Op::Gt),
            ("<", Op::Lt),
        ] {
            if self.eat(symbol) {
                return Ok(op);
            }
        }
        for (word, op) in [
            ("notin", Op::NotIn),
            ("in", Op::In),
            ("contains", Op::Contains),
            ("startswith", Op::StartsWith),
            ("endswith", Op::EndsWith),
        ] {
            if self.eat_word(word) {
                return Ok(op);
            }
        }
        Err(self.error(format!("expected a comparison operator, found {:?}", self.rest())))
    }

    fn parse_value(&mut self) -> Result<Literal, FilterParseError> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.parse_string().map(Literal::Str),
            Some('[') => self.parse_list(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) => Err(self.error(format!("expected a value, found '{c}'"))),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn parse_string(&mut self) -> Result<String, FilterParseError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some('"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped) => {
                            out.push(escaped);
                            self.pos += escaped.len_utf8();
                        }
                        None => return Err(self.error("unterminated escape sequence")),
                    }
                }
                Some(c) => {
                    out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Literal, FilterParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.input[start..self.pos]
            .parse::<f64>()
            .map(Literal::Num)
            .map_err(|_| self.error("invalid numeric literal"))
    }

    fn parse_list(&mut self) -> Result<Literal, FilterParseError> {
        self.pos += 1; // '['
        let mut items = Vec::new();
        self.skip_ws();
        if self.eat("]") {
            return Ok(Literal::List(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_ws();
            if self.eat(",") {
                continue;
            }
            if self.eat("]") {
                break;
            }
            return Err(self.error("expected ',' or ']' in list literal"));
        }
        Ok(Literal::List(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_comparison() {
        let expr = parse_filter(r#".level != "debug""#).unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                field: "level".to_string(),
                op: Op::Ne,
                value: Literal::Str("debug".to_string()),
            }
        );
    }

    #[test]
    fn parses_exists() {
        let expr = parse_filter(".trace_id exists").unwrap();
        assert_eq!(expr, Expr::Exists("trace_id".to_string()));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a || (b && c), not (a || b) && c
        let expr = parse_filter(r#".a == "1" || .b == "2" && .c == "3""#).unwrap();
        match expr {
            Expr::Or(lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Compare { .. }));
                assert!(matches!(*rhs, Expr::And(_, _)));
            }
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse_filter(r#"(.a == "1" || .b == "2") && .c == "3""#).unwrap();
        match expr {
            Expr::And(lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Or(_, _)));
                assert!(matches!(*rhs, Expr::Compare { .. }));
            }
            other => panic!("expected And at the root, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_dotted_field_path() {
        let expr = parse_filter(r#".a.b.c == "1""#).unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                field: "a.b.c".to_string(),
                op: Op::Eq,
                value: Literal::Str("1".to_string()),
            }
        );
    }

    #[test]
    fn parses_numeric_and_list_literals() {
        let expr = parse_filter(".count >= 3").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                field: "count".to_string(),
                op: Op::Ge,
                value: Literal::Num(3.0),
            }
        );

        let expr = parse_filter(r#".level in ["error", "warn"]"#).unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                field: "level".to_string(),
                op: Op::In,
                value: Literal::List(vec![
                    Literal::Str("error".to_string()),
                    Literal::Str("warn".to_string())
                ]),
            }
        );
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let result = parse_filter(r#".a == "1" garbage"#);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_input_does_not_loop_forever() {
        // No input can drive the parser into an unbounded loop (spec §8):
        // every branch either consumes input or returns an error.
        for bad in [".", "(", ".a ==", ".a in [", "&&", ""] {
            let _ = parse_filter(bad);
        }
    }
}

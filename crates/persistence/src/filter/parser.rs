//! Filter query parser.
//!
//! # Grammar
//!
//! ```text
//! filter     = orExp
//! orExp      = andExp ("OR" andExp)*
//! andExp     = primary ("AND" primary)*
//! primary    = comparison / "(" orExp ")"
//! comparison = field SP compareOp SP literal
//! compareOp  = "=" / "!=" / "<" / "<=" / ">" / ">=" / "LIKE" / "ILIKE"
//! field      = segment ("." segment)*
//! segment    = 1*(ALPHA / DIGIT / "_" / "-") / "`" 1*(any but "`") "`"
//! literal    = quoted-string / number / "true" / "false"
//! ```
//!
//! Keywords are case-insensitive. `AND` binds tighter than `OR`.
//!
//! # Example
//!
//! ```text
//! name = 'fraud-detector'
//! state = 'LIVE' AND (customProperties.team = "risk" OR owner LIKE 'a%')
//! catalog.source = 'kf-model-catalog'
//! ```

use std::fmt;

use crate::error::QueryError;

/// Comparison operators supported by filter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    ILike,
}

impl CompareOp {
    /// Returns the SQL operator for this comparison.
    pub fn to_sql_op(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like | CompareOp::ILike => "LIKE",
        }
    }

    /// Returns true for the pattern-matching operators.
    pub fn is_pattern(&self) -> bool {
        matches!(self, CompareOp::Like | CompareOp::ILike)
    }

    /// Returns true for the ordering operators.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Like => f.write_str("LIKE"),
            CompareOp::ILike => f.write_str("ILIKE"),
            other => f.write_str(other.to_sql_op()),
        }
    }
}

/// Logical operators for combining filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Both sides must hold.
    And,
    /// Either side may hold.
    Or,
}

/// A literal with the type inferred from its spelling.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string.
    String(String),
    /// Integer.
    Int(i64),
    /// Decimal.
    Double(f64),
    /// `true` or `false`.
    Bool(bool),
}

impl Literal {
    /// Returns a short name for the literal type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Double(_) => "double",
            Literal::Bool(_) => "boolean",
        }
    }
}

/// A field reference as written, split on unquoted dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    /// Path segments with backticks removed.
    pub segments: Vec<String>,
    /// Byte offset of the field in the input.
    pub position: usize,
}

impl FieldPath {
    /// Returns the path joined with dots.
    pub fn joined(&self) -> String {
        self.segments.join(".")
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// A simple comparison: field op literal
    Comparison {
        /// Field as written.
        field: FieldPath,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand literal.
        value: Literal,
    },
    /// Logical combination of expressions
    Logical {
        /// Left operand.
        left: Box<FilterExpr>,
        /// Combining operator.
        op: LogicalOp,
        /// Right operand.
        right: Box<FilterExpr>,
    },
}

/// Parser for filter query expressions.
pub struct FilterParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    /// Creates a new filter parser.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parses the entire filter expression.
    pub fn parse(input: &str) -> Result<FilterExpr, QueryError> {
        let mut parser = FilterParser::new(input);
        parser.skip_whitespace();
        if parser.at_end() {
            return Err(QueryError::invalid_filter("empty filter expression", 0));
        }
        let expr = parser.parse_or_expr()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.error(format!(
                "unexpected input after expression: '{}'",
                parser.rest()
            )));
        }
        Ok(expr)
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::invalid_filter(message, self.pos)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes `keyword` if it appears next as a whole word.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let matches = rest
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword));
        if !matches {
            return false;
        }
        let boundary = rest[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_bare_ident_char(c));
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn parse_or_expr(&mut self) -> Result<FilterExpr, QueryError> {
        let mut left = self.parse_and_expr()?;

        loop {
            self.skip_whitespace();
            if self.eat_keyword("or") {
                let right = self.parse_and_expr()?;
                left = FilterExpr::Logical {
                    left: Box::new(left),
                    op: LogicalOp::Or,
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<FilterExpr, QueryError> {
        let mut left = self.parse_primary()?;

        loop {
            self.skip_whitespace();
            if self.eat_keyword("and") {
                let right = self.parse_primary()?;
                left = FilterExpr::Logical {
                    left: Box::new(left),
                    op: LogicalOp::And,
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<FilterExpr, QueryError> {
        self.skip_whitespace();

        if self.peek() == Some('(') {
            self.consume();
            let expr = self.parse_or_expr()?;
            self.skip_whitespace();
            if self.peek() != Some(')') {
                return Err(self.error("expected closing parenthesis"));
            }
            self.consume();
            Ok(expr)
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<FilterExpr, QueryError> {
        let field = self.parse_field()?;
        self.skip_whitespace();
        let op = self.parse_operator()?;
        self.skip_whitespace();
        let value = self.parse_literal()?;
        Ok(FilterExpr::Comparison { field, op, value })
    }

    fn parse_field(&mut self) -> Result<FieldPath, QueryError> {
        let position = self.pos;
        let mut segments = Vec::new();

        loop {
            let segment = match self.peek() {
                Some('`') => self.parse_backtick_segment()?,
                _ => self.parse_bare_segment(),
            };
            if segment.is_empty() {
                return Err(self.error("expected field name"));
            }
            segments.push(segment);

            if self.peek() == Some('.') {
                self.consume();
            } else {
                break;
            }
        }

        Ok(FieldPath { segments, position })
    }

    fn parse_bare_segment(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_bare_ident_char(c) {
                self.consume();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_backtick_segment(&mut self) -> Result<String, QueryError> {
        self.consume();
        let start = self.pos;
        loop {
            match self.consume() {
                Some('`') => return Ok(self.input[start..self.pos - 1].to_string()),
                Some(_) => {}
                None => return Err(self.error("unterminated quoted identifier")),
            }
        }
    }

    fn parse_operator(&mut self) -> Result<CompareOp, QueryError> {
        let start = self.pos;
        let op = match self.peek() {
            Some('=') => {
                self.consume();
                if self.peek() == Some('=') {
                    self.consume();
                }
                CompareOp::Eq
            }
            Some('!') => {
                self.consume();
                if self.consume() != Some('=') {
                    return Err(QueryError::invalid_filter("expected '!='", start));
                }
                CompareOp::Ne
            }
            Some('<') => {
                self.consume();
                match self.peek() {
                    Some('=') => {
                        self.consume();
                        CompareOp::Le
                    }
                    Some('>') => {
                        self.consume();
                        CompareOp::Ne
                    }
                    _ => CompareOp::Lt,
                }
            }
            Some('>') => {
                self.consume();
                if self.peek() == Some('=') {
                    self.consume();
                    CompareOp::Ge
                } else {
                    CompareOp::Gt
                }
            }
            _ if self.eat_keyword("ilike") => CompareOp::ILike,
            _ if self.eat_keyword("like") => CompareOp::Like,
            _ => {
                let found: String = self.rest().chars().take(8).collect();
                return Err(QueryError::invalid_filter(
                    if found.is_empty() {
                        "expected comparison operator".to_string()
                    } else {
                        format!("expected comparison operator, found '{}'", found)
                    },
                    start,
                ));
            }
        };
        Ok(op)
    }

    fn parse_literal(&mut self) -> Result<Literal, QueryError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => self.parse_quoted_string(quote).map(Literal::String),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.parse_number(),
            Some(_) if self.eat_keyword("true") => Ok(Literal::Bool(true)),
            Some(_) if self.eat_keyword("false") => Ok(Literal::Bool(false)),
            Some(_) => Err(self.error(format!(
                "expected literal value, found '{}'",
                self.rest().chars().take(16).collect::<String>()
            ))),
            None => Err(self.error("expected literal value")),
        }
    }

    fn parse_quoted_string(&mut self, quote: char) -> Result<String, QueryError> {
        let start = self.pos;
        self.consume();
        let mut value = String::new();

        loop {
            match self.consume() {
                Some(c) if c == quote => break,
                Some('\\') => match self.consume() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(escaped) => value.push(escaped),
                    None => return Err(QueryError::invalid_filter("unterminated string", start)),
                },
                Some(c) => value.push(c),
                None => return Err(QueryError::invalid_filter("unterminated string", start)),
            }
        }

        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Literal, QueryError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+') {
                self.consume();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];

        if let Ok(i) = text.parse::<i64>() {
            return Ok(Literal::Int(i));
        }
        match text.parse::<f64>() {
            Ok(d) if d.is_finite() => Ok(Literal::Double(d)),
            _ => Err(QueryError::invalid_filter(
                format!("invalid numeric literal '{}'", text),
                start,
            )),
        }
    }
}

fn is_bare_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

//! Recursive-descent parser for options text

use crate::ast::{Expr, Statement};
use crate::error::{LineIndex, Location, OptionsError, OptionsResult};
use crate::lexer::{lex, Spanned, Token};
use crate::units::Units;
use gconf_catalog::AssignOp;
use gconf_property::{level, PropertyRef, Value};

/// Parser over the tokens of one source text
#[derive(Debug)]
pub struct Parser {
    index: LineIndex,
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    /// Tokenize `text`
    ///
    /// # Errors
    /// Propagates lexer errors.
    pub fn new(file: &str, text: &str) -> OptionsResult<Self> {
        Ok(Self {
            index: LineIndex::new(file, text),
            tokens: lex(file, text)?,
            pos: 0,
            end: text.len(),
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn here(&self) -> Location {
        let offset = self.tokens.get(self.pos).map_or(self.end, |t| t.span.start);
        self.index.location(offset)
    }

    fn unexpected<T>(&self, expected: &str) -> OptionsResult<T> {
        let message = match self.peek() {
            Some(token) => format!("unexpected {token}, expected {expected}"),
            None => format!("unexpected end of input, expected {expected}"),
        };
        Err(OptionsError::syntax(self.here(), message))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> OptionsResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            self.unexpected(&token.to_string())
        }
    }

    /// Parse every statement
    ///
    /// # Errors
    /// Fails on the first syntax error.
    pub fn parse_statements(mut self) -> OptionsResult<Vec<Statement>> {
        let mut statements = Vec::new();
        while self.peek().is_some() {
            if self.eat(&Token::Semi) {
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    /// Parse the whole input as a single value
    ///
    /// # Errors
    /// Fails on syntax errors, trailing tokens, or unknown units.
    pub fn parse_single_value(mut self) -> OptionsResult<Expr> {
        let expr = self.expr()?;
        if self.peek().is_some() {
            return self.unexpected("end of value");
        }
        Ok(expr)
    }

    fn statement(&mut self) -> OptionsResult<Statement> {
        let location = self.here();
        match self.peek() {
            Some(Token::Directive(_)) => {
                let Some(Token::Directive(name)) = self.advance() else {
                    return self.unexpected("directive");
                };
                let statement = self.directive(&name, location)?;
                self.eat(&Token::Semi);
                Ok(statement)
            }
            Some(Token::Ident(_)) => {
                let mut path = self.dotted_name()?;
                if path.len() < 2 {
                    return Err(OptionsError::syntax(
                        location,
                        format!("expected Component.Property, found '{}'", path.join(".")),
                    ));
                }
                let property = path.pop().unwrap_or_default();
                let component = path.join(".");
                let op = match self.advance() {
                    Some(Token::Assign) => AssignOp::Set,
                    Some(Token::PlusAssign) => AssignOp::Append,
                    Some(Token::MinusAssign) => AssignOp::Remove,
                    Some(_) => {
                        self.pos -= 1;
                        return self.unexpected("'=', '+=' or '-='");
                    }
                    None => return self.unexpected("'=', '+=' or '-='"),
                };
                let value = self.expr()?;
                self.expect(&Token::Semi)?;
                Ok(Statement::Assign {
                    component,
                    property,
                    op,
                    value,
                    location,
                })
            }
            _ => self.unexpected("assignment or directive"),
        }
    }

    fn directive(&mut self, name: &str, location: Location) -> OptionsResult<Statement> {
        match name {
            "include" | "units" => {
                let Some(Token::Str(path)) = self.peek().cloned() else {
                    return self.unexpected("file name string");
                };
                self.pos += 1;
                Ok(if name == "include" {
                    Statement::Include { path, location }
                } else {
                    Statement::Units { path, location }
                })
            }
            "pragma" => {
                match self.advance() {
                    Some(Token::Ident(word)) if word.eq_ignore_ascii_case("print") => {}
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        return self.unexpected("'print'");
                    }
                }
                match self.advance() {
                    Some(Token::Ident(word)) if word.eq_ignore_ascii_case("on") => {
                        Ok(Statement::PrintAssignments(true))
                    }
                    Some(Token::Ident(word)) if word.eq_ignore_ascii_case("off") => {
                        Ok(Statement::PrintAssignments(false))
                    }
                    _ => {
                        self.pos = self.pos.saturating_sub(1);
                        self.unexpected("'on' or 'off'")
                    }
                }
            }
            "printOptions" => {
                if matches!(self.peek(), Some(Token::Ident(word)) if word.eq_ignore_ascii_case("full"))
                {
                    self.pos += 1;
                }
                Ok(Statement::PrintOptions)
            }
            other => Err(OptionsError::syntax(
                location,
                format!("unknown directive '#{other}'"),
            )),
        }
    }

    fn dotted_name(&mut self) -> OptionsResult<Vec<String>> {
        let mut segments = Vec::new();
        loop {
            match self.advance() {
                Some(Token::Ident(segment)) => segments.push(segment),
                Some(_) => {
                    self.pos -= 1;
                    return self.unexpected("name");
                }
                None => return self.unexpected("name"),
            }
            if !self.eat(&Token::Dot) {
                return Ok(segments);
            }
        }
    }

    fn expr(&mut self) -> OptionsResult<Expr> {
        let start = self.here();
        let Some(token) = self.advance() else {
            return self.unexpected("value");
        };
        match token {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Int(i) => self.number(Value::Int(i), i as f64),
            Token::Float(x) => self.number(Value::Float(x), x),
            Token::Ident(word) => {
                if word.eq_ignore_ascii_case("true") {
                    Ok(Expr::Literal(Value::Bool(true)))
                } else if word.eq_ignore_ascii_case("false") {
                    Ok(Expr::Literal(Value::Bool(false)))
                } else if let Some(level) = level::from_name(&word) {
                    Ok(Expr::Literal(Value::Int(i128::from(level))))
                } else {
                    Err(OptionsError::syntax(
                        start,
                        format!("unexpected identifier '{word}' in value"),
                    ))
                }
            }
            Token::At => {
                let mut path = self.dotted_name()?;
                if path.len() < 2 {
                    return Err(OptionsError::syntax(
                        start,
                        "reference must name Component.Property",
                    ));
                }
                let property = path.pop().unwrap_or_default();
                Ok(Expr::Ref(PropertyRef::new(path.join("."), property)))
            }
            Token::LBrace => self.brace(),
            Token::LBracket => Ok(Expr::List(self.items(&Token::RBracket)?)),
            Token::LParen => Ok(Expr::Tuple(self.items(&Token::RParen)?)),
            _ => {
                self.pos -= 1;
                self.unexpected("value")
            }
        }
    }

    fn number(&mut self, literal: Value, magnitude: f64) -> OptionsResult<Expr> {
        if !self.eat(&Token::Star) {
            return Ok(Expr::Literal(literal));
        }
        let location = self.here();
        match self.advance() {
            Some(Token::Ident(unit)) => Ok(Expr::Scaled {
                magnitude,
                unit,
                location,
            }),
            _ => {
                self.pos = self.pos.saturating_sub(1);
                self.unexpected("unit name")
            }
        }
    }

    /// Comma-separated values up to `close`, which is consumed
    fn items(&mut self, close: &Token) -> OptionsResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    /// `{` already consumed: a list, a mapping, or `{}`
    fn brace(&mut self) -> OptionsResult<Expr> {
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Map(Vec::new()));
        }
        let first = self.expr()?;
        if !self.eat(&Token::Colon) {
            let mut items = vec![first];
            if self.eat(&Token::Comma) {
                items.extend(self.items(&Token::RBrace)?);
            } else {
                self.expect(&Token::RBrace)?;
            }
            return Ok(Expr::List(items));
        }
        let mut entries = vec![(first, self.expr()?)];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::RBrace) {
                break;
            }
            let key = self.expr()?;
            self.expect(&Token::Colon)?;
            entries.push((key, self.expr()?));
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Map(entries))
    }
}

/// Parse options text into statements
///
/// # Errors
/// Fails with a `file(line,col)` diagnostic on malformed input.
pub fn parse(file: &str, text: &str) -> OptionsResult<Vec<Statement>> {
    Parser::new(file, text)?.parse_statements()
}

/// Parse the options text of a single value, as stored in JSON/YAML dumps
///
/// # Errors
/// Fails on malformed text or unknown units.
pub fn parse_value(text: &str) -> OptionsResult<Value> {
    Parser::new("<value>", text)?
        .parse_single_value()?
        .evaluate(&Units::default())
}

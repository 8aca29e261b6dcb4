//! Lexer for the options language
//!
//! Uses Logos. Comments are skipped; strings are unescaped at lex time and may
//! span several lines.

use crate::error::{Location, OptionsError, OptionsResult};
use gconf_property::unescape;
use logos::{Logos, Span};
use std::fmt;

fn string_body(slice: &str) -> String {
    unescape(&slice[1..slice.len() - 1])
}

fn finite_float(slice: &str) -> Option<f64> {
    slice.parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Message for a numeric literal whose token callback rejected it
fn number_error(slice: &str) -> Option<&'static str> {
    let digits = slice.trim_start_matches(['+', '-']);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if digits.starts_with("0x") || digits.starts_with("0X") || !digits.contains(['.', 'e', 'E']) {
        Some("integer literal out of range")
    } else {
        Some("floating-point literal out of range")
    }
}

/// Options-language token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    /// Preprocessor-style directive such as `#include`, without the `#`
    #[regex(r"#[A-Za-z]+", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    /// String literal, unescaped
    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| string_body(lex.slice()))]
    #[regex(r#"'([^'\\]|\\(.|\n))*'"#, |lex| string_body(lex.slice()))]
    Str(String),

    /// Integer literal (decimal or hex)
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i128::from_str_radix(&lex.slice()[2..], 16).ok())]
    #[regex(r"[+-]?[0-9]+", |lex| lex.slice().parse::<i128>().ok())]
    Int(i128),

    /// Floating-point literal
    #[regex(r"[+-]?([0-9]+\.[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?", |lex| finite_float(lex.slice()))]
    #[regex(r"[+-]?[0-9]+[eE][+-]?[0-9]+", |lex| finite_float(lex.slice()))]
    Float(f64),

    /// Identifier, possibly namespaced with `::`
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice().to_string())]
    Ident(String),

    /// `=`
    #[token("=")]
    Assign,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `;`
    #[token(";")]
    Semi,
    /// `,`
    #[token(",")]
    Comma,
    /// `:`
    #[token(":")]
    Colon,
    /// `.`
    #[token(".")]
    Dot,
    /// `@`
    #[token("@")]
    At,
    /// `*`
    #[token("*")]
    Star,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directive(name) => write!(f, "'#{name}'"),
            Self::Str(_) => f.write_str("string"),
            Self::Int(i) => write!(f, "'{i}'"),
            Self::Float(x) => write!(f, "'{x}'"),
            Self::Ident(name) => write!(f, "'{name}'"),
            Self::Assign => f.write_str("'='"),
            Self::PlusAssign => f.write_str("'+='"),
            Self::MinusAssign => f.write_str("'-='"),
            Self::Semi => f.write_str("';'"),
            Self::Comma => f.write_str("','"),
            Self::Colon => f.write_str("':'"),
            Self::Dot => f.write_str("'.'"),
            Self::At => f.write_str("'@'"),
            Self::Star => f.write_str("'*'"),
            Self::LBrace => f.write_str("'{'"),
            Self::RBrace => f.write_str("'}'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
        }
    }
}

/// A token with its byte span
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Byte range in the source
    pub span: Span,
}

/// Tokenize `source`; `file` labels error locations
///
/// # Errors
/// Fails on characters that start no token, unterminated strings and
/// unterminated block comments.
pub fn lex(file: &str, source: &str) -> OptionsResult<Vec<Spanned>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(Spanned { token, span }),
            Err(()) => {
                let rest = &source[span.start..];
                let message = if rest.starts_with('"') || rest.starts_with('\'') {
                    "unterminated string literal".to_string()
                } else if rest.starts_with("/*") {
                    "unterminated comment".to_string()
                } else if let Some(message) = number_error(lexer.slice()) {
                    format!("{message}: '{}'", lexer.slice())
                } else {
                    format!("unexpected character(s) '{}'", lexer.slice())
                };
                return Err(OptionsError::syntax(
                    Location::of_offset(file, source, span.start),
                    message,
                ));
            }
        }
    }

    Ok(tokens)
}

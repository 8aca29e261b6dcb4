//! Physical units for `number * unit` expressions

use crate::error::{Location, OptionsError, OptionsResult};
use crate::lexer::{lex, Token};
use indexmap::IndexMap;

/// Table from unit name to scale factor
#[derive(Debug, Clone, PartialEq)]
pub struct Units {
    factors: IndexMap<String, f64>,
}

impl Default for Units {
    fn default() -> Self {
        let factors = [
            ("mm", 1.0),
            ("cm", 10.0),
            ("cm2", 100.0),
            ("m", 1000.0),
            ("m2", 1.0e6),
            ("ns", 1.0),
            ("ps", 1.0e-3),
            ("fs", 1.0e-6),
            ("MeV", 1.0),
            ("GeV", 1000.0),
            ("keV", 1.0e-3),
        ]
        .into_iter()
        .map(|(name, factor)| (name.to_string(), factor))
        .collect();
        Self { factors }
    }
}

impl Units {
    /// Built-in units
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scale factor of a unit
    #[inline]
    #[must_use]
    pub fn factor(&self, name: &str) -> Option<f64> {
        self.factors.get(name).copied()
    }

    /// Define or redefine a unit
    pub fn define(&mut self, name: impl Into<String>, factor: f64) {
        self.factors.insert(name.into(), factor);
    }

    /// Number of known units
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Check for an empty table
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Read definitions of the form `[quantity] name = factor [;]`
    ///
    /// `1 cm = 10;` and `cm = 10` are equivalent; a quantity divides the
    /// factor.
    ///
    /// # Errors
    /// Fails on malformed definitions.
    pub fn load(&mut self, file: &str, text: &str) -> OptionsResult<usize> {
        let tokens = lex(file, text)?;
        let mut count = 0;
        let mut i = 0;
        let number = |t: &Token| match t {
            Token::Int(v) => Some(*v as f64),
            Token::Float(v) => Some(*v),
            _ => None,
        };
        while i < tokens.len() {
            let at = |i: usize| {
                let offset = tokens.get(i).map_or(text.len(), |t| t.span.start);
                Location::of_offset(file, text, offset)
            };
            let quantity = match number(&tokens[i].token) {
                Some(q) => {
                    i += 1;
                    q
                }
                None => 1.0,
            };
            let Some(Token::Ident(name)) = tokens.get(i).map(|t| &t.token) else {
                return Err(OptionsError::syntax(at(i), "expected unit name"));
            };
            if tokens.get(i + 1).map(|t| &t.token) != Some(&Token::Assign) {
                return Err(OptionsError::syntax(at(i + 1), "expected '='"));
            }
            let Some(factor) = tokens.get(i + 2).and_then(|t| number(&t.token)) else {
                return Err(OptionsError::syntax(at(i + 2), "expected unit value"));
            };
            if quantity == 0.0 {
                return Err(OptionsError::syntax(at(i), "unit quantity cannot be zero"));
            }
            self.define(name.clone(), factor / quantity);
            count += 1;
            i += 3;
            if tokens.get(i).map(|t| &t.token) == Some(&Token::Semi) {
                i += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_factors() {
        let units = Units::new();
        assert_eq!(units.factor("m"), Some(1000.0));
        assert_eq!(units.factor("GeV"), Some(1000.0));
        assert_eq!(units.factor("parsec"), None);
    }

    #[test]
    fn test_load_definitions() {
        let mut units = Units::new();
        let n = units
            .load("units.opts", "1 km = 1000000;\n// comment\nTeV = 1e6\n2 hm = 200000;")
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(units.factor("km"), Some(1.0e6));
        assert_eq!(units.factor("TeV"), Some(1.0e6));
        assert_eq!(units.factor("hm"), Some(1.0e5));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut units = Units::new();
        let err = units.load("u", "km 1000").unwrap_err();
        assert_eq!(err.to_string(), "u(1,4): expected '='");
    }
}

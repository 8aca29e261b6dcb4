//! Options-language syntax tree

use crate::error::{Location, OptionsError, OptionsResult};
use crate::units::Units;
use gconf_catalog::AssignOp;
use gconf_property::{PropertyRef, Value};

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal scalar or string
    Literal(Value),
    /// `number * unit`
    Scaled {
        /// Numeric magnitude
        magnitude: f64,
        /// Unit name
        unit: String,
        /// Where the unit is written
        location: Location,
    },
    /// `{ a, b }` or `[ a, b ]`
    List(Vec<Expr>),
    /// `( a, b )`
    Tuple(Vec<Expr>),
    /// `{ k: v }`
    Map(Vec<(Expr, Expr)>),
    /// `@Component.Property`
    Ref(PropertyRef),
}

impl Expr {
    /// Evaluate units and build the value
    ///
    /// # Errors
    /// Fails on units missing from `units`.
    pub fn evaluate(&self, units: &Units) -> OptionsResult<Value> {
        let all = |items: &[Expr]| -> OptionsResult<Vec<Value>> {
            items.iter().map(|e| e.evaluate(units)).collect()
        };
        Ok(match self {
            Self::Literal(v) => v.clone(),
            Self::Scaled {
                magnitude,
                unit,
                location,
            } => {
                let factor = units.factor(unit).ok_or_else(|| OptionsError::UnknownUnit {
                    location: location.clone(),
                    unit: unit.clone(),
                })?;
                Value::Float(magnitude * factor)
            }
            Self::List(items) => Value::List(all(items)?),
            Self::Tuple(items) => Value::Tuple(all(items)?),
            Self::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.evaluate(units)?, v.evaluate(units)?)))
                    .collect::<OptionsResult<Vec<_>>>()?,
            ),
            Self::Ref(r) => Value::Ref(r.clone()),
        })
    }
}

/// One statement of an options file
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `Component.Property (=|+=|-=) value;`
    Assign {
        /// Qualified component name
        component: String,
        /// Property key as written
        property: String,
        /// Combination with the current value
        op: AssignOp,
        /// Right-hand side
        value: Expr,
        /// Where the statement starts
        location: Location,
    },
    /// `#include "path"`
    Include {
        /// Path as written
        path: String,
        /// Where the directive appears
        location: Location,
    },
    /// `#units "path"`
    Units {
        /// Path as written
        path: String,
        /// Where the directive appears
        location: Location,
    },
    /// `#pragma print on|off`
    PrintAssignments(bool),
    /// `#printOptions`
    PrintOptions,
}

impl Statement {
    /// Location of the statement, when it has one
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Assign { location, .. }
            | Self::Include { location, .. }
            | Self::Units { location, .. } => Some(location),
            Self::PrintAssignments(_) | Self::PrintOptions => None,
        }
    }
}

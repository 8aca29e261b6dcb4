//! Declared property types
//!
//! A [`TypeSpec`] is the semantic descriptor of a property slot. It validates
//! and normalizes assigned values through [`TypeSpec::coerce`] and can be
//! read from the C++ type strings found in component databases
//! (`std::vector<std::string>`, `ToolHandle<IFoo>`, ...).

use crate::error::{PropertyError, ShapeError};
use crate::value::{ComponentRef, Value};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Integer width and signedness, with C ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntKind {
    /// `signed char`
    I8,
    /// `short`
    I16,
    /// `int`
    I32,
    /// `long long`
    I64,
    /// `unsigned char`
    U8,
    /// `unsigned short`
    U16,
    /// `unsigned int`
    U32,
    /// `unsigned long long`
    U64,
}

impl IntKind {
    /// Smallest accepted value
    #[must_use]
    pub fn min(self) -> i128 {
        match self {
            Self::I8 => i128::from(i8::MIN),
            Self::I16 => i128::from(i16::MIN),
            Self::I32 => i128::from(i32::MIN),
            Self::I64 => i128::from(i64::MIN),
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => 0,
        }
    }

    /// Largest accepted value
    #[must_use]
    pub fn max(self) -> i128 {
        match self {
            Self::I8 => i128::from(i8::MAX),
            Self::I16 => i128::from(i16::MAX),
            Self::I32 => i128::from(i32::MAX),
            Self::I64 => i128::from(i64::MAX),
            Self::U8 => i128::from(u8::MAX),
            Self::U16 => i128::from(u16::MAX),
            Self::U32 => i128::from(u32::MAX),
            Self::U64 => i128::from(u64::MAX),
        }
    }

    /// C spelling
    #[must_use]
    pub fn c_name(self) -> &'static str {
        match self {
            Self::I8 => "signed char",
            Self::I16 => "short",
            Self::I32 => "int",
            Self::I64 => "long long",
            Self::U8 => "unsigned char",
            Self::U16 => "unsigned short",
            Self::U32 => "unsigned int",
            Self::U64 => "unsigned long long",
        }
    }
}

/// Data access mode of a data handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Input
    Read,
    /// Output
    Write,
    /// Input and output
    Update,
}

/// What a handle points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Tool owned by the declaring component (`<parent>.<leaf>`)
    PrivateTool,
    /// Tool shared through the tool service (`ToolSvc.<leaf>`)
    PublicTool,
    /// Service
    Service,
    /// Event-store data path
    Data(AccessMode),
}

/// Handle declaration: target kind, interface, optional flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleSpec {
    /// Target kind
    pub kind: HandleKind,
    /// Declared interface (informational)
    pub interface: String,
    /// Whether an empty handle is acceptable
    pub optional: bool,
}

impl HandleSpec {
    /// Create a handle spec
    #[must_use]
    pub fn new(kind: HandleKind, interface: impl Into<String>) -> Self {
        Self {
            kind,
            interface: interface.into(),
            optional: false,
        }
    }

    /// Mark the handle as optional
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Check whether the handle refers to a configurable
    #[inline]
    #[must_use]
    pub fn is_component(&self) -> bool {
        !matches!(self.kind, HandleKind::Data(_))
    }
}

/// Declared type of a property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSpec {
    /// No validation (generic configurables)
    Any,
    /// Boolean
    Bool,
    /// Integer with range
    Int(IntKind),
    /// Floating point
    Float,
    /// String
    String,
    /// Ordered sequence
    Sequence(Box<TypeSpec>),
    /// Unordered unique set
    Set(Box<TypeSpec>),
    /// Mapping from scalar key to value
    Mapping(Box<TypeSpec>, Box<TypeSpec>),
    /// Fixed-arity tuple
    Tuple(Vec<TypeSpec>),
    /// Handle reference
    Handle(HandleSpec),
}

impl TypeSpec {
    /// `std::vector<elem>`
    #[must_use]
    pub fn sequence(elem: TypeSpec) -> Self {
        Self::Sequence(Box::new(elem))
    }

    /// `std::set<elem>`
    #[must_use]
    pub fn set(elem: TypeSpec) -> Self {
        Self::Set(Box::new(elem))
    }

    /// `std::map<key, value>`
    #[must_use]
    pub fn mapping(key: TypeSpec, value: TypeSpec) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// Handle of the given kind
    #[must_use]
    pub fn handle(kind: HandleKind, interface: impl Into<String>) -> Self {
        Self::Handle(HandleSpec::new(kind, interface))
    }

    /// Check whether values of this type accept `+=`
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::Set(_) | Self::Mapping(..))
    }

    /// Zero value used when a declaration gives no default
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            Self::Any | Self::String => Value::String(String::new()),
            Self::Bool => Value::Bool(false),
            Self::Int(_) => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Sequence(_) => Value::List(Vec::new()),
            Self::Set(_) => Value::Set(Vec::new()),
            Self::Mapping(..) => Value::Map(Vec::new()),
            Self::Tuple(items) => Value::Tuple(items.iter().map(TypeSpec::zero).collect()),
            Self::Handle(h) if h.is_component() => Value::Handle(ComponentRef::new("", "")),
            Self::Handle(_) => Value::String(String::new()),
        }
    }

    /// Validate and normalize a value
    ///
    /// Late-bound references pass through untouched; they are checked when
    /// resolved.
    ///
    /// # Errors
    /// Returns [`ShapeError`] when shape or element type does not match.
    pub fn coerce(&self, value: Value) -> Result<Value, ShapeError> {
        if let Value::Ref(_) = value {
            return Ok(value);
        }
        match self {
            Self::Any => Ok(value),
            Self::Bool => match value {
                Value::Bool(_) => Ok(value),
                Value::Int(i) => Ok(Value::Bool(i != 0)),
                other => Err(self.mismatch(&other)),
            },
            Self::Int(kind) => {
                let i = match value {
                    Value::Int(i) => i,
                    Value::Bool(b) => i128::from(b),
                    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
                    Value::Float(x) if x.fract() == 0.0 && x.is_finite() => x as i128,
                    other => return Err(self.mismatch(&other)),
                };
                if i < kind.min() || i > kind.max() {
                    return Err(ShapeError::new(self.to_string(), "int").with_reason(format!(
                        "{i} outside [{}, {}]",
                        kind.min(),
                        kind.max()
                    )));
                }
                Ok(Value::Int(i))
            }
            Self::Float => match value.as_float() {
                Some(x) if x.is_finite() => Ok(Value::Float(x)),
                Some(x) => Err(ShapeError::new(self.to_string(), "float").with_reason(format!("{x} is not finite"))),
                None => Err(self.mismatch(&value)),
            },
            Self::String => match value {
                Value::String(_) => Ok(value),
                Value::Handle(h) => Ok(Value::String(h.full_name())),
                other => Err(self.mismatch(&other)),
            },
            Self::Sequence(elem) => {
                let items = sequence_items(self, value)?;
                coerce_items(elem, items).map(Value::List)
            }
            Self::Set(elem) => {
                let items = coerce_items(elem, sequence_items(self, value)?)?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Set(unique))
            }
            Self::Mapping(key, val) => {
                let entries = match value {
                    Value::Map(entries) => entries,
                    Value::List(items) | Value::Set(items) if items.is_empty() => Vec::new(),
                    other => return Err(self.mismatch(&other)),
                };
                entries
                    .into_iter()
                    .map(|(k, v)| {
                        let k = key.coerce(k).map_err(|e| e.with_reason("mapping key"))?;
                        let v = val.coerce(v).map_err(|e| e.with_reason("mapping value"))?;
                        Ok((k, v))
                    })
                    .collect::<Result<Vec<_>, ShapeError>>()
                    .map(Value::Map)
            }
            Self::Tuple(specs) => {
                let items = match value {
                    Value::Tuple(items) | Value::List(items) => items,
                    other => return Err(self.mismatch(&other)),
                };
                if items.len() != specs.len() {
                    return Err(ShapeError::new(self.to_string(), "tuple").with_reason(format!(
                        "arity {} instead of {}",
                        items.len(),
                        specs.len()
                    )));
                }
                specs
                    .iter()
                    .zip(items)
                    .map(|(spec, item)| spec.coerce(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Tuple)
            }
            Self::Handle(handle) => coerce_handle(self, handle, value),
        }
    }

    fn mismatch(&self, value: &Value) -> ShapeError {
        ShapeError::new(self.to_string(), value.shape())
    }
}

fn sequence_items(spec: &TypeSpec, value: Value) -> Result<Vec<Value>, ShapeError> {
    match value {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items),
        Value::Map(entries) if entries.is_empty() => Ok(Vec::new()),
        other => Err(spec.mismatch(&other)),
    }
}

fn coerce_items(elem: &TypeSpec, items: Vec<Value>) -> Result<Vec<Value>, ShapeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            elem.coerce(item)
                .map_err(|e| e.with_reason(format!("element {i}")))
        })
        .collect()
}

fn coerce_handle(spec: &TypeSpec, handle: &HandleSpec, value: Value) -> Result<Value, ShapeError> {
    if !handle.is_component() {
        return match value {
            Value::String(path) => Ok(Value::String(path)),
            other => Err(spec.mismatch(&other)),
        };
    }
    match value {
        Value::Handle(h) => Ok(Value::Handle(h)),
        Value::String(s) if s.is_empty() => Ok(Value::Handle(ComponentRef::new("", ""))),
        Value::String(s) => Ok(Value::Handle(ComponentRef::parse(&s))),
        other => Err(spec.mismatch(&other)),
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::Int(kind) => f.write_str(kind.c_name()),
            Self::Float => f.write_str("double"),
            Self::String => f.write_str("std::string"),
            Self::Sequence(elem) => write!(f, "std::vector<{elem}>"),
            Self::Set(elem) => write!(f, "std::set<{elem}>"),
            Self::Mapping(k, v) => write!(f, "std::map<{k},{v}>"),
            Self::Tuple(items) => {
                f.write_str("std::tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(">")
            }
            Self::Handle(h) => {
                let head = match h.kind {
                    HandleKind::PrivateTool => "ToolHandle",
                    HandleKind::PublicTool => "PublicToolHandle",
                    HandleKind::Service => "ServiceHandle",
                    HandleKind::Data(AccessMode::Read) => "DataObjectReadHandle",
                    HandleKind::Data(AccessMode::Write) => "DataObjectWriteHandle",
                    HandleKind::Data(AccessMode::Update) => "DataObjectUpdateHandle",
                };
                write!(f, "{head}<{}>", h.interface)
            }
        }
    }
}

impl FromStr for TypeSpec {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let text = text.strip_prefix("const ").unwrap_or(text).trim_end_matches('&').trim();
        let invalid = || PropertyError::InvalidTypeSpec(s.to_string());

        if let Some((head, args)) = split_template(text).map_err(|()| invalid())? {
            let arg = |i: usize| -> Result<TypeSpec, PropertyError> {
                args.get(i).ok_or_else(invalid)?.parse()
            };
            return Ok(match head {
                "std::vector" | "std::list" | "std::deque" => Self::sequence(arg(0)?),
                "std::set" | "std::unordered_set" => Self::set(arg(0)?),
                "std::map" | "std::unordered_map" | "GaudiUtils::Map" => {
                    Self::mapping(arg(0)?, arg(1)?)
                }
                "std::pair" | "std::tuple" => Self::Tuple(
                    args.iter()
                        .map(|a| a.parse())
                        .collect::<Result<_, _>>()?,
                ),
                "ToolHandle" | "PrivateToolHandle" => {
                    Self::handle(HandleKind::PrivateTool, args.first().copied().unwrap_or(""))
                }
                "PublicToolHandle" => {
                    Self::handle(HandleKind::PublicTool, args.first().copied().unwrap_or(""))
                }
                "ServiceHandle" => {
                    Self::handle(HandleKind::Service, args.first().copied().unwrap_or(""))
                }
                "ToolHandleArray" | "PrivateToolHandleArray" => Self::sequence(Self::handle(
                    HandleKind::PrivateTool,
                    args.first().copied().unwrap_or(""),
                )),
                "PublicToolHandleArray" => Self::sequence(Self::handle(
                    HandleKind::PublicTool,
                    args.first().copied().unwrap_or(""),
                )),
                "DataObjectReadHandle" => Self::handle(
                    HandleKind::Data(AccessMode::Read),
                    args.first().copied().unwrap_or(""),
                ),
                "DataObjectWriteHandle" => Self::handle(
                    HandleKind::Data(AccessMode::Write),
                    args.first().copied().unwrap_or(""),
                ),
                "Gaudi::Property" => arg(0)?,
                _ => return Err(invalid()),
            });
        }

        Ok(match text {
            "bool" => Self::Bool,
            "char" | "signed char" => Self::Int(IntKind::I8),
            "unsigned char" => Self::Int(IntKind::U8),
            "short" | "signed short" => Self::Int(IntKind::I16),
            "unsigned short" => Self::Int(IntKind::U16),
            "int" | "signed int" | "signed" | "int32_t" => Self::Int(IntKind::I32),
            "unsigned int" | "unsigned" | "uint32_t" => Self::Int(IntKind::U32),
            "long" | "long long" | "int64_t" | "long int" => Self::Int(IntKind::I64),
            "unsigned long" | "unsigned long long" | "uint64_t" | "size_t" | "std::size_t" => {
                Self::Int(IntKind::U64)
            }
            "float" | "double" | "long double" => Self::Float,
            "std::string" | "string" | "str" => Self::String,
            "any" | "" => Self::Any,
            "ToolHandle" | "PrivateToolHandle" => Self::handle(HandleKind::PrivateTool, ""),
            "PublicToolHandle" => Self::handle(HandleKind::PublicTool, ""),
            "ServiceHandle" => Self::handle(HandleKind::Service, ""),
            _ => return Err(invalid()),
        })
    }
}

/// Split `head<a, b<c>>` into `("head", ["a", "b<c>"])`
///
/// Returns `Ok(None)` for non-template text and `Err` for unbalanced brackets.
fn split_template(text: &str) -> Result<Option<(&str, Vec<&str>)>, ()> {
    let Some(open) = text.find('<') else {
        return Ok(None);
    };
    if !text.ends_with('>') {
        return Err(());
    }
    let head = text[..open].trim();
    let inner = &text[open + 1..text.len() - 1];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1).ok_or(())?,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(());
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last);
    }
    Ok(Some((head, args)))
}

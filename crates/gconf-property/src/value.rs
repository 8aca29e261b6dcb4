//! Property values
//!
//! [`Value`] is the dynamic payload stored in every property slot. Its
//! [`Display`](fmt::Display) form is the options-language text of the value,
//! which is what every dump format emits and what the parser reads back.
//!
//! Canonical text rules:
//! - strings are double-quoted with `\` and `"` escaped, newlines kept raw
//! - sequences print as `[a, b]`, tuples as `(a, b)`
//! - sets print as `[a, b]` with elements sorted by their text
//! - mappings print as `{k: v}` with keys sorted by their text
//! - component references print as the quoted `"Type/Name"` string

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Reference to another configurable, rendered `Type/Name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Component type name
    pub type_name: String,
    /// Instance name (leaf name for tools)
    pub name: String,
}

impl ComponentRef {
    /// Create a reference from its parts
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Parse `Type/Name`; a bare `Name` uses the name as the type
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((type_name, name)) => Self::new(type_name, name),
            None => Self::new(text, text),
        }
    }

    /// Check for the empty reference (an unset optional handle)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.type_name.is_empty() && self.name.is_empty()
    }

    /// Full name as seen by the runtime
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.is_empty() {
            String::new()
        } else if self.type_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.type_name, self.name)
        }
    }
}

impl Display for ComponentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Late-bound `@Component.Property` reference, resolved at freeze
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Qualified name of the referenced component
    pub component: String,
    /// Referenced property key
    pub property: String,
}

impl PropertyRef {
    /// Create a reference from its parts
    #[inline]
    #[must_use]
    pub fn new(component: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            property: property.into(),
        }
    }

    /// Split `Comp.Sub.Prop` at the last dot
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (component, property) = text.rsplit_once('.')?;
        if component.is_empty() || property.is_empty() {
            return None;
        }
        Some(Self::new(component, property))
    }
}

impl Display for PropertyRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@{}.{}", self.component, self.property)
    }
}

/// Dynamic property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Integer wide enough for every C integer kind
    Int(i128),
    /// Floating point
    Float(f64),
    /// String
    String(String),
    /// Ordered sequence
    List(Vec<Value>),
    /// Fixed-arity tuple
    Tuple(Vec<Value>),
    /// Unique elements, first occurrence kept
    Set(Vec<Value>),
    /// Key/value pairs in insertion order
    Map(Vec<(Value, Value)>),
    /// Reference to another configurable
    Handle(ComponentRef),
    /// Deferred reference to another property's final value
    Ref(PropertyRef),
}

impl Value {
    /// Build a list from anything convertible to values
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a tuple from anything convertible to values
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a mapping from key/value pairs
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short shape label used in diagnostics
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Map(_) => "mapping",
            Self::Handle(_) => "component reference",
            Self::Ref(_) => "property reference",
        }
    }

    /// Element slice for list, tuple and set values
    #[must_use]
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => Some(items),
            _ => None,
        }
    }

    /// String payload
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean payload
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload as float (ints widen)
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Check whether a late-bound reference occurs anywhere in the value
    #[must_use]
    pub fn contains_ref(&self) -> bool {
        match self {
            Self::Ref(_) => true,
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => {
                items.iter().any(Value::contains_ref)
            }
            Self::Map(entries) => entries
                .iter()
                .any(|(k, v)| k.contains_ref() || v.contains_ref()),
            _ => false,
        }
    }

    /// Options-language text of the value
    #[inline]
    #[must_use]
    pub fn to_options_string(&self) -> String {
        self.to_string()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::String(s) => f.write_str(&quote(s)),
            Self::List(items) => write_seq(f, "[", "]", items.iter().map(ToString::to_string)),
            Self::Tuple(items) => write_seq(f, "(", ")", items.iter().map(ToString::to_string)),
            Self::Set(items) => {
                let mut texts: Vec<String> = items.iter().map(ToString::to_string).collect();
                texts.sort();
                texts.dedup();
                write_seq(f, "[", "]", texts.into_iter())
            }
            Self::Map(entries) => {
                let mut texts: Vec<(String, String)> = entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                texts.sort_by(|a, b| a.0.cmp(&b.0));
                write_seq(
                    f,
                    "{",
                    "}",
                    texts.into_iter().map(|(k, v)| format!("{k}: {v}")),
                )
            }
            Self::Handle(handle) => f.write_str(&quote(&handle.full_name())),
            Self::Ref(reference) => write!(f, "{reference}"),
        }
    }
}

fn write_seq(
    f: &mut Formatter<'_>,
    open: &str,
    close: &str,
    items: impl Iterator<Item = String>,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&item)?;
    }
    f.write_str(close)
}

/// Float text that reads back as the same float
#[must_use]
pub fn format_float(x: f64) -> String {
    format!("{x:?}")
}

/// Escape backslashes and double quotes
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Double-quoted, escaped string literal
#[must_use]
pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}

/// Resolve C escapes inside a string literal body
///
/// Unknown escapes are kept verbatim, backslash included.
#[must_use]
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(e @ ('\\' | '"' | '\'')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i128::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i128::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i128::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Self::Int(i128::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<ComponentRef> for Value {
    fn from(handle: ComponentRef) -> Self {
        Self::Handle(handle)
    }
}

impl From<PropertyRef> for Value {
    fn from(reference: PropertyRef) -> Self {
        Self::Ref(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scalar_text() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Float(100.0).to_string(), "100.0");
        assert_eq!(Value::from("$VAR1").to_string(), "\"$VAR1\"");
    }

    #[test]
    fn test_quote_escapes_double_quotes() {
        assert_eq!(quote("some \"text\""), r#""some \"text\"""#);
        assert_eq!(unescape(r#"some \"text\""#), "some \"text\"");
    }

    #[test]
    fn test_multiline_string_kept_raw() {
        let v = Value::from("first\nsecond");
        assert_eq!(v.to_string(), "\"first\nsecond\"");
    }

    #[test]
    fn test_collections_text() {
        let list = Value::list(["$VAR1", "$VAR2"]);
        assert_eq!(list.to_string(), r#"["$VAR1", "$VAR2"]"#);

        let tuple = Value::tuple(["$VAR1", "$VAR2"]);
        assert_eq!(tuple.to_string(), r#"("$VAR1", "$VAR2")"#);

        let map = Value::map([("key", "$VAR2"), ("$VAR1", "value")]);
        assert_eq!(map.to_string(), r#"{"$VAR1": "value", "key": "$VAR2"}"#);
    }

    #[test]
    fn test_set_sorted_and_unique() {
        let set = Value::Set(vec![Value::from("b"), Value::from("a"), Value::from("b")]);
        assert_eq!(set.to_string(), r#"["a", "b"]"#);
    }

    #[test]
    fn test_component_ref() {
        let r = ComponentRef::parse("MyTool/X");
        assert_eq!(r.type_name, "MyTool");
        assert_eq!(r.name, "X");
        assert_eq!(Value::Handle(r).to_string(), "\"MyTool/X\"");

        let bare = ComponentRef::parse("Alone");
        assert_eq!(bare.full_name(), "Alone/Alone");
    }

    #[test]
    fn test_property_ref() {
        let r = PropertyRef::parse("ToolSvc.X.Level").expect("valid reference");
        assert_eq!(r.component, "ToolSvc.X");
        assert_eq!(r.property, "Level");
        assert_eq!(r.to_string(), "@ToolSvc.X.Level");
        assert!(PropertyRef::parse("NoDot").is_none());
    }

    #[test]
    fn test_contains_ref() {
        let nested = Value::list([Value::Ref(PropertyRef::new("A", "B"))]);
        assert!(nested.contains_ref());
        assert!(!Value::list([1, 2]).contains_ref());
    }

    proptest! {
        #[test]
        fn prop_escape_unescape(s in "[ -~\n]{0,40}") {
            prop_assert_eq!(unescape(&escape(&s)), s);
        }
    }
}

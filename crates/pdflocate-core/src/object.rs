//! Low-level object model: [`ObjectRef`] identifiers and the [`Value`] tagged union.
//!
//! Accessors expose raw dictionary entries as [`Value`]s so the algorithms in
//! this crate can pattern-match on object shapes without depending on a
//! particular PDF library.

use std::collections::BTreeMap;
use std::fmt;

/// Identifier of an indirect object within one document.
///
/// This is the object number from the cross-reference table, not a memory
/// address. Multiple pages may reference the same object (e.g. a shared image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ObjectRef(pub u32);

impl ObjectRef {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// The object number.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Parse an object identifier as printed by validators.
    ///
    /// Accepts `"7 0 obj"`, `"7 0 R"` or a bare `"7"`; only the leading
    /// object number is significant. Anything else yields `None`.
    ///
    /// ```
    /// use pdflocate_core::ObjectRef;
    ///
    /// assert_eq!(ObjectRef::parse("42 0 obj"), Some(ObjectRef(42)));
    /// assert_eq!(ObjectRef::parse("obj 42"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        text.split_whitespace()
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .map(ObjectRef)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0 obj", self.0)
    }
}

/// A PDF object value with explicit shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// A name object, without the leading slash.
    Name(String),
    /// A decoded string object.
    Text(String),
    Ref(ObjectRef),
    Array(Vec<Value>),
    Dict(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Name(n) => Some(n),
            _ => None,
        }
    }

    /// String content of a `Text` or `Name` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Name(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric content of an `Int` or `Real` value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Option<ObjectRef> {
        match self {
            Value::Ref(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Dictionary lookup; `None` for non-dictionaries and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict().and_then(|d| d.get(key))
    }

    /// Short name of the value's shape, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Real(_) => "real",
            Value::Name(_) => "name",
            Value::Text(_) => "text",
            Value::Ref(_) => "ref",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

/// Build a [`Value::Dict`] from `(key, value)` pairs.
pub fn dict<I, K>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_validator_forms() {
        assert_eq!(ObjectRef::parse("7 0 obj"), Some(ObjectRef(7)));
        assert_eq!(ObjectRef::parse("7 0 R"), Some(ObjectRef(7)));
        assert_eq!(ObjectRef::parse("  19  "), Some(ObjectRef(19)));
    }

    #[test]
    fn parse_malformed_is_absent() {
        assert_eq!(ObjectRef::parse(""), None);
        assert_eq!(ObjectRef::parse("abc 0 obj"), None);
        assert_eq!(ObjectRef::parse("-3 0 obj"), None);
    }

    #[test]
    fn display_uses_validator_form() {
        assert_eq!(ObjectRef(12).to_string(), "12 0 obj");
    }

    #[test]
    fn value_accessors_match_shape() {
        assert_eq!(Value::Name("H1".into()).as_name(), Some("H1"));
        assert_eq!(Value::Text("Intro".into()).as_name(), None);
        assert_eq!(Value::Text("Intro".into()).as_text(), Some("Intro"));
        assert_eq!(Value::Int(3).as_number(), Some(3.0));
        assert_eq!(Value::Real(1.5).as_int(), None);
        assert_eq!(Value::Ref(ObjectRef(4)).as_ref(), Some(ObjectRef(4)));
    }

    #[test]
    fn dict_lookup() {
        let d = dict([("MCID", Value::Int(3)), ("Type", Value::Name("MCR".into()))]);
        assert_eq!(d.get("MCID"), Some(&Value::Int(3)));
        assert_eq!(d.get("Pg"), None);
        assert_eq!(Value::Int(1).get("MCID"), None);
        assert_eq!(d.kind(), "dict");
    }
}

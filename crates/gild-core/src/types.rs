//! Declared type descriptions
//!
//! Parameter and return types as they appear in member declarations.
//! These are the *declared* side of dispatch; the runtime side is
//! [`TypeTag`](crate::value::TypeTag). Overload resolution ranks a
//! declared `ParamType` against a runtime value, so the two deliberately
//! do not mirror each other: `Number` is a declared type with no runtime
//! counterpart (it accepts both `Int` and `Float` values), and `Any` is
//! the universal top type.

use std::fmt;
use std::sync::Arc;

/// Declared parameter (or property) type
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    /// Boolean
    Bool,
    /// Concrete integer
    Int,
    /// General number; accepts `Int` by widening and `Float` exactly
    Number,
    /// String
    Str,
    /// A single-method capability interface
    Capability(Arc<CapabilityDef>),
    /// A named opaque service type
    Service(String),
    /// The universal top type
    Any,
}

impl ParamType {
    /// Shorthand for a named service type
    pub fn service(name: impl Into<String>) -> Self {
        ParamType::Service(name.into())
    }

    /// Shorthand for a capability type
    pub fn capability(def: &Arc<CapabilityDef>) -> Self {
        ParamType::Capability(def.clone())
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int => write!(f, "int"),
            ParamType::Number => write!(f, "number"),
            ParamType::Str => write!(f, "string"),
            ParamType::Capability(def) => write!(f, "{}", def.name),
            ParamType::Service(name) => write!(f, "{}", name),
            ParamType::Any => write!(f, "any"),
        }
    }
}

/// Declared return type of a method or capability
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    /// No result; a forwarded callback result is discarded
    Void,
    /// A value of the given declared type
    Value(ParamType),
}

impl ReturnType {
    /// Check if this is the void return type
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnType::Void)
    }

    /// The declared value type, if any
    pub fn value_type(&self) -> Option<&ParamType> {
        match self {
            ReturnType::Void => None,
            ReturnType::Value(ty) => Some(ty),
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Void => write!(f, "void"),
            ReturnType::Value(ty) => write!(f, "{}", ty),
        }
    }
}

/// A single-method capability interface
///
/// A capability is a strongly-typed stand-in for a bare callable: an
/// interface exposing exactly one callable method. Call sites may pass
/// either a capability object or a bare callable; the engine coerces the
/// latter into the former.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDef {
    /// Interface name; capability matching is by name
    pub name: String,
    /// Parameter types of the single method
    pub params: Vec<ParamType>,
    /// Return type of the single method
    pub ret: ReturnType,
}

impl CapabilityDef {
    /// Create a new capability interface description
    pub fn new(name: impl Into<String>, params: Vec<ParamType>, ret: ReturnType) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            params,
            ret,
        })
    }

    /// Number of parameters of the single method
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Key under which an injection point is resolved from the lookup service
///
/// Either the rendered declared type of the injected member or an explicit
/// override supplied on the injection marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Create a key from its string form
    pub fn new(key: impl Into<String>) -> Self {
        LookupKey(key.into())
    }

    /// The string form of the key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(key: &str) -> Self {
        LookupKey(key.to_string())
    }
}

impl From<String> for LookupKey {
    fn from(key: String) -> Self {
        LookupKey(key)
    }
}

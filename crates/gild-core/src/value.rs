//! Dynamic value representation
//!
//! Every argument, property, and result in decorated dispatch is a
//! [`Value`]. Scalars are stored inline; callables, capability objects,
//! services, and extension-bag handles are reference-counted, so cloning
//! a `Value` is always cheap and sharing is by identity.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::bag::ExtensionsRef;
use crate::error::DispatchResult;
use crate::types::CapabilityDef;

/// Function type backing a bare callable
pub type NativeFn = dyn Fn(&[Value]) -> DispatchResult<Value> + Send + Sync;

/// A bare callable value
///
/// The untyped closure of this system. Where a declared parameter expects
/// a capability object, a bare callable is coerced into one by the engine.
#[derive(Clone)]
pub struct Callable {
    inner: Arc<NativeFn>,
}

impl Callable {
    /// Wrap a function as a callable value
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the callable
    ///
    /// Errors raised by the wrapped function propagate unchanged.
    pub fn call(&self, args: &[Value]) -> DispatchResult<Value> {
        (self.inner)(args)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<callable>")
    }
}

/// An object satisfying a single-method capability interface
///
/// Holds the interface descriptor and the implementation. Constructed
/// either manually by a caller or by callback coercion; a method body
/// observes both the same way, through [`CapabilityValue::invoke`].
#[derive(Clone)]
pub struct CapabilityValue {
    def: Arc<CapabilityDef>,
    imp: Callable,
}

impl CapabilityValue {
    /// Create a capability object from an interface and an implementation
    pub fn new(def: Arc<CapabilityDef>, imp: Callable) -> Self {
        Self { def, imp }
    }

    /// The capability interface this object satisfies
    pub fn def(&self) -> &Arc<CapabilityDef> {
        &self.def
    }

    /// Invoke the single method of the capability
    pub fn invoke(&self, args: &[Value]) -> DispatchResult<Value> {
        self.imp.call(args)
    }
}

impl PartialEq for CapabilityValue {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name && self.imp == other.imp
    }
}

impl fmt::Debug for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<capability {}>", self.def.name)
    }
}

/// An opaque, named service payload
///
/// The shape in which a lookup service hands back values that have no
/// dynamic representation. Identity is the shared allocation; the name is
/// the declared service type used for overload matching and lookup keys.
#[derive(Clone)]
pub struct ServiceValue {
    type_name: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl ServiceValue {
    /// Wrap a payload as a named service value
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }

    /// The declared service type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Downcast the payload to its concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload.clone().downcast::<T>().ok()
    }
}

impl PartialEq for ServiceValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for ServiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<service {}>", self.type_name)
    }
}

/// Runtime type of a value, as seen by overload resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// Null
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// String
    Str,
    /// Bare callable
    Callable,
    /// Capability object, by interface name
    Capability(String),
    /// Opaque service, by type name
    Service(String),
    /// Extension-bag handle
    Extensions,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Null => write!(f, "null"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Str => write!(f, "string"),
            TypeTag::Callable => write!(f, "callable"),
            TypeTag::Capability(name) => write!(f, "{}", name),
            TypeTag::Service(name) => write!(f, "{}", name),
            TypeTag::Extensions => write!(f, "extensions"),
        }
    }
}

/// Dynamic value flowing through decorated dispatch
#[derive(Clone)]
pub enum Value {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// Bare callable
    Callable(Callable),
    /// Capability object
    Capability(CapabilityValue),
    /// Opaque named service
    Service(ServiceValue),
    /// Handle to an instance's extension bag
    Extensions(ExtensionsRef),
}

impl Value {
    /// Create a boolean value
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create an integer value
    pub fn int(i: i64) -> Self {
        Value::Int(i)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Create a callable value
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Value::Callable(Callable::new(f))
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract bare callable
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    /// Extract capability object
    pub fn as_capability(&self) -> Option<&CapabilityValue> {
        match self {
            Value::Capability(c) => Some(c),
            _ => None,
        }
    }

    /// Extract service value
    pub fn as_service(&self) -> Option<&ServiceValue> {
        match self {
            Value::Service(s) => Some(s),
            _ => None,
        }
    }

    /// Extract extension-bag handle
    pub fn as_extensions(&self) -> Option<&ExtensionsRef> {
        match self {
            Value::Extensions(bag) => Some(bag),
            _ => None,
        }
    }

    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Runtime type tag used by overload resolution
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Callable(_) => TypeTag::Callable,
            Value::Capability(c) => TypeTag::Capability(c.def().name.clone()),
            Value::Service(s) => TypeTag::Service(s.type_name().to_string()),
            Value::Extensions(_) => TypeTag::Extensions,
        }
    }

    /// Name of the runtime type, for diagnostics
    pub fn type_name(&self) -> String {
        self.type_tag().to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Capability(a), Value::Capability(b)) => a == b,
            (Value::Service(a), Value::Service(b)) => a == b,
            // Bag handles compare by identity
            (Value::Extensions(a), Value::Extensions(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "bool({})", b),
            Value::Int(i) => write!(f, "int({})", i),
            Value::Float(x) => write!(f, "float({})", x),
            Value::Str(s) => write!(f, "str({:?})", s),
            Value::Callable(_) => write!(f, "<callable>"),
            Value::Capability(c) => write!(f, "{:?}", c),
            Value::Service(s) => write!(f, "{:?}", s),
            Value::Extensions(_) => write!(f, "<extensions>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Callable(_) => write!(f, "<callable>"),
            Value::Capability(c) => write!(f, "<capability {}>", c.def().name),
            Value::Service(s) => write!(f, "<service {}>", s.type_name()),
            Value::Extensions(_) => write!(f, "<extensions>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParamType, ReturnType};

    #[test]
    fn test_value_scalars() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::bool(true).as_bool(), Some(true));
        assert_eq!(Value::int(42).as_int(), Some(42));
        assert_eq!(Value::float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::str("hi").as_str(), Some("hi"));
        assert_eq!(Value::int(42).as_str(), None);
    }

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::bool(false).is_truthy());
        assert!(Value::bool(true).is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(Value::int(-1).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(Value::callable(|_| Ok(Value::Null)).is_truthy());
    }

    #[test]
    fn test_value_type_tags() {
        assert_eq!(Value::Null.type_tag(), TypeTag::Null);
        assert_eq!(Value::int(1).type_tag(), TypeTag::Int);
        assert_eq!(Value::float(1.0).type_tag(), TypeTag::Float);
        assert_eq!(Value::str("s").type_tag(), TypeTag::Str);
        assert_eq!(
            Value::callable(|_| Ok(Value::Null)).type_tag(),
            TypeTag::Callable
        );

        let svc = Value::Service(ServiceValue::new("Logger", ()));
        assert_eq!(svc.type_tag(), TypeTag::Service("Logger".to_string()));
        assert_eq!(svc.type_name(), "Logger");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::bool(true).to_string(), "true");
        assert_eq!(Value::int(-3).to_string(), "-3");
        assert_eq!(Value::str("hello").to_string(), "hello");
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::int(1), Value::int(1));
        assert_ne!(Value::int(1), Value::int(2));
        assert_ne!(Value::int(1), Value::float(1.0));
        assert_eq!(Value::str("a"), Value::str("a"));

        // Callables compare by identity
        let c = Callable::new(|_| Ok(Value::Null));
        assert_eq!(Value::Callable(c.clone()), Value::Callable(c.clone()));
        let d = Callable::new(|_| Ok(Value::Null));
        assert_ne!(Value::Callable(c), Value::Callable(d));
    }

    #[test]
    fn test_callable_call() {
        let c = Callable::new(|args| Ok(Value::int(args.len() as i64)));
        assert_eq!(c.call(&[]).unwrap(), Value::int(0));
        assert_eq!(
            c.call(&[Value::Null, Value::Null]).unwrap(),
            Value::int(2)
        );
    }

    #[test]
    fn test_capability_invoke() {
        let def = CapabilityDef::new(
            "Transformer",
            vec![ParamType::Str],
            ReturnType::Value(ParamType::Str),
        );
        let cap = CapabilityValue::new(
            def.clone(),
            Callable::new(|args| {
                let s = args[0].as_str().unwrap_or_default();
                Ok(Value::str(s.to_uppercase()))
            }),
        );

        assert_eq!(cap.def().name, "Transformer");
        assert_eq!(
            cap.invoke(&[Value::str("abc")]).unwrap(),
            Value::str("ABC")
        );
    }

    #[test]
    fn test_service_downcast() {
        let svc = ServiceValue::new("Counter", 7usize);
        assert_eq!(svc.type_name(), "Counter");
        assert_eq!(*svc.downcast::<usize>().unwrap(), 7);
        assert!(svc.downcast::<String>().is_none());
    }
}

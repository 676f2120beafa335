//! Base type definitions
//!
//! The member-reflection input to the engine: an embedder describes a
//! plain base type as data (properties, methods with parameter types,
//! markers), and [`decorate`](crate::decorate::Decorator::decorate) turns
//! the description into a dispatchable registry entry. Method and
//! constructor bodies are native functions receiving the decorated
//! instance, so they can call back through the dispatch surface.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gild_core::{DispatchResult, ParamType, ReturnType, Value};

use crate::instance::DecoratedInstance;

/// Implementation of a declared method
pub type MethodBody =
    Arc<dyn Fn(&DecoratedInstance, &[Value]) -> DispatchResult<Value> + Send + Sync>;

/// Implementation of a constructor, run inside the construction window
pub type ConstructorBody =
    Arc<dyn Fn(&DecoratedInstance, &[Value]) -> DispatchResult<()> + Send + Sync>;

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// An annotation on a type or method
///
/// Marker names are matched against the marker sets in
/// [`DecorateOptions`](crate::decorate::DecorateOptions). An injection
/// marker may carry an explicit lookup-key override.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Marker name
    pub name: String,
    /// Explicit lookup-key override (injection markers only)
    pub key: Option<String>,
}

impl Marker {
    /// Create a marker
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    /// Create a marker with an explicit lookup-key override
    pub fn with_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }
}

/// A declared method
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Ordered parameter types
    pub params: Vec<ParamType>,
    /// Declared return type
    pub ret: ReturnType,
    /// Markers on this method
    pub markers: Vec<Marker>,
    /// Native implementation
    pub body: MethodBody,
}

impl MethodDef {
    /// Create a method definition with no parameters and void return
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&DecoratedInstance, &[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            ret: ReturnType::Void,
            markers: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Add a parameter
    pub fn param(mut self, ty: ParamType) -> Self {
        self.params.push(ty);
        self
    }

    /// Set the return type
    pub fn returns(mut self, ty: ParamType) -> Self {
        self.ret = ReturnType::Value(ty);
        self
    }

    /// Add a marker
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("markers", &self.markers)
            .finish()
    }
}

/// A declared field-backed property
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Declared value type
    pub ty: ParamType,
    /// Initial value, applied before the constructor body runs
    pub initial: Option<Value>,
}

impl PropertyDef {
    /// Create a property definition
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            initial: None,
        }
    }

    /// Set the initial value
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}

/// A plain base type, as seen by the engine
///
/// Immutable once built. Each built definition gets a process-unique id,
/// which is the key of the per-type registry cache.
#[derive(Clone)]
pub struct TypeDef {
    id: u64,
    name: String,
    markers: Vec<Marker>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    constructor: Option<ConstructorBody>,
}

impl TypeDef {
    /// Start building a type definition
    pub fn builder(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            markers: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            constructor: None,
        }
    }

    /// Process-unique type id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Markers on the type itself
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Check for a type-level marker by name
    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.iter().any(|m| m.name == name)
    }

    /// Declared properties
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Declared methods, in declaration order
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Constructor body, if declared
    pub fn constructor(&self) -> Option<&ConstructorBody> {
        self.constructor.as_ref()
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("markers", &self.markers)
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Builder for [`TypeDef`]
pub struct TypeBuilder {
    name: String,
    markers: Vec<Marker>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    constructor: Option<ConstructorBody>,
}

impl TypeBuilder {
    /// Add a type-level marker
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Add a property
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Set the constructor body
    pub fn constructor<F>(mut self, body: F) -> Self
    where
        F: Fn(&DecoratedInstance, &[Value]) -> DispatchResult<()> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(body));
        self
    }

    /// Build the type definition, assigning its id
    pub fn build(self) -> TypeDef {
        TypeDef {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            markers: self.markers,
            properties: self.properties,
            methods: self.methods,
            constructor: self.constructor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assigns_unique_ids() {
        let a = TypeDef::builder("A").build();
        let b = TypeDef::builder("B").build();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "A");
    }

    #[test]
    fn test_method_def_builder() {
        let m = MethodDef::new("scale", |_, args| Ok(args[0].clone()))
            .param(ParamType::Int)
            .returns(ParamType::Int)
            .marker(Marker::new("inline"));

        assert_eq!(m.name, "scale");
        assert_eq!(m.arity(), 1);
        assert_eq!(m.ret, ReturnType::Value(ParamType::Int));
        assert_eq!(m.markers.len(), 1);
    }

    #[test]
    fn test_type_markers() {
        let def = TypeDef::builder("Sealed")
            .marker(Marker::new("non_extensible"))
            .build();

        assert!(def.has_marker("non_extensible"));
        assert!(!def.has_marker("inject"));
    }

    #[test]
    fn test_marker_key_override() {
        let m = Marker::with_key("inject", "app.Clock");
        assert_eq!(m.name, "inject");
        assert_eq!(m.key.as_deref(), Some("app.Clock"));
    }

    #[test]
    fn test_typedef_collects_members() {
        let def = TypeDef::builder("Widget")
            .property(PropertyDef::new("label", ParamType::Str).initial(Value::str("")))
            .method(MethodDef::new("render", |_, _| Ok(Value::Null)))
            .constructor(|_, _| Ok(()))
            .build();

        assert_eq!(def.properties().len(), 1);
        assert_eq!(def.methods().len(), 1);
        assert!(def.constructor().is_some());
    }
}

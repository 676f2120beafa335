//! Gild decoration engine
//!
//! Synthesizes decorated variants of plain type definitions: member
//! dispatch against a decorated instance is intercepted so that unknown
//! members route to configurable fallback handlers, bare callables
//! coerce into declared capability parameters, injection points resolve
//! lazily (at most once per instance) from a pluggable lookup service,
//! and same-named overloads are selected by the runtime types of the
//! supplied arguments.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use gild_engine::{
//!     DecorateOptions, Decorator, Marker, MethodDef, ServiceMap, TypeDef,
//! };
//! use gild_engine::core::{ParamType, Value};
//!
//! let services = Arc::new(ServiceMap::new());
//! services.register("Greeter", Value::str("hello"));
//!
//! let def = TypeDef::builder("Task")
//!     .method(
//!         MethodDef::new("greeter", |_, _| Ok(Value::Null))
//!             .returns(ParamType::service("Greeter"))
//!             .marker(Marker::new("inject")),
//!     )
//!     .build();
//!
//! let decorator = Decorator::new(DecorateOptions::default(), services);
//! let factory = decorator.decorate(&def).unwrap();
//! let task = factory.instantiate(&[]).unwrap();
//!
//! assert_eq!(task.invoke("greeter", &[]).unwrap(), Value::str("hello"));
//! ```

pub mod coerce;
pub mod decorate;
pub mod inject;
pub mod instance;
pub mod missing;
pub mod registry;
pub mod resolve;
pub mod typedef;

/// The core value model, re-exported for embedders
pub use gild_core as core;

pub use coerce::coerce;
pub use decorate::{
    DecorateOptions, DecoratedTypeFactory, Decorator, DEFAULT_INJECTION_MARKER,
    DEFAULT_NON_EXTENSIBLE_MARKER,
};
pub use inject::{InjectionSlots, LookupService, ServiceMap, SlotState};
pub use instance::{DecoratedInstance, EXTENSIONS_PROPERTY};
pub use missing::{
    MethodMissingHandler, MissingHooks, PropertyGetMissingHandler, PropertySetMissingHandler,
};
pub use registry::{
    InjectionPoint, MethodDescriptor, PropertySlot, RegistryEntry, SetterDescriptor,
};
pub use resolve::{resolve, Rank, Resolution, ResolvedCall};
pub use typedef::{
    ConstructorBody, Marker, MethodBody, MethodDef, PropertyDef, TypeBuilder, TypeDef,
};

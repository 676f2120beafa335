//! Core value model for the Gild object-decoration engine.
//!
//! This crate defines the dynamic values that flow through decorated
//! dispatch, the runtime type tags that drive overload selection, the
//! per-instance extension bag, and the error types shared by every layer
//! of the engine. The dispatch machinery itself lives in `gild-engine`.

pub mod bag;
pub mod error;
pub mod types;
pub mod value;

pub use bag::{ExtensionBag, ExtensionsRef};
pub use error::{DispatchError, DispatchResult, LookupError, RaisedError, RegistrationError};
pub use types::{CapabilityDef, LookupKey, ParamType, ReturnType};
pub use value::{Callable, CapabilityValue, ServiceValue, TypeTag, Value};

//! Missing-member protocol
//!
//! The fallback chain invoked when no declared member matches a call or
//! property access: three independently configurable handler slots, one
//! per access kind. An empty slot means "no fallback configured", in
//! which case dispatch fails with the distinguishable unknown-method or
//! unknown-property error kind.

use std::fmt;
use std::sync::Arc;

use gild_core::{DispatchResult, Value};

/// Handler for calls with no matching declared method
pub type MethodMissingHandler =
    Arc<dyn Fn(&str, &[Value]) -> DispatchResult<Value> + Send + Sync>;

/// Handler for reads of undeclared properties
pub type PropertyGetMissingHandler = Arc<dyn Fn(&str) -> DispatchResult<Value> + Send + Sync>;

/// Handler for writes to undeclared properties
pub type PropertySetMissingHandler =
    Arc<dyn Fn(&str, Value) -> DispatchResult<()> + Send + Sync>;

/// The three optional fallback slots
#[derive(Default, Clone)]
pub struct MissingHooks {
    /// Invoked on `NoMatch` from the overload resolver
    pub method: Option<MethodMissingHandler>,
    /// Invoked when a property read finds no declared member or bag entry
    pub property_get: Option<PropertyGetMissingHandler>,
    /// Invoked when a property write finds no declared member or bag entry
    pub property_set: Option<PropertySetMissingHandler>,
}

impl MissingHooks {
    /// Create hooks with no fallback configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no fallback is configured
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.property_get.is_none() && self.property_set.is_none()
    }
}

impl fmt::Debug for MissingHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissingHooks")
            .field("method", &self.method.is_some())
            .field("property_get", &self.property_get.is_some())
            .field("property_set", &self.property_set.is_some())
            .finish()
    }
}

//! Decoration facade
//!
//! The engine's external interface: a [`Decorator`] holds the marker
//! configuration, the lookup service, and the per-type registry cache;
//! [`Decorator::decorate`] reflects a type once and returns a
//! [`DecoratedTypeFactory`] that instantiates decorated instances and
//! carries the type-level missing-member hooks.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use gild_core::{DispatchResult, RegistrationError, Value};

use crate::inject::LookupService;
use crate::instance::DecoratedInstance;
use crate::missing::MissingHooks;
use crate::registry::RegistryEntry;
use crate::typedef::TypeDef;

/// Default injection marker name
pub const DEFAULT_INJECTION_MARKER: &str = "inject";
/// Default non-extensible marker name
pub const DEFAULT_NON_EXTENSIBLE_MARKER: &str = "non_extensible";

/// Marker configuration for a decorator
#[derive(Debug, Clone)]
pub struct DecorateOptions {
    injection_markers: FxHashSet<String>,
    non_extensible_markers: FxHashSet<String>,
}

impl DecorateOptions {
    /// Options with no markers configured
    pub fn new() -> Self {
        Self {
            injection_markers: FxHashSet::default(),
            non_extensible_markers: FxHashSet::default(),
        }
    }

    /// Add an injection marker name
    pub fn injection_marker(mut self, name: impl Into<String>) -> Self {
        self.injection_markers.insert(name.into());
        self
    }

    /// Add a non-extensible marker name
    pub fn non_extensible_marker(mut self, name: impl Into<String>) -> Self {
        self.non_extensible_markers.insert(name.into());
        self
    }

    /// Check if a marker name designates an injection point
    pub fn is_injection_marker(&self, name: &str) -> bool {
        self.injection_markers.contains(name)
    }

    /// Check if a marker name opts a type out of extensibility
    pub fn is_non_extensible_marker(&self, name: &str) -> bool {
        self.non_extensible_markers.contains(name)
    }
}

impl Default for DecorateOptions {
    /// The conventional marker names
    fn default() -> Self {
        Self::new()
            .injection_marker(DEFAULT_INJECTION_MARKER)
            .non_extensible_marker(DEFAULT_NON_EXTENSIBLE_MARKER)
    }
}

struct CachedType {
    entry: Arc<RegistryEntry>,
    type_hooks: Arc<RwLock<MissingHooks>>,
}

/// Decorates plain type definitions into dispatchable factories
pub struct Decorator {
    options: DecorateOptions,
    lookup: Arc<dyn LookupService>,
    cache: DashMap<u64, Arc<CachedType>>,
}

impl Decorator {
    /// Create a decorator over a lookup service
    pub fn new(options: DecorateOptions, lookup: Arc<dyn LookupService>) -> Self {
        Self {
            options,
            lookup,
            cache: DashMap::new(),
        }
    }

    /// The marker configuration
    pub fn options(&self) -> &DecorateOptions {
        &self.options
    }

    /// Decorate a type
    ///
    /// Idempotent and cached per type: the first call pays the
    /// reflection cost, later calls reuse the entry (and the type-level
    /// hooks). Fails if the type's injection declarations are malformed.
    pub fn decorate(&self, def: &TypeDef) -> Result<DecoratedTypeFactory, RegistrationError> {
        let cached = match self.cache.get(&def.id()) {
            Some(cached) => cached.clone(),
            None => {
                let entry = Arc::new(RegistryEntry::build(def, &self.options)?);
                let built = Arc::new(CachedType {
                    entry,
                    type_hooks: Arc::new(RwLock::new(MissingHooks::new())),
                });
                // First build wins if two callers raced
                self.cache.entry(def.id()).or_insert(built).clone()
            }
        };

        Ok(DecoratedTypeFactory {
            entry: cached.entry.clone(),
            lookup: self.lookup.clone(),
            type_hooks: cached.type_hooks.clone(),
        })
    }
}

/// Instantiates decorated instances of one type
#[derive(Clone)]
pub struct DecoratedTypeFactory {
    entry: Arc<RegistryEntry>,
    lookup: Arc<dyn LookupService>,
    type_hooks: Arc<RwLock<MissingHooks>>,
}

impl DecoratedTypeFactory {
    /// Name of the decorated type
    pub fn type_name(&self) -> &str {
        self.entry.type_name()
    }

    /// The shared registry entry
    pub fn entry(&self) -> &Arc<RegistryEntry> {
        &self.entry
    }

    /// Create a decorated instance
    ///
    /// Runs the constructor body inside the construction window: until
    /// it returns, dispatch against the instance falls back to plain
    /// declared-member lookup and never consults the extension bag or
    /// the missing-member hooks.
    pub fn instantiate(&self, args: &[Value]) -> DispatchResult<Arc<DecoratedInstance>> {
        let instance =
            DecoratedInstance::new(self.entry.clone(), self.lookup.clone(), self.type_hooks.clone());
        if let Some(constructor) = self.entry.constructor() {
            constructor(&instance, args)?;
        }
        instance.finish_construction();
        Ok(instance)
    }

    /// Configure the type-level method-missing hook
    ///
    /// Used by instances that have no instance-level hook configured.
    pub fn set_method_missing<F>(&self, handler: F)
    where
        F: Fn(&str, &[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.type_hooks.write().method = Some(Arc::new(handler));
    }

    /// Configure the type-level property-get-missing hook
    pub fn set_property_get_missing<F>(&self, handler: F)
    where
        F: Fn(&str) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.type_hooks.write().property_get = Some(Arc::new(handler));
    }

    /// Configure the type-level property-set-missing hook
    pub fn set_property_set_missing<F>(&self, handler: F)
    where
        F: Fn(&str, Value) -> DispatchResult<()> + Send + Sync + 'static,
    {
        self.type_hooks.write().property_set = Some(Arc::new(handler));
    }
}

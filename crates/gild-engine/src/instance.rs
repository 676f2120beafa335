//! Decorated instance wrapper
//!
//! The synthesized object: every call and property access against it
//! funnels through one dispatch surface that composes the member
//! registry, the overload resolver, callback coercion, the injection
//! cache, and the missing-member protocol.
//!
//! During the base type's own construction window the wrapper runs in a
//! degraded-but-safe mode: dispatch falls back to plain declared-member
//! lookup and never consults the extension bag or the missing-member
//! hooks. The window closes when the constructor body returns.
//!
//! No instance lock is held while a method body, hook, coerced callback,
//! or lookup service runs, so forwarded calls may reenter the same or
//! another decorated instance freely.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use gild_core::{DispatchError, DispatchResult, ExtensionBag, ExtensionsRef, Value};

use crate::coerce::coerce;
use crate::inject::{InjectionSlots, LookupService};
use crate::missing::{
    MethodMissingHandler, MissingHooks, PropertyGetMissingHandler, PropertySetMissingHandler,
};
use crate::registry::RegistryEntry;
use crate::resolve::{resolve, Resolution, ResolvedCall};

/// Conventional name of the extension-container property
pub const EXTENSIONS_PROPERTY: &str = "ext";

/// An instance whose member dispatch passes through the decoration layer
pub struct DecoratedInstance {
    entry: Arc<RegistryEntry>,
    lookup: Arc<dyn LookupService>,
    properties: Mutex<Vec<Value>>,
    slots: InjectionSlots,
    hooks: RwLock<MissingHooks>,
    type_hooks: Arc<RwLock<MissingHooks>>,
    bag: OnceCell<ExtensionsRef>,
    constructed: AtomicBool,
}

impl DecoratedInstance {
    pub(crate) fn new(
        entry: Arc<RegistryEntry>,
        lookup: Arc<dyn LookupService>,
        type_hooks: Arc<RwLock<MissingHooks>>,
    ) -> Arc<Self> {
        let properties = entry
            .properties()
            .iter()
            .map(|slot| slot.initial.clone().unwrap_or(Value::Null))
            .collect();
        let slot_count = entry.injection_points().len();

        Arc::new(Self {
            entry,
            lookup,
            properties: Mutex::new(properties),
            slots: InjectionSlots::new(slot_count),
            hooks: RwLock::new(MissingHooks::new()),
            type_hooks,
            bag: OnceCell::new(),
            constructed: AtomicBool::new(false),
        })
    }

    pub(crate) fn finish_construction(&self) {
        self.constructed.store(true, Ordering::Release);
    }

    fn constructing(&self) -> bool {
        !self.constructed.load(Ordering::Acquire)
    }

    /// Name of the decorated type
    pub fn type_name(&self) -> &str {
        self.entry.type_name()
    }

    /// The shared member registry entry of the decorated type
    pub fn entry(&self) -> &Arc<RegistryEntry> {
        &self.entry
    }

    /// Whether this instance carries an extension bag
    pub fn is_extensible(&self) -> bool {
        self.entry.is_extensible()
    }

    // ========================================================================
    // Dispatch surface
    // ========================================================================

    /// Call a method by name
    ///
    /// Declared members are selected by the overload resolver; a bare
    /// callable in the trailing position is coerced when the selected
    /// overload declares a capability there. Unmatched calls route to the
    /// method-missing hook, or fail with `UnknownMethod`.
    pub fn invoke(&self, name: &str, args: &[Value]) -> DispatchResult<Value> {
        match resolve(&self.entry, name, args) {
            Resolution::Match(resolved) => self.invoke_resolved(name, args, resolved),
            Resolution::NoMatch => self.method_missing(name, args),
        }
    }

    fn invoke_resolved(
        &self,
        name: &str,
        args: &[Value],
        resolved: ResolvedCall,
    ) -> DispatchResult<Value> {
        // Injection points dispatch through the cache, never the body
        if let Some(point) = self.entry.injection_point(name) {
            if point.getter == resolved.ordinal {
                return self.slots.get(point, self.lookup.as_ref());
            }
            if let Some(setter) = &point.setter {
                if setter.ordinal == resolved.ordinal {
                    self.slots.set(point, args[0].clone());
                    return Ok(Value::Null);
                }
            }
        }

        let body = self.entry.method(resolved.ordinal).body.clone();
        match resolved.coerce_trailing {
            Some(def) => {
                let mut call_args = args.to_vec();
                if let Some(last) = call_args.last_mut() {
                    if let Value::Callable(raw) = last.clone() {
                        *last = Value::Capability(coerce(&def, &raw));
                    }
                }
                body(self, &call_args)
            }
            None => body(self, args),
        }
    }

    /// Read a property by name
    ///
    /// Injection points resolve through the injection cache before any
    /// other lookup. Otherwise: declared property, extension container,
    /// bag entry, get-missing hook, `UnknownProperty`.
    pub fn get(&self, name: &str) -> DispatchResult<Value> {
        if let Some(point) = self.entry.injection_point(name) {
            return self.slots.get(point, self.lookup.as_ref());
        }
        if let Some(slot) = self.entry.property(name) {
            return Ok(self.properties.lock()[slot.index].clone());
        }
        if self.constructing() {
            return Err(DispatchError::UnknownProperty {
                name: name.to_string(),
            });
        }
        if self.entry.is_extensible() {
            if name == EXTENSIONS_PROPERTY {
                return Ok(Value::Extensions(self.bag_handle()));
            }
            if let Some(bag) = self.bag.get() {
                if let Some(value) = bag.lock().get(name) {
                    return Ok(value);
                }
            }
        }
        if let Some(handler) = self.property_get_hook() {
            return handler(name);
        }
        Err(DispatchError::UnknownProperty {
            name: name.to_string(),
        })
    }

    /// Write a property by name
    ///
    /// An injection point with a paired setter transitions its slot to
    /// the explicitly-set state. Otherwise: declared property, existing
    /// bag entry, set-missing hook, `UnknownProperty`. New dynamic names
    /// enter the bag only through the extension handle.
    pub fn set(&self, name: &str, value: Value) -> DispatchResult<()> {
        if let Some(point) = self.entry.injection_point(name) {
            if point.has_setter() {
                self.slots.set(point, value);
                return Ok(());
            }
        }
        if let Some(slot) = self.entry.property(name) {
            let index = slot.index;
            self.properties.lock()[index] = value;
            return Ok(());
        }
        if self.constructing() {
            return Err(DispatchError::UnknownProperty {
                name: name.to_string(),
            });
        }
        if self.entry.is_extensible() && name != EXTENSIONS_PROPERTY {
            if let Some(bag) = self.bag.get() {
                let mut bag = bag.lock();
                if bag.contains(name) {
                    bag.set(name, value);
                    return Ok(());
                }
            }
        }
        if let Some(handler) = self.property_set_hook() {
            return handler(name, value);
        }
        Err(DispatchError::UnknownProperty {
            name: name.to_string(),
        })
    }

    /// Explicitly assign an injection point
    ///
    /// Legal only when the point declares a paired setter; transitions
    /// the slot unconditionally and permanently disables lookup for it.
    pub fn set_injected(&self, name: &str, value: Value) -> DispatchResult<()> {
        let Some(point) = self.entry.injection_point(name) else {
            return Err(DispatchError::UnknownProperty {
                name: name.to_string(),
            });
        };
        if !point.has_setter() {
            return Err(DispatchError::UnknownMethod {
                name: name.to_string(),
                arity: 1,
            });
        }
        self.slots.set(point, value);
        Ok(())
    }

    /// The extension bag handle, created lazily
    ///
    /// Fails with `UnknownProperty` for non-extensible types.
    pub fn extensions(&self) -> DispatchResult<ExtensionsRef> {
        if !self.entry.is_extensible() {
            return Err(DispatchError::UnknownProperty {
                name: EXTENSIONS_PROPERTY.to_string(),
            });
        }
        Ok(self.bag_handle())
    }

    fn bag_handle(&self) -> ExtensionsRef {
        self.bag.get_or_init(ExtensionBag::shared).clone()
    }

    // ========================================================================
    // Missing-member hooks
    // ========================================================================

    /// Configure the method-missing hook for this instance
    pub fn set_method_missing<F>(&self, handler: F)
    where
        F: Fn(&str, &[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.hooks.write().method = Some(Arc::new(handler));
    }

    /// Configure the property-get-missing hook for this instance
    pub fn set_property_get_missing<F>(&self, handler: F)
    where
        F: Fn(&str) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        self.hooks.write().property_get = Some(Arc::new(handler));
    }

    /// Configure the property-set-missing hook for this instance
    pub fn set_property_set_missing<F>(&self, handler: F)
    where
        F: Fn(&str, Value) -> DispatchResult<()> + Send + Sync + 'static,
    {
        self.hooks.write().property_set = Some(Arc::new(handler));
    }

    fn method_missing(&self, name: &str, args: &[Value]) -> DispatchResult<Value> {
        if self.constructing() {
            return Err(DispatchError::UnknownMethod {
                name: name.to_string(),
                arity: args.len(),
            });
        }
        if let Some(handler) = self.method_missing_hook() {
            return handler(name, args);
        }
        Err(DispatchError::UnknownMethod {
            name: name.to_string(),
            arity: args.len(),
        })
    }

    fn method_missing_hook(&self) -> Option<MethodMissingHandler> {
        let own = self.hooks.read().method.clone();
        own.or_else(|| self.type_hooks.read().method.clone())
    }

    fn property_get_hook(&self) -> Option<PropertyGetMissingHandler> {
        let own = self.hooks.read().property_get.clone();
        own.or_else(|| self.type_hooks.read().property_get.clone())
    }

    fn property_set_hook(&self) -> Option<PropertySetMissingHandler> {
        let own = self.hooks.read().property_set.clone();
        own.or_else(|| self.type_hooks.read().property_set.clone())
    }
}

impl fmt::Debug for DecoratedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedInstance")
            .field("type_name", &self.entry.type_name())
            .field("constructed", &!self.constructing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::DecorateOptions;
    use crate::inject::ServiceMap;
    use crate::typedef::{MethodDef, PropertyDef, TypeDef};
    use gild_core::ParamType;

    fn instance_of(def: &TypeDef) -> Arc<DecoratedInstance> {
        let entry = Arc::new(RegistryEntry::build(def, &DecorateOptions::default()).unwrap());
        let inst = DecoratedInstance::new(
            entry,
            Arc::new(ServiceMap::new()),
            Arc::new(RwLock::new(MissingHooks::new())),
        );
        inst.finish_construction();
        inst
    }

    #[test]
    fn test_declared_property_roundtrip() {
        let def = TypeDef::builder("Widget")
            .property(PropertyDef::new("label", ParamType::Str).initial(Value::str("unset")))
            .build();
        let inst = instance_of(&def);

        assert_eq!(inst.get("label").unwrap(), Value::str("unset"));
        inst.set("label", Value::str("ready")).unwrap();
        assert_eq!(inst.get("label").unwrap(), Value::str("ready"));
    }

    #[test]
    fn test_declared_method_invoke() {
        let def = TypeDef::builder("Widget")
            .method(
                MethodDef::new("double", |_, args| {
                    Ok(Value::int(args[0].as_int().unwrap_or(0) * 2))
                })
                .param(ParamType::Int)
                .returns(ParamType::Int),
            )
            .build();
        let inst = instance_of(&def);

        assert_eq!(
            inst.invoke("double", &[Value::int(21)]).unwrap(),
            Value::int(42)
        );
    }

    #[test]
    fn test_unknown_property_without_hook() {
        let def = TypeDef::builder("Widget").build();
        let inst = instance_of(&def);

        let err = inst.get("ghost").unwrap_err();
        match err {
            DispatchError::UnknownProperty { name } => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownProperty, got {:?}", other),
        }
    }

    #[test]
    fn test_extension_handle_shares_bag() {
        let def = TypeDef::builder("Widget").build();
        let inst = instance_of(&def);

        let handle = inst.get(EXTENSIONS_PROPERTY).unwrap();
        let bag = handle.as_extensions().unwrap();
        bag.lock().set("mood", Value::str("good"));

        assert_eq!(inst.get("mood").unwrap(), Value::str("good"));
        inst.set("mood", Value::str("great")).unwrap();
        assert_eq!(inst.get("mood").unwrap(), Value::str("great"));
    }

    #[test]
    fn test_set_injected_requires_setter() {
        let def = TypeDef::builder("Widget")
            .method(
                MethodDef::new("logger", |_, _| Ok(Value::Null))
                    .returns(ParamType::service("Logger"))
                    .marker(crate::typedef::Marker::new("inject")),
            )
            .build();
        let inst = instance_of(&def);

        let err = inst.set_injected("logger", Value::Null).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnknownMethod { arity: 1, .. }
        ));

        let err = inst.set_injected("nothing", Value::Null).unwrap_err();
        assert!(err.is_unknown_property());
    }
}

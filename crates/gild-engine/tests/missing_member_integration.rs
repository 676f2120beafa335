//! Integration tests for the missing-member protocol and extension bags
//!
//! Tests cover:
//! - Typed unknown-method / unknown-property failures without hooks
//! - The three configurable fallback hooks
//! - Type-level hooks as the fallback for unconfigured instances
//! - Extension-bag routing and the non-extensible marker
//! - Degraded dispatch inside the construction window

use std::sync::Arc;

use parking_lot::Mutex;

use gild_engine::core::{DispatchError, ParamType, Value};
use gild_engine::{
    DecorateOptions, Decorator, DecoratedTypeFactory, Marker, MethodDef, PropertyDef, ServiceMap,
    TypeDef, EXTENSIONS_PROPERTY,
};

fn decorate(def: &TypeDef) -> DecoratedTypeFactory {
    Decorator::new(DecorateOptions::default(), Arc::new(ServiceMap::new()))
        .decorate(def)
        .unwrap()
}

#[test]
fn test_unknown_property_names_the_property() {
    let def = TypeDef::builder("Plain").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    match inst.get("shoe_size").unwrap_err() {
        DispatchError::UnknownProperty { name } => assert_eq!(name, "shoe_size"),
        other => panic!("expected UnknownProperty, got {:?}", other),
    }
}

#[test]
fn test_unknown_method_names_method_and_arity() {
    let def = TypeDef::builder("Plain").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    match inst.invoke("m1", &[]).unwrap_err() {
        DispatchError::UnknownMethod { name, arity } => {
            assert_eq!(name, "m1");
            assert_eq!(arity, 0);
        }
        other => panic!("expected UnknownMethod, got {:?}", other),
    }
}

#[test]
fn test_method_missing_hook_records_call_once() {
    let def = TypeDef::builder("Plain").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    let recorded: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::new(Mutex::new(Vec::new()));
    let store = recorded.clone();
    inst.set_method_missing(move |name, args| {
        store.lock().push((name.to_string(), args.to_vec()));
        Ok(Value::Null)
    });

    inst.invoke("m1", &[]).unwrap();

    let calls = recorded.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "m1");
    assert!(calls[0].1.is_empty());
}

#[test]
fn test_property_hooks() {
    let def = TypeDef::builder("Plain").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    inst.set_property_get_missing(|name| Ok(Value::str(format!("virtual:{}", name))));

    let written: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let store = written.clone();
    inst.set_property_set_missing(move |name, value| {
        store.lock().push((name.to_string(), value));
        Ok(())
    });

    assert_eq!(inst.get("anything").unwrap(), Value::str("virtual:anything"));
    inst.set("anything", Value::int(9)).unwrap();
    assert_eq!(written.lock()[0], ("anything".to_string(), Value::int(9)));
}

#[test]
fn test_instance_hook_shadows_type_hook() {
    let def = TypeDef::builder("Plain").build();
    let factory = decorate(&def);
    factory.set_method_missing(|_, _| Ok(Value::str("type-level")));

    let plain = factory.instantiate(&[]).unwrap();
    assert_eq!(plain.invoke("m1", &[]).unwrap(), Value::str("type-level"));

    let special = factory.instantiate(&[]).unwrap();
    special.set_method_missing(|_, _| Ok(Value::str("instance-level")));
    assert_eq!(
        special.invoke("m1", &[]).unwrap(),
        Value::str("instance-level")
    );
    // The sibling instance still falls back to the type-level hook
    assert_eq!(plain.invoke("m1", &[]).unwrap(), Value::str("type-level"));
}

#[test]
fn test_hook_errors_propagate_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("handler refused")]
    struct Refused;

    let def = TypeDef::builder("Plain").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();
    inst.set_method_missing(|_, _| Err(DispatchError::raised(Refused)));

    match inst.invoke("m1", &[]).unwrap_err() {
        DispatchError::Raised(inner) => {
            assert!(inner.downcast_ref::<Refused>().is_some());
        }
        other => panic!("expected Raised, got {:?}", other),
    }
}

#[test]
fn test_extension_bag_roundtrip() {
    let def = TypeDef::builder("Open").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    // Dynamic names enter the bag only through the container handle
    let handle = inst.get(EXTENSIONS_PROPERTY).unwrap();
    let bag = handle.as_extensions().cloned().unwrap();
    bag.lock().set("flavor", Value::str("vanilla"));

    assert_eq!(inst.get("flavor").unwrap(), Value::str("vanilla"));
    inst.set("flavor", Value::str("plum")).unwrap();
    assert_eq!(bag.lock().get("flavor"), Some(Value::str("plum")));
}

#[test]
fn test_unknown_set_does_not_create_bag_entries() {
    let def = TypeDef::builder("Open").build();
    let inst = decorate(&def).instantiate(&[]).unwrap();

    let err = inst.set("surprise", Value::int(1)).unwrap_err();
    assert!(err.is_unknown_property());

    let handle = inst.extensions().unwrap();
    assert!(handle.lock().is_empty());
}

#[test]
fn test_non_extensible_type_rejects_container_access() {
    let sealed = TypeDef::builder("Sealed")
        .marker(Marker::new("non_extensible"))
        .build();
    let inst = decorate(&sealed).instantiate(&[]).unwrap();

    match inst.get(EXTENSIONS_PROPERTY).unwrap_err() {
        DispatchError::UnknownProperty { name } => assert_eq!(name, EXTENSIONS_PROPERTY),
        other => panic!("expected UnknownProperty, got {:?}", other),
    }
    assert!(inst.extensions().is_err());

    // An extensible type accepts the very same access
    let open = TypeDef::builder("Open").build();
    let inst = decorate(&open).instantiate(&[]).unwrap();
    assert!(inst.get(EXTENSIONS_PROPERTY).is_ok());
}

#[test]
fn test_non_extensible_container_access_reaches_hooks() {
    let sealed = TypeDef::builder("Sealed")
        .marker(Marker::new("non_extensible"))
        .build();
    let inst = decorate(&sealed).instantiate(&[]).unwrap();
    inst.set_property_get_missing(|name| Ok(Value::str(format!("seen:{}", name))));

    // The container name is an unknown property, so the hook observes it
    assert_eq!(
        inst.get(EXTENSIONS_PROPERTY).unwrap(),
        Value::str("seen:ext")
    );
}

#[test]
fn test_construction_window_skips_hooks_and_bag() {
    let def = TypeDef::builder("Booting")
        .property(PropertyDef::new("phase", ParamType::Str).initial(Value::str("new")))
        .method(MethodDef::new("setup", |inst, _| {
            inst.set("phase", Value::str("configured"))?;
            Ok(Value::Null)
        }))
        .constructor(|inst, _| {
            // Declared members dispatch normally inside the window
            inst.invoke("setup", &[])?;

            // Unknown members fail plainly even though a type-level
            // hook is configured; the window never consults hooks
            assert!(inst.invoke("not_declared", &[]).is_err());
            assert!(inst.get("not_declared").is_err());
            assert!(inst.get(EXTENSIONS_PROPERTY).is_err());
            Ok(())
        })
        .build();

    let factory = decorate(&def);
    factory.set_method_missing(|_, _| Ok(Value::str("hooked")));
    factory.set_property_get_missing(|_| Ok(Value::str("hooked")));

    let inst = factory.instantiate(&[]).unwrap();
    assert_eq!(inst.get("phase").unwrap(), Value::str("configured"));

    // The window is closed now; hooks apply again
    assert_eq!(inst.invoke("not_declared", &[]).unwrap(), Value::str("hooked"));
    assert_eq!(inst.get(EXTENSIONS_PROPERTY).unwrap().as_extensions().is_some(), true);
}

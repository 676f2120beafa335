//! Callback coercion
//!
//! Bridges a bare callable to a single-method capability parameter. The
//! wrapper forwards its arguments to the raw callable and translates the
//! result to the capability's declared return type (void discards it).
//! Call sites that pass a bare callable must observe the same side
//! effects as sites that construct the capability object manually, so
//! errors raised inside the raw callable propagate unchanged.

use std::sync::Arc;

use gild_core::{Callable, CapabilityDef, CapabilityValue, Value};

/// Wrap a bare callable as an object satisfying `def`
pub fn coerce(def: &Arc<CapabilityDef>, raw: &Callable) -> CapabilityValue {
    let discard = def.ret.is_void();
    let raw = raw.clone();
    let imp = Callable::new(move |args| {
        let result = raw.call(args)?;
        Ok(if discard { Value::Null } else { result })
    });
    CapabilityValue::new(def.clone(), imp)
}

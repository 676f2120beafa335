//! Injection cache and lookup-service boundary
//!
//! Each instance owns one slot per declared injection point. A slot moves
//! from `Unresolved` to `Resolved` on first read (querying the lookup
//! service at most once, even under racing readers) or to `Explicit` on
//! assignment through the paired setter. Explicit assignment wins over
//! resolution and permanently disables lookup for that point.
//!
//! The exclusive region guards only a single slot's transition; the
//! dispatch path never holds a lock across a forwarded call, so
//! already-resolved reads contend only on a shared lock.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use gild_core::{DispatchError, DispatchResult, LookupError, LookupKey, Value};

use crate::registry::InjectionPoint;

/// External provider of injected values
pub trait LookupService: Send + Sync {
    /// Resolve a key to a value
    fn get(&self, key: &LookupKey) -> Result<Value, LookupError>;
}

/// In-memory lookup service
///
/// The standard embedder-facing implementation: providers are registered
/// under keys; a key with no provider reports `NotFound`, a key with more
/// than one reports `Ambiguous`.
#[derive(Default)]
pub struct ServiceMap {
    providers: RwLock<FxHashMap<LookupKey, Vec<Value>>>,
}

impl ServiceMap {
    /// Create an empty service map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under a key
    pub fn register(&self, key: impl Into<LookupKey>, value: Value) {
        self.providers
            .write()
            .entry(key.into())
            .or_default()
            .push(value);
    }

    /// Number of keys with at least one provider
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Check if no providers are registered
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }
}

impl LookupService for ServiceMap {
    fn get(&self, key: &LookupKey) -> Result<Value, LookupError> {
        let providers = self.providers.read();
        match providers.get(key).map(Vec::as_slice) {
            None | Some([]) => Err(LookupError::NotFound(key.clone())),
            Some([value]) => Ok(value.clone()),
            Some(_) => Err(LookupError::Ambiguous(key.clone())),
        }
    }
}

/// State of one injection slot
#[derive(Debug, Clone)]
pub enum SlotState {
    /// Not yet resolved; a read will query the lookup service
    Unresolved,
    /// Resolved from the lookup service
    Resolved(Value),
    /// Explicitly assigned; lookup is permanently disabled
    Explicit(Value),
}

/// Per-instance injection slots, indexed by point slot order
pub struct InjectionSlots {
    slots: Vec<RwLock<SlotState>>,
}

impl InjectionSlots {
    /// Allocate unresolved slots for `count` injection points
    pub fn new(count: usize) -> Self {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(RwLock::new(SlotState::Unresolved));
        }
        Self { slots }
    }

    /// Read an injection point, resolving it on first access
    ///
    /// The lookup service observes at most one query per (instance,
    /// point): the query runs under the slot's exclusive lock, and racing
    /// readers re-check the state after acquiring it.
    pub fn get(&self, point: &InjectionPoint, service: &dyn LookupService) -> DispatchResult<Value> {
        {
            let state = self.slots[point.slot].read();
            match &*state {
                SlotState::Resolved(value) | SlotState::Explicit(value) => {
                    return Ok(value.clone());
                }
                SlotState::Unresolved => {}
            }
        }

        let mut state = self.slots[point.slot].write();
        match &*state {
            SlotState::Resolved(value) | SlotState::Explicit(value) => {
                return Ok(value.clone());
            }
            SlotState::Unresolved => {}
        }

        match service.get(&point.key) {
            Ok(value) => {
                *state = SlotState::Resolved(value.clone());
                Ok(value)
            }
            Err(LookupError::Raised(inner)) => Err(DispatchError::Raised(inner)),
            Err(err) => Err(DispatchError::UnresolvedDependency {
                point: point.name.clone(),
                key: point.key.clone(),
                reason: err.to_string(),
            }),
        }
    }

    /// Explicitly assign an injection point
    ///
    /// Transitions the slot to `Explicit` unconditionally, overwriting
    /// any prior resolution. Callers enforce that the point declares a
    /// setter.
    pub fn set(&self, point: &InjectionPoint, value: Value) {
        *self.slots[point.slot].write() = SlotState::Explicit(value);
    }

    /// Check whether a slot has left the unresolved state
    pub fn is_settled(&self, slot: usize) -> bool {
        !matches!(&*self.slots[slot].read(), SlotState::Unresolved)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the instance declares no injection points
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

//! Per-instance extension bag
//!
//! An ordered name/value store attached to a decorated instance unless the
//! base type opts out. The bag is created lazily on first access and
//! handed out as a shared handle, so writes through the handle are visible
//! to later dynamic property reads on the same instance.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::value::Value;

/// Shared handle to an instance's extension bag
pub type ExtensionsRef = Arc<Mutex<ExtensionBag>>;

/// Ordered mapping from name to value
///
/// Insertion order is preserved; lookup is by name.
#[derive(Debug, Default)]
pub struct ExtensionBag {
    order: Vec<String>,
    values: FxHashMap<String, Value>,
}

impl ExtensionBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty bag behind a shared handle
    pub fn shared() -> ExtensionsRef {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Set a named value, inserting or overwriting
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if !self.values.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.values.insert(name, value);
    }

    /// Get a named value
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Check if a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove a named value, returning it if present
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let removed = self.values.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the bag is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

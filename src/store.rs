//! The shared key-value store populated during bootstrap.
//!
//! An entry is either a plain settings value or a deferred service. Service
//! slots build their instance on first resolution and hand out the same
//! instance afterwards.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::config::Value;
use crate::context::AppContext;
use crate::Error;

/// A constructed service.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Builds a service from the application it is registered in.
pub type Factory = Arc<dyn Fn(&AppContext) -> Result<Instance, Error> + Send + Sync>;

/// A deferred service: a factory plus its memoized instance.
pub struct ServiceSlot {
    factory: Factory,
    instance: OnceCell<Instance>,
}

impl ServiceSlot {
    pub fn new(factory: Factory) -> Self {
        Self {
            factory,
            instance: OnceCell::new(),
        }
    }

    /// Returns the instance, running the factory on first call only.
    ///
    /// A failed construction is not memoized.
    pub fn resolve(&self, ctx: &AppContext) -> Result<Instance, Error> {
        self.instance
            .get_or_try_init(|| (self.factory)(ctx))
            .map(Arc::clone)
    }

    pub fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl fmt::Debug for ServiceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSlot")
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum Entry {
    Value(Value),
    Service(ServiceSlot),
}

/// Result of asking whether a key denotes something registered.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    Found(&'a Entry),
    NotFound,
}

impl Lookup<'_> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Shared store keyed by string, in insertion order.
#[derive(Debug, Default)]
pub struct Store {
    entries: IndexMap<String, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a plain value, replacing any existing entry under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Entry> {
        self.entries.insert(key.into(), Entry::Value(value.into()))
    }

    /// Registers a deferred service, replacing any existing entry under `key`.
    pub fn set_factory(&mut self, key: impl Into<String>, factory: Factory) -> Option<Entry> {
        self.entries
            .insert(key.into(), Entry::Service(ServiceSlot::new(factory)))
    }

    /// Returns the plain value under `key`, if any. Services are not values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key) {
            Some(Entry::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn lookup(&self, key: &str) -> Lookup<'_> {
        match self.entries.get(key) {
            Some(entry) => Lookup::Found(entry),
            None => Lookup::NotFound,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut store = Store::new();
        store.set("db_path", "/tmp/a");
        let previous = store.set("db_path", "/tmp/b");

        assert!(matches!(previous, Some(Entry::Value(_))));
        assert_eq!(store.get("db_path"), Some(&Value::from("/tmp/b")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup() {
        let mut store = Store::new();
        store.set("present", Value::Null);

        assert!(store.lookup("present").is_found());
        assert!(matches!(store.lookup("absent"), Lookup::NotFound));
    }

    #[test]
    fn test_service_is_not_a_value() {
        let mut store = Store::new();
        let factory: Factory = Arc::new(|_| Ok(Arc::new(1u8) as Instance));
        store.set_factory("svc", factory);

        assert!(store.has("svc"));
        assert_eq!(store.get("svc"), None);
        assert!(matches!(store.entry("svc"), Some(Entry::Service(_))));
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let mut store = Store::new();
        store.set("b", 1i64);
        store.set("a", 2i64);
        store.remove("b");
        store.set("c", 3i64);

        assert_eq!(store.keys().collect::<Vec<_>>(), ["a", "c"]);
    }
}

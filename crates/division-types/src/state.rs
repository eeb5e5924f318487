//! Contributed state and the per-division shared-state view.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An immutable, shareable state value.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// State a division contributes to its dependents.
///
/// Values are stored behind `Arc`, so cloning the bag is cheap and never
/// gives the holder a way to mutate another division's entry. Divisions
/// that want dependents to observe later changes share a synchronized
/// handle (for example `Arc<RwLock<T>>`) explicitly.
#[derive(Clone, Default)]
pub struct SharedState {
    entries: BTreeMap<String, StateValue>,
}

impl SharedState {
    /// Create an empty state bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, wrapping it in an `Arc`.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Insert an already shared value without wrapping it again.
    pub fn insert_shared(&mut self, key: impl Into<String>, value: StateValue) {
        self.entries.insert(key.into(), value);
    }

    /// Typed access to an entry.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key).cloned()?.downcast::<T>().ok()
    }

    /// Borrowing typed access to an entry.
    #[must_use]
    pub fn get_ref<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    /// Untyped access to an entry.
    #[must_use]
    pub fn get_shared(&self, key: &str) -> Option<&StateValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into `self` key by key; `other` wins on conflicts.
    pub fn merge(&mut self, other: SharedState) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// The contributed state of a division's direct dependencies, keyed by
/// dependency name.
///
/// A view is always a fresh copy built for one hook invocation.
#[derive(Clone, Default)]
pub struct SharedView {
    divisions: BTreeMap<String, SharedState>,
}

impl SharedView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, division: impl Into<String>, state: SharedState) {
        self.divisions.insert(division.into(), state);
    }

    /// State contributed by `division`, if it is a direct dependency that
    /// contributed anything.
    #[must_use]
    pub fn get(&self, division: &str) -> Option<&SharedState> {
        self.divisions.get(division)
    }

    /// Shorthand for `view.get(division)?.get::<T>(key)`.
    #[must_use]
    pub fn lookup<T: Any + Send + Sync>(&self, division: &str, key: &str) -> Option<Arc<T>> {
        self.get(division)?.get::<T>(key)
    }

    #[must_use]
    pub fn contains(&self, division: &str) -> bool {
        self.divisions.contains_key(division)
    }

    pub fn divisions(&self) -> impl Iterator<Item = &str> {
        self.divisions.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }
}

impl fmt::Debug for SharedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.divisions.iter()).finish()
    }
}

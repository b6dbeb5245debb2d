//! # Opaque Handles
//!
//! Boundary calls name their target by handle, never by reference. The table
//! holds weak references only, so a handle never keeps its target alive and
//! resolves to `InvalidHandle` once the target is gone.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::domain::BoundaryStatus;

/// Opaque identifier of a boundary call target.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BoundaryHandle(u64);

impl BoundaryHandle {
    /// Raw handle value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BoundaryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Handle-to-target lookup.
pub struct HandleTable<T: ?Sized> {
    entries: RwLock<HashMap<u64, Weak<T>>>,
    next: AtomicU64,
}

impl<T: ?Sized> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }
}

impl<T: ?Sized> HandleTable<T> {
    /// Empty table. Handle values start at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` and return a fresh handle for it.
    pub fn register(&self, target: &Arc<T>) -> BoundaryHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(id, Arc::downgrade(target));
        BoundaryHandle(id)
    }

    /// Resolve a handle to a live target.
    pub fn resolve(&self, handle: BoundaryHandle) -> Result<Arc<T>, BoundaryStatus> {
        self.entries
            .read()
            .get(&handle.0)
            .and_then(Weak::upgrade)
            .ok_or(BoundaryStatus::InvalidHandle)
    }

    /// Forget a handle. Returns whether it was registered.
    pub fn revoke(&self, handle: BoundaryHandle) -> bool {
        self.entries.write().remove(&handle.0).is_some()
    }

    /// Registered handles, including ones whose target is gone.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Target(String);

    impl Named for Target {
        fn name(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let table: HandleTable<dyn Named> = HandleTable::new();
        let target: Arc<dyn Named> = Arc::new(Target("relay".to_string()));
        let handle = table.register(&target);
        assert_eq!(handle.raw(), 1);
        assert_eq!(table.resolve(handle).unwrap().name(), "relay");
    }

    #[test]
    fn test_handle_does_not_keep_target_alive() {
        let table: HandleTable<Target> = HandleTable::new();
        let target = Arc::new(Target("relay".to_string()));
        let handle = table.register(&target);
        drop(target);
        assert_eq!(table.resolve(handle).err(), Some(BoundaryStatus::InvalidHandle));
    }

    #[test]
    fn test_unknown_and_revoked_handles() {
        let table: HandleTable<Target> = HandleTable::new();
        assert!(table.resolve(BoundaryHandle(42)).is_err());

        let target = Arc::new(Target("relay".to_string()));
        let handle = table.register(&target);
        assert!(table.revoke(handle));
        assert!(!table.revoke(handle));
        assert!(table.resolve(handle).is_err());
        assert!(table.is_empty());
    }
}

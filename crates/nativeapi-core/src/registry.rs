//! Id-indexed registry of live resource handles.
//!
//! Ids come from a process-wide monotonic counter per kind, so an evicted id
//! can never resolve to a different resource later, even in a registry built
//! after a shutdown. Lookups of unknown ids are a normal
//! `NotFound` outcome.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{Error, Result};
use crate::id::{IdAllocator, ResourceId, ResourceKind};

pub struct Registry<R: ?Sized> {
    kind: ResourceKind,
    ids: &'static IdAllocator,
    entries: RwLock<HashMap<ResourceId, Arc<R>>>,
}

impl<R: ?Sized> Registry<R> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            ids: IdAllocator::for_kind(kind),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ResourceId, Arc<R>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ResourceId, Arc<R>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an already created resource under a fresh id.
    pub fn insert(&self, resource: Arc<R>) -> ResourceId {
        let id = self.ids.allocate();
        self.write().insert(id, resource);
        debug!(kind = %self.kind, %id, "resource registered");
        id
    }

    /// Run the native creation call and register its result.
    ///
    /// `create` runs without the registry lock held; it may block on the OS.
    pub fn create_with<F>(&self, create: F) -> Result<ResourceId>
    where
        F: FnOnce() -> nativeapi_platform::Result<Arc<R>>,
    {
        let resource = create().map_err(|source| Error::ResourceCreation {
            kind: self.kind,
            source,
        })?;
        Ok(self.insert(resource))
    }

    pub fn get(&self, id: ResourceId) -> Result<Arc<R>> {
        self.read().get(&id).cloned().ok_or(Error::NotFound {
            kind: self.kind,
            id,
        })
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.read().contains_key(&id)
    }

    /// Resolve `id` and run `f` against the live resource. The registry lock
    /// is released before `f` runs.
    pub fn with<T, F>(&self, id: ResourceId, f: F) -> Result<T>
    where
        F: FnOnce(&R) -> nativeapi_platform::Result<T>,
    {
        let resource = self.get(id)?;
        f(&*resource).map_err(|source| Error::Provider {
            kind: self.kind,
            source,
        })
    }

    /// Snapshot of live ids, in creation order.
    pub fn get_all(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<ResourceId>
    where
        P: FnMut(&R) -> bool,
    {
        self.read()
            .iter()
            .find(|(_, resource)| predicate(&**resource))
            .map(|(id, _)| *id)
    }

    pub fn remove(&self, id: ResourceId) -> Option<Arc<R>> {
        let removed = self.write().remove(&id);
        if removed.is_some() {
            debug!(kind = %self.kind, %id, "resource evicted");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: std::fmt::Debug + Send + Sync {
        fn name(&self) -> &str;
    }

    #[derive(Debug)]
    struct Item(&'static str);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn registry() -> Registry<dyn Named> {
        Registry::new(ResourceKind::Window)
    }

    #[test]
    fn insert_then_get_resolves_same_resource() {
        let registry = registry();
        let id = registry.insert(Arc::new(Item("main")));
        assert_eq!(registry.get(id).unwrap().name(), "main");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let registry = registry();
        let id = registry.insert(Arc::new(Item("main")));
        for raw in [0, -1, id.get() + 1, i64::MAX] {
            let err = registry.get(ResourceId::from(raw)).err().unwrap();
            assert!(err.is_not_found(), "{raw} resolved: {err}");
        }
    }

    #[test]
    fn evicted_id_is_never_reused() {
        let registry = registry();
        let first = registry.insert(Arc::new(Item("first")));
        assert!(registry.remove(first).is_some());
        let second = registry.insert(Arc::new(Item("second")));
        assert_ne!(first, second);
        assert!(registry.get(first).is_err());
        assert_eq!(registry.get(second).unwrap().name(), "second");
    }

    #[test]
    fn rebuilt_registry_continues_the_id_sequence() {
        let stale = registry().insert(Arc::new(Item("old")));
        let rebuilt = registry();
        let fresh = rebuilt.insert(Arc::new(Item("new")));
        assert!(fresh > stale);
        assert!(rebuilt.get(stale).unwrap_err().is_not_found());
    }

    #[test]
    fn get_all_lists_each_live_id_once_in_creation_order() {
        let registry = registry();
        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| registry.insert(Arc::new(Item(name))))
            .collect();
        registry.remove(ids[1]);
        assert_eq!(registry.get_all(), vec![ids[0], ids[2]]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn create_with_surfaces_native_failure() {
        let registry = registry();
        let err = registry
            .create_with(|| Err("no more handles".into()))
            .unwrap_err();
        assert!(matches!(err, Error::ResourceCreation { kind: ResourceKind::Window, .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn with_maps_provider_errors() {
        let registry = registry();
        let id = registry.insert(Arc::new(Item("main")));
        let name = registry.with(id, |item| Ok(item.name().len())).unwrap();
        assert_eq!(name, 4);
        let err = registry
            .with(id, |_| -> nativeapi_platform::Result<()> { Err("gone".into()) })
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }

    #[test]
    fn find_matches_by_predicate() {
        let registry = registry();
        registry.insert(Arc::new(Item("a")));
        let b = registry.insert(Arc::new(Item("b")));
        assert_eq!(registry.find(|item| item.name() == "b"), Some(b));
        assert_eq!(registry.find(|item| item.name() == "z"), None);
    }

    #[test]
    fn concurrent_inserts_are_all_visible() {
        let registry = registry();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        registry.insert(Arc::new(Item("x")));
                        let ids = registry.get_all();
                        for id in ids {
                            assert!(id.is_valid());
                        }
                    }
                });
            }
        });
        let ids = registry.get_all();
        assert_eq!(ids.len(), 200);
        assert!(ids.iter().all(|id| registry.contains(*id)));
    }
}

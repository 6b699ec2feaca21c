use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::gun::Gun;
use crate::id::Identifier;
use crate::item::{BindingError, ItemHost, bind};
use crate::snapshot::Snapshot;

/// Holds the current gun snapshot.
///
/// Readers get the snapshot as an `Arc` and keep observing it even after a
/// newer one is published. Publishing swaps the whole snapshot in one step;
/// nothing mutates a published snapshot.
#[derive(Debug)]
pub struct GunRegistry {
    current: ArcSwap<Snapshot>,
}

impl Default for GunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GunRegistry {
    /// A registry holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty()),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// The gun registered under `id` in the current snapshot.
    pub fn get(&self, id: &Identifier) -> Option<Arc<Gun>> {
        self.current.load().get(id).cloned()
    }

    /// Install `snapshot` and bind each of its guns to the host item with
    /// the same identifier.
    ///
    /// The snapshot is installed before binding starts. Binding stops at the
    /// first identifier that does not resolve to a gun item; items bound
    /// before it stay bound.
    pub fn publish<H: ItemHost + ?Sized>(
        &self,
        snapshot: Arc<Snapshot>,
        host: &H,
    ) -> Result<(), BindingError> {
        self.current.store(Arc::clone(&snapshot));
        for (id, gun) in snapshot.iter() {
            bind(host, id, Arc::clone(gun))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemTable;
    use crate::test_utils::{id, sample_gun, snapshot_of};

    fn host() -> ItemTable {
        let mut items = ItemTable::new();
        items.register_gun(id("mod:pistol"));
        items.register_gun(id("mod:rifle"));
        items
    }

    #[test]
    fn starts_empty() {
        let registry = GunRegistry::new();
        assert!(registry.snapshot().is_empty());
        assert!(registry.get(&id("mod:rifle")).is_none());
    }

    #[test]
    fn publish_installs_and_binds() {
        let registry = GunRegistry::new();
        let items = host();
        let snap = snapshot_of(&["mod:pistol", "mod:rifle"]);
        registry.publish(Arc::new(snap.clone()), &items).unwrap();

        assert_eq!(*registry.snapshot(), snap);
        for id in snap.ids() {
            let bound = items.gun(id).unwrap();
            assert!(Arc::ptr_eq(&bound, snap.get(id).unwrap()));
        }
    }

    #[test]
    fn publish_twice_is_idempotent() {
        let registry = GunRegistry::new();
        let items = host();
        let snap = Arc::new(snapshot_of(&["mod:pistol", "mod:rifle"]));
        registry.publish(Arc::clone(&snap), &items).unwrap();
        let first = registry.snapshot();
        registry.publish(Arc::clone(&snap), &items).unwrap();
        assert_eq!(*registry.snapshot(), *first);
        assert_eq!(
            items.gun(&id("mod:rifle")).as_deref(),
            Some(&sample_gun())
        );
    }

    #[test]
    fn publish_stops_at_unknown_item_without_rollback() {
        let registry = GunRegistry::new();
        let items = host();
        // "mod:cannon" sorts between the two known items.
        let snap = snapshot_of(&["mod:cannon", "mod:pistol", "mod:rifle"]);
        let result = registry.publish(Arc::new(snap.clone()), &items);

        assert_eq!(result, Err(BindingError::UnknownItem(id("mod:cannon"))));
        // The snapshot is installed regardless.
        assert_eq!(*registry.snapshot(), snap);
        // Nothing after the failing entry was bound.
        assert!(items.gun(&id("mod:pistol")).is_none());
        assert!(items.gun(&id("mod:rifle")).is_none());
    }

    #[test]
    fn earlier_bindings_survive_failure() {
        let registry = GunRegistry::new();
        let items = host();
        let snap = snapshot_of(&["mod:pistol", "mod:zzz"]);
        assert!(registry.publish(Arc::new(snap), &items).is_err());
        assert!(items.gun(&id("mod:pistol")).is_some());
    }

    #[test]
    fn held_snapshot_survives_republish() {
        let registry = GunRegistry::new();
        let items = host();
        registry
            .publish(Arc::new(snapshot_of(&["mod:rifle"])), &items)
            .unwrap();
        let held = registry.snapshot();
        registry
            .publish(Arc::new(snapshot_of(&["mod:pistol"])), &items)
            .unwrap();
        assert!(held.contains(&id("mod:rifle")));
        assert!(!registry.snapshot().contains(&id("mod:rifle")));
    }
}

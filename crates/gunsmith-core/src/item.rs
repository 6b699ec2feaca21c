//! The item side of the registry: where gun configurations get bound.
//!
//! The host game owns its items. [`ItemHost`] is the seam through which the
//! registry lists the items that can carry a gun and resolves an item by
//! identifier. [`ItemTable`] is an in-process host backed by a map.

use arc_swap::ArcSwapOption;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::gun::Gun;
use crate::id::Identifier;

// ===========================================================================
// Errors
// ===========================================================================

/// A snapshot entry could not be bound to a local item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("no item registered as {0}")]
    UnknownItem(Identifier),
    #[error("item {0} cannot hold a gun configuration")]
    NotConfigurable(Identifier),
}

// ===========================================================================
// Host traits
// ===========================================================================

/// An item that holds at most one gun configuration. Binding replaces any
/// previous configuration.
pub trait GunHolder {
    fn bind_gun(&self, gun: Arc<Gun>);

    fn gun(&self) -> Option<Arc<Gun>>;
}

/// Result of resolving an identifier against the host's items.
pub enum Resolved<'a> {
    Unknown,
    /// The item exists but lacks the gun capability.
    Plain,
    Gun(&'a dyn GunHolder),
}

/// The host's item registry.
pub trait ItemHost {
    /// Identifiers of every item with the gun capability.
    fn gun_items(&self) -> Vec<Identifier>;

    fn resolve(&self, id: &Identifier) -> Resolved<'_>;
}

/// Bind `gun` to the item registered as `id`.
pub fn bind<H: ItemHost + ?Sized>(
    host: &H,
    id: &Identifier,
    gun: Arc<Gun>,
) -> Result<(), BindingError> {
    match host.resolve(id) {
        Resolved::Gun(holder) => {
            holder.bind_gun(gun);
            Ok(())
        }
        Resolved::Plain => Err(BindingError::NotConfigurable(id.clone())),
        Resolved::Unknown => Err(BindingError::UnknownItem(id.clone())),
    }
}

// ===========================================================================
// In-process host
// ===========================================================================

/// A gun slot whose configuration can be swapped while readers hold the
/// previous one.
#[derive(Debug, Default)]
pub struct GunSlot {
    gun: ArcSwapOption<Gun>,
}

impl GunSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GunHolder for GunSlot {
    fn bind_gun(&self, gun: Arc<Gun>) {
        self.gun.store(Some(gun));
    }

    fn gun(&self) -> Option<Arc<Gun>> {
        self.gun.load_full()
    }
}

#[derive(Debug)]
enum ItemKind {
    Plain,
    Gun(GunSlot),
}

/// A map-backed [`ItemHost`].
#[derive(Debug, Default)]
pub struct ItemTable {
    items: BTreeMap<Identifier, ItemKind>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item with the gun capability. Re-registering resets its
    /// slot.
    pub fn register_gun(&mut self, id: Identifier) {
        self.items.insert(id, ItemKind::Gun(GunSlot::new()));
    }

    /// Register an item without the gun capability.
    pub fn register_plain(&mut self, id: Identifier) {
        self.items.insert(id, ItemKind::Plain);
    }

    /// The gun currently bound to `id`, if any.
    pub fn gun(&self, id: &Identifier) -> Option<Arc<Gun>> {
        match self.items.get(id)? {
            ItemKind::Gun(slot) => slot.gun(),
            ItemKind::Plain => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemHost for ItemTable {
    fn gun_items(&self) -> Vec<Identifier> {
        self.items
            .iter()
            .filter(|(_, kind)| matches!(kind, ItemKind::Gun(_)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn resolve(&self, id: &Identifier) -> Resolved<'_> {
        match self.items.get(id) {
            Some(ItemKind::Gun(slot)) => Resolved::Gun(slot),
            Some(ItemKind::Plain) => Resolved::Plain,
            None => Resolved::Unknown,
        }
    }
}

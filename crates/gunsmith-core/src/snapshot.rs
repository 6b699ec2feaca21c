use std::collections::BTreeMap;
use std::sync::Arc;

use crate::gun::Gun;
use crate::id::Identifier;

/// An immutable mapping from item identifier to gun configuration.
///
/// Snapshots are produced whole, either by a reload or by decoding a sync
/// message, and are never modified afterwards. Entries iterate in
/// identifier order. Guns are shared with the items they are bound to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    guns: BTreeMap<Identifier, Arc<Gun>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Identifier) -> Option<&Arc<Gun>> {
        self.guns.get(id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.guns.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.guns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &Arc<Gun>)> {
        self.guns.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        self.guns.keys()
    }
}

impl From<BTreeMap<Identifier, Arc<Gun>>> for Snapshot {
    fn from(guns: BTreeMap<Identifier, Arc<Gun>>) -> Self {
        Self { guns }
    }
}

/// Later entries replace earlier ones with the same identifier.
impl FromIterator<(Identifier, Arc<Gun>)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (Identifier, Arc<Gun>)>>(iter: I) -> Self {
        Self {
            guns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{id, sample_gun};

    #[test]
    fn empty_snapshot() {
        let snap = Snapshot::empty();
        assert!(snap.is_empty());
        assert_eq!(snap.len(), 0);
        assert!(snap.get(&id("mod:rifle")).is_none());
    }

    #[test]
    fn iterates_in_identifier_order() {
        let gun = Arc::new(sample_gun());
        let snap: Snapshot = [
            (id("mod:rifle"), Arc::clone(&gun)),
            (id("alpha:pistol"), Arc::clone(&gun)),
            (id("mod:pistol"), gun),
        ]
        .into_iter()
        .collect();
        let ids: Vec<String> = snap.ids().map(ToString::to_string).collect();
        assert_eq!(ids, ["alpha:pistol", "mod:pistol", "mod:rifle"]);
    }

    #[test]
    fn equality_compares_gun_contents() {
        let a: Snapshot = [(id("mod:rifle"), Arc::new(sample_gun()))]
            .into_iter()
            .collect();
        let b: Snapshot = [(id("mod:rifle"), Arc::new(sample_gun()))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
    }
}

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::device::{GeometryHandle, GraphicsDevice};
use crate::world::{PairId, SharedContacts};

/// Association of simulation entities with the device geometry built for them.
///
/// Every entry owns its geometry: replacing or removing an entry releases the
/// previous resource on the device.
#[derive(Debug)]
pub struct GeometryTable<K> {
    entries: HashMap<K, GeometryHandle>,
}

impl<K> Default for GeometryTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> GeometryTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `geometry` for `key`, releasing whatever was registered before.
    pub fn insert(&mut self, device: &mut impl GraphicsDevice, key: K, geometry: GeometryHandle) {
        if let Some(old) = self.entries.insert(key, geometry) {
            device.destroy_geometry(old);
        }
    }

    /// Releases and forgets the entry; absent keys are ignored.
    pub fn remove(&mut self, device: &mut impl GraphicsDevice, key: K) -> bool {
        match self.entries.remove(&key) {
            Some(old) => {
                device.destroy_geometry(old);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<GeometryHandle> {
        self.entries.get(&key).copied()
    }

    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases every entry.
    pub fn clear(&mut self, device: &mut impl GraphicsDevice) {
        for (_, geometry) in self.entries.drain() {
            device.destroy_geometry(geometry);
        }
    }
}

/// Live contact lists keyed by collider pair, kept in ascending pair order.
/// Contacts own no GPU resource.
#[derive(Debug, Default)]
pub struct ContactIndex {
    pairs: BTreeMap<PairId, SharedContacts>,
}

impl ContactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: PairId, contacts: SharedContacts) {
        self.pairs.insert(pair, contacts);
    }

    pub fn remove(&mut self, pair: PairId) -> bool {
        self.pairs.remove(&pair).is_some()
    }

    pub fn get(&self, pair: PairId) -> Option<&SharedContacts> {
        self.pairs.get(&pair)
    }

    /// Pairs in ascending order.
    pub fn pairs(&self) -> Vec<PairId> {
        self.pairs.keys().copied().collect()
    }

    /// Entries in ascending pair order.
    pub fn iter(&self) -> impl Iterator<Item = (PairId, &SharedContacts)> {
        self.pairs.iter().map(|(pair, contacts)| (*pair, contacts))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::geometry::create_cross;
    use crate::world::{BodyId, ColliderId, ContactPoint};
    use glam::Vec2;

    #[test]
    fn replacement_releases_the_previous_geometry() {
        let mut device = HeadlessDevice::new();
        let mut table = GeometryTable::new();

        let first = device.create_geometry(&create_cross());
        let second = device.create_geometry(&create_cross());
        table.insert(&mut device, BodyId(1), first);
        table.insert(&mut device, BodyId(1), second);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(BodyId(1)), Some(second));
        assert!(device.geometry(first).is_none());
        assert_eq!(device.stats().geometries, 1);
    }

    #[test]
    fn remove_and_clear_release_everything() {
        let mut device = HeadlessDevice::new();
        let mut table = GeometryTable::new();
        for i in 0..3 {
            let g = device.create_geometry(&create_cross());
            table.insert(&mut device, BodyId(i), g);
        }

        assert!(table.remove(&mut device, BodyId(0)));
        assert!(!table.remove(&mut device, BodyId(0)));
        assert_eq!(device.stats().geometries, 2);

        table.clear(&mut device);
        assert!(table.is_empty());
        assert_eq!(device.stats().geometries, 0);
    }

    #[test]
    fn contact_index_is_keyed_by_unordered_pair() {
        let mut index = ContactIndex::new();
        let contacts = SharedContacts::new(vec![ContactPoint {
            point: Vec2::ZERO,
            normal: Vec2::Y,
        }]);
        index.insert(PairId::new(ColliderId(7), ColliderId(3)), contacts);

        assert!(index.get(PairId::new(ColliderId(3), ColliderId(7))).is_some());
        assert!(index.remove(PairId::new(ColliderId(3), ColliderId(7))));
        assert!(index.is_empty());
    }

    #[test]
    fn contact_index_iterates_in_pair_order() {
        let mut index = ContactIndex::new();
        let pairs = [
            PairId::new(ColliderId(9), ColliderId(2)),
            PairId::new(ColliderId(0), ColliderId(5)),
            PairId::new(ColliderId(4), ColliderId(1)),
        ];
        for pair in pairs {
            index.insert(pair, SharedContacts::default());
        }

        let mut sorted = pairs.to_vec();
        sorted.sort_unstable();
        let iterated: Vec<PairId> = index.iter().map(|(pair, _)| pair).collect();
        assert_eq!(iterated, sorted);
        assert_eq!(index.pairs(), sorted);
    }
}

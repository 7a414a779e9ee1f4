//! Material slots and the stable ids that survive slot reordering.
//!
//! Curves reference materials by slot index. Indices are only meaningful
//! inside one object, so anything that moves curves between objects (copy,
//! paste, separate) carries the slot's stable [`MaterialId`] instead and
//! remaps to an index on arrival.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identifier for a material, unique within a session.
///
/// Slot indices shift when slots are inserted or removed; ids never do, so
/// cross-object transfers (clipboard paste, separate) carry ids and resolve
/// them back to indices at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

impl MaterialId {
    /// Allocate a fresh session-unique id
    pub fn new() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::new()
    }
}

/// One material slot on an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlot {
    pub id: MaterialId,
    pub name: String,
}

/// An object's material slot list.
///
/// Default-constructed tables start empty; [`MaterialTable::ensure`] is the
/// usual entry point, adding a slot only when no slot with that name exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialTable {
    slots: Vec<MaterialSlot>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[MaterialSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&MaterialSlot> {
        self.slots.get(index)
    }

    /// Append a new slot and return its index
    pub fn add(&mut self, name: impl Into<String>) -> usize {
        self.slots.push(MaterialSlot {
            id: MaterialId::new(),
            name: name.into(),
        });
        self.slots.len() - 1
    }

    /// Index of the slot carrying `slot`'s identity, appending a copy of the
    /// slot (same id) when the identity does not resolve here.
    pub fn ensure_slot(&mut self, slot: &MaterialSlot) -> usize {
        match self.index_of_id(slot.id) {
            Some(index) => index,
            None => {
                self.slots.push(slot.clone());
                self.slots.len() - 1
            }
        }
    }

    /// Index of the slot named `name`, adding one if absent
    pub fn ensure(&mut self, name: &str) -> usize {
        match self.index_of_name(name) {
            Some(index) => index,
            None => self.add(name),
        }
    }

    pub fn index_of_id(&self, id: MaterialId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Stable id of the slot at `index`, clamped into range.
    ///
    /// Out-of-range curve material indices render with the first slot, so the
    /// id lookup follows the same rule. Returns `None` only for an empty
    /// table.
    pub fn id_of(&self, index: usize) -> Option<MaterialId> {
        let clamped = index.min(self.slots.len().saturating_sub(1));
        self.slots.get(clamped).map(|slot| slot.id)
    }

    /// Remove the slots whose indices are not in `used`, returning the
    /// old-index-to-new-index map for remapping curve attributes. Entries for
    /// removed slots map to 0.
    pub fn retain_used(&mut self, used: &[bool]) -> Vec<usize> {
        debug_assert_eq!(used.len(), self.slots.len());
        let mut remap = vec![0; self.slots.len()];
        let mut kept = Vec::with_capacity(self.slots.len());
        for (old, slot) in self.slots.drain(..).enumerate() {
            if used.get(old).copied().unwrap_or(false) {
                remap[old] = kept.len();
                kept.push(slot);
            }
        }
        self.slots = kept;
        remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_reuses_by_name() {
        let mut table = MaterialTable::new();
        let a = table.ensure("ink");
        let b = table.ensure("fill");
        assert_eq!(table.ensure("ink"), a);
        assert_eq!((a, b), (0, 1));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ids_stable_across_removal() {
        let mut table = MaterialTable::new();
        table.add("a");
        table.add("b");
        table.add("c");
        let id_c = table.id_of(2).unwrap();

        let remap = table.retain_used(&[false, true, true]);
        assert_eq!(remap, vec![0, 0, 1]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.index_of_id(id_c), Some(1));
    }

    #[test]
    fn test_ensure_slot_carries_identity() {
        let mut source = MaterialTable::new();
        source.add("ink");
        let slot = source.slot(0).unwrap().clone();

        let mut dest = MaterialTable::new();
        dest.add("paper");
        let index = dest.ensure_slot(&slot);
        assert_eq!(index, 1);
        assert_eq!(dest.slot(1).unwrap().id, slot.id);
        // Resolving again finds the same slot.
        assert_eq!(dest.ensure_slot(&slot), 1);
    }

    #[test]
    fn test_id_of_clamps() {
        let mut table = MaterialTable::new();
        table.add("only");
        assert_eq!(table.id_of(7), table.id_of(0));
        assert_eq!(MaterialTable::new().id_of(0), None);
    }
}

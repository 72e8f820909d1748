//! Fixed-capacity open-addressing table keyed by [`StrId`].
//!
//! Slot `(b + c*c) % capacity` is probed for `c = 0, 1, 2, ...` where
//! `b = id % capacity`. Quadratic probing does not visit every slot for every
//! capacity, so a table can report exhaustion while some slots are still
//! empty; those slots are unreachable for that id.
//!
//! Removal leaves a plain empty slot (no tombstone), so lookups and duplicate
//! checks always walk the whole probe sequence instead of stopping at the
//! first hole.

use crate::string_id::StrId;

#[derive(Debug)]
enum Slot<P> {
    Empty,
    Occupied { id: StrId, payload: P },
}

/// Where an id would go, or why it can't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// First empty slot on the probe sequence.
    Vacant(usize),
    /// The id is already stored at this slot.
    Occupied(usize),
    /// No empty slot is reachable.
    Exhausted,
}

/// Result of [`SlotTable::entry`].
#[derive(Debug)]
pub enum SlotEntry<'a, P> {
    Vacant(VacantSlot<'a, P>),
    Occupied(usize),
    Exhausted,
}

/// An empty slot on the probe sequence of `id`, reserved by a mutable borrow.
#[derive(Debug)]
pub struct VacantSlot<'a, P> {
    table: &'a mut SlotTable<P>,
    idx: usize,
    id: StrId,
}

impl<P> VacantSlot<'_, P> {
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Stores `payload` and returns the slot index.
    pub fn fill(self, payload: P) -> usize {
        self.table.slots[self.idx] = Slot::Occupied {
            id: self.id,
            payload,
        };
        self.table.len += 1;
        self.idx
    }
}

/// Fixed-capacity slot table.
#[derive(Debug)]
pub struct SlotTable<P> {
    slots: Vec<Slot<P>>,
    len: usize,
}

impl<P> SlotTable<P> {
    /// Creates a table of `capacity` empty slots. `capacity` must be > 0.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        Self { slots, len: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Probe sequence for `id`.
    pub fn probe_sequence(&self, id: StrId) -> impl Iterator<Item = usize> {
        let cap = self.slots.len() as u64;
        let base = u64::from(id.raw()) % cap.max(1);
        (0..cap).map(move |c| ((base + c * c) % cap) as usize)
    }

    /// Classifies `id` without modifying the table.
    pub fn probe(&self, id: StrId) -> Probe {
        let mut vacant = None;
        for idx in self.probe_sequence(id) {
            match &self.slots[idx] {
                Slot::Occupied { id: held, .. } if *held == id => return Probe::Occupied(idx),
                Slot::Occupied { .. } => {}
                Slot::Empty => {
                    vacant.get_or_insert(idx);
                }
            }
        }
        vacant.map_or(Probe::Exhausted, Probe::Vacant)
    }

    /// Slot currently holding `id`.
    pub fn find(&self, id: StrId) -> Option<usize> {
        match self.probe(id) {
            Probe::Occupied(idx) => Some(idx),
            _ => None,
        }
    }

    /// Like [`Self::probe`], but a vacant result keeps the table borrowed
    /// until it is filled, so the slot cannot be taken in between.
    pub fn entry(&mut self, id: StrId) -> SlotEntry<'_, P> {
        match self.probe(id) {
            Probe::Vacant(idx) => SlotEntry::Vacant(VacantSlot {
                table: self,
                idx,
                id,
            }),
            Probe::Occupied(idx) => SlotEntry::Occupied(idx),
            Probe::Exhausted => SlotEntry::Exhausted,
        }
    }

    /// Empties the slot holding `id` and hands back its payload.
    pub fn take(&mut self, id: StrId) -> Option<P> {
        let idx = self.find(id)?;
        match std::mem::replace(&mut self.slots[idx], Slot::Empty) {
            Slot::Occupied { payload, .. } => {
                self.len -= 1;
                Some(payload)
            }
            Slot::Empty => None,
        }
    }

    pub fn get(&self, id: StrId) -> Option<&P> {
        let idx = self.find(id)?;
        self.get_at(idx, id)
    }

    /// Payload at `idx`, if that slot holds `id`.
    pub fn get_at(&self, idx: usize, id: StrId) -> Option<&P> {
        match self.slots.get(idx)? {
            Slot::Occupied { id: held, payload } if *held == id => Some(payload),
            _ => None,
        }
    }

    /// Whether slot `idx` is empty. Out-of-range slots count as empty.
    pub fn is_vacant(&self, idx: usize) -> bool {
        !matches!(self.slots.get(idx), Some(Slot::Occupied { .. }))
    }

    /// Ids and payloads of all occupied slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (StrId, &P)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { id, payload } => Some((*id, payload)),
            Slot::Empty => None,
        })
    }

    /// Empties every slot, yielding the payloads.
    pub fn drain(&mut self) -> Vec<(StrId, P)> {
        self.len = 0;
        self.slots
            .iter_mut()
            .filter_map(|slot| match std::mem::replace(slot, Slot::Empty) {
                Slot::Occupied { id, payload } => Some((id, payload)),
                Slot::Empty => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(t: &mut SlotTable<u32>, id: u32) -> Probe {
        match t.entry(StrId(id)) {
            SlotEntry::Vacant(slot) => Probe::Vacant(slot.fill(id)),
            SlotEntry::Occupied(idx) => Probe::Occupied(idx),
            SlotEntry::Exhausted => Probe::Exhausted,
        }
    }

    #[test]
    fn probe_sequence_is_quadratic() {
        let t = SlotTable::<u32>::new(7);
        let seq: Vec<_> = t.probe_sequence(StrId(10)).collect();
        // b = 3; 3, 4, 7, 12, 19, 28, 39 mod 7
        assert_eq!(seq, vec![3, 4, 0, 5, 5, 0, 4]);
    }

    #[test]
    fn colliding_ids_take_the_next_probe() {
        let mut t = SlotTable::new(8);
        assert_eq!(insert(&mut t, 3), Probe::Vacant(3));
        assert_eq!(insert(&mut t, 11), Probe::Vacant(4));
        assert_eq!(insert(&mut t, 19), Probe::Vacant(7));
        assert_eq!(t.find(StrId(19)), Some(7));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn fills_to_capacity_then_exhausts() {
        let mut t = SlotTable::new(16);
        for id in 0..16 {
            assert!(matches!(insert(&mut t, id), Probe::Vacant(_)));
        }
        assert_eq!(t.len(), 16);
        assert_eq!(insert(&mut t, 16), Probe::Exhausted);
    }

    #[test]
    fn duplicate_is_found_past_a_hole() {
        let mut t = SlotTable::new(8);
        insert(&mut t, 3);
        insert(&mut t, 11);
        assert_eq!(t.take(StrId(3)), Some(3));
        // Slot 3 is empty now, but 11 still lives further along.
        assert_eq!(t.probe(StrId(11)), Probe::Occupied(4));
        assert_eq!(t.get(StrId(11)), Some(&11));
    }

    #[test]
    fn take_and_refill() {
        let mut t = SlotTable::new(4);
        insert(&mut t, 1);
        assert!(!t.is_vacant(1));
        assert_eq!(t.take(StrId(1)), Some(1));
        assert!(t.is_vacant(1));
        assert_eq!(t.take(StrId(1)), None);
        assert_eq!(insert(&mut t, 1), Probe::Vacant(1));
    }

    #[test]
    fn entry_matches_probe() {
        let mut t = SlotTable::new(4);
        insert(&mut t, 1);
        assert_eq!(t.probe(StrId(5)), Probe::Vacant(2));
        match t.entry(StrId(5)) {
            SlotEntry::Vacant(slot) => {
                assert_eq!(slot.index(), 2);
                assert_eq!(slot.fill(5), 2);
            }
            other => panic!("expected a vacant slot, got {other:?}"),
        }
        assert!(matches!(t.entry(StrId(1)), SlotEntry::Occupied(1)));
        assert_eq!(t.get(StrId(5)), Some(&5));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn random_churn_keeps_one_copy_per_id() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        use std::collections::HashSet;

        let mut rng = StdRng::seed_from_u64(7);
        let mut t = SlotTable::new(13);
        let mut live = HashSet::new();
        for _ in 0..2000 {
            let id = rng.gen_range(0..40u32);
            if rng.gen_bool(0.5) {
                match insert(&mut t, id) {
                    Probe::Vacant(_) => assert!(live.insert(id)),
                    Probe::Occupied(_) => assert!(live.contains(&id)),
                    Probe::Exhausted => assert!(!live.contains(&id)),
                }
            } else {
                assert_eq!(t.take(StrId(id)).is_some(), live.remove(&id));
            }
            assert_eq!(t.len(), live.len());
            let copies = t.iter().filter(|(held, _)| held.raw() == id).count();
            assert_eq!(copies, usize::from(live.contains(&id)));
        }
    }

    #[test]
    fn drain_empties_everything() {
        let mut t = SlotTable::new(4);
        insert(&mut t, 0);
        insert(&mut t, 2);
        let mut drained = t.drain();
        drained.sort_by_key(|(id, _)| *id);
        assert_eq!(drained, vec![(StrId(0), 0), (StrId(2), 2)]);
        assert!(t.is_empty());
        assert_eq!(t.iter().count(), 0);
    }
}

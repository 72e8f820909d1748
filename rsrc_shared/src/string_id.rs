//! String identifiers.
//!
//! Resource names are hashed into compact 32-bit [`StrId`]s with a polynomial
//! rolling hash (`h = 37 * h + byte`). The [`StringTable`] remembers every id it
//! hands out so that two different names hashing to the same id are reported
//! as a [`RsrcError::NameCollision`] instead of aliasing each other.
//!
//! Lookup slots are open-addressed with the same quadratic sequence as the
//! resource tables, `(id % slots + c*c) % slots`. Entries are never removed,
//! so a probe stops at the first empty slot.
//!
//! Names interned with `persist = true` are copied into a fixed-capacity arena
//! and can be resolved back from their id. The arena is append-only.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alloc::{self, Allocator};
use crate::error::{Capacity, Result, RsrcError};

/// Default number of lookup slots. Prime, so `id % slots` spreads well.
pub const DEFAULT_STRING_SLOTS: usize = 7717;

/// Default arena capacity for persisted names, in bytes.
pub const DEFAULT_ARENA_BYTES: usize = 1024;

/// Hashed resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrId(pub u32);

impl StrId {
    /// Hashes a name without interning it.
    pub fn of(name: &str) -> Self {
        StrId(hash(name.as_bytes()))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for StrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Polynomial rolling hash over the raw bytes.
pub fn hash(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |h, &b| h.wrapping_mul(37).wrapping_add(u32::from(b)))
}

/// Independent 64-bit FNV-1a, kept per entry to tell names apart when
/// neither of them was persisted.
fn fingerprint(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: StrId,
    fingerprint: u64,
    /// Byte range inside the arena, when the name was persisted.
    stored: Option<(usize, usize)>,
}

enum Lookup {
    Found(usize),
    Vacant(usize),
    Full,
}

/// Interning table with an append-only arena for persisted names.
pub struct StringTable {
    slots: Vec<Option<Entry>>,
    arena: Vec<u8>,
    arena_capacity: usize,
    entries: usize,
    alloc: Rc<dyn Allocator>,
}

impl StringTable {
    /// Creates a table with `slots` lookup slots and an arena of
    /// `arena_bytes`. The arena is reserved up front through `alloc`.
    pub fn new(slots: usize, arena_bytes: usize, alloc: Rc<dyn Allocator>) -> Result<Self> {
        if slots == 0 {
            return Err(RsrcError::CapacityExceeded {
                what: Capacity::StringSlots,
                capacity: 0,
            });
        }
        let arena = alloc::try_vec::<u8>(alloc.as_ref(), arena_bytes)?;
        Ok(Self {
            slots: vec![None; slots],
            arena,
            arena_capacity: arena_bytes,
            entries: 0,
            alloc,
        })
    }

    /// Table with the default slot count and arena size.
    pub fn with_defaults(alloc: Rc<dyn Allocator>) -> Result<Self> {
        Self::new(DEFAULT_STRING_SLOTS, DEFAULT_ARENA_BYTES, alloc)
    }

    fn lookup(&self, id: StrId) -> Lookup {
        let cap = self.slots.len() as u64;
        let base = u64::from(id.0) % cap;
        for c in 0..cap {
            let idx = ((base + c * c) % cap) as usize;
            match self.slots[idx] {
                Some(entry) if entry.id == id => return Lookup::Found(idx),
                Some(_) => {}
                None => return Lookup::Vacant(idx),
            }
        }
        Lookup::Full
    }

    fn find(&self, id: StrId) -> Option<Entry> {
        match self.lookup(id) {
            Lookup::Found(idx) => self.slots[idx],
            _ => None,
        }
    }

    /// Interns `name`, returning its id.
    ///
    /// Interning the same name again returns the same id. With `persist`
    /// the name is copied into the arena (once) so [`Self::resolve`] can
    /// find it; the copy fails up front with `CapacityExceeded` if the arena
    /// cannot hold the whole name, leaving the table untouched.
    pub fn intern(&mut self, name: &str, persist: bool) -> Result<StrId> {
        let bytes = name.as_bytes();
        let id = StrId(hash(bytes));
        let fp = fingerprint(bytes);
        let idx = match self.lookup(id) {
            Lookup::Found(idx) => idx,
            Lookup::Vacant(idx) => idx,
            Lookup::Full => {
                warn!(%id, name, slots = self.slots.len(), "String table full");
                return Err(RsrcError::CapacityExceeded {
                    what: Capacity::StringSlots,
                    capacity: self.slots.len(),
                });
            }
        };

        let existing = self.slots[idx];
        if let Some(entry) = existing {
            if entry.fingerprint != fp {
                let existing = entry.stored.and_then(|span| self.arena_str(span)).map(str::to_owned);
                warn!(%id, incoming = name, existing = ?existing, "String id collision");
                return Err(RsrcError::NameCollision {
                    id,
                    existing,
                    incoming: name.to_owned(),
                });
            }
        }

        let stored = match existing.and_then(|e| e.stored) {
            Some(span) => Some(span),
            None if persist => Some(self.store(name)?),
            None => None,
        };

        if existing.is_none() {
            self.entries += 1;
            debug!(%id, name, persist, "Interned name");
        }
        self.slots[idx] = Some(Entry {
            id,
            fingerprint: fp,
            stored,
        });
        Ok(id)
    }

    fn store(&mut self, name: &str) -> Result<(usize, usize)> {
        let len = name.len();
        if len > self.arena_remaining() {
            warn!(
                name,
                needed = len,
                remaining = self.arena_remaining(),
                "String arena exhausted"
            );
            return Err(RsrcError::CapacityExceeded {
                what: Capacity::StringArena,
                capacity: self.arena_capacity,
            });
        }
        let start = self.arena.len();
        self.arena.extend_from_slice(name.as_bytes());
        Ok((start, start + len))
    }

    fn arena_str(&self, (start, end): (usize, usize)) -> Option<&str> {
        std::str::from_utf8(self.arena.get(start..end)?).ok()
    }

    /// Returns the persisted name for `id`, if any.
    pub fn resolve(&self, id: StrId) -> Option<&str> {
        self.arena_str(self.find(id)?.stored?)
    }

    /// Whether `id` was handed out by this table, persisted or not.
    pub fn contains(&self, id: StrId) -> bool {
        self.find(id).is_some()
    }

    /// Number of distinct names interned.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn arena_used(&self) -> usize {
        self.arena.len()
    }

    pub fn arena_remaining(&self) -> usize {
        self.arena_capacity - self.arena.len()
    }
}

impl Drop for StringTable {
    fn drop(&mut self) {
        self.alloc.free(self.arena_capacity);
    }
}

impl fmt::Debug for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringTable")
            .field("slots", &self.slots.len())
            .field("entries", &self.entries)
            .field("arena_used", &self.arena.len())
            .field("arena_capacity", &self.arena_capacity)
            .finish()
    }
}

//! Resource cache.
//!
//! One [`SlotTable`] per resource kind, each with a capacity fixed at
//! construction. A successful [`ResourceCache::load`] returns a
//! [`ResourceToken`]; the cache keeps sole ownership of the payload until the
//! token is passed to [`ResourceCache::unload`].
//!
//! The cache is single-threaded and does no locking. Share it across threads
//! only behind external mutual exclusion.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::alloc::Allocator;
use crate::codec::{Decode, ResourceKind};
use crate::config::RsrcConfig;
use crate::error::{Capacity, Result, RsrcError};
use crate::file::FileProvider;
use crate::font::Font;
use crate::mesh::Mesh;
use crate::slot_table::{SlotEntry, SlotTable};
use crate::string_id::{StrId, StringTable};
use crate::texture::{Texture, TextureOptions};

/// Handle to a resident resource. Does not own the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceToken {
    kind: ResourceKind,
    id: StrId,
    slot: usize,
}

impl ResourceToken {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> StrId {
        self.id
    }

    /// Physical slot the payload was stored in.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Borrowed payload of any kind.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    Mesh(&'a Mesh),
    Texture(&'a Texture),
    Font(&'a Font),
}

/// Per-kind table capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    pub meshes: usize,
    pub textures: usize,
    pub fonts: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            meshes: 128,
            textures: 128,
            fonts: 128,
        }
    }
}

impl Capacities {
    /// Same capacity for every kind.
    pub fn uniform(n: usize) -> Self {
        Self {
            meshes: n,
            textures: n,
            fonts: n,
        }
    }

    fn of(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Mesh => self.meshes,
            ResourceKind::Texture => self.textures,
            ResourceKind::Font => self.fonts,
        }
    }
}

/// Fixed-capacity, per-kind resource cache.
pub struct ResourceCache {
    meshes: SlotTable<Mesh>,
    textures: SlotTable<Texture>,
    fonts: SlotTable<Font>,
    files: Box<dyn FileProvider>,
    alloc: Rc<dyn Allocator>,
    texture_options: TextureOptions,
}

impl ResourceCache {
    pub fn new(
        capacities: Capacities,
        files: Box<dyn FileProvider>,
        alloc: Rc<dyn Allocator>,
    ) -> Result<Self> {
        for kind in ResourceKind::ALL {
            if capacities.of(kind) == 0 {
                return Err(RsrcError::CapacityExceeded {
                    what: Capacity::Slots(kind),
                    capacity: 0,
                });
            }
        }
        Ok(Self {
            meshes: SlotTable::new(capacities.meshes),
            textures: SlotTable::new(capacities.textures),
            fonts: SlotTable::new(capacities.fonts),
            files,
            alloc,
            texture_options: TextureOptions::default(),
        })
    }

    /// Builds a cache sized and configured from `cfg`.
    pub fn from_config(
        cfg: &RsrcConfig,
        files: Box<dyn FileProvider>,
        alloc: Rc<dyn Allocator>,
    ) -> Result<Self> {
        let capacities = Capacities {
            meshes: cfg.max_meshes,
            textures: cfg.max_textures,
            fonts: cfg.max_fonts,
        };
        Ok(Self::new(capacities, files, alloc)?.with_texture_options(cfg.texture_options()))
    }

    pub fn with_texture_options(mut self, options: TextureOptions) -> Self {
        self.texture_options = options;
        self
    }

    /// Loads the resource `id` of `kind`.
    ///
    /// The name handed to the file provider comes from `strings`, so `id`
    /// must have been interned with `persist`. The slot is only filled once
    /// decoding succeeds; the file buffer is released either way.
    pub fn load(
        &mut self,
        strings: &StringTable,
        kind: ResourceKind,
        id: StrId,
    ) -> Result<ResourceToken> {
        let files = self.files.as_ref();
        let alloc = self.alloc.as_ref();
        let slot = match kind {
            ResourceKind::Mesh => load_into(&mut self.meshes, files, alloc, &(), strings, id)?,
            ResourceKind::Texture => {
                let options = &self.texture_options;
                load_into(&mut self.textures, files, alloc, options, strings, id)?
            }
            ResourceKind::Font => load_into(&mut self.fonts, files, alloc, &(), strings, id)?,
        };
        debug!(%kind, %id, slot, "Resource loaded");
        Ok(ResourceToken { kind, id, slot })
    }

    /// Interns `name` (persisted) and loads it.
    pub fn load_named(
        &mut self,
        strings: &mut StringTable,
        kind: ResourceKind,
        name: &str,
    ) -> Result<ResourceToken> {
        let id = strings.intern(name, true)?;
        self.load(strings, kind, id)
    }

    /// Releases the payload behind `token` and empties its slot.
    pub fn unload(&mut self, token: ResourceToken) -> Result<()> {
        let alloc = self.alloc.as_ref();
        let released = match token.kind {
            ResourceKind::Mesh => self.meshes.take(token.id).map(|p| p.release(alloc)),
            ResourceKind::Texture => self.textures.take(token.id).map(|p| p.release(alloc)),
            ResourceKind::Font => self.fonts.take(token.id).map(|p| p.release(alloc)),
        };
        if released.is_none() {
            warn!(kind = %token.kind, id = %token.id, "Unload of a resource that is not loaded");
            return Err(RsrcError::UnknownToken {
                kind: token.kind,
                id: token.id,
            });
        }
        debug!(kind = %token.kind, id = %token.id, "Resource unloaded");
        Ok(())
    }

    /// Unloads everything, returning how many resources were released.
    pub fn unload_all(&mut self) -> usize {
        let alloc = self.alloc.as_ref();
        let mut n = 0;
        for (_, p) in self.meshes.drain() {
            p.release(alloc);
            n += 1;
        }
        for (_, p) in self.textures.drain() {
            p.release(alloc);
            n += 1;
        }
        for (_, p) in self.fonts.drain() {
            p.release(alloc);
            n += 1;
        }
        n
    }

    pub fn mesh(&self, token: &ResourceToken) -> Option<&Mesh> {
        match token.kind {
            ResourceKind::Mesh => self.meshes.get_at(token.slot, token.id),
            _ => None,
        }
    }

    pub fn texture(&self, token: &ResourceToken) -> Option<&Texture> {
        match token.kind {
            ResourceKind::Texture => self.textures.get_at(token.slot, token.id),
            _ => None,
        }
    }

    pub fn font(&self, token: &ResourceToken) -> Option<&Font> {
        match token.kind {
            ResourceKind::Font => self.fonts.get_at(token.slot, token.id),
            _ => None,
        }
    }

    /// Payload behind `token`, whatever its kind.
    pub fn get(&self, token: &ResourceToken) -> Option<ResourceRef<'_>> {
        match token.kind {
            ResourceKind::Mesh => self.mesh(token).map(ResourceRef::Mesh),
            ResourceKind::Texture => self.texture(token).map(ResourceRef::Texture),
            ResourceKind::Font => self.font(token).map(ResourceRef::Font),
        }
    }

    pub fn is_resident(&self, kind: ResourceKind, id: StrId) -> bool {
        self.slot_of(kind, id).is_some()
    }

    /// Physical slot holding `id`, if resident.
    pub fn slot_of(&self, kind: ResourceKind, id: StrId) -> Option<usize> {
        match kind {
            ResourceKind::Mesh => self.meshes.find(id),
            ResourceKind::Texture => self.textures.find(id),
            ResourceKind::Font => self.fonts.find(id),
        }
    }

    /// Whether slot `idx` of the `kind` table is empty.
    pub fn is_slot_empty(&self, kind: ResourceKind, idx: usize) -> bool {
        match kind {
            ResourceKind::Mesh => self.meshes.is_vacant(idx),
            ResourceKind::Texture => self.textures.is_vacant(idx),
            ResourceKind::Font => self.fonts.is_vacant(idx),
        }
    }

    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Mesh => self.meshes.len(),
            ResourceKind::Texture => self.textures.len(),
            ResourceKind::Font => self.fonts.len(),
        }
    }

    pub fn capacity(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Mesh => self.meshes.capacity(),
            ResourceKind::Texture => self.textures.capacity(),
            ResourceKind::Font => self.fonts.capacity(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|&k| self.len(k) == 0)
    }
}

impl Drop for ResourceCache {
    fn drop(&mut self) {
        self.unload_all();
    }
}

fn load_into<P: Decode>(
    table: &mut SlotTable<P>,
    files: &dyn FileProvider,
    alloc: &dyn Allocator,
    options: &P::Options,
    strings: &StringTable,
    id: StrId,
) -> Result<usize> {
    let kind = P::KIND;
    let capacity = table.capacity();
    let slot = match table.entry(id) {
        SlotEntry::Vacant(slot) => slot,
        SlotEntry::Occupied(_) => {
            warn!(%kind, %id, "Resource already loaded");
            return Err(RsrcError::DuplicateLoad { kind, id });
        }
        SlotEntry::Exhausted => {
            warn!(%kind, %id, capacity, "Resource table full");
            return Err(RsrcError::CapacityExceeded {
                what: Capacity::Slots(kind),
                capacity,
            });
        }
    };

    let name = strings.resolve(id).ok_or_else(|| {
        warn!(%kind, %id, "Resource id has no stored name");
        RsrcError::UnresolvedIdentifier(id)
    })?;

    let bytes = files.load(name).map_err(|e| {
        warn!(%kind, name, error = %e, "Resource read failed");
        e
    })?;
    let decoded = P::decode(&bytes, options, alloc);
    files.release(bytes);
    let payload = decoded.map_err(|e| {
        warn!(%kind, name, error = %e, "Resource decode failed");
        e
    })?;

    Ok(slot.fill(payload))
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("meshes", &(self.meshes.len(), self.meshes.capacity()))
            .field("textures", &(self.textures.len(), self.textures.capacity()))
            .field("fonts", &(self.fonts.len(), self.fonts.capacity()))
            .field("texture_options", &self.texture_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{BudgetAllocator, SystemAllocator};
    use crate::codec::encode_to_vec;
    use crate::file::MemoryProvider;

    fn setup(files: MemoryProvider, capacity: usize) -> (StringTable, ResourceCache) {
        let alloc: Rc<dyn Allocator> = Rc::new(SystemAllocator);
        let strings = StringTable::new(97, 256, alloc.clone()).unwrap();
        let cache = ResourceCache::new(Capacities::uniform(capacity), Box::new(files), alloc).unwrap();
        (strings, cache)
    }

    fn cube_bytes() -> Vec<u8> {
        encode_to_vec(&Mesh::unit_cube()).unwrap()
    }

    #[test]
    fn load_get_unload() {
        let (mut strings, mut cache) = setup(MemoryProvider::new().with("cube", cube_bytes()), 8);
        let token = cache.load_named(&mut strings, ResourceKind::Mesh, "cube").unwrap();
        assert_eq!(token.kind(), ResourceKind::Mesh);
        assert_eq!(cache.mesh(&token).map(Mesh::nverts), Some(8));
        assert!(cache.texture(&token).is_none());
        assert!(matches!(cache.get(&token), Some(ResourceRef::Mesh(_))));
        cache.unload(token).unwrap();
        assert!(cache.mesh(&token).is_none());
        assert!(cache.is_slot_empty(ResourceKind::Mesh, token.slot()));
    }

    #[test]
    fn double_load_is_an_error() {
        let (mut strings, mut cache) = setup(MemoryProvider::new().with("cube", cube_bytes()), 8);
        cache.load_named(&mut strings, ResourceKind::Mesh, "cube").unwrap();
        assert!(matches!(
            cache.load_named(&mut strings, ResourceKind::Mesh, "cube"),
            Err(RsrcError::DuplicateLoad { kind: ResourceKind::Mesh, .. })
        ));
        assert_eq!(cache.len(ResourceKind::Mesh), 1);
    }

    #[test]
    fn kinds_have_separate_tables() {
        let font = crate::font::Font {
            bmp_width: 1,
            bmp_height: 1,
            bitmap: vec![255],
            ..Default::default()
        };
        let files = MemoryProvider::new()
            .with("thing", cube_bytes())
            .with("thing.font", encode_to_vec(&font).unwrap());
        let (mut strings, mut cache) = setup(files, 4);
        cache.load_named(&mut strings, ResourceKind::Mesh, "thing").unwrap();
        cache.load_named(&mut strings, ResourceKind::Font, "thing.font").unwrap();
        assert_eq!(cache.len(ResourceKind::Mesh), 1);
        assert_eq!(cache.len(ResourceKind::Font), 1);
        assert_eq!(cache.len(ResourceKind::Texture), 0);
    }

    #[test]
    fn unknown_token_after_unload() {
        let (mut strings, mut cache) = setup(MemoryProvider::new().with("cube", cube_bytes()), 8);
        let token = cache.load_named(&mut strings, ResourceKind::Mesh, "cube").unwrap();
        cache.unload(token).unwrap();
        assert_eq!(
            cache.unload(token),
            Err(RsrcError::UnknownToken {
                kind: ResourceKind::Mesh,
                id: token.id(),
            })
        );
    }

    #[test]
    fn unpersisted_id_cannot_be_loaded() {
        let (mut strings, mut cache) = setup(MemoryProvider::new().with("cube", cube_bytes()), 8);
        let id = strings.intern("cube", false).unwrap();
        assert_eq!(
            cache.load(&strings, ResourceKind::Mesh, id),
            Err(RsrcError::UnresolvedIdentifier(id))
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_file_leaves_slot_empty() {
        let (mut strings, mut cache) = setup(MemoryProvider::new(), 8);
        assert!(matches!(
            cache.load_named(&mut strings, ResourceKind::Mesh, "nope"),
            Err(RsrcError::IoFailure { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let caps = Capacities {
            fonts: 0,
            ..Capacities::default()
        };
        assert!(matches!(
            ResourceCache::new(caps, Box::new(MemoryProvider::new()), Rc::new(SystemAllocator)),
            Err(RsrcError::CapacityExceeded {
                what: Capacity::Slots(ResourceKind::Font),
                ..
            })
        ));
    }

    #[test]
    fn drop_returns_all_memory() {
        let budget = Rc::new(BudgetAllocator::new(1 << 20));
        {
            let alloc: Rc<dyn Allocator> = budget.clone();
            let mut strings = StringTable::new(97, 64, alloc.clone()).unwrap();
            let files = MemoryProvider::new().with("cube", cube_bytes());
            let mut cache = ResourceCache::new(Capacities::uniform(4), Box::new(files), alloc).unwrap();
            cache.load_named(&mut strings, ResourceKind::Mesh, "cube").unwrap();
            assert_eq!(budget.in_use(), 64 + Mesh::unit_cube().heap_bytes());
        }
        assert_eq!(budget.in_use(), 0);
    }
}

//! `rsrc_shared`
//!
//! Resource identity, storage and binary codecs.
//!
//! - [`string_id`]: names hashed into compact [`string_id::StrId`]s, with
//!   collision detection and an arena for reverse lookup.
//! - [`storage`]: fixed-capacity per-kind cache keyed by those ids.
//! - [`cursor`], [`mesh`], [`font`], [`texture`]: bounds-checked codecs for
//!   the payloads the cache stores.
//!
//! Design goals:
//! - No hidden global state: tables are owned values sized at construction.
//! - Host collaborators (files, memory accounting) are traits.
//! - Every failure is a [`error::RsrcError`]; nothing panics on bad input.
//! - No `unsafe`.

pub mod alloc;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod file;
pub mod font;
pub mod mesh;
pub mod slot_table;
pub mod storage;
pub mod string_id;
pub mod texture;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::alloc::{Allocator, BudgetAllocator, SystemAllocator};
    pub use crate::codec::{encode_to_vec, Decode, Encode, ResourceKind};
    pub use crate::config::RsrcConfig;
    pub use crate::error::{Result, RsrcError};
    pub use crate::file::{DirProvider, FileProvider, MemoryProvider};
    pub use crate::font::{Font, Glyph};
    pub use crate::mesh::Mesh;
    pub use crate::storage::{Capacities, ResourceCache, ResourceRef, ResourceToken};
    pub use crate::string_id::{StrId, StringTable};
    pub use crate::texture::{Texture, TextureOptions};
}

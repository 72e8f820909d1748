//! Codec contracts shared by every resource kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alloc::Allocator;
use crate::cursor::WriteCursor;
use crate::error::Result;

/// Kinds of resources the cache stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Mesh,
    Texture,
    Font,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Mesh, ResourceKind::Texture, ResourceKind::Font];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Mesh => "mesh",
            ResourceKind::Texture => "texture",
            ResourceKind::Font => "font",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns raw bytes into an owned payload and gives its memory back.
pub trait Decode: Sized {
    const KIND: ResourceKind;

    /// Per-kind decode settings; `()` for the engine's own layouts.
    type Options: Default;

    /// Decodes `bytes`. On failure nothing stays accounted in `alloc`.
    fn decode(bytes: &[u8], options: &Self::Options, alloc: &dyn Allocator) -> Result<Self>;

    /// Bytes this payload holds on the heap, as accounted at decode time.
    fn heap_bytes(&self) -> usize;

    /// Drops the payload and returns its bytes to `alloc`.
    fn release(self, alloc: &dyn Allocator) {
        alloc.free(self.heap_bytes());
    }
}

/// Writes a payload in its versioned binary layout.
pub trait Encode {
    /// Exact number of bytes [`Encode::encode`] writes.
    fn required_size(&self) -> usize;

    /// Encodes into the front of `buf`. On `BufferTooSmall` a prefix of
    /// `buf` may already be written.
    fn encode_into(&self, out: &mut WriteCursor<'_>) -> Result<()>;

    fn encode(&self, buf: &mut [u8]) -> Result<()> {
        self.encode_into(&mut WriteCursor::new(buf))
    }
}

/// Encodes into a freshly sized buffer.
pub fn encode_to_vec<P: Encode + ?Sized>(payload: &P) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; payload.required_size()];
    payload.encode(&mut buf)?;
    Ok(buf)
}

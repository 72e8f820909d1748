//! Mesh payload and its binary layout.
//!
//! ```text
//! u8      version (MESH_VERSION)
//! u32     nverts
//! u32     nindices
//! u8      flags (VertexFlags)
//! f32x3   positions[nverts]
//! f32x3   texcoords[nverts]   if TEXCOORDS
//! f32x3   normals[nverts]     if NORMALS
//! u32     indices[nindices]
//! ```
//!
//! Scalars are in host byte order.

use std::mem::size_of;

use tracing::warn;

use crate::alloc::{self, Allocator, Grant};
use crate::codec::{Decode, Encode, ResourceKind};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{Result, RsrcError};

/// Compiled mesh layout version.
pub const MESH_VERSION: u8 = 0;

/// version + nverts + nindices + flags.
pub const MESH_HEADER_SIZE: usize = 1 + 4 + 4 + 1;

const VEC3_SIZE: usize = 3 * size_of::<f32>();

bitflags::bitflags! {
    /// Optional vertex channels present in an encoded mesh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VertexFlags: u8 {
        const TEXCOORDS = 1 << 0;
        const NORMALS = 1 << 1;
    }
}

/// Decoded mesh.
///
/// Every channel holds one entry per vertex. `indices` are expected to be
/// `< nverts()`, which decoding does not check; see
/// [`Mesh::indices_in_bounds`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Option<Vec<[f32; 3]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            ..Default::default()
        }
    }

    pub fn with_texcoords(mut self, texcoords: Vec<[f32; 3]>) -> Self {
        self.texcoords = Some(texcoords);
        self
    }

    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Axis-aligned cube spanning [-1, 1]: 8 vertices, 12 triangles.
    pub fn unit_cube() -> Self {
        let positions = vec![
            [-1.0, -1.0, -1.0],
            [1.0, -1.0, -1.0],
            [1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
            [1.0, -1.0, 1.0],
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, 1.0],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // -z
            4, 5, 6, 4, 6, 7, // +z
            0, 1, 5, 0, 5, 4, // -y
            3, 7, 6, 3, 6, 2, // +y
            0, 4, 7, 0, 7, 3, // -x
            1, 2, 6, 1, 6, 5, // +x
        ];
        Self::new(positions, indices)
    }

    pub fn nverts(&self) -> usize {
        self.positions.len()
    }

    pub fn nindices(&self) -> usize {
        self.indices.len()
    }

    pub fn flags(&self) -> VertexFlags {
        let mut flags = VertexFlags::empty();
        flags.set(VertexFlags::TEXCOORDS, self.texcoords.is_some());
        flags.set(VertexFlags::NORMALS, self.normals.is_some());
        flags
    }

    /// Whether every index addresses an existing vertex.
    pub fn indices_in_bounds(&self) -> bool {
        let n = self.nverts();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    fn channel_count(&self) -> usize {
        1 + usize::from(self.texcoords.is_some()) + usize::from(self.normals.is_some())
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason| RsrcError::InvalidPayload {
            kind: ResourceKind::Mesh,
            reason,
        };
        if u32::try_from(self.nverts()).is_err() {
            return Err(invalid("vertex count exceeds u32"));
        }
        if u32::try_from(self.nindices()).is_err() {
            return Err(invalid("index count exceeds u32"));
        }
        if self.texcoords.as_ref().is_some_and(|t| t.len() != self.nverts()) {
            return Err(invalid("texcoord count differs from vertex count"));
        }
        if self.normals.as_ref().is_some_and(|n| n.len() != self.nverts()) {
            return Err(invalid("normal count differs from vertex count"));
        }
        Ok(())
    }
}

fn read_channel(r: &mut ReadCursor<'_>, nverts: usize) -> Result<Vec<[f32; 3]>> {
    let mut out = alloc::reserve(nverts)?;
    r.read_vec3s(nverts, &mut out)?;
    Ok(out)
}

impl Decode for Mesh {
    const KIND: ResourceKind = ResourceKind::Mesh;
    type Options = ();

    fn decode(bytes: &[u8], _options: &(), alloc: &dyn Allocator) -> Result<Self> {
        let mut r = ReadCursor::new(bytes);

        let version = r.read_u8()?;
        if version != MESH_VERSION {
            warn!(expected = MESH_VERSION, found = version, "Mesh version mismatch");
            return Err(RsrcError::VersionMismatch {
                kind: ResourceKind::Mesh,
                expected: MESH_VERSION,
                found: version,
            });
        }

        let nverts = r.read_u32()? as usize;
        let nindices = r.read_u32()? as usize;
        let flags = VertexFlags::from_bits_truncate(r.read_u8()?);

        let channels = 1 + usize::from(flags.contains(VertexFlags::TEXCOORDS))
            + usize::from(flags.contains(VertexFlags::NORMALS));
        let payload_bytes = alloc::bytes_for::<[f32; 3]>(nverts)?
            .checked_mul(channels)
            .and_then(|v| v.checked_add(nindices.checked_mul(size_of::<u32>())?))
            .ok_or(RsrcError::OutOfMemory { bytes: usize::MAX })?;

        // Reject lying counts before asking for memory.
        r.ensure(payload_bytes)?;
        let grant = Grant::new(alloc, payload_bytes)?;

        let positions = read_channel(&mut r, nverts)?;
        let texcoords = if flags.contains(VertexFlags::TEXCOORDS) {
            Some(read_channel(&mut r, nverts)?)
        } else {
            None
        };
        let normals = if flags.contains(VertexFlags::NORMALS) {
            Some(read_channel(&mut r, nverts)?)
        } else {
            None
        };
        let mut indices = alloc::reserve(nindices)?;
        r.read_u32s(nindices, &mut indices)?;

        grant.commit();
        Ok(Mesh {
            positions,
            texcoords,
            normals,
            indices,
        })
    }

    fn heap_bytes(&self) -> usize {
        self.nverts() * VEC3_SIZE * self.channel_count() + self.nindices() * size_of::<u32>()
    }
}

impl Encode for Mesh {
    fn required_size(&self) -> usize {
        MESH_HEADER_SIZE + self.heap_bytes()
    }

    fn encode_into(&self, out: &mut WriteCursor<'_>) -> Result<()> {
        self.validate()?;
        out.write_u8(MESH_VERSION)?;
        out.write_u32(self.nverts() as u32)?;
        out.write_u32(self.nindices() as u32)?;
        out.write_u8(self.flags().bits())?;
        out.write_vec3s(&self.positions)?;
        if let Some(texcoords) = &self.texcoords {
            out.write_vec3s(texcoords)?;
        }
        if let Some(normals) = &self.normals {
            out.write_vec3s(normals)?;
        }
        out.write_u32s(&self.indices)
    }
}

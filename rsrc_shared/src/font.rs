//! Bitmap font payload and its binary layout.
//!
//! ```text
//! u8      version (FONT_VERSION)
//! u16     nglyphs
//! u16     bmp_height
//! u16     bmp_width
//! f32     line_spacing
//! glyph   glyphs[nglyphs]         (GLYPH_PACKED_SIZE bytes each)
//! u8      bitmap[bmp_width * bmp_height]
//! ```
//!
//! A glyph is `u64 charcode, f32 advance_x, f32 bearing_x, f32 bearing_y,
//! u16 x, u16 y, u16 width, u16 height`. Scalars are in host byte order.

use std::mem::size_of;

use tracing::warn;

use crate::alloc::{self, Allocator, Grant};
use crate::codec::{Decode, Encode, ResourceKind};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{Result, RsrcError};

/// Compiled font layout version.
pub const FONT_VERSION: u8 = 1;

/// version + nglyphs + bmp_height + bmp_width + line_spacing.
pub const FONT_HEADER_SIZE: usize = 1 + 3 * 2 + 4;

/// Encoded size of one [`Glyph`].
pub const GLYPH_PACKED_SIZE: usize = 8 + 3 * 4 + 4 * 2;

/// One glyph and its rectangle in the font atlas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    pub charcode: u64,
    pub advance_x: f32,
    pub bearing_x: f32,
    pub bearing_y: f32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Glyph {
    fn read(r: &mut ReadCursor<'_>) -> Result<Self> {
        Ok(Glyph {
            charcode: r.read_u64()?,
            advance_x: r.read_f32()?,
            bearing_x: r.read_f32()?,
            bearing_y: r.read_f32()?,
            x: r.read_u16()?,
            y: r.read_u16()?,
            width: r.read_u16()?,
            height: r.read_u16()?,
        })
    }

    fn write(&self, w: &mut WriteCursor<'_>) -> Result<()> {
        w.write_u64(self.charcode)?;
        w.write_f32(self.advance_x)?;
        w.write_f32(self.bearing_x)?;
        w.write_f32(self.bearing_y)?;
        w.write_u16(self.x)?;
        w.write_u16(self.y)?;
        w.write_u16(self.width)?;
        w.write_u16(self.height)
    }

    /// Whether the atlas rectangle lies inside a `width` x `height` bitmap.
    pub fn fits_within(&self, width: u16, height: u16) -> bool {
        u32::from(self.x) + u32::from(self.width) <= u32::from(width)
            && u32::from(self.y) + u32::from(self.height) <= u32::from(height)
    }
}

/// Decoded font: glyph metrics plus a single-channel atlas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    pub bmp_width: u16,
    pub bmp_height: u16,
    pub line_spacing: f32,
    pub glyphs: Vec<Glyph>,
    /// Row-major coverage, `bmp_width * bmp_height` bytes.
    pub bitmap: Vec<u8>,
}

impl Font {
    pub fn nglyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// First glyph for `charcode`.
    pub fn glyph(&self, charcode: u64) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.charcode == charcode)
    }

    /// Whether every glyph rectangle lies inside the bitmap. Not enforced
    /// by decoding.
    pub fn glyphs_in_bounds(&self) -> bool {
        self.glyphs
            .iter()
            .all(|g| g.fits_within(self.bmp_width, self.bmp_height))
    }

    fn bitmap_len(width: u16, height: u16) -> usize {
        usize::from(width) * usize::from(height)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason| RsrcError::InvalidPayload {
            kind: ResourceKind::Font,
            reason,
        };
        if u16::try_from(self.nglyphs()).is_err() {
            return Err(invalid("glyph count exceeds u16"));
        }
        if self.bitmap.len() != Self::bitmap_len(self.bmp_width, self.bmp_height) {
            return Err(invalid("bitmap length differs from width * height"));
        }
        Ok(())
    }
}

impl Decode for Font {
    const KIND: ResourceKind = ResourceKind::Font;
    type Options = ();

    fn decode(bytes: &[u8], _options: &(), alloc: &dyn Allocator) -> Result<Self> {
        let mut r = ReadCursor::new(bytes);

        let version = r.read_u8()?;
        if version != FONT_VERSION {
            warn!(expected = FONT_VERSION, found = version, "Font version mismatch");
            return Err(RsrcError::VersionMismatch {
                kind: ResourceKind::Font,
                expected: FONT_VERSION,
                found: version,
            });
        }

        let nglyphs = usize::from(r.read_u16()?);
        let bmp_height = r.read_u16()?;
        let bmp_width = r.read_u16()?;
        let line_spacing = r.read_f32()?;

        let bitmap_len = Self::bitmap_len(bmp_width, bmp_height);
        r.ensure(nglyphs * GLYPH_PACKED_SIZE + bitmap_len)?;
        let grant = Grant::new(alloc, nglyphs * size_of::<Glyph>() + bitmap_len)?;

        let mut glyphs = alloc::reserve(nglyphs)?;
        for _ in 0..nglyphs {
            glyphs.push(Glyph::read(&mut r)?);
        }

        let mut bitmap = alloc::reserve(bitmap_len)?;
        bitmap.resize(bitmap_len, 0);
        r.read(&mut bitmap)?;

        grant.commit();
        Ok(Font {
            bmp_width,
            bmp_height,
            line_spacing,
            glyphs,
            bitmap,
        })
    }

    fn heap_bytes(&self) -> usize {
        self.nglyphs() * size_of::<Glyph>() + self.bitmap.len()
    }
}

impl Encode for Font {
    fn required_size(&self) -> usize {
        FONT_HEADER_SIZE + self.nglyphs() * GLYPH_PACKED_SIZE + self.bitmap.len()
    }

    fn encode_into(&self, out: &mut WriteCursor<'_>) -> Result<()> {
        self.validate()?;
        out.write_u8(FONT_VERSION)?;
        out.write_u16(self.nglyphs() as u16)?;
        out.write_u16(self.bmp_height)?;
        out.write_u16(self.bmp_width)?;
        out.write_f32(self.line_spacing)?;
        for glyph in &self.glyphs {
            glyph.write(out)?;
        }
        out.write(&self.bitmap)
    }
}

//! Bounds-checked byte cursors.
//!
//! All resource encoders and decoders go through [`WriteCursor::write`] and
//! [`ReadCursor::read`]; the typed helpers below are thin wrappers around
//! them. Scalars use the host's native byte order.

use crate::error::{Result, RsrcError};

/// Forward-only writer over a caller-owned buffer.
#[derive(Debug)]
pub struct WriteCursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WriteCursor<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Copies `src` and advances, or fails without writing anything.
    pub fn write(&mut self, src: &[u8]) -> Result<()> {
        let end = self.claim(src.len())?;
        self.buf[self.pos..end].copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn claim(&self, nbytes: usize) -> Result<usize> {
        if nbytes > self.remaining() {
            return Err(RsrcError::BufferTooSmall {
                needed: nbytes,
                remaining: self.remaining(),
            });
        }
        Ok(self.pos + nbytes)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write(&v.to_ne_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write(&v.to_ne_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write(&v.to_ne_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write(&v.to_ne_bytes())
    }

    pub fn write_vec3s(&mut self, vs: &[[f32; 3]]) -> Result<()> {
        for v in vs {
            for &c in v {
                self.write_f32(c)?;
            }
        }
        Ok(())
    }

    pub fn write_u32s(&mut self, vs: &[u32]) -> Result<()> {
        vs.iter().try_for_each(|&v| self.write_u32(v))
    }
}

/// Forward-only reader over an untrusted buffer.
#[derive(Debug, Clone)]
pub struct ReadCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fails with `BufferTooSmall` unless `nbytes` more bytes are available.
    /// Lets decoders reject a lying element count before allocating for it.
    pub fn ensure(&self, nbytes: usize) -> Result<()> {
        if nbytes > self.remaining() {
            return Err(RsrcError::BufferTooSmall {
                needed: nbytes,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Fills `dst` and advances, or fails without consuming anything.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<()> {
        self.ensure(dst.len())?;
        let end = self.pos + dst.len();
        dst.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read(&mut out)?;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_ne_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_ne_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_ne_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_ne_bytes)
    }

    /// Appends `count` vectors to `out`. `out` should already have capacity.
    pub fn read_vec3s(&mut self, count: usize, out: &mut Vec<[f32; 3]>) -> Result<()> {
        for _ in 0..count {
            out.push([self.read_f32()?, self.read_f32()?, self.read_f32()?]);
        }
        Ok(())
    }

    pub fn read_u32s(&mut self, count: usize, out: &mut Vec<u32>) -> Result<()> {
        for _ in 0..count {
            out.push(self.read_u32()?);
        }
        Ok(())
    }
}

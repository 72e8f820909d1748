//! Memory accounting seam.
//!
//! Hosts inject an [`Allocator`] to track or cap the memory held by resource
//! payloads and the string arena. Buffers are still ordinary `Vec`s; the
//! allocator is asked before each one is reserved and told when it goes away.

use std::cell::Cell;
use std::mem::size_of;

use crate::error::{Result, RsrcError};

/// Allocation accounting hooks.
pub trait Allocator {
    /// Requests `nbytes`. Returning `false` means out of memory.
    fn allocate(&self, nbytes: usize) -> bool;

    /// Returns `nbytes` previously granted by [`Allocator::allocate`].
    fn free(&self, nbytes: usize);

    /// Resizes a grant from `old` to `new` bytes.
    fn reallocate(&self, old: usize, new: usize) -> bool {
        if new > old {
            self.allocate(new - old)
        } else {
            self.free(old - new);
            true
        }
    }
}

/// Unbounded allocator. Never refuses.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, _nbytes: usize) -> bool {
        true
    }

    fn free(&self, _nbytes: usize) {}
}

/// Allocator with a hard byte limit.
#[derive(Debug)]
pub struct BudgetAllocator {
    limit: usize,
    in_use: Cell<usize>,
    peak: Cell<usize>,
}

impl BudgetAllocator {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            in_use: Cell::new(0),
            peak: Cell::new(0),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently granted.
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    /// Highest value `in_use` has reached.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }
}

impl Allocator for BudgetAllocator {
    fn allocate(&self, nbytes: usize) -> bool {
        let Some(total) = self.in_use.get().checked_add(nbytes) else {
            return false;
        };
        if total > self.limit {
            return false;
        }
        self.in_use.set(total);
        self.peak.set(self.peak.get().max(total));
        true
    }

    fn free(&self, nbytes: usize) {
        self.in_use.set(self.in_use.get().saturating_sub(nbytes));
    }
}

/// Byte size of `count` elements of `T`, or `OutOfMemory` on overflow.
pub fn bytes_for<T>(count: usize) -> Result<usize> {
    count
        .checked_mul(size_of::<T>())
        .ok_or(RsrcError::OutOfMemory { bytes: usize::MAX })
}

/// Reserves an empty `Vec` with room for `count` elements, accounted
/// through `alloc`. Nothing stays accounted if the reservation fails.
pub fn try_vec<T>(alloc: &dyn Allocator, count: usize) -> Result<Vec<T>> {
    let bytes = bytes_for::<T>(count)?;
    if !alloc.allocate(bytes) {
        return Err(RsrcError::OutOfMemory { bytes });
    }
    let mut v = Vec::new();
    if v.try_reserve_exact(count).is_err() {
        alloc.free(bytes);
        return Err(RsrcError::OutOfMemory { bytes });
    }
    Ok(v)
}

/// Reserves exactly `count` elements without accounting. Pair with a [`Grant`].
pub fn reserve<T>(count: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(count).map_err(|_| RsrcError::OutOfMemory {
        bytes: count.saturating_mul(size_of::<T>()),
    })?;
    Ok(v)
}

/// Accounted bytes that are handed back on drop unless committed.
///
/// Decoders take one grant for every buffer of a payload, then commit it
/// once the payload is complete. Any early `?` return frees the grant.
#[must_use]
pub struct Grant<'a> {
    alloc: &'a dyn Allocator,
    bytes: usize,
}

impl<'a> Grant<'a> {
    pub fn new(alloc: &'a dyn Allocator, bytes: usize) -> Result<Self> {
        if !alloc.allocate(bytes) {
            return Err(RsrcError::OutOfMemory { bytes });
        }
        Ok(Self { alloc, bytes })
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Grows or shrinks the grant through [`Allocator::reallocate`].
    pub fn resize(&mut self, bytes: usize) -> Result<()> {
        if !self.alloc.reallocate(self.bytes, bytes) {
            return Err(RsrcError::OutOfMemory { bytes });
        }
        self.bytes = bytes;
        Ok(())
    }

    /// Keeps the bytes accounted; ownership moves to the payload.
    pub fn commit(self) -> usize {
        let bytes = self.bytes;
        std::mem::forget(self);
        bytes
    }
}

impl Drop for Grant<'_> {
    fn drop(&mut self) {
        self.alloc.free(self.bytes);
    }
}

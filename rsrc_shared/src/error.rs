//! Error taxonomy for the resource subsystem.
//!
//! Every codec, table and cache operation returns [`Result`]. Nothing here is
//! fatal: conditions that would otherwise be "can't happen" assertions (double
//! load, unknown token) are ordinary variants the caller can match on.

use thiserror::Error;

use crate::codec::ResourceKind;
use crate::string_id::StrId;

/// Library result alias.
pub type Result<T> = std::result::Result<T, RsrcError>;

/// Which fixed-capacity structure ran out of room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Interned-string arena.
    StringArena,
    /// String table lookup slots.
    StringSlots,
    /// Slot table of one resource kind.
    Slots(ResourceKind),
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capacity::StringArena => write!(f, "string arena"),
            Capacity::StringSlots => write!(f, "string id slots"),
            Capacity::Slots(kind) => write!(f, "{kind} slots"),
        }
    }
}

/// Resource subsystem errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RsrcError {
    /// The file provider could not produce bytes for a name.
    #[error("could not read resource '{name}': {reason}")]
    IoFailure { name: String, reason: String },

    /// Version byte of an encoded payload differs from the compiled one.
    #[error("{kind} version mismatch (compiled: {expected}, loading: {found})")]
    VersionMismatch {
        kind: ResourceKind,
        expected: u8,
        found: u8,
    },

    /// A cursor read or write ran past the end of its buffer.
    #[error("buffer too small: needed {needed} bytes, {remaining} remaining")]
    BufferTooSmall { needed: usize, remaining: usize },

    /// The allocator refused a request.
    #[error("out of memory allocating {bytes} bytes")]
    OutOfMemory { bytes: usize },

    /// A fixed-capacity table or arena is full.
    #[error("{what} exhausted (capacity {capacity})")]
    CapacityExceeded { what: Capacity, capacity: usize },

    /// Two distinct names landed on the same identifier slot.
    #[error("name '{incoming}' collides with an interned name (id {id})")]
    NameCollision {
        id: StrId,
        /// The name already in the slot, if it was stored.
        existing: Option<String>,
        incoming: String,
    },

    /// The identifier is already resident in the cache.
    #[error("{kind} {id} is already loaded")]
    DuplicateLoad { kind: ResourceKind, id: StrId },

    /// Unload of an identifier that is not resident.
    #[error("{kind} {id} is not loaded")]
    UnknownToken { kind: ResourceKind, id: StrId },

    /// The identifier has no stored name to hand to the file provider.
    #[error("identifier {0} has no stored name")]
    UnresolvedIdentifier(StrId),

    /// A payload handed to an encoder breaks its own layout.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        kind: ResourceKind,
        reason: &'static str,
    },

    /// The image collaborator rejected texture bytes.
    #[error("image decode error: {0}")]
    ImageDecode(String),
}

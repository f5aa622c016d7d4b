//! Identifiers, attribute kinds, and the crate-wide error type.

use std::fmt;
use std::io;

use thiserror::Error;

/// Identifier of an edge in the owning graph.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EdgeId {
    fn from(value: u32) -> Self {
        EdgeId(value)
    }
}

/// Closed set of attribute kinds an edge can carry.
///
/// The discriminants are the persisted `type` codes and must never be
/// renumbered once a table has been written.
#[repr(i32)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AttributeKind {
    /// External identifier of the underlying way.
    OsmId = 0,
    /// Height restriction.
    Height = 1,
    /// Width restriction.
    Width = 2,
    /// Length restriction.
    Length = 3,
    /// Weight restriction.
    Weight = 4,
}

impl AttributeKind {
    /// All kinds, in persisted-code order.
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::OsmId,
        AttributeKind::Height,
        AttributeKind::Width,
        AttributeKind::Length,
        AttributeKind::Weight,
    ];

    /// Persisted integer code of this kind.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Resolves a persisted code back to a kind.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }
}

/// Errors surfaced by the attribute storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O failure in a file-backed region.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Stored bytes contradict the engine's invariants; never retried.
    #[error("corruption detected: {0}")]
    Corruption(&'static str),
    /// A caller misused the API or supplied a bad configuration.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// The operation is not meaningful for this store kind.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StoreError>;

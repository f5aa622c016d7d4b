//! Attribute storage engine for road network graphs.
//!
//! Edges of a road network carry a variable number of typed attributes
//! (height limit, weight restriction, ...) without growing the fixed-size
//! edge record: each edge owns a single `i32` head pointer into a flat,
//! append-only table of `{type, value, next}` records, and its attributes
//! form an intrusive singly-linked chain threaded through the `next`
//! fields. The table lives inside one growable byte region that can be
//! backed by volatile memory or a memory-mapped file and persisted
//! byte-for-byte.

#![warn(missing_docs)]

pub mod primitives;
pub mod storage;
pub mod types;

pub use primitives::region::{
    MemRegion, MmapRegion, Region, RegionDirectory, RegionKind, DEFAULT_SEGMENT_BYTES,
};
pub use storage::{
    AttributeTable, EdgeFieldColumn, EdgeFields, EdgeSlot, EntryLayout, GraphExtension,
    ABSENT_VALUE, NO_ENTRY,
};
pub use types::{AttributeKind, EdgeId, Result, StoreError};

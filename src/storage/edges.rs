//! The per-edge head-pointer slot owned by the graph side.

use crate::types::{EdgeId, Result, StoreError};

/// Access to an edge's attribute head pointer.
///
/// The graph owns one `i32` slot per edge; the attribute table only ever
/// reads it as the first chain index and rewrites it on the first insert.
pub trait EdgeFields {
    /// Current head index, or the "no attributes" sentinel.
    fn attribute_head(&self) -> i32;
    /// Rewrites the head index.
    fn set_attribute_head(&mut self, head: i32);
}

/// A plain column of per-edge head-pointer slots.
///
/// Stands in for the owning graph's extra edge field. Every slot starts
/// at the default the extension declares (see
/// [`GraphExtension::default_edge_field_value`](crate::storage::GraphExtension::default_edge_field_value)).
pub struct EdgeFieldColumn {
    slots: Vec<i32>,
}

impl EdgeFieldColumn {
    /// Allocates `edge_count` slots, all set to `default`.
    pub fn new(edge_count: usize, default: i32) -> Self {
        Self {
            slots: vec![default; edge_count],
        }
    }

    /// Number of edges in the column.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the column holds no edges.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// A mutable view of one edge's slot.
    pub fn slot(&mut self, edge: EdgeId) -> Result<EdgeSlot<'_>> {
        let slot = self
            .slots
            .get_mut(edge.0 as usize)
            .ok_or(StoreError::Invalid("edge id out of range"))?;
        Ok(EdgeSlot { slot })
    }

    /// Reads one edge's slot without taking a view.
    pub fn head(&self, edge: EdgeId) -> Result<i32> {
        self.slots
            .get(edge.0 as usize)
            .copied()
            .ok_or(StoreError::Invalid("edge id out of range"))
    }
}

/// Mutable view of a single edge's head-pointer slot.
pub struct EdgeSlot<'a> {
    slot: &'a mut i32,
}

impl EdgeFields for EdgeSlot<'_> {
    fn attribute_head(&self) -> i32 {
        *self.slot
    }

    fn set_attribute_head(&mut self, head: i32) {
        *self.slot = head;
    }
}

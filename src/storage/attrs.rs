//! The append-only attribute table and its chain algorithms.

use tracing::{debug, error};

use crate::primitives::region::Region;
use crate::types::{AttributeKind, Result, StoreError};

use super::extension::GraphExtension;
use super::layout::{EntryField, EntryLayout};
use super::EdgeFields;

/// Sentinel index: "no entry" in a head pointer, "end of chain" in a
/// `next` field.
pub const NO_ENTRY: i32 = -1;

/// Sentinel payload meaning "attribute absent"; never stored.
pub const ABSENT_VALUE: i32 = 0;

/// Corruption guard: a chain longer than this is never a valid state.
const CHAIN_HOP_LIMIT: u32 = 1000;

/// Entries of headroom requested beyond the one being written, so a few
/// appends in a row share one capacity check.
const CAPACITY_SLACK_ENTRIES: u64 = 4;

/// Header slot holding the entry width.
const HEADER_ENTRY_BYTES: usize = 0;
/// Header slot holding the entry count.
const HEADER_ENTRY_COUNT: usize = 4;

/// Append-only table of `{type, value, next}` records backing all edges'
/// attribute chains.
///
/// Records are never edited in place, reused, or compacted; the table is
/// a growing log, and each edge's attributes form a singly-linked chain
/// threaded through the `next` fields, starting at the edge's head
/// pointer. Single-writer: appends must not run concurrently with
/// anything else on the same table.
pub struct AttributeTable {
    region: Box<dyn Region>,
    layout: EntryLayout,
    entry_count: u32,
}

impl AttributeTable {
    /// Wraps a region handed out by the registry. The table is unusable
    /// until [`AttributeTable::create`] or
    /// [`AttributeTable::load_existing`] succeeds.
    pub fn new(region: Box<dyn Region>) -> Self {
        Self {
            region,
            layout: EntryLayout::new(),
            entry_count: 0,
        }
    }

    /// Allocates a fresh, empty table sized for `initial_entries`
    /// records.
    pub fn create(&mut self, initial_entries: u64) -> Result<()> {
        if self.entry_count > 0 {
            return Err(StoreError::Invalid(
                "attribute table must be initialized only once",
            ));
        }
        self.region
            .create_new(initial_entries * u64::from(self.layout.entry_bytes()))?;
        debug!(region = %self.region.name(), initial_entries, "created attribute table");
        Ok(())
    }

    /// Overrides the backing region's growth segment size. Only valid
    /// before the table is created or loaded.
    pub fn set_segment_size(&mut self, bytes: u32) -> Result<()> {
        self.region.set_segment_size(bytes)
    }

    /// Appends `value` of the given kind to the edge's attribute chain.
    ///
    /// Storing the absent sentinel (`0`) is a silent no-op. The record
    /// is written fully formed (kind, value, end terminator) before it
    /// is linked, so a failure while linking leaves at worst an
    /// unreachable record, never a half-written one.
    pub fn add_attribute(
        &mut self,
        edge: &mut dyn EdgeFields,
        kind: AttributeKind,
        value: i32,
    ) -> Result<()> {
        if value == ABSENT_VALUE {
            return Ok(());
        }
        if self.entry_count >= i32::MAX as u32 {
            return Err(StoreError::Invalid("attribute table is full"));
        }
        let new_index = self.entry_count as i32;
        self.ensure_entry(new_index)?;
        self.set_field(new_index, EntryField::Kind, kind.code())?;
        self.set_field(new_index, EntryField::Value, value)?;
        self.set_field(new_index, EntryField::Next, NO_ENTRY)?;
        self.entry_count += 1;

        let head = edge.attribute_head();
        if head == NO_ENTRY {
            edge.set_attribute_head(new_index);
            return Ok(());
        }
        let tail = self.chain_tail(head)?;
        self.set_field(tail, EntryField::Next, new_index)
    }

    /// Returns the first value of the given kind in the edge's chain,
    /// or `0` when the edge carries no such attribute.
    pub fn attribute(&self, edge: &dyn EdgeFields, kind: AttributeKind) -> Result<i32> {
        let mut index = edge.attribute_head();
        let mut hops = 0u32;
        while index != NO_ENTRY {
            if hops > CHAIN_HOP_LIMIT {
                error!(hops, "attribute chain has no end sentinel");
                return Err(StoreError::Corruption(
                    "attribute chain exceeds the hop limit",
                ));
            }
            if self.get_field(index, EntryField::Kind)? == kind.code() {
                return self.get_field(index, EntryField::Value);
            }
            let next = self.get_field(index, EntryField::Next)?;
            if next == index {
                error!(index, "attribute entry links to itself");
                return Err(StoreError::Corruption("attribute chain links to itself"));
            }
            index = next;
            hops += 1;
        }
        Ok(ABSENT_VALUE)
    }

    /// Walks from `head` to the last entry of a chain.
    fn chain_tail(&self, head: i32) -> Result<i32> {
        let mut tail = head;
        let mut hops = 0u32;
        loop {
            let next = self.get_field(tail, EntryField::Next)?;
            if next == NO_ENTRY {
                return Ok(tail);
            }
            if next == tail {
                error!(index = tail, "attribute entry links to itself");
                return Err(StoreError::Corruption("attribute chain links to itself"));
            }
            tail = next;
            hops += 1;
            if hops > CHAIN_HOP_LIMIT {
                error!(hops, "attribute chain has no end sentinel");
                return Err(StoreError::Corruption(
                    "attribute chain exceeds the hop limit",
                ));
            }
        }
    }

    /// Guarantees the table can address through `index` plus the slack
    /// margin before anything is written at `index`.
    fn ensure_entry(&mut self, index: i32) -> Result<()> {
        let entries = index as u64 + CAPACITY_SLACK_ENTRIES;
        self.region
            .ensure_capacity(entries * u64::from(self.layout.entry_bytes()))
    }

    fn get_field(&self, index: i32, field: EntryField) -> Result<i32> {
        self.region.get_int(self.layout.field_offset(index, field))
    }

    fn set_field(&mut self, index: i32, field: EntryField, value: i32) -> Result<()> {
        self.region
            .set_int(self.layout.field_offset(index, field), value)
    }

    /// Writes the entry width and count to the header, then flushes the
    /// region.
    pub fn flush(&mut self) -> Result<()> {
        self.region
            .set_header(HEADER_ENTRY_BYTES, self.layout.entry_bytes() as i32)?;
        self.region
            .set_header(HEADER_ENTRY_COUNT, self.entry_count as i32)?;
        self.region.flush()
    }

    /// Attaches to a previously flushed table.
    ///
    /// Returns `Ok(false)` when the region has no persisted state. A
    /// stored entry width that disagrees with this build's layout is
    /// corruption: offsets computed from a different width would alias
    /// unrelated data.
    pub fn load_existing(&mut self) -> Result<bool> {
        if !self.region.load_existing()? {
            return Ok(false);
        }
        let stored_entry_bytes = self.region.get_header(HEADER_ENTRY_BYTES)?;
        if stored_entry_bytes != self.layout.entry_bytes() as i32 {
            error!(
                stored = stored_entry_bytes,
                expected = self.layout.entry_bytes(),
                "entry width mismatch on reload"
            );
            return Err(StoreError::Corruption(
                "stored entry width does not match this layout",
            ));
        }
        let stored_count = self.region.get_header(HEADER_ENTRY_COUNT)?;
        if stored_count < 0 {
            return Err(StoreError::Corruption("negative stored entry count"));
        }
        self.entry_count = stored_count as u32;
        debug!(
            region = %self.region.name(),
            entries = self.entry_count,
            "loaded attribute table"
        );
        Ok(true)
    }

    /// Releases the backing region. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        self.region.close()
    }

    /// Whether the backing region has been closed.
    pub fn is_closed(&self) -> bool {
        self.region.is_closed()
    }

    /// Capacity of the backing region in bytes.
    pub fn capacity(&self) -> u64 {
        self.region.capacity()
    }

    /// Number of records appended so far.
    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    /// Width of one record in bytes.
    pub fn entry_bytes(&self) -> u32 {
        self.layout.entry_bytes()
    }

    /// Duplicates the full region content and the entry counter into
    /// `other`, which must wrap the same kind of region.
    pub fn copy_to(&self, other: &mut AttributeTable) -> Result<()> {
        self.region.copy_to(other.region.as_mut())?;
        other.entry_count = self.entry_count;
        Ok(())
    }
}

impl GraphExtension for AttributeTable {
    fn requires_node_field(&self) -> bool {
        false
    }

    fn requires_edge_field(&self) -> bool {
        true
    }

    fn default_node_field_value(&self) -> Result<i32> {
        Err(StoreError::Unsupported(
            "attribute storage keeps no node-level data",
        ))
    }

    fn default_edge_field_value(&self) -> i32 {
        NO_ENTRY
    }
}

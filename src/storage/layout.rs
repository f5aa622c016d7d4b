//! Fixed-width record layout of one attribute entry.

/// The three `i32` fields of an attribute entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EntryField {
    /// Attribute kind code.
    Kind,
    /// Attribute payload value.
    Value,
    /// Index of the next entry in the edge's chain, or the end sentinel.
    Next,
}

/// Byte offsets of the entry fields and the total entry width.
///
/// The mapping `index * entry_bytes + offset(field)` must stay stable
/// for the lifetime of a persisted table; the width is written to the
/// region header at flush and verified on reload.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EntryLayout {
    kind_offset: u32,
    value_offset: u32,
    next_offset: u32,
    entry_bytes: u32,
}

impl EntryLayout {
    /// Builds the layout, assigning each field the next 4-byte cell.
    pub fn new() -> Self {
        let mut cursor = 0u32;
        let mut next_cell = || {
            let offset = cursor;
            cursor += 4;
            offset
        };
        let kind_offset = next_cell();
        let value_offset = next_cell();
        let next_offset = next_cell();
        Self {
            kind_offset,
            value_offset,
            next_offset,
            entry_bytes: cursor,
        }
    }

    /// Total width of one entry in bytes.
    pub fn entry_bytes(&self) -> u32 {
        self.entry_bytes
    }

    /// Byte offset of `field` within the entry at `index`.
    ///
    /// Callers guarantee `index` is a real entry index (never a
    /// sentinel).
    pub fn field_offset(&self, index: i32, field: EntryField) -> u64 {
        debug_assert!(index >= 0, "sentinel index used as entry index");
        let field_offset = match field {
            EntryField::Kind => self.kind_offset,
            EntryField::Value => self.value_offset,
            EntryField::Next => self.next_offset,
        };
        index as u64 * u64::from(self.entry_bytes) + u64::from(field_offset)
    }
}

impl Default for EntryLayout {
    fn default() -> Self {
        Self::new()
    }
}

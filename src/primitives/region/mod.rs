//! Flat storage regions: named, growable, byte-addressable arrays.
//!
//! A [`Region`] is the backing primitive the attribute table is built on.
//! It offers random 32-bit reads and writes over a data area that grows
//! in whole segments, plus a small header area persisted independently of
//! the data. Two backings share the contract: [`MemRegion`] (volatile)
//! and [`MmapRegion`] (memory-mapped file).

use serde::{Deserialize, Serialize};

use crate::types::{Result, StoreError};

mod dir;
mod mem;
mod mmap;

pub use dir::RegionDirectory;
pub use mem::MemRegion;
pub use mmap::MmapRegion;

/// Default growth segment: 1 MiB.
pub const DEFAULT_SEGMENT_BYTES: u32 = 1 << 20;

/// Smallest accepted segment; requests below this are rounded up.
pub const MIN_SEGMENT_BYTES: u32 = 128;

/// Number of 4-byte header slots every region reserves.
pub const HEADER_SLOTS: usize = 16;

/// Size of the header area in bytes.
pub const HEADER_AREA_BYTES: usize = HEADER_SLOTS * 4;

/// Which backing implements a region.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Volatile in-process memory; contents do not survive a reload.
    InMemory,
    /// Memory-mapped file; contents survive flush and reload.
    MemoryMapped,
}

/// A named, growable, byte-addressable storage region.
///
/// Lifecycle: a region is either created fresh via [`Region::create_new`]
/// or attached to persisted state via [`Region::load_existing`]; all data
/// access before either is an error. [`Region::close`] is idempotent, and
/// every other operation on a closed region fails with
/// [`StoreError::Invalid`].
///
/// All multi-byte values use little-endian byte order.
pub trait Region {
    /// The backing kind, used for clone-compatibility checks.
    fn kind(&self) -> RegionKind;

    /// Logical name this region was registered under.
    fn name(&self) -> &str;

    /// Allocates a fresh region with at least `initial_bytes` of data
    /// capacity, rounded up to whole segments.
    fn create_new(&mut self, initial_bytes: u64) -> Result<()>;

    /// Attaches to previously persisted state.
    ///
    /// Returns `Ok(false)` when no persisted state exists (always the
    /// case for volatile backings).
    fn load_existing(&mut self) -> Result<bool>;

    /// Persists the header area and data to the backing medium.
    fn flush(&mut self) -> Result<()>;

    /// Releases the backing resources. Safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Whether [`Region::close`] has been called.
    fn is_closed(&self) -> bool;

    /// Reads `dst.len()` bytes of the data area starting at `offset`.
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()>;

    /// Writes `src` into the data area starting at `offset`.
    fn write_at(&mut self, offset: u64, src: &[u8]) -> Result<()>;

    /// Grows the data area to at least `min_bytes`, in whole segments.
    /// Never shrinks.
    fn ensure_capacity(&mut self, min_bytes: u64) -> Result<()>;

    /// Current data capacity in bytes; a multiple of the segment size.
    fn capacity(&self) -> u64;

    /// Current growth segment size in bytes.
    fn segment_bytes(&self) -> u32;

    /// Overrides the growth segment size. Only valid before the region
    /// is created or loaded; values below [`MIN_SEGMENT_BYTES`] are
    /// rounded up.
    fn set_segment_size(&mut self, bytes: u32) -> Result<()>;

    /// Stores a value in the header area at the given byte offset
    /// (4-byte aligned, within [`HEADER_AREA_BYTES`]).
    fn set_header(&mut self, slot_offset: usize, value: i32) -> Result<()>;

    /// Reads a header value previously stored with [`Region::set_header`].
    fn get_header(&self, slot_offset: usize) -> Result<i32>;

    /// Reads a little-endian `i32` from the data area.
    fn get_int(&self, offset: u64) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_at(offset, &mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    /// Writes a little-endian `i32` into the data area.
    fn set_int(&mut self, offset: u64, value: i32) -> Result<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Duplicates this region's header and full data area into `other`.
    ///
    /// Fails with [`StoreError::Invalid`] when the backings differ.
    fn copy_to(&self, other: &mut dyn Region) -> Result<()> {
        if other.kind() != self.kind() {
            return Err(StoreError::Invalid(
                "cannot copy between different region backings",
            ));
        }
        for slot_offset in (0..HEADER_AREA_BYTES).step_by(4) {
            other.set_header(slot_offset, self.get_header(slot_offset)?)?;
        }
        other.ensure_capacity(self.capacity())?;
        let mut buf = [0u8; 8192];
        let capacity = self.capacity();
        let mut offset = 0u64;
        while offset < capacity {
            let len = ((capacity - offset) as usize).min(buf.len());
            self.read_at(offset, &mut buf[..len])?;
            other.write_at(offset, &buf[..len])?;
            offset += len as u64;
        }
        Ok(())
    }
}

/// Rounds `min_bytes` up to a whole number of segments (at least one).
pub(crate) fn segment_aligned(min_bytes: u64, segment_bytes: u32) -> u64 {
    let segment = u64::from(segment_bytes);
    let segments = min_bytes.div_ceil(segment).max(1);
    segments * segment
}

/// Validates a header slot offset: in range and 4-byte aligned.
pub(crate) fn header_slot_index(slot_offset: usize) -> Result<usize> {
    if slot_offset % 4 != 0 || slot_offset + 4 > HEADER_AREA_BYTES {
        return Err(StoreError::Invalid("header slot offset out of range"));
    }
    Ok(slot_offset / 4)
}

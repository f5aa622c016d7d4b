//! Volatile in-memory region backing.

use tracing::debug;

use crate::types::{Result, StoreError};

use super::{
    header_slot_index, segment_aligned, Region, RegionKind, DEFAULT_SEGMENT_BYTES,
    HEADER_SLOTS, MIN_SEGMENT_BYTES,
};

/// A [`Region`] held entirely in process memory.
///
/// Nothing survives a reload: [`Region::load_existing`] always reports
/// that no persisted state exists, and [`Region::flush`] has nothing to
/// do beyond validating the region state.
pub struct MemRegion {
    name: String,
    header: [i32; HEADER_SLOTS],
    data: Vec<u8>,
    segment_bytes: u32,
    attached: bool,
    closed: bool,
}

impl MemRegion {
    /// Creates an unattached in-memory region under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            header: [0; HEADER_SLOTS],
            data: Vec::new(),
            segment_bytes: DEFAULT_SEGMENT_BYTES,
            attached: false,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StoreError::Invalid("region is closed"));
        }
        Ok(())
    }

    fn check_attached(&self) -> Result<()> {
        self.check_open()?;
        if !self.attached {
            return Err(StoreError::Invalid("region not created"));
        }
        Ok(())
    }
}

impl Region for MemRegion {
    fn kind(&self) -> RegionKind {
        RegionKind::InMemory
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_new(&mut self, initial_bytes: u64) -> Result<()> {
        self.check_open()?;
        if self.attached {
            return Err(StoreError::Invalid("region already created"));
        }
        let capacity = segment_aligned(initial_bytes, self.segment_bytes);
        self.data = vec![0; capacity as usize];
        self.attached = true;
        debug!(name = %self.name, capacity, "created in-memory region");
        Ok(())
    }

    fn load_existing(&mut self) -> Result<bool> {
        self.check_open()?;
        if self.attached {
            return Err(StoreError::Invalid("region already created"));
        }
        Ok(false)
    }

    fn flush(&mut self) -> Result<()> {
        self.check_attached()
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.data = Vec::new();
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()> {
        self.check_attached()?;
        let end = offset
            .checked_add(dst.len() as u64)
            .ok_or(StoreError::Invalid("region offset overflow"))?;
        if end > self.data.len() as u64 {
            return Err(StoreError::Invalid("access beyond region capacity"));
        }
        dst.copy_from_slice(&self.data[offset as usize..end as usize]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, src: &[u8]) -> Result<()> {
        self.check_attached()?;
        let end = offset
            .checked_add(src.len() as u64)
            .ok_or(StoreError::Invalid("region offset overflow"))?;
        if end > self.data.len() as u64 {
            return Err(StoreError::Invalid("access beyond region capacity"));
        }
        self.data[offset as usize..end as usize].copy_from_slice(src);
        Ok(())
    }

    fn ensure_capacity(&mut self, min_bytes: u64) -> Result<()> {
        self.check_attached()?;
        if min_bytes <= self.data.len() as u64 {
            return Ok(());
        }
        let capacity = segment_aligned(min_bytes, self.segment_bytes);
        debug!(
            name = %self.name,
            from = self.data.len(),
            to = capacity,
            "growing in-memory region"
        );
        self.data.resize(capacity as usize, 0);
        Ok(())
    }

    fn capacity(&self) -> u64 {
        self.data.len() as u64
    }

    fn segment_bytes(&self) -> u32 {
        self.segment_bytes
    }

    fn set_segment_size(&mut self, bytes: u32) -> Result<()> {
        self.check_open()?;
        if self.attached {
            return Err(StoreError::Invalid(
                "segment size is fixed once the region exists",
            ));
        }
        if bytes == 0 {
            return Err(StoreError::Invalid("segment size must be positive"));
        }
        self.segment_bytes = bytes.max(MIN_SEGMENT_BYTES);
        Ok(())
    }

    fn set_header(&mut self, slot_offset: usize, value: i32) -> Result<()> {
        self.check_open()?;
        self.header[header_slot_index(slot_offset)?] = value;
        Ok(())
    }

    fn get_header(&self, slot_offset: usize) -> Result<i32> {
        self.check_open()?;
        Ok(self.header[header_slot_index(slot_offset)?])
    }
}

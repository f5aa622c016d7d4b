//! Memory-mapped file region backing.
//!
//! File layout: an 8-byte magic, format version, segment size, and data
//! capacity, followed by the 16-slot header area and (from
//! [`DATA_OFFSET`]) the data area. Growth extends the file by whole
//! segments and re-maps.

#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::ops::Range;
use std::path::PathBuf;

use memmap2::{MmapMut, MmapOptions};
use tracing::debug;

use crate::types::{Result, StoreError};

use super::{
    header_slot_index, segment_aligned, Region, RegionKind, DEFAULT_SEGMENT_BYTES,
    HEADER_AREA_BYTES, HEADER_SLOTS, MIN_SEGMENT_BYTES,
};

const FILE_MAGIC: &[u8; 8] = b"MACADAM\0";
const FORMAT_VERSION: u32 = 1;

const OFF_MAGIC: Range<usize> = 0..8;
const OFF_VERSION: Range<usize> = 8..12;
const OFF_SEGMENT: Range<usize> = 12..16;
const OFF_CAPACITY: Range<usize> = 16..24;
const OFF_HEADER: Range<usize> = 24..24 + HEADER_AREA_BYTES;

/// Byte offset of the data area within the file; the gap above the
/// header slots is reserved.
const DATA_OFFSET: u64 = 128;

/// A [`Region`] backed by a memory-mapped file.
///
/// Data writes go straight to the mapping; header slot values live in an
/// in-process mirror and reach the file on [`Region::flush`].
pub struct MmapRegion {
    name: String,
    path: PathBuf,
    file: Option<File>,
    map: Option<MmapMut>,
    header: [i32; HEADER_SLOTS],
    segment_bytes: u32,
    capacity: u64,
    closed: bool,
}

impl MmapRegion {
    /// Creates an unattached mapped region stored at `path`.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            file: None,
            map: None,
            header: [0; HEADER_SLOTS],
            segment_bytes: DEFAULT_SEGMENT_BYTES,
            capacity: 0,
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(StoreError::Invalid("region is closed"));
        }
        Ok(())
    }

    fn check_attached(&self) -> Result<&MmapMut> {
        self.check_open()?;
        self.map
            .as_ref()
            .ok_or(StoreError::Invalid("region not created"))
    }

    fn check_attached_mut(&mut self) -> Result<&mut MmapMut> {
        if self.closed {
            return Err(StoreError::Invalid("region is closed"));
        }
        self.map
            .as_mut()
            .ok_or(StoreError::Invalid("region not created"))
    }

    fn map_file(file: &File) -> Result<MmapMut> {
        // Safety: the file handle stays open for the lifetime of the map
        // and this process is the region's single writer.
        let map = unsafe { MmapOptions::new().map_mut(file)? };
        Ok(map)
    }

    fn data_range(&self, offset: u64, len: usize) -> Result<Range<usize>> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(StoreError::Invalid("region offset overflow"))?;
        if end > self.capacity {
            return Err(StoreError::Invalid("access beyond region capacity"));
        }
        let start = (DATA_OFFSET + offset) as usize;
        Ok(start..start + len)
    }

    fn write_file_fields(map: &mut MmapMut, segment_bytes: u32, capacity: u64) {
        map[OFF_MAGIC].copy_from_slice(FILE_MAGIC);
        map[OFF_VERSION].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        map[OFF_SEGMENT].copy_from_slice(&segment_bytes.to_le_bytes());
        map[OFF_CAPACITY].copy_from_slice(&capacity.to_le_bytes());
    }
}

impl Region for MmapRegion {
    fn kind(&self) -> RegionKind {
        RegionKind::MemoryMapped
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_new(&mut self, initial_bytes: u64) -> Result<()> {
        self.check_open()?;
        if self.map.is_some() {
            return Err(StoreError::Invalid("region already created"));
        }
        let capacity = segment_aligned(initial_bytes, self.segment_bytes);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.set_len(DATA_OFFSET + capacity)?;
        let mut map = Self::map_file(&file)?;
        Self::write_file_fields(&mut map, self.segment_bytes, capacity);
        self.header = [0; HEADER_SLOTS];
        self.capacity = capacity;
        self.file = Some(file);
        self.map = Some(map);
        debug!(name = %self.name, capacity, "created mapped region");
        Ok(())
    }

    fn load_existing(&mut self) -> Result<bool> {
        self.check_open()?;
        if self.map.is_some() {
            return Err(StoreError::Invalid("region already created"));
        }
        if !self.path.exists() {
            return Ok(false);
        }
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let file_len = file.metadata()?.len();
        if file_len < DATA_OFFSET {
            return Err(StoreError::Corruption("region file truncated"));
        }
        let map = Self::map_file(&file)?;
        if &map[OFF_MAGIC] != FILE_MAGIC {
            return Err(StoreError::Corruption("bad region file magic"));
        }
        let version = u32::from_le_bytes(map[OFF_VERSION].try_into().expect("4-byte slice"));
        if version != FORMAT_VERSION {
            return Err(StoreError::Corruption("unsupported region format version"));
        }
        let segment_bytes = u32::from_le_bytes(map[OFF_SEGMENT].try_into().expect("4-byte slice"));
        if segment_bytes == 0 {
            return Err(StoreError::Corruption("invalid segment size in region file"));
        }
        let capacity = u64::from_le_bytes(map[OFF_CAPACITY].try_into().expect("8-byte slice"));
        if DATA_OFFSET + capacity > file_len {
            return Err(StoreError::Corruption("region capacity exceeds file length"));
        }
        for (slot, chunk) in map[OFF_HEADER].chunks_exact(4).enumerate() {
            self.header[slot] = i32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        }
        self.segment_bytes = segment_bytes;
        self.capacity = capacity;
        self.file = Some(file);
        self.map = Some(map);
        debug!(name = %self.name, capacity, "loaded mapped region");
        Ok(true)
    }

    fn flush(&mut self) -> Result<()> {
        let header = self.header;
        let segment_bytes = self.segment_bytes;
        let capacity = self.capacity;
        let map = self.check_attached_mut()?;
        Self::write_file_fields(map, segment_bytes, capacity);
        for (slot, value) in header.iter().enumerate() {
            let start = OFF_HEADER.start + slot * 4;
            map[start..start + 4].copy_from_slice(&value.to_le_bytes());
        }
        map.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.map = None;
            self.file = None;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn read_at(&self, offset: u64, dst: &mut [u8]) -> Result<()> {
        let map = self.check_attached()?;
        let range = self.data_range(offset, dst.len())?;
        dst.copy_from_slice(&map[range]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, src: &[u8]) -> Result<()> {
        let range = {
            self.check_attached()?;
            self.data_range(offset, src.len())?
        };
        let map = self.check_attached_mut()?;
        map[range].copy_from_slice(src);
        Ok(())
    }

    fn ensure_capacity(&mut self, min_bytes: u64) -> Result<()> {
        self.check_attached()?;
        if min_bytes <= self.capacity {
            return Ok(());
        }
        let new_capacity = segment_aligned(min_bytes, self.segment_bytes);
        debug!(
            name = %self.name,
            from = self.capacity,
            to = new_capacity,
            "growing mapped region"
        );
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        let file = self
            .file
            .as_ref()
            .ok_or(StoreError::Invalid("region not created"))?;
        file.set_len(DATA_OFFSET + new_capacity)?;
        let mut map = Self::map_file(file)?;
        map[OFF_CAPACITY].copy_from_slice(&new_capacity.to_le_bytes());
        self.capacity = new_capacity;
        self.map = Some(map);
        Ok(())
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn segment_bytes(&self) -> u32 {
        self.segment_bytes
    }

    fn set_segment_size(&mut self, bytes: u32) -> Result<()> {
        self.check_open()?;
        if self.map.is_some() {
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

#![allow(missing_docs)]

use macadam::{Region, RegionDirectory, RegionKind, Result};
use tempfile::tempdir;

#[test]
fn recorded_backing_wins_over_a_changed_default() -> Result<()> {
    let dir = tempdir()?;
    {
        let mut directory = RegionDirectory::open(dir.path(), RegionKind::MemoryMapped)?;
        let mut region = directory.find("road_attributes")?;
        region.create_new(1024)?;
        region.set_int(0, 31)?;
        region.flush()?;
        region.close()?;
        directory.flush()?;
    }
    // a process restarted with an in-memory default still maps the
    // region that was created mapped
    let mut directory = RegionDirectory::open(dir.path(), RegionKind::InMemory)?;
    let mut region = directory.find("road_attributes")?;
    assert_eq!(region.kind(), RegionKind::MemoryMapped);
    assert!(region.load_existing()?);
    assert_eq!(region.get_int(0)?, 31);
    Ok(())
}

#[test]
fn distinct_names_get_distinct_files() -> Result<()> {
    let dir = tempdir()?;
    let mut directory = RegionDirectory::open(dir.path(), RegionKind::MemoryMapped)?;
    let mut first = directory.find("alpha")?;
    let mut second = directory.find("beta")?;
    first.create_new(256)?;
    second.create_new(256)?;
    first.set_int(0, 1)?;
    second.set_int(0, 2)?;
    assert_eq!(first.get_int(0)?, 1);
    assert_eq!(second.get_int(0)?, 2);
    assert!(dir.path().join("alpha").exists());
    assert!(dir.path().join("beta").exists());
    Ok(())
}
